//! Platform token types

use serde::{Deserialize, Serialize};

/// Token types the engine can hold in escrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenType {
    /// Native platform token
    Nt,
    /// Community token
    Ct,
    /// Tether (bridged)
    Usdt,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Nt => "NT",
            TokenType::Ct => "CT",
            TokenType::Usdt => "USDT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NT" => Some(TokenType::Nt),
            "CT" => Some(TokenType::Ct),
            "USDT" => Some(TokenType::Usdt),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
