//! Payout destination for burn requests
//!
//! Agents pay fiat either to a bank account or to a mobile-money wallet. The
//! engine only validates shape; presentation and the actual fiat rail are
//! collaborator concerns.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Where the agent sends fiat for a burn request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BankAccount {
    Bank {
        bank_name: String,
        account_number: String,
        account_name: String,
    },
    MobileMoney {
        provider: String,
        phone_number: String,
        account_name: String,
    },
}

impl BankAccount {
    pub fn bank(
        bank_name: impl Into<String>,
        account_number: impl Into<String>,
        account_name: impl Into<String>,
    ) -> EngineResult<Self> {
        let account = BankAccount::Bank {
            bank_name: bank_name.into(),
            account_number: account_number.into(),
            account_name: account_name.into(),
        };
        account.validate()?;
        Ok(account)
    }

    pub fn mobile_money(
        provider: impl Into<String>,
        phone_number: impl Into<String>,
        account_name: impl Into<String>,
    ) -> EngineResult<Self> {
        let account = BankAccount::MobileMoney {
            provider: provider.into(),
            phone_number: phone_number.into(),
            account_name: account_name.into(),
        };
        account.validate()?;
        Ok(account)
    }

    /// All fields must be non-empty. Amount semantics live elsewhere; this is
    /// purely a shape check so a request never persists an unusable payout
    /// destination.
    pub fn validate(&self) -> EngineResult<()> {
        let fields: [&str; 3] = match self {
            BankAccount::Bank {
                bank_name,
                account_number,
                account_name,
            } => [bank_name, account_number, account_name],
            BankAccount::MobileMoney {
                provider,
                phone_number,
                account_name,
            } => [provider, phone_number, account_name],
        };
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(EngineError::InvalidBankAccount(
                "all destination fields must be non-empty",
            ));
        }
        Ok(())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BankAccount::Bank { .. } => "bank",
            BankAccount::MobileMoney { .. } => "mobile_money",
        }
    }
}
