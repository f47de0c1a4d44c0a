//! Configuration modules for the ramp engine

pub mod timeout;

pub use timeout::TimeoutConfig;
