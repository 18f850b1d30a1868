pub mod resilience;
pub mod unit;
