pub mod chemistry;
pub mod sensor;

use chrono::{DateTime, Utc};

use crate::core::unit::{DegreeCelsius, PhValue, Ppm};

/// One snapshot of water chemistry from a single device. Every field is
/// optional because the device only reports the parameters it measured.
/// A snapshot is replaced wholesale by the next poll, never patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    pub chlorine: Option<Ppm>,
    pub free_chlorine: Option<Ppm>,
    pub total_chlorine: Option<Ppm>,
    pub ph: Option<PhValue>,
    pub temperature: Option<DegreeCelsius>,
    pub alkalinity: Option<Ppm>,
    pub stabilizer: Option<Ppm>,
    pub salt: Option<Ppm>,
    pub measured_at: Option<DateTime<Utc>>,
}
