use std::fmt::Display;

use derive_more::derive::AsRef;
use serde::{Deserialize, Serialize};

//pH is dimensionless, no unit suffix in display
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, AsRef, Serialize, Deserialize)]
pub struct PhValue(pub f64);

impl From<&PhValue> for f64 {
    fn from(value: &PhValue) -> Self {
        value.0
    }
}

impl From<f64> for PhValue {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<PhValue> for f64 {
    fn from(value: PhValue) -> Self {
        value.0
    }
}

impl Display for PhValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
