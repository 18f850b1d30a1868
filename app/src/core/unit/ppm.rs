use std::fmt::Display;

use derive_more::derive::AsRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, AsRef, Serialize, Deserialize)]
pub struct Ppm(pub f64);

impl Ppm {
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

impl From<&Ppm> for f64 {
    fn from(value: &Ppm) -> Self {
        value.0
    }
}

impl From<f64> for Ppm {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Ppm> for f64 {
    fn from(value: Ppm) -> Self {
        value.0
    }
}

impl Display for Ppm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} ppm", self.0)
    }
}

impl std::ops::Add for Ppm {
    type Output = Ppm;

    fn add(self, rhs: Self) -> Self::Output {
        Ppm(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Ppm {
    type Output = Ppm;

    fn sub(self, rhs: Self) -> Self::Output {
        Ppm(self.0 - rhs.0)
    }
}
