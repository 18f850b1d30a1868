mod degree_celsius;
mod ph;
mod ppm;

pub use degree_celsius::DegreeCelsius;
pub use ph::PhValue;
pub use ppm::Ppm;
