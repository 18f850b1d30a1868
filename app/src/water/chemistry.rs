use crate::core::unit::Ppm;

/// Combined chlorine (chloramines): total minus free, floored at zero.
///
/// Absent inputs propagate as absent, never as zero. Zero is the defined
/// saturation result when free chlorine meets or exceeds total chlorine.
/// Non-finite readings are treated the same as unreported ones.
pub fn combined_chlorine(total: Option<Ppm>, free: Option<Ppm>) -> Option<Ppm> {
    let total = total.filter(Ppm::is_finite)?;
    let free = free.filter(Ppm::is_finite)?;

    Some(Ppm((total.0 - free.0).max(0.0)))
}
