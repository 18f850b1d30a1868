use serde::Serialize;
use serde_json::{Map, Value, json};

use super::{Reading, chemistry};

/// Everything the dashboard needs to know about one quantity. Pure
/// presentation, no computational meaning.
#[derive(Debug, Clone, Copy)]
pub struct SensorMeta {
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub icon: &'static str,
    pub precision: u32,
    pub min: f64,
    pub max: f64,
    pub description: Option<&'static str>,
    pub ideal_range: Option<&'static str>,
    pub calculated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Ph,
    Chlorine,
    FreeChlorine,
    TotalChlorine,
    CombinedChlorine,
    Temperature,
    Alkalinity,
    Stabilizer,
    Salt,
}

impl SensorKind {
    pub const ALL: [SensorKind; 9] = [
        SensorKind::Ph,
        SensorKind::Chlorine,
        SensorKind::FreeChlorine,
        SensorKind::TotalChlorine,
        SensorKind::CombinedChlorine,
        SensorKind::Temperature,
        SensorKind::Alkalinity,
        SensorKind::Stabilizer,
        SensorKind::Salt,
    ];

    pub fn meta(&self) -> SensorMeta {
        match self {
            SensorKind::Ph => SensorMeta {
                label: "pH",
                unit: None,
                icon: "mdi:water-opacity",
                precision: 2,
                min: 0.0,
                max: 14.0,
                description: None,
                ideal_range: None,
                calculated: false,
            },
            SensorKind::Chlorine => SensorMeta {
                label: "Chlorine",
                unit: Some("ppm"),
                icon: "mdi:water-check",
                precision: 2,
                min: 0.0,
                max: 10.0,
                description: None,
                ideal_range: None,
                calculated: false,
            },
            SensorKind::FreeChlorine => SensorMeta {
                label: "Free Chlorine",
                unit: Some("ppm"),
                icon: "mdi:water-check",
                precision: 2,
                min: 0.0,
                max: 10.0,
                description: Some("Active chlorine available for sanitization"),
                ideal_range: Some("1-3 ppm"),
                calculated: false,
            },
            SensorKind::TotalChlorine => SensorMeta {
                label: "Total Chlorine",
                unit: Some("ppm"),
                icon: "mdi:water-plus",
                precision: 2,
                min: 0.0,
                max: 10.0,
                description: Some("Total chlorine in the pool (free + combined)"),
                ideal_range: None,
                calculated: false,
            },
            SensorKind::CombinedChlorine => SensorMeta {
                label: "Combined Chlorine",
                unit: Some("ppm"),
                icon: "mdi:water-alert",
                precision: 2,
                min: 0.0,
                max: 5.0,
                description: Some("Chlorine bound to contaminants (chloramines)"),
                ideal_range: Some("< 0.5 ppm"),
                calculated: true,
            },
            SensorKind::Temperature => SensorMeta {
                label: "Temperature",
                unit: Some("°C"),
                icon: "mdi:thermometer",
                precision: 1,
                min: 0.0,
                max: 50.0,
                description: None,
                ideal_range: None,
                calculated: false,
            },
            SensorKind::Alkalinity => SensorMeta {
                label: "Alkalinity",
                unit: Some("ppm"),
                icon: "mdi:beaker",
                precision: 0,
                min: 0.0,
                max: 300.0,
                description: None,
                ideal_range: None,
                calculated: false,
            },
            SensorKind::Stabilizer => SensorMeta {
                label: "Stabilizer (CYA)",
                unit: Some("ppm"),
                icon: "mdi:shield-check",
                precision: 0,
                min: 0.0,
                max: 200.0,
                description: None,
                ideal_range: None,
                calculated: false,
            },
            SensorKind::Salt => SensorMeta {
                label: "Salt Level",
                unit: Some("ppm"),
                icon: "mdi:shaker",
                precision: 0,
                min: 0.0,
                max: 3600.0,
                description: None,
                ideal_range: None,
                calculated: false,
            },
        }
    }
}

/// One sensor rendered against one snapshot. `value: None` means
/// "unavailable" downstream, which is distinct from a measured zero.
#[derive(Debug, Clone, Serialize)]
pub struct SensorState {
    pub kind: SensorKind,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub icon: &'static str,
    pub min: f64,
    pub max: f64,
    pub value: Option<f64>,
    pub attributes: Map<String, Value>,
}

impl SensorState {
    pub fn render(kind: SensorKind, reading: &Reading) -> Self {
        let meta = kind.meta();

        let raw = match kind {
            SensorKind::Ph => reading.ph.map(f64::from),
            //legacy sensor, fed from the free chlorine parameter when the
            //general field is not reported
            SensorKind::Chlorine => reading.chlorine.or(reading.free_chlorine).map(f64::from),
            SensorKind::FreeChlorine => reading.free_chlorine.map(f64::from),
            SensorKind::TotalChlorine => reading.total_chlorine.map(f64::from),
            SensorKind::CombinedChlorine => {
                chemistry::combined_chlorine(reading.total_chlorine, reading.free_chlorine).map(f64::from)
            }
            SensorKind::Temperature => reading.temperature.map(f64::from),
            SensorKind::Alkalinity => reading.alkalinity.map(f64::from),
            SensorKind::Stabilizer => reading.stabilizer.map(f64::from),
            SensorKind::Salt => reading.salt.map(f64::from),
        };

        Self {
            kind,
            label: meta.label,
            unit: meta.unit,
            icon: meta.icon,
            min: meta.min,
            max: meta.max,
            value: raw.filter(|v| v.is_finite()).map(|v| round_to(v, meta.precision)),
            attributes: attributes_for(kind, &meta, reading),
        }
    }
}

fn attributes_for(kind: SensorKind, meta: &SensorMeta, reading: &Reading) -> Map<String, Value> {
    let mut attributes = Map::new();

    if let Some(description) = meta.description {
        attributes.insert("description".to_string(), json!(description));
    }
    if let Some(ideal_range) = meta.ideal_range {
        attributes.insert("ideal_range".to_string(), json!(ideal_range));
    }
    if meta.calculated {
        attributes.insert("calculated".to_string(), json!(true));
    }

    match kind {
        SensorKind::FreeChlorine => {
            attributes.insert("also_known_as".to_string(), json!("Active Chlorine"));
        }
        SensorKind::TotalChlorine => {
            attributes.insert("calculation".to_string(), json!("Total = Free + Combined"));
        }
        SensorKind::CombinedChlorine => {
            attributes.insert("calculation".to_string(), json!("Combined = Total - Free"));
            attributes.insert(
                "warning".to_string(),
                json!("High combined chlorine indicates poor water quality"),
            );

            //echo the inputs so consumers can audit the calculation
            attributes.insert("free_chlorine".to_string(), json!(reading.free_chlorine.map(f64::from)));
            attributes.insert("total_chlorine".to_string(), json!(reading.total_chlorine.map(f64::from)));
        }
        _ => {}
    }

    if let Some(measured_at) = reading.measured_at {
        attributes.insert("timestamp".to_string(), json!(measured_at.to_rfc3339()));
    }

    attributes
}

fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use assert_json_diff::assert_json_include;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::core::unit::{DegreeCelsius, PhValue, Ppm};

    fn reading() -> Reading {
        Reading {
            chlorine: None,
            free_chlorine: Some(Ppm(2.5)),
            total_chlorine: Some(Ppm(2.6)),
            ph: Some(PhValue(7.213)),
            temperature: Some(DegreeCelsius(26.44)),
            alkalinity: Some(Ppm(110.4)),
            stabilizer: None,
            salt: None,
            measured_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single(),
        }
    }

    #[test]
    fn combined_chlorine_rendered_with_audit_attributes() {
        let state = SensorState::render(SensorKind::CombinedChlorine, &reading());

        assert_eq!(state.value, Some(0.1));
        assert_json_include!(
            actual: Value::Object(state.attributes),
            expected: json!({
                "calculation": "Combined = Total - Free",
                "ideal_range": "< 0.5 ppm",
                "free_chlorine": 2.5,
                "total_chlorine": 2.6,
                "timestamp": "2024-06-01T12:00:00+00:00",
            })
        );
    }

    #[test]
    fn combined_chlorine_unavailable_when_input_missing() {
        let mut r = reading();
        r.free_chlorine = None;

        let state = SensorState::render(SensorKind::CombinedChlorine, &r);

        assert_eq!(state.value, None);
        assert_eq!(state.attributes.get("free_chlorine"), Some(&Value::Null));
        assert_eq!(state.attributes.get("total_chlorine"), Some(&json!(2.6)));
    }

    #[test]
    fn values_rounded_to_sensor_precision() {
        let r = reading();

        assert_eq!(SensorState::render(SensorKind::Ph, &r).value, Some(7.21));
        assert_eq!(SensorState::render(SensorKind::Temperature, &r).value, Some(26.4));
        assert_eq!(SensorState::render(SensorKind::Alkalinity, &r).value, Some(110.0));
    }

    #[test]
    fn chlorine_falls_back_to_free_chlorine() {
        let state = SensorState::render(SensorKind::Chlorine, &reading());
        assert_eq!(state.value, Some(2.5));

        let mut r = reading();
        r.chlorine = Some(Ppm(1.8));
        assert_eq!(SensorState::render(SensorKind::Chlorine, &r).value, Some(1.8));
    }

    #[test]
    fn plausible_range_attached_per_sensor() {
        assert_eq!((SensorKind::Ph.meta().min, SensorKind::Ph.meta().max), (0.0, 14.0));
        assert_eq!(SensorKind::FreeChlorine.meta().max, 10.0);
        assert_eq!(SensorKind::CombinedChlorine.meta().max, 5.0);
        assert_eq!(SensorKind::Salt.meta().max, 3600.0);

        let state = SensorState::render(SensorKind::Temperature, &reading());
        assert_eq!((state.min, state.max), (0.0, 50.0));
    }

    #[test]
    fn empty_reading_renders_everything_unavailable() {
        let r = Reading::default();

        for kind in SensorKind::ALL {
            let state = SensorState::render(kind, &r);
            assert_eq!(state.value, None, "{:?} should be unavailable", kind);
        }
    }
}
