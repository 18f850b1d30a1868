use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::PoolDevice;
use crate::core::unit::{DegreeCelsius, PhValue, Ppm};
use crate::water::Reading;

#[derive(Debug, Deserialize)]
pub(super) struct MeData {
    pub me: Option<Account>,
}

#[derive(Debug, Deserialize)]
#[allow(unused)]
pub(super) struct Account {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DevicesData {
    pub devices: Vec<PoolDevice>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DeviceReadingData {
    pub device: Option<DeviceReadingDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(unused)]
pub(super) struct DeviceReadingDto {
    pub id: String,
    pub last_reading: Option<LastReadingDto>,
}

//every field may be null, the device only reports what it measured
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LastReadingDto {
    pub ph: Option<f64>,
    pub chlorine: Option<f64>,
    pub free_chlorine: Option<f64>,
    pub total_chlorine: Option<f64>,
    pub temperature: Option<f64>,
    pub alkalinity: Option<f64>,
    pub cya: Option<f64>,
    pub salt: Option<f64>,
    pub timestamp: Option<i64>,
}

impl From<LastReadingDto> for Reading {
    fn from(dto: LastReadingDto) -> Self {
        Reading {
            chlorine: finite(dto.chlorine).map(Ppm),
            free_chlorine: finite(dto.free_chlorine).map(Ppm),
            total_chlorine: finite(dto.total_chlorine).map(Ppm),
            ph: finite(dto.ph).map(PhValue),
            temperature: finite(dto.temperature).map(DegreeCelsius),
            alkalinity: finite(dto.alkalinity).map(Ppm),
            stabilizer: finite(dto.cya).map(Ppm),
            salt: finite(dto.salt).map(Ppm),
            measured_at: dto.timestamp.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)),
        }
    }
}

//a Reading must never carry NaN or infinities, regardless of how the
//DTO was built
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_maps_nullable_wire_fields() {
        let body = r#"{
            "device": {
                "id": "pool-1",
                "lastReading": {
                    "ph": 7.2,
                    "chlorine": null,
                    "freeChlorine": 1.5,
                    "totalChlorine": 3.0,
                    "temperature": 25.5,
                    "alkalinity": null,
                    "cya": 40.0,
                    "salt": null,
                    "timestamp": 1717243200
                }
            }
        }"#;

        let data: DeviceReadingData = serde_json::from_str(body).unwrap();
        let reading: Reading = data.device.unwrap().last_reading.unwrap().into();

        assert_eq!(reading.ph, Some(PhValue(7.2)));
        assert_eq!(reading.chlorine, None);
        assert_eq!(reading.free_chlorine, Some(Ppm(1.5)));
        assert_eq!(reading.total_chlorine, Some(Ppm(3.0)));
        assert_eq!(reading.temperature, Some(DegreeCelsius(25.5)));
        assert_eq!(reading.alkalinity, None);
        assert_eq!(reading.stabilizer, Some(Ppm(40.0)));
        assert_eq!(reading.salt, None);
        assert_eq!(
            reading.measured_at.map(|t| t.timestamp()),
            Some(1717243200)
        );
    }

    #[test]
    fn device_without_reading_maps_to_none() {
        let body = r#"{"device": {"id": "pool-1", "lastReading": null}}"#;

        let data: DeviceReadingData = serde_json::from_str(body).unwrap();
        assert!(data.device.unwrap().last_reading.is_none());
    }

    #[test]
    fn non_finite_values_dropped_at_construction() {
        let dto = LastReadingDto {
            free_chlorine: Some(f64::NAN),
            total_chlorine: Some(f64::INFINITY),
            ph: Some(7.0),
            ..Default::default()
        };

        let reading: Reading = dto.into();

        assert_eq!(reading.free_chlorine, None);
        assert_eq!(reading.total_chlorine, None);
        assert_eq!(reading.ph, Some(PhValue(7.0)));
    }
}
