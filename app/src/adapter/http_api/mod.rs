use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::poller::{DeviceSnapshot, PollClient};
use crate::water::Reading;
use crate::water::sensor::{SensorKind, SensorState};

/// Redacted configuration summary served by the diagnostics endpoint.
/// Built once at startup so the token never has to travel with it.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsContext {
    pub api_url: String,
    pub token: &'static str,
    pub poll_interval_secs: u64,
}

impl DiagnosticsContext {
    pub fn new(api_url: &str, poll_interval_secs: u64) -> Self {
        Self {
            api_url: api_url.to_string(),
            token: "**REDACTED**",
            poll_interval_secs,
        }
    }
}

#[derive(Clone)]
struct ApiState {
    poll: PollClient,
    diagnostics: DiagnosticsContext,
}

pub fn new_routes(poll: PollClient, diagnostics: DiagnosticsContext) -> actix_web::Scope {
    let state = ApiState { poll, diagnostics };

    web::scope("/api")
        .route("/devices", web::get().to(get_devices))
        .route("/devices/{device_id}/sensors", web::get().to(get_device_sensors))
        .route("/refresh", web::post().to(post_refresh))
        .route("/diagnostics", web::get().to(get_diagnostics))
        .app_data(web::Data::new(state))
}

#[derive(Debug, Serialize)]
struct DeviceDto {
    id: String,
    name: String,
    serial_number: Option<String>,
    status: Option<String>,
    available: bool,
    last_success: Option<DateTime<Utc>>,
}

impl From<&DeviceSnapshot> for DeviceDto {
    fn from(snapshot: &DeviceSnapshot) -> Self {
        Self {
            id: snapshot.device.id.clone(),
            name: snapshot.device.display_name(),
            serial_number: snapshot.device.serial_number.clone(),
            status: snapshot.device.status.clone(),
            available: snapshot.available(),
            last_success: snapshot.last_success,
        }
    }
}

#[derive(Debug, Serialize)]
struct DeviceSensorsDto {
    device_id: String,
    device_name: String,
    available: bool,
    measured_at: Option<DateTime<Utc>>,
    sensors: Vec<SensorState>,
}

async fn get_devices(state: web::Data<ApiState>) -> impl Responder {
    let devices: Vec<DeviceDto> = state.poll.snapshots().iter().map(DeviceDto::from).collect();

    HttpResponse::Ok().json(devices)
}

async fn get_device_sensors(state: web::Data<ApiState>, path: web::Path<String>) -> impl Responder {
    let device_id = path.into_inner();

    let snapshot = match state.poll.snapshot(&device_id) {
        Some(snapshot) => snapshot,
        None => return HttpResponse::NotFound().json(json!({ "error": "unknown device" })),
    };

    //no reading yet renders every sensor as unavailable
    let empty = Reading::default();
    let reading = snapshot.reading.as_ref().unwrap_or(&empty);

    let sensors: Vec<SensorState> = SensorKind::ALL
        .iter()
        .map(|kind| SensorState::render(*kind, reading))
        .collect();

    HttpResponse::Ok().json(DeviceSensorsDto {
        device_id,
        device_name: snapshot.device.display_name(),
        available: snapshot.available(),
        measured_at: reading.measured_at,
        sensors,
    })
}

async fn post_refresh(state: web::Data<ApiState>) -> impl Responder {
    tracing::info!("Refresh requested via HTTP");
    state.poll.request_refresh();

    HttpResponse::NoContent()
}

async fn get_diagnostics(state: web::Data<ApiState>) -> impl Responder {
    let devices: Vec<serde_json::Value> = state
        .poll
        .snapshots()
        .iter()
        .map(|s| {
            json!({
                "id": s.device.id,
                "last_update_success": !s.stale && s.last_success.is_some(),
                "last_update_time": s.last_success,
                "data_available": s.reading.is_some(),
            })
        })
        .collect();

    HttpResponse::Ok().json(json!({
        "config": state.diagnostics,
        "devices": devices,
    }))
}

#[cfg(test)]
mod tests {
    use assert_json_diff::assert_json_eq;

    use super::*;

    #[test]
    fn diagnostics_context_redacts_token() {
        let ctx = DiagnosticsContext::new("https://backend.labcom.cloud/graphql", 300);

        assert_json_eq!(
            serde_json::to_value(&ctx).unwrap(),
            json!({
                "api_url": "https://backend.labcom.cloud/graphql",
                "token": "**REDACTED**",
                "poll_interval_secs": 300,
            })
        );
    }
}
