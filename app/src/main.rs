use std::sync::Arc;
use std::time::Duration;

use settings::Settings;

use crate::poller::PollRunner;

mod adapter;
mod core;
mod poller;
mod settings;
mod water;

#[tokio::main(flavor = "multi_thread")]
pub async fn main() {
    let settings = Settings::new().expect("Error reading configuration");

    settings.monitoring.init().expect("Error initializing monitoring");

    let client = Arc::new(settings.labcom.new_client().expect("Error initializing LabCom client"));

    tracing::info!("Verifying LabCom API token");
    let token_valid = client.verify_token().await.expect("Error verifying LabCom API token");
    if !token_valid {
        tracing::error!("Invalid LabCom API token");
        std::process::exit(1);
    }

    tracing::info!("Discovering devices");
    let devices = client.devices().await.expect("Error fetching devices from LabCom API");
    if devices.is_empty() {
        tracing::error!("No devices found in LabCom account");
        std::process::exit(1);
    }

    for device in devices.iter() {
        tracing::info!("Found device {} ({})", device.display_name(), device.id);
    }

    let poll_interval = Duration::from_secs(settings.poll.interval_secs);
    let poll_runner = PollRunner::new(client, devices, poll_interval);
    let poll_client = poll_runner.client();

    let http_server_exec = {
        let http_server = settings.http_server.clone();
        let diagnostics =
            adapter::http_api::DiagnosticsContext::new(&settings.labcom.url, settings.poll.interval_secs);

        async move {
            http_server
                .run_server(move || vec![adapter::http_api::new_routes(poll_client.clone(), diagnostics.clone())])
                .await
                .expect("HTTP server execution failed");
        }
    };

    tracing::info!("Starting main loop");

    tokio::select!(
        _ = poll_runner.run() => {},
        _ = http_server_exec => {},
    );
}
