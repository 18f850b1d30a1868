use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};

use crate::adapter::labcom::{LabComClient, PoolDevice};
use crate::core::resilience::ExponentialBackoff;
use crate::water::Reading;

const BACKOFF_BASE_DELAY: Duration = Duration::from_secs(5);

/// Current state of one device. Replaced wholesale on every successful
/// poll; a failed poll keeps the previous reading and only flips `stale`.
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub device: PoolDevice,
    pub reading: Option<Reading>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub stale: bool,
}

impl DeviceSnapshot {
    fn new(device: PoolDevice) -> Self {
        Self {
            device,
            reading: None,
            last_success: None,
            last_attempt: None,
            stale: false,
        }
    }

    pub fn available(&self) -> bool {
        self.reading.is_some() && !self.stale
    }
}

//Trait would be better, but no dyn support for async fn makes it too cumbersome
#[derive(Clone)]
pub struct PollClient {
    devices: Vec<PoolDevice>,
    snapshots: HashMap<String, watch::Receiver<DeviceSnapshot>>,
    refresh_tx: mpsc::Sender<()>,
}

impl PollClient {
    pub fn snapshot(&self, device_id: &str) -> Option<DeviceSnapshot> {
        self.snapshots.get(device_id).map(|rx| rx.borrow().clone())
    }

    pub fn snapshots(&self) -> Vec<DeviceSnapshot> {
        self.devices
            .iter()
            .filter_map(|d| self.snapshot(&d.id))
            .collect()
    }

    /// Short-circuits the current poll wait. Best effort, a refresh that
    /// is already queued is good enough.
    pub fn request_refresh(&self) {
        let _ = self.refresh_tx.try_send(());
    }
}

pub struct PollRunner {
    client: Arc<LabComClient>,
    interval: Duration,
    devices: Vec<PoolDevice>,
    senders: HashMap<String, watch::Sender<DeviceSnapshot>>,
    receivers: HashMap<String, watch::Receiver<DeviceSnapshot>>,
    refresh_tx: mpsc::Sender<()>,
    refresh_rx: mpsc::Receiver<()>,
}

impl PollRunner {
    pub fn new(client: Arc<LabComClient>, devices: Vec<PoolDevice>, interval: Duration) -> Self {
        let (refresh_tx, refresh_rx) = mpsc::channel(4);

        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();

        for device in devices.iter() {
            let (tx, rx) = watch::channel(DeviceSnapshot::new(device.clone()));
            senders.insert(device.id.clone(), tx);
            receivers.insert(device.id.clone(), rx);
        }

        Self {
            client,
            interval,
            devices,
            senders,
            receivers,
            refresh_tx,
            refresh_rx,
        }
    }

    pub fn client(&self) -> PollClient {
        PollClient {
            devices: self.devices.clone(),
            snapshots: self.receivers.clone(),
            refresh_tx: self.refresh_tx.clone(),
        }
    }

    pub async fn run(mut self) {
        let mut backoff = ExponentialBackoff::new(BACKOFF_BASE_DELAY, self.interval);

        loop {
            let all_ok = self.poll_all().await;

            let wait = if all_ok {
                backoff.reset();
                self.interval
            } else {
                let delay = backoff.next_delay().min(self.interval);
                backoff.bump();
                tracing::warn!(
                    "Poll cycle had failures, retrying in {} seconds (attempt {})",
                    delay.as_secs(),
                    backoff.attempts()
                );
                delay
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                Some(()) = self.refresh_rx.recv() => {
                    tracing::info!("On-demand refresh requested");
                }
            }
        }
    }

    async fn poll_all(&self) -> bool {
        let mut all_ok = true;

        for device in self.devices.iter() {
            let tx = match self.senders.get(&device.id) {
                Some(tx) => tx,
                None => continue,
            };

            let now = Utc::now();

            match self.client.last_reading(&device.id).await {
                Ok(reading) => {
                    if reading.is_none() {
                        tracing::warn!("No measurements available for device {}", device.id);
                    }

                    tx.send_modify(|snapshot| {
                        snapshot.last_attempt = Some(now);
                        snapshot.last_success = Some(now);
                        snapshot.stale = false;

                        //a device that reported nothing keeps its previous
                        //snapshot, absence of a new reading is not a wipe
                        if reading.is_some() {
                            snapshot.reading = reading.clone();
                        }
                    });

                    tracing::debug!("Updated snapshot for device {}", device.id);
                }
                Err(e) => {
                    all_ok = false;
                    tracing::error!("Error polling device {}: {}", device.id, e);

                    tx.send_modify(|snapshot| {
                        snapshot.last_attempt = Some(now);
                        snapshot.stale = true;
                    });
                }
            }
        }

        all_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str) -> PoolDevice {
        PoolDevice {
            id: id.to_string(),
            name: Some("Garden Pool".to_string()),
            serial_number: None,
            status: None,
        }
    }

    #[test]
    fn snapshot_unavailable_until_first_reading() {
        let snapshot = DeviceSnapshot::new(device("pool-1"));
        assert!(!snapshot.available());
    }

    #[test]
    fn stale_snapshot_keeps_reading_but_is_unavailable() {
        let mut snapshot = DeviceSnapshot::new(device("pool-1"));
        snapshot.reading = Some(Reading::default());
        assert!(snapshot.available());

        snapshot.stale = true;
        assert!(!snapshot.available());
        assert!(snapshot.reading.is_some());
    }

    fn failing_client() -> Arc<LabComClient> {
        //nothing listens on port 1, every request errors out
        Arc::new(
            crate::adapter::labcom::LabComSettings {
                url: "http://127.0.0.1:1/graphql".to_string(),
                token: "test".to_string(),
            }
            .new_client()
            .unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_previous_reading_and_marks_stale() {
        let runner = PollRunner::new(failing_client(), vec![device("pool-1")], Duration::from_secs(300));
        let client = runner.client();

        let seeded = Reading {
            free_chlorine: Some(crate::core::unit::Ppm(1.5)),
            ..Default::default()
        };

        runner.senders.get("pool-1").unwrap().send_modify(|s| {
            s.reading = Some(seeded.clone());
            s.last_success = Some(Utc::now());
        });

        let all_ok = runner.poll_all().await;
        assert!(!all_ok);

        let snapshot = client.snapshot("pool-1").unwrap();
        assert!(snapshot.stale);
        assert!(!snapshot.available());
        assert!(snapshot.last_attempt.is_some());
        assert_eq!(snapshot.reading, Some(seeded));
    }

    #[tokio::test]
    async fn client_sees_snapshot_updates() {
        let labcom = Arc::new(
            crate::adapter::labcom::LabComSettings {
                url: "http://localhost:1/graphql".to_string(),
                token: "test".to_string(),
            }
            .new_client()
            .unwrap(),
        );

        let runner = PollRunner::new(labcom, vec![device("pool-1")], Duration::from_secs(300));
        let client = runner.client();

        runner.senders.get("pool-1").unwrap().send_modify(|s| {
            s.reading = Some(Reading::default());
            s.last_success = Some(Utc::now());
        });

        let snapshot = client.snapshot("pool-1").unwrap();
        assert!(snapshot.available());
        assert!(client.snapshot("unknown").is_none());
    }
}
