//! Root-chain availability check and the background monitor that logs
//! connect/disconnect transitions.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::client::RootChain;
use crate::runtime::Shutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    On,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceReport {
    pub name: String,
    pub status: ServiceStatus,
    /// RFC 3339 time of the check.
    pub checked_at: String,
}

impl ServiceReport {
    fn new(name: impl Into<String>, status: ServiceStatus) -> Self {
        Self { name: name.into(), status, checked_at: chrono::Utc::now().to_rfc3339() }
    }
}

pub const SERVICE_NAME: &str = "OMG Plasma Chain";

/// Formats `Name/vX.Y.Z-suffix/os/...` as `Name vX.Y.Z (Plasma)`.
pub fn describe_client_version(version: &str) -> String {
    let mut parts = version.split('/');
    match (parts.next(), parts.next()) {
        (Some(node), Some(rest)) => {
            let number = rest.split('-').next().unwrap_or(rest);
            format!("{} {} (Plasma)", node, number)
        }
        _ => version.to_string(),
    }
}

pub async fn service_check(root: &dyn RootChain) -> ServiceReport {
    match root.client_version().await {
        Ok(version) if !version.is_empty() => ServiceReport::new(describe_client_version(&version), ServiceStatus::On),
        Ok(_) => not_found(),
        Err(e) => {
            tracing::debug!(error = %e, "service check failed");
            not_found()
        }
    }
}

fn not_found() -> ServiceReport {
    ServiceReport::new("Plasma chain not found", ServiceStatus::Off)
}

/// Re-runs the service check on an interval until shutdown.
pub struct ServiceMonitor {
    root: Arc<dyn RootChain>,
    interval: Duration,
    shutdown: Shutdown,
}

impl ServiceMonitor {
    pub fn new(root: Arc<dyn RootChain>, interval: Duration, shutdown: Shutdown) -> Self {
        Self { root, interval, shutdown }
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let mut stop = self.shutdown.subscribe();
        // the first check reports either way
        let mut last: Option<ServiceStatus> = None;

        loop {
            if self.shutdown.is_triggered().await {
                break;
            }
            let report = service_check(self.root.as_ref()).await;
            if last != Some(report.status) {
                log_transition(&report);
                last = Some(report.status);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = stop.recv() => break,
            }
        }
        tracing::debug!("service monitor stopped");
    }
}

fn log_transition(report: &ServiceReport) {
    match report.status {
        ServiceStatus::On => {
            tracing::info!("------------------");
            tracing::info!(service = SERVICE_NAME, name = %report.name, "Connected to the Plasma chain!");
            tracing::info!("------------------");
        }
        ServiceStatus::Off => {
            tracing::error!("------------------");
            tracing::error!(service = SERVICE_NAME, "Couldn't connect or lost connection to the Plasma chain...");
            tracing::error!("------------------");
        }
    }
}
