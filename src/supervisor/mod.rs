//! Start, stop and status for the registered fleet.
//!
//! Nothing is remembered between calls: every operation re-probes the OS,
//! fans its per-service work out concurrently, and waits for all of it to
//! settle before building the report. One service failing never cancels
//! another.

mod report;

pub use report::{LaunchOutcome, LaunchResult, RestartReport, StartReport, StatusReport, StopReport};

use crate::config::structs::Config;
use crate::error::Result;
use crate::probe::{Probe, SystemProbe};
use crate::process::{Launcher, ProcessControl};
use crate::service::{Registry, Selector, ServiceDescriptor};

use futures::future::join_all;
use std::time::Duration;

/// Pause between the stop and start halves of a restart.
pub const SETTLE_DELAY: Duration = Duration::from_millis(1000);

pub struct Supervisor<P = SystemProbe, C = Launcher> {
    registry: Registry,
    probe: P,
    control: C,
    settle: Duration,
}

impl Supervisor {
    pub fn from_config(config: &Config) -> Result<Self> {
        let probe = SystemProbe::new(Duration::from_millis(config.runner.health_timeout_ms));
        Ok(Supervisor::new(config.registry()?, probe, Launcher::new(&config.runner)))
    }
}

impl<P: Probe, C: ProcessControl> Supervisor<P, C> {
    pub fn new(registry: Registry, probe: P, control: C) -> Self {
        Supervisor {
            registry,
            probe,
            control,
            settle: SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn registry(&self) -> &Registry { &self.registry }

    pub async fn status(&self) -> StatusReport {
        let probes = self.registry.iter().map(|service| async move { (service.id.clone(), self.probe.is_running(service).await) });
        StatusReport::from_iter(join_all(probes).await)
    }

    pub async fn start(&self, selector: &Selector) -> Result<StartReport> {
        let targets = self.registry.select(selector)?;
        let status = self.status().await;

        let (running, candidates): (Vec<&ServiceDescriptor>, Vec<&ServiceDescriptor>) =
            targets.into_iter().partition(|service| status.is_running(&service.id));

        for service in &running {
            log::info!("{} is already running", service.name);
        }

        let launches = candidates.iter().map(|service| async move {
            let result = match self.control.launch(service).await {
                Ok(()) => LaunchResult::Succeeded,
                Err(err) => {
                    log::error!("failed to start {}: {err}", service.name);
                    LaunchResult::Failed(err.to_string())
                }
            };

            LaunchOutcome { id: service.id.clone(), result }
        });

        Ok(StartReport {
            outcomes: join_all(launches).await,
            skipped: running.iter().map(|service| service.id.clone()).collect(),
        })
    }

    pub async fn stop(&self, selector: &Selector) -> Result<StopReport> {
        let targets = self.registry.select(selector)?;
        let status = self.status().await;

        let (running, idle): (Vec<&ServiceDescriptor>, Vec<&ServiceDescriptor>) =
            targets.into_iter().partition(|service| status.is_running(&service.id));

        let not_running = idle.iter().map(|service| service.id.clone()).collect();
        if running.is_empty() {
            return Ok(StopReport { not_running, ..StopReport::default() });
        }

        let terminations = running.iter().map(|service| async move {
            if let Err(err) = self.control.terminate(service).await {
                log::warn!("terminate request for {} failed: {err}", service.name);
            }
        });
        join_all(terminations).await;

        let after = self.status().await;
        let (still_running, stopped): (Vec<&ServiceDescriptor>, Vec<&ServiceDescriptor>) =
            running.into_iter().partition(|service| after.is_running(&service.id));

        for service in &still_running {
            log::warn!("{} is still running", service.name);
        }

        Ok(StopReport {
            not_running,
            stopped: stopped.iter().map(|service| service.id.clone()).collect(),
            still_running: still_running.iter().map(|service| service.id.clone()).collect(),
        })
    }

    pub async fn restart(&self, selector: &Selector) -> Result<RestartReport> {
        let stop = self.stop(selector).await?;
        tokio::time::sleep(self.settle).await;
        let start = self.start(selector).await?;

        Ok(RestartReport { stop, start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, LaunchError};
    use crate::service::tests::descriptor;

    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// In-memory stand-in for the OS: probe and control share one view of what runs.
    #[derive(Clone, Default)]
    struct Fleet {
        running: Arc<Mutex<HashSet<String>>>,
        broken: Arc<Mutex<HashSet<String>>>,
        stubborn: Arc<Mutex<HashSet<String>>>,
        launches: Arc<Mutex<Vec<String>>>,
    }

    impl Fleet {
        fn with_running(ids: &[&str]) -> Self {
            let fleet = Fleet::default();
            fleet.running.lock().unwrap().extend(ids.iter().map(|id| id.to_string()));
            fleet
        }

        fn launches(&self) -> Vec<String> { self.launches.lock().unwrap().clone() }
    }

    #[async_trait]
    impl Probe for Fleet {
        async fn is_running(&self, service: &ServiceDescriptor) -> bool { self.running.lock().unwrap().contains(&service.id) }
    }

    #[async_trait]
    impl ProcessControl for Fleet {
        async fn launch(&self, service: &ServiceDescriptor) -> std::result::Result<(), LaunchError> {
            self.launches.lock().unwrap().push(service.id.clone());

            if self.broken.lock().unwrap().contains(&service.id) {
                return Err(LaunchError::Spawn("spawn bash ENOENT".into()));
            }

            self.running.lock().unwrap().insert(service.id.clone());
            Ok(())
        }

        async fn terminate(&self, service: &ServiceDescriptor) -> io::Result<()> {
            if !self.stubborn.lock().unwrap().contains(&service.id) {
                self.running.lock().unwrap().remove(&service.id);
            }
            Ok(())
        }
    }

    fn supervisor(fleet: &Fleet) -> Supervisor<Fleet, Fleet> {
        let registry = Registry::new(vec![descriptor("middleware"), descriptor("ui"), descriptor("jade")]);
        Supervisor::new(registry, fleet.clone(), fleet.clone()).with_settle_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_start_twice_skips_everything_the_second_time() {
        let fleet = Fleet::default();
        let supervisor = supervisor(&fleet);

        let first = supervisor.start(&Selector::All).await.unwrap();
        assert_eq!(first.succeeded().count(), 3);
        assert!(first.skipped.is_empty());

        let second = supervisor.start(&Selector::All).await.unwrap();
        assert_eq!(second.skipped.len(), 3);
        assert!(second.outcomes.is_empty());
        assert_eq!(fleet.launches().len(), 3);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let fleet = Fleet::default();
        fleet.broken.lock().unwrap().insert("ui".into());
        let supervisor = supervisor(&fleet);

        let report = supervisor.start(&Selector::from_ids(["ui", "middleware"])).await.unwrap();
        let failed: Vec<_> = report.failed().map(|(id, _)| id).collect();
        let succeeded: Vec<_> = report.succeeded().collect();

        assert_eq!(failed, vec!["ui"]);
        assert_eq!(succeeded, vec!["middleware"]);
        assert!(!report.is_success());

        let status = supervisor.status().await;
        assert!(!status.is_running("ui"));
        assert!(status.is_running("middleware"));
        assert!(!status.is_running("jade"));
    }

    #[tokio::test]
    async fn test_start_only_launches_selected_and_stopped() {
        let fleet = Fleet::with_running(&["jade"]);
        let supervisor = supervisor(&fleet);

        let report = supervisor.start(&Selector::from_ids(["jade", "ui"])).await.unwrap();

        assert_eq!(report.skipped, vec!["jade"]);
        assert_eq!(fleet.launches(), vec!["ui"]);
    }

    #[tokio::test]
    async fn test_stop_on_stopped_service_is_noop() {
        let fleet = Fleet::default();
        let report = supervisor(&fleet).stop(&Selector::from_ids(["jade"])).await.unwrap();

        assert_eq!(report.not_running, vec!["jade"]);
        assert!(report.stopped.is_empty());
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_stop_reports_stubborn_services() {
        let fleet = Fleet::with_running(&["middleware", "ui"]);
        fleet.stubborn.lock().unwrap().insert("ui".into());

        let report = supervisor(&fleet).stop(&Selector::All).await.unwrap();

        assert_eq!(report.stopped, vec!["middleware"]);
        assert_eq!(report.still_running, vec!["ui"]);
        assert_eq!(report.not_running, vec!["jade"]);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_unknown_selector_fails_whole_call() {
        let fleet = Fleet::default();
        let err = supervisor(&fleet).start(&Selector::from_ids(["ui", "database"])).await.unwrap_err();

        assert!(matches!(err, Error::UnknownService(id) if id == "database"));
        assert!(fleet.launches().is_empty());
    }

    #[tokio::test]
    async fn test_restart_cycles_running_services() {
        let fleet = Fleet::with_running(&["ui"]);
        let report = supervisor(&fleet).restart(&Selector::from_ids(["ui"])).await.unwrap();

        assert_eq!(report.stop.stopped, vec!["ui"]);
        assert_eq!(report.start.succeeded().collect::<Vec<_>>(), vec!["ui"]);
        assert!(fleet.running.lock().unwrap().contains("ui"));
    }
}
