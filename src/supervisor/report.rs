use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "lowercase")]
pub enum LaunchResult {
    Succeeded,
    Failed(String),
}

#[derive(Clone, Debug, Serialize)]
pub struct LaunchOutcome {
    pub id: String,
    pub result: LaunchResult,
}

/// Live view of which services answered their liveness checks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusReport {
    pub services: BTreeMap<String, bool>,
}

impl StatusReport {
    pub fn is_running(&self, id: &str) -> bool { self.services.get(id).copied().unwrap_or(false) }
    pub fn running(&self) -> usize { self.services.values().filter(|running| **running).count() }
}

impl FromIterator<(String, bool)> for StatusReport {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self { StatusReport { services: iter.into_iter().collect() } }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct StartReport {
    pub outcomes: Vec<LaunchOutcome>,
    /// Already running before the call.
    pub skipped: Vec<String>,
}

impl StartReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter(|outcome| outcome.result == LaunchResult::Succeeded).map(|outcome| outcome.id.as_str())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.result {
            LaunchResult::Failed(reason) => Some((outcome.id.as_str(), reason.as_str())),
            LaunchResult::Succeeded => None,
        })
    }

    pub fn is_success(&self) -> bool { self.failed().next().is_none() }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct StopReport {
    pub stopped: Vec<String>,
    /// Still observed after the terminate request; termination may simply not have finished.
    pub still_running: Vec<String>,
    pub not_running: Vec<String>,
}

impl StopReport {
    pub fn is_success(&self) -> bool { self.still_running.is_empty() }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RestartReport {
    pub stop: StopReport,
    pub start: StartReport,
}
