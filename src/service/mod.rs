use crate::config::structs::StartCommand;
use crate::error::{Error, Result};
use crate::probe::Liveness;

use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Static definition of one manageable service.
#[derive(Clone, Debug)]
pub struct ServiceDescriptor {
    pub id: String,
    pub name: String,
    pub port: Option<u16>,
    pub dir: PathBuf,
    pub start: StartCommand,
    pub pattern: Regex,
    pub health: Option<String>,
    pub liveness: Liveness,
}

impl ServiceDescriptor {
    pub fn command(&self) -> &str { self.start.current() }
}

/// Read-only table of every service the supervisor knows about, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    services: BTreeMap<String, ServiceDescriptor>,
}

/// Which registered services an operation targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    All,
    Only(Vec<String>),
}

impl Selector {
    /// An empty list targets every service.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for id in ids.into_iter().map(Into::into) {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        match unique.is_empty() {
            true => Selector::All,
            false => Selector::Only(unique),
        }
    }
}

impl Registry {
    pub fn new(descriptors: Vec<ServiceDescriptor>) -> Self {
        Registry {
            services: descriptors.into_iter().map(|service| (service.id.clone(), service)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ServiceDescriptor> { self.services.get(id) }
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> { self.services.values() }
    pub fn len(&self) -> usize { self.services.len() }
    pub fn is_empty(&self) -> bool { self.services.is_empty() }

    pub fn select(&self, selector: &Selector) -> Result<Vec<&ServiceDescriptor>> {
        match selector {
            Selector::All => Ok(self.iter().collect()),
            Selector::Only(ids) => ids
                .iter()
                .map(|id| self.get(id).ok_or_else(|| Error::UnknownService(id.clone())))
                .collect(),
        }
    }
}
