pub mod structs;

use crate::error::{Error, Result};
use crate::file::{self, Exists};
use crate::probe::{Liveness, LivenessCheck};
use crate::service::{Registry, ServiceDescriptor};

use regex::Regex;
use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};
use structs::{Check, Config, Device, Monitor, Runner, Service, StartCommand};

pub fn path() -> Result<PathBuf> {
    match home::home_dir() {
        Some(home) => Ok(home.join(".voice-agent").join("config.toml")),
        None => Err(Error::Config("impossible to get your home directory".into())),
    }
}

/// Reads the config at `path`, writing the defaults there first when the file is missing.
pub fn read(path: &Path) -> Result<Config> {
    if !Exists::check(path).file() {
        let config = Config::new(file::cwd()?);
        config.save(path)?;
        log::info!("created config file (path={})", path.display());
        return Ok(config);
    }

    let contents = fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|err| Error::Config(err.to_string()))
}

impl Config {
    pub fn new(project_root: PathBuf) -> Self {
        let mut services = BTreeMap::new();

        services.insert(
            "middleware".to_string(),
            Service {
                name: "Middleware API".into(),
                port: Some(3000),
                dir: "middleware".into(),
                pattern: "node server.js".into(),
                health: Some("http://localhost:3000/".into()),
                start: StartCommand::Shared("node server.js".into()),
                liveness: None,
            },
        );

        services.insert(
            "ui".to_string(),
            Service {
                name: "Voice UI".into(),
                port: Some(8080),
                dir: "voice-ui".into(),
                pattern: "http-server.*voice-ui".into(),
                health: Some("http://localhost:8080/".into()),
                start: StartCommand::Shared("npx http-server -p 8080".into()),
                liveness: None,
            },
        );

        services.insert(
            "jade".to_string(),
            Service {
                name: "JADE Platform".into(),
                port: None,
                dir: "jade-platform".into(),
                pattern: "java.*jade.Boot".into(),
                health: None,
                start: StartCommand::PerOs {
                    unix: r#"java -cp "${JADE_HOME}/lib/jade.jar" jade.Boot -gui -agents "main:MainAgent""#.into(),
                    windows: r#"java -cp "%JADE_HOME%\lib\jade.jar" jade.Boot -gui -agents "main:MainAgent""#.into(),
                },
                liveness: None,
            },
        );

        Config {
            project_root,
            services,
            runner: Runner::default(),
            monitor: Monitor::default(),
            device: Device::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !Exists::check(parent).folder() {
                fs::create_dir_all(parent)?;
                log::info!("created config dir (path={})", parent.display());
            }
        }

        let contents = toml::to_string(self).map_err(|err| Error::Config(err.to_string()))?;
        Ok(fs::write(path, contents)?)
    }

    /// Resolves every `[services.<id>]` table into a descriptor. Relative
    /// directories are taken from `project_root`.
    pub fn registry(&self) -> Result<Registry> {
        let mut descriptors = Vec::with_capacity(self.services.len());

        for (id, service) in &self.services {
            let pattern = compile(id, &service.pattern)?;
            let liveness = match &service.liveness {
                Some(liveness) => custom_liveness(id, liveness)?,
                None => Liveness::primary(service.port, &pattern),
            };

            descriptors.push(ServiceDescriptor {
                id: id.clone(),
                name: service.name.clone(),
                port: service.port,
                dir: self.project_root.join(&service.dir),
                start: service.start.clone(),
                pattern,
                health: service.health.clone(),
                liveness,
            });
        }

        Ok(Registry::new(descriptors))
    }
}

fn compile(id: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::Pattern { id: id.to_string(), source })
}

fn custom_liveness(id: &str, liveness: &structs::Liveness) -> Result<Liveness> {
    let checks = liveness
        .checks
        .iter()
        .map(|check| match check {
            Check::Port { port } => Ok(LivenessCheck::PortBind(*port)),
            Check::Pattern { pattern } => Ok(LivenessCheck::ProcessPattern(compile(id, pattern)?)),
            Check::Http { http } => Ok(LivenessCheck::HttpHealth(http.clone())),
        })
        .collect::<Result<Vec<_>>>()?;

    if liveness.quorum == 0 || liveness.quorum > checks.len() {
        return Err(Error::Config(format!("service `{id}` needs a quorum between 1 and {}", checks.len())));
    }

    Ok(Liveness { checks, quorum: liveness.quorum })
}
