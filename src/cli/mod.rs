mod args;
pub use args::*;

pub(crate) mod render;

use anyhow::Context;
use colored::Colorize;
use macros_rs::{crashln, string};
use std::{path::PathBuf, time::Duration};
use tokio::time;

use voice_agent::{
    config::{self, structs::Config},
    device::Adb,
    helpers, Supervisor,
};

pub fn get_version(short: bool) -> String {
    return match short {
        true => format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        false => match env!("GIT_HASH") {
            "" => format!("{} ({}) [{}]", env!("CARGO_PKG_VERSION"), env!("BUILD_DATE"), env!("PROFILE")),
            hash => format!("{} ({} {hash}) [{}]", env!("CARGO_PKG_VERSION"), env!("BUILD_DATE"), env!("PROFILE")),
        },
    };
}

fn load(path: &Option<PathBuf>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path.clone(),
        None => config::path()?,
    };

    config::read(&path).with_context(|| format!("Cannot read config {}", path.display()))
}

pub fn config(path: &Option<PathBuf>) -> Config {
    match load(path) {
        Ok(config) => config,
        Err(err) => crashln!("{} {err}.\n{}", *helpers::FAIL, string!(err.root_cause()).white()),
    }
}

fn supervisor(config: &Config) -> Supervisor {
    match Supervisor::from_config(config) {
        Ok(supervisor) => supervisor,
        Err(err) => crashln!("{} Cannot load services.\n{}", *helpers::FAIL, string!(err).white()),
    }
}

pub async fn start(config: &Config, targets: &Targets) {
    let supervisor = supervisor(config);
    println!("{} Applying action startServices", *helpers::SUCCESS);

    match supervisor.start(&targets.selector()).await {
        Ok(report) => render::start(supervisor.registry(), &report),
        Err(err) => crashln!("{} {err}", *helpers::FAIL),
    }
}

pub async fn stop(config: &Config, targets: &Targets) {
    let supervisor = supervisor(config);
    println!("{} Applying action stopServices", *helpers::SUCCESS);

    match supervisor.stop(&targets.selector()).await {
        Ok(report) => render::stop(supervisor.registry(), &report),
        Err(err) => crashln!("{} {err}", *helpers::FAIL),
    }
}

pub async fn restart(config: &Config, targets: &Targets) {
    let supervisor = supervisor(config);
    println!("{} Applying action restartServices", *helpers::SUCCESS);

    match supervisor.restart(&targets.selector()).await {
        Ok(report) => {
            render::stop(supervisor.registry(), &report.stop);
            render::start(supervisor.registry(), &report.start);
        }
        Err(err) => crashln!("{} {err}", *helpers::FAIL),
    }
}

pub async fn status(config: &Config, format: &str) {
    let supervisor = supervisor(config);
    let status = supervisor.status().await;

    render::status(supervisor.registry(), &status, format);
}

pub async fn monitor(config: &Config, interval: Option<u64>) {
    let supervisor = supervisor(config);
    let adb = Adb::new(config.device.binary.clone());
    let mut ticker = time::interval(Duration::from_millis(interval.unwrap_or(config.monitor.interval).max(100)));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (status, devices) = tokio::join!(supervisor.status(), adb.devices());
                render::monitor(supervisor.registry(), &status, &devices);
            }
            _ = &mut ctrl_c => {
                println!("{} Monitor stopped", *helpers::SUCCESS);
                break;
            }
        }
    }
}

pub async fn devices(config: &Config) {
    match Adb::new(config.device.binary.clone()).devices().await {
        Ok(output) => print!("{output}"),
        Err(err) => crashln!("{} {err}", *helpers::FAIL),
    }
}

pub async fn adb(config: &Config, args: &[String]) {
    match Adb::new(config.device.binary.clone()).run(args).await {
        Ok(output) => print!("{output}"),
        Err(err) => crashln!("{} {err}", *helpers::FAIL),
    }
}
