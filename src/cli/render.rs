use colored::Colorize;
use serde::Serialize;
use serde_json::json;

use voice_agent::{
    file,
    helpers::{self, ColoredString},
    supervisor::{StartReport, StatusReport, StopReport},
    Registry, Result,
};

use tabled::{
    settings::{
        object::{Columns, Rows},
        style::{BorderColor, Style},
        themes::Colorization,
        Color, Modify, Width,
    },
    Table, Tabled,
};

fn name<'r>(registry: &'r Registry, id: &'r str) -> &'r str { registry.get(id).map_or(id, |service| service.name.as_str()) }

pub fn start(registry: &Registry, report: &StartReport) {
    for id in &report.skipped {
        println!("{} {} is already running", *helpers::WARN, name(registry, id));
    }

    if report.outcomes.is_empty() {
        println!("{} All selected services are already running", *helpers::SUCCESS);
        return;
    }

    for id in report.succeeded() {
        println!("{} Started {} ✓", *helpers::SUCCESS, name(registry, id));
    }

    for (id, reason) in report.failed() {
        println!("{} Failed to start {}: {}", *helpers::FAIL, name(registry, id), reason.white());
    }

    if !report.is_success() {
        println!("{} Started {}/{} service(s)", *helpers::WARN, report.succeeded().count(), report.outcomes.len());
    }
}

pub fn stop(registry: &Registry, report: &StopReport) {
    if report.stopped.is_empty() && report.still_running.is_empty() {
        println!("{} No running services to stop", *helpers::SUCCESS);
        return;
    }

    for id in &report.stopped {
        println!("{} Stopped {} ✓", *helpers::SUCCESS, name(registry, id));
    }

    if !report.is_success() {
        println!("{} Some services may still be running", *helpers::WARN);
        for id in &report.still_running {
            println!(" {} {} is still running", "-".yellow(), name(registry, id));
        }
    }
}

#[derive(Tabled, Debug)]
struct ServiceItem {
    id: ColoredString,
    name: String,
    port: String,
    status: ColoredString,
    #[tabled(rename = "directory")]
    dir: String,
    #[tabled(skip)]
    running: bool,
}

impl Serialize for ServiceItem {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let trimmed_json = json!({
            "id": &self.id,
            "name": &self.name.trim(),
            "port": &self.port.trim(),
            "status": &self.status,
            "running": &self.running,
            "dir": &self.dir.trim(),
        });

        trimmed_json.serialize(serializer)
    }
}

fn items(registry: &Registry, status: &StatusReport) -> Vec<ServiceItem> {
    let home = home::home_dir().unwrap_or_default();

    registry
        .iter()
        .map(|service| {
            let running = status.is_running(&service.id);

            ServiceItem {
                running,
                status: helpers::status(running),
                id: service.id.cyan().bold().into(),
                name: format!("{}   ", service.name),
                port: service.port.map_or(String::from("n/a  "), |port| format!("{port}  ")),
                dir: format!("{}  ", file::make_relative(&service.dir, &home).display()),
            }
        })
        .collect()
}

fn table(items: &[ServiceItem]) -> String {
    Table::new(items)
        .with(Style::rounded().remove_verticals())
        .with(BorderColor::filled(Color::FG_BRIGHT_BLACK))
        .with(Colorization::exact([Color::FG_BRIGHT_CYAN], Rows::first()))
        .with(Modify::new(Columns::single(4)).with(Width::truncate(40).suffix("...  ")))
        .to_string()
}

pub fn status(registry: &Registry, status: &StatusReport, format: &str) {
    let items = items(registry, status);

    match format {
        "raw" => println!("{:?}", status),
        "json" => match serde_json::to_string(&items) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("{} Cannot serialize status: {err}", *helpers::FAIL),
        },
        _ => {
            println!("{}", table(&items));
            println!(" {}", format!("{}/{} service(s) running", status.running(), registry.len()).white());
        }
    }
}

pub fn monitor(registry: &Registry, status: &StatusReport, devices: &Result<String>) {
    print!("\x1B[2J\x1B[1;1H");
    println!("{}", format!(" Voice Agent monitor | {} ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")).on_bright_white().black());
    println!("{}", table(&items(registry, status)));

    println!("{}", "Devices".bright_cyan());
    match devices {
        Ok(output) => {
            let lines: Vec<&str> = output.lines().skip(1).filter(|line| !line.trim().is_empty()).collect();
            match lines.is_empty() {
                true => println!(" {} none attached", "-".bright_black()),
                false => lines.iter().for_each(|line| println!(" {} {line}", "-".bright_black())),
            }
        }
        Err(err) => println!(" {} unavailable ({err})", "-".yellow()),
    }

    println!("\n {}", "Press Ctrl-C to exit".white());
}
