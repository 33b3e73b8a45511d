mod cli;

use crate::cli::Targets;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use colored::Colorize;
use macros_rs::{str, string};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version = str!(cli::get_version(false)), about = "Voice Agent Assistant services")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, global = true, help = "config file (default ~/.voice-agent/config.toml)")]
    config: Option<PathBuf>,
    #[clap(flatten)]
    verbose: Verbosity,
}

#[derive(Subcommand)]
enum Commands {
    /// Start services that are not already running
    Start {
        #[clap(flatten)]
        targets: Targets,
    },
    /// Stop running services
    #[command(alias = "kill")]
    Stop {
        #[clap(flatten)]
        targets: Targets,
    },
    /// Stop then start services
    Restart {
        #[clap(flatten)]
        targets: Targets,
    },
    /// Show which services are running
    #[command(alias = "ls")]
    Status {
        #[arg(long, default_value_t = string!("default"), help = "format output")]
        format: String,
    },
    /// Manage services with action flags
    Service {
        #[arg(short, long, help = "start services")]
        start: bool,
        #[arg(short = 'k', long, help = "stop services")]
        stop: bool,
        #[arg(short, long, help = "restart services")]
        restart: bool,
        #[clap(flatten)]
        targets: Targets,
    },
    /// Redraw service and device status until interrupted
    Monitor {
        #[arg(long, help = "refresh interval in milliseconds")]
        interval: Option<u64>,
    },
    /// List connected Android devices
    Devices,
    /// Pass arguments through to adb
    Adb {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new().filter_level(cli.verbose.log_level_filter()).init();

    let config = cli::config(&cli.config);

    match &cli.command {
        Commands::Start { targets } => cli::start(&config, targets).await,
        Commands::Stop { targets } => cli::stop(&config, targets).await,
        Commands::Restart { targets } => cli::restart(&config, targets).await,
        Commands::Status { format } => cli::status(&config, format).await,
        Commands::Service { start, stop, restart, targets } => match (start, stop, restart) {
            (true, _, _) => cli::start(&config, targets).await,
            (_, true, _) => cli::stop(&config, targets).await,
            (_, _, true) => cli::restart(&config, targets).await,
            _ => println!("{}", "Please specify an action (--start, --stop, or --restart)".yellow()),
        },
        Commands::Monitor { interval } => cli::monitor(&config, *interval).await,
        Commands::Devices => cli::devices(&config).await,
        Commands::Adb { args } => cli::adb(&config, args).await,
    }
}
