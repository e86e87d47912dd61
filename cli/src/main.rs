mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use crate::commands::{
    cmd_average, cmd_check, cmd_daemon, cmd_delete, cmd_drink, cmd_history, cmd_log, cmd_reset,
    cmd_summary, cmd_target_set, cmd_target_show,
};
use crate::config::Config;
use intake_core::service::IntakeService;

#[derive(Parser)]
#[command(
    name = "intake",
    version,
    about = "A simple nutrition and hydration tracker CLI",
    long_about = "\n\n  ██╗███╗   ██╗████████╗ █████╗ ██╗  ██╗███████╗
  ██║████╗  ██║╚══██╔══╝██╔══██╗██║ ██╔╝██╔════╝
  ██║██╔██╗ ██║   ██║   ███████║█████╔╝ █████╗
  ██║██║╚██╗██║   ██║   ██╔══██║██╔═██╗ ██╔══╝
  ██║██║ ╚████║   ██║   ██║  ██║██║  ██╗███████╗
  ╚═╝╚═╝  ╚═══╝   ╚═╝   ╚═╝  ╚═╝╚═╝  ╚═╝╚══════╝
        eat enough. drink enough.
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a meal
    Log {
        /// Meal category: breakfast, lunch, dinner, snack
        category: String,
        /// Calories consumed
        calories: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log water
    Drink {
        /// Amount (e.g. "500ml", "0.5l"; bare numbers are millilitres)
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check what a prospective addition would do to today's totals
    Check {
        /// Prospective calories
        #[arg(long)]
        calories: Option<i64>,
        /// Prospective water amount (e.g. "500ml", "0.5l")
        #[arg(long)]
        water: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show daily summary (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-day totals for the last N days
    History {
        /// Number of days to show
        #[arg(short, long, default_value = "7")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the trailing 30-day daily calorie average
    Average {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a record by ID
    Delete {
        /// Record ID to delete
        record_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear today's records and zero the running totals
    Reset {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the midnight reset loop in the foreground
    Daemon,
    /// Manage daily water/calorie targets
    Target {
        #[command(subcommand)]
        command: TargetCommands,
    },
}

#[derive(Subcommand)]
enum TargetCommands {
    /// Set daily target(s)
    Set {
        /// Daily water target in litres
        #[arg(long)]
        water: Option<f64>,
        /// Daily calorie target
        #[arg(long)]
        calories: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show current targets
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let mut svc = IntakeService::new(&config.db_path)?;

    match cli.command {
        Commands::Log {
            category,
            calories,
            json,
        } => cmd_log(&mut svc, &category, calories, json),
        Commands::Drink { amount, json } => cmd_drink(&mut svc, &amount, json),
        Commands::Check {
            calories,
            water,
            json,
        } => cmd_check(&svc, calories, water.as_deref(), json),
        Commands::Summary { date, json } => cmd_summary(&svc, date, json),
        Commands::History { days, json } => cmd_history(&svc, days, json),
        Commands::Average { json } => cmd_average(&svc, json),
        Commands::Delete { record_id, json } => cmd_delete(&mut svc, record_id, json),
        Commands::Reset { json } => cmd_reset(&mut svc, json),
        Commands::Daemon => cmd_daemon(&mut svc).await,
        Commands::Target { command } => match command {
            TargetCommands::Set {
                water,
                calories,
                json,
            } => cmd_target_set(&mut svc, water, calories, json),
            TargetCommands::Show { json } => cmd_target_show(&svc, json),
        },
    }
}
