pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Portal CLI - database setup and offline helpers for the portal API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Create the administrator role and a first user")]
    SeedAdmin(commands::seed::SeedArgs),

    #[command(about = "Delete expired sessions and SSO ticket markers")]
    Prune,

    #[command(about = "Print the permission catalog")]
    Permissions,

    #[command(about = "Compute a salary breakdown and provident fund accrual")]
    Payroll(commands::payroll::PayrollArgs),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::SeedAdmin(args) => commands::seed::handle(args, output_format).await,
        Commands::Prune => commands::prune::handle(output_format).await,
        Commands::Permissions => commands::permissions::handle(output_format),
        Commands::Payroll(args) => commands::payroll::handle(args, output_format),
    }
}
