use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use trajectory::api::{ServerConfig, run_http_server};
use trajectory::core::{
    FireInputs, GrowthRateConfig, ProjectionOptions, RawAccount, Scenarios,
    compute_fire_trajectory, compute_net_worth_projection_from_raw,
};
use trajectory::logging::{LogFormat, init_tracing};

#[derive(Parser, Debug)]
#[command(
    name = "trajectory",
    about = "Net-worth projections and FIRE timelines from account balances"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        env = "TRAJECTORY_LOG_FORMAT",
        default_value_t = LogFormat::Text
    )]
    log_format: LogFormat,
    #[arg(
        long,
        global = true,
        env = "TRAJECTORY_GROWTH_RATES",
        help = "JSON file of per-category rate and term overrides"
    )]
    growth_rates: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(env = "TRAJECTORY_PORT", default_value_t = 8080)]
        port: u16,
        #[arg(long, env = "TRAJECTORY_HOST", default_value = "0.0.0.0")]
        host: IpAddr,
    },
    /// Project a portfolio read from a JSON array of accounts.
    Project {
        #[arg(long)]
        accounts: PathBuf,
        #[arg(long, help = "Custom net-worth milestone")]
        target: Option<f64>,
    },
    /// Compute savings rate, FIRE number and years to FIRE.
    Fire {
        #[arg(long, help = "Monthly take-home income")]
        income: f64,
        #[arg(long, help = "Monthly expenses")]
        expenses: f64,
        #[arg(long, default_value_t = 0.0)]
        net_worth: f64,
        #[arg(long)]
        age: Option<u32>,
        #[arg(
            long,
            help = "Expected annual return as a fraction; scenarios are two points either side"
        )]
        expected_return: Option<f64>,
    },
}

fn load_growth_rates(path: Option<&Path>) -> Result<GrowthRateConfig> {
    match path {
        Some(path) => GrowthRateConfig::load(path)
            .with_context(|| format!("loading growth rates from {}", path.display())),
        None => Ok(GrowthRateConfig::default()),
    }
}

fn load_accounts(path: &Path) -> Result<Vec<RawAccount>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading accounts from {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing accounts in {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    let growth_rates = load_growth_rates(cli.growth_rates.as_deref())?;

    match cli.command {
        Command::Serve { port, host } => {
            run_http_server(ServerConfig {
                host,
                port,
                growth_rates,
            })
            .await
            .context("HTTP server failed")?;
        }
        Command::Project { accounts, target } => {
            let raw_accounts = load_accounts(&accounts)?;
            let options = ProjectionOptions {
                target_net_worth: target,
                ..ProjectionOptions::default()
            };
            let projection =
                compute_net_worth_projection_from_raw(raw_accounts, &growth_rates, options);
            println!("{}", serde_json::to_string_pretty(&projection)?);
        }
        Command::Fire {
            income,
            expenses,
            net_worth,
            age,
            expected_return,
        } => {
            let scenarios = match expected_return {
                Some(expected) => Scenarios::around(expected)?,
                None => Scenarios::default(),
            };
            let inputs = FireInputs {
                monthly_income: income,
                monthly_expenses: expenses,
                current_net_worth: net_worth,
                age,
                as_of: Some(Utc::now().date_naive()),
                ..FireInputs::default()
            };
            let trajectory = compute_fire_trajectory(&inputs, &scenarios)?;
            println!("{}", serde_json::to_string_pretty(&trajectory)?);
        }
    }
    Ok(())
}
