//! Print how busy a Gym Group club is right now.
//!
//! Credentials come from `GYMGROUP_USERNAME` / `GYMGROUP_PASSWORD` (a `.env`
//! file is honoured). Without a gym id the member's home club is queried.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gymgroup_core::{ClientConfig, GymClient};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Gym location id; defaults to the member's home club
    gym_id: Option<String>,

    /// Where the session snapshot is kept
    #[arg(long, env = "GYMGROUP_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Override the API base URL, e.g. to point at the mock server
    #[arg(long, env = "GYMGROUP_BASE_URL")]
    base_url: Option<String>,

    /// Log in even if a saved session exists
    #[arg(long)]
    fresh_login: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = ClientConfig::from_env();
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(state_file) = args.state_file {
        config = config.with_state_file(state_file);
    }

    let mut client = GymClient::with_config(config);
    if args.fresh_login || client.user_id().is_none() {
        client.login().context("logging in")?;
    }

    let occupancy = match &args.gym_id {
        Some(gym_id) => client
            .get_gym_occupancy(gym_id)
            .with_context(|| format!("fetching occupancy for {gym_id}"))?,
        None => client
            .get_home_gym_occupancy()
            .context("fetching home gym occupancy")?,
    };

    match occupancy {
        Some(count) => println!("{count}"),
        None => println!("unknown"),
    }
    Ok(())
}
