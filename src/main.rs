mod admin;
mod cli;
mod config;
mod db;
mod defaults;
mod error;
mod extract;
mod fetch;
mod gate;
mod kv;
mod models;
mod render;
mod session;
mod store;
mod terminal;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::config::{Config, load_config, validate_config};
use crate::extract::Extraction;
use crate::fetch::ContentGateway;
use crate::gate::{AccessGate, AdminGate, GateStatus, UNLOCK_DENIED};
use crate::session::BrowserSession;
use crate::store::{ECHOES, MOMENTS, SITE_CONFIG};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config).with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.station.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    info!(config_path = %cli.config.display(), "config loaded");

    validate_config(&config).context("config validation failed")?;
    info!("config validated successfully");

    let pacing = config.pacing.parse()?;
    let tz = config.timezone();

    match cli.command {
        Commands::Validate => {
            println!("Configuration is valid.");
        }
        Commands::Latest => {
            let gateway = ContentGateway::new(&config.ghost, tz)?;
            match gateway.get_latest().await {
                Some(t) if cli.json => print_json(&t)?,
                Some(t) => println!("{}", render::transmission_summary(&t)),
                None => println!("No signal. The relay is silent."),
            }
        }
        Commands::Archive => {
            let gateway = ContentGateway::new(&config.ghost, tz)?;
            let all = gateway.get_all().await;
            if cli.json {
                print_json(&all)?;
            } else if all.is_empty() {
                println!("Archive empty.");
            } else {
                for t in &all {
                    println!("{}\n", render::transmission_summary(t));
                }
            }
        }
        Commands::Read { slug } => {
            let gateway = ContentGateway::new(&config.ghost, tz)?;
            match gateway.get_by_slug(&slug).await {
                Some(t) if cli.json => print_json(&t)?,
                Some(t) => println!("{}", render::transmission_full(&t)),
                None => println!("Transmission '{slug}' not found."),
            }
        }
        Commands::Signals => {
            let session = open_session(&config).await?;
            let echoes = ECHOES.get(session.local()).await?;
            if cli.json {
                print_json(&echoes)?;
            } else {
                for echo in &echoes {
                    println!("{}", render::echo_line(echo));
                }
            }
        }
        Commands::Frequencies => {
            let frequencies = store::get_frequencies();
            if cli.json {
                print_json(&frequencies)?;
            } else {
                for f in frequencies {
                    println!("{}\n", render::frequency_block(f));
                }
            }
        }
        Commands::Unlock => {
            let session = open_session(&config).await?;
            let gate = AccessGate::with_passphrase(&config.gate.visual_passphrase);
            let candidate =
                rpassword::prompt_password_stdout("Operator passcode: ").context("reading operator passcode")?;
            println!("Verifying...");
            if gate.unlock(&session, &candidate, &pacing, Utc::now()).await? {
                println!("Clearance accepted. Run 'station445 gallery'.");
            } else {
                println!("{UNLOCK_DENIED}");
            }
        }
        Commands::Gallery => {
            let session = open_session(&config).await?;
            let gate = AccessGate::with_passphrase(&config.gate.visual_passphrase);
            match gate.mount(&session, Utc::now()).await? {
                GateStatus::Authorized => {
                    let moments = MOMENTS.get(session.local()).await?;
                    let cancel = cancel_on_ctrl_c();
                    let revealed = if cli.json {
                        true
                    } else {
                        terminal::run_uplink(&pacing, &cancel, |line| println!("{line}")).await
                    };
                    if revealed {
                        if cli.json {
                            print_json(&moments)?;
                        } else {
                            println!();
                            for moment in &moments {
                                println!("{}\n", render::moment_block(moment));
                            }
                        }
                    }
                }
                GateStatus::Denied | GateStatus::Checking => {
                    println!("ACCESS DENIED. Authorization token missing or expired. Run 'station445 unlock'.");
                }
            }
        }
        Commands::Extract { id, output } => {
            let session = open_session(&config).await?;
            let gate = AccessGate::with_passphrase(&config.gate.visual_passphrase);
            if gate.mount(&session, Utc::now()).await? != GateStatus::Authorized {
                anyhow::bail!("visual archive is locked; run 'station445 unlock' first");
            }
            let moments = MOMENTS.get(session.local()).await?;
            let moment = moments
                .iter()
                .find(|m| m.id == id)
                .ok_or_else(|| anyhow::anyhow!("no visual asset with id '{id}'"))?;

            println!("Extracting {}...", moment.id);
            let client = reqwest::Client::new();
            match extract::extract_moment(&client, moment, &output, &pacing).await {
                Extraction::Saved(path) => println!("Saved to {}", path.display()),
                Extraction::OpenExternally(url) => println!("Extraction failed. Open the asset directly: {url}"),
            }
        }
        Commands::Admin => {
            let session = open_session(&config).await?;
            let site = SITE_CONFIG.get(session.local()).await?;
            println!("{}", render::banner(&site));

            let console = admin::Console {
                session: &session,
                gate: AdminGate::with_passphrase(&config.gate.admin_passphrase),
                pacing,
                tz,
            };
            let cancel = cancel_on_ctrl_c();
            let result = console.run(&cancel).await;
            session.end().await?;
            result?;
        }
    }

    Ok(())
}

async fn open_session(config: &Config) -> Result<BrowserSession> {
    let pool = db::create_pool(config).await.context("creating database")?;
    info!(db_path = %config.db_path().display(), "profile storage ready");
    Ok(BrowserSession::open(&pool))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("encoding JSON output")?);
    Ok(())
}

/// Token cancelled on Ctrl-C, so scripted sequences stop instead of the process dying mid-line.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    cancel
}
