mod config;
mod populate;
mod rewards;

use clap::{Parser, Subcommand};
use populate::{PopulateBoxes, VerifyDistribution};
use std::error::Error;
use tracing::{error, info};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[derive(Debug, Parser)]
#[clap(name = "hiibox-utils")]
#[clap(about = "Hii Box maintenance CLI", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    PopulateBoxes(PopulateBoxes),
    VerifyDistribution(VerifyDistribution),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = config::load()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", config.rust_log.as_deref().unwrap_or("warn"));
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                format!("hiibox_utils={}", config.utils_log.as_deref().unwrap_or("info"))
                    .parse()
                    .expect("Error parsing directive"),
            ),
        )
        .with_span_events(FmtSpan::FULL)
        .init();

    let cli: Cli = Cli::parse();
    let db = config::get_db_connection(&config).await?;

    match cli.commands {
        Commands::PopulateBoxes(populate_boxes) => {
            populate::populate_boxes(&db, &populate_boxes).await?;
            report(populate::verify_distribution(&db).await?);
        }
        Commands::VerifyDistribution(_) => {
            report(populate::verify_distribution(&db).await?);
        }
    }

    Ok(())
}

fn report(mismatches: usize) {
    if mismatches == 0 {
        info!("Reward distribution matches the prize table");
    } else {
        error!("Reward distribution has {} mismatches", mismatches);
    }
}
