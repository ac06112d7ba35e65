//! travel-scout - command line entry point.
//!
//! ```text
//! travel-scout [digest] [--save]
//! travel-scout tree
//! travel-scout add-trip <destination> <start> <end> <budget> [style]
//! travel-scout add-visit <name> [country]
//! travel-scout profile [interest...]
//! ```

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_scout::{Config, TravelScout, Trip, Visit};

const USAGE: &str = "usage: travel-scout [digest [--save] | tree | add-trip <destination> <start> <end> <budget> [style] | add-visit <name> [country] | profile [interest...]]";

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_scout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, data_dir={}, offline={}",
        config.model,
        config.data_dir.display(),
        config.offline
    );
    let scout = TravelScout::from_config(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("digest");

    match command {
        "digest" => {
            let save = args.iter().skip(1).any(|a| a == "--save");
            let outcome = scout.generate_weekly_digest(Utc::now().date_naive()).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.success {
                bail!(
                    "digest failed: {}",
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            if let (true, Some(data)) = (save, outcome.data.as_ref()) {
                let path = TravelScout::save_digest(data, &config.data_dir).await?;
                info!("Digest written to {}", path.display());
            }
        }
        "tree" => print!("{}", scout.tree().render()),
        "add-trip" => {
            let [destination, start, end, budget] = match args.get(1..5) {
                Some([d, s, e, b]) => [d, s, e, b],
                _ => bail!(USAGE),
            };
            let trip = Trip::new(
                destination.as_str(),
                parse_date(start)?,
                parse_date(end)?,
                budget.parse().with_context(|| format!("invalid budget '{}'", budget))?,
            );
            let trip = match args.get(5) {
                Some(style) => trip.with_style(style.as_str()),
                None => trip,
            };
            let saved = scout.add_trip(trip).await?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
        "add-visit" => {
            let Some(name) = args.get(1) else {
                bail!(USAGE);
            };
            let mut visit = Visit::new(name.as_str(), "");
            visit.country = args.get(2).cloned();
            let outcome = scout.record_visit(visit).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.success {
                bail!(
                    "could not record visit: {}",
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        "profile" => {
            let mut profile = scout.profile().await?;
            let interests = &args[1..];
            if !interests.is_empty() {
                profile.interests = interests.to_vec();
                scout.save_profile(&profile).await?;
            }
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", raw))
}
