//! CLI interface for routine-predictor

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::classifier::{spawn_refresher, Classifier, SystemClock};
use crate::config::{self, Config};
use crate::features::Zone;
use crate::history::HistoryStore;
use crate::inspect::{self, TreeView};

#[derive(Parser)]
#[command(name = "routine-predictor")]
#[command(about = "Learns when recurring activities happen and predicts the likely one for now", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record that an activity happened
    Record {
        /// Activity label
        label: String,
        /// When it happened (RFC 3339, default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Predict the most likely activity
    Predict {
        /// Moment to predict for (RFC 3339, default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Show the attributes extracted from a timestamp
    Features {
        /// Timestamp (RFC 3339, default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Train and show the decision tree
    Tree {
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recorded observations
    History {
        /// Number of most recent observations to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Delete all observations
        #[arg(long)]
        clear: bool,
    },
    /// Keep the model fresh, retraining on the configured interval
    Watch,
    /// Show or reset configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
        /// Print the default configuration file
        #[arg(long)]
        print_default: bool,
    },
}

/// Parse an optional RFC 3339 timestamp, defaulting to now
fn parse_instant(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .with_context(|| format!("Invalid timestamp '{}', expected RFC 3339", s)),
        None => Ok(Utc::now()),
    }
}

fn open_history(config: &Config) -> Result<Arc<HistoryStore>> {
    Ok(Arc::new(HistoryStore::open(config.database_path()?)?))
}

fn build_classifier(config: &Config, store: Arc<HistoryStore>) -> Result<Classifier<String>> {
    let zone = config.model.zone()?;
    Ok(Classifier::new(store, Arc::new(SystemClock), zone))
}

/// Run the CLI with an already loaded configuration
pub async fn run_with(config: Config) -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Record { label, at } => {
            let when = parse_instant(at.as_deref())?;
            let store = open_history(&config)?;
            let record = store.record_at(&label, when)?;
            println!("Recorded '{}' at {}", record.label, record.observed_at.to_rfc3339());
        }
        Commands::Predict { at } => {
            let when = parse_instant(at.as_deref())?;
            let classifier = build_classifier(&config, open_history(&config)?)?;
            let snapshot = classifier.ensure_trained()?;
            match snapshot.tree.classify(&classifier.attributes_at(&when)) {
                Some(label) => println!("{}", label),
                None => println!("No prediction yet: record some activities first."),
            }
        }
        Commands::Features { at } => {
            let when = parse_instant(at.as_deref())?;
            let zone = config.model.zone()?;
            for (id, value) in zone.attributes(&when).iter() {
                println!("{:<12} {}", id.name(), value);
            }
        }
        Commands::Tree { json } => {
            let classifier = build_classifier(&config, open_history(&config)?)?;
            let snapshot = classifier.retrain()?;
            let view = TreeView::from_tree(&snapshot.tree);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                let stats = inspect::stats(&snapshot.tree);
                println!(
                    "Trained on {} observations (depth {}, {} nodes, {} leaves)\n",
                    snapshot.example_count, stats.depth, stats.nodes, stats.leaves
                );
                print!("{}", view.render());
            }
        }
        Commands::History { limit, clear } => {
            let store = open_history(&config)?;
            if clear {
                let deleted = store.clear()?;
                println!("Deleted {} observations.", deleted);
                return Ok(());
            }
            show_history(&store, limit, config.model.zone()?)?;
        }
        Commands::Watch => {
            let classifier = Arc::new(build_classifier(&config, open_history(&config)?)?);
            let every = config.model.refresh_interval();
            println!("Retraining every {} min. Press Ctrl+C to stop.", every.as_secs() / 60);

            let refresher = spawn_refresher(Arc::clone(&classifier), every);
            tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;
            refresher.abort();

            if let Some(label) = classifier.classify_now() {
                println!("Current prediction: {}", label);
            }
        }
        Commands::Config { show, reset, print_default } => {
            if reset {
                config::reset_config()?;
            } else if print_default {
                print!("{}", config::default_config_toml());
            } else if show {
                config::show_config(&config)?;
            } else {
                println!("Use --show to display configuration");
            }
        }
    }

    Ok(())
}

/// Load configuration and run the CLI
pub async fn run() -> Result<()> {
    run_with(Config::load()?).await
}

fn show_history(store: &HistoryStore, limit: usize, zone: Zone) -> Result<()> {
    let total = store.count()?;
    if total == 0 {
        println!("No observations recorded yet.");
        return Ok(());
    }

    println!("Most recent {} of {} observations:", limit.min(total), total);
    for record in store.recent(limit)? {
        let attrs = zone.attributes(&record.observed_at);
        let summary: Vec<String> = attrs.iter().map(|(_, v)| v.to_string()).collect();
        println!(
            "  #{:<5} {}  {:<20} [{}]",
            record.id,
            record.observed_at.format("%Y-%m-%d %H:%M"),
            record.label,
            summary.join(", ")
        );
    }

    println!("\nBy activity:");
    for (label, count) in store.label_counts()? {
        println!("  {:<20} {}", label, count);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instant() {
        let parsed = parse_instant(Some("2024-01-01T08:30:00+02:00")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T06:30:00+00:00");
        assert!(parse_instant(Some("8:30 tomorrow")).is_err());
        assert!(parse_instant(None).is_ok());
    }

    #[test]
    fn test_cli_parses_record() {
        let cli = Cli::try_parse_from(["routine-predictor", "record", "run", "--at", "2024-01-01T07:00:00Z"]).unwrap();
        match cli.command {
            Commands::Record { label, at } => {
                assert_eq!(label, "run");
                assert_eq!(at.as_deref(), Some("2024-01-01T07:00:00Z"));
            }
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
