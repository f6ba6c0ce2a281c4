use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tabled::{Table, Tabled};

use dishcore::config::AppConfig;
use dishcore::consolidation::DeviceConsolidator;
use dishcore::import::{group_by_date, import_readings};
use dishcore::logging::{init_logging, LogLevel};
use dishcore::models::{BaseTargets, ConsolidatedReading, ScalarMetric};
use dishcore::targets::TargetAdjuster;

/// DishCore - Wearable Nutrition CLI
///
/// Consolidates daily readings from multiple wearable devices and computes
/// activity-adjusted calorie and macro targets.
#[derive(Parser)]
#[command(name = "dishcore")]
#[command(version = "0.1.0")]
#[command(about = "Wearable consolidation and nutrition target adjustment", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge same-day readings from multiple devices into one record
    Consolidate {
        /// Readings file exported by the sync process (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Only consolidate this day (YYYY-MM-DD); defaults to all days
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compute activity-adjusted calorie/macro targets for a day
    Targets {
        /// Readings file exported by the sync process (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Day to adjust for (YYYY-MM-DD); defaults to the latest day in the file
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Base daily calorie goal in kcal
        #[arg(long)]
        calories: u32,

        /// Base daily protein goal in grams
        #[arg(long)]
        protein: u32,

        /// Base daily carbohydrate goal in grams
        #[arg(long)]
        carbs: u32,

        /// Base daily fat goal in grams
        #[arg(long)]
        fat: u32,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show or initialize application configuration
    Config {
        /// Print the active configuration
        #[arg(short, long)]
        list: bool,

        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Sources")]
    sources: String,
}

#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "")]
    name: String,
    #[tabled(rename = "Base")]
    base: String,
    #[tabled(rename = "Adjustment")]
    adjustment: String,
    #[tabled(rename = "Adjusted")]
    adjusted: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_path()?,
    };
    let mut config = AppConfig::load_or_default(&config_path)?;

    if let Some(level) = LogLevel::from_verbosity(cli.verbose) {
        config.logging.level = level;
    }
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Consolidate { file, date, json } => {
            let readings = import_readings(&file).map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let by_date = group_by_date(readings);
            let consolidator = DeviceConsolidator::with_priorities(config.devices);

            let merged: Vec<ConsolidatedReading> = by_date
                .iter()
                .filter(|(d, _)| date.map_or(true, |wanted| **d == wanted))
                .filter_map(|(_, day)| consolidator.consolidate(day))
                .collect();

            if merged.is_empty() {
                println!("{}", "No readings matched".yellow());
                return Ok(());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&merged)?);
            } else {
                for reading in &merged {
                    print_consolidated(reading);
                }
            }
        }

        Commands::Targets {
            file,
            date,
            calories,
            protein,
            carbs,
            fat,
            json,
        } => {
            let readings = import_readings(&file).map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let by_date = group_by_date(readings);
            let day = match date {
                Some(d) => d,
                None => *by_date.keys().last().context("no readings in file")?,
            };

            let consolidator = DeviceConsolidator::with_priorities(config.devices);
            let consolidated = by_date.get(&day).and_then(|r| consolidator.consolidate(r));

            let base = BaseTargets {
                target_calories: calories,
                target_protein: protein,
                target_carbs: carbs,
                target_fat: fat,
            };
            let adjuster = TargetAdjuster::with_config(config.adjustment);
            let adjusted = adjuster.adjust(&base, consolidated.as_ref());

            if json {
                println!("{}", serde_json::to_string_pretty(&adjusted)?);
            } else {
                println!(
                    "{} {}",
                    "Adjusted targets for".green().bold(),
                    day.to_string().green().bold()
                );
                let rows = vec![
                    TargetRow {
                        name: "Calories".to_string(),
                        base: format!("{} kcal", base.target_calories),
                        adjustment: format_delta(adjusted.adjustments.calories, "kcal"),
                        adjusted: format!("{} kcal", adjusted.calories),
                    },
                    TargetRow {
                        name: "Protein".to_string(),
                        base: format!("{} g", base.target_protein),
                        adjustment: format_delta(adjusted.adjustments.protein, "g"),
                        adjusted: format!("{} g", adjusted.protein),
                    },
                    TargetRow {
                        name: "Carbs".to_string(),
                        base: format!("{} g", base.target_carbs),
                        adjustment: format_delta(adjusted.adjustments.carbs, "g"),
                        adjusted: format!("{} g", adjusted.carbs),
                    },
                    TargetRow {
                        name: "Fat".to_string(),
                        base: format!("{} g", base.target_fat),
                        adjustment: format_delta(adjusted.adjustments.fat, "g"),
                        adjusted: format!("{} g", adjusted.fat),
                    },
                ];
                println!("{}", Table::new(rows));
                if adjusted.recovery_adjusted {
                    println!("{}", "Targets scaled for recovery/sleep/stress".cyan());
                }
                if consolidated.is_none() {
                    println!(
                        "{}",
                        "No wearable data for this day; base targets unchanged".dimmed()
                    );
                }
            }
        }

        Commands::Config { list, init } => {
            if init {
                if config_path.exists() {
                    println!(
                        "{} {}",
                        "Config already exists at".yellow(),
                        config_path.display()
                    );
                } else {
                    config.save(&config_path)?;
                    println!(
                        "{} {}",
                        "Wrote default config to".green(),
                        config_path.display()
                    );
                }
            }
            if list || !init {
                println!("{} {}", "Config file:".bold(), config_path.display());
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn print_consolidated(reading: &ConsolidatedReading) {
    println!(
        "{} {}",
        "Consolidated".green().bold(),
        reading.date.to_string().green().bold()
    );

    let devices: Vec<String> = reading.devices_used.iter().map(|d| d.to_string()).collect();
    println!("  Devices: {}", devices.join(", "));

    let mut rows = Vec::new();
    for metric in ScalarMetric::ALL {
        if let Some(value) = reading.raw_metric(metric) {
            let sources = reading
                .metric_sources
                .get(&metric)
                .map(|devices| {
                    devices
                        .iter()
                        .map(|d| d.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            rows.push(MetricRow {
                metric: metric.name().to_string(),
                value: format!("{}", value),
                sources,
            });
        }
    }
    println!("{}", Table::new(rows));

    if !reading.workout_sessions.is_empty() {
        println!("  Workouts:");
        for session in &reading.workout_sessions {
            println!(
                "    {} at {} ({} kcal)",
                session.kind,
                session.start_time,
                session
                    .calories
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "?".to_string())
            );
        }
    }
}

fn format_delta(delta: i32, unit: &str) -> String {
    if delta == 0 {
        format!("0 {}", unit)
    } else {
        format!("{:+} {}", delta, unit)
    }
}
