use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};

use squadhealth::engine::{assess, HealthEngine};
use squadhealth::error::ErrorSeverity;
use squadhealth::logging::{init_logging, LogFormat, LogLevel};
use squadhealth::risk::RiskCalculator;
use squadhealth::roster::demo_roster;
use squadhealth::scheduler::{self, TickScheduler};
use squadhealth::{
    AppConfig, Athlete, AthleteId, AthleteStatus, HealthError, PrimaryMetrics, SquadSummary,
    StatusClassifier,
};

/// squadhealth - Athlete Health Monitoring CLI
///
/// Scores athlete metrics into injury risk and health, classifies availability and
/// simulates telemetry drift over a demo roster.
#[derive(Parser)]
#[command(name = "squadhealth")]
#[command(author = "squadhealth Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Athlete health scoring and injury-risk classification", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log level (error, warn, info, debug, trace); overrides -v
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    /// Log format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one set of metrics
    Score {
        /// Recent training load (50-100)
        #[arg(long)]
        training_load: f64,

        /// Sleep quality (40-100)
        #[arg(long)]
        sleep_quality: f64,

        /// Fatigue level (10-100)
        #[arg(long)]
        fatigue_level: f64,

        /// Heart rate variability (40-100)
        #[arg(long)]
        hrv: f64,

        /// Classification sensitivity (0-100)
        #[arg(short, long)]
        sensitivity: Option<f64>,
    },

    /// Run simulated ticks over the demo roster, one tick per day
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value = "10")]
        ticks: u32,

        /// Simulator seed (overrides the config file)
        #[arg(long)]
        seed: Option<u64>,

        /// Classification sensitivity (overrides the config file)
        #[arg(short, long)]
        sensitivity: Option<f64>,

        /// Run with simulation switched off
        #[arg(long)]
        disabled: bool,

        /// Manual edit applied before the first tick, as ID:FIELD=VALUE (repeatable)
        #[arg(long = "set", value_name = "ID:FIELD=VALUE", value_parser = parse_edit)]
        edits: Vec<MetricEdit>,
    },

    /// Run the real-time tick scheduler over the demo roster
    Watch {
        /// Seconds between ticks (overrides the config file)
        #[arg(short, long)]
        period_secs: Option<u64>,

        /// Stop after this many seconds
        #[arg(short, long, default_value = "60")]
        duration_secs: u64,
    },

    /// Manage the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}

/// Manual metric edit given on the command line
#[derive(Debug, Clone, PartialEq)]
struct MetricEdit {
    athlete_id: AthleteId,
    field: String,
    value: f64,
}

/// Parse `ID:FIELD=VALUE`. The field name is checked by the engine.
fn parse_edit(s: &str) -> std::result::Result<MetricEdit, String> {
    let (id, assignment) = s
        .split_once(':')
        .ok_or_else(|| format!("expected ID:FIELD=VALUE, got '{}'", s))?;
    let (field, value) = assignment
        .split_once('=')
        .ok_or_else(|| format!("expected ID:FIELD=VALUE, got '{}'", s))?;

    let athlete_id = id
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("invalid athlete id '{}'", id))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid metric value '{}'", value))?;

    Ok(MetricEdit {
        athlete_id: AthleteId(athlete_id),
        field: field.trim().to_string(),
        value,
    })
}

#[derive(Tabled)]
struct AthleteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Team")]
    team: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Health")]
    health: u8,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Load")]
    load: String,
    #[tabled(rename = "Sleep")]
    sleep: String,
    #[tabled(rename = "Fatigue")]
    fatigue: String,
    #[tabled(rename = "HRV")]
    hrv: String,
    #[tabled(rename = "Trend")]
    trend: String,
}

impl From<&Athlete> for AthleteRow {
    fn from(athlete: &Athlete) -> Self {
        let primary = athlete.metrics.primary();
        AthleteRow {
            id: athlete.id.to_string(),
            name: athlete.name.clone(),
            team: athlete.team.clone(),
            status: athlete.status.to_string(),
            health: athlete.health_score(),
            risk: athlete.metrics.rounded_injury_risk().to_string(),
            load: format!("{:.0}", primary.training_load),
            sleep: format!("{:.0}", primary.sleep_quality),
            fatigue: format!("{:.0}", primary.fatigue_level),
            hrv: format!("{:.0}", primary.heart_rate_variability),
            trend: format!("{:?}", athlete.history.trend()),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        report_error(&err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let init_only = matches!(cli.command, Commands::Config { init: true, .. });
    let mut config = match &cli.config {
        // `config --init` is how a file at a new path gets created
        Some(path) if init_only => AppConfig::load_if_exists(path)?,
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };
    // Flags apply to this run only and never reach a saved file
    let logging = config
        .logging
        .clone()
        .with_overrides(cli.verbose, cli.log_level, cli.log_format);
    init_logging(&logging)?;

    match cli.command {
        Commands::Score {
            training_load,
            sleep_quality,
            fatigue_level,
            hrv,
            sensitivity,
        } => {
            let sensitivity = sensitivity.unwrap_or(config.engine.sensitivity);
            run_score(
                PrimaryMetrics::new(training_load, sleep_quality, fatigue_level, hrv),
                sensitivity,
            );
        }

        Commands::Simulate {
            ticks,
            seed,
            sensitivity,
            disabled,
            edits,
        } => {
            if let Some(s) = sensitivity {
                config.engine.sensitivity = s;
            }
            if seed.is_some() {
                config.engine.seed = seed;
            }
            if disabled {
                config.engine.simulation_enabled = false;
            }
            run_simulation(&config, ticks, &edits)?;
        }

        Commands::Watch {
            period_secs,
            duration_secs,
        } => {
            if let Some(p) = period_secs {
                config.engine.tick_interval_secs = p.max(1);
            }
            let runtime = tokio::runtime::Runtime::new()
                .context("Failed to start the async runtime")?;
            runtime.block_on(run_watch(&config, Duration::from_secs(duration_secs)));
        }

        Commands::Config { init, show } => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(AppConfig::default_config_path);
            if init {
                config.save_to_file(&path)?;
                println!(
                    "{}",
                    format!("✓ Wrote configuration to {}", path.display()).green()
                );
            }
            if show || !init {
                println!("{}", format!("# {}", path.display()).dimmed());
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

/// Print engine errors in their user-facing form, anything else with its context chain
fn report_error(err: &anyhow::Error) {
    match err.chain().find_map(|cause| cause.downcast_ref::<HealthError>()) {
        Some(health) => {
            match health.severity() {
                ErrorSeverity::Error => tracing::error!(error = %health, "Command failed"),
                ErrorSeverity::Warning => tracing::warn!(error = %health, "Command rejected"),
            }
            let label = if health.severity().to_tracing_level() == tracing::Level::ERROR {
                "Error:".red().bold()
            } else {
                "Warning:".yellow().bold()
            };
            eprintln!("{} {}", label, health.user_message());
        }
        None => eprintln!("{} {:#}", "Error:".red().bold(), err),
    }
}

fn build_engine(config: &AppConfig) -> HealthEngine {
    let rng = match config.engine.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    HealthEngine::new(config.engine_config(), config.simulator(), rng)
}

fn run_score(metrics: PrimaryMetrics, sensitivity: f64) {
    let assessment = assess(metrics, sensitivity);
    let breakdown = RiskCalculator::breakdown(assessment.metrics.primary());

    println!("{}", "Health assessment".cyan().bold());
    println!("  Injury risk:  {:.1}", assessment.metrics.injury_risk());
    println!("  Health score: {}", assessment.metrics.health_score());
    println!(
        "  Threshold:    {:.0} (sensitivity {:.0})",
        StatusClassifier::threshold(sensitivity),
        sensitivity
    );
    println!(
        "  Status:       {} ({})",
        colored_status(assessment.status),
        assessment.status.description()
    );
    println!("  Main factor:  {}", breakdown.dominant_factor());
    println!("  {}", assessment.status.recommendation().dimmed());
}

fn run_simulation(config: &AppConfig, ticks: u32, edits: &[MetricEdit]) -> Result<()> {
    let mut engine = build_engine(config);
    let start = Local::now().date_naive();
    for athlete in demo_roster() {
        engine.create_athlete_on(athlete, start);
    }

    for edit in edits {
        let athlete = engine.set_metric_on(edit.athlete_id, &edit.field, edit.value, start)?;
        println!(
            "  [{}] {:<15} {} set to {}, health {:>3}  {}",
            start,
            athlete.name,
            edit.field,
            edit.value,
            athlete.health_score(),
            colored_status(athlete.status)
        );
    }

    println!(
        "{}",
        format!(
            "Simulating {} ticks over {} athletes (sensitivity {:.0})",
            ticks,
            engine.len(),
            engine.config().sensitivity
        )
        .blue()
        .bold()
    );

    for tick in 1..=ticks {
        let date = start
            .checked_add_days(Days::new(u64::from(tick)))
            .unwrap_or(NaiveDate::MAX);
        for athlete in engine.run_tick(date) {
            println!(
                "  [{}] {:<15} health {:>3}  {}",
                date,
                athlete.name,
                athlete.health_score(),
                colored_status(athlete.status)
            );
        }
    }

    let athletes = engine.athletes();
    print_roster(&athletes, engine.summary());
    print_flagged(&athletes);
    Ok(())
}

/// Follow-up advice for every athlete at risk or injured
fn print_flagged(athletes: &[Arc<Athlete>]) {
    let flagged: Vec<&Arc<Athlete>> = athletes.iter().filter(|a| a.status.is_flagged()).collect();
    if flagged.is_empty() {
        return;
    }

    println!("{}", "Flagged athletes".yellow().bold());
    for athlete in flagged {
        println!(
            "  {:<15} {}  {}",
            athlete.name,
            colored_status(athlete.status),
            athlete.status.recommendation().dimmed()
        );
    }
}

async fn run_watch(config: &AppConfig, duration: Duration) {
    let mut engine = build_engine(config);
    for athlete in demo_roster() {
        engine.create_athlete(athlete);
    }
    let engine = scheduler::shared(engine);

    let handle = TickScheduler::spawn(Arc::clone(&engine), config.tick_interval());
    let mut reports = handle.subscribe();
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    println!(
        "{}",
        format!(
            "Watching roster, one tick every {}s for {}s",
            config.tick_interval().as_secs(),
            duration.as_secs()
        )
        .blue()
        .bold()
    );

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            report = reports.recv() => match report {
                Ok(report) => {
                    println!("{}", format!("Tick {} ({} updated)", report.tick, report.changed.len()).dimmed());
                    for athlete in &report.changed {
                        println!(
                            "  {:<15} health {:>3}  {}",
                            athlete.name,
                            athlete.health_score(),
                            colored_status(athlete.status)
                        );
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Display fell behind the scheduler");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    handle.shutdown().await;

    let engine = engine.lock().await;
    let athletes = engine.athletes();
    print_roster(&athletes, engine.summary());
    print_flagged(&athletes);
}

fn print_roster(athletes: &[Arc<Athlete>], summary: SquadSummary) {
    let rows: Vec<AthleteRow> = athletes.iter().map(|a| AthleteRow::from(a.as_ref())).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    println!(
        "Total {}  |  {} active  |  {} at risk  |  {} injured  |  {} reserve",
        summary.total,
        summary.active.to_string().green(),
        summary.at_risk.to_string().yellow(),
        summary.injured.to_string().red(),
        summary.reserve
    );
}

fn colored_status(status: AthleteStatus) -> ColoredString {
    match status {
        AthleteStatus::Active => status.to_string().green(),
        AthleteStatus::AtRisk => status.to_string().yellow(),
        AthleteStatus::Injured => status.to_string().red().bold(),
        AthleteStatus::Reserve => status.to_string().normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edit() {
        let edit = parse_edit("2:fatigueLevel=90").unwrap();
        assert_eq!(
            edit,
            MetricEdit {
                athlete_id: AthleteId(2),
                field: "fatigueLevel".to_string(),
                value: 90.0,
            }
        );

        assert_eq!(parse_edit(" 1 : hrv = 55.5 ").unwrap().value, 55.5);
        // Unknown names are left for the engine to reject
        assert_eq!(parse_edit("1:stamina=3").unwrap().field, "stamina");
    }

    #[test]
    fn test_parse_edit_rejects_malformed_input() {
        assert!(parse_edit("fatigueLevel=90").is_err());
        assert!(parse_edit("2:fatigueLevel").is_err());
        assert!(parse_edit("two:fatigueLevel=90").is_err());
        assert!(parse_edit("2:fatigueLevel=high").is_err());
    }

    #[test]
    fn test_cli_parses_log_overrides() {
        let cli = Cli::try_parse_from([
            "squadhealth",
            "--log-level",
            "debug",
            "--log-format",
            "json",
            "score",
            "--training-load",
            "80",
            "--sleep-quality",
            "70",
            "--fatigue-level",
            "30",
            "--hrv",
            "60",
        ])
        .unwrap();

        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(Cli::try_parse_from(["squadhealth", "--log-level", "loud", "config"]).is_err());
    }

    #[test]
    fn test_cli_collects_repeated_edits() {
        let cli = Cli::try_parse_from([
            "squadhealth",
            "simulate",
            "--set",
            "1:trainingLoad=95",
            "--set",
            "3:sleep_quality=45",
        ])
        .unwrap();

        match cli.command {
            Commands::Simulate { edits, ticks, .. } => {
                assert_eq!(ticks, 10);
                assert_eq!(edits.len(), 2);
                assert_eq!(edits[1].athlete_id, AthleteId(3));
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_engine_errors_survive_anyhow() {
        let err: anyhow::Error = HealthError::NotFound {
            athlete_id: AthleteId(9),
        }
        .into();
        let found = err.chain().find_map(|cause| cause.downcast_ref::<HealthError>());
        assert!(found.unwrap().user_message().contains("id 9"));
    }
}
