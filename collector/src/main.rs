use clap::{Arg, ArgAction, ArgMatches, Command};
use collector::{cheapest_by_route, read_snapshot, run_snapshot_pipeline};
use common::config::{LoggingConfig, Settings};
use publisher::{GitPublisher, GitPublisherConfig, PublishOutcome, Publisher};
use std::path::Path;
use std::process;

const DEFAULT_CONFIG: &str = "config/collector.toml";

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Sets a custom config file")
}

fn file_arg() -> Arg {
    Arg::new("file")
        .short('f')
        .long("file")
        .value_name("CSV")
        .required(true)
        .help("Snapshot CSV file")
}

fn load_settings(matches: &ArgMatches) -> Settings {
    let config_path = matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_CONFIG);

    match Settings::new(config_path) {
        Ok(settings) => {
            common::logging::init(&settings.logging);
            tracing::info!(config = config_path, "Configuration loaded");
            settings
        }
        Err(e) => {
            eprintln!("Failed to load config {}: {}", config_path, e);
            process::exit(1);
        }
    }
}

fn git_publisher(settings: &Settings) -> GitPublisher {
    GitPublisher::new(GitPublisherConfig::from_config(&settings.publisher))
}

fn describe(outcome: &PublishOutcome) -> String {
    match outcome {
        PublishOutcome::Committed { commit } => format!("committed {}", commit),
        PublishOutcome::Unchanged => "already up to date".to_string(),
    }
}

async fn collect(matches: &ArgMatches) {
    let settings = load_settings(matches);

    let publisher = if settings.publisher.enabled && !matches.get_flag("no-publish") {
        Some(git_publisher(&settings))
    } else {
        None
    };

    match run_snapshot_pipeline(&settings, publisher.as_ref().map(|p| p as &dyn Publisher)).await {
        Ok(summary) => {
            let report = &summary.report;
            println!(
                "Snapshot {} written: {} rows from {} pairs ({} failed, {} without data)",
                report.artifact.path.display(),
                report.rows_written(),
                report.pairs_attempted,
                report.pairs_failed,
                report.pairs_without_data
            );
            if let Some(ref outcome) = summary.published {
                println!("Published: {}", describe(outcome));
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Snapshot pipeline failed");
            eprintln!("Snapshot pipeline error: {}", e);
            process::exit(1);
        }
    }
}

async fn publish(matches: &ArgMatches) {
    let settings = load_settings(matches);
    let file = matches
        .get_one::<String>("file")
        .map(Path::new)
        .unwrap_or_else(|| Path::new(""));

    let Some(destination) = settings.publisher.destination() else {
        eprintln!("No publisher destination configured (publisher.repo)");
        process::exit(1);
    };

    match git_publisher(&settings).publish(file, destination).await {
        Ok(outcome) => println!("Published {}: {}", file.display(), describe(&outcome)),
        Err(e) => {
            tracing::error!(error = %e, file = %file.display(), "Publish failed");
            eprintln!("Publish error: {}", e);
            process::exit(1);
        }
    }
}

fn inspect(matches: &ArgMatches) {
    common::logging::init(&LoggingConfig::default());

    let file = matches
        .get_one::<String>("file")
        .map(Path::new)
        .unwrap_or_else(|| Path::new(""));

    let quotes = match read_snapshot(file) {
        Ok(quotes) => quotes,
        Err(e) => {
            eprintln!("Cannot read snapshot {}: {}", file.display(), e);
            process::exit(1);
        }
    };

    let cheapest = cheapest_by_route(&quotes);
    println!("{}: {} rows, {} routes", file.display(), quotes.len(), cheapest.len());
    for ((origin, destination), quote) in &cheapest {
        println!(
            "  {} -> {}  {}  on {}",
            origin, destination, quote.price, quote.depart_date
        );
    }
}

#[tokio::main]
async fn main() {
    let matches = Command::new("Flight Price Snapshots")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Collects daily flight price snapshots and publishes them to a data repository")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("collect")
                .about("Query every city pair, write today's snapshot and publish it")
                .arg(config_arg())
                .arg(
                    Arg::new("no-publish")
                        .long("no-publish")
                        .action(ArgAction::SetTrue)
                        .help("Write the snapshot but skip publishing"),
                ),
        )
        .subcommand(
            Command::new("publish")
                .about("Publish an existing snapshot file")
                .arg(config_arg())
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("inspect")
                .about("Summarize a snapshot file")
                .arg(file_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("collect", collect_matches)) => collect(collect_matches).await,
        Some(("publish", publish_matches)) => publish(publish_matches).await,
        Some(("inspect", inspect_matches)) => inspect(inspect_matches),
        _ => {
            eprintln!("Please specify a valid subcommand");
            process::exit(1);
        }
    }
}
