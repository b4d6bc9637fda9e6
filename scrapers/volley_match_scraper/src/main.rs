use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use volley_match_scraper::{
    config::ScraperConfig,
    fetch::WebHtmlFetcher,
    identity::ClubIdentity,
    pipeline::{build_records, IngestionPipeline},
    sources::{SourceAdapter, TabularSource},
    store::{InMemoryMatchStore, PgMatchStore},
    types::{MatchRecord, MatchStatus},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Ingests Volley Club Trieste fixtures and results", long_about = None)]
struct Cli {
    /// JSON config file; environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape both federation sites and upsert the club's matches
    Ingest {
        /// Keep results in memory and print them instead of writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Apply database migrations
    Migrate,
    /// Parse a saved regional results page and export the club's matches as CSV
    ParseFile {
        /// Path to the HTML file to process
        #[arg(short, long)]
        file: PathBuf,
        /// CSV destination, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List scheduled matches, soonest first
    Upcoming {
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },
    /// List completed matches, latest first
    Results {
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },
}

fn load_config(path: Option<&Path>) -> Result<ScraperConfig> {
    let mut config = match path {
        Some(path) => ScraperConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => ScraperConfig::default(),
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

async fn ingest(config: &ScraperConfig, dry_run: bool) -> Result<()> {
    let fetcher = WebHtmlFetcher::new(config).context("Failed to create HTTP client")?;
    let sources = SourceAdapter::all_from_config(config);

    if dry_run {
        let pipeline = IngestionPipeline::new(fetcher, InMemoryMatchStore::new(), sources);
        let report = pipeline.run().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let store = PgMatchStore::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    let pipeline = IngestionPipeline::new(fetcher, store, sources);
    let report = pipeline.run().await.context("Ingestion run failed")?;
    info!(
        "Run complete: {} records, {} rows written, {} invalid, {} duplicates collapsed",
        report.records.len(),
        report.rows_written,
        report.invalid_records,
        report.duplicates_collapsed
    );
    Ok(())
}

fn parse_file(config: &ScraperConfig, file: &Path, output: Option<&Path>) -> Result<()> {
    let html = fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
    info!("Processing regional results page: {:?}", file);

    let source = TabularSource::new(
        config.sources.tabular.clone(),
        ClubIdentity::from_config(&config.club),
    );
    let parsed = source.parse(&html)?;
    let (records, invalid) = build_records(parsed.matches);
    if invalid > 0 {
        warn!("Dropped {} invalid records from {:?}", invalid, file);
    }

    let sink: Box<dyn Write> = match output {
        Some(path) => {
            info!("Writing CSV to {:?}", path);
            Box::new(fs::File::create(path)?)
        }
        None => Box::new(io::stdout()),
    };
    write_csv(sink, &records)?;
    info!("Exported {} matches", records.len());
    Ok(())
}

fn write_csv<W: Write>(sink: W, records: &[MatchRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(sink);
    wtr.write_record([
        "kickoff_at",
        "kickoff_estimated",
        "home_team",
        "away_team",
        "home_score",
        "away_score",
        "championship_label",
        "status",
    ])?;
    for record in records {
        wtr.write_record([
            record.kickoff_at.format("%Y-%m-%dT%H:%M").to_string(),
            record.kickoff_estimated.to_string(),
            record.home_team.clone(),
            record.away_team.clone(),
            record.home_score.to_string(),
            record.away_score.to_string(),
            record.championship_label.clone(),
            record.status.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn print_matches(records: &[MatchRecord]) {
    for record in records {
        let score = match record.status {
            MatchStatus::Completed => {
                format!("{}-{}", record.home_score, record.away_score)
            }
            MatchStatus::Scheduled => "vs".to_string(),
        };
        let estimated = if record.kickoff_estimated { " (date to be confirmed)" } else { "" };
        println!(
            "{}{}  [{}]  {} {} {}",
            record.kickoff_at.format("%d/%m/%Y %H:%M"),
            estimated,
            record.championship_label,
            record.home_team,
            score,
            record.away_team
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Ingest { dry_run } => ingest(&config, dry_run).await?,
        Commands::Migrate => {
            let store = PgMatchStore::connect(&config.database)
                .await
                .context("Failed to connect to database")?;
            store.migrate().await?;
        }
        Commands::ParseFile { file, output } => parse_file(&config, &file, output.as_deref())?,
        Commands::Upcoming { limit } => {
            let store = PgMatchStore::connect(&config.database).await?;
            print_matches(&store.upcoming(limit).await?);
        }
        Commands::Results { limit } => {
            let store = PgMatchStore::connect(&config.database).await?;
            print_matches(&store.recent_results(limit).await?);
            info!("{} matches stored in total", store.count().await?);
        }
    }

    Ok(())
}
