//! arxiv-digest — Binary Entrypoint
//! Loads configuration, runs one fetch → filter → mail → persist pass, and exits.
//!
//! Meant to be invoked by cron or a systemd timer. Concurrent invocations against
//! the same seen-ids file are unsupported (no locking).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use arxiv_digest::config::{MailConfig, Settings};
use arxiv_digest::ingest::providers::arxiv::ArxivFeed;
use arxiv_digest::notify::EmailNotifier;
use arxiv_digest::pipeline;
use arxiv_digest::seen::{FileSeenStore, DEFAULT_SEEN_IDS_PATH, ENV_SEEN_IDS_PATH};
use arxiv_digest::Error;

#[derive(Debug, Parser)]
#[command(name = "arxiv-digest", version, about = "Mail a digest of new relevant arXiv papers")]
struct Cli {
    /// Policy file (TOML or JSON); overrides $ARXIV_POLICY_PATH and config/policy.toml.
    #[arg(long)]
    policy: Option<PathBuf>,

    /// File holding already-mailed identifiers, one per line.
    #[arg(long, env = ENV_SEEN_IDS_PATH, default_value = DEFAULT_SEEN_IDS_PATH)]
    seen_ids: PathBuf,

    /// Read a saved Atom response instead of querying the API.
    #[arg(long)]
    feed_file: Option<PathBuf>,

    /// Print the digest instead of mailing it; the seen-ids file is left alone.
    #[arg(long)]
    dry_run: bool,

    /// Log every per-entry filter decision.
    #[arg(short, long)]
    verbose: bool,
}

/// Compact logs by default, JSON when LOG_FORMAT=json. RUST_LOG wins over --verbose.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "arxiv_digest=debug,ingest=debug,relevance=debug,notify=debug,pipeline=debug,warn"
    } else {
        "arxiv_digest=info,ingest=info,notify=info,pipeline=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn build_feed(cli: &Cli, settings: &Settings) -> Result<ArxivFeed, Error> {
    match &cli.feed_file {
        Some(p) => {
            let xml = std::fs::read_to_string(p)
                .with_context(|| format!("reading feed file {}", p.display()))
                .map_err(Error::Fetch)?;
            Ok(ArxivFeed::from_fixture_str(&xml))
        }
        None => Ok(ArxivFeed::from_query(
            &settings.query.base_url,
            &settings.policy.categories,
            settings.query.max_results,
        )),
    }
}

async fn run(cli: Cli) -> Result<String, Error> {
    let settings =
        Settings::load(cli.policy.as_deref()).map_err(|e| Error::Config(format!("{e:#}")))?;
    let store = FileSeenStore::new(&cli.seen_ids);
    let now = chrono::Utc::now();

    if cli.dry_run {
        let feed = build_feed(&cli, &settings)?;
        let preview = pipeline::preview(&feed, &store, &settings, now).await?;
        return Ok(match preview.html {
            Some(html) => {
                println!("{html}");
                format!(
                    "Dry run: {} of {} paper(s) would be sent.",
                    preview.outcome.relevant.len(),
                    preview.fetched
                )
            }
            None => "No new relevant papers found.".to_string(),
        });
    }

    // All configuration is validated before any network I/O.
    let mail = MailConfig::from_env()?;
    let notifier = EmailNotifier::new(&mail).map_err(|e| Error::Config(format!("{e:#}")))?;
    let feed = build_feed(&cli, &settings)?;
    tracing::debug!(target: "pipeline", ?mail, seen_ids = %store.path().display(), "configured");

    let report = pipeline::run_once(&feed, &store, &notifier, &settings, now).await?;
    Ok(report.summary())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env if present; no-op otherwise.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
