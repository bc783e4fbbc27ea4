use std::fs;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use newswire::cli::{Cli, Commands};
use newswire::config::Config;
use newswire::domain::NewsItem;
use newswire::services::{Aggregator, Headlines, NewsService, OfflineCache, Origin};
use newswire::sources::{FeedRegistry, HttpTransport};
use newswire::storage::{SqliteKeyValueStore, SqliteStorage};
use newswire::util::{format_relative_time, TimeLocale};

type Service = NewsService<HttpTransport, SqliteKeyValueStore>;

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    let registry = FeedRegistry::load(config.feeds_opml.as_deref())?;

    match cli.command {
        Commands::Feeds => cmd_feeds(&registry),
        Commands::Export { output } => cmd_export(&registry, output),
        Commands::Run { offline, json } => {
            let service = build_service(&config, registry)?;
            cmd_run(&service, config.locale, offline, json).await
        }
        Commands::Cached { json } => cmd_cached(&open_cache(&config)?, config.locale, json),
        Commands::ClearCache => cmd_clear_cache(&open_cache(&config)?),
    }
}

fn open_cache(config: &Config) -> Result<OfflineCache<SqliteKeyValueStore>> {
    let storage = SqliteStorage::new(&config.db_path)
        .with_context(|| format!("Failed to open cache database {}", config.db_path))?;

    Ok(OfflineCache::new(SqliteKeyValueStore::new(storage)).with_ttl(config.cache_ttl))
}

fn build_service(config: &Config, registry: FeedRegistry) -> Result<Service> {
    let transport = HttpTransport::new(config.timeout)?.with_relay(config.relay_url.clone());
    let aggregator = Aggregator::new(transport, config.aggregate_options());

    Ok(NewsService::new(aggregator, open_cache(config)?, registry))
}

fn cmd_feeds(registry: &FeedRegistry) -> Result<()> {
    println!("Configured feeds:\n");
    for feed in registry.feeds() {
        println!("  {} [{}]", feed.display_name, feed.default_category);
        println!("    URL: {}", feed.url);
    }
    println!();
    println!("{} feeds", registry.len());

    Ok(())
}

fn cmd_export(registry: &FeedRegistry, output: Option<String>) -> Result<()> {
    let opml = registry.to_opml()?;

    match output {
        Some(path) => {
            fs::write(&path, &opml).with_context(|| format!("Failed to write {}", path))?;
            println!("Exported feeds to {}", path);
        }
        None => {
            println!("{}", opml);
        }
    }

    Ok(())
}

async fn cmd_run(service: &Service, locale: TimeLocale, offline: bool, json: bool) -> Result<()> {
    let headlines = if offline {
        service.offline()
    } else {
        if !json {
            println!("Fetching {} feeds...\n", service.registry().len());
        }
        service.headlines().await
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&headlines.items)?);
        return Ok(());
    }

    for failure in &headlines.failures {
        println!("  ! {}: {}", failure.source_name, failure.error);
    }
    if !headlines.failures.is_empty() {
        println!();
    }

    match headlines.origin {
        Origin::Live => {}
        Origin::Cached => println!("{}\n", cached_notice(&headlines)),
        Origin::Fallback => println!("No news available, showing placeholder.\n"),
    }

    print_items(&headlines.items, locale);

    Ok(())
}

fn cmd_cached(cache: &OfflineCache<SqliteKeyValueStore>, locale: TimeLocale, json: bool) -> Result<()> {
    let entry = cache.load_entry()?;

    if json {
        let items = entry.map(|e| e.items).unwrap_or_default();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    match entry {
        Some(entry) => {
            println!(
                "Cached {} headlines ({})\n",
                entry.items.len(),
                format_relative_time(entry.captured_at, Utc::now(), locale)
            );
            print_items(&entry.items, locale);
        }
        None => println!("No cached news."),
    }

    Ok(())
}

fn cmd_clear_cache(cache: &OfflineCache<SqliteKeyValueStore>) -> Result<()> {
    cache.clear()?;
    println!("Cache cleared.");

    Ok(())
}

fn cached_notice(headlines: &Headlines) -> String {
    match headlines.captured_at {
        Some(at) => format!(
            "Feeds unavailable, showing headlines cached at {}.",
            at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => "Feeds unavailable, showing cached headlines.".to_string(),
    }
}

fn print_items(items: &[NewsItem], locale: TimeLocale) {
    let now = Utc::now();

    for item in items {
        println!("{} [{}]", item.title(), item.category());
        println!(
            "  {} · {}",
            item.source(),
            format_relative_time(item.published_at(), now, locale)
        );
        println!("  {}", item.link());
        println!();
    }
}
