use anyhow::Context;
use clap::{Parser, Subcommand};
use listing_search::{
    api::{HttpPropertyApi, PropertyApi},
    config::Config,
    favorites::FavoritesService,
    filters::{decode_state, encode_state, FilterStore, FilterSynchronizer, LocationSink, MemoryLocation},
    models::{SortBy, SortSpec},
    search::{self, SearchService},
    state::{create_kv_store, FilterPresets, SearchHistory},
};
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "listing-search")]
#[command(about = "Listing search, filters and favorites", long_about = None)]
struct Cli {
    /// Print Prometheus metrics before exiting
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract structured filters from a free-text query
    Parse {
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Decode a filter query string and print its canonical form
    Url {
        #[arg(value_name = "QUERY_STRING")]
        query_string: String,
    },

    /// Search listings
    Search {
        #[arg(value_name = "QUERY", default_value = "")]
        query: String,

        /// Filters as a query string, e.g. "type=villa&minPrice=5000"
        #[arg(short, long, default_value = "")]
        filters: String,

        /// Additional pages to load after the first
        #[arg(short, long, default_value = "0")]
        more: u32,

        /// price, area, newest, title or relevance
        #[arg(short, long)]
        sort: Option<String>,

        /// Flip the sort direction
        #[arg(short, long)]
        reverse: bool,

        /// Start from a saved filter preset
        #[arg(short, long)]
        preset: Option<String>,
    },

    /// Show or clear recent searches
    History {
        #[arg(long)]
        clear: bool,

        /// Forget a single query
        #[arg(long, value_name = "QUERY", conflicts_with = "clear")]
        remove: Option<String>,
    },

    /// Manage named filter presets
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },

    /// Toggle a favorite and print the resulting list
    Favorite {
        #[arg(value_name = "PROPERTY_ID")]
        id: u64,
    },
}

#[derive(Subcommand)]
enum PresetAction {
    /// Save filters under a name
    Save {
        name: String,
        #[arg(short, long, default_value = "")]
        filters: String,
    },
    List,
    Delete {
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config);

    if config.observability.prometheus_enabled {
        if let Err(e) = listing_search::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
        }
    }

    match cli.command {
        Commands::Parse { query } => {
            let parsed = search::parse(&query);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Commands::Url { query_string } => {
            let decoded = decode_state(&query_string);
            println!("{}", serde_json::to_string_pretty(&decoded.filters)?);
            println!("sort: {} {}", decoded.sort.sort_by, decoded.sort.sort_order);
            println!("canonical: ?{}", encode_state(&decoded.filters, &decoded.sort));
        }
        Commands::Search {
            query,
            filters,
            more,
            sort,
            reverse,
            preset,
        } => {
            let options = SearchOptions {
                more,
                sort,
                reverse,
                preset,
            };
            run_search(&config, &query, &filters, options).await?
        }
        Commands::History { clear, remove } => {
            let store = create_kv_store(&config.storage)?;
            let history = SearchHistory::new(store, config.storage.history_limit);
            if clear {
                history.clear()?;
                println!("History cleared");
            } else if let Some(query) = remove {
                history.remove(&query)?;
                println!("Removed {} from history", query.trim());
            } else {
                for entry in history.entries() {
                    println!(
                        "{}  {:<30} {:>5} results",
                        entry.timestamp.format("%Y-%m-%d %H:%M"),
                        entry.query,
                        entry.result_count
                    );
                }
            }
        }
        Commands::Preset { action } => {
            let store = create_kv_store(&config.storage)?;
            let presets = FilterPresets::new(store, config.storage.preset_limit);
            match action {
                PresetAction::Save { name, filters } => {
                    let decoded = decode_state(&filters);
                    let preset = presets.save(&name, &decoded.filters, decoded.sort)?;
                    println!("Saved preset {} ({})", preset.name, preset.id);
                }
                PresetAction::List => {
                    for preset in presets.list() {
                        println!("{:<20} ?{}", preset.name, encode_state(&preset.filters, &preset.sort));
                    }
                }
                PresetAction::Delete { name } => {
                    let preset = presets
                        .find(&name)
                        .with_context(|| format!("No preset named {}", name))?;
                    presets.delete(preset.id)?;
                    println!("Deleted preset {}", name);
                }
            }
        }
        Commands::Favorite { id } => {
            let api: Arc<dyn PropertyApi> = Arc::new(HttpPropertyApi::new(&config.api)?);
            let favorites = FavoritesService::new(api);
            favorites.load().await?;
            let now_favorite = favorites.toggle(id).await?;
            println!(
                "Property {} is {} a favorite",
                id,
                if now_favorite { "now" } else { "no longer" }
            );
            for property in favorites.favorites() {
                println!("  #{:<6} {}", property.id, property.title);
            }
        }
    }

    if cli.metrics {
        print!("{}", listing_search::metrics::gather_metrics());
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("listing_search={}", config.observability.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

struct SearchOptions {
    more: u32,
    sort: Option<String>,
    reverse: bool,
    preset: Option<String>,
}

async fn run_search(config: &Config, raw_query: &str, filters: &str, options: SearchOptions) -> anyhow::Result<()> {
    let store = create_kv_store(&config.storage)?;
    let location = Arc::new(MemoryLocation::new(filters));
    let sync = FilterSynchronizer::new(location.clone(), Some(store.clone()), "cli", &config.sync);
    let mut filter_store = FilterStore::default().with_synchronizer(sync);

    if let Some(name) = &options.preset {
        let presets = FilterPresets::new(store.clone(), config.storage.preset_limit);
        let preset = presets
            .find(name)
            .with_context(|| format!("No preset named {}", name))?;
        filter_store.set_filters(preset.filters);
        filter_store.set_sort(preset.sort);
    }

    let parsed = search::parse(raw_query);
    filter_store.apply_extracted(&parsed);
    if let Some(sort) = options.sort.as_deref() {
        let sort_by = SortBy::from_str(sort)
            .map_err(|_| anyhow::anyhow!("Unknown sort field: {}", sort))?;
        filter_store.set_sort(SortSpec::by(sort_by));
    }
    if options.reverse {
        let mut spec = filter_store.sort();
        spec.sort_order = spec.sort_order.flipped();
        filter_store.set_sort(spec);
    }

    let api: Arc<dyn PropertyApi> = Arc::new(HttpPropertyApi::new(&config.api)?);
    let history = SearchHistory::new(store, config.storage.history_limit);
    let service = SearchService::new(api, config.search.clone()).with_history(history);

    service.search(&parsed.clean_query, filter_store.filters()).await;
    for _ in 0..options.more {
        if service.load_more().await.is_none() {
            break;
        }
    }

    let snapshot = service.snapshot();
    if let Some(error) = snapshot.error {
        anyhow::bail!("Search failed: {}", error);
    }

    let results = service.results(&filter_store.sort());
    println!(
        "{} of {} results ({} active filters, {})",
        results.len(),
        snapshot.total,
        filter_store.active_filter_count(),
        if snapshot.has_more { "more available" } else { "end of results" }
    );
    for property in results {
        println!(
            "  #{:<6} {:<40} {:>10} {:>4} bd  {}",
            property.id, property.title, property.price, property.bedrooms, property.location
        );
    }

    filter_store.teardown();
    println!("share: ?{}", location.current_query());
    Ok(())
}
