//! gemini-query CLI
//!
//! Command-line interface for openGemini query building:
//! - Render editor query JSON into InfluxQL
//! - Run queries and print the mapped frames
//! - List metadata (measurements, keys, retention policies, databases)
//! - Check the datasource connection

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gemini_query::config::{generate_default_config, Config, LoggingConfig};
use gemini_query::datasource::{DataQueryRequest, DataSource, HealthState, TimeRangeRaw};
use gemini_query::operators::OperatorRegistry;
use gemini_query::query::{build_query, MetaQueryOptions, MetadataQueryType, QueryConfig};
use gemini_query::response::{cell_text, Frame, QueryResponse};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "gemini-query")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build and run InfluxQL queries against openGemini")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a query JSON file into query text
    Build {
        /// Path to the query JSON (editor format)
        path: PathBuf,
    },

    /// Run a query JSON file and print the resulting frames
    Query {
        /// Path to the query JSON (editor format)
        path: PathBuf,
        /// Range start: now, now-6h, RFC 3339 or epoch ms
        #[arg(long, default_value = "now-6h")]
        from: String,
        /// Range end
        #[arg(long, default_value = "now")]
        to: String,
        /// Value for $__interval (default: min_time_interval)
        #[arg(short, long)]
        interval: Option<String>,
    },

    /// Send a raw statement
    Raw {
        /// InfluxQL statement
        sql: String,
    },

    /// List metadata (measurements, tag-keys, field-keys, retention-policies, databases)
    Meta {
        /// Metadata kind
        kind: String,
        /// Measurement to restrict keys to
        #[arg(short, long)]
        measurement: Option<String>,
        /// Retention policy qualifying the measurement
        #[arg(long)]
        rp: Option<String>,
        /// Database (default: configured database)
        #[arg(short, long)]
        database: Option<String>,
    },

    /// Check the connection and configured database
    Ping,

    /// List the available operators
    Operators,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_tracing(&config.logging);

    tracing::debug!("gemini-query v{}", env!("CARGO_PKG_VERSION"));
    let json = cli.format == "json";

    match cli.command {
        Commands::Build { path } => {
            let query = read_query(&path)?;
            let registry = OperatorRegistry::builtin();
            println!("{}", build_query(&query, &registry)?);
        }

        Commands::Query {
            path,
            from,
            to,
            interval,
        } => {
            let query = read_query(&path)?;
            tracing::info!(url = %config.datasource.url, from = %from, to = %to, "Running query");
            let datasource = DataSource::connect(config.datasource)?;
            let request = DataQueryRequest {
                targets: vec![query],
                range: TimeRangeRaw::new(from, to),
                interval,
                ..Default::default()
            };

            let frames = datasource.query(&request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&frames)?);
            } else {
                for frame in &frames {
                    print_frame(frame);
                }
            }
        }

        Commands::Raw { sql } => {
            let datasource = DataSource::connect(config.datasource)?;
            let response = datasource.client().query_raw(&sql).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_response(&response);
            }
        }

        Commands::Meta {
            kind,
            measurement,
            rp,
            database,
        } => {
            let Some(query_type) = MetadataQueryType::from_str(&kind) else {
                bail!("Unknown metadata kind: {}", kind);
            };
            let database = database.unwrap_or_else(|| config.datasource.database.clone());

            let mut options = MetaQueryOptions::new(query_type).database(database);
            options.from_measurement = measurement;
            options.rp = rp;

            let datasource = DataSource::connect(config.datasource)?;
            let values = datasource.meta_query(&options).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else if values.is_empty() {
                println!("No results");
            } else {
                for value in values {
                    println!("{}", value);
                }
            }
        }

        Commands::Ping => {
            let url = config.datasource.url.clone();
            let datasource = DataSource::connect(config.datasource)?;
            let health = datasource.test_datasource().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&health)?);
            } else {
                println!("{}: {}", url, health.message);
            }
            if health.status == HealthState::Error {
                std::process::exit(1);
            }
        }

        Commands::Operators => {
            let registry = OperatorRegistry::builtin();
            let menu = registry.menu_options();
            if json {
                let groups: serde_json::Map<String, serde_json::Value> = menu
                    .iter()
                    .map(|g| (g.category.to_string(), serde_json::json!(g.operators)))
                    .chain(std::iter::once((
                        "GroupBy".to_string(),
                        serde_json::json!(registry.group_by_operators()),
                    )))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else {
                for group in &menu {
                    println!("{:<16} {}", group.category, group.operators.join(", "));
                }
                println!(
                    "{:<16} {}",
                    "GroupBy",
                    registry.group_by_operators().join(", ")
                );
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gemini_query={}", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn read_query(path: &Path) -> anyhow::Result<QueryConfig> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid query JSON in {:?}", path))
}

fn print_frame(frame: &Frame) {
    if frame.fields.is_empty() {
        println!("No data");
        return;
    }

    let names: Vec<&str> = frame.fields.iter().map(|f| f.name.as_str()).collect();
    println!("{}", names.join(" | "));
    println!("{}", "-".repeat(names.join(" | ").len()));

    for row in 0..frame.len() {
        let cells: Vec<String> = frame
            .fields
            .iter()
            .map(|f| f.values.get(row).and_then(cell_text).unwrap_or_default())
            .collect();
        println!("{}", cells.join(" | "));
    }
    println!();
}

fn print_response(response: &QueryResponse) {
    let Some(series) = response.first_series() else {
        println!("No data");
        return;
    };

    for s in series {
        if !s.name.is_empty() {
            println!("name: {}", s.name);
        }
        if let Some(tags) = s.tag_set() {
            let tags: Vec<String> = tags.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            println!("tags: {}", tags.join(", "));
        }
        println!("{}", s.columns.join(" | "));
        println!("{}", "-".repeat(s.columns.join(" | ").len()));
        for row in &s.values {
            let cells: Vec<String> = row.iter().map(|v| cell_text(v).unwrap_or_default()).collect();
            println!("{}", cells.join(" | "));
        }
        println!();
    }
}
