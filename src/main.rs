use anyhow::{Context, Result};
use apigw_restapi::aws::client::AwsClient;
use apigw_restapi::config::Config;
use apigw_restapi::restapi::{self, RestApiConfig, RestApiHandler, RestApiState};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Reconcile an API Gateway REST API against AWS
#[derive(Parser, Debug)]
#[command(name = "apigw-restapi", version, about, long_about = None)]
struct Args {
    /// AWS region to use
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Account ID used for execution ARNs
    #[arg(long, global = true)]
    account_id: Option<String>,

    /// Service endpoint override
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Shared credentials profile
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resource schema
    Schema,
    /// Check a configuration document without calling AWS
    Validate { config: PathBuf },
    /// Show the patch operations an update would send
    Plan { state: PathBuf, config: PathBuf },
    /// Create a REST API and print its state
    Create { config: PathBuf },
    /// Refresh a recorded state
    Read { state: PathBuf },
    /// Update a REST API to match a configuration
    Update { state: PathBuf, config: PathBuf },
    /// Delete a REST API
    Delete { state: PathBuf },
    /// Persist the global flags as defaults
    Configure,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("apigw-restapi started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("apigw-restapi").join("apigw-restapi.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".apigw-restapi").join("apigw-restapi.log");
    }
    PathBuf::from("apigw-restapi.log")
}

/// Read a JSON or YAML document, chosen by extension
fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {}", path.display()))
    } else {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn build_handler(config: &Config) -> Result<RestApiHandler> {
    let settings = config.client_settings().await?;
    let client = AwsClient::new(settings).context("Failed to initialize AWS client")?;
    Ok(RestApiHandler::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let overrides = Config {
        region: args.region.clone(),
        partition: None,
        account_id: args.account_id.clone(),
        endpoint: args.endpoint.clone(),
        profile: args.profile.clone(),
    };
    let stored = Config::load();
    let config = stored.merged(&overrides);

    match args.command {
        Command::Schema => print_json(restapi::resource_schema()),
        Command::Validate { config: path } => {
            let desired: RestApiConfig = load_document(&path)?;
            desired.validate()?;
            eprintln!("{}: valid", path.display());
            Ok(())
        },
        Command::Plan { state, config: path } => {
            let prior: RestApiState = load_document(&state)?;
            let desired: RestApiConfig = load_document(&path)?;
            desired.validate()?;
            if prior.config.body != desired.body && desired.body.is_some() {
                eprintln!("definition document changed: will be imported in overwrite mode");
            }
            print_json(&restapi::update_operations(&prior.config, &desired))
        },
        Command::Create { config: path } => {
            let desired: RestApiConfig = load_document(&path)?;
            let handler = build_handler(&config).await?;
            match handler.create(&desired).await {
                Ok(state) => print_json(&state),
                Err(err) => {
                    if let Some(id) = err.partial_rest_api_id() {
                        // The REST API exists; hand its id back so the next run updates it
                        print_json(&RestApiState::new(id, desired.clone()))?;
                    }
                    Err(err.into())
                },
            }
        },
        Command::Read { state } => {
            let prior: RestApiState = load_document(&state)?;
            let handler = build_handler(&config).await?;
            match handler.read(&prior).await? {
                Some(state) => print_json(&state),
                None => {
                    eprintln!("REST API {} no longer exists", prior.id);
                    print_json(&serde_json::Value::Null)
                },
            }
        },
        Command::Update { state, config: path } => {
            let prior: RestApiState = load_document(&state)?;
            let desired: RestApiConfig = load_document(&path)?;
            let handler = build_handler(&config).await?;
            print_json(&handler.update(&prior, &desired).await?)
        },
        Command::Delete { state } => {
            let prior: RestApiState = load_document(&state)?;
            let handler = build_handler(&config).await?;
            handler.delete(&prior).await?;
            eprintln!("REST API {} deleted", prior.id);
            Ok(())
        },
        Command::Configure => {
            config.save()?;
            match Config::config_path() {
                Some(path) => eprintln!("Saved {}", path.display()),
                None => eprintln!("No config directory available, nothing saved"),
            }
            Ok(())
        },
    }
}
