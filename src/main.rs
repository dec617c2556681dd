use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moodify_server::catalog_store::{CatalogStore, SqliteCatalogStore};
use moodify_server::config::{AppConfig, CliConfig, FileConfig};
use moodify_server::detection::{
    DeepFaceClassifier, EmotionClassifier, EmotionDetector, SimulatedClassifier,
};
use moodify_server::emotion_log::SqliteEmotionLogStore;
use moodify_server::media_store::MediaStore;
use moodify_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use moodify_server::user::SqliteUserStore;

const READ_POOL_SIZE: usize = 4;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite database files.
    #[clap(value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to the media directory for uploaded audio files.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8080)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Enable the external face-emotion classifier.
    #[clap(long, default_value_t = false)]
    pub classifier_enabled: bool,

    /// URL of the external face-emotion classifier.
    #[clap(long, default_value = "http://localhost:5000/analyze")]
    pub classifier_url: String,

    /// Timeout in seconds for classifier requests.
    #[clap(long, default_value_t = 5)]
    pub classifier_timeout_sec: u64,

    /// Path to a TOML config file. Its values override the CLI.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            media_path: self.media_path.clone(),
            port: self.port,
            logging_level: self.logging_level,
            classifier_enabled: self.classifier_enabled,
            classifier_url: self.classifier_url.clone(),
            classifier_timeout_sec: self.classifier_timeout_sec,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(
            FileConfig::load(path)
                .with_context(|| format!("Could not load config file {:?}", path))?,
        ),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening SQLite databases under {:?}...", config.db_dir);
    let catalog_store = Arc::new(SqliteCatalogStore::new(
        config.library_db_path(),
        READ_POOL_SIZE,
    )?);
    let emotion_log_store = Arc::new(SqliteEmotionLogStore::new(
        config.emotions_db_path(),
        READ_POOL_SIZE,
    )?);
    let user_store = Arc::new(SqliteUserStore::new(
        config.users_db_path(),
        READ_POOL_SIZE,
    )?);

    let media_store = MediaStore::new(&config.media_path);
    media_store
        .init()
        .await
        .with_context(|| format!("Could not create media directory {:?}", config.media_path))?;

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::set_catalog_songs(catalog_store.songs_count());

    let classifier: Arc<dyn EmotionClassifier> = if config.classifier.enabled {
        info!("External classifier enabled at {}", config.classifier.url);
        Arc::new(DeepFaceClassifier::new(
            &config.classifier.url,
            std::time::Duration::from_secs(config.classifier.timeout_sec),
        )?)
    } else {
        info!("External classifier disabled, using simulation");
        Arc::new(SimulatedClassifier)
    };
    let detector = Arc::new(EmotionDetector::new(classifier, emotion_log_store.clone()));

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level,
        port: config.port,
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(
        server_config,
        catalog_store,
        media_store,
        emotion_log_store,
        user_store,
        detector,
    )
    .await
}
