//! Fakeye CLI

use clap::{Parser, Subcommand, ValueEnum};
use fakeye_client::{ClientConfig, VerificationClient};
use fakeye_core::report::{self, ReportFormat};
use fakeye_core::{
    CoreResult, HistoryStore, NormalizeConfig, Normalizer, Session, SessionHandle, SessionState,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "fakeye")]
#[command(about = "Check claims against a verification service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verification service base URL
    #[arg(long, global = true, env = "FAKEYE_API_URL")]
    api_url: Option<String>,

    /// Directory holding the check history
    #[arg(long, global = true, env = "FAKEYE_DATA_DIR", default_value = ".fakeye")]
    data_dir: PathBuf,

    /// Normalization heuristics (JSON file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a claim
    Check {
        /// Claim text; multiple words are joined with spaces
        #[arg(required = true)]
        claim: Vec<String>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Re-check the most recent claim in history
    Latest {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Inspect or clear past checks
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Check that the verification service is up
    Health,
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List past checks, newest first
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show a past check again without contacting the service
    Show {
        /// Position in the list (0 is newest)
        index: usize,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Delete all past checks
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG applies unless --verbose is given
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to set subscriber");
    }

    match cli.command {
        Commands::Check { ref claim, format } => {
            let query = claim.join(" ");
            cmd_check(&cli, &query, format).await;
        }
        Commands::Latest { format } => {
            cmd_latest(&cli, format).await;
        }
        Commands::History { ref command } => match command {
            HistoryCommand::List { format } => cmd_history_list(&cli, *format).await,
            HistoryCommand::Show { index, format } => {
                cmd_history_show(&cli, *index, *format).await
            }
            HistoryCommand::Clear => cmd_history_clear(&cli).await,
        },
        Commands::Health => {
            cmd_health(&cli).await;
        }
    }
}

async fn cmd_check(cli: &Cli, query: &str, format: OutputFormat) {
    let handle = open_handle(cli).await;

    if handle.check(query).await.is_none() {
        error!("Nothing to check: the claim is empty");
        std::process::exit(1);
    }

    print_outcome(&handle, format).await;
}

async fn cmd_latest(cli: &Cli, format: OutputFormat) {
    let handle = open_handle(cli).await;

    if handle.check_latest().await.is_none() {
        error!("No history yet; run `fakeye check <CLAIM>` first");
        std::process::exit(1);
    }

    print_outcome(&handle, format).await;
}

async fn cmd_history_list(cli: &Cli, format: OutputFormat) {
    let history = open_store(cli).load().await;

    match report::generate_history(&history, format.into()) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Failed to render history: {}", e);
            std::process::exit(1);
        }
    }
}

async fn cmd_history_show(cli: &Cli, index: usize, format: OutputFormat) {
    let store = open_store(cli);
    let history = store.load().await;
    let total = history.len();
    let mut session = Session::new(open_normalizer(cli), history, store.capacity());

    let Some(result) = session.replay(index) else {
        error!("No history entry at index {} ({} stored)", index, total);
        std::process::exit(1);
    };

    match report::generate_report(result, format.into()) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Failed to generate report: {}", e);
            std::process::exit(1);
        }
    }
}

async fn cmd_history_clear(cli: &Cli) {
    let store = open_store(cli);
    let total = store.load().await.len();
    store.clear().await;
    info!("Cleared {} history entries", total);
}

async fn cmd_health(cli: &Cli) {
    let client = build_client(cli);

    match client.health().await {
        Ok(health) => {
            println!("Service: {}", if health.ok { "ok" } else { "unhealthy" });
            match health.serpapi_set {
                Some(true) => println!("Search API key: configured"),
                Some(false) => println!("Search API key: missing"),
                None => {}
            }
            if !health.ok {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn print_outcome(handle: &SessionHandle, format: OutputFormat) {
    match handle.snapshot().await {
        SessionState::Settled(result) => match report::generate_report(&result, format.into()) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                error!("Failed to generate report: {}", e);
                std::process::exit(1);
            }
        },
        SessionState::Failed { message, .. } => {
            error!("Check failed: {}", message);
            std::process::exit(1);
        }
        SessionState::Idle | SessionState::Checking { .. } => {
            error!("Check did not settle");
            std::process::exit(1);
        }
    }
}

async fn open_handle(cli: &Cli) -> SessionHandle {
    let client = build_client(cli);
    SessionHandle::open(open_normalizer(cli), open_store(cli), Arc::new(client)).await
}

fn open_store(cli: &Cli) -> HistoryStore {
    HistoryStore::in_dir(&cli.data_dir)
}

fn open_normalizer(cli: &Cli) -> Normalizer {
    match load_normalize_config(cli.config.as_deref()) {
        Ok(config) => Normalizer::with_config(config),
        Err(e) => {
            error!("Invalid normalization config: {}", e);
            std::process::exit(1);
        }
    }
}

fn build_client(cli: &Cli) -> VerificationClient {
    let config = match &cli.api_url {
        Some(url) => ClientConfig::with_base_url(url),
        None => ClientConfig::default(),
    };

    match VerificationClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create client: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_normalize_config(path: Option<&Path>) -> CoreResult<NormalizeConfig> {
    match path {
        Some(path) => NormalizeConfig::from_json(&std::fs::read_to_string(path)?),
        None => Ok(NormalizeConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["fakeye", "check", "the", "sky", "is", "green", "-f", "json"])
            .unwrap();
        match cli.command {
            Commands::Check { claim, format } => {
                assert_eq!(claim.join(" "), "the sky is green");
                assert!(matches!(format, OutputFormat::Json));
            }
            _ => panic!("expected check"),
        }

        assert!(Cli::try_parse_from(["fakeye", "check"]).is_err());
    }

    #[test]
    fn test_parse_history_show() {
        let cli = Cli::try_parse_from(["fakeye", "-v", "history", "show", "2"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::History {
                command: HistoryCommand::Show { index: 2, .. }
            }
        ));
    }

    #[test]
    fn test_load_normalize_config() {
        assert_eq!(load_normalize_config(None).unwrap(), NormalizeConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("normalize.json");
        std::fs::write(&path, r#"{"default_confidence": 50}"#).unwrap();
        assert_eq!(load_normalize_config(Some(&path)).unwrap().default_confidence, 50);

        assert!(load_normalize_config(Some(&dir.path().join("missing.json"))).is_err());
    }
}
