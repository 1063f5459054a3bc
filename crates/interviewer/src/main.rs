mod api;
mod approval;
mod config;
mod conversations;
mod interview;
mod server;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use interviewer_core::{
    InterviewMachine, InterviewService, InterviewStore, DEFAULT_APPROVAL_TIMEOUT,
};
use interviewer_db::Database;
use interviewer_logging::{LogFormat, Logger};
use interviewer_oracle::{create_oracle, Oracle, OracleType};

use config::{AppConfig, OracleOverrides};
use conversations::ConversationsAction;
use interview::InterviewOptions;

#[derive(Parser, Debug)]
#[command(
    name = "interviewer",
    about = "AI-driven Excel skills interviewer",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,

    /// Tracing level (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Path to the config file (default: ./interviewer.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an interview in the terminal
    Interview {
        /// Candidate email (prompted if omitted)
        #[arg(long)]
        email: Option<String>,

        /// Continue a saved interview by conversation ID
        #[arg(long)]
        resume: Option<String>,

        #[command(flatten)]
        oracle: OracleArgs,

        /// How final reports are approved
        #[arg(long, value_enum)]
        approval: Option<ApprovalChoice>,

        /// Database path
        #[arg(long)]
        db: Option<PathBuf>,

        /// Do not write a JSONL transcript
        #[arg(long)]
        no_transcript: bool,
    },

    /// Serve the interview HTTP API
    Serve {
        /// Port to listen on (default: 8000)
        #[arg(short, long)]
        port: Option<u16>,

        #[command(flatten)]
        oracle: OracleArgs,

        /// How final reports are approved
        #[arg(long, value_enum)]
        approval: Option<ApprovalChoice>,

        /// Database path
        #[arg(long)]
        db: Option<PathBuf>,

        /// Directory for the rolling server log
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },

    /// Inspect stored conversations
    Conversations {
        #[command(subcommand)]
        action: ConversationsAction,

        /// Database path
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct OracleArgs {
    /// Completion backend
    #[arg(long, value_enum)]
    oracle: Option<OracleChoice>,

    /// Model to request
    #[arg(short, long)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long)]
    base_url: Option<String>,
}

impl From<OracleArgs> for OracleOverrides {
    fn from(args: OracleArgs) -> Self {
        Self {
            kind: args.oracle.map(Into::into),
            model: args.model,
            base_url: args.base_url,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OracleChoice {
    Openai,
    Command,
}

impl From<OracleChoice> for OracleType {
    fn from(choice: OracleChoice) -> Self {
        match choice {
            OracleChoice::Openai => OracleType::OpenAi,
            OracleChoice::Command => OracleType::Command,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ApprovalChoice {
    Auto,
    Console,
}

impl ApprovalChoice {
    fn as_str(self) -> &'static str {
        match self {
            ApprovalChoice::Auto => "auto",
            ApprovalChoice::Console => "console",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_format: LogFormat = cli.log_format.into();

    let config = match cli.config {
        Some(ref path) => AppConfig::load_required(path)?,
        None => {
            let working_dir =
                std::env::current_dir().context("Failed to get current directory")?;
            AppConfig::load(&working_dir)?.unwrap_or_default()
        }
    };

    match cli.command {
        Commands::Interview {
            email,
            resume,
            oracle,
            approval,
            db,
            no_transcript,
        } => {
            let level = cli.log_level.as_deref().unwrap_or("warn");
            interviewer_logging::init_tracing(level, log_format);

            // Events go to a file so they do not interleave with the prompts
            let logger = event_file_logger(log_format);
            let service = build_service(&config, oracle.into(), approval, db, logger).await?;

            interview::run_interview(
                service,
                InterviewOptions {
                    email,
                    resume,
                    transcript: !no_transcript,
                },
            )
            .await
        }
        Commands::Serve {
            port,
            oracle,
            approval,
            db,
            log_dir,
        } => {
            let level = cli.log_level.as_deref().unwrap_or("info");
            let log_dir = log_dir.unwrap_or_else(default_log_dir);
            std::fs::create_dir_all(&log_dir)
                .with_context(|| format!("Failed to create {}", log_dir.display()))?;
            let _guard = interviewer_logging::init_tracing_with_file(level, log_format, &log_dir);

            let logger = Arc::new(Logger::new(log_format));
            let service = build_service(&config, oracle.into(), approval, db, logger).await?;

            server::handle_serve(service, port.unwrap_or_else(|| config.port())).await
        }
        Commands::Conversations { action, db } => {
            let level = cli.log_level.as_deref().unwrap_or("warn");
            interviewer_logging::init_tracing(level, log_format);

            let store = open_database(&config, db)?;
            conversations::handle_conversations_command(&store, action)
        }
    }
}

async fn build_service(
    config: &AppConfig,
    overrides: OracleOverrides,
    approval: Option<ApprovalChoice>,
    db: Option<PathBuf>,
    logger: Arc<Logger>,
) -> Result<Arc<InterviewService>> {
    let oracle_config = config.oracle_config(&overrides)?;
    let oracle: Arc<dyn Oracle> = Arc::from(
        create_oracle(&oracle_config).context("Failed to configure the oracle")?,
    );
    if !oracle.is_available().await {
        anyhow::bail!(
            "Oracle '{}' is not available. Check {} or the configured command.",
            oracle.name(),
            config.api_key_env()
        );
    }
    tracing::info!(oracle = oracle.name(), kind = %oracle.oracle_type(), "Oracle ready");

    let mode = approval
        .map(ApprovalChoice::as_str)
        .or(config.approval_mode())
        .unwrap_or("auto");
    let gate = approval::create_gate(mode)?;
    let timeout = config
        .approval_timeout()
        .unwrap_or(DEFAULT_APPROVAL_TIMEOUT);

    let machine = InterviewMachine::new(oracle, logger).with_approval_gate(gate, timeout);
    let store: Arc<dyn InterviewStore> = Arc::new(open_database(config, db)?);

    Ok(Arc::new(InterviewService::new(store, machine)))
}

/// Priority: --db flag > [server].database > default location
fn open_database(config: &AppConfig, db: Option<PathBuf>) -> Result<Database> {
    let path = db.or_else(|| config.database_path().map(Path::to_path_buf));

    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            Database::open_at(&path)
                .with_context(|| format!("Failed to open database {}", path.display()))
        }
        None => Database::open().context("Failed to initialize database"),
    }
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("interviewer")
        .join("logs")
}

fn event_file_logger(format: LogFormat) -> Arc<Logger> {
    let path = default_log_dir().join("events.jsonl");
    let logger = match Logger::with_file(format, &path) {
        Ok(logger) => logger,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Event log file disabled");
            Logger::new(format)
        }
    };
    Arc::new(logger.without_console())
}
