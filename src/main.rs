use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use linguaflow::{Mode, Purpose};

mod cmd;

#[derive(Parser)]
#[command(name = "linguaflow")]
#[command(version, about = "Human-in-the-loop English/Chinese translation workflow")]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Target a running linguaflow server instead of the local backend.
#[derive(Args, Clone, Debug, Default)]
pub struct RemoteArgs {
    /// Base URL of a linguaflow server (e.g. http://localhost:8080)
    #[arg(long)]
    pub server: Option<String>,

    /// Server passphrase (defaults to the one saved by `verify`)
    #[arg(long, requires = "server")]
    pub passphrase: Option<String>,
}

/// Options shared by the one-shot modes.
#[derive(Args, Clone, Debug, Default)]
pub struct StyleArgs {
    /// Target audience persona (see `linguaflow audiences`)
    #[arg(short, long)]
    pub audience: Option<String>,

    /// Background context for the text
    #[arg(short, long)]
    pub context: Option<String>,

    /// Communicative goal: informative, expressive or operative
    #[arg(short, long)]
    pub purpose: Option<Purpose>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,
    },
    /// Translate, proofread or polish a text in one shot
    Translate {
        /// Text to process (reads --file or stdin when omitted)
        text: Option<String>,

        /// Plain-text file to process
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// translator, proofreader or polish
        #[arg(short, long, default_value = "translator")]
        mode: Mode,

        #[command(flatten)]
        style: StyleArgs,

        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Infer a background paragraph for a document
    InferContext {
        /// Plain-text document
        file: PathBuf,

        /// Save the result as the workflow context
        #[arg(long)]
        save: bool,

        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Drive the insight → logic → reconstruction workflow
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommands,

        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Debounced live translation: each stdin line replaces the input
    Live {
        /// translator, proofreader or polish
        #[arg(short, long, default_value = "translator")]
        mode: Mode,

        #[command(flatten)]
        style: StyleArgs,

        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Check a passphrase against a server and remember it
    Verify {
        #[arg(long)]
        server: String,

        #[arg(long)]
        passphrase: String,
    },
    /// Forget the saved server passphrase
    Logout,
    /// List suggested target audiences
    Audiences,
    /// View or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum WorkflowCommands {
    /// Show the current session
    Status,
    /// Run the next stage
    Advance,
    /// Polish the current target text
    Polish,
    /// Clear the session (keeps the saved passphrase)
    Reset,
    /// Edit session fields between stages
    Set {
        /// Read the source text from a plain-text file
        #[arg(long, conflicts_with = "source")]
        source_file: Option<PathBuf>,

        #[arg(long)]
        source: Option<String>,

        /// Replace the target text with the contents of a file
        #[arg(long)]
        target_file: Option<PathBuf>,

        #[command(flatten)]
        style: StyleArgs,

        /// Clear the purpose instead of setting one
        #[arg(long, conflicts_with = "purpose")]
        no_purpose: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default linguaflow.toml
    Init,
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "linguaflow=debug,tower_http=debug"
    } else {
        "linguaflow=info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    init_tracing(cli.verbose, cli.log_json);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Serve { port, host } => {
            cmd::cmd_serve(&project_dir, *port, host.clone()).await?;
        }
        Commands::Translate {
            text,
            file,
            mode,
            style,
            remote,
        } => {
            cmd::cmd_translate(
                &project_dir,
                text.as_deref(),
                file.as_deref(),
                *mode,
                style,
                remote,
            )
            .await?;
        }
        Commands::InferContext { file, save, remote } => {
            cmd::cmd_infer_context(&project_dir, file, *save, remote).await?;
        }
        Commands::Workflow { command, remote } => {
            cmd::cmd_workflow(&project_dir, command.clone(), remote).await?;
        }
        Commands::Live {
            mode,
            style,
            remote,
        } => cmd::cmd_live(&project_dir, *mode, style, remote).await?,
        Commands::Verify { server, passphrase } => {
            cmd::cmd_verify(&project_dir, server, passphrase).await?;
        }
        Commands::Logout => cmd::cmd_logout(&project_dir)?,
        Commands::Audiences => cmd::cmd_audiences(),
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
