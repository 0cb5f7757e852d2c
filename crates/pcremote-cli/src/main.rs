mod commands;
mod session;

use clap::{Args, Parser, Subcommand};
use commands::hook::HookParams;
use commands::watch::WatchParams;
use pcremote_core::config::{AGENT_POLL_INTERVAL, DEFAULT_POLL_INTERVAL, DEFAULT_SERVER_PORT};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pcremote",
    version,
    about = "Approve agent actions and control your PC from the terminal"
)]
struct Cli {
    /// Server base URL (overrides the saved setting)
    #[arg(long, global = true, env = "PCREMOTE_SERVER")]
    server: Option<String>,

    /// Session token forwarded verbatim in the X-Init-Data header
    #[arg(
        long,
        global = true,
        env = "PCREMOTE_INIT_DATA",
        default_value = "",
        hide_env_values = true
    )]
    init_data: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live view of pending actions: approve or deny them as they arrive
    Watch {
        /// Seconds between background syncs
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
        interval: u64,
    },

    /// Print the pending actions once
    Pending,

    /// Approve or deny one pending action by id
    Decide {
        /// Action id as shown by `pending`
        id: String,

        #[command(flatten)]
        verdict: Verdict,
    },

    /// List the predefined commands
    Commands,

    /// Run a predefined command on the PC
    Exec {
        /// Command key as shown by `commands`
        key: String,
    },

    /// Show the PC's status
    Status,

    /// Send text to the PC's clipboard
    Send {
        text: String,
    },

    /// Show or change the saved server URL
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Raise a pending action and wait for the decision (exit 0 approved, 2 denied)
    Hook {
        /// Name of the tool asking for approval
        #[arg(long)]
        tool: String,

        /// What the tool is about to do
        #[arg(long, default_value = "")]
        description: String,

        /// Give up after this many seconds
        #[arg(long, default_value = "300")]
        timeout: u64,
    },

    /// Run the PC-side agent: answer commands relayed through the server
    Agent {
        /// Seconds between polls
        #[arg(long, default_value_t = AGENT_POLL_INTERVAL.as_secs())]
        interval: u64,
    },

    /// Run the in-memory pcremote server
    #[cfg(feature = "server")]
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = DEFAULT_SERVER_PORT)]
        port: u16,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Verdict {
    /// Let the action proceed
    #[arg(long)]
    approve: bool,

    /// Block the action
    #[arg(long)]
    deny: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the saved settings
    Show,
    /// Save a server URL
    SetUrl { url: String },
    /// Forget the saved server URL
    Clear,
    /// Enter the server URL interactively
    Edit,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch { interval } => {
            let config = session::resolve(cli.server, cli.init_data)?;
            let params = WatchParams {
                config,
                interval: Duration::from_secs(interval.max(1)),
            };
            commands::watch::run(params).await?;
        }
        Commands::Pending => {
            let config = session::resolve(cli.server, cli.init_data)?;
            commands::pending::run(config).await?;
        }
        Commands::Decide { id, verdict } => {
            let config = session::resolve(cli.server, cli.init_data)?;
            commands::decide::run(config, &id, verdict.approve && !verdict.deny).await?;
        }
        Commands::Commands => {
            let config = session::resolve(cli.server, cli.init_data)?;
            commands::catalog::list(config).await?;
        }
        Commands::Exec { key } => {
            let config = session::resolve(cli.server, cli.init_data)?;
            commands::catalog::exec(config, &key).await?;
        }
        Commands::Status => {
            let config = session::resolve(cli.server, cli.init_data)?;
            commands::status::run(config).await?;
        }
        Commands::Send { text } => {
            let config = session::resolve(cli.server, cli.init_data)?;
            commands::send::run(config, &text).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show()?,
            ConfigAction::SetUrl { url } => commands::config::set_url(&url)?,
            ConfigAction::Clear => commands::config::clear()?,
            ConfigAction::Edit => commands::config::edit()?,
        },
        Commands::Hook {
            tool,
            description,
            timeout,
        } => {
            let config = session::resolve(cli.server, cli.init_data)?;
            let params = HookParams {
                config,
                tool,
                description,
                timeout: Duration::from_secs(timeout),
            };
            if !commands::hook::run(params).await? {
                std::process::exit(2);
            }
        }
        Commands::Agent { interval } => {
            let config = session::resolve(cli.server, cli.init_data)?;
            commands::agent::run(config, Duration::from_secs(interval.max(1))).await?;
        }
        #[cfg(feature = "server")]
        Commands::Serve { port } => {
            pcremote_server::run(port).await?;
        }
    }

    Ok(())
}
