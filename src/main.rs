//! Ledger transaction client CLI.
//!
//! ```text
//! ledger-client --config client.toml invoke <function> [args...]
//! ledger-client --config client.toml query [--peer NAME]... <function> [args...]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ledger_client::config::load_config;
use ledger_client::lifecycle::{signals, startup};
use ledger_client::network::PeerEndpoint;
use ledger_client::transaction::{CommitEvent, TransactionClient, TxError};

#[derive(Parser)]
#[command(name = "ledger-client")]
#[command(about = "Submit and evaluate chaincode transactions", long_about = None)]
struct Cli {
    /// Client configuration file.
    #[arg(short, long, default_value = "client.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Endorse, submit and wait for commit
    Invoke {
        function: String,
        args: Vec<String>,
    },
    /// Evaluate on peers without submitting
    Query {
        /// Peer to ask (repeatable). Defaults to the identity's organization.
        #[arg(long = "peer")]
        peers: Vec<String>,
        function: String,
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    startup::init_observability(&config.observability);

    tracing::info!(config = %cli.config.display(), "ledger-client v0.1.0 starting");

    let client = match startup::connect(&config, None) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Invoke { function, args } => invoke(&client, &function, &to_bytes(args)).await,
        Commands::Query {
            peers,
            function,
            args,
        } => query(&client, &peers, &function, &to_bytes(args)).await,
    };

    match result {
        Ok(Outcome::Completed) => ExitCode::SUCCESS,
        Ok(outcome @ Outcome::Invalidated { .. }) => {
            eprintln!("Error: {}", outcome);
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            for exclusion in e.excluded() {
                eprintln!("  excluded {}", exclusion);
            }
            ExitCode::FAILURE
        }
    }
}

/// What became of a command once it got past submission.
#[derive(Debug, PartialEq)]
enum Outcome {
    Completed,
    /// Ordered and committed, but rejected by the peers' validation.
    Invalidated { tx_id: String, validation_code: i32 },
}

impl Outcome {
    fn from_commit(event: &CommitEvent) -> Self {
        if event.is_valid() {
            Outcome::Completed
        } else {
            Outcome::Invalidated {
                tx_id: event.tx_id.clone(),
                validation_code: event.validation_code,
            }
        }
    }

    fn exit_code(&self) -> u8 {
        match self {
            Outcome::Completed => 0,
            Outcome::Invalidated { .. } => 2,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Completed => write!(f, "completed"),
            Outcome::Invalidated { tx_id, validation_code } => write!(
                f,
                "{} was ordered but committed as invalid (validation code {})",
                tx_id, validation_code
            ),
        }
    }
}

fn to_bytes(args: Vec<String>) -> Vec<Vec<u8>> {
    args.into_iter().map(String::into_bytes).collect()
}

async fn invoke(client: &TransactionClient, function: &str, args: &[Vec<u8>]) -> Result<Outcome, TxError> {
    let handle = client.send_transaction(function, args).await?;
    let tx_id = handle.tx_id().to_string();
    println!("submitted {}", tx_id);
    for exclusion in handle.excluded() {
        println!("  excluded {}", exclusion);
    }

    let event: CommitEvent = tokio::select! {
        result = handle.wait() => result?,
        _ = signals::interrupted() => {
            println!("stopped waiting; {} may still commit", tx_id);
            return Ok(Outcome::Completed);
        }
    };

    let outcome = Outcome::from_commit(&event);
    if outcome == Outcome::Completed {
        println!("committed in block {} (reported by {})", event.block_number, event.peer);
    }
    Ok(outcome)
}

async fn query(
    client: &TransactionClient,
    peer_names: &[String],
    function: &str,
    args: &[Vec<u8>],
) -> Result<Outcome, TxError> {
    let peers: Vec<PeerEndpoint> = peer_names
        .iter()
        .map(|name| {
            client
                .topology()
                .peer(name)
                .cloned()
                .ok_or_else(|| TxError::InvalidArgument(format!("unknown peer '{}'", name)))
        })
        .collect::<Result<_, _>>()?;
    let subset = if peers.is_empty() { None } else { Some(peers.as_slice()) };

    let responses = client.query_peers(subset, function, args).await?;
    for response in responses {
        if response.is_success() {
            println!("{} [{}] {}", response.peer, response.status, String::from_utf8_lossy(&response.payload));
        } else {
            println!("{} [{}] {}", response.peer, response.status, response.message);
        }
    }
    Ok(Outcome::Completed)
}
