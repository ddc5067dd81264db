//! wirectl
//!
//! Command line front door to a wiring state database. Deploys support
//! contracts and modules, applies the one-time wiring call, and inspects the
//! result.
//!
//! Usage:
//!   wirectl deploy         [--params <file>] [--no-wire]
//!   wirectl deploy-module  --kind <kind> --owner <addr> [--deployer <addr>]
//!   wirectl deploy-code    --deployer <addr> --code <hex>
//!   wirectl wire           --module <addr> --caller <addr> --addresses <a,b,...>
//!   wirectl inspect        --module <addr>
//!   wirectl events         --module <addr>

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use wiring_core::{call::WiringCall, constants::ADDRESS_LEN, module::ModuleKind, types::Address};
use wiring_deploy::{deploy_modules, deploy_system, DeployParams};
use wiring_state::{ModuleQuery, StateDb, WiringEngine};

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "wirectl",
    version,
    about = "Deploy and wire modules exactly once, by their owner"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, global = true, default_value = "~/.wiring/data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy the support contracts and all six modules, then wire them.
    Deploy {
        /// Path to deployment params JSON. Without it a random owner is used.
        #[arg(long)]
        params: Option<PathBuf>,
        /// Deploy only; leave every module awaiting wiring.
        #[arg(long, default_value_t = false)]
        no_wire: bool,
    },

    /// Deploy a single unwired module.
    DeployModule {
        /// trove-manager, borrower-operations, default-pool, stability-pool,
        /// active-pool or sorted-troves.
        #[arg(long)]
        kind: String,
        #[arg(long)]
        owner: String,
        /// Defaults to the owner.
        #[arg(long)]
        deployer: Option<String>,
    },

    /// Deploy plain runtime code (hex) and print its address.
    DeployCode {
        #[arg(long)]
        deployer: String,
        #[arg(long)]
        code: String,
    },

    /// Record a module's peers. Succeeds once, for the owner only.
    Wire {
        #[arg(long)]
        module: String,
        #[arg(long)]
        caller: String,
        /// Peer addresses in slot order (comma-separated).
        #[arg(long, value_delimiter = ',')]
        addresses: Vec<String>,
    },

    /// Print a module record and a one-line summary.
    Inspect {
        #[arg(long)]
        module: String,
    },

    /// Print the events recorded for a module.
    Events {
        #[arg(long)]
        module: String,
    },
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,wiring=debug")),
        )
        .init();

    let args = Args::parse();

    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);
    let engine = WiringEngine::new(Arc::clone(&db));
    info!(data_dir = %data_dir.display(), "state database opened");
    let now = chrono::Utc::now().timestamp();

    match args.command {
        Command::Deploy { params, no_wire } => {
            let params = load_or_generate_deploy_params(params.as_deref())?;
            let book = if no_wire {
                let book = deploy_modules(&engine, &params, now).context("deploying modules")?;
                db.flush().context("flushing state")?;
                book
            } else {
                deploy_system(&engine, &params, now).context("deploying system")?
            };
            println!("{}", serde_json::to_string_pretty(&book)?);
            Ok(())
        }

        Command::DeployModule { kind, owner, deployer } => {
            let kind: ModuleKind = kind.parse().context("--kind")?;
            let owner = parse_address(&owner, "--owner")?;
            let deployer = match deployer {
                Some(d) => parse_address(&d, "--deployer")?,
                None => owner,
            };
            let address = engine
                .deploy_module(&deployer, &owner, kind, now)
                .context("deploying module")?;
            db.flush().context("flushing state")?;
            println!("{address}");
            Ok(())
        }

        Command::DeployCode { deployer, code } => {
            let deployer = parse_address(&deployer, "--deployer")?;
            let code = hex::decode(code.trim_start_matches("0x")).context("--code is not hex")?;
            let address = engine
                .deploy_contract(&deployer, &code)
                .context("deploying code")?;
            db.flush().context("flushing state")?;
            println!("{address}");
            Ok(())
        }

        Command::Wire { module, caller, addresses } => {
            let module = parse_address(&module, "--module")?;
            let caller = parse_address(&caller, "--caller")?;
            let addresses = addresses
                .iter()
                .map(|a| parse_address(a, "--addresses"))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let call = WiringCall::new(module, caller, addresses);
            let receipt = match engine.initialize(&call, now) {
                Ok(r) => r,
                Err(e) if e.is_guard_rejection() => bail!("wiring rejected: {e}"),
                Err(e) => return Err(e).context("applying wiring call"),
            };
            db.flush().context("flushing state")?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "call_id": receipt.call_id.to_hex(),
                    "module": receipt.module,
                    "kind": receipt.kind.name(),
                    "wired_at": receipt.wired_at,
                }))?
            );
            Ok(())
        }

        Command::Inspect { module } => {
            let module = parse_address(&module, "--module")?;
            let query = ModuleQuery::new(&db);
            let Some(record) = query.get(&module)? else {
                bail!("no module deployed at {module}");
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
            println!("{}", query.describe(&module)?);
            Ok(())
        }

        Command::Events { module } => {
            let module = parse_address(&module, "--module")?;
            let events = engine.events_for(&module)?;
            println!("{}", serde_json::to_string_pretty(&events)?);
            Ok(())
        }
    }
}

fn parse_address(s: &str, flag: &str) -> anyhow::Result<Address> {
    Address::from_hex(s).with_context(|| format!("{flag}: expected a {ADDRESS_LEN}-byte hex address"))
}

/// Load deployment params from a JSON file, or generate a random owner if no
/// path is given.
///
/// # Warning
/// A random owner is not recoverable. Nobody else can wire modules deployed
/// with `--no-wire` under it. Only use this for local experiments.
fn load_or_generate_deploy_params(path: Option<&Path>) -> anyhow::Result<DeployParams> {
    if let Some(p) = path {
        let json = std::fs::read_to_string(p)
            .with_context(|| format!("reading deploy params from {}", p.display()))?;
        return serde_json::from_str(&json).context("parsing deploy params JSON");
    }
    let owner = Address::from_bytes(rand::random());
    warn!(%owner, "no --params provided, generating an ephemeral owner. DO NOT USE IN PRODUCTION");
    Ok(DeployParams::new(owner))
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
