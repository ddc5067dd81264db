//! wiring-deploy
//!
//! Stands up a complete system in an empty `StateDb`: four support contracts,
//! the six modules owned by a single owner, and the one-time wiring of each
//! module to its peers.
//!
//! Topology (slot name → address book entry):
//!
//!   trove_manager, borrower_operations, active_pool, default_pool,
//!   stability_pool, sorted_troves   → the deployed modules
//!   gas_pool, coll_surplus_pool,
//!   price_feed, bold_token          → the support contracts
//!   list_operator                   → the trove manager

pub mod params;

pub use params::DeployParams;

use serde::{Deserialize, Serialize};
use tracing::info;
use wiring_core::call::{WiringCall, WiringReceipt};
use wiring_core::constants::{
    BOLD_TOKEN_CODE, COLL_SURPLUS_POOL_CODE, GAS_POOL_CODE, PRICE_FEED_CODE, SLOT_ACTIVE_POOL,
    SLOT_BOLD_TOKEN, SLOT_BORROWER_OPERATIONS, SLOT_COLL_SURPLUS_POOL, SLOT_DEFAULT_POOL,
    SLOT_GAS_POOL, SLOT_LIST_OPERATOR, SLOT_PRICE_FEED, SLOT_SORTED_TROVES, SLOT_STABILITY_POOL,
    SLOT_TROVE_MANAGER,
};
use wiring_core::error::WiringError;
use wiring_core::module::ModuleKind;
use wiring_core::types::{Address, Timestamp};
use wiring_state::{StateDb, WiringEngine};

/// Meta key under which the address book is stored (JSON).
pub const ADDRESS_BOOK_KEY: &str = "address_book";

/// Every address produced by a system deployment.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressBook {
    pub owner: Address,
    pub deployer: Address,

    // ── Support contracts ────────────────────────────────────────────────────
    pub gas_pool: Address,
    pub coll_surplus_pool: Address,
    pub price_feed: Address,
    pub bold_token: Address,

    // ── Modules ──────────────────────────────────────────────────────────────
    pub trove_manager: Address,
    pub borrower_operations: Address,
    pub default_pool: Address,
    pub stability_pool: Address,
    pub active_pool: Address,
    pub sorted_troves: Address,
}

impl AddressBook {
    /// Address a slot named `slot` should hold.
    pub fn resolve(&self, slot: &str) -> Option<Address> {
        let a = match slot {
            SLOT_TROVE_MANAGER | SLOT_LIST_OPERATOR => self.trove_manager,
            SLOT_BORROWER_OPERATIONS => self.borrower_operations,
            SLOT_ACTIVE_POOL => self.active_pool,
            SLOT_DEFAULT_POOL => self.default_pool,
            SLOT_STABILITY_POOL => self.stability_pool,
            SLOT_SORTED_TROVES => self.sorted_troves,
            SLOT_GAS_POOL => self.gas_pool,
            SLOT_COLL_SURPLUS_POOL => self.coll_surplus_pool,
            SLOT_PRICE_FEED => self.price_feed,
            SLOT_BOLD_TOKEN => self.bold_token,
            _ => return None,
        };
        (!a.is_zero()).then_some(a)
    }

    pub fn module(&self, kind: ModuleKind) -> Address {
        match kind {
            ModuleKind::TroveManager => self.trove_manager,
            ModuleKind::BorrowerOperations => self.borrower_operations,
            ModuleKind::DefaultPool => self.default_pool,
            ModuleKind::StabilityPool => self.stability_pool,
            ModuleKind::ActivePool => self.active_pool,
            ModuleKind::SortedTroves => self.sorted_troves,
        }
    }

    /// Peers for `kind`, ordered to match its slot layout.
    pub fn peers_for(&self, kind: ModuleKind) -> Result<Vec<Address>, WiringError> {
        kind.slots()
            .iter()
            .map(|spec| {
                self.resolve(spec.name).ok_or_else(|| {
                    WiringError::DeploymentIncomplete(format!("{kind}: no address for {}", spec.name))
                })
            })
            .collect()
    }
}

/// Deploy the support contracts and the six unwired modules, and store the
/// resulting address book. Fails with `AlreadyDeployed` on a database that
/// already holds one.
///
/// Not atomic: if a step fails, whatever was deployed before it stays in the
/// database with no address book. The book itself is written only if still
/// absent, so of two concurrent callers exactly one stores its book; the
/// other gets `AlreadyDeployed` and its deployments are orphaned.
pub fn deploy_modules(
    engine: &WiringEngine,
    params: &DeployParams,
    now: Timestamp,
) -> Result<AddressBook, WiringError> {
    if engine.db.get_meta(ADDRESS_BOOK_KEY)?.is_some() {
        return Err(WiringError::AlreadyDeployed);
    }
    let deployer = params.deployer();
    let owner = params.owner;
    info!(%owner, %deployer, "deploying system");

    // ── 1. Support contracts ─────────────────────────────────────────────────
    let gas_pool = engine.deploy_contract(&deployer, GAS_POOL_CODE)?;
    let coll_surplus_pool = engine.deploy_contract(&deployer, COLL_SURPLUS_POOL_CODE)?;
    let price_feed = engine.deploy_contract(&deployer, PRICE_FEED_CODE)?;
    let bold_token = engine.deploy_contract(&deployer, BOLD_TOKEN_CODE)?;
    info!("deploy: support contracts created");

    // ── 2. Modules ───────────────────────────────────────────────────────────
    let module = |kind| engine.deploy_module(&deployer, &owner, kind, now);
    let book = AddressBook {
        owner,
        deployer,
        gas_pool,
        coll_surplus_pool,
        price_feed,
        bold_token,
        trove_manager: module(ModuleKind::TroveManager)?,
        borrower_operations: module(ModuleKind::BorrowerOperations)?,
        default_pool: module(ModuleKind::DefaultPool)?,
        stability_pool: module(ModuleKind::StabilityPool)?,
        active_pool: module(ModuleKind::ActivePool)?,
        sorted_troves: module(ModuleKind::SortedTroves)?,
    };
    info!(modules = ModuleKind::ALL.len(), "deploy: modules created");

    let json =
        serde_json::to_vec(&book).map_err(|e| WiringError::Serialization(e.to_string()))?;
    if !engine.db.put_meta_if_absent(ADDRESS_BOOK_KEY, &json)? {
        return Err(WiringError::AlreadyDeployed);
    }
    Ok(book)
}

/// Wire every module in the book as `caller`. Stops at the first rejection.
pub fn wire_system(
    engine: &WiringEngine,
    book: &AddressBook,
    caller: &Address,
    now: Timestamp,
) -> Result<Vec<WiringReceipt>, WiringError> {
    let mut receipts = Vec::with_capacity(ModuleKind::ALL.len());
    for kind in ModuleKind::ALL {
        let call = WiringCall::new(book.module(kind), *caller, book.peers_for(kind)?);
        receipts.push(engine.initialize(&call, now)?);
    }
    info!(modules = receipts.len(), "deploy: system wired");
    Ok(receipts)
}

/// Check that every module is initialized and points at the peers the
/// address book says it should.
pub fn verify_wiring(engine: &WiringEngine, book: &AddressBook) -> Result<(), WiringError> {
    for kind in ModuleKind::ALL {
        let address = book.module(kind);
        let record = engine
            .module(&address)?
            .ok_or_else(|| WiringError::DeploymentIncomplete(format!("{kind} missing at {address}")))?;
        if !record.initialized {
            return Err(WiringError::DeploymentIncomplete(format!("{kind} not initialized")));
        }
        if record.slots != book.peers_for(kind)? {
            return Err(WiringError::DeploymentIncomplete(format!(
                "{kind} peers do not match the address book"
            )));
        }
    }
    info!("wiring verified");
    Ok(())
}

/// Deploy, wire as the owner, verify, and flush.
pub fn deploy_system(
    engine: &WiringEngine,
    params: &DeployParams,
    now: Timestamp,
) -> Result<AddressBook, WiringError> {
    let book = deploy_modules(engine, params, now)?;
    wire_system(engine, &book, &params.owner, now)?;
    verify_wiring(engine, &book)?;

    engine.db.flush()?;
    info!("system committed to disk");
    Ok(book)
}

/// The address book stored by a previous deployment, if any.
pub fn load_address_book(db: &StateDb) -> Result<Option<AddressBook>, WiringError> {
    match db.get_meta(ADDRESS_BOOK_KEY)? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| WiringError::Serialization(e.to_string())),
        None => Ok(None),
    }
}
