//! ─── Wiring Protocol Constants ───────────────────────────────────────────────
//!
//! Slot names, layouts and derivation tags shared by every crate.

use crate::module::{SlotKind, SlotSpec};

// ── Addresses ────────────────────────────────────────────────────────────────

/// Byte length of an `Address`.
pub const ADDRESS_LEN: usize = 20;

/// Domain tag for contract address derivation.
pub const CREATE_DOMAIN: &[u8] = b"wiring/create";

/// Domain tag for wiring call ids.
pub const CALL_DOMAIN: &[u8] = b"wiring/call";

// ── Slot names ───────────────────────────────────────────────────────────────

pub const SLOT_TROVE_MANAGER: &str = "trove_manager";
pub const SLOT_BORROWER_OPERATIONS: &str = "borrower_operations";
pub const SLOT_ACTIVE_POOL: &str = "active_pool";
pub const SLOT_DEFAULT_POOL: &str = "default_pool";
pub const SLOT_STABILITY_POOL: &str = "stability_pool";
pub const SLOT_GAS_POOL: &str = "gas_pool";
pub const SLOT_COLL_SURPLUS_POOL: &str = "coll_surplus_pool";
pub const SLOT_PRICE_FEED: &str = "price_feed";
pub const SLOT_BOLD_TOKEN: &str = "bold_token";
pub const SLOT_SORTED_TROVES: &str = "sorted_troves";
pub const SLOT_LIST_OPERATOR: &str = "list_operator";

const fn contract(name: &'static str) -> SlotSpec {
    SlotSpec { name, kind: SlotKind::Contract }
}

const fn account(name: &'static str) -> SlotSpec {
    SlotSpec { name, kind: SlotKind::Account }
}

// ── Layouts ──────────────────────────────────────────────────────────────────

pub const TROVE_MANAGER_SLOTS: [SlotSpec; 9] = [
    contract(SLOT_BORROWER_OPERATIONS),
    contract(SLOT_ACTIVE_POOL),
    contract(SLOT_DEFAULT_POOL),
    contract(SLOT_STABILITY_POOL),
    contract(SLOT_GAS_POOL),
    contract(SLOT_COLL_SURPLUS_POOL),
    contract(SLOT_PRICE_FEED),
    contract(SLOT_BOLD_TOKEN),
    contract(SLOT_SORTED_TROVES),
];

pub const BORROWER_OPERATIONS_SLOTS: [SlotSpec; 9] = [
    contract(SLOT_TROVE_MANAGER),
    contract(SLOT_ACTIVE_POOL),
    contract(SLOT_DEFAULT_POOL),
    contract(SLOT_STABILITY_POOL),
    contract(SLOT_GAS_POOL),
    contract(SLOT_COLL_SURPLUS_POOL),
    contract(SLOT_PRICE_FEED),
    contract(SLOT_SORTED_TROVES),
    contract(SLOT_BOLD_TOKEN),
];

pub const DEFAULT_POOL_SLOTS: [SlotSpec; 2] = [
    contract(SLOT_TROVE_MANAGER),
    contract(SLOT_ACTIVE_POOL),
];

pub const STABILITY_POOL_SLOTS: [SlotSpec; 6] = [
    contract(SLOT_BORROWER_OPERATIONS),
    contract(SLOT_TROVE_MANAGER),
    contract(SLOT_ACTIVE_POOL),
    contract(SLOT_BOLD_TOKEN),
    contract(SLOT_SORTED_TROVES),
    contract(SLOT_PRICE_FEED),
];

pub const ACTIVE_POOL_SLOTS: [SlotSpec; 6] = [
    contract(SLOT_BORROWER_OPERATIONS),
    contract(SLOT_TROVE_MANAGER),
    contract(SLOT_STABILITY_POOL),
    contract(SLOT_DEFAULT_POOL),
    contract(SLOT_COLL_SURPLUS_POOL),
    contract(SLOT_BOLD_TOKEN),
];

/// The list operator may be a plain account; only the zero check applies.
pub const SORTED_TROVES_SLOTS: [SlotSpec; 2] = [
    account(SLOT_LIST_OPERATOR),
    contract(SLOT_BORROWER_OPERATIONS),
];

// ── Support contracts ────────────────────────────────────────────────────────

/// Placeholder runtime code for support contracts deployed alongside the
/// modules. Only its presence matters to the guard.
pub const GAS_POOL_CODE: &[u8] = b"wiring:gas_pool:v1";
pub const COLL_SURPLUS_POOL_CODE: &[u8] = b"wiring:coll_surplus_pool:v1";
pub const PRICE_FEED_CODE: &[u8] = b"wiring:price_feed:v1";
pub const BOLD_TOKEN_CODE: &[u8] = b"wiring:bold_token:v1";
