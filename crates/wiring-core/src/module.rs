use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    ACTIVE_POOL_SLOTS, BORROWER_OPERATIONS_SLOTS, DEFAULT_POOL_SLOTS, SORTED_TROVES_SLOTS,
    STABILITY_POOL_SLOTS, TROVE_MANAGER_SLOTS,
};
use crate::error::WiringError;
use crate::types::{Address, Timestamp};

// ── Slots ─────────────────────────────────────────────────────────────────────

/// What an address slot is allowed to point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKind {
    /// Must reference an address with deployed code.
    Contract,
    /// Any non-zero address, including externally owned accounts.
    Account,
}

/// One named dependency in a module's layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotSpec {
    pub name: &'static str,
    pub kind: SlotKind,
}

impl SlotSpec {
    pub fn requires_contract(&self) -> bool {
        self.kind == SlotKind::Contract
    }
}

// ── ModuleKind ────────────────────────────────────────────────────────────────

/// The independently deployed units that take part in wiring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    TroveManager,
    BorrowerOperations,
    DefaultPool,
    StabilityPool,
    ActivePool,
    SortedTroves,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 6] = [
        ModuleKind::TroveManager,
        ModuleKind::BorrowerOperations,
        ModuleKind::DefaultPool,
        ModuleKind::StabilityPool,
        ModuleKind::ActivePool,
        ModuleKind::SortedTroves,
    ];

    /// Ordered slot layout recorded by `initialize`.
    pub fn slots(&self) -> &'static [SlotSpec] {
        match self {
            ModuleKind::TroveManager => &TROVE_MANAGER_SLOTS,
            ModuleKind::BorrowerOperations => &BORROWER_OPERATIONS_SLOTS,
            ModuleKind::DefaultPool => &DEFAULT_POOL_SLOTS,
            ModuleKind::StabilityPool => &STABILITY_POOL_SLOTS,
            ModuleKind::ActivePool => &ACTIVE_POOL_SLOTS,
            ModuleKind::SortedTroves => &SORTED_TROVES_SLOTS,
        }
    }

    /// Number of addresses `initialize` expects.
    pub fn arity(&self) -> usize {
        self.slots().len()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModuleKind::TroveManager => "trove-manager",
            ModuleKind::BorrowerOperations => "borrower-operations",
            ModuleKind::DefaultPool => "default-pool",
            ModuleKind::StabilityPool => "stability-pool",
            ModuleKind::ActivePool => "active-pool",
            ModuleKind::SortedTroves => "sorted-troves",
        }
    }

    /// Runtime code placed at a module's address on deployment.
    pub fn code(&self) -> Vec<u8> {
        format!("wiring:module:{}:v1", self.name()).into_bytes()
    }

    /// Index of the slot called `name`, if the layout has one.
    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots().iter().position(|s| s.name == name)
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModuleKind {
    type Err = WiringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ModuleKind::ALL
            .into_iter()
            .find(|k| k.name() == normalized)
            .ok_or_else(|| WiringError::UnknownModuleKind(s.to_string()))
    }
}

// ── ModuleRecord ──────────────────────────────────────────────────────────────

/// Stored state of one deployed module.
///
/// While `initialized` is false every slot holds `Address::ZERO`; once true,
/// every slot holds a validated peer and the record never changes again.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleRecord {
    pub address: Address,
    pub kind: ModuleKind,
    /// Fixed at deployment. No transfer path exists.
    pub owner: Address,
    pub initialized: bool,
    pub slots: Vec<Address>,
    pub deployed_at: Timestamp,
    #[serde(default)]
    pub wired_at: Option<Timestamp>,
}

impl ModuleRecord {
    pub fn new(address: Address, kind: ModuleKind, owner: Address, deployed_at: Timestamp) -> Self {
        Self {
            address,
            kind,
            owner,
            initialized: false,
            slots: vec![Address::ZERO; kind.arity()],
            deployed_at,
            wired_at: None,
        }
    }

    /// Peer recorded under slot `name`. `None` before wiring or for an
    /// unknown slot name.
    pub fn peer(&self, name: &str) -> Option<Address> {
        if !self.initialized {
            return None;
        }
        self.kind.slot_index(name).map(|i| self.slots[i])
    }

    /// Slot names paired with their current values.
    pub fn named_slots(&self) -> Vec<(&'static str, Address)> {
        self.kind
            .slots()
            .iter()
            .zip(self.slots.iter())
            .map(|(spec, addr)| (spec.name, *addr))
            .collect()
    }

    /// Copy of this record with all slots set and the flag flipped.
    /// Callers validate `addresses` first.
    pub fn wired(&self, addresses: &[Address], now: Timestamp) -> Self {
        Self {
            initialized: true,
            slots: addresses.to_vec(),
            wired_at: Some(now),
            ..self.clone()
        }
    }
}
