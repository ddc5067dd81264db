use serde::{Deserialize, Serialize};

use crate::error::WiringError;
use crate::module::ModuleKind;
use crate::types::{Address, CallId, Timestamp};

// ── WiringCall ────────────────────────────────────────────────────────────────

/// A request to record `addresses` as the peers of `module`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WiringCall {
    pub module: Address,
    pub caller: Address,
    /// Ordered to match the module's slot layout.
    pub addresses: Vec<Address>,
}

impl WiringCall {
    pub fn new(module: Address, caller: Address, addresses: Vec<Address>) -> Self {
        Self { module, caller, addresses }
    }

    /// Canonical bytes hashed into the call id (bincode).
    pub fn body_bytes(&self) -> Result<Vec<u8>, WiringError> {
        bincode::serialize(self).map_err(|e| WiringError::Serialization(e.to_string()))
    }
}

/// Returned by a successful `initialize`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WiringReceipt {
    pub call_id: CallId,
    pub module: Address,
    pub kind: ModuleKind,
    pub wired_at: Timestamp,
}

// ── Events ────────────────────────────────────────────────────────────────────

/// Append-only log entries written alongside a successful wiring.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum WiringEvent {
    /// One entry per slot recorded by `initialize`.
    AddressChanged {
        module: Address,
        slot: usize,
        name: String,
        address: Address,
        at: Timestamp,
    },
}

impl WiringEvent {
    pub fn module(&self) -> &Address {
        match self {
            WiringEvent::AddressChanged { module, .. } => module,
        }
    }
}
