use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WiringError {
    // ── Guard rejections (checked in this order) ─────────────────────────────
    #[error("caller {caller} is not the module owner")]
    Unauthorized { caller: String },

    #[error("module {0} is already initialized")]
    AlreadyInitialized(String),

    #[error("wrong number of addresses: expected {expected}, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("account cannot be zero address (slot {slot})")]
    ZeroAddress { slot: usize },

    #[error("account code size cannot be zero (slot {slot}: {address})")]
    NotAContract { slot: usize, address: String },

    // ── Registry errors ──────────────────────────────────────────────────────
    #[error("no module deployed at {0}")]
    UnknownModule(String),

    #[error("address already occupied: {0}")]
    AddressOccupied(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("refusing to deploy empty code")]
    EmptyCode,

    #[error("unknown module kind: {0}")]
    UnknownModuleKind(String),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    // ── Deployment ───────────────────────────────────────────────────────────
    #[error("system already deployed in this database")]
    AlreadyDeployed,

    #[error("deployment incomplete: {0}")]
    DeploymentIncomplete(String),
}

impl WiringError {
    /// True for rejections produced by the wiring guard itself, as opposed to
    /// lookup, storage or deployment failures.
    pub fn is_guard_rejection(&self) -> bool {
        matches!(
            self,
            WiringError::Unauthorized { .. }
                | WiringError::AlreadyInitialized(_)
                | WiringError::ArityMismatch { .. }
                | WiringError::ZeroAddress { .. }
                | WiringError::NotAContract { .. }
        )
    }
}
