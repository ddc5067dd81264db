use wiring_core::error::WiringError;
use wiring_core::module::ModuleRecord;
use wiring_core::types::Address;

use crate::db::StateDb;

/// Read-only helpers over deployed modules.
pub struct ModuleQuery<'a> {
    db: &'a StateDb,
}

impl<'a> ModuleQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    fn require(&self, module: &Address) -> Result<ModuleRecord, WiringError> {
        self.db
            .get_module(module)?
            .ok_or_else(|| WiringError::UnknownModule(module.to_hex()))
    }

    /// Fetch a single module by address.
    pub fn get(&self, module: &Address) -> Result<Option<ModuleRecord>, WiringError> {
        self.db.get_module(module)
    }

    pub fn is_initialized(&self, module: &Address) -> Result<bool, WiringError> {
        Ok(self.require(module)?.initialized)
    }

    /// The peer a wired module recorded under `slot`.
    pub fn peer(&self, module: &Address, slot: &str) -> Result<Option<Address>, WiringError> {
        Ok(self.require(module)?.peer(slot))
    }

    /// Human-readable summary of a module's wiring state.
    pub fn describe(&self, module: &Address) -> Result<String, WiringError> {
        let m = self.require(module)?;
        let state = match m.wired_at {
            Some(at) if m.initialized => {
                let peers: Vec<String> = m
                    .named_slots()
                    .into_iter()
                    .map(|(name, addr)| format!("{name}={addr}"))
                    .collect();
                format!("wired at {}: {}", at, peers.join(", "))
            }
            _ => format!("awaiting wiring ({} slots unset)", m.kind.arity()),
        };
        Ok(format!("{} {} | owner: {} | {}", m.kind, m.address, m.owner, state))
    }
}
