use serde::{Deserialize, Serialize};
use wiring_core::types::Address;

/// Inputs for a full-system deployment.
///
/// Loaded from a JSON file in production; in tests and throwaway runs a
/// random owner is generated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeployParams {
    /// Fixed owner of all six modules. The only caller allowed to wire them.
    pub owner: Address,
    /// Account whose creation nonces derive the deployed addresses.
    /// Defaults to the owner.
    #[serde(default)]
    pub deployer: Option<Address>,
}

impl DeployParams {
    pub fn new(owner: Address) -> Self {
        Self { owner, deployer: None }
    }

    pub fn deployer(&self) -> Address {
        self.deployer.unwrap_or(self.owner)
    }
}
