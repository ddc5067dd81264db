use wiring_core::constants::{ADDRESS_LEN, CALL_DOMAIN, CREATE_DOMAIN};
use wiring_core::types::{Address, CallId, CodeHash, Nonce};

/// Compute BLAKE3 hash of arbitrary bytes → 32-byte array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Derive the address of the `nonce`-th contract created by `deployer`:
/// the first 20 bytes of BLAKE3("wiring/create" || deployer || nonce LE).
pub fn contract_address(deployer: &Address, nonce: Nonce) -> Address {
    let mut h = blake3::Hasher::new();
    h.update(CREATE_DOMAIN);
    h.update(deployer.as_bytes());
    h.update(&nonce.to_le_bytes());
    let digest = h.finalize();
    let mut arr = [0u8; ADDRESS_LEN];
    arr.copy_from_slice(&digest.as_bytes()[..ADDRESS_LEN]);
    Address::from_bytes(arr)
}

/// Hash of deployed runtime code.
pub fn code_hash(code: &[u8]) -> CodeHash {
    CodeHash(blake3_hash(code))
}

/// Derive a CallId from canonical wiring call body bytes.
pub fn call_id(body_bytes: &[u8]) -> CallId {
    let mut h = blake3::Hasher::new();
    h.update(CALL_DOMAIN);
    h.update(body_bytes);
    CallId::from_bytes(*h.finalize().as_bytes())
}
