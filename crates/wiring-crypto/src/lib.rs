pub mod hash;

pub use hash::{blake3_hash, call_id, code_hash, contract_address};
