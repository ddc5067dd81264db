use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{abort, ConflictableTransactionResult, TransactionError};
use sled::Transactional;
use std::path::Path;
use wiring_core::call::WiringEvent;
use wiring_core::error::WiringError;
use wiring_core::module::ModuleRecord;
use wiring_core::types::{Address, Nonce};

/// Persistent wiring state backed by sled (pure-Rust, no C dependencies).
///
/// Named trees:
///   modules — Address bytes            → bincode(ModuleRecord)
///   code    — Address bytes            → raw runtime code
///   nonces  — Address bytes            → u64 LE (next creation nonce)
///   events  — Address bytes || id BE   → bincode(WiringEvent)
///   meta    — utf8 key bytes           → raw bytes
pub struct StateDb {
    db: sled::Db,
    modules: sled::Tree,
    code: sled::Tree,
    nonces: sled::Tree,
    events: sled::Tree,
    meta: sled::Tree,
}

fn storage(e: sled::Error) -> WiringError {
    WiringError::Storage(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, WiringError> {
    bincode::serialize(value).map_err(|e| WiringError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WiringError> {
    bincode::deserialize(bytes).map_err(|e| WiringError::Serialization(e.to_string()))
}

fn decode_nonce(bytes: &[u8]) -> Nonce {
    bytes.try_into().map(Nonce::from_le_bytes).unwrap_or(0)
}

fn event_key(module: &Address, id: u64) -> Vec<u8> {
    let mut key = module.as_bytes().to_vec();
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn tx_error(e: TransactionError<WiringError>) -> WiringError {
    match e {
        TransactionError::Abort(inner) => inner,
        TransactionError::Storage(e) => storage(e),
    }
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WiringError> {
        let db = sled::open(path).map_err(storage)?;
        let modules = db.open_tree("modules").map_err(storage)?;
        let code    = db.open_tree("code").map_err(storage)?;
        let nonces  = db.open_tree("nonces").map_err(storage)?;
        let events  = db.open_tree("events").map_err(storage)?;
        let meta    = db.open_tree("meta").map_err(storage)?;
        Ok(Self { db, modules, code, nonces, events, meta })
    }

    // ── Code ──────────────────────────────────────────────────────────────────

    pub fn get_code(&self, address: &Address) -> Result<Option<Vec<u8>>, WiringError> {
        self.code
            .get(address.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage)
    }

    /// Length of the code deployed at `address`; 0 for accounts.
    pub fn code_size(&self, address: &Address) -> Result<usize, WiringError> {
        Ok(self
            .code
            .get(address.as_bytes())
            .map_err(storage)?
            .map(|v| v.len())
            .unwrap_or(0))
    }

    /// Place `code` at a fresh address. Fails if anything is already there.
    pub fn put_code(&self, address: &Address, code: &[u8]) -> Result<(), WiringError> {
        self.code
            .compare_and_swap(address.as_bytes(), None::<&[u8]>, Some(code))
            .map_err(storage)?
            .map_err(|_| WiringError::AddressOccupied(address.to_hex()))
    }

    // ── Nonces ────────────────────────────────────────────────────────────────

    /// Return the deployer's current creation nonce and advance it.
    pub fn next_nonce(&self, deployer: &Address) -> Result<Nonce, WiringError> {
        let prev = self
            .nonces
            .fetch_and_update(deployer.as_bytes(), |old| {
                let n = old.map(decode_nonce).unwrap_or(0);
                Some((n + 1).to_le_bytes().to_vec())
            })
            .map_err(storage)?;
        Ok(prev.map(|v| decode_nonce(&v)).unwrap_or(0))
    }

    // ── Modules ───────────────────────────────────────────────────────────────

    pub fn get_module(&self, address: &Address) -> Result<Option<ModuleRecord>, WiringError> {
        match self.modules.get(address.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn module_exists(&self, address: &Address) -> Result<bool, WiringError> {
        self.modules.contains_key(address.as_bytes()).map_err(storage)
    }

    /// Write a freshly deployed module together with its code.
    /// Fails with `AddressOccupied` if either already exists.
    pub fn insert_module(&self, record: &ModuleRecord, code: &[u8]) -> Result<(), WiringError> {
        let record_bytes = encode(record)?;
        let key = record.address.as_bytes();
        (&self.modules, &self.code)
            .transaction(|(modules, code_tree)| -> ConflictableTransactionResult<(), WiringError> {
                if modules.get(key)?.is_some() || code_tree.get(key)?.is_some() {
                    return abort(WiringError::AddressOccupied(record.address.to_hex()));
                }
                modules.insert(&key[..], record_bytes.as_slice())?;
                code_tree.insert(&key[..], code)?;
                Ok(())
            })
            .map_err(tx_error)
    }

    /// Atomically replace an uninitialized module record with its wired
    /// version and append `events`.
    ///
    /// The stored record is re-read inside the transaction, so of two
    /// concurrent commits for the same module exactly one succeeds; the other
    /// aborts with `AlreadyInitialized` and leaves nothing behind.
    pub fn commit_wiring(&self, wired: &ModuleRecord, events: &[WiringEvent]) -> Result<(), WiringError> {
        let record_bytes = encode(wired)?;
        let mut rows = Vec::with_capacity(events.len());
        for ev in events {
            let id = self.db.generate_id().map_err(storage)?;
            rows.push((event_key(ev.module(), id), encode(ev)?));
        }

        let key = wired.address.as_bytes();
        (&self.modules, &self.events)
            .transaction(|(modules, events_tree)| -> ConflictableTransactionResult<(), WiringError> {
                let current: ModuleRecord = match modules.get(key)? {
                    Some(bytes) => match decode(&bytes) {
                        Ok(rec) => rec,
                        Err(e) => return abort(e),
                    },
                    None => return abort(WiringError::UnknownModule(wired.address.to_hex())),
                };
                if current.initialized {
                    return abort(WiringError::AlreadyInitialized(wired.address.to_hex()));
                }
                modules.insert(&key[..], record_bytes.as_slice())?;
                for (k, v) in &rows {
                    events_tree.insert(k.as_slice(), v.as_slice())?;
                }
                Ok(())
            })
            .map_err(tx_error)
    }

    pub fn iter_modules(&self) -> Result<Vec<ModuleRecord>, WiringError> {
        let mut out = Vec::new();
        for item in self.modules.iter() {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    // ── Events ────────────────────────────────────────────────────────────────

    /// Events recorded for `module`, oldest first.
    pub fn events_for(&self, module: &Address) -> Result<Vec<WiringEvent>, WiringError> {
        let mut out = Vec::new();
        for item in self.events.scan_prefix(module.as_bytes()) {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    // ── Meta ──────────────────────────────────────────────────────────────────

    /// Write `key` only if it is unset. Returns false, leaving the stored
    /// value alone, when another writer got there first.
    pub fn put_meta_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, WiringError> {
        let swapped = self
            .meta
            .compare_and_swap(key.as_bytes(), None::<&[u8]>, Some(value))
            .map_err(storage)?;
        Ok(swapped.is_ok())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, WiringError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), WiringError> {
        self.db.flush().map_err(storage)?;
        Ok(())
    }
}
