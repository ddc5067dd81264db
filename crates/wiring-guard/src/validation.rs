use tracing::debug;
use wiring_core::error::WiringError;
use wiring_core::module::ModuleRecord;
use wiring_core::types::Address;

/// Validate a wiring call against a module's current record.
///
/// Checks (in order, first failure wins):
/// 1. `caller` is the module owner
/// 2. the module has not been initialized yet
/// 3. exactly one address per slot
/// 4. no address is the zero sentinel (all slots scanned)
/// 5. every contract slot points at deployed code (caller provides the lookup;
///    a failing lookup is returned as-is)
///
/// Nothing is written here; on `Ok` the caller commits all slots at once.
pub fn check_wiring<F>(
    record: &ModuleRecord,
    caller: &Address,
    addresses: &[Address],
    code_size: F,
) -> Result<(), WiringError>
where
    F: Fn(&Address) -> Result<usize, WiringError>,
{
    // ── 1. Owner gate ────────────────────────────────────────────────────────
    if *caller != record.owner {
        return Err(WiringError::Unauthorized { caller: caller.to_hex() });
    }

    // ── 2. One-shot ──────────────────────────────────────────────────────────
    if record.initialized {
        return Err(WiringError::AlreadyInitialized(record.address.to_hex()));
    }

    // ── 3. Arity ─────────────────────────────────────────────────────────────
    let layout = record.kind.slots();
    if addresses.len() != layout.len() {
        return Err(WiringError::ArityMismatch {
            expected: layout.len(),
            got: addresses.len(),
        });
    }

    // ── 4. Zero sentinel ─────────────────────────────────────────────────────
    if let Some(slot) = addresses.iter().position(Address::is_zero) {
        return Err(WiringError::ZeroAddress { slot });
    }

    // ── 5. Code presence ─────────────────────────────────────────────────────
    for (slot, (spec, addr)) in layout.iter().zip(addresses).enumerate() {
        if !spec.requires_contract() {
            continue;
        }
        let size = code_size(addr)?;
        debug!(module = %record.address, slot, name = spec.name, code_size = size, "slot code check");
        if size == 0 {
            return Err(WiringError::NotAContract { slot, address: addr.to_hex() });
        }
    }

    Ok(())
}
