use std::sync::Arc;

use tracing::{info, warn};
use wiring_core::call::{WiringCall, WiringEvent, WiringReceipt};
use wiring_core::error::WiringError;
use wiring_core::module::{ModuleKind, ModuleRecord};
use wiring_core::types::{Address, Timestamp};
use wiring_crypto::{call_id, code_hash, contract_address};
use wiring_guard::check_wiring;

use crate::db::StateDb;

// ── WiringEngine ──────────────────────────────────────────────────────────────

/// Deploys contracts and modules, and applies wiring calls.
///
/// Each `initialize` call is atomic: either every slot, the flag and all
/// events are written, or nothing is.
pub struct WiringEngine {
    pub db: Arc<StateDb>,
}

impl WiringEngine {
    pub fn new(db: Arc<StateDb>) -> Self {
        Self { db }
    }

    /// Deploy plain runtime code on behalf of `deployer`. Returns its address.
    pub fn deploy_contract(&self, deployer: &Address, code: &[u8]) -> Result<Address, WiringError> {
        if code.is_empty() {
            return Err(WiringError::EmptyCode);
        }
        let nonce = self.db.next_nonce(deployer)?;
        let address = contract_address(deployer, nonce);
        self.db.put_code(&address, code)?;
        info!(
            %address,
            %deployer,
            nonce,
            code_hash = %code_hash(code).to_hex(),
            "contract deployed"
        );
        Ok(address)
    }

    /// Deploy a module of `kind` with a fixed `owner` and every slot unset.
    pub fn deploy_module(
        &self,
        deployer: &Address,
        owner: &Address,
        kind: ModuleKind,
        now: Timestamp,
    ) -> Result<Address, WiringError> {
        let nonce = self.db.next_nonce(deployer)?;
        let address = contract_address(deployer, nonce);
        let record = ModuleRecord::new(address, kind, *owner, now);
        self.db.insert_module(&record, &kind.code())?;
        info!(%address, %kind, %owner, "module deployed");
        Ok(address)
    }

    /// Validate and apply a wiring call. Returns a receipt on success.
    pub fn initialize(&self, call: &WiringCall, now: Timestamp) -> Result<WiringReceipt, WiringError> {
        let record = self
            .db
            .get_module(&call.module)?
            .ok_or_else(|| WiringError::UnknownModule(call.module.to_hex()))?;

        // ── Guard ─────────────────────────────────────────────────────────────
        if let Err(e) = check_wiring(&record, &call.caller, &call.addresses, |a| self.db.code_size(a)) {
            if e.is_guard_rejection() {
                warn!(module = %call.module, caller = %call.caller, error = %e, "wiring rejected");
            } else {
                warn!(module = %call.module, error = %e, "wiring check failed");
            }
            return Err(e);
        }

        // ── Stage ─────────────────────────────────────────────────────────────
        let id = call_id(&call.body_bytes()?);
        let wired = record.wired(&call.addresses, now);
        let events: Vec<WiringEvent> = wired
            .named_slots()
            .into_iter()
            .enumerate()
            .map(|(slot, (name, address))| WiringEvent::AddressChanged {
                module: wired.address,
                slot,
                name: name.to_string(),
                address,
                at: now,
            })
            .collect();

        // ── Commit ────────────────────────────────────────────────────────────
        if let Err(e) = self.db.commit_wiring(&wired, &events) {
            warn!(module = %call.module, error = %e, "wiring commit aborted");
            return Err(e);
        }

        info!(module = %wired.address, kind = %wired.kind, call_id = %id, "module wired");
        Ok(WiringReceipt {
            call_id: id,
            module: wired.address,
            kind: wired.kind,
            wired_at: now,
        })
    }

    pub fn module(&self, address: &Address) -> Result<Option<ModuleRecord>, WiringError> {
        self.db.get_module(address)
    }

    pub fn code_size(&self, address: &Address) -> Result<usize, WiringError> {
        self.db.code_size(address)
    }

    pub fn events_for(&self, module: &Address) -> Result<Vec<WiringEvent>, WiringError> {
        self.db.events_for(module)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("wiring_engine_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    const NOW: i64 = 2_000_000;
    const DEPLOYER: u8 = 0xd0;
    const OWNER: u8 = 0x0a;
    const ALICE: u8 = 0xa1;
    const BOB: u8 = 0xb0;

    /// Deploy `n` distinct support contracts to use as peers.
    fn peers(engine: &WiringEngine, n: usize) -> Vec<Address> {
        (0..n)
            .map(|i| {
                engine
                    .deploy_contract(&addr(DEPLOYER), format!("peer-{i}").as_bytes())
                    .unwrap()
            })
            .collect()
    }

    fn setup(name: &str, kind: ModuleKind) -> (WiringEngine, Address, Vec<Address>) {
        let engine = WiringEngine::new(Arc::new(temp_db(name)));
        let module = engine.deploy_module(&addr(DEPLOYER), &addr(OWNER), kind, NOW).unwrap();
        let args = peers(&engine, kind.arity());
        (engine, module, args)
    }

    fn snapshot(engine: &WiringEngine, module: &Address) -> ModuleRecord {
        engine.module(module).unwrap().unwrap()
    }

    // ── Deployment ────────────────────────────────────────────────────────────

    #[test]
    fn deployed_module_is_unset_contract() {
        let (engine, module, _) = setup("deploy_unset", ModuleKind::ActivePool);
        let rec = snapshot(&engine, &module);
        assert_eq!(rec.owner, addr(OWNER));
        assert!(!rec.initialized);
        assert!(rec.slots.iter().all(Address::is_zero));
        assert!(engine.code_size(&module).unwrap() > 0);
        assert!(engine.events_for(&module).unwrap().is_empty());
    }

    #[test]
    fn deploy_addresses_are_distinct() {
        let engine = WiringEngine::new(Arc::new(temp_db("deploy_distinct")));
        let a = engine.deploy_contract(&addr(DEPLOYER), b"a").unwrap();
        let b = engine.deploy_contract(&addr(DEPLOYER), b"b").unwrap();
        let m = engine
            .deploy_module(&addr(DEPLOYER), &addr(OWNER), ModuleKind::DefaultPool, NOW)
            .unwrap();
        assert_ne!(a, b);
        assert_ne!(b, m);
    }

    #[test]
    fn empty_code_rejected() {
        let engine = WiringEngine::new(Arc::new(temp_db("deploy_empty")));
        assert_eq!(engine.deploy_contract(&addr(DEPLOYER), b"").unwrap_err(), WiringError::EmptyCode);
    }

    #[test]
    fn occupied_address_rejected() {
        let engine = WiringEngine::new(Arc::new(temp_db("deploy_occupied")));
        let a = engine.deploy_contract(&addr(DEPLOYER), b"a").unwrap();
        assert!(matches!(
            engine.db.put_code(&a, b"again").unwrap_err(),
            WiringError::AddressOccupied(_)
        ));
        let rec = ModuleRecord::new(a, ModuleKind::DefaultPool, addr(OWNER), NOW);
        assert!(matches!(
            engine.db.insert_module(&rec, b"module").unwrap_err(),
            WiringError::AddressOccupied(_)
        ));
        assert!(!engine.db.module_exists(&a).unwrap());
    }

    #[test]
    fn unknown_module_rejected() {
        let engine = WiringEngine::new(Arc::new(temp_db("unknown_module")));
        let call = WiringCall::new(addr(0x77), addr(OWNER), vec![addr(1), addr(2)]);
        assert!(matches!(
            engine.initialize(&call, NOW).unwrap_err(),
            WiringError::UnknownModule(_)
        ));
    }

    // ── Initialize ────────────────────────────────────────────────────────────

    #[test]
    fn trove_manager_wires_once() {
        let (engine, module, args) = setup("tm_once", ModuleKind::TroveManager);
        let call = WiringCall::new(module, addr(OWNER), args.clone());

        let receipt = engine.initialize(&call, NOW + 1).unwrap();
        assert_eq!(receipt.module, module);
        assert_eq!(receipt.kind, ModuleKind::TroveManager);

        let rec = snapshot(&engine, &module);
        assert!(rec.initialized);
        assert_eq!(rec.slots, args);
        assert_eq!(rec.wired_at, Some(NOW + 1));

        let err = engine.initialize(&call, NOW + 2).unwrap_err();
        assert_eq!(err, WiringError::AlreadyInitialized(module.to_hex()));
        assert_eq!(snapshot(&engine, &module), rec);
    }

    #[test]
    fn non_owner_cannot_wire_default_pool() {
        let (engine, module, args) = setup("dp_non_owner", ModuleKind::DefaultPool);
        let before = snapshot(&engine, &module);
        let err = engine
            .initialize(&WiringCall::new(module, addr(ALICE), args), NOW)
            .unwrap_err();
        assert!(matches!(err, WiringError::Unauthorized { .. }));
        assert_eq!(snapshot(&engine, &module), before);
    }

    #[test]
    fn zero_in_slot_three_rejected() {
        let (engine, module, mut args) = setup("sp_zero", ModuleKind::StabilityPool);
        let before = snapshot(&engine, &module);
        args[3] = Address::ZERO;
        let err = engine
            .initialize(&WiringCall::new(module, addr(OWNER), args), NOW)
            .unwrap_err();
        assert_eq!(err, WiringError::ZeroAddress { slot: 3 });
        assert_eq!(snapshot(&engine, &module), before);
    }

    #[test]
    fn account_in_slot_zero_rejected() {
        let (engine, module, mut args) = setup("ap_account", ModuleKind::ActivePool);
        let before = snapshot(&engine, &module);
        args[0] = addr(BOB);
        let err = engine
            .initialize(&WiringCall::new(module, addr(OWNER), args), NOW)
            .unwrap_err();
        assert_eq!(err, WiringError::NotAContract { slot: 0, address: addr(BOB).to_hex() });
        assert_eq!(snapshot(&engine, &module), before);
    }

    // ── Properties over every module and slot ─────────────────────────────────

    #[test]
    fn every_slot_rejects_each_invalid_class_without_side_effects() {
        for (i, kind) in ModuleKind::ALL.into_iter().enumerate() {
            let (engine, module, args) = setup(&format!("every_slot_{i}"), kind);
            let before = snapshot(&engine, &module);

            for slot in 0..kind.arity() {
                let mut zeroed = args.clone();
                zeroed[slot] = Address::ZERO;
                let err = engine
                    .initialize(&WiringCall::new(module, addr(OWNER), zeroed), NOW)
                    .unwrap_err();
                assert_eq!(err, WiringError::ZeroAddress { slot }, "{kind} slot {slot}");
                assert_eq!(snapshot(&engine, &module), before, "{kind} slot {slot}");

                let mut eoa = args.clone();
                eoa[slot] = addr(BOB);
                // list_operator accepts plain accounts
                if !kind.slots()[slot].requires_contract() {
                    continue;
                }
                let result = engine.initialize(&WiringCall::new(module, addr(OWNER), eoa), NOW);
                assert_eq!(
                    result.unwrap_err(),
                    WiringError::NotAContract { slot, address: addr(BOB).to_hex() },
                    "{kind} slot {slot}"
                );
                assert_eq!(snapshot(&engine, &module), before, "{kind} slot {slot}");
            }
            assert!(engine.events_for(&module).unwrap().is_empty());
        }
    }

    #[test]
    fn failed_attempts_never_change_state() {
        let (engine, module, args) = setup("atomicity", ModuleKind::BorrowerOperations);
        let before = snapshot(&engine, &module);

        let mut zero_last = args.clone();
        zero_last[8] = Address::ZERO;
        let mut eoa_last = args.clone();
        eoa_last[8] = addr(BOB);

        let attempts = vec![
            WiringCall::new(module, addr(ALICE), args.clone()),
            WiringCall::new(module, addr(OWNER), zero_last),
            WiringCall::new(module, addr(OWNER), eoa_last),
            WiringCall::new(module, addr(OWNER), args[..8].to_vec()),
        ];
        for call in &attempts {
            assert!(engine.initialize(call, NOW).unwrap_err().is_guard_rejection());
            assert_eq!(snapshot(&engine, &module), before);
            assert!(engine.events_for(&module).unwrap().is_empty());
        }

        // The owner can still wire with valid input afterwards.
        engine.initialize(&WiringCall::new(module, addr(OWNER), args), NOW).unwrap();
        assert!(snapshot(&engine, &module).initialized);
    }

    #[test]
    fn lockout_applies_to_any_arguments_and_caller() {
        let (engine, module, args) = setup("lockout", ModuleKind::StabilityPool);
        engine.initialize(&WiringCall::new(module, addr(OWNER), args.clone()), NOW).unwrap();
        let wired = snapshot(&engine, &module);

        let other = peers(&engine, 6);
        let owner_calls = vec![args.clone(), other, vec![Address::ZERO; 6], vec![]];
        for addresses in owner_calls {
            let err = engine
                .initialize(&WiringCall::new(module, addr(OWNER), addresses), NOW)
                .unwrap_err();
            assert_eq!(err, WiringError::AlreadyInitialized(module.to_hex()));
        }

        let err = engine
            .initialize(&WiringCall::new(module, addr(ALICE), args), NOW)
            .unwrap_err();
        assert!(matches!(err, WiringError::Unauthorized { .. }));
        assert_eq!(snapshot(&engine, &module), wired);
    }

    #[test]
    fn success_records_one_event_per_slot() {
        let (engine, module, args) = setup("events", ModuleKind::StabilityPool);
        engine.initialize(&WiringCall::new(module, addr(OWNER), args.clone()), NOW).unwrap();

        let events = engine.events_for(&module).unwrap();
        assert_eq!(events.len(), 6);
        for (i, ev) in events.iter().enumerate() {
            let WiringEvent::AddressChanged { module: m, slot, name, address, at } = ev;
            assert_eq!(*m, module);
            assert_eq!(*slot, i);
            assert_eq!(name, ModuleKind::StabilityPool.slots()[i].name);
            assert_eq!(*address, args[i]);
            assert_eq!(*at, NOW);
        }
    }

    #[test]
    fn racing_initializers_exactly_one_wins() {
        let (engine, module, args) = setup("race", ModuleKind::DefaultPool);
        let engine = Arc::new(engine);
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let barrier = Arc::clone(&barrier);
                let call = WiringCall::new(module, addr(OWNER), args.clone());
                thread::spawn(move || {
                    barrier.wait();
                    engine.initialize(&call, NOW)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        for r in results.iter().filter(|r| r.is_err()) {
            assert_eq!(r.as_ref().unwrap_err(), &WiringError::AlreadyInitialized(module.to_hex()));
        }
        assert_eq!(engine.events_for(&module).unwrap().len(), 2);
    }
}
