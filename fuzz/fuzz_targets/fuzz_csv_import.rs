//! Fuzz target for CSV import.
//!
//! Arbitrary bytes must never panic the reader or the engine's derivation
//! step; every data row is either a record or a row error.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_csv_import -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use roster_import::{read_records, ImportConfig};
use roster_provisioning::{ProvisioningConfig, ProvisioningEngine};

fuzz_target!(|data: &[u8]| {
    let config = ImportConfig::new().with_max_rows(1_000);
    let Ok(imported) = read_records(data, &config) else {
        return;
    };
    assert_eq!(
        imported.records.len() + imported.errors.len(),
        imported.total_rows
    );

    let Ok(engine) = ProvisioningEngine::new(ProvisioningConfig::default()) else {
        return;
    };
    if let Ok(derivation) = engine.derive(imported.records) {
        assert!(derivation.desired.users.len() <= imported.total_rows);
    }
});
