//! Fuzz target for identifier parsing.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_resource_key -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use roster_core::{GroupName, ResourceKey};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(key) = ResourceKey::parse(s) {
        // Accepted keys round-trip unchanged.
        let again = ResourceKey::parse(key.as_str()).unwrap();
        assert_eq!(key, again);
        assert!(key.as_str().len() <= 64);
    }

    if let Ok(group) = GroupName::parse(s) {
        assert_eq!(GroupName::parse(group.as_str()).unwrap(), group);
    }
});
