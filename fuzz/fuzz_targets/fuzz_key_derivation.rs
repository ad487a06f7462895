//! Fuzz target for key derivation.
//!
//! Feeds arbitrary names through the key deriver and checks that every
//! derived key is a valid, case-insensitively unique user name.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_key_derivation -- -max_total_time=600

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use roster_core::ResourceKey;
use roster_provisioning::{FirstDotLast, Identity, KeyDeriver};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Arbitrary, Debug)]
struct Person {
    first_name: String,
    last_name: String,
}

#[derive(Arbitrary, Debug)]
struct DerivationInput {
    people: Vec<Person>,
    dotted: bool,
}

fuzz_target!(|input: DerivationInput| {
    if input.people.len() > 256 {
        return;
    }

    let identities: Vec<Identity> = input
        .people
        .into_iter()
        .enumerate()
        .map(|(i, p)| Identity {
            line: i + 2,
            first_name: p.first_name,
            last_name: p.last_name,
            department: "Sales".to_string(),
            job_title: "Salesman".to_string(),
        })
        .collect();
    let total = identities.len();

    let deriver = if input.dotted {
        KeyDeriver::new(Arc::new(FirstDotLast))
    } else {
        KeyDeriver::default()
    };
    let derived = deriver.derive(identities);
    assert_eq!(derived.keyed.len() + derived.errors.len(), total);

    let mut seen = HashSet::new();
    for keyed in &derived.keyed {
        assert!(ResourceKey::parse(keyed.key.as_str()).is_ok());
        assert!(seen.insert(keyed.key.as_str().to_lowercase()));
    }
});
