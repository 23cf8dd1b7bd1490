//! End-to-end tests over the full selection pipeline: RocksDB store,
//! referral cache, ANV lottery, and the proof-of-work gate.
//!
//! The consensus-critical property exercised throughout is bit-identical
//! reproducibility: independently built nodes with the same chain state
//! must select the same ambassador addresses in the same order.

use vine_core::hashing::sha256d;
use vine_core::types::*;
use vine_cuckoo::{find_proof_of_work, verify_proof_of_work};
use vine_pog::select_confirmed_addresses;
use vine_referral::{MemoryReferralStore, ReferralCache, RocksReferralStore};
use vine_tests::helpers::*;

const HEIGHT: u64 = 100;

/// Populate a store with `count` referrals, confirming every even-seeded
/// address and giving each a distinct ANV.
fn populate(store: &RocksReferralStore, count: u8) {
    use vine_core::traits::ReferralStore;
    for seed in 1..=count {
        let r = make_referral(seed, seed.wrapping_sub(1), &format!("member-{seed}"));
        store.insert_referral(&r).unwrap();
        if seed % 2 == 0 {
            store
                .update_confirmation(AddressType::Key, &addr(seed), 50)
                .unwrap();
        }
        store.set_anv(HEIGHT, &make_anv(seed, seed as u64 * 13)).unwrap();
    }
}

fn run_selection(
    store: RocksReferralStore,
    invites: &mut Vec<Address>,
) -> Vec<ConfirmedAddress> {
    let cache = ReferralCache::new(store);
    select_confirmed_addresses(
        &cache,
        cache.store(),
        HEIGHT,
        &sha256d(b"block 100 seed"),
        &addr(0xEE),
        5,
        invites,
        10,
    )
    .unwrap()
}

// ======================================================================
// E2E 1: persistence — selection survives a store reopen unchanged
// ======================================================================

#[test]
fn e2e_selection_is_stable_across_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let store = RocksReferralStore::open(dir.path()).unwrap();
    populate(&store, 20);
    let mut invites_a = Vec::new();
    let first = run_selection(store, &mut invites_a);
    assert!(!first.is_empty());

    // Reopen the same database and reselect: identical output.
    let store = RocksReferralStore::open(dir.path()).unwrap();
    let mut invites_b = Vec::new();
    let second = run_selection(store, &mut invites_b);
    assert_eq!(first, second);
    assert_eq!(invites_a, invites_b);
}

// ======================================================================
// E2E 2: node independence — insertion order does not matter
// ======================================================================

#[test]
fn e2e_independent_nodes_agree() {
    use vine_core::traits::ReferralStore;

    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let store_a = RocksReferralStore::open(dir_a.path()).unwrap();
    let store_b = RocksReferralStore::open(dir_b.path()).unwrap();

    populate(&store_a, 20);
    // Node B receives the same state in reverse order.
    for seed in (1..=20u8).rev() {
        let r = make_referral(seed, seed.wrapping_sub(1), &format!("member-{seed}"));
        store_b.insert_referral(&r).unwrap();
        if seed % 2 == 0 {
            store_b
                .update_confirmation(AddressType::Key, &addr(seed), 50)
                .unwrap();
        }
        store_b.set_anv(HEIGHT, &make_anv(seed, seed as u64 * 13)).unwrap();
    }

    let mut invites_a = Vec::new();
    let mut invites_b = Vec::new();
    assert_eq!(
        run_selection(store_a, &mut invites_a),
        run_selection(store_b, &mut invites_b)
    );
    assert_eq!(invites_a, invites_b);
}

// ======================================================================
// E2E 3: invite lifecycle — unconfirmed winners become selectable after
// confirmation
// ======================================================================

#[test]
fn e2e_invited_addresses_win_after_confirmation() {
    let cache = ReferralCache::new(MemoryReferralStore::new());
    for seed in 1..=6u8 {
        cache
            .insert_referral(&make_referral(seed, 0, &format!("m{seed}")))
            .unwrap();
        cache.store().set_anv(HEIGHT, &make_anv(seed, 100)).unwrap();
    }

    // Round 1: nobody is confirmed, everyone lands in the invite list.
    let seed = sha256d(b"round");
    let mut invites = Vec::new();
    let round1 = select_confirmed_addresses(
        &cache,
        cache.store(),
        HEIGHT,
        &seed,
        &addr(0xEE),
        3,
        &mut invites,
        10,
    )
    .unwrap();
    assert!(round1.is_empty());
    assert_eq!(invites.len(), 6);

    // Confirm the invited addresses and reselect.
    for invited in &invites {
        cache
            .update_confirmation(AddressType::Key, invited, 25)
            .unwrap();
    }
    let mut invites2 = Vec::new();
    let round2 = select_confirmed_addresses(
        &cache,
        cache.store(),
        HEIGHT,
        &seed,
        &addr(0xEE),
        3,
        &mut invites2,
        10,
    )
    .unwrap();
    assert_eq!(round2.len(), 3);
    assert!(invites2.is_empty());
    assert!(round2.iter().all(|c| c.is_confirmed()));
    // Same seed, same snapshot: the winners are the first three of the
    // round-1 draw order.
    assert_eq!(
        round2.iter().map(|c| c.address).collect::<Vec<_>>(),
        invites[..3]
    );
}

// ======================================================================
// E2E 4: block flow — the proof-of-work gate runs before selection
// ======================================================================

#[test]
fn e2e_pow_gate_then_selection() {
    const EDGE_BITS: u8 = 9;
    const PROOF_SIZE: usize = 6;

    // Mine: scan headers until one graph yields a qualifying cycle.
    let (block_hash, cycle) = (0u64..2000)
        .find_map(|nonce| {
            let h = sha256d(&nonce.to_le_bytes());
            find_proof_of_work(&h, u64::MAX, EDGE_BITS, PROOF_SIZE, 2)
                .unwrap()
                .map(|c| (h, c))
        })
        .expect("a cycle within 2000 graphs");

    // Validate: the admission check every node runs on the block.
    verify_proof_of_work(&block_hash, u64::MAX, EDGE_BITS, PROOF_SIZE, &cycle).unwrap();

    // Reward: the admitted block's hash seeds the ambassador lottery.
    let cache = ReferralCache::new(MemoryReferralStore::new());
    for seed in 1..=5u8 {
        cache
            .insert_referral(&make_referral(seed, 0, &format!("w{seed}")))
            .unwrap();
        cache
            .update_confirmation(AddressType::Key, &addr(seed), 10)
            .unwrap();
        cache.store().set_anv(HEIGHT, &make_anv(seed, 1000)).unwrap();
    }
    let mut invites = Vec::new();
    let winners = select_confirmed_addresses(
        &cache,
        cache.store(),
        HEIGHT,
        &block_hash,
        &addr(0xEE),
        2,
        &mut invites,
        10,
    )
    .unwrap();
    assert_eq!(winners.len(), 2);
    assert_ne!(winners[0].address, winners[1].address);
}

// ======================================================================
// E2E 5: alias coherence across the whole stack
// ======================================================================

#[test]
fn e2e_alias_lifecycle_over_rocksdb() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ReferralCache::new(RocksReferralStore::open(dir.path()).unwrap());

    let r = make_referral(7, 0, "  @Grower ");
    cache.insert_referral(&r).unwrap();
    cache
        .update_confirmation(AddressType::Key, &addr(7), 5)
        .unwrap();

    assert!(cache.is_confirmed_alias("GROWER").unwrap());
    assert!(cache.exists_alias("@grower").unwrap());

    // Confirmation lapses: the alias unlinks while the referral record
    // survives under its address.
    cache
        .update_confirmation(AddressType::Key, &addr(7), -5)
        .unwrap();
    assert!(!cache.is_confirmed_alias("grower").unwrap());
    assert!(!cache.exists_alias("grower").unwrap());
    assert!(cache.exists_address(&addr(7)).unwrap());

    // The unlink is durable, not just a cache eviction. The first handle
    // must close before the same path opens again.
    drop(cache);
    let cache = ReferralCache::new(RocksReferralStore::open(dir.path()).unwrap());
    assert_eq!(cache.get_referral_by_alias("grower").unwrap(), None);
    assert!(cache.exists_address(&addr(7)).unwrap());

    // Removal reaches the store and every index.
    assert!(cache.remove_referral(&addr(7)).unwrap());
    drop(cache);
    let reopened = ReferralCache::new(RocksReferralStore::open(dir.path()).unwrap());
    assert!(!reopened.exists_address(&addr(7)).unwrap());
    assert!(!reopened.exists_alias("grower").unwrap());
    assert!(!reopened.exists_hash(&hash(7)).unwrap());
}
