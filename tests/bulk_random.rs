mod common {
    use std::io::Write;

    pub fn init() {
        let _ = env_logger::builder()
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .is_test(true)
            .try_init();
    }
}

use std::collections::HashMap;

use art_store::{AddressFamily, Ipv4, InsertResult, PrefixAs, Route, Table, TrieKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BATCH: usize = 4_000;
const SAMPLES: usize = 500;

fn random_route(rng: &mut StdRng) -> Route<Ipv4, PrefixAs> {
    let dest: u32 = rng.random();
    let plen: u8 = rng.random_range(0..=32);
    Route::new(dest, plen, PrefixAs(rng.random()))
}

/// Linear-scan reference for `find_longest_match`: the longest-`plen` entry
/// in `model` whose prefix covers `dest`, breaking ties the same way the
/// real trie does (there can only be one entry per `(dest, plen)` key, so
/// no tie-break beyond "longest" is needed).
fn oracle_longest_match(
    model: &HashMap<(u32, u8), PrefixAs>,
    dest: u32,
) -> Option<(u32, u8, PrefixAs)> {
    model
        .iter()
        .filter(|&(&(d, plen), _)| d.matches_prefix(dest, plen))
        .max_by_key(|&(&(_, plen), _)| plen)
        .map(|(&(d, plen), &meta)| (d, plen, meta))
}

fn run_bulk(kind: TrieKind) {
    let mut rng = StdRng::seed_from_u64(0xA77_1234_5678);
    let mut t: Table<Ipv4, PrefixAs> = Table::new(&[16, 8, 8], kind).unwrap();
    let mut model: HashMap<(u32, u8), PrefixAs> = HashMap::new();

    for _ in 0..BATCH {
        let route = random_route(&mut rng);
        let key = (route.masked_dest(), route.plen);
        match t.insert(route) {
            InsertResult::Inserted => {
                model.insert(key, route.meta);
            }
            InsertResult::Duplicate(_) => {
                assert!(model.contains_key(&key));
            }
        }
    }

    assert_eq!(t.len(), model.len());
    for (&(dest, plen), &meta) in &model {
        let found = t.find_exact(dest, plen).expect("route must still be present");
        assert_eq!(found.meta, meta);
    }

    for _ in 0..SAMPLES {
        let sample: u32 = rng.random();
        let expected = oracle_longest_match(&model, sample);
        let found = t.find_longest_match(sample);
        match expected {
            Some((_, plen, meta)) => {
                let found = found.expect("oracle found a covering route but the table did not");
                assert_eq!(found.plen, plen);
                assert_eq!(found.meta, meta);
            }
            None => assert!(found.is_none()),
        }
    }

    let mut keys: Vec<(u32, u8)> = model.keys().copied().collect();
    // Deterministic but distinct order from insertion.
    keys.sort_by_key(|&(dest, plen)| (plen, dest));

    for (dest, plen) in keys {
        let removed = t.delete(dest, plen);
        assert!(removed.is_some());
        model.remove(&(dest, plen));
        assert_eq!(t.len(), model.len());
    }

    assert!(t.is_empty());
    assert!(t.find_longest_match(0xFFFF_FFFF).is_none());
    let stats = t.stats();
    assert_eq!(stats.total_routes, 0);
}

#[test]
fn bulk_insert_then_delete_simple() {
    common::init();
    run_bulk(TrieKind::Simple);
}

#[test]
fn bulk_insert_then_delete_path_compressed() {
    common::init();
    run_bulk(TrieKind::PathCompressed);
}
