//------------ Full-table traversal -------------------------------------------
//
// §4.6. A walk visits every *stored* route exactly once: a slot is only
// reported when its value differs from whatever its parent slot covers,
// which is exactly the allotment invariant read backwards. Crossing into a
// child subtable continues at the child's own index 1, the same boundary
// `allot` itself crosses.

use std::collections::VecDeque;

use crate::af::AddressFamily;
use crate::heap::{Heap, Slot};
use crate::route::Route;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOrder {
    DepthFirst,
    BreadthFirst,
}

fn route_eq_opt<AF, T>(a: Option<&Route<AF, T>>, b: Option<&Route<AF, T>>) -> bool
where
    AF: AddressFamily,
{
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn collect_df<'a, AF, T>(
    heap: &'a Heap<AF, T>,
    idx: usize,
    parent: Option<&'a Route<AF, T>>,
    out: &mut Vec<&'a Route<AF, T>>,
) where
    AF: AddressFamily,
{
    if heap.is_fringe(idx) {
        match heap.get(idx) {
            Slot::Empty => {}
            Slot::Route(r) => {
                if !route_eq_opt(Some(r), parent) {
                    out.push(r);
                }
            }
            Slot::Subtable(sub) => {
                let child_default = sub.default_route();
                if !route_eq_opt(child_default, parent) {
                    if let Some(r) = child_default {
                        out.push(r);
                    }
                }
                collect_df(sub, 1, child_default, out);
            }
        }
        return;
    }

    match heap.get(idx) {
        Slot::Route(r) => {
            if !route_eq_opt(Some(r), parent) {
                out.push(r);
            }
            for child in [2 * idx, 2 * idx + 1] {
                if child < heap.size() {
                    collect_df(heap, child, Some(r), out);
                }
            }
        }
        Slot::Empty => {
            for child in [2 * idx, 2 * idx + 1] {
                if child < heap.size() {
                    collect_df(heap, child, parent, out);
                }
            }
        }
        Slot::Subtable(_) => unreachable!("only fringe slots hold a subtable"),
    }
}

fn collect_bf<'a, AF, T>(heap: &'a Heap<AF, T>, out: &mut Vec<&'a Route<AF, T>>)
where
    AF: AddressFamily,
{
    let mut queue: VecDeque<(&'a Heap<AF, T>, usize, Option<&'a Route<AF, T>>)> = VecDeque::new();
    queue.push_back((heap, 1, None));

    while let Some((h, idx, parent)) = queue.pop_front() {
        if h.is_fringe(idx) {
            match h.get(idx) {
                Slot::Empty => {}
                Slot::Route(r) => {
                    if !route_eq_opt(Some(r), parent) {
                        out.push(r);
                    }
                }
                Slot::Subtable(sub) => {
                    let child_default = sub.default_route();
                    if !route_eq_opt(child_default, parent) {
                        if let Some(r) = child_default {
                            out.push(r);
                        }
                    }
                    queue.push_back((sub, 1, child_default));
                }
            }
            continue;
        }

        match h.get(idx) {
            Slot::Route(r) => {
                if !route_eq_opt(Some(r), parent) {
                    out.push(r);
                }
                for child in [2 * idx, 2 * idx + 1] {
                    if child < h.size() {
                        queue.push_back((h, child, Some(r)));
                    }
                }
            }
            Slot::Empty => {
                for child in [2 * idx, 2 * idx + 1] {
                    if child < h.size() {
                        queue.push_back((h, child, parent));
                    }
                }
            }
            Slot::Subtable(_) => unreachable!("only fringe slots hold a subtable"),
        }
    }
}

/// Visit every stored route in `root` exactly once. Works the same way for
/// both trie shapes: a dense heap is just a compressed one where every
/// fringe slot happens to point at a child (§4.4 vs §4.5 share this walk).
pub fn walk_heap<'a, AF, T>(
    root: &'a Heap<AF, T>,
    order: WalkOrder,
    mut callback: impl FnMut(&'a Route<AF, T>),
) where
    AF: AddressFamily,
{
    let mut out = Vec::new();
    match order {
        WalkOrder::DepthFirst => collect_df(root, 1, None, &mut out),
        WalkOrder::BreadthFirst => collect_bf(root, &mut out),
    }
    for r in out {
        callback(r);
    }
}

/// Less-specifics of `(dest, plen)`: every shorter prefix length that
/// covers `dest` and actually has a stored route, longest first.
pub fn less_specifics<'a, AF, T>(
    table: &'a Table<AF, T>,
    dest: AF,
    plen: u8,
) -> Vec<&'a Route<AF, T>>
where
    AF: AddressFamily,
    T: Clone,
{
    let mut out = Vec::new();
    for p in (0..plen).rev() {
        if let Some(r) = table.find_exact(dest, p) {
            out.push(r);
        }
    }
    out
}

/// More-specifics of `(dest, plen)`: every stored route strictly longer
/// than `plen` whose destination falls under it.
pub fn more_specifics<'a, AF, T>(
    table: &'a Table<AF, T>,
    dest: AF,
    plen: u8,
) -> Vec<&'a Route<AF, T>>
where
    AF: AddressFamily,
    T: Clone,
{
    let mut out = Vec::new();
    table.walk(WalkOrder::DepthFirst, |r| {
        if r.plen > plen && dest.matches_prefix(r.dest, plen) {
            out.push(r);
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::af::Ipv4;
    use crate::bits::StridePlan;
    use crate::simple::SimpleTrie;
    use crate::table::{Table, TrieKind};

    fn addr(a: u8, b: u8, c: u8, d: u8) -> u32 {
        u32::from_be_bytes([a, b, c, d])
    }

    #[test]
    fn walk_visits_each_route_once() {
        let plan = StridePlan::new(&[16, 8, 8], 32).unwrap();
        let mut t: SimpleTrie<Ipv4, u32> = SimpleTrie::new(&plan);
        t.insert(&plan, Route::new(addr(10, 0, 0, 0), 8, 1));
        t.insert(&plan, Route::new(addr(10, 0, 0, 0), 16, 2));
        t.insert(&plan, Route::new(addr(192, 168, 0, 0), 16, 3));

        let mut seen = Vec::new();
        walk_heap(&t.root, WalkOrder::DepthFirst, |r| seen.push(r.meta));
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn less_and_more_specifics() {
        let mut t: Table<Ipv4, u32> = Table::new(&[16, 8, 8], TrieKind::Simple).unwrap();
        t.insert(Route::new(addr(10, 0, 0, 0), 8, 1));
        t.insert(Route::new(addr(10, 0, 0, 0), 16, 2));
        t.insert(Route::new(addr(10, 0, 1, 0), 24, 3));

        let less = less_specifics(&t, addr(10, 0, 1, 0), 24);
        assert_eq!(less.iter().map(|r| r.meta).collect::<Vec<_>>(), vec![2, 1]);

        let more = more_specifics(&t, addr(10, 0, 0, 0), 8);
        let mut metas: Vec<_> = more.iter().map(|r| r.meta).collect();
        metas.sort();
        assert_eq!(metas, vec![2, 3]);
    }
}
