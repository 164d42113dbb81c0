//------------ Path-compressed trie -------------------------------------------
//
// §4.5. Heaps are allocated only where two prefixes actually diverge within
// a stride, or where a prefix terminates — not at every configured level.
// Each heap caches the address bits of the prefix that reaches it so a
// walk can verify a match without visiting the skipped levels explicitly.

use crate::af::{AddressFamily, Zero};
use crate::allot::{self, allot};
use crate::bits::{self, StridePlan};
use crate::heap::{Bookkeeping, Heap, Slot};
use crate::route::{InsertResult, Route};

pub struct CompressedTrie<AF, T>
where
    AF: AddressFamily,
{
    pub root: Heap<AF, T>,
}

impl<AF, T> CompressedTrie<AF, T>
where
    AF: AddressFamily,
    T: Clone,
{
    pub fn new(plan: &StridePlan) -> Self {
        Self {
            root: Heap::new(0, plan.stride_len(0), true),
        }
    }

    pub fn insert(&mut self, plan: &StridePlan, route: Route<AF, T>) -> InsertResult<AF, T> {
        insert_at(&mut self.root, plan, route)
    }

    pub fn delete(&mut self, plan: &StridePlan, dest: AF, plen: u8) -> Option<Route<AF, T>> {
        delete_at(&mut self.root, plan, dest, plen)
    }

    /// §4.5 lookup: walk the skipped-level trie, remembering every
    /// subtable default seen on the way down and falling back to the
    /// deepest one whose cached prefix still matches once a non-subtable
    /// slot is reached.
    pub fn find_longest_match(&self, plan: &StridePlan, dest: AF) -> Option<&Route<AF, T>> {
        let mut node = &self.root;
        let mut defaults: Vec<&Route<AF, T>> = Vec::new();
        if let Some(r) = node.default_route() {
            defaults.push(r);
        }
        loop {
            let idx = fringe_idx_for_route(plan, node.level, dest);
            match node.get(idx) {
                Slot::Empty => break,
                // A fringe slot only reflects bits of this node's own
                // stride; levels path compression skipped to reach here
                // were never checked, so the route still has to cover
                // `dest` over its full `plen` before it can be accepted.
                Slot::Route(r) => {
                    if r.covers(dest) {
                        return Some(r);
                    }
                    break;
                }
                Slot::Subtable(sub) => {
                    if let Some(r) = sub.default_route() {
                        defaults.push(r);
                    }
                    node = sub;
                }
            }
        }
        for r in defaults.into_iter().rev() {
            if r.covers(dest) {
                return Some(r);
            }
        }
        None
    }

    pub fn find_exact(&self, plan: &StridePlan, dest: AF, plen: u8) -> Option<&Route<AF, T>> {
        let l_target = plan.plen_to_level(plen);
        let mut node = &self.root;
        loop {
            if node.level == l_target {
                break;
            }
            let idx = fringe_idx_for_route(plan, node.level, dest);
            match node.get(idx) {
                Slot::Subtable(sub) => node = sub,
                _ => return None,
            }
        }
        let sl = plan.stride_len(l_target);
        let start = plan.start_bit(l_target);
        let in_stride_len = plen - start;
        let stride_val = bits::extract_stride(dest, start, sl);
        let mut idx = bits::base_index_for_stride(stride_val, sl, in_stride_len) as usize;
        loop {
            let route = if node.is_fringe(idx) {
                match node.get(idx) {
                    Slot::Subtable(sub) => sub.default_route(),
                    other => other.as_route(),
                }
            } else {
                node.get(idx).as_route()
            };
            if let Some(r) = route {
                if r.plen == plen && r.masked_dest() == dest.truncate_to_len(plen) {
                    return Some(r);
                }
            }
            if idx <= 1 {
                return None;
            }
            idx >>= 1;
        }
    }
}

fn fringe_idx_for_route<AF: AddressFamily>(plan: &StridePlan, level: usize, dest: AF) -> usize {
    let sl = plan.stride_len(level);
    let start = plan.start_bit(level);
    let stride_val = bits::extract_stride(dest, start, sl);
    bits::fringe_index(stride_val, sl) as usize
}

fn fringe_idx_for_prefix<AF: AddressFamily>(plan: &StridePlan, level: usize, prefix: AF) -> usize {
    fringe_idx_for_route(plan, level, prefix)
}

fn insert_at<AF, T>(node: &mut Heap<AF, T>, plan: &StridePlan, route: Route<AF, T>) -> InsertResult<AF, T>
where
    AF: AddressFamily,
    T: Clone,
{
    let l_star = plan.plen_to_level(route.plen);

    if node.level == l_star {
        return slot_insert_compressed(node, plan, route);
    }
    debug_assert!(node.level < l_star);

    let idx = fringe_idx_for_route(plan, node.level, route.dest);

    match node.get(idx) {
        Slot::Empty => {
            let mut child = new_child(plan, l_star, route.dest);
            let res = slot_insert_compressed(&mut child, plan, route);
            node.set(idx, Slot::Subtable(Box::new(child)));
            node.inc_subtables();
            res
        }
        Slot::Route(_) => {
            let existing = node.set(idx, Slot::Empty);
            let mut child = new_child(plan, l_star, route.dest);
            if let Slot::Route(r) = existing {
                set_default_with_accounting(plan, &mut child, r);
            }
            let res = slot_insert_compressed(&mut child, plan, route);
            node.set(idx, Slot::Subtable(Box::new(child)));
            node.inc_subtables();
            res
        }
        Slot::Subtable(_) => {
            let (child_level, child_prefix, child_len) = match node.get(idx) {
                Slot::Subtable(sub) => (
                    sub.level,
                    sub.prefix_cache.map(|(p, _)| p).unwrap_or_else(AF::zero),
                    sub.prefix_cache.map(|(_, l)| l).unwrap_or(0),
                ),
                _ => unreachable!(),
            };
            let cmp_len = child_len.min(plan.start_bit(l_star));

            if child_prefix.matches_prefix(route.dest, cmp_len) {
                if l_star >= child_level {
                    let child = match node.get_mut(idx) {
                        Slot::Subtable(sub) => sub.as_mut(),
                        _ => unreachable!(),
                    };
                    insert_at(child, plan, route)
                } else {
                    let old = match node.set(idx, Slot::Empty) {
                        Slot::Subtable(b) => b,
                        _ => unreachable!(),
                    };
                    let mut nst = interpose(plan, l_star, child_prefix, old);
                    let res = slot_insert_compressed(&mut nst, plan, route);
                    node.set(idx, Slot::Subtable(Box::new(nst)));
                    res
                }
            } else {
                let max_level = child_level.min(l_star);
                let nl = bits::first_diff_level(plan, child_prefix, route.dest, max_level);
                let old = match node.set(idx, Slot::Empty) {
                    Slot::Subtable(b) => b,
                    _ => unreachable!(),
                };
                let mut nst = interpose(plan, nl, child_prefix, old);
                let res = if nl == l_star {
                    slot_insert_compressed(&mut nst, plan, route)
                } else {
                    let mut fresh = new_child(plan, l_star, route.dest);
                    let r = slot_insert_compressed(&mut fresh, plan, route);
                    let fidx = fringe_idx_for_prefix(plan, nl, route.dest);
                    nst.set(fidx, Slot::Subtable(Box::new(fresh)));
                    nst.inc_subtables();
                    r
                };
                node.set(idx, Slot::Subtable(Box::new(nst)));
                res
            }
        }
    }
}

fn new_child<AF, T>(plan: &StridePlan, level: usize, prefix_source: AF) -> Heap<AF, T>
where
    AF: AddressFamily,
    T: Clone,
{
    let mut child = Heap::new(level, plan.stride_len(level), true);
    let cache_len = plan.start_bit(level);
    child.prefix_cache = Some((prefix_source.truncate_to_len(cache_len), cache_len));
    child
}

/// Move `r` into `node`'s default slot, bumping `node`'s native route
/// count only if `r`'s native home is exactly `node` (i.e. `r.plen`
/// coincides with the node's starting boundary, not a shorter route
/// merely passing its coverage down).
fn set_default_with_accounting<AF, T>(plan: &StridePlan, node: &mut Heap<AF, T>, r: Route<AF, T>)
where
    AF: AddressFamily,
    T: Clone,
{
    let is_native = r.plen == plan.start_bit(node.level);
    node.set_default(Slot::Route(r));
    if is_native {
        node.inc_routes();
    }
}

/// Interpose a new heap at level `nl`, hanging the already-allocated
/// `displaced` child off it and moving `displaced`'s own default up (its
/// coverage now applies above the point where `displaced` starts).
fn interpose<AF, T>(
    plan: &StridePlan,
    nl: usize,
    displaced_prefix: AF,
    mut displaced: Box<Heap<AF, T>>,
) -> Heap<AF, T>
where
    AF: AddressFamily,
    T: Clone,
{
    let mut nst = new_child(plan, nl, displaced_prefix);

    let moved = displaced.set_default(Slot::Empty);
    if let Slot::Route(r) = moved {
        set_default_with_accounting(plan, &mut nst, r);
    }

    let idx = fringe_idx_for_prefix(plan, nl, displaced_prefix);
    nst.set(idx, Slot::Subtable(displaced));
    nst.inc_subtables();
    nst
}

fn slot_insert_compressed<AF, T>(
    node: &mut Heap<AF, T>,
    plan: &StridePlan,
    route: Route<AF, T>,
) -> InsertResult<AF, T>
where
    AF: AddressFamily,
    T: Clone,
{
    let sl = plan.stride_len(node.level);
    let start = plan.start_bit(node.level);
    let in_stride_len = route.plen - start;
    let stride_val = bits::extract_stride(route.dest, start, sl);
    let idx = bits::base_index_for_stride(stride_val, sl, in_stride_len) as usize;

    if let Some(existing) = allot::current_value(node, idx) {
        if existing == route {
            return InsertResult::Duplicate(route);
        }
    }

    let is_subtable_fringe = matches!(node.get(idx), Slot::Subtable(_));
    allot(node, idx, Some(route));

    if is_subtable_fringe {
        if let Slot::Subtable(sub) = node.get_mut(idx) {
            sub.inc_routes();
        }
    } else {
        node.inc_routes();
    }

    InsertResult::Inserted
}

fn delete_at<AF, T>(node: &mut Heap<AF, T>, plan: &StridePlan, dest: AF, plen: u8) -> Option<Route<AF, T>>
where
    AF: AddressFamily,
    T: Clone,
{
    let l_target = plan.plen_to_level(plen);
    if node.level == l_target {
        return slot_delete_compressed(node, plan, dest, plen);
    }
    if node.level > l_target {
        return None;
    }

    let idx = fringe_idx_for_route(plan, node.level, dest);
    let removed = match node.get_mut(idx) {
        Slot::Subtable(sub) => {
            if sub
                .prefix_cache
                .map(|(p, l)| p.matches_prefix(dest, l))
                .unwrap_or(true)
            {
                delete_at(sub.as_mut(), plan, dest, plen)
            } else {
                None
            }
        }
        _ => None,
    };

    if removed.is_some() {
        let should_collapse = matches!(
            node.get(idx),
            Slot::Subtable(sub) if sub.bookkeeping.is_collapsible()
        );
        if should_collapse {
            collapse_child(plan, node, idx);
        }
    }

    removed
}

fn slot_delete_compressed<AF, T>(
    node: &mut Heap<AF, T>,
    plan: &StridePlan,
    dest: AF,
    plen: u8,
) -> Option<Route<AF, T>>
where
    AF: AddressFamily,
    T: Clone,
{
    let sl = plan.stride_len(node.level);
    let start = plan.start_bit(node.level);
    let in_stride_len = plen - start;
    let stride_val = bits::extract_stride(dest, start, sl);
    let idx = bits::base_index_for_stride(stride_val, sl, in_stride_len) as usize;

    let existing = match allot::current_value(node, idx) {
        Some(r) if r.plen == plen && r.masked_dest() == dest.truncate_to_len(plen) => r,
        _ => return None,
    };

    let is_subtable_fringe = matches!(node.get(idx), Slot::Subtable(_));
    let s = allot::parent_value(node, idx);
    allot(node, idx, s);

    if is_subtable_fringe {
        if let Slot::Subtable(sub) = node.get_mut(idx) {
            sub.dec_routes();
        }
    } else {
        node.dec_routes();
    }

    Some(existing)
}

fn find_sole_subtable_idx<AF, T>(heap: &Heap<AF, T>) -> usize
where
    AF: AddressFamily,
{
    for idx in heap.fringe_start()..heap.size() {
        if matches!(heap.get(idx), Slot::Subtable(_)) {
            return idx;
        }
    }
    unreachable!("caller verified n_subtables == 1")
}

/// §4.5 collapse: `node`'s child at `idx` has no native routes left and at
/// most one remaining subtable of its own.
fn collapse_child<AF, T>(plan: &StridePlan, node: &mut Heap<AF, T>, idx: usize)
where
    AF: AddressFamily,
    T: Clone,
{
    let mut child = match node.set(idx, Slot::Empty) {
        Slot::Subtable(b) => b,
        other => {
            node.set(idx, other);
            return;
        }
    };

    match child.bookkeeping {
        Bookkeeping::Compressed {
            n_subtables: 1, ..
        } => {
            let sole_idx = find_sole_subtable_idx(&child);
            let moved_default = child.set_default(Slot::Empty);
            let mut grandchild = match child.set(sole_idx, Slot::Empty) {
                Slot::Subtable(b) => b,
                _ => unreachable!(),
            };
            if let Slot::Route(r) = moved_default {
                set_default_with_accounting(plan, &mut grandchild, r);
            }
            node.set(idx, Slot::Subtable(grandchild));
        }
        _ => {
            let default = child.default_route().cloned();
            node.set(idx, Slot::from_route(default));
            node.dec_subtables();
        }
    }
}
