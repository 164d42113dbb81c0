//------------ Simple (dense) trie --------------------------------------------
//
// §4.4. One heap per configured stride level, always. A fringe slot either
// holds a route directly or points at the next level's heap; there is no
// notion of skipping levels.

use crate::af::AddressFamily;
use crate::allot::{self, allot};
use crate::bits::{self, StridePlan};
use crate::heap::{Bookkeeping, Heap, Slot};
use crate::route::{InsertResult, Route};

pub struct SimpleTrie<AF, T>
where
    AF: AddressFamily,
{
    pub root: Heap<AF, T>,
}

impl<AF, T> SimpleTrie<AF, T>
where
    AF: AddressFamily,
    T: Clone,
{
    pub fn new(plan: &StridePlan) -> Self {
        Self {
            root: Heap::new(0, plan.stride_len(0), false),
        }
    }

    pub fn insert(&mut self, plan: &StridePlan, route: Route<AF, T>) -> InsertResult<AF, T> {
        let l_star = plan.plen_to_level(route.plen);
        insert_at(&mut self.root, plan, 0, l_star, route)
    }

    pub fn delete(&mut self, plan: &StridePlan, dest: AF, plen: u8) -> Option<Route<AF, T>> {
        let l_target = plan.plen_to_level(plen);
        delete_at(&mut self.root, plan, 0, l_target, dest, plen)
    }

    pub fn find_longest_match(&self, plan: &StridePlan, dest: AF) -> Option<&Route<AF, T>> {
        let mut node = &self.root;
        let mut best: Option<&Route<AF, T>> = node.default_route();
        for level in 0..plan.levels() {
            let sl = plan.stride_len(level);
            let start = plan.start_bit(level);
            let stride_val = bits::extract_stride(dest, start, sl);
            let idx = bits::fringe_index(stride_val, sl) as usize;
            match node.get(idx) {
                Slot::Empty => return best,
                Slot::Route(r) => return Some(r),
                Slot::Subtable(sub) => {
                    if let Some(r) = sub.default_route() {
                        best = Some(r);
                    }
                    node = sub;
                }
            }
        }
        best
    }

    pub fn find_exact(&self, plan: &StridePlan, dest: AF, plen: u8) -> Option<&Route<AF, T>> {
        let l_target = plan.plen_to_level(plen);
        let mut node = &self.root;
        for level in 0..l_target {
            let sl = plan.stride_len(level);
            let start = plan.start_bit(level);
            let stride_val = bits::extract_stride(dest, start, sl);
            let idx = bits::fringe_index(stride_val, sl) as usize;
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

fn insert_at<AF, T>(
    node: &mut Heap<AF, T>,
    plan: &StridePlan,
    level: usize,
    l_star: usize,
    route: Route<AF, T>,
) -> InsertResult<AF, T>
where
    AF: AddressFamily,
    T: Clone,
{
    if level == l_star {
        return slot_insert(node, plan, level, route);
    }

    let sl = plan.stride_len(level);
    let start = plan.start_bit(level);
    let stride_val = bits::extract_stride(route.dest, start, sl);
    let idx = bits::fringe_index(stride_val, sl) as usize;

    match node.get(idx) {
        Slot::Subtable(_) => {}
        Slot::Empty => {
            let child = Heap::new(level + 1, plan.stride_len(level + 1), false);
            node.set(idx, Slot::Subtable(Box::new(child)));
            node.inc_count();
        }
        Slot::Route(_) => {
            let existing = node.set(idx, Slot::Empty);
            let mut child = Heap::new(level + 1, plan.stride_len(level + 1), false);
            if let Slot::Route(r) = existing {
                child.set_default(Slot::Route(r));
            }
            node.set(idx, Slot::Subtable(Box::new(child)));
        }
    }

    let child = match node.get_mut(idx) {
        Slot::Subtable(sub) => sub.as_mut(),
        _ => unreachable!("fringe slot was just promoted to a subtable"),
    };
    insert_at(child, plan, level + 1, l_star, route)
}

fn slot_insert<AF, T>(
    node: &mut Heap<AF, T>,
    plan: &StridePlan,
    level: usize,
    route: Route<AF, T>,
) -> InsertResult<AF, T>
where
    AF: AddressFamily,
    T: Clone,
{
    let sl = plan.stride_len(level);
    let start = plan.start_bit(level);
    let in_stride_len = route.plen - start;
    let stride_val = bits::extract_stride(route.dest, start, sl);
    let idx = bits::base_index_for_stride(stride_val, sl, in_stride_len) as usize;

    if let Some(existing) = allot::current_value(node, idx) {
        if existing == route {
            return InsertResult::Duplicate(route);
        }
    }

    let was_empty = matches!(node.get(idx), Slot::Empty);
    if was_empty {
        node.inc_count();
    }
    allot(node, idx, Some(route));
    InsertResult::Inserted
}

fn delete_at<AF, T>(
    node: &mut Heap<AF, T>,
    plan: &StridePlan,
    level: usize,
    l_target: usize,
    dest: AF,
    plen: u8,
) -> Option<Route<AF, T>>
where
    AF: AddressFamily,
    T: Clone,
{
    if level == l_target {
        return slot_delete(node, plan, level, dest, plen);
    }

    let sl = plan.stride_len(level);
    let start = plan.start_bit(level);
    let stride_val = bits::extract_stride(dest, start, sl);
    let idx = bits::fringe_index(stride_val, sl) as usize;

    let removed = match node.get_mut(idx) {
        Slot::Subtable(sub) => delete_at(sub.as_mut(), plan, level + 1, l_target, dest, plen),
        _ => None,
    };

    if removed.is_some() {
        let collapsible = matches!(
            node.get(idx),
            Slot::Subtable(sub) if matches!(sub.bookkeeping, Bookkeeping::Simple { count: 0 })
        );
        if collapsible {
            if let Slot::Subtable(sub) = node.set(idx, Slot::Empty) {
                let default = sub.default_route().cloned();
                let became_empty = default.is_none();
                node.set(idx, Slot::from_route(default));
                if became_empty {
                    node.dec_count();
                }
            }
        }
    }

    removed
}

fn slot_delete<AF, T>(
    node: &mut Heap<AF, T>,
    plan: &StridePlan,
    level: usize,
    dest: AF,
    plen: u8,
) -> Option<Route<AF, T>>
where
    AF: AddressFamily,
    T: Clone,
{
    let sl = plan.stride_len(level);
    let start = plan.start_bit(level);
    let in_stride_len = plen - start;
    let stride_val = bits::extract_stride(dest, start, sl);
    let idx = bits::base_index_for_stride(stride_val, sl, in_stride_len) as usize;

    let existing = match allot::current_value(node, idx) {
        Some(r) if r.plen == plen && r.masked_dest() == dest.truncate_to_len(plen) => r,
        _ => return None,
    };

    let is_subtable_fringe = matches!(node.get(idx), Slot::Subtable(_));
    let s = allot::parent_value(node, idx);
    allot(node, idx, s.clone());
    if !is_subtable_fringe && s.is_none() {
        node.dec_count();
    }

    Some(existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::af::Ipv4;

    fn plan() -> StridePlan {
        StridePlan::new(&[16, 8, 8], 32).unwrap()
    }

    fn addr(a: u8, b: u8, c: u8, d: u8) -> u32 {
        u32::from_be_bytes([a, b, c, d])
    }

    #[test]
    fn insert_then_longest_match() {
        let p = plan();
        let mut t: SimpleTrie<Ipv4, u32> = SimpleTrie::new(&p);
        t.insert(&p, Route::new(addr(10, 0, 0, 0), 8, 1));
        assert_eq!(
            t.find_longest_match(&p, addr(10, 1, 2, 3)).unwrap().meta,
            1
        );
        assert!(t.find_longest_match(&p, addr(11, 0, 0, 0)).is_none());
    }

    #[test]
    fn more_specific_wins() {
        let p = plan();
        let mut t: SimpleTrie<Ipv4, u32> = SimpleTrie::new(&p);
        t.insert(&p, Route::new(addr(10, 0, 0, 0), 8, 1));
        t.insert(&p, Route::new(addr(10, 0, 0, 0), 16, 2));
        assert_eq!(
            t.find_longest_match(&p, addr(10, 0, 5, 5)).unwrap().meta,
            2
        );
        assert_eq!(
            t.find_longest_match(&p, addr(10, 5, 5, 5)).unwrap().meta,
            1
        );
    }

    #[test]
    fn default_route_and_deletion() {
        let p = plan();
        let mut t: SimpleTrie<Ipv4, u32> = SimpleTrie::new(&p);
        t.insert(&p, Route::new(0, 0, 1));
        assert_eq!(t.find_longest_match(&p, addr(8, 8, 8, 8)).unwrap().meta, 1);
        t.insert(&p, Route::new(addr(8, 0, 0, 0), 8, 2));
        assert_eq!(t.find_longest_match(&p, addr(8, 8, 8, 8)).unwrap().meta, 2);
        let removed = t.delete(&p, addr(8, 0, 0, 0), 8);
        assert_eq!(removed.unwrap().meta, 2);
        assert_eq!(t.find_longest_match(&p, addr(8, 8, 8, 8)).unwrap().meta, 1);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let p = plan();
        let mut t: SimpleTrie<Ipv4, u32> = SimpleTrie::new(&p);
        t.insert(&p, Route::new(addr(10, 0, 0, 0), 8, 1));
        match t.insert(&p, Route::new(addr(10, 0, 0, 0), 8, 2)) {
            InsertResult::Duplicate(r) => assert_eq!(r.meta, 2),
            InsertResult::Inserted => panic!("expected duplicate"),
        }
    }

    #[test]
    fn exact_match_distinguishes_prefix_lengths() {
        let p = plan();
        let mut t: SimpleTrie<Ipv4, u32> = SimpleTrie::new(&p);
        t.insert(&p, Route::new(addr(192, 168, 1, 0), 24, 1));
        t.insert(&p, Route::new(addr(192, 168, 1, 128), 25, 2));
        assert_eq!(
            t.find_exact(&p, addr(192, 168, 1, 0), 24).unwrap().meta,
            1
        );
        assert_eq!(
            t.find_exact(&p, addr(192, 168, 1, 128), 25).unwrap().meta,
            2
        );
        assert!(t.find_exact(&p, addr(192, 168, 1, 128), 24).is_none());
    }

    #[test]
    fn delete_collapses_subtable() {
        let p = plan();
        let mut t: SimpleTrie<Ipv4, u32> = SimpleTrie::new(&p);
        t.insert(&p, Route::new(addr(192, 168, 1, 0), 24, 1));
        assert!(matches!(
            t.root.bookkeeping,
            Bookkeeping::Simple { count } if count > 0
        ));
        let removed = t.delete(&p, addr(192, 168, 1, 0), 24);
        assert!(removed.is_some());
        assert!(t.find_longest_match(&p, addr(192, 168, 1, 1)).is_none());
    }
}
