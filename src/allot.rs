//------------ Allotment engine -----------------------------------------------
//
// §4.3. `allot` writes a replacement route at base index `k` and pushes it
// further down the subtree rooted at `k` wherever a descendant slot still
// carries the value it displaced. Both insert and delete are one call to
// this function (§4.4, §4.5): insert replaces whatever currently covers
// `k` with the new route; delete replaces the removed route with whatever
// covers its parent. The "current covering value at k" is read inside the
// function rather than passed in, so both call sites just say what they
// want written.
//
// Crossing into a child subtable (a fringe slot tagged `Subtable`) means
// continuing the same propagation at the child's own index 1 rather than
// stopping at its default — otherwise a deeper slot in the child that
// explicitly copied the old default would go stale. The recursion depth
// within one heap is bounded by the configured stride width (`<= 24`), so
// plain recursion is used rather than an explicit stack (see the design
// notes on non-recursive allotment).

use crate::af::AddressFamily;
use crate::heap::{Heap, Slot};
use crate::route::Route;

fn route_eq<AF, T>(a: Option<&Route<AF, T>>, b: Option<&Route<AF, T>>) -> bool
where
    AF: AddressFamily,
{
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn to_slot<AF, T>(route: Option<Route<AF, T>>) -> Slot<AF, T>
where
    AF: AddressFamily,
{
    Slot::from_route(route)
}

/// The route currently in effect at index `k`: for a fringe slot holding a
/// subtable pointer this is the child's own default (`heap[1]`), otherwise
/// it's whatever the slot itself holds.
pub(crate) fn current_value<AF, T>(heap: &Heap<AF, T>, k: usize) -> Option<Route<AF, T>>
where
    AF: AddressFamily,
    T: Clone,
{
    if heap.is_fringe(k) {
        if let Slot::Subtable(sub) = heap.get(k) {
            return sub.default_route().cloned();
        }
    }
    heap.get(k).as_route().cloned()
}

fn write_value<AF, T>(heap: &mut Heap<AF, T>, k: usize, s: Option<Route<AF, T>>)
where
    AF: AddressFamily,
    T: Clone,
{
    if heap.is_fringe(k) {
        if let Slot::Subtable(sub) = heap.get_mut(k) {
            sub.set_default(to_slot(s));
            return;
        }
    }
    heap.set(k, to_slot(s));
}

/// Write `s` at base index `k`, displacing whatever currently covers `k`
/// and pushing `s` into any descendant that held that same displaced
/// value.
pub fn allot<AF, T>(heap: &mut Heap<AF, T>, k: usize, s: Option<Route<AF, T>>)
where
    AF: AddressFamily,
    T: Clone,
{
    let r = current_value(heap, k);
    write_value(heap, k, s.clone());

    if heap.is_fringe(k) {
        if let Slot::Subtable(sub) = heap.get_mut(k) {
            propagate(sub, 1, r.as_ref(), s.as_ref());
        }
        return;
    }
    propagate(heap, k, r.as_ref(), s.as_ref());
}

fn propagate<AF, T>(
    heap: &mut Heap<AF, T>,
    idx: usize,
    r: Option<&Route<AF, T>>,
    s: Option<&Route<AF, T>>,
) where
    AF: AddressFamily,
    T: Clone,
{
    let size = heap.size();
    for child in [2 * idx, 2 * idx + 1] {
        if child >= size {
            continue;
        }
        if heap.is_fringe(child) {
            match heap.get_mut(child) {
                Slot::Subtable(sub) => {
                    if route_eq(sub.default_route(), r) {
                        sub.set_default(to_slot(s.cloned()));
                        propagate(sub, 1, r, s);
                    }
                }
                other => {
                    if route_eq(other.as_route(), r) {
                        *other = to_slot(s.cloned());
                    }
                }
            }
        } else {
            let matches = route_eq(heap.get(child).as_route(), r);
            if matches {
                heap.set(child, to_slot(s.cloned()));
                propagate(heap, child, r, s);
            }
        }
    }
}

/// The value that would become the new covering route for `k` if `k`
/// itself were removed: the current value of `k`'s parent, or `None` if
/// `k` is the node's own default slot (index 1, no parent within this
/// heap).
pub fn parent_value<AF, T>(heap: &Heap<AF, T>, k: usize) -> Option<Route<AF, T>>
where
    AF: AddressFamily,
    T: Clone,
{
    if k > 1 {
        heap.get(k >> 1).as_route().cloned()
    } else {
        None
    }
}
