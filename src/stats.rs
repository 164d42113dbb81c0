//------------ Diagnostics -----------------------------------------------------
//
// §4.7. A count of heaps allocated per trie level, gathered by walking the
// tree. Adapted from a fixed per-stride-type node count to the
// variable-width heaps here -- there is no static `node_size` to report
// since stride widths are a runtime configuration, not a set of distinct
// Rust types.

use std::fmt::{self, Debug};

use crate::af::AddressFamily;
use crate::heap::{Heap, Slot};

/// Heaps allocated at a single trie level.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CreatedNodes {
    pub level: usize,
    pub stride_len: u8,
    pub count: usize,
}

impl Debug for CreatedNodes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "L{}({}b):{}", self.level, self.stride_len, self.count)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TableStats {
    pub total_routes: usize,
    pub created_nodes: Vec<CreatedNodes>,
}

impl Debug for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} routes across {:?}",
            self.total_routes, self.created_nodes
        )
    }
}

fn walk_count<AF, T>(heap: &Heap<AF, T>, nodes: &mut Vec<CreatedNodes>)
where
    AF: AddressFamily,
{
    match nodes.iter_mut().find(|n| n.level == heap.level) {
        Some(n) => n.count += 1,
        None => nodes.push(CreatedNodes {
            level: heap.level,
            stride_len: heap.stride_len,
            count: 1,
        }),
    }

    for idx in heap.fringe_start()..heap.size() {
        if let Slot::Subtable(sub) = heap.get(idx) {
            walk_count(sub, nodes);
        }
    }
}

pub(crate) fn collect<AF, T>(root: &Heap<AF, T>, total_routes: usize) -> TableStats
where
    AF: AddressFamily,
{
    let mut created_nodes = Vec::new();
    walk_count(root, &mut created_nodes);
    created_nodes.sort_by_key(|n| n.level);
    TableStats {
        total_routes,
        created_nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::af::Ipv4;
    use crate::bits::StridePlan;
    use crate::route::Route;
    use crate::simple::SimpleTrie;

    #[test]
    fn counts_one_node_per_populated_level() {
        let plan = StridePlan::new(&[16, 8, 8], 32).unwrap();
        let mut t: SimpleTrie<Ipv4, u32> = SimpleTrie::new(&plan);
        t.insert(&plan, Route::new(u32::from_be_bytes([10, 0, 0, 0]), 24, 1));
        let stats = collect(&t.root, 1);
        assert_eq!(stats.total_routes, 1);
        assert_eq!(stats.created_nodes.len(), 3);
    }
}
