//------------ Table: the public entry point ----------------------------------
//
// §6 external interface and §2c construction/configuration. `Table` owns
// the stride plan and dispatches every call to whichever trie shape it was
// built with (§9 design note: a variant enum rather than stored function
// pointers).

use log::{debug, trace};

use crate::af::AddressFamily;
use crate::bits::StridePlan;
use crate::compressed::CompressedTrie;
use crate::iter::{self, WalkOrder};
use crate::route::{InsertResult, MatchOptions, MatchType, PrefixError, QueryResult, Route};
use crate::simple::SimpleTrie;
use crate::stats::{self, TableStats};

/// Which trie shape a `Table` was built with (§4.4 vs §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrieKind {
    Simple,
    PathCompressed,
}

enum Trie<AF, T>
where
    AF: AddressFamily,
{
    Simple(SimpleTrie<AF, T>),
    PathCompressed(CompressedTrie<AF, T>),
}

pub struct Table<AF, T>
where
    AF: AddressFamily,
{
    plan: StridePlan,
    trie: Trie<AF, T>,
    kind: TrieKind,
    n_routes: usize,
}

impl<AF, T> Table<AF, T>
where
    AF: AddressFamily,
    T: Clone,
{
    /// The whole configuration surface (§2c): a stride plan summing to
    /// `AF::BITS` and a choice of trie shape. Validation happens once,
    /// here; no later operation recomputes the per-level bit widths.
    pub fn new(strides: &[u8], kind: TrieKind) -> Result<Self, PrefixError> {
        let plan = StridePlan::new(strides, AF::BITS)?;
        debug!(
            "building {:?} table with {} stride levels over {} bits",
            kind,
            plan.levels(),
            AF::BITS
        );
        let trie = match kind {
            TrieKind::Simple => Trie::Simple(SimpleTrie::new(&plan)),
            TrieKind::PathCompressed => Trie::PathCompressed(CompressedTrie::new(&plan)),
        };
        Ok(Self {
            plan,
            trie,
            kind,
            n_routes: 0,
        })
    }

    pub fn kind(&self) -> TrieKind {
        self.kind
    }

    pub fn insert(&mut self, route: Route<AF, T>) -> InsertResult<AF, T> {
        trace!(
            "insert {}/{}",
            AF::fmt_net(route.dest),
            route.plen
        );
        let result = match &mut self.trie {
            Trie::Simple(t) => t.insert(&self.plan, route),
            Trie::PathCompressed(t) => t.insert(&self.plan, route),
        };
        if let InsertResult::Inserted = result {
            self.n_routes += 1;
        }
        result
    }

    pub fn delete(&mut self, dest: AF, plen: u8) -> Option<Route<AF, T>> {
        trace!("delete {}/{}", AF::fmt_net(dest), plen);
        let removed = match &mut self.trie {
            Trie::Simple(t) => t.delete(&self.plan, dest, plen),
            Trie::PathCompressed(t) => t.delete(&self.plan, dest, plen),
        };
        if removed.is_some() {
            self.n_routes -= 1;
        }
        removed
    }

    pub fn find_longest_match(&self, dest: AF) -> Option<&Route<AF, T>> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("longest-match lookup for {}", AF::fmt_net(dest));
        }
        match &self.trie {
            Trie::Simple(t) => t.find_longest_match(&self.plan, dest),
            Trie::PathCompressed(t) => t.find_longest_match(&self.plan, dest),
        }
    }

    /// Exact match only: `None` when the requested `(dest, plen)` was
    /// never inserted, even if a shorter covering route exists.
    pub fn find_exact(&self, dest: AF, plen: u8) -> Option<&Route<AF, T>> {
        match &self.trie {
            Trie::Simple(t) => t.find_exact(&self.plan, dest, plen),
            Trie::PathCompressed(t) => t.find_exact(&self.plan, dest, plen),
        }
    }

    /// Exact match falling back to the table-wide default route, matching
    /// the historical behavior noted in the design notes' resolution of
    /// the exact-match-on-miss open question.
    pub fn find_exact_or_default(&self, dest: AF, plen: u8) -> Option<&Route<AF, T>> {
        self.find_exact(dest, plen).or_else(|| self.default_route())
    }

    pub fn default_route(&self) -> Option<&Route<AF, T>> {
        match &self.trie {
            Trie::Simple(t) => t.root.default_route(),
            Trie::PathCompressed(t) => t.root.default_route(),
        }
    }

    /// Convenience query combining exact/longest match with the
    /// less/more-specifics collection `MatchOptions` asks for.
    pub fn match_prefix(&self, dest: AF, plen: u8, options: &MatchOptions) -> QueryResult<'_, AF, T> {
        let route = match options.match_type {
            MatchType::ExactMatch => self.find_exact(dest, plen),
            MatchType::LongestMatch => self.find_longest_match(dest),
            MatchType::EmptyMatch => None,
        };
        let match_type = if route.is_some() {
            options.match_type
        } else {
            MatchType::EmptyMatch
        };

        let less_specifics = if options.include_less_specifics {
            iter::less_specifics(self, dest, plen)
        } else {
            Vec::new()
        };
        let more_specifics = if options.include_more_specifics {
            iter::more_specifics(self, dest, plen)
        } else {
            Vec::new()
        };

        QueryResult {
            match_type,
            route,
            less_specifics,
            more_specifics,
        }
    }

    pub fn len(&self) -> usize {
        self.n_routes
    }

    pub fn is_empty(&self) -> bool {
        self.n_routes == 0
    }

    pub fn plan(&self) -> &StridePlan {
        &self.plan
    }

    /// Per-level heap counts and total route count, for diagnostics only
    /// (§4.7): never consulted by insert/delete/lookup.
    pub fn stats(&self) -> TableStats {
        match &self.trie {
            Trie::Simple(t) => stats::collect(&t.root, self.n_routes),
            Trie::PathCompressed(t) => stats::collect(&t.root, self.n_routes),
        }
    }

    /// Visit every stored route exactly once (§4.6).
    pub fn walk<'s>(&'s self, order: WalkOrder, callback: impl FnMut(&'s Route<AF, T>)) {
        match &self.trie {
            Trie::Simple(t) => iter::walk_heap(&t.root, order, callback),
            Trie::PathCompressed(t) => iter::walk_heap(&t.root, order, callback),
        }
    }

    /// Two-pass delete-everything (§4.6): collect keys first so the
    /// path-compressed collapse on delete can't invalidate an in-flight
    /// walk.
    pub fn flush(&mut self) {
        debug!("flushing table ({} routes)", self.n_routes);
        let mut keys = Vec::with_capacity(self.n_routes);
        self.walk(WalkOrder::DepthFirst, |r| keys.push((r.dest, r.plen)));
        for (dest, plen) in keys {
            self.delete(dest, plen);
        }
    }

    /// Tear the whole table down. Structural in this port: dropping `self`
    /// already frees every heap, so this is `flush` plus the drop.
    pub fn destroy(mut self) {
        self.flush();
    }
}
