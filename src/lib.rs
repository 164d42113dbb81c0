#![allow(clippy::type_complexity)]

pub use af::{AddressFamily, Ipv4, Ipv6};
pub use route::{
    InsertError, InsertResult, MatchOptions, MatchType, PrefixAs, PrefixError, QueryResult, Route,
};
pub use stats::{CreatedNodes, TableStats};
pub use table::{Table, TrieKind};
pub use iter::WalkOrder;

pub mod af;
pub mod allot;
pub mod bits;
pub mod compressed;
pub mod heap;
pub mod iter;
pub mod route;
pub mod simple;
pub mod stats;
pub mod table;
