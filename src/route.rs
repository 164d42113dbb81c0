//------------ Route and match types -----------------------------------------

use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Debug, Display};

use crate::af::AddressFamily;

/// A stored route: a `(dest, plen)` key plus an opaque payload.
///
/// Identity is the masked `dest` together with `plen` (§3 in the design
/// notes) — the bits of `dest` beyond `plen` are carried verbatim but never
/// consulted by `Eq`/`Ord`/lookup.
#[derive(Clone, Copy)]
pub struct Route<AF, T>
where
    AF: AddressFamily,
{
    pub dest: AF,
    pub plen: u8,
    pub meta: T,
}

impl<AF, T> Route<AF, T>
where
    AF: AddressFamily,
{
    pub fn new(dest: AF, plen: u8, meta: T) -> Self {
        Self { dest, plen, meta }
    }

    /// The masked destination: `dest` with bits beyond `plen` cleared.
    pub fn masked_dest(&self) -> AF {
        self.dest.truncate_to_len(self.plen)
    }

    pub fn covers(&self, addr: AF) -> bool {
        self.dest.matches_prefix(addr, self.plen)
    }
}

impl<AF, T> PartialEq for Route<AF, T>
where
    AF: AddressFamily,
{
    fn eq(&self, other: &Self) -> bool {
        self.plen == other.plen && self.masked_dest() == other.masked_dest()
    }
}

impl<AF, T> Eq for Route<AF, T> where AF: AddressFamily {}

impl<AF, T> PartialOrd for Route<AF, T>
where
    AF: AddressFamily,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<AF, T> Ord for Route<AF, T>
where
    AF: AddressFamily,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.masked_dest()
            .cmp(&other.masked_dest())
            .then(self.plen.cmp(&other.plen))
    }
}

impl<AF, T> Debug for Route<AF, T>
where
    AF: AddressFamily,
    T: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} with {:?}",
            AddressFamily::fmt_net(self.dest),
            self.plen,
            self.meta
        )
    }
}

impl<AF, T> Display for Route<AF, T>
where
    AF: AddressFamily,
    T: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", AddressFamily::fmt_net(self.dest), self.plen, self.meta)
    }
}

//------------ MatchType / MatchOptions --------------------------------------

/// Kind of match a lookup is allowed to settle for, mirroring the
/// exact/longest/empty distinction the ecosystem uses at its query boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    ExactMatch,
    LongestMatch,
    EmptyMatch,
}

impl Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MatchType::ExactMatch => write!(f, "exact-match"),
            MatchType::LongestMatch => write!(f, "longest-match"),
            MatchType::EmptyMatch => write!(f, "empty-match"),
        }
    }
}

pub struct MatchOptions {
    pub match_type: MatchType,
    pub include_less_specifics: bool,
    pub include_more_specifics: bool,
}

/// Outcome of a lookup, carrying the match type actually achieved alongside
/// whatever less/more-specifics were requested.
#[derive(Debug)]
pub struct QueryResult<'a, AF, T>
where
    AF: AddressFamily,
{
    pub match_type: MatchType,
    pub route: Option<&'a Route<AF, T>>,
    pub less_specifics: Vec<&'a Route<AF, T>>,
    pub more_specifics: Vec<&'a Route<AF, T>>,
}

//------------ InsertResult / errors -----------------------------------------

/// Result of `Table::insert`. A duplicate prefix is not an error (§7): the
/// caller gets their rejected route handed back so they can decide what to
/// do with it.
#[derive(Debug)]
pub enum InsertResult<AF, T>
where
    AF: AddressFamily,
{
    Inserted,
    Duplicate(Route<AF, T>),
}

/// Errors returned by `Table::new` for a malformed stride plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixError {
    /// `Σ strides != A`.
    StrideSumMismatch { sum: u16, expected: u8 },
    /// A stride of zero bits was configured.
    ZeroStride { level: usize },
    /// A stride wider than 24 bits was configured.
    StrideTooWide { level: usize, stride: u8 },
}

impl Display for PrefixError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrefixError::StrideSumMismatch { sum, expected } => write!(
                f,
                "stride plan sums to {} bits, expected {}",
                sum, expected
            ),
            PrefixError::ZeroStride { level } => {
                write!(f, "stride at level {} is zero bits wide", level)
            }
            PrefixError::StrideTooWide { level, stride } => write!(
                f,
                "stride at level {} is {} bits wide, max is 24",
                level, stride
            ),
        }
    }
}

impl std::error::Error for PrefixError {}

/// Errors returned by `Table::insert`.
///
/// `Allocation` is not reachable through the default global allocator (it
/// aborts the process rather than returning), it exists so a caller that
/// swaps in a fallible-allocation path has somewhere to report into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    Allocation,
}

impl Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InsertError::Allocation => {
                write!(f, "failed to allocate a new subtable")
            }
        }
    }
}

impl std::error::Error for InsertError {}

//------------ example metadata ----------------------------------------------

/// A minimal metadata payload carrying nothing but an originating AS
/// number, kept around as the example payload type the test suite exercises
/// against — most callers will bring their own `T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixAs(pub u32);

impl Display for PrefixAs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AS{}", self.0)
    }
}
