//------------ Stride plan and bit helpers -----------------------------------
//
// §4.1 of the design notes. `AddressFamily::Repr` already holds the whole
// key in one machine word, so the extraction here is shift-and-mask over
// that word rather than the byte-at-a-time cursor a variable-length bit
// string would need.

use crate::af::AddressFamily;

/// An immutable per-table plan of stride widths, one entry per trie level.
///
/// Built once in `Table::new` and never recomputed afterwards (§2c).
#[derive(Debug, Clone)]
pub struct StridePlan {
    /// Per-level stride width in bits.
    strides: Vec<u8>,
    /// Cumulative bit width through level `l`, i.e. `tl[l] = strides[0] +
    /// .. + strides[l]`.
    tl: Vec<u8>,
    addr_bits: u8,
}

impl StridePlan {
    pub fn new(strides: &[u8], addr_bits: u8) -> Result<Self, crate::route::PrefixError> {
        use crate::route::PrefixError;

        if strides.is_empty() {
            return Err(PrefixError::StrideSumMismatch {
                sum: 0,
                expected: addr_bits,
            });
        }

        let mut tl = Vec::with_capacity(strides.len());
        let mut acc: u16 = 0;
        for (level, &s) in strides.iter().enumerate() {
            if s == 0 {
                return Err(PrefixError::ZeroStride { level });
            }
            if s > 24 {
                return Err(PrefixError::StrideTooWide { level, stride: s });
            }
            acc += s as u16;
            tl.push(acc as u8);
        }
        if acc != addr_bits as u16 {
            return Err(PrefixError::StrideSumMismatch {
                sum: acc,
                expected: addr_bits,
            });
        }

        Ok(Self {
            strides: strides.to_vec(),
            tl,
            addr_bits,
        })
    }

    pub fn levels(&self) -> usize {
        self.strides.len()
    }

    pub fn stride_len(&self, level: usize) -> u8 {
        self.strides[level]
    }

    /// Cumulative bit width through (and including) `level`.
    pub fn cum_len(&self, level: usize) -> u8 {
        self.tl[level]
    }

    /// Cumulative bit width up to (excluding) `level`; 0 at the root.
    pub fn start_bit(&self, level: usize) -> u8 {
        if level == 0 {
            0
        } else {
            self.tl[level - 1]
        }
    }

    pub fn addr_bits(&self) -> u8 {
        self.addr_bits
    }

    /// The trie level whose heap holds prefixes of length `plen`.
    ///
    /// `plen == 0` is always level 0 (the table default lives in the root's
    /// `heap[1]`).
    pub fn plen_to_level(&self, plen: u8) -> usize {
        if plen == 0 {
            return 0;
        }
        for (level, &cum) in self.tl.iter().enumerate() {
            if plen <= cum {
                return level;
            }
        }
        unreachable!("plen {} exceeds address width {}", plen, self.addr_bits)
    }
}

/// Compute the in-node base index for a prefix of in-stride length `p`
/// given the full `sl`-bit stride value `stride_val` (unshifted, i.e. the
/// low `sl` bits hold the stride). Only the top `p` bits of the stride are
/// significant.
pub fn base_index_for_stride(stride_val: u32, sl: u8, p: u8) -> u32 {
    if p == 0 {
        1
    } else {
        (stride_val >> (sl - p)) + (1u32 << p)
    }
}

/// `fringeIndex`: the base index of the full `sl`-bit stride, i.e. the
/// fringe slot `stride_val + 2^sl`.
pub fn fringe_index(stride_val: u32, sl: u8) -> u32 {
    stride_val + (1u32 << sl)
}

/// Extract the `sl`-bit stride for `net` starting at bit `start_bit`.
pub fn extract_stride<AF: AddressFamily>(net: AF, start_bit: u8, sl: u8) -> u32 {
    AF::get_nibble(net, start_bit, sl)
}

/// Compare the first `plen` bits of two keys.
pub fn cmp_addr<AF: AddressFamily>(a: AF, b: AF, plen: u8) -> bool {
    a.matches_prefix(b, plen)
}

/// The smallest level at or below `max_level` whose stride contains the
/// first bit at which `a` and `b` diverge. Used by the path-compressed
/// trie to find where to interpose a new heap when two cached prefixes
/// mismatch (§4.5).
pub fn first_diff_level<AF: AddressFamily>(
    plan: &StridePlan,
    a: AF,
    b: AF,
    max_level: usize,
) -> usize {
    for level in 0..=max_level {
        if !a.matches_prefix(b, plan.cum_len(level)) {
            return level;
        }
    }
    max_level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_plan_rejects_mismatched_sum() {
        assert!(StridePlan::new(&[8, 8, 8], 32).is_err());
    }

    #[test]
    fn stride_plan_rejects_zero_stride() {
        assert!(StridePlan::new(&[8, 0, 24], 32).is_err());
    }

    #[test]
    fn stride_plan_rejects_wide_stride() {
        assert!(StridePlan::new(&[25, 7], 32).is_err());
    }

    #[test]
    fn stride_plan_accepts_valid() {
        let p = StridePlan::new(&[16, 8, 8], 32).unwrap();
        assert_eq!(p.levels(), 3);
        assert_eq!(p.cum_len(0), 16);
        assert_eq!(p.cum_len(2), 32);
        assert_eq!(p.start_bit(1), 16);
    }

    #[test]
    fn plen_to_level_boundaries() {
        let p = StridePlan::new(&[16, 8, 8], 32).unwrap();
        assert_eq!(p.plen_to_level(0), 0);
        assert_eq!(p.plen_to_level(1), 0);
        assert_eq!(p.plen_to_level(16), 0);
        assert_eq!(p.plen_to_level(17), 1);
        assert_eq!(p.plen_to_level(24), 1);
        assert_eq!(p.plen_to_level(25), 2);
        assert_eq!(p.plen_to_level(32), 2);
    }

    #[test]
    fn base_index_fringe_matches_formula() {
        // sl = 4, full stride value 0b1010, should land at fringe 16 + 10.
        assert_eq!(base_index_for_stride(0b1010, 4, 4), 0b1010 + 16);
        assert_eq!(fringe_index(0b1010, 4), 0b1010 + 16);
    }

    #[test]
    fn base_index_non_fringe() {
        // sl = 4, prefix length 2 out of a stride value 0b1011, top 2 bits
        // are 0b10 -> base index 2 + 0b10 = 6.
        assert_eq!(base_index_for_stride(0b1011, 4, 2), 0b10 + 4);
    }
}
