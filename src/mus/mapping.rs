use std::collections::{BTreeMap, BTreeSet, HashMap};

/// The covers of a hitting-set problem: each is the constraint that at least
/// one of its selectors must be chosen.
pub type Covers = Vec<BTreeSet<usize>>;

/// A bijection between the selectors occurring in the covers and the dense
/// range `[0, K)`.
pub struct SelectorMapping {
    /// Original selector to dense index.
    pub to_dense: HashMap<usize, usize>,
    /// Dense index to original selector.
    pub to_orig: Vec<usize>,
}

impl SelectorMapping {
    /// Maps selectors occurring in fewer covers to lower dense indices, so
    /// the search branches on rare selectors first. Ties keep ascending
    /// selector order.
    pub fn sorted_by_frequency(covers: &Covers) -> Self {
        let mut frequency: BTreeMap<usize, usize> = BTreeMap::new();
        for cover in covers {
            for &sel in cover {
                *frequency.entry(sel).or_insert(0) += 1;
            }
        }
        let mut by_frequency: Vec<(usize, usize)> =
            frequency.into_iter().map(|(sel, freq)| (freq, sel)).collect();
        by_frequency.sort_unstable();
        Self::from_order(by_frequency.into_iter().map(|(_, sel)| sel))
    }

    /// Maps selectors to dense indices in ascending selector order.
    pub fn natural(covers: &Covers) -> Self {
        let selectors: BTreeSet<usize> = covers.iter().flatten().copied().collect();
        Self::from_order(selectors.into_iter())
    }

    fn from_order(order: impl Iterator<Item = usize>) -> Self {
        let mut to_dense = HashMap::new();
        let mut to_orig = Vec::new();
        for (dense, sel) in order.enumerate() {
            to_dense.insert(sel, dense);
            to_orig.push(sel);
        }
        Self { to_dense, to_orig }
    }

    /// Number of mapped selectors.
    pub fn len(&self) -> usize {
        self.to_orig.len()
    }

    /// Returns `true` if no selector occurs in any cover.
    pub fn is_empty(&self) -> bool {
        self.to_orig.is_empty()
    }

    /// Rewrites the covers into the dense space.
    pub fn translate(&self, covers: &Covers) -> Covers {
        covers.iter().map(|cover| cover.iter().map(|sel| self.to_dense[sel]).collect()).collect()
    }
}
