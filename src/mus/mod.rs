//! Construction of minimal unsatisfiable subsets from minimal correction
//! subsets.
//!
//! The MUSes of a formula are exactly the minimal hitting sets of its family
//! of MCSes (the hypergraph-transversal duality), so this module never
//! touches the formula itself: it enumerates all minimal hitting sets of a
//! list of covers.
//!
//! The search branches on each selector in dense order, first *choosing* it
//! and splitting on every cover that contains it, then permanently
//! *excluding* it. The exclusion step erases the selector from every cover,
//! which imposes a lexicographic discipline on the enumeration: no branch
//! can later pick a selector below one it already skipped, so symmetric
//! duplicates are never generated, yet every minimal hitting set is reached.
//! A visited set over the ternary assignments catches the remaining
//! re-entries; its placement after singleton propagation and before any
//! output is what makes each MUS come out exactly once.

mod assign;
mod mapping;

pub use assign::*;
pub use mapping::*;

use std::collections::{BTreeSet, HashSet};
use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use itertools::Itertools;
use log::debug;

/// Configuration of the MUS construction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MusConfig {
    /// Prune the search with an MIS-based lower bound so that ever smaller
    /// MUSes are found, down to one of minimum cardinality.
    pub branch_and_bound: bool,
    /// Prefix every emitted MUS with a Unix timestamp.
    pub timestamps: bool,
    /// Use the natural selector order instead of the frequency-sorted one.
    pub natural_order: bool,
}

/// The minimal-hitting-set engine.
pub struct MusBuilder {
    config: MusConfig,
    singletons: Vec<usize>,
    to_orig: Vec<usize>,
    visited: HashSet<ClauseAssign>,
    bb_upper: usize,
    depth: usize,
}

impl MusBuilder {
    /// Constructs a builder.
    pub fn new(config: MusConfig) -> Self {
        Self {
            config,
            singletons: Vec::new(),
            to_orig: Vec::new(),
            visited: HashSet::new(),
            bb_upper: usize::MAX,
            depth: 0,
        }
    }

    /// Enumerates all minimal hitting sets of `covers` and writes them to
    /// `out`, one per line. Selectors from singleton covers are part of
    /// every MUS and are passed separately; they are prepended to each
    /// output line.
    pub fn enumerate<W: Write>(
        &mut self,
        covers: Covers,
        singletons: Vec<usize>,
        out: &mut W,
    ) -> io::Result<()> {
        self.singletons = singletons;
        let mapping = if self.config.natural_order {
            SelectorMapping::natural(&covers)
        } else {
            SelectorMapping::sorted_by_frequency(&covers)
        };
        let translated = mapping.translate(&covers);
        let assign = ClauseAssign::new(mapping.len());
        self.to_orig = mapping.to_orig;
        self.construct(translated, assign, out)?;
        Ok(())
    }

    /// The recursive search. Returns `true` when the branch-and-bound prune
    /// fired, telling the caller to stop trying further covers for its
    /// current choice.
    fn construct<W: Write>(
        &mut self,
        mut covers: Covers,
        mut assign: ClauseAssign,
        out: &mut W,
    ) -> io::Result<bool> {
        propagate_singletons(&mut covers, &mut assign);

        if self.config.branch_and_bound && assign.num_pos + mis_lower_bound(covers.clone()) >= self.bb_upper
        {
            debug!("{:depth$}bound hit", "", depth = self.depth);
            return Ok(true);
        }

        // the placement of this check, after singleton propagation and
        // before any output or branching, is what rules out duplicates
        if !self.visited.insert(assign.clone()) {
            debug!("{:depth$}already visited", "", depth = self.depth);
            return Ok(false);
        }

        if covers.is_empty() {
            self.output_mus(&assign, out)?;
            self.bb_upper = assign.num_pos;
            return Ok(false);
        }

        for sel in 0..assign.len() {
            if !assign.is_undecided(sel) {
                continue;
            }
            assign.choose(sel);
            debug!("{:depth$}choosing {sel}", "", depth = self.depth);

            let splits: Vec<usize> =
                (0..covers.len()).filter(|&i| covers[i].contains(&sel)).collect();
            for i in splits {
                debug_assert!(!covers[i].is_empty());
                let mut new_covers = covers.clone();
                let mut new_assign = assign.clone();
                remove_clause_and_cover(&mut new_covers, &mut new_assign, sel, &covers[i]);
                self.depth += 1;
                let skip_remaining = self.construct(new_covers, new_assign, out)?;
                self.depth -= 1;
                if skip_remaining {
                    break;
                }
            }

            assign.unchoose_and_exclude(sel);
            if !remove_clause(&mut covers, sel) {
                debug!("{:depth$}exclusion of {sel} infeasible", "", depth = self.depth);
                return Ok(false);
            }
        }

        Ok(false)
    }

    fn output_mus<W: Write>(&self, assign: &ClauseAssign, out: &mut W) -> io::Result<()> {
        let mut line = String::new();
        if self.config.timestamps {
            let now = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
            line.push_str(&format!("{now}: "));
        }
        let selectors =
            self.singletons.iter().copied().chain(assign.chosen().map(|i| self.to_orig[i]));
        line.push_str(&selectors.map(|s| s.to_string()).join(" "));
        writeln!(out, "{line}")
    }
}

/// Folds every size-1 cover into the assignment: its selector is forced
/// into the MUS and the cover disappears.
fn propagate_singletons(covers: &mut Covers, assign: &mut ClauseAssign) {
    covers.retain(|cover| {
        if cover.len() == 1 {
            let sel = *cover.iter().next().expect("non-empty by construction");
            if assign.is_undecided(sel) {
                assign.choose(sel);
            }
            false
        } else {
            true
        }
    });
}

/// Handles the choice of `sel` through the cover `chosen`: every cover
/// containing `sel` is hit and disappears; the other selectors of `chosen`
/// are locked out of the remaining covers; selectors left in no surviving
/// cover are excluded for good.
fn remove_clause_and_cover(covers: &mut Covers, assign: &mut ClauseAssign, sel: usize, chosen: &BTreeSet<usize>) {
    covers.retain(|cover| !cover.contains(&sel));

    let mut locked_out = chosen.clone();
    locked_out.remove(&sel);

    let mut i = 0;
    while i < covers.len() {
        let before = covers[i].len();
        let shrunk: BTreeSet<usize> = covers[i].difference(&locked_out).copied().collect();
        covers[i] = shrunk;
        if covers[i].len() != before {
            debug_assert!(!covers[i].is_empty());
            let modified = covers[i].clone();
            i -= maintain_no_subsets(covers, &modified, i);
        }
        i += 1;
    }

    let mut remaining = vec![false; assign.len()];
    for cover in covers.iter() {
        debug_assert!(!cover.is_empty());
        for &s in cover {
            remaining[s] = true;
        }
    }
    for s in 0..assign.len() {
        if assign.is_undecided(s) && !remaining[s] {
            assign.exclude(s);
        }
    }
}

/// Permanent exclusion of `sel`: erases it from every cover. Returns
/// `false` as soon as a cover runs empty, meaning the exclusion cannot lead
/// to a hitting set.
fn remove_clause(covers: &mut Covers, sel: usize) -> bool {
    let mut i = 0;
    while i < covers.len() {
        if covers[i].remove(&sel) {
            if covers[i].is_empty() {
                return false;
            }
            let modified = covers[i].clone();
            i -= maintain_no_subsets(covers, &modified, i);
        }
        i += 1;
    }
    true
}

/// Restores the invariant that no cover strictly contains another after
/// `modified` (at position `keep`) shrank: every strict superset is
/// redundant and dropped. Returns by how much `keep` shifted down.
fn maintain_no_subsets(covers: &mut Covers, modified: &BTreeSet<usize>, keep: usize) -> usize {
    let mut shift = 0;
    let mut j = 0;
    while j < covers.len() {
        if modified.len() < covers[j].len() && modified.is_subset(&covers[j]) {
            covers.remove(j);
            if j < keep - shift {
                shift += 1;
            }
        } else {
            j += 1;
        }
    }
    shift
}

/// A greedy maximal independent set over the covers: repeatedly counts the
/// shortest surviving cover and discards everything intersecting it. The
/// count lower-bounds the size of any hitting set. Destroys its working
/// copy.
fn mis_lower_bound(mut covers: Covers) -> usize {
    let mut result = 0;
    while !covers.is_empty() {
        let shortest = covers
            .iter()
            .min_by_key(|cover| cover.len())
            .expect("non-empty checked above")
            .clone();
        result += 1;
        covers.retain(|cover| cover.is_disjoint(&shortest));
    }
    result
}
