//! Enumeration of minimal correction subsets.
//!
//! Given an unsatisfiable CNF formula, a *minimal correction subset* (MCS)
//! is a subset-minimal set of clauses whose removal restores satisfiability;
//! its complement is a *maximal satisfiable subset* (MSS). The enumerator
//! works on selector variables: clause `i` is installed as `C_i ∨ ¬Y_σ(i)`,
//! and a model deactivating a set of selectors witnesses the corresponding
//! correction set.
//!
//! The search iterates a cardinality bound: for growing `k`, an AtMost-`k`
//! constraint over the deactivation literals restricts models to correction
//! sets of size at most `k`, each found MCS is blocked by the clause
//! `∨_{y ∈ M} Y_y`, and a separate bound-free check decides whether any
//! correction set remains. Enumerating in this order yields MCSes of
//! non-decreasing size, and every model found in round `k` is already
//! minimal because all smaller MCSes are blocked. With a bound increment
//! above 1 a model may overshoot, so it is first grown to an MSS.
//!
//! When core guidance is on, only selectors known to occur in some unsat
//! derivation participate in the AtMost constraint; the solver's own final
//! derivation enlarges that set after every round.

use std::collections::BTreeSet;
use std::io::{self, Write};

use itertools::Itertools;
use log::{debug, warn};

use crate::assembly::{install_instrumented, install_plain};
use crate::cardinality::add_at_most;
use crate::formulas::{Cnf, Lit};
use crate::solver::Solver;

/// Configuration of the MCS enumeration.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct McsConfig {
    /// Step by which the cardinality bound grows between rounds.
    pub bound_increment: usize,
    /// Bound of the first round.
    pub initial_bound: usize,
    /// Truncate each MCS to at most this many selectors (0 disables). The
    /// truncated results are partial correction subsets (PCSes).
    pub size_limit: usize,
    /// Stop after the round in which the bound reaches this value
    /// (0 disables).
    pub report_threshold: usize,
    /// Restrict the cardinality constraint to selectors occurring in unsat
    /// cores, growing the set from the solver's derivations.
    pub use_cores: bool,
    /// Stop after the first MCS; the first one found is a minimum-cardinality
    /// MCS, which solves MaxSAT.
    pub max_sat: bool,
}

impl Default for McsConfig {
    fn default() -> Self {
        Self {
            bound_increment: 1,
            initial_bound: 1,
            size_limit: 0,
            report_threshold: 0,
            use_cores: true,
            max_sat: false,
        }
    }
}

/// Outcome of solving the plain (selector-free) instance.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RawOutcome {
    /// Satisfiable.
    Sat,
    /// Unsatisfiable after search.
    Unsat,
    /// Unsatisfiable by top-level propagation alone.
    UnsatEarly,
}

/// The MCS enumeration engine.
pub struct McsFinder<'a> {
    cnf: &'a Cnf,
    config: McsConfig,
    mcses: Vec<Vec<usize>>,
    ignored: BTreeSet<usize>,
    cannot_ignore: BTreeSet<usize>,
}

impl<'a> McsFinder<'a> {
    /// Constructs a finder for the given formula. A configuration combining
    /// core guidance with a bound increment above 1 cannot be satisfied
    /// coherently; it is corrected to `use_cores = false` with a warning.
    pub fn new(cnf: &'a Cnf, mut config: McsConfig) -> Self {
        if config.use_cores && config.bound_increment > 1 {
            warn!("a bound increment above 1 requires disabling core guidance; doing so");
            config.use_cores = false;
        }
        config.bound_increment = config.bound_increment.max(1);
        Self { cnf, config, mcses: Vec::new(), ignored: BTreeSet::new(), cannot_ignore: BTreeSet::new() }
    }

    /// The MCSes accumulated so far.
    pub fn mcses(&self) -> &[Vec<usize>] {
        &self.mcses
    }

    /// Seeds the enumeration with the MCSes of a previous run and sets the
    /// initial bound to the size of the last (largest) of them. Assumes they
    /// were found in non-decreasing order of size.
    pub fn load_previous(&mut self, mcses: Vec<Vec<usize>>) {
        if let Some(last) = mcses.last() {
            self.config.initial_bound = last.len();
        }
        self.mcses = mcses;
    }

    /// Solves the plain instance. With `deriv` given, the solver records its
    /// resolution derivation and the final conflict's ancestor tags are
    /// unioned into the set.
    pub fn solve_raw(
        &self,
        deriv: Option<&mut BTreeSet<usize>>,
        exclude: Option<&BTreeSet<usize>>,
        reverse: bool,
    ) -> RawOutcome {
        let mut s = Solver::new();
        if deriv.is_some() {
            s.enable_derivation();
        }
        let outcome = if install_plain(&mut s, self.cnf, exclude, reverse) {
            if s.solve() { RawOutcome::Sat } else { RawOutcome::Unsat }
        } else {
            RawOutcome::UnsatEarly
        };
        if let Some(out) = deriv {
            s.ancestor_tag_sum(out);
        }
        debug!("raw solve: {outcome:?}, {:?}", s.stats());
        outcome
    }

    /// A single (not necessarily minimal) unsat core as 1-based selector
    /// indices, extracted from the resolution derivation.
    pub fn single_core(&self) -> BTreeSet<usize> {
        let mut core = BTreeSet::new();
        self.solve_raw(Some(&mut core), None, false);
        core
    }

    /// The intersection of two structurally different cores, obtained from
    /// forward and reverse clause installation.
    pub fn core_intersection(&self) -> BTreeSet<usize> {
        let mut first = BTreeSet::new();
        let mut second = BTreeSet::new();
        self.solve_raw(Some(&mut first), None, false);
        self.solve_raw(Some(&mut second), None, true);
        first.intersection(&second).copied().collect()
    }

    /// The union of as many pairwise disjoint cores as can be found, along
    /// with their number.
    pub fn disjoint_cores(&self) -> (BTreeSet<usize>, usize) {
        let mut union = BTreeSet::new();
        let mut count = 0;
        loop {
            let mut core = BTreeSet::new();
            if self.solve_raw(Some(&mut core), Some(&union), false) == RawOutcome::Sat {
                return (union, count);
            }
            union.extend(core);
            count += 1;
        }
    }

    /// Checks whether any MCS remains beyond the ones found so far: installs
    /// the instrumented formula without a cardinality bound, blocks every
    /// known MCS, and asks for a model.
    pub fn check_for_more(&self) -> bool {
        let mut s = Solver::new();
        let mut st = install_instrumented(&mut s, self.cnf, None);
        if st {
            st = self.add_blocking_clauses(&mut s);
        }
        for &y in &self.ignored {
            s.add_unit(self.cnf.selector_var(y).neg_lit(), None);
        }
        st && s.solve()
    }

    /// Enumerates all MCSes, streaming each to `out` as a line of 1-based
    /// selector indices. With a size limit, output is withheld until the
    /// end of the run because subsumed partial results are removed along
    /// the way.
    pub fn find_mcses<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let mut bound = self.config.initial_bound;
        let mut included = BTreeSet::new();

        if self.config.use_cores {
            included = self.single_core();
            debug!("initial core ({} selectors): {}", included.len(), included.iter().join(" "));
        }

        loop {
            debug!("bound = {bound}");
            let mut s = Solver::new();
            if self.config.use_cores {
                s.enable_derivation();
            }
            let instrument = self.config.use_cores.then_some(&included);
            let mut st = install_instrumented(&mut s, self.cnf, instrument);
            if st {
                st = self.add_blocking_clauses(&mut s);
            }
            for &y in &self.ignored {
                s.add_unit(self.cnf.selector_var(y).neg_lit(), None);
            }
            if st {
                let deactivations: Vec<Lit> = (0..self.cnf.num_selectors())
                    .filter(|y| !self.config.use_cores || included.contains(&(y + 1)))
                    .map(|y| self.cnf.selector_var(y).neg_lit())
                    .collect();
                st = add_at_most(&mut s, &deactivations, bound);
            }

            let lower = bound.saturating_sub(self.config.bound_increment - 1);
            let mut found_any = false;
            if st {
                found_any = self.enumerate_round(&mut s, lower, bound, out)?;
            }
            debug!("round done: {:?}", s.stats());

            if found_any && self.config.max_sat {
                break;
            }
            if self.config.size_limit > 0 {
                debug!("removing subsumed partial correction subsets ({} total)", self.mcses.len());
                self.remove_subsumed();
            }
            if found_any {
                if self.config.report_threshold > 0 && bound >= self.config.report_threshold {
                    break;
                }
                debug!("checking for MCSes beyond bound {bound}");
                if !self.check_for_more() {
                    break;
                }
            }
            if self.config.use_cores {
                s.ancestor_tag_sum(&mut included);
                debug!("grown core ({} selectors): {}", included.len(), included.iter().join(" "));
            }
            bound += self.config.bound_increment;
        }

        if self.config.size_limit > 0 {
            for mcs in &self.mcses {
                writeln!(out, "{}", mcs.iter().map(|y| y + 1).join(" "))?;
            }
        }
        Ok(())
    }

    /// Enumerates the models of the currently installed bounded instance
    /// until exhaustion, turning each into an MCS.
    fn enumerate_round<W: Write>(
        &mut self,
        s: &mut Solver,
        lower: usize,
        upper: usize,
        out: &mut W,
    ) -> io::Result<bool> {
        let mut found_any = false;
        let do_grow = lower != upper;

        while s.solve() {
            found_any = true;

            let mut mss = BTreeSet::new();
            let mut mcs = BTreeSet::new();
            for y in 0..self.cnf.num_selectors() {
                if s.model[self.cnf.selector_var(y).0] {
                    if do_grow {
                        mss.insert(y);
                    }
                } else {
                    mcs.insert(y);
                }
            }
            if do_grow && mcs.len() != lower {
                // the bound leap may overshoot minimality
                self.grow(s, &mss, &mut mcs, lower);
            }

            let new_mcs = if self.config.size_limit > 0 {
                mcs = mcs.difference(&self.ignored).copied().collect();
                self.truncate_mcs(s, mcs)
            } else {
                mcs.into_iter().collect::<Vec<_>>()
            };

            if self.config.size_limit == 0 {
                // safe to stream: nothing gets subsumed later
                writeln!(out, "{}", new_mcs.iter().map(|y| y + 1).join(" "))?;
            }
            if self.config.max_sat {
                return Ok(true);
            }

            let blocking: Vec<Lit> =
                new_mcs.iter().map(|&y| self.cnf.selector_var(y).pos_lit()).collect();
            self.mcses.push(new_mcs);
            if !s.add_clause(&blocking, None) {
                break;
            }
        }
        Ok(found_any)
    }

    /// Reduces an oversized MCS to a partial correction subset of at most
    /// `size_limit` selectors: everything in `cannot_ignore` is kept first,
    /// the smallest remaining selectors fill up the limit, and everything
    /// excluded is deactivated for good.
    fn truncate_mcs(&mut self, s: &mut Solver, mut mcs: BTreeSet<usize>) -> Vec<usize> {
        if mcs.len() <= self.config.size_limit {
            let new_mcs: Vec<usize> = mcs.into_iter().collect();
            self.cannot_ignore.extend(new_mcs.iter().copied());
            return new_mcs;
        }
        let mut new_mcs = Vec::new();
        let must_keep: Vec<usize> = self.cannot_ignore.intersection(&mcs).copied().collect();
        let mut counter = 0;
        for y in must_keep {
            new_mcs.push(y);
            mcs.remove(&y);
            counter += 1;
        }
        for y in mcs.iter().copied().collect::<Vec<_>>() {
            counter += 1;
            if counter > self.config.size_limit {
                break;
            }
            debug!("choosing {y} into the partial correction subset");
            new_mcs.push(y);
            mcs.remove(&y);
        }
        self.ignored.extend(mcs.iter().copied());
        self.cannot_ignore.extend(new_mcs.iter().copied());
        for &y in &mcs {
            debug!("forcing out {}", y + 1);
            s.add_unit(self.cnf.selector_var(y).neg_lit(), None);
        }
        new_mcs
    }

    /// Grows the satisfiable subset witnessed by the current model to a
    /// maximal one, shrinking `mcs` in place to its complement. Stops early
    /// once `lower` (if non-zero) is reached, since no smaller correction
    /// set can exist in this round.
    fn grow(&self, s: &mut Solver, mss: &BTreeSet<usize>, mcs: &mut BTreeSet<usize>, lower: usize) {
        debug!("growing, correction set starts with {} selectors", mcs.len());
        s.cancel_until(0);
        for &y in mss {
            s.assume(self.cnf.selector_var(y).pos_lit());
            s.propagate();
        }

        let mut cur_size = mcs.len();
        for y in mcs.iter().copied().collect::<Vec<_>>() {
            if !mcs.contains(&y) {
                continue;
            }
            let st = s.assume(self.cnf.selector_var(y).pos_lit());
            if st && s.propagate().is_none() && s.solve() {
                // still satisfiable with this clause forced in
                cur_size -= 1;
                // collateral satisfactions piggy-back on the new model and
                // save full solver calls
                for y2 in mcs.range(y + 1..).copied().collect::<Vec<_>>() {
                    if s.model[self.cnf.selector_var(y2).0] {
                        mcs.remove(&y2);
                        s.assume(self.cnf.selector_var(y2).pos_lit());
                        s.propagate();
                        cur_size -= 1;
                        if lower > 0 && cur_size == lower {
                            break;
                        }
                    }
                }
                mcs.remove(&y);
                if lower > 0 && cur_size == lower {
                    debug!("lower bound reached");
                    break;
                }
            } else {
                s.cancel();
            }
        }

        s.cancel_until(0);
        s.root_level = 0;
        debug!("growing done, correction set has {} selectors", mcs.len());
    }

    fn add_blocking_clauses(&self, s: &mut Solver) -> bool {
        let mut st = true;
        for mcs in &self.mcses {
            let clause: Vec<Lit> = mcs.iter().map(|&y| self.cnf.selector_var(y).pos_lit()).collect();
            if st {
                st = s.add_clause(&clause, None);
            }
        }
        st
    }

    /// Drops every stored result that strictly contains another one. Only
    /// needed with a size limit, where truncation can produce partial
    /// subsets that later turn out to be dominated.
    fn remove_subsumed(&mut self) {
        let mut i = 0;
        while i < self.mcses.len() {
            let small: BTreeSet<usize> = self.mcses[i].iter().copied().collect();
            let small_len = self.mcses[i].len();
            let mut j = 0;
            while j < self.mcses.len() {
                if small_len < self.mcses[j].len() && self.mcses[j].iter().all(|y| small.contains(y)) {
                    self.mcses.remove(j);
                    if j < i {
                        i -= 1;
                    }
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests;
