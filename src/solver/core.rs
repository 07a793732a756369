// Minisat Copyrights
//
// Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson
// Copyright (c) 2007-2010, Niklas Sorensson
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
// associated documentation files (the "Software"), to deal in the Software without restriction,
// including without limitation the rights to use, copy, modify, merge, publish, distribute,
// sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all copies or
// substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
// NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
// OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::collections::ActivityHeap;
use crate::formulas::{Lit, Var};
use crate::solver::Tristate::{False, True, Undef};
use crate::solver::{ClauseRef, SearchParams, SearchStats, SolverClause, Tristate, VarState, Watcher};

const RANDOM_SEED: u64 = 91_648_253;

/// An incremental CDCL solver.
///
/// The interface is shaped for iterative use by the enumeration engines:
/// assumptions are pushed one decision level at a time with [`Solver::assume`]
/// and popped with [`Solver::cancel`], and [`Solver::search`] runs under
/// explicit conflict and learnt-clause budgets without clearing the search
/// tree below [`Solver::root_level`]. [`Solver::solve`] wraps `search` with
/// geometrically growing budgets until a definite answer is reached.
///
/// With derivation tracking enabled, every clause carries the union of the
/// origin tags of its resolution ancestors; after a top-level conflict,
/// [`Solver::ancestor_tag_sum`] exposes the tag union of the final
/// derivation, which is a (not necessarily minimal) unsat core over the
/// tagged clauses.
pub struct Solver {
    ok: bool,
    qhead: usize,
    clauses: Vec<ClauseRef>,
    learnts: Vec<ClauseRef>,
    watches: Vec<Vec<Watcher>>,
    vars: Vec<VarState>,
    order_heap: ActivityHeap,
    trail: Vec<Lit>,
    trail_lim: Vec<usize>,
    var_activities: Vec<f64>,
    var_reasons: Vec<Option<ClauseRef>>,
    /// Model of the last successful search, indexed by variable.
    pub model: Vec<bool>,
    seen: Vec<bool>,
    analyze_bt_level: usize,
    var_inc: f64,
    cla_inc: f64,
    simp_db_assigns: isize,
    /// Level below which the search never backtracks. Set by [`Solver::solve`]
    /// to the decision level at entry; assumptions live below it.
    pub root_level: usize,
    rng: fastrand::Rng,
    stats: SearchStats,

    track_derivation: bool,
    zero_tags: Vec<Option<BTreeSet<usize>>>,
    final_derivation: Option<BTreeSet<usize>>,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// Constructs an empty solver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ok: true,
            qhead: 0,
            clauses: Vec::new(),
            learnts: Vec::new(),
            watches: Vec::new(),
            vars: Vec::new(),
            order_heap: ActivityHeap::new(),
            trail: Vec::new(),
            trail_lim: Vec::new(),
            var_activities: Vec::new(),
            var_reasons: Vec::new(),
            model: Vec::new(),
            seen: Vec::new(),
            analyze_bt_level: 0,
            var_inc: 1.0,
            cla_inc: 1.0,
            simp_db_assigns: -1,
            root_level: 0,
            rng: fastrand::Rng::with_seed(RANDOM_SEED),
            stats: SearchStats::default(),
            track_derivation: false,
            zero_tags: Vec::new(),
            final_derivation: None,
        }
    }

    /// Turns on recording of clause origin tags through resolution. Must be
    /// called before any clause is added.
    pub fn enable_derivation(&mut self) {
        debug_assert!(self.clauses.is_empty() && self.trail.is_empty());
        self.track_derivation = true;
    }

    /// Unions the origin tags of the final conflict derivation into `out`.
    /// A no-op unless a top-level conflict has been derived.
    pub fn ancestor_tag_sum(&self, out: &mut BTreeSet<usize>) {
        if let Some(derivation) = &self.final_derivation {
            out.extend(derivation.iter().copied());
        }
    }

    /// Returns `false` once a top-level conflict has been established.
    pub const fn okay(&self) -> bool {
        self.ok
    }

    /// Number of variables on the solver.
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    /// Cumulative search effort counters.
    pub const fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Creates a new variable.
    pub fn new_var(&mut self) -> Var {
        let v = Var(self.vars.len());
        self.vars.push(VarState::new());
        self.watches.push(Vec::new());
        self.watches.push(Vec::new());
        self.seen.push(false);
        self.var_activities.push(0.0);
        self.var_reasons.push(None);
        self.zero_tags.push(None);
        self.order_heap.push(v, &self.var_activities);
        v
    }

    /// Current value of a literal.
    pub fn value(&self, lit: Lit) -> Tristate {
        let val = self.vars[lit.var().0].assignment;
        if lit.sign() { val.negate() } else { val }
    }

    /// Current decision level.
    pub fn decision_level(&self) -> usize {
        self.trail_lim.len()
    }

    /// Adds a clause, optionally tagged with a 1-based origin identifier for
    /// derivation tracking. Returns `false` on an immediate top-level
    /// conflict.
    pub fn add_clause(&mut self, lits: &[Lit], tag: Option<usize>) -> bool {
        debug_assert_eq!(self.decision_level(), 0);
        if !self.ok {
            return false;
        }
        let mut tags = BTreeSet::new();
        if self.track_derivation {
            tags.extend(tag);
        }
        let mut ps = lits.to_vec();
        ps.sort_unstable();

        let mut j = 0;
        let mut p = Lit::MAX;
        for i in 0..ps.len() {
            let elem = ps[i];
            let elem_value = self.value(elem);
            if elem_value == True || elem == p.negate() {
                return true;
            } else if elem_value == False {
                // dropping a top-level falsified literal resolves the clause
                // with that literal's derivation
                if self.track_derivation {
                    self.union_zero_tags(elem.var(), &mut tags);
                }
            } else if elem != p {
                p = elem;
                ps[j] = p;
                j += 1;
            }
        }
        ps.truncate(j);

        if ps.is_empty() {
            self.ok = false;
            if self.track_derivation {
                self.final_derivation = Some(tags);
            }
            false
        } else if ps.len() == 1 {
            let lit = ps[0];
            if self.track_derivation {
                self.zero_tags[lit.var().0] = Some(tags);
            }
            self.unchecked_enqueue(lit, None);
            if let Some(confl) = self.propagate() {
                self.level_zero_conflict(&confl);
            }
            self.ok
        } else {
            let clause = Rc::new(RefCell::new(SolverClause::new(ps, false, tags)));
            self.attach_clause(&clause);
            self.clauses.push(clause);
            true
        }
    }

    /// Convenience for unit clauses.
    pub fn add_unit(&mut self, lit: Lit, tag: Option<usize>) -> bool {
        self.add_clause(&[lit], tag)
    }

    /// Pushes `lit` as an assumption on a fresh decision level. Returns
    /// `false` if the literal is already false.
    pub fn assume(&mut self, lit: Lit) -> bool {
        self.trail_lim.push(self.trail.len());
        match self.value(lit) {
            False => false,
            True => true,
            Undef => {
                self.unchecked_enqueue(lit, None);
                true
            }
        }
    }

    /// Pops the topmost assumption level.
    pub fn cancel(&mut self) {
        let level = self.decision_level();
        if level > 0 {
            self.cancel_until(level - 1);
        }
    }

    /// Backtracks to the given decision level.
    pub fn cancel_until(&mut self, level: usize) {
        if self.decision_level() > level {
            for c in (self.trail_lim[level]..self.trail.len()).rev() {
                let lit = self.trail[c];
                let x = lit.var();
                let v = &mut self.vars[x.0];
                v.assignment = Undef;
                v.polarity = lit.sign();
                if !self.order_heap.contains(x) {
                    self.order_heap.push(x, &self.var_activities);
                }
            }
            self.qhead = self.trail_lim[level];
            self.trail.truncate(self.qhead);
            self.trail_lim.truncate(level);
        }
    }

    /// Propagates all enqueued assignments. Returns the conflicting clause,
    /// if any.
    pub fn propagate(&mut self) -> Option<ClauseRef> {
        let mut confl: Option<ClauseRef> = None;
        while self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            let false_lit = p.negate();
            self.qhead += 1;
            self.stats.propagations += 1;
            let mut i_ind = 0;
            let mut j_ind = 0;
            while i_ind < self.watches[p.0].len() {
                let (clause_ref, blocker) = {
                    let w = &self.watches[p.0][i_ind];
                    (w.clause_ref.clone(), w.blocker)
                };
                if self.value(blocker) == True {
                    self.watches[p.0][j_ind] = Watcher { clause_ref, blocker };
                    j_ind += 1;
                    i_ind += 1;
                    continue;
                }
                {
                    let mut c = clause_ref.borrow_mut();
                    if c.get(0) == false_lit {
                        let c1 = c.get(1);
                        c.set(0, c1);
                        c.set(1, false_lit);
                    }
                }
                let first = {
                    let c = clause_ref.borrow();
                    debug_assert!(c.get(1) == false_lit);
                    c.get(0)
                };
                i_ind += 1;
                let first_value = self.value(first);
                let w = Watcher { clause_ref: clause_ref.clone(), blocker: first };
                if first != blocker && first_value == True {
                    self.watches[p.0][j_ind] = w;
                    j_ind += 1;
                    continue;
                }
                let found_watch = {
                    let c = clause_ref.borrow();
                    (2..c.len()).find(|&k| self.value(c.get(k)) != False)
                };
                if let Some(k) = found_watch {
                    let mut c = clause_ref.borrow_mut();
                    let new_watch = c.get(k);
                    c.set(1, new_watch);
                    c.set(k, false_lit);
                    let not_c1 = c.get(1).negate();
                    drop(c);
                    self.watches[not_c1.0].push(w);
                } else {
                    let ws = &mut self.watches[p.0];
                    ws[j_ind] = w;
                    j_ind += 1;
                    if first_value == False {
                        confl = Some(clause_ref);
                        self.qhead = self.trail.len();
                        while i_ind < ws.len() {
                            ws.swap(j_ind, i_ind);
                            j_ind += 1;
                            i_ind += 1;
                        }
                    } else {
                        self.unchecked_enqueue(first, Some(clause_ref));
                    }
                }
            }
            self.watches[p.0].truncate(j_ind);
            if confl.is_some() {
                break;
            }
        }
        confl
    }

    /// Bounded search under the current assumptions. Returns `Undef` when the
    /// conflict budget is exhausted; on a definite answer the search tree is
    /// cancelled back to [`Solver::root_level`], with the model saved first on
    /// `True`.
    pub fn search(&mut self, max_conflicts: usize, max_learnts: usize, params: &SearchParams) -> Tristate {
        if !self.ok {
            return False;
        }
        self.stats.starts += 1;
        let mut conflict_c = 0;
        loop {
            if let Some(confl) = self.propagate() {
                self.stats.conflicts += 1;
                conflict_c += 1;
                if self.decision_level() == self.root_level {
                    if self.root_level == 0 {
                        self.level_zero_conflict(&confl);
                    }
                    return False;
                }
                let (learnt_clause, tags) = self.analyze(confl);
                self.cancel_until(self.analyze_bt_level.max(self.root_level));
                if learnt_clause.len() == 1 {
                    let lit = learnt_clause[0];
                    if self.track_derivation && self.decision_level() == 0 {
                        self.zero_tags[lit.var().0] = Some(tags);
                    }
                    self.unchecked_enqueue(lit, None);
                } else {
                    let first = learnt_clause[0];
                    let cr = Rc::new(RefCell::new(SolverClause::new(learnt_clause, true, tags)));
                    cr.borrow_mut().activity += self.cla_inc;
                    self.attach_clause(&cr);
                    self.unchecked_enqueue(first, Some(cr.clone()));
                    self.learnts.push(cr);
                }
                self.decay_activities(params);
            } else {
                if conflict_c >= max_conflicts {
                    self.cancel_until(self.root_level);
                    return Undef;
                }
                if self.decision_level() == 0 && !self.simplify_db() {
                    return False;
                }
                if self.learnts.len() >= max_learnts + self.trail.len() {
                    self.reduce_db();
                }
                if let Some(next) = self.pick_branch_lit(params) {
                    self.stats.decisions += 1;
                    self.trail_lim.push(self.trail.len());
                    self.unchecked_enqueue(next, None);
                } else {
                    self.model.clear();
                    self.model.extend(self.vars.iter().map(|v| v.assignment == True));
                    self.cancel_until(self.root_level);
                    return True;
                }
            }
        }
    }

    /// Repeated bounded search with geometric budget growth until a definite
    /// answer. The decision level at entry becomes the root level, so pushed
    /// assumptions stay in force.
    pub fn solve(&mut self) -> bool {
        let params = SearchParams::default();
        let mut nof_conflicts = 100.0;
        let mut nof_learnts = self.clauses.len() as f64 / 3.0;
        self.root_level = self.decision_level();
        let mut status = Undef;
        while status == Undef {
            status = self.search(nof_conflicts as usize, nof_learnts as usize, &params);
            nof_conflicts *= 1.5;
            nof_learnts *= 1.1;
        }
        status == True
    }

    /// Top-level simplification: propagates pending units and removes
    /// satisfied clauses. Returns `false` on a top-level conflict.
    pub fn simplify_db(&mut self) -> bool {
        debug_assert_eq!(self.decision_level(), 0);
        if !self.ok {
            return false;
        }
        if let Some(confl) = self.propagate() {
            self.level_zero_conflict(&confl);
            return false;
        }
        if self.trail.len() as isize == self.simp_db_assigns {
            return true;
        }
        self.remove_satisfied(true);
        self.remove_satisfied(false);
        self.rebuild_order_heap();
        self.simp_db_assigns = self.trail.len() as isize;
        true
    }

    fn unchecked_enqueue(&mut self, lit: Lit, reason: Option<ClauseRef>) {
        debug_assert!(self.value(lit) == Undef);
        let level = self.decision_level();
        if self.track_derivation && level == 0 {
            if let Some(r) = &reason {
                let c = r.borrow();
                let mut tags = c.tags.clone();
                for &q in &c.data {
                    if q != lit {
                        self.union_zero_tags(q.var(), &mut tags);
                    }
                }
                drop(c);
                self.zero_tags[lit.var().0] = Some(tags);
            }
        }
        let var = &mut self.vars[lit.var().0];
        var.assignment = Tristate::from_bool(!lit.sign());
        var.level = Some(level);
        self.var_reasons[lit.var().0] = reason;
        self.trail.push(lit);
    }

    fn attach_clause(&mut self, clause_ref: &ClauseRef) {
        let clause = clause_ref.borrow();
        let lit0 = clause.get(0);
        let lit1 = clause.get(1);
        self.watches[lit0.negate().0].push(Watcher { clause_ref: Rc::clone(clause_ref), blocker: lit1 });
        self.watches[lit1.negate().0].push(Watcher { clause_ref: Rc::clone(clause_ref), blocker: lit0 });
    }

    fn reason(&self, lit: Lit) -> Option<ClauseRef> {
        self.var_reasons[lit.var().0].clone()
    }

    /// First-UIP conflict analysis. Returns the learnt clause (asserting
    /// literal first) and the tag union of all clauses resolved on the way,
    /// including the derivations of skipped level-0 literals.
    fn analyze(&mut self, clause_ref: ClauseRef) -> (Vec<Lit>, BTreeSet<usize>) {
        let mut out_learnt = Vec::new();
        let mut tags = BTreeSet::new();
        let mut c_ref_option = Some(clause_ref);
        let mut path_c = 0;
        let mut first_run = true;
        let mut p: Option<Lit> = None;
        out_learnt.push(Lit::MAX);
        let mut index = self.trail.len() - 1;

        while first_run || path_c > 0 {
            let c_ref = c_ref_option.expect("unexpected missing reason during conflict analysis");
            {
                let mut c = c_ref.borrow_mut();
                if c.learnt {
                    c.activity += self.cla_inc;
                    if c.activity > 1e20 {
                        drop(c);
                        self.rescale_learnt_activities();
                    }
                }
            }
            {
                let c = c_ref.borrow();
                if self.track_derivation {
                    tags.extend(c.tags.iter().copied());
                }
                let j_start = usize::from(!first_run);
                for j in j_start..c.len() {
                    let q = c.get(j);
                    let q_var = q.var();
                    if self.seen[q_var.0] {
                        continue;
                    }
                    if self.vars[q_var.0].level_greater_zero() {
                        self.var_bump_activity(q_var);
                        self.seen[q_var.0] = true;
                        match self.vars[q_var.0].level {
                            Some(l) if l >= self.decision_level() => path_c += 1,
                            _ => out_learnt.push(q),
                        }
                    } else if self.track_derivation {
                        self.union_zero_tags(q_var, &mut tags);
                    }
                }
            }
            while !self.seen[self.trail[index].var().0] {
                index -= 1;
            }
            p = Some(self.trail[index]);
            c_ref_option = self.reason(p.unwrap());
            debug_assert!(path_c == 1 || c_ref_option.is_some());
            self.seen[p.unwrap().var().0] = false;
            path_c -= 1;
            first_run = false;
        }
        out_learnt[0] = p.unwrap().negate();
        self.minimize_clause(&mut out_learnt, &mut tags);
        (out_learnt, tags)
    }

    /// Local (non-recursive) minimization: drops literals whose reason clause
    /// is subsumed by the rest of the learnt clause. Each drop resolves with
    /// the reason, so its tags are absorbed.
    fn minimize_clause(&mut self, out_learnt: &mut Vec<Lit>, tags: &mut BTreeSet<usize>) {
        let analyze_to_clear = out_learnt.clone();
        let mut j = 1;
        for i in 1..out_learnt.len() {
            let i_lit = out_learnt[i];
            if let Some(clause_ref) = self.reason(i_lit) {
                let c = clause_ref.borrow();
                let redundant = (1..c.len()).all(|k| {
                    let k_var = c.get(k).var();
                    self.seen[k_var.0] || !self.vars[k_var.0].level_greater_zero()
                });
                if redundant {
                    if self.track_derivation {
                        tags.extend(c.tags.iter().copied());
                        for k in 1..c.len() {
                            let k_var = c.get(k).var();
                            if !self.vars[k_var.0].level_greater_zero() {
                                self.union_zero_tags(k_var, tags);
                            }
                        }
                    }
                } else {
                    out_learnt[j] = i_lit;
                    j += 1;
                }
            } else {
                out_learnt[j] = i_lit;
                j += 1;
            }
        }
        out_learnt.truncate(j);

        self.analyze_bt_level = 0;
        if out_learnt.len() > 1 {
            let mut max = 1;
            for k in 2..out_learnt.len() {
                if self.vars[out_learnt[k].var().0].level > self.vars[out_learnt[max].var().0].level {
                    max = k;
                }
            }
            let p = out_learnt[max];
            out_learnt.swap(max, 1);
            self.analyze_bt_level = self.vars[p.var().0].level.unwrap_or(0);
        }
        for lit in analyze_to_clear {
            self.seen[lit.var().0] = false;
        }
    }

    fn pick_branch_lit(&mut self, params: &SearchParams) -> Option<Lit> {
        if !self.vars.is_empty() && self.rng.f64() < params.random_var_freq {
            let v = Var(self.rng.usize(..self.vars.len()));
            if self.vars[v.0].assignment == Undef {
                return Some(Lit::new(v, self.vars[v.0].polarity));
            }
        }
        loop {
            if self.order_heap.is_empty() {
                return None;
            }
            let v = self.order_heap.pop_hottest(&self.var_activities);
            if self.vars[v.0].assignment == Undef {
                return Some(Lit::new(v, self.vars[v.0].polarity));
            }
        }
    }

    fn var_bump_activity(&mut self, v: Var) {
        let activity = &mut self.var_activities[v.0];
        *activity += self.var_inc;
        if *activity > 1e100 {
            for a in &mut self.var_activities {
                *a *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }
        if self.order_heap.contains(v) {
            self.order_heap.bump(v, &self.var_activities);
        }
    }

    fn decay_activities(&mut self, params: &SearchParams) {
        self.var_inc *= 1.0 / params.var_decay;
        self.cla_inc *= 1.0 / params.clause_decay;
    }

    fn rescale_learnt_activities(&mut self) {
        for clause in &self.learnts {
            clause.borrow_mut().rescale_activity();
        }
        self.cla_inc *= 1e-20;
    }

    /// Halves the learnt clause database, keeping binary, locked and
    /// recently active clauses.
    fn reduce_db(&mut self) {
        if self.learnts.is_empty() {
            return;
        }
        let extra_lim = self.cla_inc / self.learnts.len() as f64;
        self.learnts.sort_by(|x, y| {
            let (x_bin, x_act) = {
                let c = x.borrow();
                (c.len() <= 2, c.activity)
            };
            let (y_bin, y_act) = {
                let c = y.borrow();
                (c.len() <= 2, c.activity)
            };
            x_bin.cmp(&y_bin).then(x_act.partial_cmp(&y_act).unwrap_or(Ordering::Equal))
        });
        let mut j = 0;
        for i in 0..self.learnts.len() {
            let remove = {
                let c_ref = &self.learnts[i];
                let c = c_ref.borrow();
                c.len() > 2 && !self.locked(c_ref) && (i < self.learnts.len() / 2 || c.activity < extra_lim)
            };
            if remove {
                self.detach_and_unlock(&self.learnts[i].clone());
            } else {
                self.learnts.swap(i, j);
                j += 1;
            }
        }
        self.learnts.truncate(j);
    }

    fn remove_satisfied(&mut self, learnt: bool) {
        let len = if learnt { self.learnts.len() } else { self.clauses.len() };
        let mut j = 0;
        for i in 0..len {
            let satisfied = {
                let c_ref = if learnt { &self.learnts[i] } else { &self.clauses[i] };
                let c = c_ref.borrow();
                c.data.iter().any(|&l| self.value(l) == True)
            };
            if satisfied {
                let c_ref = if learnt { self.learnts[i].clone() } else { self.clauses[i].clone() };
                self.detach_and_unlock(&c_ref);
            } else {
                if learnt {
                    self.learnts.swap(i, j);
                } else {
                    self.clauses.swap(i, j);
                }
                j += 1;
            }
        }
        if learnt {
            self.learnts.truncate(j);
        } else {
            self.clauses.truncate(j);
        }
    }

    fn locked(&self, clause_ref: &ClauseRef) -> bool {
        let c0 = clause_ref.borrow().get(0);
        self.value(c0) == True && self.reason(c0).is_some_and(|r| Rc::ptr_eq(&r, clause_ref))
    }

    fn detach_and_unlock(&mut self, clause_ref: &ClauseRef) {
        if self.locked(clause_ref) {
            let c0 = clause_ref.borrow().get(0);
            self.var_reasons[c0.var().0] = None;
        }
        let (c0, c1) = {
            let c = clause_ref.borrow();
            (c.get(0), c.get(1))
        };
        self.watches[c0.negate().0].retain(|w| !Rc::ptr_eq(&w.clause_ref, clause_ref));
        self.watches[c1.negate().0].retain(|w| !Rc::ptr_eq(&w.clause_ref, clause_ref));
    }

    fn rebuild_order_heap(&mut self) {
        let vs: Vec<Var> =
            (0..self.vars.len()).map(Var).filter(|v| self.vars[v.0].assignment == Undef).collect();
        self.order_heap.rebuild(&vs, &self.var_activities);
    }

    /// Records the conflict state after a contradiction at decision level 0.
    fn level_zero_conflict(&mut self, confl: &ClauseRef) {
        self.ok = false;
        if self.track_derivation {
            let c = confl.borrow();
            let mut tags = c.tags.clone();
            for &q in &c.data {
                self.union_zero_tags(q.var(), &mut tags);
            }
            drop(c);
            self.final_derivation = Some(tags);
        }
    }

    fn union_zero_tags(&self, v: Var, out: &mut BTreeSet<usize>) {
        if let Some(t) = &self.zero_tags[v.0] {
            out.extend(t.iter().copied());
        }
    }
}
