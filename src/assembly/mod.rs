//! Installation of a [`Cnf`] onto a [`Solver`], with or without selector
//! variables.

use std::collections::BTreeSet;

use crate::formulas::{Cnf, Lit};
use crate::solver::Solver;

/// Installs the formula with selector variables: clause `i` becomes
/// `C_i ∨ ¬Y_σ(i)`, so forcing the selector true activates the clause.
///
/// When `instrument` is given, only clauses whose (1-based) selector is in
/// the set are gated; the remaining clauses are added hard and tagged with
/// their selector so that a later unsat derivation can report them, and
/// their now unused selector variable is pinned true to keep it out of the
/// search.
///
/// Returns `false` upon immediate top-level conflict.
pub fn install_instrumented(s: &mut Solver, cnf: &Cnf, instrument: Option<&BTreeSet<usize>>) -> bool {
    while s.num_vars() < cnf.num_vars() + cnf.num_selectors() {
        s.new_var();
    }
    for (i, clause) in cnf.clauses().iter().enumerate() {
        let y = cnf.selector_of(i);
        if instrument.is_none_or(|set| set.contains(&(y + 1))) {
            // selector literal goes last: the large AtMost propagations then
            // hit fewer watches
            let mut lits = clause.clone();
            lits.push(cnf.selector_var(y).neg_lit());
            // untagged: an instrumented selector is already part of every
            // future derivation sum
            if !s.add_clause(&lits, None) {
                return false;
            }
        } else {
            // pin the unused selector down, otherwise the solver wastes
            // decisions on a free variable
            s.add_unit(cnf.selector_var(y).pos_lit(), None);
            if !s.add_clause(clause, Some(y + 1)) {
                return false;
            }
        }
    }
    for y_clause in cnf.y_clauses() {
        let lits: Vec<Lit> = y_clause
            .iter()
            .map(|&l| {
                let var = cnf.selector_var(l.unsigned_abs() as usize - 1);
                if l > 0 { var.pos_lit() } else { var.neg_lit() }
            })
            .collect();
        if !s.add_clause(&lits, None) {
            return false;
        }
    }
    s.simplify_db();
    s.okay()
}

/// Installs the formula without selector variables, tagging every clause
/// with its 1-based selector for derivation tracking. Selectors in
/// `exclude` are left out entirely; `reverse` iterates the clauses
/// back-to-front, which tends to produce a structurally different unsat
/// core. The selector of a clause is the same in both orders.
///
/// Returns `false` upon immediate top-level conflict.
pub fn install_plain(s: &mut Solver, cnf: &Cnf, exclude: Option<&BTreeSet<usize>>, reverse: bool) -> bool {
    while s.num_vars() < cnf.num_vars() {
        s.new_var();
    }
    let indices: Vec<usize> =
        if reverse { (0..cnf.num_clauses()).rev().collect() } else { (0..cnf.num_clauses()).collect() };
    for i in indices {
        let y = cnf.selector_of(i);
        if exclude.is_some_and(|set| set.contains(&(y + 1))) {
            continue;
        }
        if !s.add_clause(&cnf.clauses()[i], Some(y + 1)) {
            return false;
        }
    }
    s.simplify_db();
    s.okay()
}
