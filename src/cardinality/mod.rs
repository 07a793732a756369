//! CNF encoding of AtMost-k cardinality constraints.
//!
//! The encoding is a k-capped totalizer: input literals are summed pairwise
//! up a balanced tree of unary counters, each node truncated to `k + 1`
//! outputs, and the root output carrying "more than k" is forced false. The
//! auxiliary clauses are untagged, so they never contribute to derivation
//! tag sums.

use std::cmp::min;

use crate::formulas::Lit;
use crate::solver::Solver;

/// Adds the constraint that at most `rhs` of `lits` are true. Returns
/// `false` on an immediate top-level conflict.
pub fn add_at_most(s: &mut Solver, lits: &[Lit], rhs: usize) -> bool {
    if !s.okay() {
        return false;
    }
    if rhs >= lits.len() {
        return true;
    }
    if rhs == 0 {
        let mut ok = true;
        for &lit in lits {
            ok = s.add_unit(lit.negate(), None) && ok;
        }
        return ok;
    }
    let outputs = totalizer(s, lits, rhs + 1);
    debug_assert!(outputs.len() == rhs + 1);
    s.okay() && s.add_unit(outputs[rhs].negate(), None)
}

/// Builds the counting tree over `lits` and returns the output literals of
/// the root: `out[j]` is implied whenever more than `j` inputs are true.
/// Counts are capped at `cap` outputs per node.
fn totalizer(s: &mut Solver, lits: &[Lit], cap: usize) -> Vec<Lit> {
    if lits.len() == 1 {
        return vec![lits[0]];
    }
    let split = lits.len() / 2;
    let left = totalizer(s, &lits[..split], cap);
    let right = totalizer(s, &lits[split..], cap);
    let out: Vec<Lit> = (0..min(lits.len(), cap)).map(|_| s.new_var().pos_lit()).collect();
    for i in 0..=left.len() {
        for j in 0..=right.len() {
            if i + j == 0 || i + j > cap {
                continue;
            }
            let mut clause = Vec::with_capacity(3);
            if i > 0 {
                clause.push(left[i - 1].negate());
            }
            if j > 0 {
                clause.push(right[j - 1].negate());
            }
            clause.push(out[i + j - 1]);
            s.add_clause(&clause, None);
        }
    }
    out
}
