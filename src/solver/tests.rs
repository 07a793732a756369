use std::collections::BTreeSet;

use crate::formulas::{Lit, Var};
use crate::solver::Tristate::Undef;
use crate::solver::{SearchParams, Solver};

fn lit(l: i64) -> Lit {
    let var = Var(l.unsigned_abs() as usize - 1);
    if l > 0 { var.pos_lit() } else { var.neg_lit() }
}

fn solver_with_vars(n: usize) -> Solver {
    let mut s = Solver::new();
    for _ in 0..n {
        s.new_var();
    }
    s
}

fn add(s: &mut Solver, clause: &[i64]) -> bool {
    let lits: Vec<Lit> = clause.iter().map(|&l| lit(l)).collect();
    s.add_clause(&lits, None)
}

#[test]
fn empty_formula_is_sat() {
    let mut s = solver_with_vars(2);
    assert!(s.solve());
}

#[test]
fn single_unit() {
    let mut s = solver_with_vars(1);
    assert!(add(&mut s, &[1]));
    assert!(s.solve());
    assert!(s.model[0]);
}

#[test]
fn contradicting_units_conflict_on_add() {
    let mut s = solver_with_vars(1);
    assert!(add(&mut s, &[1]));
    assert!(!add(&mut s, &[-1]));
    assert!(!s.okay());
    assert!(!s.solve());
}

#[test]
fn simple_unsat_needs_search() {
    let mut s = solver_with_vars(2);
    assert!(add(&mut s, &[1, 2]));
    assert!(add(&mut s, &[1, -2]));
    assert!(add(&mut s, &[-1, 2]));
    assert!(add(&mut s, &[-1, -2]));
    assert!(!s.solve());
}

#[test]
fn model_satisfies_clauses() {
    let clauses: [&[i64]; 3] = [&[1, 2], &[-1, 3], &[-3, -2, 1]];
    let mut s = solver_with_vars(3);
    for clause in clauses {
        assert!(add(&mut s, clause));
    }
    assert!(s.solve());
    for clause in clauses {
        assert!(clause.iter().any(|&l| s.model[l.unsigned_abs() as usize - 1] == (l > 0)));
    }
}

#[test]
fn tautologies_and_duplicates_are_dropped() {
    let mut s = solver_with_vars(2);
    assert!(add(&mut s, &[1, -1]));
    assert!(add(&mut s, &[2, 2]));
    assert!(s.solve());
    assert!(s.model[1]);
}

#[test]
fn assumptions_are_incremental() {
    let mut s = solver_with_vars(2);
    assert!(add(&mut s, &[-1, 2]));

    assert!(s.assume(lit(1)));
    assert!(s.propagate().is_none());
    assert!(s.solve());
    assert!(s.model[0] && s.model[1]);

    // 2 was propagated on the assumption level, so its negation fails
    assert!(!s.assume(lit(-2)));

    s.cancel();
    s.cancel();
    assert_eq!(s.decision_level(), 0);
    s.root_level = 0;
    assert!(s.solve());
}

#[test]
fn unsat_under_assumption_recovers_after_cancel() {
    let mut s = solver_with_vars(3);
    assert!(add(&mut s, &[-1, 2, 3]));
    assert!(add(&mut s, &[-1, 2, -3]));
    assert!(add(&mut s, &[-1, -2, 3]));
    assert!(add(&mut s, &[-1, -2, -3]));

    assert!(s.assume(lit(1)));
    assert!(s.propagate().is_none());
    assert!(!s.solve());

    s.cancel();
    s.root_level = 0;
    assert!(s.solve());
    assert!(!s.model[0]);
}

#[test]
fn assuming_a_false_literal_fails() {
    let mut s = solver_with_vars(1);
    assert!(add(&mut s, &[1]));
    assert!(!s.assume(lit(-1)));
    s.cancel();
    assert!(s.solve());
}

#[test]
fn exhausted_conflict_budget_returns_undef() {
    let mut s = solver_with_vars(2);
    assert!(add(&mut s, &[1, 2]));
    s.root_level = 0;
    assert_eq!(s.search(0, 100, &SearchParams::default()), Undef);
    assert_eq!(s.decision_level(), 0);
}

#[test]
fn derivation_of_contradicting_units() {
    let mut s = solver_with_vars(2);
    s.enable_derivation();
    assert!(s.add_unit(lit(1), Some(1)));
    assert!(s.add_unit(lit(2), Some(2)));
    assert!(!s.add_unit(lit(-1), Some(3)));
    let mut core = BTreeSet::new();
    s.ancestor_tag_sum(&mut core);
    assert_eq!(core, BTreeSet::from([1, 3]));
}

#[test]
fn derivation_via_propagation_chain() {
    // 1, 1 -> 2, 2 -> 3, -3; the tag 9 clause is irrelevant
    let mut s = solver_with_vars(4);
    s.enable_derivation();
    assert!(s.add_unit(lit(1), Some(1)));
    assert!(s.add_clause(&[lit(-1), lit(2)], Some(2)));
    assert!(s.add_clause(&[lit(-2), lit(3)], Some(3)));
    assert!(s.add_clause(&[lit(4), lit(3)], Some(9)));
    assert!(!s.add_unit(lit(-3), Some(4)));
    let mut core = BTreeSet::new();
    s.ancestor_tag_sum(&mut core);
    assert_eq!(core, BTreeSet::from([1, 2, 3, 4]));
}

#[test]
fn derivation_after_search() {
    // pigeons 1..3 into holes, one hole short: unsat only through search
    let mut s = solver_with_vars(6);
    s.enable_derivation();
    let clauses: [(&[i64], usize); 9] = [
        (&[1, 2], 1),
        (&[3, 4], 2),
        (&[5, 6], 3),
        (&[-1, -3], 4),
        (&[-1, -5], 5),
        (&[-3, -5], 6),
        (&[-2, -4], 7),
        (&[-2, -6], 8),
        (&[-4, -6], 9),
    ];
    for (clause, tag) in clauses {
        let lits: Vec<Lit> = clause.iter().map(|&l| lit(l)).collect();
        assert!(s.add_clause(&lits, Some(tag)));
    }
    assert!(!s.solve());
    let mut core = BTreeSet::new();
    s.ancestor_tag_sum(&mut core);
    assert!(!core.is_empty());

    // the clauses named by the core must be unsatisfiable on their own
    let mut check = solver_with_vars(6);
    for (clause, tag) in clauses {
        if core.contains(&tag) {
            let lits: Vec<Lit> = clause.iter().map(|&l| lit(l)).collect();
            check.add_clause(&lits, None);
        }
    }
    assert!(!check.solve());
}

#[test]
fn stats_accumulate() {
    let mut s = solver_with_vars(2);
    assert!(add(&mut s, &[1, 2]));
    assert!(s.solve());
    assert!(s.stats().starts > 0);
}
