use std::collections::BTreeSet;

use crate::formulas::{Cnf, GroupMap, Lit, Var};
use crate::mcs::{McsConfig, McsFinder, RawOutcome};

fn cnf(num_vars: usize, clauses: &[&[i64]]) -> Cnf {
    let parsed: Vec<Vec<Lit>> = clauses
        .iter()
        .map(|clause| {
            clause
                .iter()
                .map(|&l| {
                    let var = Var(l.unsigned_abs() as usize - 1);
                    if l > 0 { var.pos_lit() } else { var.neg_lit() }
                })
                .collect()
        })
        .collect();
    Cnf::new(num_vars, parsed)
}

fn run(cnf: &Cnf, config: McsConfig) -> (Vec<BTreeSet<usize>>, Vec<u8>) {
    let mut finder = McsFinder::new(cnf, config);
    let mut out = Vec::new();
    finder.find_mcses(&mut out).expect("writing to a vector cannot fail");
    (parse_lines(&out), out)
}

fn parse_lines(out: &[u8]) -> Vec<BTreeSet<usize>> {
    String::from_utf8_lossy(out)
        .lines()
        .map(|line| line.split_ascii_whitespace().map(|t| t.parse().unwrap()).collect())
        .collect()
}

fn as_set(mcses: &[BTreeSet<usize>]) -> BTreeSet<BTreeSet<usize>> {
    mcses.iter().cloned().collect()
}

fn sets(families: &[&[usize]]) -> BTreeSet<BTreeSet<usize>> {
    families.iter().map(|mcs| mcs.iter().copied().collect()).collect()
}

#[test]
fn contradicting_units() {
    let f = cnf(1, &[&[1], &[-1]]);
    let (mcses, _) = run(&f, McsConfig::default());
    assert_eq!(as_set(&mcses), sets(&[&[1], &[2]]));
}

#[test]
fn implication_chain_has_singleton_mcses() {
    let f = cnf(3, &[&[1], &[-1, 2], &[-2, 3], &[-3]]);
    let (mcses, _) = run(&f, McsConfig::default());
    assert_eq!(as_set(&mcses), sets(&[&[1], &[2], &[3], &[4]]));
}

#[test]
fn two_contradicting_pairs() {
    let f = cnf(2, &[&[1], &[-1], &[2], &[-2]]);
    let (mcses, _) = run(&f, McsConfig::default());
    assert_eq!(as_set(&mcses), sets(&[&[1, 3], &[1, 4], &[2, 3], &[2, 4]]));
}

#[test]
fn units_with_binary_conflict() {
    let f = cnf(2, &[&[1], &[2], &[-1, -2]]);
    let (mcses, _) = run(&f, McsConfig::default());
    assert_eq!(as_set(&mcses), sets(&[&[1], &[2], &[3]]));
}

#[test]
fn emission_is_non_decreasing_in_size() {
    let f = cnf(2, &[&[1], &[-1], &[2], &[-2], &[1, 2]]);
    let (mcses, _) = run(&f, McsConfig::default());
    for pair in mcses.windows(2) {
        assert!(pair[0].len() <= pair[1].len());
    }
}

#[test]
fn max_sat_stops_after_a_minimum_mcs() {
    let f = cnf(2, &[&[1], &[-1], &[2], &[-2]]);
    let config = McsConfig { max_sat: true, ..McsConfig::default() };
    let (mcses, _) = run(&f, config);
    assert_eq!(mcses.len(), 1);
    assert_eq!(mcses[0].len(), 2);

    let f = cnf(2, &[&[1], &[2], &[-1, -2]]);
    let config = McsConfig { max_sat: true, ..McsConfig::default() };
    let (mcses, _) = run(&f, config);
    assert_eq!(mcses.len(), 1);
    assert_eq!(mcses[0].len(), 1);
}

#[test]
fn disabling_cores_finds_the_same_mcses() {
    let f = cnf(2, &[&[1], &[-1], &[2], &[-2]]);
    let (with_cores, _) = run(&f, McsConfig::default());
    let config = McsConfig { use_cores: false, ..McsConfig::default() };
    let (without_cores, _) = run(&f, config);
    assert_eq!(as_set(&with_cores), as_set(&without_cores));
}

#[test]
fn bound_increment_two_grows_models_back_to_minimality() {
    let f = cnf(2, &[&[1], &[-1], &[2], &[-2]]);
    let config = McsConfig { bound_increment: 2, initial_bound: 2, ..McsConfig::default() };
    let (mcses, _) = run(&f, config);
    assert_eq!(as_set(&mcses), sets(&[&[1, 3], &[1, 4], &[2, 3], &[2, 4]]));
}

#[test]
fn satisfiable_formula_yields_one_empty_correction_set() {
    let f = cnf(2, &[&[1], &[1, 2]]);
    let (mcses, out) = run(&f, McsConfig::default());
    assert_eq!(mcses, vec![BTreeSet::new()]);
    assert_eq!(out, b"\n".to_vec());
}

#[test]
fn truncation_to_single_clauses_builds_one_mus() {
    let f = cnf(2, &[&[1], &[-1], &[2], &[-2]]);
    let config = McsConfig { size_limit: 1, ..McsConfig::default() };
    let (pcses, _) = run(&f, config);
    let union: BTreeSet<usize> = pcses.iter().flatten().copied().collect();
    assert!(pcses.iter().all(|pcs| pcs.len() == 1));
    assert!(union == BTreeSet::from([1, 2]) || union == BTreeSet::from([3, 4]));
}

#[test]
fn grouped_clauses_correct_as_one_unit() {
    let mut f = cnf(2, &[&[1], &[-1], &[2], &[-2]]);
    // clauses 1+2 form group 1, clauses 3+4 group 2
    f.set_group_map(GroupMap::new(vec![0, 0, 1, 1], 2));
    let (mcses, _) = run(&f, McsConfig::default());
    assert_eq!(as_set(&mcses), sets(&[&[1, 2]]));
}

#[test]
fn singleton_groups_match_ungrouped_behaviour() {
    let ungrouped = cnf(2, &[&[1], &[-1], &[2], &[-2]]);
    let mut grouped = cnf(2, &[&[1], &[-1], &[2], &[-2]]);
    grouped.set_group_map(GroupMap::new(vec![0, 1, 2, 3], 4));
    let (plain, _) = run(&ungrouped, McsConfig::default());
    let (with_groups, _) = run(&grouped, McsConfig::default());
    assert_eq!(as_set(&plain), as_set(&with_groups));
}

#[test]
fn y_clauses_restrict_the_correction_sets() {
    let mut f = cnf(1, &[&[1], &[-1]]);
    // selector 1 must stay active, so only clause 2 can be corrected
    f.set_y_clauses(vec![vec![1]]);
    let (mcses, _) = run(&f, McsConfig::default());
    assert_eq!(as_set(&mcses), sets(&[&[2]]));
}

#[test]
fn resume_reports_nothing_more_to_find() {
    let f = cnf(2, &[&[1], &[-1], &[2], &[-2]]);
    let (mcses, _) = run(&f, McsConfig::default());

    let mut resumed = McsFinder::new(&f, McsConfig::default());
    resumed.load_previous(mcses.iter().map(|m| m.iter().map(|y| y - 1).collect()).collect());
    assert!(!resumed.check_for_more());
}

#[test]
fn partial_resume_finds_the_remaining_mcses() {
    let f = cnf(3, &[&[1], &[-1, 2], &[-2, 3], &[-3]]);
    let (all, _) = run(&f, McsConfig::default());

    let partial: Vec<Vec<usize>> =
        all.iter().take(2).map(|m| m.iter().map(|y| y - 1).collect()).collect();
    let mut resumed = McsFinder::new(&f, McsConfig::default());
    resumed.load_previous(partial);
    assert!(resumed.check_for_more());
    let mut out = Vec::new();
    resumed.find_mcses(&mut out).expect("writing to a vector cannot fail");

    let mut recovered = as_set(&parse_lines(&out));
    recovered.extend(all.iter().take(2).cloned());
    assert_eq!(recovered, as_set(&all));
}

#[test]
fn raw_solving_classifies_instances() {
    let sat = cnf(1, &[&[1]]);
    let finder = McsFinder::new(&sat, McsConfig::default());
    assert_eq!(finder.solve_raw(None, None, false), RawOutcome::Sat);

    let early = cnf(1, &[&[1], &[-1]]);
    let finder = McsFinder::new(&early, McsConfig::default());
    assert_eq!(finder.solve_raw(None, None, false), RawOutcome::UnsatEarly);
}

#[test]
fn single_core_names_an_unsatisfiable_subset() {
    let f = cnf(3, &[&[1], &[-1, 2], &[-2, 3], &[-3]]);
    let finder = McsFinder::new(&f, McsConfig::default());
    assert_eq!(finder.single_core(), BTreeSet::from([1, 2, 3, 4]));
}

#[test]
fn core_intersection_of_a_single_contradiction() {
    let f = cnf(2, &[&[1], &[-1], &[1, 2]]);
    let finder = McsFinder::new(&f, McsConfig::default());
    assert_eq!(finder.core_intersection(), BTreeSet::from([1, 2]));
}

#[test]
fn disjoint_cores_of_independent_contradictions() {
    let f = cnf(2, &[&[1], &[-1], &[2], &[-2]]);
    let finder = McsFinder::new(&f, McsConfig::default());
    let (union, count) = finder.disjoint_cores();
    assert_eq!(count, 2);
    assert_eq!(union, BTreeSet::from([1, 2, 3, 4]));
}
