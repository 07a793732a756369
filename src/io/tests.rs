use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::formulas::Var;
use crate::io::{
    read_cnf, read_covers, read_groups, read_mcses, read_partition, read_y_clauses, ReadError,
};

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("unsatkit-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).expect("temp file must be writable");
    path
}

#[test]
fn dimacs_with_comments_and_blanks() {
    let path = temp_file(
        "good.cnf",
        "c a comment\n\np cnf 3 2\n1 -2 0\n\nc another\n-1 2 3 0\n",
    );
    let cnf = read_cnf(&path).unwrap();
    assert_eq!(cnf.num_vars(), 3);
    assert_eq!(cnf.num_clauses(), 2);
    assert_eq!(cnf.num_selectors(), 2);
    assert_eq!(cnf.clauses()[0], vec![Var(0).pos_lit(), Var(1).neg_lit()]);
    assert_eq!(cnf.clauses()[1], vec![Var(0).neg_lit(), Var(1).pos_lit(), Var(2).pos_lit()]);
}

#[test]
fn dimacs_rejects_bad_header() {
    let path = temp_file("badheader.cnf", "p dnf 3 2\n1 0\n");
    assert!(matches!(read_cnf(&path), Err(ReadError::Malformed { line: 1, .. })));
}

#[test]
fn dimacs_rejects_missing_header() {
    let path = temp_file("noheader.cnf", "1 -2 0\n");
    assert!(matches!(read_cnf(&path), Err(ReadError::Malformed { .. })));
}

#[test]
fn dimacs_rejects_out_of_range_literal() {
    let path = temp_file("range.cnf", "p cnf 2 1\n1 -3 0\n");
    assert!(matches!(read_cnf(&path), Err(ReadError::Malformed { line: 2, .. })));
}

#[test]
fn dimacs_rejects_unterminated_clause() {
    let path = temp_file("unterminated.cnf", "p cnf 2 1\n1 -2\n");
    assert!(matches!(read_cnf(&path), Err(ReadError::Malformed { line: 2, .. })));
}

#[test]
fn dimacs_reports_missing_file() {
    assert!(matches!(read_cnf(Path::new("/nonexistent/file.cnf")), Err(ReadError::Io { .. })));
}

#[test]
fn partition_groups_by_last_clause() {
    let path = temp_file("partition", "2\n5\n");
    let map = read_partition(&path, 5).unwrap();
    assert_eq!(map, crate::formulas::GroupMap::new(vec![0, 0, 1, 1, 1], 2));
}

#[test]
fn partition_must_cover_every_clause() {
    let path = temp_file("partition-short", "2\n");
    assert!(matches!(read_partition(&path, 5), Err(ReadError::Malformed { .. })));
}

#[test]
fn partition_rejects_out_of_range_split() {
    let path = temp_file("partition-far", "9\n");
    assert!(matches!(read_partition(&path, 5), Err(ReadError::Malformed { line: 1, .. })));
}

#[test]
fn groups_assign_selectors_per_line() {
    let path = temp_file("groups", "1 3\n2 4\n");
    let map = read_groups(&path, 4).unwrap();
    assert_eq!(map, crate::formulas::GroupMap::new(vec![0, 1, 0, 1], 2));
}

#[test]
fn groups_must_cover_every_clause() {
    let path = temp_file("groups-short", "1 3\n");
    assert!(matches!(read_groups(&path, 4), Err(ReadError::Malformed { .. })));
}

#[test]
fn groups_reject_zero_index() {
    let path = temp_file("groups-zero", "1 0\n");
    assert!(matches!(read_groups(&path, 4), Err(ReadError::Malformed { line: 1, .. })));
}

#[test]
fn y_clauses_are_zero_terminated() {
    let path = temp_file("yclauses", "1 -2 0 3 0\n");
    let clauses = read_y_clauses(&path, 3).unwrap();
    assert_eq!(clauses, vec![vec![1, -2], vec![3]]);
}

#[test]
fn unterminated_trailing_y_clause_is_dropped() {
    let path = temp_file("yclauses-tail", "1 -2 0 3\n");
    let clauses = read_y_clauses(&path, 3).unwrap();
    assert_eq!(clauses, vec![vec![1, -2]]);
}

#[test]
fn y_clauses_reject_out_of_range_selector() {
    let path = temp_file("yclauses-range", "4 0\n");
    assert!(matches!(read_y_clauses(&path, 3), Err(ReadError::Malformed { line: 1, .. })));
}

#[test]
fn mcses_are_one_based_on_disk() {
    let path = temp_file("mcses", "1\n3\n1 2\n");
    let mcses = read_mcses(&path, 3).unwrap();
    assert_eq!(mcses, vec![vec![0], vec![2], vec![0, 1]]);
}

#[test]
fn truncated_final_mcs_line_is_dropped() {
    let path = temp_file("mcses-truncated", "1 2\n2 3\n1\n");
    let mcses = read_mcses(&path, 3).unwrap();
    assert_eq!(mcses, vec![vec![0, 1], vec![1, 2]]);
}

#[test]
fn mcses_reject_zero_selector() {
    let path = temp_file("mcses-zero", "1 0\n");
    assert!(matches!(read_mcses(&path, 3), Err(ReadError::Malformed { line: 1, .. })));
}

#[test]
fn mcses_reject_out_of_range_selector() {
    let path = temp_file("mcses-range", "7\n");
    assert!(matches!(read_mcses(&path, 3), Err(ReadError::Malformed { line: 1, .. })));
}

#[test]
fn covers_split_off_singletons() {
    let input = Cursor::new("5\n1 2\n\n1 3\n");
    let (covers, singletons) = read_covers(input, Path::new("<test>")).unwrap();
    assert_eq!(covers, vec![BTreeSet::from([1, 2]), BTreeSet::from([1, 3])]);
    assert_eq!(singletons, vec![5]);
}

#[test]
fn covers_reject_garbage() {
    let input = Cursor::new("1 x\n");
    assert!(matches!(
        read_covers(input, Path::new("<test>")),
        Err(ReadError::Malformed { line: 1, .. })
    ));
}
