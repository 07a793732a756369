//! Readers for the line-oriented input formats.
//!
//! All readers report malformed input with the file and line it occurred
//! on; none of them panic.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::formulas::{Cnf, GroupMap, Lit, Var};

/// An error while reading one of the input files.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The file could not be opened or read.
    #[error("could not read {path}: {source}")]
    Io {
        /// The offending file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file contents violate the expected format.
    #[error("{path}:{line}: {message}")]
    Malformed {
        /// The offending file.
        path: String,
        /// The 1-based offending line.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

impl ReadError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io { path: path.display().to_string(), source }
    }

    fn malformed(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Self::Malformed { path: path.display().to_string(), line, message: message.into() }
    }
}

fn open_lines(path: &Path) -> Result<impl Iterator<Item = io::Result<String>>, ReadError> {
    let file = File::open(path).map_err(|e| ReadError::io(path, e))?;
    Ok(BufReader::new(file).lines())
}

/// Reads a DIMACS CNF file.
///
/// Lines starting with `c` are comments, the `p cnf V N` header declares the
/// variable count, and every other non-blank line is one clause terminated
/// by `0`. The clause count of the header is not enforced.
pub fn read_cnf(path: &Path) -> Result<Cnf, ReadError> {
    let mut num_vars: Option<usize> = None;
    let mut clauses: Vec<Vec<Lit>> = Vec::new();

    for (index, line) in open_lines(path)?.enumerate() {
        let line = line.map_err(|e| ReadError::io(path, e))?;
        let line_no = index + 1;
        if line.starts_with('c') || line.trim().is_empty() {
            continue;
        }
        if line.starts_with('p') {
            let mut tokens = line.split_ascii_whitespace();
            if tokens.next() != Some("p") || tokens.next() != Some("cnf") {
                return Err(ReadError::malformed(path, line_no, format!("invalid header: {line}")));
            }
            let vars = tokens
                .next()
                .and_then(|t| t.parse::<usize>().ok())
                .ok_or_else(|| ReadError::malformed(path, line_no, format!("invalid header: {line}")))?;
            tokens
                .next()
                .and_then(|t| t.parse::<usize>().ok())
                .ok_or_else(|| ReadError::malformed(path, line_no, format!("invalid header: {line}")))?;
            num_vars = Some(vars);
            continue;
        }
        let vars = num_vars
            .ok_or_else(|| ReadError::malformed(path, line_no, "clause before 'p cnf' header"))?;
        let mut clause = Vec::new();
        let mut terminated = false;
        for token in line.split_ascii_whitespace() {
            let parsed: i64 = token
                .parse()
                .map_err(|_| ReadError::malformed(path, line_no, format!("invalid clause: {line}")))?;
            if parsed == 0 {
                terminated = true;
                break;
            }
            let magnitude = parsed.unsigned_abs() as usize;
            if magnitude > vars {
                return Err(ReadError::malformed(
                    path,
                    line_no,
                    format!("variable {parsed} out of range in: {line}"),
                ));
            }
            let var = Var(magnitude - 1);
            clause.push(if parsed > 0 { var.pos_lit() } else { var.neg_lit() });
        }
        if !terminated {
            return Err(ReadError::malformed(path, line_no, format!("clause not terminated by 0: {line}")));
        }
        clauses.push(clause);
    }

    let vars = num_vars.ok_or_else(|| ReadError::malformed(path, 1, "missing 'p cnf' header"))?;
    Ok(Cnf::new(vars, clauses))
}

/// Reads a partition file: one integer per line, each the 1-based index of
/// the last clause of the partition it closes.
pub fn read_partition(path: &Path, num_clauses: usize) -> Result<GroupMap, ReadError> {
    let mut map = Vec::new();
    let mut groups = 0;
    let mut current = 1usize;

    for (index, line) in open_lines(path)?.enumerate() {
        let line = line.map_err(|e| ReadError::io(path, e))?;
        let line_no = index + 1;
        for token in line.split_ascii_whitespace() {
            let split: usize = token
                .parse()
                .map_err(|_| ReadError::malformed(path, line_no, format!("invalid partition entry: {token}")))?;
            if split > num_clauses {
                return Err(ReadError::malformed(
                    path,
                    line_no,
                    format!("partition entry {split} exceeds the clause count {num_clauses}"),
                ));
            }
            while current <= split {
                map.push(groups);
                current += 1;
            }
            groups += 1;
        }
    }

    if map.len() != num_clauses {
        return Err(ReadError::malformed(
            path,
            1,
            format!("partition covers {} of {num_clauses} clauses", map.len()),
        ));
    }
    Ok(GroupMap::new(map, groups))
}

/// Reads a group file: every line lists the 1-based clause indices of one
/// group. Every clause must be covered; a clause listed twice keeps its
/// last group.
pub fn read_groups(path: &Path, num_clauses: usize) -> Result<GroupMap, ReadError> {
    let mut map: Vec<Option<usize>> = vec![None; num_clauses];
    let mut groups = 0;

    for (index, line) in open_lines(path)?.enumerate() {
        let line = line.map_err(|e| ReadError::io(path, e))?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        for token in line.split_ascii_whitespace() {
            let clause: usize = token
                .parse()
                .map_err(|_| ReadError::malformed(path, line_no, format!("invalid group file line: {line}")))?;
            if clause == 0 || clause > num_clauses {
                return Err(ReadError::malformed(
                    path,
                    line_no,
                    format!("invalid clause index {clause} in line: {line}"),
                ));
            }
            map[clause - 1] = Some(groups);
        }
        groups += 1;
    }

    let map = map
        .into_iter()
        .enumerate()
        .map(|(i, g)| g.ok_or_else(|| ReadError::malformed(path, 1, format!("clause {} is in no group", i + 1))))
        .collect::<Result<Vec<usize>, ReadError>>()?;
    Ok(GroupMap::new(map, groups))
}

/// Reads extra clauses over the selector variables: a DIMACS-like clause
/// list without header or comments, each clause terminated by `0`. An
/// unterminated trailing clause is dropped.
pub fn read_y_clauses(path: &Path, num_selectors: usize) -> Result<Vec<Vec<i64>>, ReadError> {
    let mut clauses = Vec::new();
    let mut clause = Vec::new();

    for (index, line) in open_lines(path)?.enumerate() {
        let line = line.map_err(|e| ReadError::io(path, e))?;
        let line_no = index + 1;
        for token in line.split_ascii_whitespace() {
            let lit: i64 = token
                .parse()
                .map_err(|_| ReadError::malformed(path, line_no, format!("invalid selector literal: {token}")))?;
            if lit == 0 {
                clauses.push(std::mem::take(&mut clause));
            } else {
                if lit.unsigned_abs() as usize > num_selectors {
                    return Err(ReadError::malformed(
                        path,
                        line_no,
                        format!("selector {lit} out of range (the formula has {num_selectors} selectors)"),
                    ));
                }
                clause.push(lit);
            }
        }
    }
    Ok(clauses)
}

/// Reads the MCSes of a previous run: one MCS per line as space-separated
/// 1-based selector indices, in non-decreasing order of size. The last line
/// of an interrupted run may be truncated; a line shorter than its
/// predecessor is therefore dropped together with everything after it.
pub fn read_mcses(path: &Path, num_selectors: usize) -> Result<Vec<Vec<usize>>, ReadError> {
    let mut mcses = Vec::new();
    let mut size = 0;

    for (index, line) in open_lines(path)?.enumerate() {
        let line = line.map_err(|e| ReadError::io(path, e))?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let mut mcs = Vec::new();
        for token in line.split_ascii_whitespace() {
            let selector: usize = token
                .parse()
                .map_err(|_| ReadError::malformed(path, line_no, format!("invalid selector index: {token}")))?;
            if selector == 0 || selector > num_selectors {
                return Err(ReadError::malformed(
                    path,
                    line_no,
                    format!("invalid selector index {selector} in line: {line}"),
                ));
            }
            mcs.push(selector - 1);
        }
        if mcs.len() < size {
            break;
        }
        size = mcs.len();
        mcses.push(mcs);
    }
    Ok(mcses)
}

/// Reads MUS covers (the output of the MCS enumeration) from a reader:
/// every line is one cover of raw selector numbers. Singleton covers are
/// split off, since their selector belongs to every MUS.
pub fn read_covers<R: BufRead>(
    reader: R,
    source: &Path,
) -> Result<(Vec<BTreeSet<usize>>, Vec<usize>), ReadError> {
    let mut covers = Vec::new();
    let mut singletons = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ReadError::io(source, e))?;
        let line_no = index + 1;
        let mut cover = BTreeSet::new();
        for token in line.split_ascii_whitespace() {
            let selector: usize = token
                .parse()
                .map_err(|_| ReadError::malformed(source, line_no, format!("invalid cover entry: {token}")))?;
            cover.insert(selector);
        }
        match cover.len() {
            0 => {}
            1 => singletons.push(cover.into_iter().next().expect("len checked")),
            _ => covers.push(cover),
        }
    }
    Ok((covers, singletons))
}
