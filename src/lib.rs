#![doc = include_str!("../README.md")]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]
#![allow(
    clippy::similar_names,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]

/// Installation of CNF formulae onto solvers, with and without selector
/// variables.
pub mod assembly;
/// CNF encoding of cardinality constraints.
pub mod cardinality;
mod collections;
/// Types for literals, clauses and CNF formulae.
pub mod formulas;
/// Readers for the input formats.
pub mod io;
/// Enumeration of minimal correction subsets.
pub mod mcs;
/// Construction of minimal unsatisfiable subsets from correction subsets.
pub mod mus;
/// The incremental SAT solver underlying the enumeration engines.
pub mod solver;
