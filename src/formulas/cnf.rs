use crate::formulas::{Lit, Var};

/// A clause-to-selector grouping: `map[i]` is the selector index of clause
/// `i`, `groups` the number of distinct selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMap {
    pub(crate) map: Vec<usize>,
    pub(crate) groups: usize,
}

impl GroupMap {
    /// Constructs a group map from a clause-index-to-selector vector.
    pub fn new(map: Vec<usize>, groups: usize) -> Self {
        debug_assert!(map.iter().all(|&g| g < groups));
        Self { map, groups }
    }
}

/// A CNF formula in its parsed form, together with the clause-to-selector
/// structure the enumeration engines work on.
///
/// Clauses are immutable after construction. In the default (ungrouped) mode
/// every clause has its own selector; [`Cnf::set_group_map`] collapses groups
/// of clauses onto shared selectors. Extra clauses over the selector space
/// (as signed 1-based selector numbers) can be attached with
/// [`Cnf::set_y_clauses`].
#[derive(Debug, Clone)]
pub struct Cnf {
    num_vars: usize,
    clauses: Vec<Vec<Lit>>,
    group_map: Option<GroupMap>,
    y_clauses: Vec<Vec<i64>>,
}

impl Cnf {
    /// Constructs a formula over `num_vars` variables from its clause list.
    pub fn new(num_vars: usize, clauses: Vec<Vec<Lit>>) -> Self {
        debug_assert!(clauses.iter().flatten().all(|lit| lit.var().0 < num_vars));
        Self { num_vars, clauses, group_map: None, y_clauses: Vec::new() }
    }

    /// Number of original variables.
    pub const fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Number of clauses.
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Number of selectors (one per clause unless a group map is set).
    pub fn num_selectors(&self) -> usize {
        self.group_map.as_ref().map_or_else(|| self.clauses.len(), |gm| gm.groups)
    }

    /// The clauses of the formula.
    pub fn clauses(&self) -> &[Vec<Lit>] {
        &self.clauses
    }

    /// The selector index of clause `i`.
    pub fn selector_of(&self, i: usize) -> usize {
        self.group_map.as_ref().map_or(i, |gm| gm.map[i])
    }

    /// The solver variable carrying the selector `y`.
    pub const fn selector_var(&self, y: usize) -> Var {
        Var(self.num_vars + y)
    }

    /// Installs a clause-to-selector grouping. The map must cover every
    /// clause of the formula.
    pub fn set_group_map(&mut self, group_map: GroupMap) {
        debug_assert_eq!(group_map.map.len(), self.clauses.len());
        self.group_map = Some(group_map);
    }

    /// Attaches extra constraints over the selector variables, each given as
    /// signed 1-based selector numbers.
    pub fn set_y_clauses(&mut self, y_clauses: Vec<Vec<i64>>) {
        debug_assert!(
            y_clauses.iter().flatten().all(|&l| l != 0 && l.unsigned_abs() as usize <= self.num_selectors())
        );
        self.y_clauses = y_clauses;
    }

    /// The extra constraints over the selector variables.
    pub fn y_clauses(&self) -> &[Vec<i64>] {
        &self.y_clauses
    }
}
