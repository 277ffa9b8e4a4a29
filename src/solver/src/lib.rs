#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub(crate) mod kociemba;
pub(crate) mod krof;
pub mod nibble;
pub mod pruning;
pub(crate) mod search;

use crate::pruning::{KociembaTables, KrofTables};
use cube_core::{CubeState, MalformedCube, Move};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

pub use crate::pruning::{TableId, TableLoadError, TableSaveError};

#[macro_export]
macro_rules! start {
    ($msg:expr) => {
        concat!("⏳ ", $msg)
    };
}

#[macro_export]
macro_rules! working {
    ($msg:expr) => {
        concat!("🛠  ", $msg)
    };
}

#[macro_export]
macro_rules! success {
    ($msg:expr) => {
        concat!("✅ ", $msg)
    };
}

pub const MAX_THREADS: usize = 32;

/// A solver could not be constructed as requested.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidConfig {
    #[error("thread count {0} outside 1..={MAX_THREADS}")]
    ThreadCount(usize),
    #[error("unknown algorithm {0:?}, expected \"kociemba\" or \"krof\"")]
    UnknownAlgorithm(String),
}

/// A solve request failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error(transparent)]
    Malformed(#[from] MalformedCube),
    /// Reserved: cannot occur for a validated 3x3x3 cube.
    #[error("no move sequence reaches the solved state")]
    Unsolvable,
}

/// The capability set both algorithms share: build or load pruning tables,
/// persist them, and solve cubes.
pub trait Solver: Send + Sync {
    /// Build all pruning tables in memory. Idempotent; a later `solve` on an
    /// uninitialized solver performs the same build.
    fn init(&mut self);

    /// Replace the tables with the set stored at `path`.
    ///
    /// # Errors
    ///
    /// [`TableLoadError`] when the file is absent or malformed; the solver
    /// keeps its previous tables and `init` remains available as a fallback.
    fn init_from(&mut self, path: &Path) -> Result<(), TableLoadError>;

    /// Serialize the current tables to `path`, building them first if
    /// needed.
    ///
    /// # Errors
    ///
    /// [`TableSaveError`] on any I/O failure.
    fn save(&self, path: &Path) -> Result<(), TableSaveError>;

    /// Find a move sequence that solves `cube`. The result is canonical: no
    /// two consecutive moves share a face and every turn count is 1–3.
    ///
    /// # Errors
    ///
    /// [`SolveError::Malformed`] when the cube violates a reachability
    /// invariant.
    fn solve(&self, cube: CubeState) -> Result<Vec<Move>, SolveError>;
}

fn check_threads(threads: usize) -> Result<usize, InvalidConfig> {
    if (1..=MAX_THREADS).contains(&threads) {
        Ok(threads)
    } else {
        Err(InvalidConfig::ThreadCount(threads))
    }
}

/// The two-phase solver: short solutions, small tables.
pub struct Kociemba {
    threads: usize,
    tables: OnceLock<KociembaTables>,
}

impl Kociemba {
    /// # Errors
    ///
    /// [`InvalidConfig::ThreadCount`] for thread counts outside
    /// `1..=MAX_THREADS`.
    pub fn new(threads: usize) -> Result<Kociemba, InvalidConfig> {
        Ok(Kociemba {
            threads: check_threads(threads)?,
            tables: OnceLock::new(),
        })
    }

    fn tables(&self) -> &KociembaTables {
        self.tables
            .get_or_init(|| KociembaTables::build(self.threads))
    }
}

impl Solver for Kociemba {
    fn init(&mut self) {
        self.tables();
    }

    fn init_from(&mut self, path: &Path) -> Result<(), TableLoadError> {
        let loaded = KociembaTables::load(path)?;
        let lock = OnceLock::new();
        let _ = lock.set(loaded);
        self.tables = lock;
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<(), TableSaveError> {
        self.tables().save(path)
    }

    fn solve(&self, cube: CubeState) -> Result<Vec<Move>, SolveError> {
        cube.validate()?;
        Ok(kociemba::solve(self.tables(), cube, self.threads))
    }
}

/// The single-phase optimal solver: large pattern databases, minimal
/// solutions.
pub struct Krof {
    threads: usize,
    tables: OnceLock<KrofTables>,
}

impl Krof {
    /// # Errors
    ///
    /// [`InvalidConfig::ThreadCount`] for thread counts outside
    /// `1..=MAX_THREADS`.
    pub fn new(threads: usize) -> Result<Krof, InvalidConfig> {
        Ok(Krof {
            threads: check_threads(threads)?,
            tables: OnceLock::new(),
        })
    }

    fn tables(&self) -> &KrofTables {
        self.tables.get_or_init(|| KrofTables::build(self.threads))
    }
}

impl Solver for Krof {
    fn init(&mut self) {
        self.tables();
    }

    fn init_from(&mut self, path: &Path) -> Result<(), TableLoadError> {
        let loaded = KrofTables::load(path)?;
        let lock = OnceLock::new();
        let _ = lock.set(loaded);
        self.tables = lock;
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<(), TableSaveError> {
        self.tables().save(path)
    }

    fn solve(&self, cube: CubeState) -> Result<Vec<Move>, SolveError> {
        cube.validate()?;
        Ok(krof::solve(self.tables(), cube, self.threads))
    }
}

/// # Errors
///
/// [`InvalidConfig::ThreadCount`] for thread counts outside
/// `1..=MAX_THREADS`.
pub fn new_kociemba(threads: usize) -> Result<Kociemba, InvalidConfig> {
    Kociemba::new(threads)
}

/// # Errors
///
/// [`InvalidConfig::ThreadCount`] for thread counts outside
/// `1..=MAX_THREADS`.
pub fn new_krof(threads: usize) -> Result<Krof, InvalidConfig> {
    Krof::new(threads)
}

/// Construct a solver by algorithm name (`"kociemba"` or `"krof"`).
///
/// # Errors
///
/// [`InvalidConfig`] for an unknown name or a thread count outside
/// `1..=MAX_THREADS`.
pub fn new_solver(algorithm: &str, threads: usize) -> Result<Box<dyn Solver>, InvalidConfig> {
    match algorithm {
        "kociemba" => Ok(Box::new(Kociemba::new(threads)?)),
        "krof" => Ok(Box::new(Krof::new(threads)?)),
        other => Err(InvalidConfig::UnknownAlgorithm(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_validates_thread_counts() {
        assert!(matches!(
            Kociemba::new(0),
            Err(InvalidConfig::ThreadCount(0))
        ));
        assert!(matches!(
            Krof::new(33),
            Err(InvalidConfig::ThreadCount(33))
        ));
        assert!(Kociemba::new(1).is_ok());
        assert!(Krof::new(MAX_THREADS).is_ok());
    }

    #[test]
    fn factory_rejects_unknown_algorithms() {
        assert!(matches!(
            new_solver("thistlethwaite", 4),
            Err(InvalidConfig::UnknownAlgorithm(_))
        ));
        assert!(new_solver("kociemba", 4).is_ok());
        assert!(new_solver("krof", 4).is_ok());
    }
}
