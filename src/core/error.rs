use thiserror::Error;

/// Aggregate population counts attached to bookkeeping faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopulationCounts {
    pub free_f: usize,
    pub free_s: usize,
    pub atoms_on_f: usize,
    pub atoms_on_s: usize,
}

impl std::fmt::Display for PopulationCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "free F={} free S={} atoms on F={} atoms on S={}",
            self.free_f, self.free_s, self.atoms_on_f, self.atoms_on_s
        )
    }
}

/// Unified error type for the simulator and its collaborators.
#[derive(Error, Debug)]
pub enum KmcError {
    /// Rejected run configuration (checked before the engine starts).
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("site ({x}, {y}) is already occupied")]
    SiteOccupied { x: usize, y: usize },

    #[error("site ({x}, {y}) is already free")]
    SiteFree { x: usize, y: usize },

    #[error("coordinate ({x}, {y}) lies outside the lattice")]
    OutOfBounds { x: usize, y: usize },

    #[error("atom {0} is not on the surface")]
    UnknownAtom(u64),

    /// A propensity implied a non-empty pool but the pool was empty.
    #[error("pool '{0}' is empty")]
    EmptyPool(&'static str),

    #[error("site ({x}, {y}) has no in-bounds neighbour")]
    NoNeighbour { x: usize, y: usize },

    /// Internal-consistency fault with the engine state at the time of failure.
    #[error("bookkeeping fault at step {step} ({counts}): {source}")]
    Bookkeeping {
        step: u64,
        counts: PopulationCounts,
        #[source]
        source: Box<KmcError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Report error: {0}")]
    Report(String),
}

impl KmcError {
    pub fn config(message: impl Into<String>) -> Self {
        KmcError::Config(message.into())
    }

    /// True for faults that mean the lattice/registry bookkeeping diverged.
    pub fn is_bookkeeping(&self) -> bool {
        matches!(
            self,
            KmcError::SiteOccupied { .. }
                | KmcError::SiteFree { .. }
                | KmcError::OutOfBounds { .. }
                | KmcError::UnknownAtom(_)
                | KmcError::EmptyPool(_)
                | KmcError::NoNeighbour { .. }
                | KmcError::Bookkeeping { .. }
        )
    }
}

pub type KmcResult<T> = Result<T, KmcError>;
