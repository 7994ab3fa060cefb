use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{KmcError, KmcResult};

// --- Lattice Types ---

pub type AtomId = u64;
pub type SiteId = usize;

/// The two binding-site kinds of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteKind {
    /// High-density regular sites.
    F,
    /// Sparse active sites.
    S,
}

impl SiteKind {
    pub fn label(self) -> &'static str {
        match self {
            SiteKind::F => "F",
            SiteKind::S => "S",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// A single binding site. Kind is fixed at lattice construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    pub id: SiteId,
    pub coord: Coord,
    pub kind: SiteKind,
    pub is_free: bool,
    pub atom: Option<AtomId>,
}

/// An adsorbed atom. Identities are never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atom {
    pub id: AtomId,
    pub coord: Coord,
    pub kind: SiteKind,
}

impl Atom {
    pub fn relocate(&mut self, coord: Coord, kind: SiteKind) {
        self.coord = coord;
        self.kind = kind;
    }
}

// --- Ledger Schema ---

/// Column headers of the snapshot ledger, in write order.
pub const LEDGER_COLUMNS: [&str; 11] = [
    "Step N",
    "Simulation time",
    "Qty atoms on surface",
    "Qty adsorbed atoms",
    "Qty desorbed atoms",
    "Surface coverage",
    "Density F",
    "Density S",
    "Recomb Er",
    "Recomb Lh F",
    "Recomb Lh S",
];

// --- Configuration Types ---

/// One line chart of the final report: `y_axis` plotted against `x_axis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotSpec {
    pub x_axis: String,
    pub y_axis: String,
}

impl PlotSpec {
    pub fn new(x_axis: &str, y_axis: &str) -> Self {
        Self {
            x_axis: x_axis.to_string(),
            y_axis: y_axis.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationParams {
    /// Percentage of the total steps between two ledger rows.
    pub log_percent: f64,
    pub matrix_len_x: usize,
    pub matrix_len_y: usize,
    /// Decimals kept for floats written to the ledger.
    pub float_precision: u32,
    pub graphics_to_plot: Vec<PlotSpec>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            log_percent: 1.0,
            matrix_len_x: 100,
            matrix_len_y: 100,
            float_precision: 10,
            graphics_to_plot: vec![
                PlotSpec::new("Simulation time", "Surface coverage"),
                PlotSpec::new("Simulation time", "Density F"),
                PlotSpec::new("Simulation time", "Density S"),
            ],
        }
    }
}

impl SimulationParams {
    /// Number of ticks between two snapshots (never zero).
    pub fn snapshot_interval(&self, steps: u64) -> u64 {
        ((steps as f64 * self.log_percent / 100.0).floor() as u64).max(1)
    }
}

/// Physical constants feeding the rate model. Energies in J/mol,
/// frequencies in 1/s, densities per cm².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicalConstants {
    /// Mass of a gas atom (kg).
    pub mass: f64,
    /// Activation energy of thermal desorption.
    pub edes: f64,
    /// Activation energy of diffusion.
    pub edif: f64,
    pub vdes: f64,
    pub vdif: f64,
    /// Activation energy of recombination at an S-centre.
    pub er: f64,
    /// Activation energy of recombination between two F-bound atoms.
    pub erlh: f64,
    pub f_density: f64,
    /// Fraction of sites that are S-kind.
    pub fi: f64,
    pub gas_density: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            mass: 14.0 * 1.67 * 1e-27, // nitrogen
            edes: 51000.0,
            edif: 25500.0,
            vdes: 1e15,
            vdif: 1e13,
            er: 14000.0,
            erlh: 0.0,
            f_density: 1.5e15,
            fi: 0.002,
            gas_density: 10e15,
        }
    }
}

impl PhysicalConstants {
    pub fn s_density(&self) -> f64 {
        self.f_density * self.fi
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulating: SimulationParams,
    pub consts: PhysicalConstants,
}

impl Config {
    pub fn load(path: &Path) -> KmcResult<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Rejects configurations the engine cannot run.
    pub fn validate(&self, temperature: f64, steps: u64) -> KmcResult<()> {
        let s = &self.simulating;
        let c = &self.consts;

        if s.matrix_len_x == 0 || s.matrix_len_y == 0 {
            return Err(KmcError::config("lattice dimensions must be positive"));
        }
        if s.matrix_len_x.saturating_mul(s.matrix_len_y) < 2 {
            return Err(KmcError::config("lattice needs at least two sites"));
        }
        if !(0.0..=1.0).contains(&c.fi) {
            return Err(KmcError::config(format!("S-site fraction {} outside [0, 1]", c.fi)));
        }
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(KmcError::config(format!("temperature must be positive, got {temperature}")));
        }
        if steps == 0 {
            return Err(KmcError::config("step count must be positive"));
        }
        if !(s.log_percent > 0.0 && s.log_percent <= 100.0) {
            return Err(KmcError::config(format!("logPercent {} outside (0, 100]", s.log_percent)));
        }
        if s.float_precision > 15 {
            return Err(KmcError::config("floatPrecision above 15 decimals"));
        }

        let positive = [
            ("mass", c.mass),
            ("vdes", c.vdes),
            ("vdif", c.vdif),
            ("fDensity", c.f_density),
            ("gasDensity", c.gas_density),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(KmcError::config(format!("{name} must be positive, got {value}")));
            }
        }
        for (name, value) in [("edes", c.edes), ("edif", c.edif), ("er", c.er), ("erlh", c.erlh)] {
            if !value.is_finite() {
                return Err(KmcError::config(format!("{name} must be finite")));
            }
        }

        for plot in &s.graphics_to_plot {
            for axis in [&plot.x_axis, &plot.y_axis] {
                if !LEDGER_COLUMNS.contains(&axis.as_str()) {
                    return Err(KmcError::config(format!("unknown ledger column '{axis}'")));
                }
            }
        }
        Ok(())
    }
}
