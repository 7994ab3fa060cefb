use serde::{Deserialize, Serialize};

use crate::core::domain::PhysicalConstants;

/// Gas constant, J/(mol·K).
pub const GAS_CONSTANT: f64 = 8.31;

/// Boltzmann factor `exp(-E / (R T))` for an activation energy in J/mol.
#[inline]
pub fn boltzmann(energy: f64, temperature: f64) -> f64 {
    (-energy / (GAS_CONSTANT * temperature)).exp()
}

/// Rate constants of the elementary surface processes.
///
/// Computed once per run from the temperature and the physical constants,
/// immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateModel {
    pub temperature: f64,
    /// Impingement flux of gas atoms onto the surface.
    pub atom_flux: f64,
    /// Adsorption attempt rate per site: flux / (F density + S density).
    pub adsorption_rate: f64,
    pub desorption_rate: f64,
    pub diffusion_rate: f64,
    /// Er recombination at an S-centre.
    pub recombination_rate_s: f64,
    /// Lh recombination of a diffusing atom with an S-bound partner.
    pub lh_rate_s: f64,
    /// Lh recombination of two F-bound atoms.
    pub lh_rate_f: f64,
    /// Acceptance threshold for a diffusion collision at an S-site.
    pub recombination_probability_s: f64,
    /// Acceptance threshold for a diffusion collision at an F-site.
    pub recombination_probability_f: f64,
    /// F + S site density the adsorption rates are normalised by.
    pub site_density: f64,
}

impl RateModel {
    pub fn new(consts: &PhysicalConstants, temperature: f64) -> Self {
        let atom_flux = atom_flux(consts, temperature);
        let site_density = consts.f_density + consts.s_density();
        let adsorption_rate = atom_flux / site_density;
        let diffusion_rate = boltzmann(consts.edif, temperature) * consts.vdif;

        Self {
            temperature,
            atom_flux,
            adsorption_rate,
            desorption_rate: boltzmann(consts.edes, temperature) * consts.vdes,
            diffusion_rate,
            recombination_rate_s: boltzmann(consts.er, temperature) * adsorption_rate,
            lh_rate_s: boltzmann(consts.er, temperature) * diffusion_rate,
            lh_rate_f: boltzmann(consts.erlh, temperature) * diffusion_rate,
            recombination_probability_s: boltzmann(consts.er, temperature),
            recombination_probability_f: boltzmann(consts.erlh, temperature),
            site_density,
        }
    }
}

/// Kinetic-theory impingement flux: a quarter of the mean thermal speed
/// times the gas density.
fn atom_flux(consts: &PhysicalConstants, temperature: f64) -> f64 {
    let mean_speed =
        ((8.0 * 1.38 * 10e-23 * temperature) / (std::f64::consts::PI * consts.mass)).sqrt() * 10e+2;
    0.25 * mean_speed * consts.gas_density
}
