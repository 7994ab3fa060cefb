use crate::core::chemistry::RateModel;
use crate::core::domain::SiteKind;
use crate::core::lattice::Lattice;
use crate::engine::registry::SurfaceAtomRegistry;

/// Smallest draw used in place of an exact zero, keeping `ln(1/u)` finite.
pub const MIN_DRAW: f64 = 1e-19;

/// The competing event classes of one KMC tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Process {
    AdsorptionF,
    AdsorptionS,
    /// Eley-Rideal recombination at an S-centre.
    RecombinationEr,
    DesorptionF,
    Diffusion,
}

impl Process {
    /// Enumeration order; also the tie-break order of equal propensities.
    pub const ALL: [Process; 5] = [
        Process::AdsorptionF,
        Process::AdsorptionS,
        Process::RecombinationEr,
        Process::DesorptionF,
        Process::Diffusion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Process::AdsorptionF => "adsorptionF",
            Process::AdsorptionS => "adsorptionS",
            Process::RecombinationEr => "recombEr",
            Process::DesorptionF => "desorptionF",
            Process::Diffusion => "diffusion",
        }
    }
}

/// Instantaneous rates of the five processes for the current surface state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Propensities {
    pub adsorption_f: f64,
    pub adsorption_s: f64,
    pub recombination_er: f64,
    pub desorption_f: f64,
    pub diffusion: f64,
}

impl Propensities {
    pub fn compute(lattice: &Lattice, registry: &SurfaceAtomRegistry, rates: &RateModel) -> Self {
        Self::from_counts(
            lattice.count_free(SiteKind::F),
            lattice.count_free(SiteKind::S),
            registry.count_on(SiteKind::F),
            registry.count_on(SiteKind::S),
            rates,
        )
    }

    pub fn from_counts(
        free_f: usize,
        free_s: usize,
        atoms_on_f: usize,
        atoms_on_s: usize,
        rates: &RateModel,
    ) -> Self {
        Self {
            adsorption_f: free_f as f64 * rates.adsorption_rate,
            adsorption_s: free_s as f64 * rates.adsorption_rate,
            recombination_er: atoms_on_s as f64 * rates.recombination_rate_s,
            desorption_f: atoms_on_f as f64 * rates.desorption_rate,
            // Only F-bound atoms hop.
            diffusion: atoms_on_f as f64 * rates.diffusion_rate,
        }
    }

    pub fn get(&self, process: Process) -> f64 {
        match process {
            Process::AdsorptionF => self.adsorption_f,
            Process::AdsorptionS => self.adsorption_s,
            Process::RecombinationEr => self.recombination_er,
            Process::DesorptionF => self.desorption_f,
            Process::Diffusion => self.diffusion,
        }
    }

    /// Total rate λ.
    pub fn total(&self) -> f64 {
        Process::ALL.iter().map(|&p| self.get(p)).sum()
    }

    /// Normalised propensities sorted ascending. The sort is stable, so
    /// equal probabilities keep enumeration order.
    pub fn sorted_probabilities(&self, lambda: f64) -> [(Process, f64); 5] {
        let mut probabilities = Process::ALL.map(|p| (p, self.get(p) / lambda));
        probabilities.sort_by(|a, b| a.1.total_cmp(&b.1));
        probabilities
    }

    pub fn select(&self, u: f64) -> Option<Process> {
        self.select_with_total(self.total(), u)
    }

    /// Picks the first bucket, in ascending-probability order, whose
    /// cumulative probability reaches `u`, for a precomputed total `lambda`.
    ///
    /// A bucket whose probability equals other buckets' resolves to the
    /// process listed last among them, so tied processes share one winner.
    /// Returns `None` when λ is zero, or when rounding leaves the cumulative
    /// sum short of `u`.
    pub fn select_with_total(&self, lambda: f64, u: f64) -> Option<Process> {
        if lambda <= 0.0 {
            return None;
        }
        let probabilities = self.sorted_probabilities(lambda);
        let mut cumulative = 0.0;
        for (i, &(_, probability)) in probabilities.iter().enumerate() {
            cumulative += probability;
            if u <= cumulative {
                return probabilities[i..]
                    .iter()
                    .take_while(|(_, p)| *p == probability)
                    .last()
                    .map(|&(process, _)| process);
            }
        }
        None
    }
}

/// Exponential waiting time `ln(1/u) / λ`.
#[inline]
pub fn waiting_time(lambda: f64, u: f64) -> f64 {
    1.0 / lambda * (1.0 / u).ln()
}

/// Moves an exact zero draw to `MIN_DRAW`.
#[inline]
pub fn clamp_draw(u: f64) -> f64 {
    if u <= 0.0 {
        MIN_DRAW
    } else {
        u
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(values: [f64; 5]) -> Propensities {
        Propensities {
            adsorption_f: values[0],
            adsorption_s: values[1],
            recombination_er: values[2],
            desorption_f: values[3],
            diffusion: values[4],
        }
    }

    #[test]
    fn sorted_buckets_differ_from_enumeration_order() {
        // Enumeration order would give adsorptionF the interval [0, 0.6].
        let p = props([6.0, 0.0, 0.0, 1.0, 3.0]);
        assert_eq!(p.select(0.05), Some(Process::DesorptionF));
        assert_eq!(p.select(0.1), Some(Process::DesorptionF));
        assert_eq!(p.select(0.35), Some(Process::Diffusion));
        assert_eq!(p.select(0.41), Some(Process::AdsorptionF));
        assert_eq!(p.select(0.99), Some(Process::AdsorptionF));
    }

    #[test]
    fn tied_buckets_resolve_to_last_listed_process() {
        let p = props([1.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(p.select(0.3), Some(Process::AdsorptionS));
        assert_eq!(p.select(0.75), Some(Process::AdsorptionS));

        let p = props([2.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(p.select(0.1), Some(Process::DesorptionF));
        assert_eq!(p.select(0.4), Some(Process::DesorptionF));
        assert_eq!(p.select(0.9), Some(Process::AdsorptionF));
    }

    #[test]
    fn sorted_probabilities_are_normalised() {
        let p = props([6.0, 0.0, 0.0, 1.0, 3.0]);
        let sorted = p.sorted_probabilities(p.total());
        let sum: f64 = sorted.iter().map(|(_, v)| v).sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(sorted.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(sorted[4].0, Process::AdsorptionF);
    }

    #[test]
    fn zero_lambda_selects_nothing() {
        let p = Propensities::default();
        assert_eq!(p.total(), 0.0);
        assert_eq!(p.select(0.5), None);
    }

    #[test]
    fn waiting_time_positive_and_decreasing() {
        let lambda = 3.5;
        let mut previous = f64::INFINITY;
        for i in 1..100 {
            let u = i as f64 / 100.0;
            let t = waiting_time(lambda, u);
            assert!(t > 0.0);
            assert!(t < previous);
            previous = t;
        }
        assert!(waiting_time(lambda, clamp_draw(0.0)).is_finite());
    }
}
