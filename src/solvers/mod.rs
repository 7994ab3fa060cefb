/// Surface state at one reporting interval.
/// Times are in the reciprocal units of the rate constants; densities are
/// occupied / total sites.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Snapshot {
    pub step: u64,
    pub elapsed_time: f64,
    pub atoms_on_surface: usize,
    pub adsorbed_atoms: u64,
    pub desorbed_atoms: u64,
    /// Atoms on the surface / all sites.
    pub coverage: f64,
    pub density_f: f64,
    pub density_s: f64,
    pub recomb_er: u64,
    pub recomb_lh_f: u64,
    pub recomb_lh_s: u64,
}

/// Outcome of a completed (or cancelled) run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub steps_completed: u64,
    /// Ticks where no event fired (λ = 0 or rounding shortfall).
    pub idle_ticks: u64,
    pub elapsed_time: f64,
    pub cancelled: bool,
    /// Recorder faults survived during the run, as messages.
    pub recorder_failures: Vec<String>,
}

/// Events emitted by the simulator to the main thread.
#[derive(Debug, Clone)]
pub enum SimEvent {
    /// Diagnostic log message.
    Log(String),

    /// A reporting-interval snapshot.
    Snapshot(Snapshot),

    /// Throughput estimate in ticks per second.
    Heartbeat(f64),

    /// Simulator has finished its run.
    Finished(RunSummary),
}

pub mod kmc;
