use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Sender;
use log::{debug, error, info, warn};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::chemistry::RateModel;
use crate::core::domain::{Atom, Config, Coord, SimulationParams, SiteKind};
use crate::core::error::{KmcError, KmcResult, PopulationCounts};
use crate::core::lattice::Lattice;
use crate::engine::propensity::{self, Process, Propensities};
use crate::engine::recorder::Recorder;
use crate::engine::registry::SurfaceAtomRegistry;
use crate::solvers::{RunSummary, SimEvent, Snapshot};

/// Cumulative event counters of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub adsorbed: u64,
    pub desorbed: u64,
    pub recomb_er: u64,
    pub recomb_lh_f: u64,
    pub recomb_lh_s: u64,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Fired { process: Process, dt: f64 },
    /// No event selected; time does not advance.
    Idle,
}

/// What a diffusion attempt did to the mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffusionOutcome {
    Hopped { from: Coord, to: Coord },
    /// Collision at an occupied S-site accepted as Lh recombination.
    RecombinedOnS,
    /// Collision at an occupied F-site accepted as Lh recombination.
    RecombinedOnF,
    /// Blocked hop: the mover alone leaves the surface.
    KnockedOff,
}

/// Continuous-time kinetic Monte Carlo engine.
///
/// Each tick draws one uniform `u`, which serves as the waiting-time draw,
/// the event-selection draw and, for diffusion, the recombination
/// acceptance draw.
pub struct Simulator<R: Rng = ChaCha8Rng> {
    params: SimulationParams,
    lattice: Lattice,
    registry: SurfaceAtomRegistry,
    rates: RateModel,
    rng: R,
    total_steps: u64,
    step: u64,
    elapsed_time: f64,
    idle_ticks: u64,
    counters: Counters,
    cancel: Option<Arc<AtomicBool>>,
}

impl<R: Rng> Simulator<R> {
    /// Validates the configuration and builds the lattice with `rng`, which
    /// then drives the whole run.
    pub fn new(config: &Config, temperature: f64, total_steps: u64, mut rng: R) -> KmcResult<Self> {
        config.validate(temperature, total_steps)?;
        let params = config.simulating.clone();

        let lattice = Lattice::new(params.matrix_len_x, params.matrix_len_y, config.consts.fi, &mut rng)?;
        let registry = SurfaceAtomRegistry::new(&lattice);
        let rates = RateModel::new(&config.consts, temperature);

        Ok(Self {
            params,
            lattice,
            registry,
            rates,
            rng,
            total_steps,
            step: 0,
            elapsed_time: 0.0,
            idle_ticks: 0,
            counters: Counters::default(),
            cancel: None,
        })
    }

    /// Checked between ticks; once set, `run` stops early.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn registry(&self) -> &SurfaceAtomRegistry {
        &self.registry
    }

    pub fn rates(&self) -> &RateModel {
        &self.rates
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn propensities(&self) -> Propensities {
        Propensities::compute(&self.lattice, &self.registry, &self.rates)
    }

    pub fn population(&self) -> PopulationCounts {
        PopulationCounts {
            free_f: self.lattice.count_free(SiteKind::F),
            free_s: self.lattice.count_free(SiteKind::S),
            atoms_on_f: self.registry.count_on(SiteKind::F),
            atoms_on_s: self.registry.count_on(SiteKind::S),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.registry.is_consistent(&self.lattice)
    }

    fn fault(&self, source: KmcError) -> KmcError {
        KmcError::Bookkeeping {
            step: self.step,
            counts: self.population(),
            source: Box::new(source),
        }
    }

    /// Advances the simulation by one event.
    pub fn tick(&mut self) -> KmcResult<TickOutcome> {
        self.step += 1;

        let propensities = self.propensities();
        let lambda = propensities.total();
        let u = propensity::clamp_draw(self.rng.gen::<f64>());

        let process = match propensities.select_with_total(lambda, u) {
            Some(process) => process,
            None => {
                self.idle_ticks += 1;
                debug!("idle tick {} (lambda = {lambda:e})", self.step);
                return Ok(TickOutcome::Idle);
            }
        };

        let dt = propensity::waiting_time(lambda, u);
        self.elapsed_time += dt;

        self.apply(process, u)
            .map_err(|e| if e.is_bookkeeping() { self.fault(e) } else { e })?;
        Ok(TickOutcome::Fired { process, dt })
    }

    fn apply(&mut self, process: Process, u: f64) -> KmcResult<()> {
        match process {
            Process::AdsorptionF => {
                self.adsorb(SiteKind::F)?;
            }
            Process::AdsorptionS => {
                self.adsorb(SiteKind::S)?;
            }
            Process::RecombinationEr => {
                // The partner atom is implicit in the rate; one atom leaves explicitly.
                self.desorb(SiteKind::S)?;
                self.counters.desorbed += 2;
                self.counters.recomb_er += 1;
            }
            Process::DesorptionF => {
                self.desorb(SiteKind::F)?;
                self.counters.desorbed += 1;
            }
            Process::Diffusion => {
                self.diffuse(u)?;
            }
        }
        Ok(())
    }

    fn adsorb(&mut self, kind: SiteKind) -> KmcResult<Atom> {
        let site = self
            .lattice
            .random_free_site(kind, &mut self.rng)
            .ok_or(KmcError::EmptyPool(match kind {
                SiteKind::F => "free F sites",
                SiteKind::S => "free S sites",
            }))?;
        let atom = self.registry.place(&mut self.lattice, &site)?;
        self.counters.adsorbed += 1;
        Ok(atom)
    }

    /// Adsorbs a new atom at `coord`, counted like a regular adsorption.
    pub fn adsorb_at(&mut self, coord: Coord) -> KmcResult<Atom> {
        let site = self.lattice.site(coord)?;
        let atom = self.registry.place(&mut self.lattice, &site)?;
        self.counters.adsorbed += 1;
        Ok(atom)
    }

    fn desorb(&mut self, kind: SiteKind) -> KmcResult<Atom> {
        let atom = self
            .registry
            .random_atom(kind, &mut self.rng)
            .ok_or(KmcError::EmptyPool(match kind {
                SiteKind::F => "atoms on F sites",
                SiteKind::S => "atoms on S sites",
            }))?;
        self.registry.remove(&mut self.lattice, atom.id)
    }

    /// Hops a random F-bound atom towards a random neighbour.
    ///
    /// A free neighbour receives the atom. An occupied neighbour triggers a
    /// collision: if `u` is within the recombination probability of the
    /// neighbour's site kind, both atoms leave; otherwise only the mover does.
    pub fn diffuse(&mut self, u: f64) -> KmcResult<DiffusionOutcome> {
        let atom = self
            .registry
            .random_atom(SiteKind::F, &mut self.rng)
            .ok_or(KmcError::EmptyPool("atoms on F sites"))?;

        let target = self.registry.pick_neighbour_coordinate(atom.id, &mut self.rng)?;
        let site = self.lattice.site(target)?;

        if site.is_free {
            self.registry.move_atom(&mut self.lattice, atom.id, &site)?;
            return Ok(DiffusionOutcome::Hopped { from: atom.coord, to: target });
        }

        let partner = site.atom.ok_or(KmcError::SiteFree { x: target.x, y: target.y })?;
        let outcome = match site.kind {
            SiteKind::S if u <= self.rates.recombination_probability_s => DiffusionOutcome::RecombinedOnS,
            SiteKind::F if u <= self.rates.recombination_probability_f => DiffusionOutcome::RecombinedOnF,
            _ => DiffusionOutcome::KnockedOff,
        };

        self.registry.remove(&mut self.lattice, atom.id)?;
        match outcome {
            DiffusionOutcome::RecombinedOnS | DiffusionOutcome::RecombinedOnF => {
                self.registry.remove(&mut self.lattice, partner)?;
                self.counters.desorbed += 2;
                if outcome == DiffusionOutcome::RecombinedOnS {
                    self.counters.recomb_lh_s += 1;
                } else {
                    self.counters.recomb_lh_f += 1;
                }
            }
            _ => self.counters.desorbed += 1,
        }
        Ok(outcome)
    }

    pub fn snapshot(&self) -> Snapshot {
        let on_surface = self.registry.len();
        let ratio = |atoms: usize, sites: usize| {
            if sites == 0 {
                0.0
            } else {
                atoms as f64 / sites as f64
            }
        };

        Snapshot {
            step: self.step,
            elapsed_time: self.elapsed_time,
            atoms_on_surface: on_surface,
            adsorbed_atoms: self.counters.adsorbed,
            desorbed_atoms: self.counters.desorbed,
            coverage: ratio(on_surface, self.lattice.total_sites()),
            density_f: ratio(self.registry.count_on(SiteKind::F), self.lattice.sites_of(SiteKind::F)),
            density_s: ratio(self.registry.count_on(SiteKind::S), self.lattice.sites_of(SiteKind::S)),
            recomb_er: self.counters.recomb_er,
            recomb_lh_f: self.counters.recomb_lh_f,
            recomb_lh_s: self.counters.recomb_lh_s,
        }
    }

    fn emit(&self, recorder: &mut dyn Recorder, tx: &Sender<SimEvent>, failures: &mut Vec<String>) {
        let snapshot = self.snapshot();
        if let Err(e) = recorder.record(&snapshot) {
            let msg = format!("{} recorder failed at step {}: {}", recorder.name(), snapshot.step, e);
            warn!("{msg}");
            let _ = tx.send(SimEvent::Log(msg.clone()));
            failures.push(msg);
        }
        let _ = tx.send(SimEvent::Snapshot(snapshot));
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Runs the remaining ticks, recording a snapshot before the first tick
    /// and then every reporting interval.
    ///
    /// Recorder failures are logged and collected in the summary; a
    /// bookkeeping fault aborts the run with `Err`.
    pub fn run(&mut self, recorder: &mut dyn Recorder, tx: &Sender<SimEvent>) -> KmcResult<RunSummary> {
        let interval = self.params.snapshot_interval(self.total_steps);
        let progress_every = (self.total_steps / 10).max(1);
        let mut failures = Vec::new();
        let mut cancelled = false;

        info!(
            "KMC run: {}x{} lattice, {} S-sites, T={} K, {} steps, snapshot every {} steps",
            self.lattice.width(),
            self.lattice.height(),
            self.lattice.sites_of(SiteKind::S),
            self.rates.temperature,
            self.total_steps,
            interval
        );
        let _ = tx.send(SimEvent::Log(format!("Simulating {} steps...", self.total_steps)));

        if self.step == 0 {
            self.emit(recorder, tx, &mut failures);
        }

        let start_time = Instant::now();
        let start_step = self.step;

        while self.step < self.total_steps {
            if self.is_cancelled() {
                cancelled = true;
                info!("run cancelled at step {}", self.step);
                let _ = tx.send(SimEvent::Log(format!("Cancelled at step {}", self.step)));
                break;
            }

            if let Err(e) = self.tick() {
                error!("{e}");
                let _ = tx.send(SimEvent::Log(format!("FATAL: {e}")));
                return Err(e);
            }

            if self.step % interval == 0 {
                self.emit(recorder, tx, &mut failures);
            }

            if self.step % progress_every == 0 {
                let secs = start_time.elapsed().as_secs_f64();
                let percent = self.step * 100 / self.total_steps;
                info!("Simulated {percent}% ({:.2}s)", secs);
                let _ = tx.send(SimEvent::Log(format!("Simulated {percent}%")));
                if secs > 0.0 {
                    let _ = tx.send(SimEvent::Heartbeat((self.step - start_step) as f64 / secs));
                }
            }
        }

        if let Err(e) = recorder.finish() {
            let msg = format!("{} recorder failed to finish: {}", recorder.name(), e);
            warn!("{msg}");
            failures.push(msg);
        }

        let summary = RunSummary {
            steps_completed: self.step,
            idle_ticks: self.idle_ticks,
            elapsed_time: self.elapsed_time,
            cancelled,
            recorder_failures: failures,
        };
        info!(
            "KMC run finished: {} steps, simulated time {:e}, {} atoms on surface",
            summary.steps_completed,
            summary.elapsed_time,
            self.registry.len()
        );
        let _ = tx.send(SimEvent::Finished(summary.clone()));
        Ok(summary)
    }
}
