use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::core::chemistry::RateModel;
use crate::core::domain::Config;
use crate::solvers::{RunSummary, SimEvent, Snapshot};

// --- Constants ---
const HISTORY_CAPACITY: usize = 1000;
const LOG_CAPACITY: usize = 200;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Dashboard,
    Parameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    Starting,
    Running,
    Cancelling,
    Finished,
    Error,
}

// --- Telemetry ---

/// Rolling series for the live charts, x = simulated time.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    pub coverage: VecDeque<(f64, f64)>,
    pub density_f: VecDeque<(f64, f64)>,
    pub density_s: VecDeque<(f64, f64)>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            coverage: VecDeque::with_capacity(HISTORY_CAPACITY),
            density_f: VecDeque::with_capacity(HISTORY_CAPACITY),
            density_s: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn ingest(&mut self, s: &Snapshot) {
        if self.coverage.len() >= HISTORY_CAPACITY {
            self.coverage.pop_front();
            self.density_f.pop_front();
            self.density_s.pop_front();
        }

        let x = s.elapsed_time;
        self.coverage.push_back((x, s.coverage));
        self.density_f.push_back((x, s.density_f));
        self.density_s.push_back((x, s.density_s));
    }

    pub fn len(&self) -> usize {
        self.coverage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coverage.is_empty()
    }
}

// --- The Master State ---

pub struct AppState {
    // System
    pub should_quit: bool,
    pub mode: AppMode,
    pub config: Config,
    pub rates: RateModel,
    pub total_steps: u64,
    pub seed: u64,

    // Worker
    pub rx: Option<Receiver<SimEvent>>,
    pub worker_status: WorkerStatus,
    cancel: Arc<AtomicBool>,

    // Simulation Data
    pub latest: Option<Snapshot>,
    pub summary: Option<RunSummary>,
    pub start_time: Instant,
    pub ticks_per_second: f64,

    // Analytics
    pub telemetry: Telemetry,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(config: Config, rates: RateModel, total_steps: u64, seed: u64, cancel: Arc<AtomicBool>) -> Self {
        Self {
            should_quit: false,
            mode: AppMode::Dashboard,
            config,
            rates,
            total_steps,
            seed,
            rx: None,
            worker_status: WorkerStatus::Idle,
            cancel,
            latest: None,
            summary: None,
            start_time: Instant::now(),
            ticks_per_second: 0.0,
            telemetry: Telemetry::new(),
            logs: VecDeque::with_capacity(LOG_CAPACITY),
        }
    }

    pub fn set_channel(&mut self, rx: Receiver<SimEvent>) {
        self.rx = Some(rx);
        self.worker_status = WorkerStatus::Starting;
        self.start_time = Instant::now();
    }

    /// Share of the requested steps simulated so far, in [0, 1].
    pub fn progress(&self) -> f64 {
        let step = self
            .summary
            .as_ref()
            .map(|s| s.steps_completed)
            .or(self.latest.map(|s| s.step))
            .unwrap_or(0);
        if self.total_steps == 0 {
            return 0.0;
        }
        (step as f64 / self.total_steps as f64).clamp(0.0, 1.0)
    }

    pub fn tick(&mut self) {
        if let Some(rx) = self.rx.clone() {
            for _ in 0..100 {
                match rx.try_recv() {
                    Ok(evt) => self.handle_event(evt),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if self.summary.is_none() {
                            self.worker_status = WorkerStatus::Error;
                            self.log("Worker stopped without finishing.");
                        }
                        self.rx = None;
                        break;
                    }
                }
            }
        }
    }

    pub fn handle_event(&mut self, event: SimEvent) {
        match event {
            SimEvent::Log(msg) => self.log(msg),

            SimEvent::Heartbeat(rate) => {
                if rate > 0.0 {
                    self.ticks_per_second = rate;
                }
            }

            SimEvent::Snapshot(snapshot) => {
                if self.worker_status == WorkerStatus::Starting {
                    self.worker_status = WorkerStatus::Running;
                }
                self.telemetry.ingest(&snapshot);
                self.latest = Some(snapshot);
            }

            SimEvent::Finished(summary) => {
                self.worker_status = WorkerStatus::Finished;
                self.log(format!(
                    ">>> Finished: {} steps, {} idle, {} recorder failures",
                    summary.steps_completed,
                    summary.idle_ticks,
                    summary.recorder_failures.len()
                ));
                self.summary = Some(summary);
            }
        }
    }

    fn log(&mut self, msg: impl Into<String>) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(msg.into());
    }

    /// Raises the cancellation flag seen by the worker between ticks.
    pub fn quit(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if matches!(self.worker_status, WorkerStatus::Starting | WorkerStatus::Running) {
            self.worker_status = WorkerStatus::Cancelling;
        }
        self.should_quit = true;
    }

    // --- Input Handling ---

    pub fn on_key(&mut self, key: char) {
        match key {
            'q' => self.quit(),
            '1' => self.mode = AppMode::Dashboard,
            '2' => self.mode = AppMode::Parameters,
            _ => {}
        }
    }
}
