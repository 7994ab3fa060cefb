use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::Parser;
use crossbeam_channel::{unbounded, Sender};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ratatui::{backend::CrosstermBackend, Terminal};

use surface_kmc::core::domain::Config;
use surface_kmc::engine::external::ledger::CsvLedger;
use surface_kmc::engine::external::plotter::ChartPlotter;
use surface_kmc::interface::state::AppState;
use surface_kmc::interface::ui;
use surface_kmc::solvers::kmc::Simulator;
use surface_kmc::solvers::{RunSummary, SimEvent};

// --- CLI Definitions ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Kinetic Monte Carlo simulation of gas adsorption on a two-site surface", long_about = None)]
struct Args {
    /// Surface temperature in Kelvin (prompted if omitted)
    temperature: Option<f64>,

    /// Number of KMC steps, `_` separators allowed (prompted if omitted)
    #[arg(value_parser = parse_steps)]
    steps: Option<u64>,

    /// JSON configuration file (built-in defaults if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the random generator (drawn and logged if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory the result folder is created in
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Run without the terminal dashboard, logging to stderr
    #[arg(long)]
    headless: bool,
}

fn parse_steps(raw: &str) -> std::result::Result<u64, String> {
    raw.trim()
        .replace('_', "")
        .parse::<u64>()
        .map_err(|e| format!("invalid step count '{raw}': {e}"))
}

fn parse_temperature(raw: &str) -> std::result::Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid temperature '{raw}': {e}"))
}

/// Asks on stdin until `parse` accepts the answer.
fn prompt<T>(label: &str, parse: fn(&str) -> std::result::Result<T, String>) -> Result<T> {
    let stdin = io::stdin();
    loop {
        print!("{label}: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            bail!("stdin closed while waiting for {label}");
        }
        match parse(&line) {
            Ok(value) => return Ok(value),
            Err(e) => eprintln!("{e}"),
        }
    }
}

fn wait_for_enter() {
    print!("Press Enter to exit...");
    let _ = io::stdout().flush();
    let _ = io::stdin().lock().read_line(&mut String::new());
}

// --- Terminal Guard (RAII) ---

struct TuiContext {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TuiContext {
    fn new() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to setup terminal alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal backend")?;
        Ok(Self { terminal })
    }
}

impl Drop for TuiContext {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture);
        let _ = self.terminal.show_cursor();
    }
}

// --- Initialization Helpers ---

fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore the terminal before printing the panic.
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));
}

/// Headless runs log to stderr; dashboard runs log to `run.log` so the
/// terminal stays clean.
fn init_logging(result_dir: &Path, headless: bool) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if !headless {
        let path = result_dir.join("run.log");
        let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("Failed to initialise logger")?;
    Ok(())
}

fn create_result_dir(output_dir: &Path, temperature: f64) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y-%m-%d %H_%M_%S");
    let dir = output_dir.join(format!("result {stamp} T{temperature}K"));
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create result directory {}", dir.display()))?;
    Ok(dir)
}

/// Runs the simulation, then renders the chart report from the ledger.
fn run_and_plot(
    mut sim: Simulator,
    mut ledger: CsvLedger,
    plotter: ChartPlotter,
    tx: &Sender<SimEvent>,
) -> Result<RunSummary> {
    let summary = sim.run(&mut ledger, tx).context("Simulation aborted")?;
    drop(ledger);

    if let Err(e) = plotter.plot() {
        error!("plotting failed: {e}");
        let _ = tx.send(SimEvent::Log(format!("Plot failed: {e}")));
        return Err(anyhow!(e).context("Failed to write chart report"));
    }
    let _ = tx.send(SimEvent::Log(format!(">>> Charts written to {}", plotter.output_path().display())));
    Ok(summary)
}

fn print_summary(summary: &RunSummary, result_dir: &Path) {
    println!(
        "{} after {} steps ({} idle), simulated time {:e}",
        if summary.cancelled { "Cancelled" } else { "Finished" },
        summary.steps_completed,
        summary.idle_ticks,
        summary.elapsed_time
    );
    for failure in &summary.recorder_failures {
        println!("  recorder failure: {failure}");
    }
    println!("Results in {}", result_dir.display());
}

// --- Main ---

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let temperature = match args.temperature {
        Some(t) => t,
        None => prompt("Temperature (K)", parse_temperature)?,
    };
    let steps = match args.steps {
        Some(s) => s,
        None => prompt("Steps", parse_steps)?,
    };
    config.validate(temperature, steps).context("Invalid run parameters")?;

    let result_dir = create_result_dir(&args.output_dir, temperature)?;
    init_logging(&result_dir, args.headless)?;

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!("seed {seed}, T = {temperature} K, {steps} steps, results in {}", result_dir.display());

    let rng = ChaCha8Rng::seed_from_u64(seed);
    let sim = Simulator::new(&config, temperature, steps, rng).context("Failed to build simulator")?;

    let ledger_path = result_dir.join(format!("result_T{temperature}K.csv"));
    let ledger = CsvLedger::create(&ledger_path, config.simulating.float_precision)
        .with_context(|| format!("Failed to create ledger {}", ledger_path.display()))?;
    let plotter = ChartPlotter::new(
        &ledger_path,
        &result_dir.join(format!("graphics_T{temperature}K.txt")),
        &format!("T{temperature}K"),
        config.simulating.graphics_to_plot.clone(),
    );

    if args.headless {
        // Nobody listens in headless mode; sends to a closed channel are dropped.
        let (tx, rx) = unbounded();
        drop(rx);
        let summary = run_and_plot(sim, ledger, plotter, &tx)?;
        print_summary(&summary, &result_dir);
        return Ok(());
    }

    // Dashboard
    setup_panic_hook();
    let cancel = Arc::new(AtomicBool::new(false));
    let mut app = AppState::new(config.clone(), *sim.rates(), steps, seed, cancel.clone());
    let sim = sim.with_cancel_flag(cancel);

    let (tx, rx) = unbounded();
    app.set_channel(rx);

    let worker = thread::Builder::new()
        .name("KMC-Worker".to_string())
        .spawn(move || run_and_plot(sim, ledger, plotter, &tx))?;

    {
        let mut tui = TuiContext::new().context("Failed to initialize TUI")?;
        let tick_rate = Duration::from_millis(50);
        let mut last_tick = Instant::now();

        while !app.should_quit {
            tui.terminal.draw(|f| ui::draw(f, &app))?;

            let timeout = tick_rate.saturating_sub(last_tick.elapsed());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == event::KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char(c) => app.on_key(c),
                            KeyCode::Esc => app.quit(),
                            _ => {}
                        }
                    }
                }
            }

            if last_tick.elapsed() >= tick_rate {
                app.tick();
                last_tick = Instant::now();
            }
        }
    }

    let outcome = worker
        .join()
        .map_err(|_| anyhow!("KMC worker thread panicked"))?;
    let result = outcome.map(|summary| print_summary(&summary, &result_dir));

    wait_for_enter();
    result
}
