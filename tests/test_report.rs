use std::fs;

use crossbeam_channel::unbounded;
use surface_kmc::core::domain::{PlotSpec, LEDGER_COLUMNS};
use surface_kmc::core::error::KmcError;
use surface_kmc::engine::external::ledger::CsvLedger;
use surface_kmc::engine::external::plotter::ChartPlotter;
use surface_kmc::solvers::kmc::Simulator;

use crate::common::{scratch_dir, seeded, small_config};

mod common;

#[test]
fn test_ledger_file_has_header_and_one_row_per_snapshot() {
    let dir = scratch_dir("ledger");
    let path = dir.join("result_T300K.csv");

    let config = small_config(10, 10, 0.05);
    let mut sim = Simulator::new(&config, 300.0, 200, seeded(21)).unwrap();
    let mut ledger = CsvLedger::create(&path, config.simulating.float_precision).unwrap();
    let (tx, _rx) = unbounded();
    let summary = sim.run(&mut ledger, &tx).unwrap();
    assert!(summary.recorder_failures.is_empty());
    drop(ledger);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, LEDGER_COLUMNS);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 11);
    assert_eq!(&rows[0][0], "0");
    assert_eq!(&rows[10][0], "200");

    let last_on_surface: usize = rows[10][2].parse().unwrap();
    assert_eq!(last_on_surface, sim.registry().len());
}

#[test]
fn test_plotter_writes_one_chart_per_plot() {
    let dir = scratch_dir("plotter");
    let ledger_path = dir.join("result_T300K.csv");
    let report_path = dir.join("graphics_T300K.txt");

    let config = small_config(10, 10, 0.05);
    let mut sim = Simulator::new(&config, 300.0, 500, seeded(22)).unwrap();
    let mut ledger = CsvLedger::create(&ledger_path, 6).unwrap();
    let (tx, _rx) = unbounded();
    sim.run(&mut ledger, &tx).unwrap();
    drop(ledger);

    let plotter = ChartPlotter::new(
        &ledger_path,
        &report_path,
        "T300K",
        config.simulating.graphics_to_plot.clone(),
    );
    plotter.plot().unwrap();

    let report = fs::read_to_string(&report_path).unwrap();
    assert!(report.starts_with("Surface Atoms"));
    assert!(report.contains("Surface coverage/Simulation time"));
    assert!(report.contains("Density F/Simulation time"));
    assert!(report.contains("Density S/Simulation time"));
}

#[test]
fn test_plotter_without_specs_is_noop() {
    let dir = scratch_dir("plotter_noop");
    let report_path = dir.join("graphics.txt");
    let plotter = ChartPlotter::new(&dir.join("missing.csv"), &report_path, "T300K", vec![]);

    plotter.plot().unwrap();
    assert!(!report_path.exists());
}

#[test]
fn test_plotter_rejects_empty_ledger() {
    let dir = scratch_dir("plotter_empty");
    let ledger_path = dir.join("result.csv");
    drop(CsvLedger::create(&ledger_path, 4).unwrap());

    let plotter = ChartPlotter::new(
        &ledger_path,
        &dir.join("graphics.txt"),
        "T300K",
        vec![PlotSpec::new("Simulation time", "Surface coverage")],
    );
    assert!(matches!(plotter.plot(), Err(KmcError::Report(_))));
}
