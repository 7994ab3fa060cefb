use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::core::domain::LEDGER_COLUMNS;
use crate::core::error::KmcResult;
use crate::engine::recorder::Recorder;
use crate::solvers::Snapshot;

/// Spreadsheet-style ledger of snapshots, one CSV row per reporting interval.
///
/// The header is written on creation and every row is flushed immediately,
/// so a partially completed run still leaves a readable file.
pub struct CsvLedger<W: Write = File> {
    writer: csv::Writer<W>,
    float_precision: u32,
}

impl CsvLedger<File> {
    pub fn create(path: &Path, float_precision: u32) -> KmcResult<Self> {
        Self::from_writer(File::create(path)?, float_precision)
    }
}

impl<W: Write> CsvLedger<W> {
    pub fn from_writer(inner: W, float_precision: u32) -> KmcResult<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(LEDGER_COLUMNS)?;
        writer.flush()?;
        Ok(Self {
            writer,
            float_precision,
        })
    }

    fn float(&self, value: f64) -> String {
        round_to_decimals(value, self.float_precision).to_string()
    }

    /// Consumes the ledger and returns the underlying writer.
    pub fn into_inner(self) -> KmcResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()).into())
    }
}

impl<W: Write + Send> Recorder for CsvLedger<W> {
    fn record(&mut self, s: &Snapshot) -> KmcResult<()> {
        let row = [
            s.step.to_string(),
            self.float(s.elapsed_time),
            s.atoms_on_surface.to_string(),
            s.adsorbed_atoms.to_string(),
            s.desorbed_atoms.to_string(),
            self.float(s.coverage),
            self.float(s.density_f),
            self.float(s.density_s),
            s.recomb_er.to_string(),
            s.recomb_lh_f.to_string(),
            s.recomb_lh_s.to_string(),
        ];
        self.writer.write_record(&row)?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> KmcResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "CSV ledger"
    }
}

pub fn round_to_decimals(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to_decimals(0.123456, 3), 0.123);
        assert_eq!(round_to_decimals(2.5, 0), 3.0);
        assert_eq!(round_to_decimals(1.0e-12, 10), 0.0);
    }

    #[test]
    fn writes_header_and_rounded_rows() {
        let mut ledger = CsvLedger::from_writer(Vec::new(), 2).unwrap();
        let snapshot = Snapshot {
            step: 10,
            elapsed_time: 1.23456,
            atoms_on_surface: 3,
            coverage: 0.3333,
            ..Default::default()
        };
        ledger.record(&snapshot).unwrap();

        let text = String::from_utf8(ledger.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Step N,Simulation time,"));
        assert_eq!(lines[1], "10,1.23,3,0,0,0.33,0,0,0,0,0");
    }
}
