use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Widget};

use crate::core::domain::PlotSpec;
use crate::core::error::{KmcError, KmcResult};

const REPORT_TITLE: &str = "Surface Atoms";

/// Renders ledger columns as line charts into a plain-text report.
///
/// Each chart is drawn with the same ratatui widgets as the live dashboard,
/// into an off-screen buffer that is then dumped line by line.
#[derive(Debug, Clone)]
pub struct ChartPlotter {
    ledger_path: PathBuf,
    output_path: PathBuf,
    line_label: String,
    plots: Vec<PlotSpec>,
    width: u16,
    height: u16,
}

impl ChartPlotter {
    pub fn new(ledger_path: &Path, output_path: &Path, line_label: &str, plots: Vec<PlotSpec>) -> Self {
        Self {
            ledger_path: ledger_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            line_label: line_label.to_string(),
            plots,
            width: 120,
            height: 30,
        }
    }

    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Reads the ledger and writes every configured chart to the report.
    /// A chart whose columns are missing is skipped with an error log.
    pub fn plot(&self) -> KmcResult<()> {
        if self.plots.is_empty() {
            return Ok(());
        }
        info!("plotting {} charts to {}", self.plots.len(), self.output_path.display());

        let columns = self.read_columns()?;
        let mut report = format!("{REPORT_TITLE}\n\n");

        for plot in &self.plots {
            match (columns.get(&plot.x_axis), columns.get(&plot.y_axis)) {
                (Some(xs), Some(ys)) => {
                    let points: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
                    let title = format!("{}/{}", plot.y_axis, plot.x_axis);
                    report.push_str(&self.render(&title, plot, &points));
                    report.push('\n');
                }
                _ => error!("plot {}/{}: column missing from ledger", plot.y_axis, plot.x_axis),
            }
        }

        fs::write(&self.output_path, report)?;
        Ok(())
    }

    fn read_columns(&self) -> KmcResult<HashMap<String, Vec<f64>>> {
        let mut reader = csv::Reader::from_path(&self.ledger_path)?;
        let headers = reader.headers()?.clone();

        let required: HashSet<&str> = self
            .plots
            .iter()
            .flat_map(|p| [p.x_axis.as_str(), p.y_axis.as_str()])
            .collect();
        let indexes: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| required.contains(h))
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        let mut columns: HashMap<String, Vec<f64>> = HashMap::new();
        let mut rows = 0;
        for record in reader.records() {
            let record = record?;
            rows += 1;
            for (index, name) in &indexes {
                // Unparsable cells plot as zero.
                let value = record.get(*index).and_then(|v| v.parse().ok()).unwrap_or(0.0);
                columns.entry(name.clone()).or_default().push(value);
            }
        }

        if rows == 0 {
            return Err(KmcError::Report("no data".to_string()));
        }
        Ok(columns)
    }

    fn render(&self, title: &str, plot: &PlotSpec, points: &[(f64, f64)]) -> String {
        let area = Rect::new(0, 0, self.width, self.height);
        let mut buffer = Buffer::empty(area);
        line_chart(title, &plot.x_axis, &plot.y_axis, &self.line_label, points).render(area, &mut buffer);

        let mut out = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for y in area.top()..area.bottom() {
            let line: String = (area.left()..area.right()).map(|x| buffer[(x, y)].symbol()).collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

/// Axis bounds of `points`, padded so a flat series still spans a range.
pub fn bounds(points: &[(f64, f64)]) -> ([f64; 2], [f64; 2]) {
    let fold = |pick: fn(&(f64, f64)) -> f64| {
        points.iter().map(pick).fold([f64::MAX, f64::MIN], |[lo, hi], v| [lo.min(v), hi.max(v)])
    };
    let pad = |[lo, hi]: [f64; 2]| {
        if points.is_empty() {
            [0.0, 1.0]
        } else if (hi - lo).abs() < f64::EPSILON {
            [lo - 0.5, hi + 0.5]
        } else {
            [lo, hi]
        }
    };
    (pad(fold(|p| p.0)), pad(fold(|p| p.1)))
}

fn axis_labels([lo, hi]: [f64; 2]) -> Vec<String> {
    [lo, (lo + hi) / 2.0, hi].iter().map(|v| format!("{v:.3e}")).collect()
}

/// A single-series line chart titled `title`, shared by the report and the dashboard.
pub fn line_chart<'a>(
    title: &str,
    x_name: &str,
    y_name: &str,
    label: &str,
    points: &'a [(f64, f64)],
) -> Chart<'a> {
    let (x_bounds, y_bounds) = bounds(points);
    let dataset = Dataset::default()
        .name(label.to_string())
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(points);

    Chart::new(vec![dataset])
        .block(Block::default().title(format!(" {title} ")).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title(x_name.to_string())
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds)),
        )
        .y_axis(
            Axis::default()
                .title(y_name.to_string())
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds)),
        )
}
