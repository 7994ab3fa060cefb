use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Tabs, Wrap},
};

use crate::core::domain::SiteKind;
use crate::engine::external::plotter::line_chart;
use crate::interface::state::{AppMode, AppState, WorkerStatus};

// --- Color Palette ---
const COL_FG: Color = Color::White;
const COL_HIGHLIGHT: Color = Color::Yellow;
const COL_ACCENT: Color = Color::Cyan;
const COL_SUCCESS: Color = Color::Green;
const COL_FAIL: Color = Color::Red;

pub fn draw(f: &mut Frame, app: &AppState) {
    if f.area().width < 40 || f.area().height < 10 {
        let p = Paragraph::new("Terminal too small.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(p, f.area());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    draw_header(f, app, chunks[0]);

    match app.mode {
        AppMode::Dashboard => draw_dashboard(f, app, chunks[1]),
        AppMode::Parameters => draw_parameters(f, app, chunks[1]),
    }

    draw_footer(f, app, chunks[2]);
}

fn draw_header(f: &mut Frame, app: &AppState, area: Rect) {
    let titles = vec![" 1:Dashboard ", " 2:Parameters "];
    let idx = match app.mode {
        AppMode::Dashboard => 0,
        AppMode::Parameters => 1,
    };

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::BOTTOM))
        .select(idx)
        .highlight_style(Style::default().fg(COL_HIGHLIGHT).add_modifier(Modifier::BOLD));

    f.render_widget(tabs, area);
}

fn draw_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let status_str = match app.worker_status {
        WorkerStatus::Running => "RUNNING",
        WorkerStatus::Idle => "IDLE",
        WorkerStatus::Starting => "STARTING",
        WorkerStatus::Cancelling => "STOPPING",
        WorkerStatus::Finished => "DONE",
        WorkerStatus::Error => "ERROR",
    };

    let color = match app.worker_status {
        WorkerStatus::Running => COL_SUCCESS,
        WorkerStatus::Error => COL_FAIL,
        WorkerStatus::Cancelling => COL_HIGHLIGHT,
        _ => COL_FG,
    };

    let text = Line::from(vec![
        Span::styled(format!(" STATUS: {:<8}", status_str), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        Span::raw(format!("Ticks/s: {:<10.0}", app.ticks_per_second)),
        Span::raw(" | "),
        Span::styled(format!("T = {} K", app.rates.temperature), Style::default().fg(COL_ACCENT)),
        Span::raw(format!(" | seed {} | [Q]uit [1/2] Tabs", app.seed)),
    ]);

    let p = Paragraph::new(text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(p, area);
}

fn draw_dashboard(f: &mut Frame, app: &AppState, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let left_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(cols[0]);

    let density_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(left_rows[1]);

    let label = format!("T{}K", app.rates.temperature);
    let t = &app.telemetry;
    draw_series(f, left_rows[0], "Surface coverage", &label, t.coverage.iter());
    draw_series(f, density_cols[0], "Density F", &label, t.density_f.iter());
    draw_series(f, density_cols[1], "Density S", &label, t.density_s.iter());

    let right_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Length(3), Constraint::Min(0)])
        .split(cols[1]);

    draw_logs(f, app, right_rows[0]);
    draw_progress(f, app, right_rows[1]);
    draw_stats(f, app, right_rows[2]);
}

fn draw_series<'a>(
    f: &mut Frame,
    area: Rect,
    name: &str,
    label: &str,
    series: impl Iterator<Item = &'a (f64, f64)>,
) {
    let points: Vec<(f64, f64)> = series.copied().collect();
    if points.is_empty() {
        f.render_widget(
            Block::default().title(format!(" {name}: waiting for data... ")).borders(Borders::ALL),
            area,
        );
        return;
    }
    f.render_widget(line_chart(name, "Simulation time", name, label, &points), area);
}

fn draw_logs(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(" Run Log ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let items: Vec<ListItem> = app
        .logs
        .iter()
        .rev()
        .map(|line| {
            let style = if line.contains("FATAL") || line.contains("failed") {
                Style::default().fg(COL_FAIL)
            } else if line.contains(">>>") {
                Style::default().fg(COL_SUCCESS)
            } else {
                Style::default().fg(Color::Gray)
            };

            ListItem::new(Line::from(vec![
                Span::styled(">", Style::default().fg(Color::DarkGray)),
                Span::raw(" "),
                Span::raw(line.as_str()),
            ]))
            .style(style)
        })
        .collect();

    f.render_widget(List::new(items), inner);
}

fn draw_progress(f: &mut Frame, app: &AppState, area: Rect) {
    let ratio = app.progress();
    let color = match app.worker_status {
        WorkerStatus::Error => COL_FAIL,
        WorkerStatus::Finished => COL_SUCCESS,
        _ => COL_ACCENT,
    };

    let gauge = Gauge::default()
        .block(Block::default().title(" Progress ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(color).bg(Color::DarkGray))
        .ratio(ratio)
        .label(format!("{:.1}% of {} steps", ratio * 100.0, app.total_steps));

    f.render_widget(gauge, area);
}

fn draw_stats(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(" Counters ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(s) = app.latest else {
        f.render_widget(Paragraph::new("No snapshot yet."), inner);
        return;
    };

    let row = |k: &str, v: String| {
        Line::from(vec![
            Span::styled(format!("{:<16}", k), Style::default().fg(Color::Gray)),
            Span::styled(v, Style::default().fg(COL_HIGHLIGHT)),
        ])
    };

    let mut text = vec![
        row("Step:", s.step.to_string()),
        row("Sim time:", format!("{:.4e}", s.elapsed_time)),
        row("On surface:", s.atoms_on_surface.to_string()),
        row("Adsorbed:", s.adsorbed_atoms.to_string()),
        row("Desorbed:", s.desorbed_atoms.to_string()),
        row("Coverage:", format!("{:.5}", s.coverage)),
        row("Recomb Er:", s.recomb_er.to_string()),
        row("Recomb Lh F/S:", format!("{} / {}", s.recomb_lh_f, s.recomb_lh_s)),
    ];
    if let Some(summary) = &app.summary {
        text.push(row("Idle ticks:", summary.idle_ticks.to_string()));
    }

    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
}

fn draw_parameters(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Simulation Parameters ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let s = &app.config.simulating;
    let c = &app.config.consts;
    let r = &app.rates;

    let kv = |k: &str, v: String| -> ListItem {
        ListItem::new(Line::from(vec![
            Span::styled(format!("{:<26}", k), Style::default().fg(COL_ACCENT)),
            Span::raw(v),
        ]))
    };
    let blank = || ListItem::new(Line::from(" "));

    let items = vec![
        kv("Lattice:", format!("{} x {}", s.matrix_len_x, s.matrix_len_y)),
        kv("S-site fraction:", format!("{}", c.fi)),
        kv("Steps:", app.total_steps.to_string()),
        kv("Snapshot every:", format!("{} steps", s.snapshot_interval(app.total_steps))),
        kv("Seed:", app.seed.to_string()),
        blank(),
        kv("Temperature:", format!("{} K", r.temperature)),
        kv("Atom flux:", format!("{:.4e}", r.atom_flux)),
        kv("Adsorption rate:", format!("{:.4e}", r.adsorption_rate)),
        kv("Desorption rate:", format!("{:.4e}", r.desorption_rate)),
        kv("Diffusion rate:", format!("{:.4e}", r.diffusion_rate)),
        kv("Er recombination rate:", format!("{:.4e}", r.recombination_rate_s)),
        kv("Lh rate (S):", format!("{:.4e}", r.lh_rate_s)),
        kv("Lh rate (F):", format!("{:.4e}", r.lh_rate_f)),
        kv("Recomb probability S:", format!("{:.4e}", r.recombination_probability_s)),
        kv("Recomb probability F:", format!("{:.4e}", r.recombination_probability_f)),
        blank(),
        kv(
            &format!("{} / {} density:", SiteKind::F.label(), SiteKind::S.label()),
            format!("{:.4e} / {:.4e}", c.f_density, c.s_density()),
        ),
        kv("Gas density:", format!("{:.4e}", c.gas_density)),
    ];

    f.render_widget(List::new(items), inner);
}
