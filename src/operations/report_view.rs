use crate::error::Result;
use crate::models::report::{CategoryBreakdown, YearlyReport};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Modifier, Rect, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::io;
use tracing::warn;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Full-screen income/expense chart for one year. Blocks until `q` or Esc.
pub fn run_yearly_chart(report: &YearlyReport, breakdown: &CategoryBreakdown) -> Result<()> {
    let expense_totals = sorted_totals(&breakdown.expenses);
    let category_colors = assign_colors(&expense_totals);

    let _screen = ScreenGuard::enter()?;
    let backend = ratatui::backend::CrosstermBackend::new(io::stdout());
    let mut terminal = ratatui::Terminal::new(backend)?;

    loop {
        terminal.draw(|frame| {
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                .split(frame.area());

            render_month_bars(frame, layout[0], report);

            let bottom = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(layout[1]);

            render_summary(frame, bottom[0], report);
            render_category_table(frame, bottom[1], &expense_totals, &category_colors);
        })?;

        if event::poll(std::time::Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Press => {}
                Event::Key(key) if key.code == KeyCode::Char('q') => break,
                Event::Key(key) if key.code == KeyCode::Esc => break,
                _ => {}
            }
        }
    }
    Ok(())
}

type RestoreStep<'a> = (&'static str, Box<dyn FnOnce() -> io::Result<()> + 'a>);

/// Raw mode plus alternate screen, undone on drop whichever step failed.
struct ScreenGuard {
    alternate: bool,
}

impl ScreenGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut guard = Self { alternate: false };
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        guard.alternate = true;
        Ok(guard)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let mut steps: Vec<RestoreStep> = Vec::with_capacity(2);
        if self.alternate {
            steps.push((
                "leave alternate screen",
                Box::new(|| {
                    let mut stdout = io::stdout();
                    execute!(stdout, LeaveAlternateScreen)
                }),
            ));
        }
        steps.push(("disable raw mode", Box::new(disable_raw_mode)));
        run_each(steps);
    }
}

/// Runs every step even when an earlier one fails. Returns the failure count.
fn run_each(steps: Vec<RestoreStep<'_>>) -> usize {
    let mut failures = 0;
    for (name, step) in steps {
        if let Err(e) = step() {
            warn!(step = name, error = %e, "terminal restore failed");
            failures += 1;
        }
    }
    failures
}

/// Rows a bar of `value` occupies when `max` fills `height` rows.
pub fn bar_height(value: Decimal, max: Decimal, height: usize) -> usize {
    if value <= Decimal::ZERO || max <= Decimal::ZERO || height == 0 {
        return 0;
    }
    let ratio = (value / max).to_f64().unwrap_or(0.0);
    ((ratio * height as f64).ceil() as usize).clamp(1, height)
}

fn sorted_totals(totals: &std::collections::BTreeMap<String, Decimal>) -> Vec<(String, Decimal)> {
    let mut sorted: Vec<(String, Decimal)> =
        totals.iter().map(|(k, v)| (k.clone(), *v)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

fn assign_colors(totals: &[(String, Decimal)]) -> HashMap<String, Color> {
    let palette = [
        Color::Cyan,
        Color::Magenta,
        Color::Yellow,
        Color::Blue,
        Color::LightCyan,
        Color::LightMagenta,
        Color::LightYellow,
        Color::LightBlue,
    ];

    totals
        .iter()
        .enumerate()
        .map(|(idx, (category, _))| (category.clone(), palette[idx % palette.len()]))
        .collect()
}

fn render_month_bars(frame: &mut ratatui::Frame, area: Rect, report: &YearlyReport) {
    let block = Block::default()
        .title(Line::from(vec![
            Span::styled(
                format!("{} income ", report.year),
                Style::default().fg(Color::Green),
            ),
            Span::styled("/ expenses ", Style::default().fg(Color::Red)),
            Span::styled("(press q to exit)", Style::default().fg(Color::White)),
        ]))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chart_rows = inner.height.saturating_sub(1) as usize;
    if chart_rows == 0 {
        return;
    }

    let slot_width = std::cmp::max(3, inner.width as usize / MONTH_LABELS.len());
    let bar_width = std::cmp::max(1, (slot_width - 1) / 2);
    let gap = slot_width - bar_width * 2;

    let max = report
        .months
        .iter()
        .flat_map(|m| [m.income, m.expenses])
        .max()
        .unwrap_or(Decimal::ZERO);

    let heights: Vec<(usize, usize)> = report
        .months
        .iter()
        .map(|m| {
            (
                bar_height(m.income, max, chart_rows),
                bar_height(m.expenses, max, chart_rows),
            )
        })
        .collect();

    let mut lines: Vec<Line> = Vec::with_capacity(chart_rows + 1);
    for row in 0..chart_rows {
        let level = chart_rows - row;
        let mut spans = Vec::with_capacity(heights.len() * 3);
        for (income, expenses) in &heights {
            spans.push(bar_cell(*income >= level, bar_width, Color::Green));
            spans.push(bar_cell(*expenses >= level, bar_width, Color::Red));
            spans.push(Span::raw(" ".repeat(gap)));
        }
        lines.push(Line::from(spans));
    }

    let labels: Vec<Span> = MONTH_LABELS
        .iter()
        .map(|label| {
            let mut label = label.to_string();
            label.truncate(slot_width);
            Span::raw(format!("{:width$}", label, width = slot_width))
        })
        .collect();
    lines.push(Line::from(labels));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), inner);
}

fn bar_cell(filled: bool, width: usize, color: Color) -> Span<'static> {
    if filled {
        Span::styled("█".repeat(width), Style::default().fg(color))
    } else {
        Span::raw(" ".repeat(width))
    }
}

fn render_summary(frame: &mut ratatui::Frame, area: Rect, report: &YearlyReport) {
    let block = Block::default().title("Summary").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let summary = &report.summary;
    let balance_color = if summary.balance < Decimal::ZERO {
        Color::Red
    } else {
        Color::Green
    };
    let lines = vec![
        summary_line("Income", summary.income, Color::Green),
        summary_line("Expenses", summary.expenses, Color::Red),
        summary_line("Balance", summary.balance, balance_color),
        Line::from(vec![
            Span::styled(format!("{:12}", "Savings rate"), Style::default().fg(Color::White)),
            Span::raw(format!("{:>12}%", summary.savings_rate.round_dp(2))),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn summary_line(label: &str, amount: Decimal, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:12}", label), Style::default().fg(Color::White)),
        Span::styled(format!("{:>12.2}", amount), Style::default().fg(color)),
    ])
}

fn render_category_table(
    frame: &mut ratatui::Frame,
    area: Rect,
    totals: &[(String, Decimal)],
    colors: &HashMap<String, Color>,
) {
    let block = Block::default().title("Expenses by category").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if totals.is_empty() {
        let empty = Paragraph::new("No expenses this year").alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    let bold = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:15}", "Category"), bold),
        Span::raw("  "),
        Span::styled(format!("{:>12}", "Amount"), bold),
    ])];

    for (category, amount) in totals {
        let color = colors.get(category).copied().unwrap_or(Color::White);
        lines.push(Line::from(vec![
            Span::styled(format!("{:15}", category), Style::default().fg(color)),
            Span::raw("  "),
            Span::styled(format!("{:>12.2}", amount), Style::default().fg(color)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), inner);
}
