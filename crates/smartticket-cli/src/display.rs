//! Terminal rendering for console tables, charts, history, and cards.

use std::io::{self, BufRead, Write};

use smartticket_console::history::{NO_HISTORY, describe};
use smartticket_console::reports::DashboardSummary;
use smartticket_console::{Dialog, DialogKind, Notifier, Table};
use smartticket_core::stats::{ChartSeries, StatisticsReport};
use smartticket_core::{FrequencyTable, HistoryLogEntry, UserRecord};

const BAR_WIDTH: usize = 40;
const MAX_CELL: usize = 32;

// ── Dialogs ──

/// Prints dialogs and asks confirmations on stdin.
pub struct TerminalNotifier {
    assume_yes: bool,
}

impl TerminalNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Notifier for TerminalNotifier {
    fn show(&self, dialog: Dialog) {
        let line = format!("[{}] {}: {}", dialog.kind, dialog.title, dialog.text);
        match dialog.kind {
            DialogKind::Error | DialogKind::Warning => eprintln!("{line}"),
            DialogKind::Success | DialogKind::Info => println!("{line}"),
        }
    }

    fn confirm(&self, title: &str, text: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{title} {text} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

// ── Tables ──

fn clip(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL {
        return cell.to_string();
    }
    let mut out: String = cell.chars().take(MAX_CELL - 1).collect();
    out.push('…');
    out
}

/// Print a page table with an `ID` column first, then its footer.
pub fn print_table(table: &Table) {
    println!("=== {} ===", table.title);
    if table.is_empty() {
        println!("(no records)");
    } else {
        let mut headers = vec!["ID"];
        headers.extend(table.headers.iter().copied());
        let rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|r| {
                std::iter::once(r.id.clone())
                    .chain(r.cells.iter().map(|c| clip(c)))
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let header_line: Vec<String> = headers
            .iter()
            .zip(&widths)
            .map(|(h, &w)| format!("{h:<w$}"))
            .collect();
        println!("{}", header_line.join("  "));
        println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
        for row in &rows {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{c:<w$}"))
                .collect();
            println!("{}", line.join("  ").trim_end());
        }
    }
    if let Some(footer) = &table.footer {
        println!();
        println!("{footer}");
    }
}

// ── Charts ──

fn bar(count: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let len = ((count as f64 / max as f64) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(len.max(usize::from(count > 0)))
}

fn print_bars<'a>(label: &str, points: impl Iterator<Item = (&'a str, u64)>) {
    let points: Vec<(&str, u64)> = points.collect();
    println!("{label}");
    if points.is_empty() {
        println!("  (no data)");
        return;
    }
    let max = points.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let key_width = points
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_CELL);
    for (key, count) in points {
        println!(
            "  {:<key_width$} {:>5} {}",
            clip(key),
            count,
            bar(count, max)
        );
    }
}

pub fn print_series(series: &ChartSeries) {
    print_bars(
        series.label(),
        series.points.iter().map(|(k, c)| (k.as_str(), *c)),
    );
}

pub fn print_statistics(report: &StatisticsReport) {
    for series in &report.series {
        print_series(series);
        println!();
    }
    println!("Recommendation");
    println!("  {}", report.recommendation);
}

fn print_frequency(label: &str, table: &FrequencyTable) {
    print_bars(label, table.iter());
}

pub fn print_dashboard(summary: &DashboardSummary) {
    println!("=== Dashboard ===");
    println!("  {:<26} {}", "Total Apprehensions", summary.apprehensions);
    println!("  {:<26} {}", "Registered Drivers", summary.drivers);
    if let Some(month) = &summary.month {
        println!("  {:<26} {}", "Month", month);
    }
    println!();
    print_frequency("Apprehensions per Month", &summary.tables.monthly);
    println!();
    print_frequency("Apprehensions per Location", &summary.tables.location);
}

// ── History and profile ──

pub fn print_history(entries: &[HistoryLogEntry]) {
    if entries.is_empty() {
        println!("{NO_HISTORY}");
        return;
    }
    for entry in entries {
        let mut lines = describe(entry).into_iter();
        if let Some(headline) = lines.next() {
            println!("{headline}");
        }
        for line in lines {
            println!("  {line}");
        }
        println!();
    }
}

pub fn print_profile(user: &UserRecord) {
    println!("=== {} ===", user.full_name());
    for (label, value) in [
        ("Email", &user.email),
        ("Birthdate", &user.birthdate),
        ("Gender", &user.gender),
        ("Address", &user.address),
        ("Position", &user.position),
        ("Profile Picture", &user.profile_picture),
    ] {
        if !value.is_empty() {
            println!("  {label:<26} {value}");
        }
    }
}
