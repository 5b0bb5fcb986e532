use std::collections::HashMap;
use std::io::{self, Write};

use crate::report::table::tabulate;
use crate::report::JobStatusRecord;

pub static PROGRESS_WIDTH: usize = 40;

pub fn draw_progressbar(value: usize, total: usize, width: usize) -> String {
    let filled = match total {
        0 => 0,
        _ => (value * width / total).min(width),
    };
    format!("|{}{}|", "#".repeat(filled), "-".repeat(width - filled))
}

/// Count jobs per label, most common first
pub fn label_counts(stati: &[JobStatusRecord]) -> Vec<(String, usize)> {
    let mut progress: HashMap<&str, usize> = HashMap::new();
    for status in stati {
        for label in &status.labels {
            *progress.entry(label.as_str()).or_default() += 1;
        }
    }

    let mut sorted: Vec<(String, usize)> = progress.into_iter().map(|(label, n)| (label.to_string(), n)).collect();
    sorted.sort_by(|a, b| (b.1, &b.0).cmp(&(a.1, &a.0)));
    sorted
}

pub fn print_overview(stati: &[JobStatusRecord], out: &mut dyn Write) -> io::Result<()> {
    let total = stati.len();
    let rows: Vec<Vec<String>> = label_counts(stati)
        .into_iter()
        .map(|(label, n)| {
            let percent = 100.0 * n as f64 / total as f64;
            vec![label, format!("{} {:.2}%", draw_progressbar(n, total, PROGRESS_WIDTH), percent)]
        })
        .collect();

    writeln!(out, "Total # of jobs: {total}")?;
    write!(out, "{}", tabulate(&["label".to_string(), "progress".to_string()], &rows))
}
