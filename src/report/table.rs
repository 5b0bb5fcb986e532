/// Plain text table: a header row, a dashed rule, then left-aligned cells
pub fn tabulate(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(columns) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut lines = vec![format_row(headers, &widths), format_row(&rule, &widths)];
    lines.extend(rows.iter().map(|row| format_row(row, &widths)));

    let mut table = lines.join("\n");
    table.push('\n');
    table
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!("{cell:<width$}")
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}
