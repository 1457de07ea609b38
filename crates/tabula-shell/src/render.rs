//! Plain-text rendering of query results

use tabula_query::QueryResult;

const SEPARATOR: &str = " | ";

/// Render a result for the terminal
///
/// Row results become an aligned table followed by the summary line.
pub fn render(result: &QueryResult) -> String {
    match result {
        QueryResult::Message(message) => message.clone(),
        QueryResult::Rows { columns, .. } => {
            let headers: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
            let cells: Vec<Vec<String>> = result
                .values()
                .into_iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect();

            let mut out = render_table(&headers, &cells);
            out.push_str(result.message());
            out
        }
    }
}

/// Lay out a header and rows in padded columns, one line each
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers, &widths);

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');

    for row in rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(padded.join(SEPARATOR).trim_end());
    out.push('\n');
}
