use terminal_size::{Width, terminal_size};

use crate::query::StatsClause;

const AGG_COLUMNS: [&str; 4] = ["#", "label", "function", "value_expression"];
const GROUP_COLUMNS: [&str; 5] = ["#", "kind", "field", "alias", "interval"];

// Render a parsed stats clause as two ASCII tables (aggregations, group by)
// followed by a one-line summary. Returns the lines without printing them.
pub fn render_stats_clause(clause: &StatsClause, termw: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    let agg_rows: Vec<Vec<String>> = clause
        .aggregations
        .iter()
        .enumerate()
        .map(|(i, a)| vec![(i + 1).to_string(), a.display_label(), a.function.name.clone(), a.function.value_expression.clone()])
        .collect();
    out.push("aggregations:".to_string());
    render_table(&AGG_COLUMNS, &agg_rows, termw, &mut out);

    // span first: it is the primary bucket dimension downstream
    let mut group_rows: Vec<Vec<String>> = Vec::new();
    if let Some(span) = &clause.group_by.span {
        let e = &span.expression;
        group_rows.push(vec![
            (group_rows.len() + 1).to_string(),
            "span".to_string(),
            e.field.clone(),
            span.alias.clone(),
            format!("{}{}", e.literal_value, e.time_unit),
        ]);
    }
    for f in &clause.group_by.fields {
        group_rows.push(vec![(group_rows.len() + 1).to_string(), "field".to_string(), f.name.clone(), String::new(), String::new()]);
    }
    out.push("group by:".to_string());
    render_table(&GROUP_COLUMNS, &group_rows, termw, &mut out);

    let summary = format!(
        "aggregations: {}, group fields: {}, span: {}",
        clause.aggregations.len(),
        clause.group_by.fields.len(),
        clause
            .group_by
            .span
            .as_ref()
            .map(|s| format!("{}{}", s.expression.literal_value, s.expression.time_unit))
            .unwrap_or_else(|| "none".to_string())
    );
    out.push(fit_line_to_width(&summary, termw));
    out
}

// Print the rendered tables for the current terminal.
pub fn print_stats_clause(clause: &StatsClause) {
    let termw = get_terminal_width();
    crate::tprintln!("[cli.outputformatter] detected terminal width={} columns", termw);
    for line in render_stats_clause(clause, termw) {
        println!("{}", line);
    }
}

fn render_table(cols: &[&str], rows: &[Vec<String>], termw: usize, out: &mut Vec<String>) {
    if rows.is_empty() {
        out.push("  (none)".to_string());
        return;
    }
    let mut widths: Vec<usize> = cols.iter().map(|s| visible_len(s).min(termw)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = visible_len(cell);
            if w > widths[i] { widths[i] = w.min(termw); }
        }
    }
    let sep = build_separator(&widths);
    out.push(fit_line_to_width(&sep, termw));
    out.push(fit_line_to_width(&build_row_header_colored(cols, &widths), termw));
    out.push(fit_line_to_width(&sep, termw));
    for r in rows {
        out.push(fit_line_to_width(&build_row(r, &widths), termw));
    }
    out.push(fit_line_to_width(&sep, termw));
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let (text, align_right) = (truncate(&cell, *w), is_numeric_like(&cell));
        let pad = w.saturating_sub(visible_len(&text));
        s.push(' ');
        if align_right {
            s.push_str(&" ".repeat(pad));
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&" ".repeat(pad));
        }
        s.push_str(" |");
    }
    s
}

// Header row with column names colored green. Padding uses the visible width.
fn build_row_header_colored(cells: &[&str], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let text = truncate(cells.get(i).copied().unwrap_or(""), *w);
        s.push(' ');
        s.push_str(&format!("\x1b[32m{}\x1b[0m", text));
        s.push_str(&" ".repeat(w.saturating_sub(visible_len(&text))));
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    // crude detection for aligning numbers to right
    let st = s.trim();
    if st.is_empty() { return false; }
    let mut has_digit = false;
    for ch in st.chars() {
        if ch.is_ascii_digit() { has_digit = true; continue; }
        if ".-+eE,_".contains(ch) { continue; }
        return false;
    }
    has_digit
}

// --- Terminal fitting & ANSI helpers ---

fn get_terminal_width() -> usize {
    if let Some((Width(w), _)) = terminal_size() {
        return (w as usize).saturating_sub(4).max(20);
    }
    80
}

fn fit_line_to_width(s: &str, maxw: usize) -> String {
    if visible_len(s) <= maxw { return s.to_string(); }
    truncate_preserving_ansi(s, maxw)
}

// Count visible chars, skipping ANSI CSI escape sequences.
fn visible_len(s: &str) -> usize {
    let mut count = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() { break; }
                }
            }
            continue;
        }
        count += 1;
    }
    count
}

// Keep the first `maxw - 1` visible chars plus every escape sequence, then an ellipsis.
fn truncate_preserving_ansi(s: &str, maxw: usize) -> String {
    let keep = maxw.saturating_sub(1);
    let mut out = String::with_capacity(s.len());
    let mut shown = 0usize;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            out.push(ch);
            if chars.peek() == Some(&'[') {
                if let Some(c) = chars.next() { out.push(c); }
                for c in chars.by_ref() {
                    out.push(c);
                    if c.is_ascii_alphabetic() { break; }
                }
            }
            continue;
        }
        if shown < keep {
            out.push(ch);
            shown += 1;
        }
    }
    out.push('…');
    // reset color in case an escape was cut off mid-run
    out.push_str("\x1b[0m");
    out
}
