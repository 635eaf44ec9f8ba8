use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Match, Regex};
use tracing::{debug, trace};

use crate::query::query_common::*;
use crate::query::query_stats_ast::*;

/// Contract for anything that can turn query text into a `StatsClause`.
/// Implementations must never fail: text they do not understand is skipped.
pub trait StatsClauseParser {
    fn parse(&self, query: &str) -> StatsClause;
}

/// Single-pass scanner over the raw text. Stopgap until a grammar-based
/// parser exists; callers should depend on `StatsClauseParser` or
/// `parse_stats_clause` only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanStatsParser;

impl StatsClauseParser for ScanStatsParser {
    fn parse(&self, query: &str) -> StatsClause { scan_stats_clause(query) }
}

/// Extract aggregations and grouping from `query`. Always returns a value.
pub fn parse_stats_clause(query: &str) -> StatsClause { ScanStatsParser.parse(query) }

// One group field or span field: backticked, double-quoted, or a bare run.
const FIELD_TOKEN: &str = r#"(?:`[^`]*`|"[^"]*"|[^\s,()`";|]+)"#;
const ALIAS_TOKEN: &str = r#"(?:`[^`]*`|"[^"]*"|[a-z0-9_.]+)"#;

// SPAN(<field>, <amount><unit>) [AS alias], then the fields listed after it.
// Fields after a span need a leading comma, so a following keyword (LIMIT ...) is never taken as a field.
fn span_pattern() -> String {
    format!(
        r#"SPAN\s*\(\s*
            (?P<span_field>{field})
            \s*,\s*
            (?P<span_value>[0-9]+(?:\.[0-9]+)?)
            \s*
            (?P<span_unit>[a-z]+)
        \s*\)
        (?:\s+AS\s+(?P<span_alias>{alias}))?
        (?P<span_fields>
            (?:\s*,)+\s*
            {field}
            (?:(?:\s*,)+\s*{field})*
            (?:\s*,)*
        )?"#,
        field = FIELD_TOKEN,
        alias = ALIAS_TOKEN,
    )
}

// Two clause shapes in one alternation; whichever matches first (leftmost)
// at the current position wins and the scan resumes after it.
static STATS_CLAUSE_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r#"(?ix)
        (?P<call>
            \b(?P<func>[a-z_][a-z0-9_]*)
            \(
            (?P<arg>[^()]*)
            \)
            (?:\s+AS\s+(?P<alias>{alias}))?
        )
        |
        (?P<group>
            (?P<by_kw>\bGROUP\s+BY\b|\bBY\b)
            (?:
                \s*{span}
            |
                (?P<fields>
                    (?:\s*,)*\s*
                    {field}
                    (?:(?:\s*,)+\s*{field})*
                    (?:\s*,)*
                )?
            )
        )"#,
        alias = ALIAS_TOKEN,
        span = span_pattern(),
        field = FIELD_TOKEN,
    );
    Regex::new(&pattern).expect("stats clause pattern compiles")
});

// A span written after plain fields, e.g. `by host, span(ts, 1h)`.
static SPAN_ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("(?ix)^{}", span_pattern())).expect("span item pattern compiles")
});

// Words after which a bare BY does not introduce grouping.
const NON_GROUPING_BY: &[&str] = &["ORDER", "SORT", "PARTITION", "CLUSTER", "DISTRIBUTE"];

// PPL commands whose trailing bare BY introduces grouping.
const PPL_STATS_COMMANDS: &[&str] = &["STATS", "EVENTSTATS"];

// Words after which a call is a predicate operand rather than a requested aggregation.
const PREDICATE_WORDS: &[&str] = &["WHERE", "AND", "OR", "NOT", "HAVING", "ON", "WHEN", "THEN", "ELSE", "IN", "IS", "LIKE"];

// Matching runs on `scan`, where quoted bodies are blanked; captured text is
// read back from `src` at the same offsets.
fn scan_stats_clause(query: &str) -> StatsClause {
    let src = strip_sql_comments(query);
    let scan = blank_quoted_text(&src);
    debug!(target: "statsclause::parser", "scan stats clause: {} chars (sql starts with='{}...')", src.len(), src.chars().take(80).collect::<String>());

    let mut clause = StatsClause::default();
    let mut pos = 0usize;
    while pos < scan.len() {
        let Some(caps) = STATS_CLAUSE_RE.captures_at(&scan, pos) else { break };
        let whole = match caps.get(0) { Some(m) => m, None => break };
        if caps.name("call").is_some() {
            accept_call(&src, &scan, &caps, &mut clause);
            pos = whole.end();
        } else {
            pos = accept_group_by(&src, &scan, &caps, &mut clause);
        }
    }

    debug!(
        target: "statsclause::parser",
        "stats clause: aggregations={}, group fields={:?}, span={}",
        clause.aggregations.len(),
        clause.group_by.field_names(),
        clause.group_by.span.is_some()
    );
    clause
}

// Text of `m` (matched at offset `base` of the scan text) as written in `src`.
fn source<'a>(src: &'a str, base: usize, m: Match<'_>) -> &'a str {
    src.get(base + m.start()..base + m.end()).unwrap_or_default()
}

fn accept_call(src: &str, scan: &str, caps: &Captures<'_>, clause: &mut StatsClause) {
    let (Some(whole), Some(func)) = (caps.get(0), caps.name("func")) else { return };
    let arg = caps.name("arg").map(|m| source(src, 0, m).trim()).unwrap_or("");

    if !call_is_terminated(&scan[whole.end()..]) {
        trace!(target: "statsclause::parser", "skip call '{}' at {}: no list terminator follows", source(src, 0, whole), whole.start());
        return;
    }
    let before = preceding_word(scan, whole.start());
    if PREDICATE_WORDS.iter().any(|w| before.eq_ignore_ascii_case(w)) {
        trace!(target: "statsclause::parser", "skip call '{}' at {}: operand of {}", source(src, 0, whole), whole.start(), before);
        return;
    }

    let alias = caps.name("alias").map(|m| unquote_identifier(source(src, 0, m))).unwrap_or_default();
    debug!(target: "statsclause::parser", "aggregation: {}({}) alias='{}'", func.as_str(), arg, alias);
    clause.aggregations.push(AggregationSpec::new(func.as_str(), arg, alias));
}

// An aggregation call ends the select/stats list item: it must be followed by a
// comma, FROM, the PPL BY keyword, a pipe, a statement terminator, or the end of the text.
fn call_is_terminated(rest: &str) -> bool {
    let r = rest.trim_start();
    r.is_empty()
        || r.starts_with(',')
        || r.starts_with('|')
        || r.starts_with(';')
        || starts_with_keyword_ci(r, "FROM")
        || starts_with_keyword_ci(r, "BY")
}

// Applies one group-by match and returns the position to resume scanning from.
fn accept_group_by(src: &str, scan: &str, caps: &Captures<'_>, clause: &mut StatsClause) -> usize {
    let (Some(whole), Some(kw)) = (caps.get(0), caps.name("by_kw")) else { return scan.len() };

    if kw.as_str().eq_ignore_ascii_case("BY") && !bare_by_groups(scan, kw.start()) {
        return kw.end();
    }

    apply_span(src, 0, caps, clause);
    let list = caps.name("span_fields").or_else(|| caps.name("fields")).map(|m| m.range());
    apply_field_list(src, scan, list, whole.end(), clause)
}

// A bare BY groups only inside a PPL stats command, i.e. when the pipe
// segment it sits in starts with `stats`, and never as ORDER BY and the like.
fn bare_by_groups(scan: &str, at: usize) -> bool {
    let before = preceding_word(scan, at);
    if NON_GROUPING_BY.iter().any(|w| before.eq_ignore_ascii_case(w)) {
        trace!(target: "statsclause::parser", "skip '{} BY' at {}", before, at);
        return false;
    }
    let segment = scan[..at].rsplit('|').next().unwrap_or("").trim_start();
    let in_stats = PPL_STATS_COMMANDS.iter().any(|c| starts_with_keyword_ci(segment, c));
    if !in_stats {
        trace!(target: "statsclause::parser", "skip BY at {}: not inside a stats command", at);
    }
    in_stats
}

fn apply_span(src: &str, base: usize, caps: &Captures<'_>, clause: &mut StatsClause) {
    let (Some(field), Some(value), Some(unit)) = (caps.name("span_field"), caps.name("span_value"), caps.name("span_unit")) else { return };
    let span = SpanSpec {
        alias: caps.name("span_alias").map(|m| unquote_identifier(source(src, base, m))).unwrap_or_default(),
        expression: SpanExpression {
            field: normalize_field_token(source(src, base, field)),
            literal_value: value.as_str().to_string(),
            time_unit: unit.as_str().to_string(),
            kind: String::new(),
        },
    };
    debug!(target: "statsclause::parser", "[GROUP BY] span: {:?}", span);
    clause.group_by.span = Some(span);
}

// Pushes the fields of `list` (a byte range of `scan`) and returns the position
// to resume scanning from. A last token directly followed by `(` names a call
// rather than a column: a well-formed SPAN there is applied (with any fields
// after it), anything else is dropped.
fn apply_field_list(src: &str, scan: &str, mut list: Option<Range<usize>>, mut resume: usize, clause: &mut StatsClause) -> usize {
    while let Some(range) = list.take() {
        let raw = &scan[range.clone()];
        let call_follows = !raw.trim_end().ends_with(',') && scan[range.end..].trim_start().starts_with('(');
        let (list_end, call_at) = match (call_follows, raw.rfind(',')) {
            (false, _) => (range.end, None),
            (true, Some(i)) => (range.start + i, Some(range.start + i + 1)),
            (true, None) => (range.start, Some(range.start)),
        };

        debug!(target: "statsclause::parser", "[GROUP BY] raw field list: '{}'", src.get(range.start..list_end).unwrap_or_default());
        for token in split_fields(src, scan, range.start, list_end) {
            let name = normalize_field_token(token);
            if name.is_empty() { continue; }
            clause.group_by.fields.push(Field::new(name));
        }

        let Some(at) = call_at else { break };
        let at = at + (scan[at..].len() - scan[at..].trim_start().len());
        match SPAN_ITEM_RE.captures(&scan[at..]) {
            Some(item) => {
                apply_span(src, at, &item, clause);
                list = item.name("span_fields").map(|m| at + m.start()..at + m.end());
                resume = resume.max(at + item.get(0).map_or(0, |m| m.end()));
            }
            None => {
                trace!(target: "statsclause::parser", "[GROUP BY] drop '{}': names a call, not a field", src.get(at..range.end).unwrap_or_default());
            }
        }
    }
    resume
}

// Splits `start..end` at the commas of `scan` (commas inside quoted names are
// blanked there) and returns the matching pieces of `src`.
fn split_fields<'a>(src: &'a str, scan: &str, start: usize, end: usize) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut from = start;
    for (i, _) in scan[start..end].match_indices(',') {
        out.push(src.get(from..start + i).unwrap_or_default());
        from = start + i + 1;
    }
    out.push(src.get(from..end).unwrap_or_default());
    out
}
