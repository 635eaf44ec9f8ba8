pub mod outputformatter;

pub use outputformatter::{print_stats_clause, render_stats_clause};

use crate::error::{AppError, AppResult};
use crate::query::StatsClause;

/// JSON output is forced when `STATSCLAUSE_OUTPUT=json`, otherwise follows the flag.
pub fn wants_json(flag: bool) -> bool {
    flag || std::env::var("STATSCLAUSE_OUTPUT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false)
}

/// Print one parsed clause either as pretty JSON or as tables.
pub fn emit_stats_clause(clause: &StatsClause, json: bool) -> AppResult<()> {
    if json {
        let s = serde_json::to_string_pretty(clause)?;
        println!("{}", s);
    } else {
        print_stats_clause(clause);
    }
    Ok(())
}

/// Reject blank query text before parsing.
pub fn require_query_text(text: &str) -> AppResult<&str> {
    let t = text.trim();
    if t.is_empty() {
        return Err(AppError::user("empty_query", "query text is empty"));
    }
    Ok(t)
}
