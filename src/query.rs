pub mod query_common;
pub mod query_parse_span;
pub mod query_parse_stats;
pub mod query_stats_ast;

// Re-export the parse entrypoint and the value types so callers can use
// `crate::query::parse_stats_clause` / `crate::query::StatsClause` directly.
pub use query_parse_span::*;
pub use query_parse_stats::*;
pub use query_stats_ast::*;

#[cfg(test)]
mod tests;
