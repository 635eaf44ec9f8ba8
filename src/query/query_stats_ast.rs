//! Value types produced by the stats clause scan.
//! ---------------------------------------------
//! A `StatsClause` is the aggregation list plus the grouping specification
//! extracted from one query string. The types are plain data: they are built
//! fresh by every parse and never mutated by the parser afterwards.
//! The serde form uses camelCase names (`valueExpression`, `groupBy`, ...).

use serde::{Deserialize, Serialize};

/// A bare identifier referenced in a GROUP BY list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self { Self { name: name.into() } }
}

/// One aggregate function call as written, e.g. `avg(bytes)`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationFunction {
    /// Function identifier, case preserved (`count`, `AVG`, ...)
    pub name: String,
    /// Raw argument text: `*`, a field, an arbitrary expression, or empty
    pub value_expression: String,
    /// Reserved for percentile-family functions; never populated yet
    pub percentile_argument: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSpec {
    /// `AS <alias>` label, empty when none was given
    pub alias: String,
    pub function: AggregationFunction,
}

impl AggregationSpec {
    pub fn new(name: impl Into<String>, value_expression: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            function: AggregationFunction {
                name: name.into(),
                value_expression: value_expression.into(),
                percentile_argument: String::new(),
            },
        }
    }

    /// Label to show for this aggregation: the alias when present, otherwise
    /// the call text rebuilt from the function name and argument.
    pub fn display_label(&self) -> String {
        if !self.alias.is_empty() { return self.alias.clone(); }
        format!("{}({})", self.function.name, self.function.value_expression)
    }
}

/// `SPAN(field, <literal><unit>)` bucketing directive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanExpression {
    pub field: String,
    /// Bucket width digits, kept as text (e.g. "1", "10", "0.5")
    pub literal_value: String,
    /// Unit suffix as written (e.g. "d", "h", "M")
    pub time_unit: String,
    /// Reserved for a numeric/calendar distinction; always empty
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanSpec {
    pub alias: String,
    pub expression: SpanExpression,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBySpec {
    /// Plain group fields in textual order; duplicates are kept
    pub fields: Vec<Field>,
    pub span: Option<SpanSpec>,
}

impl GroupBySpec {
    pub fn is_empty(&self) -> bool { self.fields.is_empty() && self.span.is_none() }

    pub fn field_names(&self) -> Vec<&str> { self.fields.iter().map(|f| f.name.as_str()).collect() }
}

/// Aggregations plus grouping extracted from one query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsClause {
    /// Aggregation calls in order of appearance; repeated calls are kept
    pub aggregations: Vec<AggregationSpec>,
    pub group_by: GroupBySpec,
}

impl StatsClause {
    pub fn is_empty(&self) -> bool { self.aggregations.is_empty() && self.group_by.is_empty() }
}
