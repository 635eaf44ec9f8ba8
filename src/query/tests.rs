use crate::query::query_parse_stats::{parse_stats_clause, ScanStatsParser, StatsClauseParser};
use crate::query::query_stats_ast::*;

fn agg(name: &str, value: &str, alias: &str) -> AggregationSpec { AggregationSpec::new(name, value, alias) }

fn fields(names: &[&str]) -> Vec<Field> { names.iter().map(|n| Field::new(*n)).collect() }

fn assert_no_group_by(c: &StatsClause) {
    assert!(c.group_by.fields.is_empty(), "group fields leaked: {:?}", c.group_by.fields);
    assert!(c.group_by.span.is_none(), "span leaked: {:?}", c.group_by.span);
}

#[test]
fn select_count_with_single_group_field() {
    let c = parse_stats_clause("select count(*), field from index group by field");
    assert_eq!(c.aggregations, vec![agg("count", "*", "")]);
    assert_eq!(c.group_by.fields, fields(&["field"]));
    assert!(c.group_by.span.is_none());
}

#[test]
fn backticked_fields_match_bare_fields() {
    let plain = parse_stats_clause("select count(*), field from index group by field");
    let ticked = parse_stats_clause("select count(*), `field` from index group by `field`");
    assert_eq!(plain, ticked);
}

#[test]
fn aliases_span_and_trailing_limit() {
    let c = parse_stats_clause("select a, count(*) as b, avg(c) as d from index where 1 = 1 group by span(a, 1d) as e, f, g limit 10");
    assert_eq!(c.aggregations, vec![agg("count", "*", "b"), agg("avg", "c", "d")]);
    let span = c.group_by.span.as_ref().expect("span parsed");
    assert_eq!(span.alias, "e");
    assert_eq!(span.expression.field, "a");
    assert_eq!(span.expression.literal_value, "1");
    assert_eq!(span.expression.time_unit, "d");
    assert_eq!(c.group_by.fields, fields(&["f", "g"]));
}

#[test]
fn piped_stats_without_from_or_group_by() {
    let c = parse_stats_clause("source=accounts | stats count()");
    assert_eq!(c.aggregations, vec![agg("count", "", "")]);
    assert_no_group_by(&c);
}

#[test]
fn duplicate_group_fields_are_kept() {
    let c = parse_stats_clause("select count(*) from t group by a, a");
    assert_eq!(c.group_by.fields, fields(&["a", "a"]));
}

#[test]
fn repeated_aggregations_are_kept_in_order() {
    let c = parse_stats_clause("SELECT max(x), min(x), max(x) FROM t");
    let names: Vec<&str> = c.aggregations.iter().map(|a| a.function.name.as_str()).collect();
    assert_eq!(names, vec!["max", "min", "max"]);
}

#[test]
fn span_without_unit_is_not_a_span() {
    let c = parse_stats_clause("SELECT count(*) FROM people GROUP BY SPAN(age, 10) AS age_span");
    assert!(c.group_by.span.is_none(), "span must need both amount and unit: {:?}", c.group_by.span);
    assert!(c.group_by.fields.is_empty(), "call name leaked as field: {:?}", c.group_by.fields);
    assert_eq!(c.aggregations, vec![agg("count", "*", "")]);
}

#[test]
fn span_without_amount_is_not_a_span() {
    let c = parse_stats_clause("SELECT count(*) FROM people GROUP BY SPAN(age, d)");
    assert!(c.group_by.span.is_none());
}

#[test]
fn no_group_by_keyword_means_empty_group_by() {
    let c = parse_stats_clause("select sum(bytes) as total from logs where status = 500");
    assert_eq!(c.aggregations, vec![agg("sum", "bytes", "total")]);
    assert_no_group_by(&c);
}

#[test]
fn mixed_case_keywords() {
    let c = parse_stats_clause("SeLeCt AVG(latency) As p FrOm svc GrOuP bY host");
    assert_eq!(c.aggregations, vec![agg("AVG", "latency", "p")]);
    assert_eq!(c.group_by.fields, fields(&["host"]));
}

#[test]
fn missing_select_keyword_is_tolerated() {
    let c = parse_stats_clause("count(*), max(bytes) from logs group by host");
    assert_eq!(c.aggregations, vec![agg("count", "*", ""), agg("max", "bytes", "")]);
    assert_eq!(c.group_by.fields, fields(&["host"]));
}

#[test]
fn span_together_with_plain_fields() {
    let c = parse_stats_clause("select count(*) from logs group by span(timestamp,1h), host, `region`");
    let span = c.group_by.span.expect("span parsed");
    assert_eq!(span.alias, "");
    assert_eq!(span.expression.field, "timestamp");
    assert_eq!(span.expression.literal_value, "1");
    assert_eq!(span.expression.time_unit, "h");
    assert_eq!(c.group_by.fields, fields(&["host", "region"]));
}

#[test]
fn span_only_followed_by_keyword_has_no_fields() {
    let c = parse_stats_clause("select count(*) from logs group by span(ts, 10y) limit 5");
    assert_eq!(c.group_by.span.as_ref().map(|s| s.expression.time_unit.as_str()), Some("y"));
    assert_eq!(c.group_by.span.as_ref().map(|s| s.expression.literal_value.as_str()), Some("10"));
    assert!(c.group_by.fields.is_empty(), "keyword after span leaked as field: {:?}", c.group_by.fields);
}

#[test]
fn empty_and_trailing_delimiters_produce_no_fields() {
    let c = parse_stats_clause("select count(*) from t group by a, , b,");
    assert_eq!(c.group_by.fields, fields(&["a", "b"]));
    let c = parse_stats_clause("select count(*) from t group by a ,b , ``");
    assert_eq!(c.group_by.fields, fields(&["a", "b"]));
}

#[test]
fn value_expression_is_opaque_and_keeps_backticks() {
    let c = parse_stats_clause("select sum(`bytes` * 8) as bits from t");
    assert_eq!(c.aggregations, vec![agg("sum", "`bytes` * 8", "bits")]);
}

#[test]
fn percentile_argument_and_span_kind_are_known_unimplemented() {
    // both stay empty until the grammar is extended
    let c = parse_stats_clause("select percentile(latency, 95) from t group by span(ts, 5m)");
    assert_eq!(c.aggregations.len(), 1);
    assert_eq!(c.aggregations[0].function.value_expression, "latency, 95");
    assert_eq!(c.aggregations[0].function.percentile_argument, "");
    assert_eq!(c.group_by.span.as_ref().map(|s| s.expression.kind.as_str()), Some(""));
}

#[test]
fn calls_not_ending_a_list_item_are_skipped() {
    let c = parse_stats_clause("select avg(x) from t where abs(y) > 1 group by z");
    assert_eq!(c.aggregations, vec![agg("avg", "x", "")]);
    assert_eq!(c.group_by.fields, fields(&["z"]));
}

#[test]
fn predicate_operands_are_not_aggregations() {
    let c = parse_stats_clause("source=t | where isnotnull(a) | stats count() by host");
    assert_eq!(c.aggregations, vec![agg("count", "", "")]);
    assert_eq!(c.group_by.fields, fields(&["host"]));
}

#[test]
fn nested_calls_do_not_produce_outer_aggregation() {
    let c = parse_stats_clause("select round(avg(x)), count(*) from t");
    assert_eq!(c.aggregations, vec![agg("count", "*", "")]);
}

#[test]
fn ppl_stats_by_with_span_and_fields() {
    let c = parse_stats_clause("source=logs | stats avg(bytes) as b, count() by span(timestamp, 1h) as hour, host | sort host");
    assert_eq!(c.aggregations, vec![agg("avg", "bytes", "b"), agg("count", "", "")]);
    let span = c.group_by.span.as_ref().expect("span parsed");
    assert_eq!(span.alias, "hour");
    assert_eq!(span.expression.field, "timestamp");
    assert_eq!(c.group_by.fields, fields(&["host"]));
}

#[test]
fn order_by_is_not_grouping() {
    let c = parse_stats_clause("select count(*) as n from t group by a order by n");
    assert_eq!(c.group_by.fields, fields(&["a"]));
    let c = parse_stats_clause("select count(*) from t order by x");
    assert_no_group_by(&c);
}

#[test]
fn quoted_aliases_are_unwrapped() {
    let c = parse_stats_clause("select count(*) as `total rows` from t group by span(`@timestamp`, 1d) as \"day\"");
    assert_eq!(c.aggregations[0].alias, "total rows");
    let span = c.group_by.span.expect("span parsed");
    assert_eq!(span.alias, "day");
    assert_eq!(span.expression.field, "@timestamp");
}

#[test]
fn commented_out_text_is_ignored() {
    let c = parse_stats_clause("select count(*) -- , max(x)\n, min(y) /* , sum(z) */ from t group by a");
    assert_eq!(c.aggregations, vec![agg("count", "*", ""), agg("min", "y", "")]);
    assert_eq!(c.group_by.fields, fields(&["a"]));
}

#[test]
fn unrecognized_input_yields_empty_clause() {
    for q in ["", "   ", "hello world", "select from where", "))((", "group", "by", "order by x"] {
        let c = parse_stats_clause(q);
        assert!(c.is_empty(), "expected empty clause for {:?}, got {:?}", q, c);
    }
}

#[test]
fn parse_is_idempotent_and_does_not_leak_between_calls() {
    let q = "select count(*) as c from t group by span(ts, 1d), host";
    let first = parse_stats_clause(q);
    let second = parse_stats_clause(q);
    assert_eq!(first, second);
    let other = parse_stats_clause("select sum(v) from t");
    assert_no_group_by(&other);
    assert_eq!(other.aggregations.len(), 1);
}

#[test]
fn trait_object_matches_free_function() {
    let parser: &dyn StatsClauseParser = &ScanStatsParser;
    let q = "source=x | stats max(v) by k";
    assert_eq!(parser.parse(q), parse_stats_clause(q));
}

#[test]
fn display_label_prefers_alias() {
    let c = parse_stats_clause("select count(*), avg(x) as mean from t");
    let labels: Vec<String> = c.aggregations.iter().map(|a| a.display_label()).collect();
    assert_eq!(labels, vec!["count(*)".to_string(), "mean".to_string()]);
}

#[test]
fn by_inside_string_literals_is_not_grouping() {
    let c = parse_stats_clause("select count(*) from t where note = 'sent by mail'");
    assert_eq!(c.aggregations, vec![agg("count", "*", "")]);
    assert_no_group_by(&c);
    let c = parse_stats_clause("source=t | where msg = 'done by hand' | stats count()");
    assert_eq!(c.aggregations, vec![agg("count", "", "")]);
    assert_no_group_by(&c);
    let c = parse_stats_clause("source=t | where msg = \"by (x)\" | stats max(v) by k");
    assert_eq!(c.aggregations, vec![agg("max", "v", "")]);
    assert_eq!(c.group_by.fields, fields(&["k"]));
}

#[test]
fn bare_by_groups_only_inside_stats_commands() {
    let c = parse_stats_clause("select count(*) from t where note = sent by mail");
    assert_no_group_by(&c);
    let c = parse_stats_clause("source=t | stats count() | where host by x");
    assert_no_group_by(&c);
    let c = parse_stats_clause("source=t | eventstats avg(x) by host");
    assert_eq!(c.group_by.fields, fields(&["host"]));
}

#[test]
fn quoted_text_in_arguments_is_kept_verbatim() {
    let c = parse_stats_clause("select count(*), max(len('a, b) from')) from t");
    assert_eq!(c.aggregations, vec![agg("count", "*", "")]);
    let c = parse_stats_clause("select count_distinct('a|b') as n from t");
    assert_eq!(c.aggregations, vec![agg("count_distinct", "'a|b'", "n")]);
}

#[test]
fn statement_terminator_is_not_part_of_a_field() {
    let c = parse_stats_clause("select count(*) from t group by host;");
    assert_eq!(c.group_by.field_names(), vec!["host"]);
    let c = parse_stats_clause("select count(*) from t group by a, b;");
    assert_eq!(c.group_by.fields, fields(&["a", "b"]));
    let c = parse_stats_clause("select count(*) from t group by span(ts, 1h), a;");
    assert_eq!(c.group_by.fields, fields(&["a"]));
    let c = parse_stats_clause("select count(*);");
    assert_eq!(c.aggregations, vec![agg("count", "*", "")]);
}

#[test]
fn span_after_plain_fields_is_a_span() {
    let c = parse_stats_clause("select count(*) from t group by host, span(ts, 1h) as hour, region");
    let span = c.group_by.span.as_ref().expect("span parsed");
    assert_eq!(span.alias, "hour");
    assert_eq!(span.expression.field, "ts");
    assert_eq!(span.expression.time_unit, "h");
    assert_eq!(c.group_by.fields, fields(&["host", "region"]));
}

#[test]
fn call_names_in_group_list_are_not_fields() {
    let c = parse_stats_clause("select count(*) from t group by host, round(x)");
    assert_eq!(c.group_by.fields, fields(&["host"]));
    assert!(c.group_by.span.is_none());
    let c = parse_stats_clause("select count(*) from t group by host, span(ts, 10)");
    assert_eq!(c.group_by.fields, fields(&["host"]));
    assert!(c.group_by.span.is_none());
}

#[test]
fn double_quoted_group_fields_are_unwrapped() {
    let c = parse_stats_clause("select count(*) from t group by \"host name\", x");
    assert_eq!(c.group_by.fields, fields(&["host name", "x"]));
}
