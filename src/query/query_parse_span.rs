use crate::query::query_stats_ast::SpanExpression;

/// Classification of a span unit suffix.
/// Fixed units have a constant width in milliseconds; calendar units
/// (month, quarter, year) do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    Unknown,
}

impl SpanUnit {
    /// Map a unit suffix as written to a unit. `m` is minute and `M` is month;
    /// every other suffix matches case-insensitively.
    pub fn from_suffix(unit: &str) -> SpanUnit {
        let u = unit.trim();
        if u == "M" { return SpanUnit::Month; }
        if u == "m" { return SpanUnit::Minute; }
        match u.to_ascii_lowercase().as_str() {
            "ms" | "millisecond" | "milliseconds" => SpanUnit::Millisecond,
            "s" | "sec" | "second" | "seconds" => SpanUnit::Second,
            "min" | "minute" | "minutes" => SpanUnit::Minute,
            "h" | "hour" | "hours" => SpanUnit::Hour,
            "d" | "day" | "days" => SpanUnit::Day,
            "w" | "week" | "weeks" => SpanUnit::Week,
            "month" | "months" => SpanUnit::Month,
            "q" | "quarter" | "quarters" => SpanUnit::Quarter,
            "y" | "year" | "years" => SpanUnit::Year,
            _ => SpanUnit::Unknown,
        }
    }

    pub fn is_calendar(self) -> bool {
        matches!(self, SpanUnit::Month | SpanUnit::Quarter | SpanUnit::Year)
    }

    /// Width of one unit in milliseconds, for fixed units only.
    pub fn fixed_ms(self) -> Option<i64> {
        match self {
            SpanUnit::Millisecond => Some(1),
            SpanUnit::Second => Some(1_000),
            SpanUnit::Minute => Some(60_000),
            SpanUnit::Hour => Some(3_600_000),
            SpanUnit::Day => Some(86_400_000),
            SpanUnit::Week => Some(604_800_000),
            _ => None,
        }
    }
}

impl SpanExpression {
    pub fn unit(&self) -> SpanUnit { SpanUnit::from_suffix(&self.time_unit) }

    pub fn is_calendar(&self) -> bool { self.unit().is_calendar() }

    /// Bucket width in milliseconds, e.g. `1h` -> 3_600_000.
    /// `None` for calendar or unknown units and for literals that are not numbers.
    pub fn fixed_interval_ms(&self) -> Option<i64> {
        let per_unit = self.unit().fixed_ms()?;
        let n: f64 = self.literal_value.trim().parse().ok()?;
        if !n.is_finite() || n < 0.0 { return None; }
        Some((n * per_unit as f64).round() as i64)
    }
}
