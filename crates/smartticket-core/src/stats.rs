//! Apprehension statistics: frequency tables per dimension and the
//! recommendation derived from the busiest one.
//!
//! Every report render rebuilds the tables from the full record set. Tables
//! keep keys in first-seen order, so "the first key with the peak count" is
//! well defined and follows the order records came back from the store.

use std::collections::HashMap;
use std::fmt::{self, Display};

use chrono::{Local, TimeZone};
use tracing::debug;

use crate::apprehension::ApprehensionRecord;
use crate::dates;

/// Fallback text when no dimension has any count.
pub const NO_SIGNIFICANT_ISSUES: &str =
    "No significant issues detected. Continue with the current strategy.";

/// Number of violations shown on the frequency chart.
pub const TOP_VIOLATIONS: usize = 10;

// ── FrequencyTable ──

/// Insertion-ordered key → count mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to `key`, creating the bucket at zero on first sight.
    pub fn increment(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.index.get(key).map(|&i| self.entries[i].1).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Buckets in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Largest count, or 0 for an empty table.
    pub fn max(&self) -> u64 {
        self.entries.iter().map(|(_, c)| *c).max().unwrap_or(0)
    }

    /// First key (in table order) holding the largest count.
    pub fn peak(&self) -> Option<(&str, u64)> {
        let max = self.max();
        self.iter().find(|&(_, c)| c == max && c > 0)
    }

    /// Buckets sorted by count descending, ties kept in table order, truncated to `n`.
    pub fn top_n(&self, n: usize) -> Vec<(&str, u64)> {
        let mut sorted: Vec<(&str, u64)> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }
}

impl<'a> FromIterator<&'a str> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut table = Self::new();
        for key in iter {
            table.increment(key);
        }
        table
    }
}

// ── Dimensions ──

/// Reporting dimensions in recommendation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Daily,
    Monthly,
    Yearly,
    Location,
    Violation,
}

impl Dimension {
    /// Evaluation order; on equal peaks the earlier dimension wins.
    pub const ORDER: [Dimension; 5] = [
        Self::Daily,
        Self::Monthly,
        Self::Yearly,
        Self::Location,
        Self::Violation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Location => "location",
            Self::Violation => "violation",
        }
    }

    /// Chart series label.
    pub fn chart_label(&self) -> &'static str {
        match self {
            Self::Daily => "Individuals Apprehended (Daily)",
            Self::Monthly => "Individuals Apprehended (Monthly)",
            Self::Yearly => "Individuals Apprehended (Yearly)",
            Self::Location => "Apprehensions by Location",
            Self::Violation => "Violation Frequency",
        }
    }
}

/// The five tables built from one record set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTables {
    pub daily: FrequencyTable,
    pub monthly: FrequencyTable,
    pub yearly: FrequencyTable,
    pub location: FrequencyTable,
    pub violation: FrequencyTable,
}

impl FrequencyTables {
    pub fn table(&self, dimension: Dimension) -> &FrequencyTable {
        match dimension {
            Dimension::Daily => &self.daily,
            Dimension::Monthly => &self.monthly,
            Dimension::Yearly => &self.yearly,
            Dimension::Location => &self.location,
            Dimension::Violation => &self.violation,
        }
    }
}

/// Build all five tables with calendar keys in the viewer's local zone.
pub fn build_frequency_tables(records: &[ApprehensionRecord]) -> FrequencyTables {
    build_frequency_tables_in(records, &Local)
}

/// Build all five tables with calendar keys in `tz`.
///
/// Each record adds one to its day, month, year and location buckets, and one
/// to the bucket of every named violation it carries.
pub fn build_frequency_tables_in<Tz>(records: &[ApprehensionRecord], tz: &Tz) -> FrequencyTables
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut tables = FrequencyTables::default();
    for record in records {
        tables
            .daily
            .increment(&dates::date_label(record.timestamp, tz));
        tables
            .monthly
            .increment(dates::month_abbr(record.timestamp, tz));
        tables
            .yearly
            .increment(&dates::year_label(record.timestamp, tz));
        tables.location.increment(&record.address);
        for name in record.violation_names() {
            tables.violation.increment(name);
        }
    }
    debug!(
        records = records.len(),
        days = tables.daily.len(),
        locations = tables.location.len(),
        violations = tables.violation.len(),
        "built frequency tables"
    );
    tables
}

// ── Recommendation ──

/// The busiest dimension and its peak, or none when every table is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub dimension: Option<Dimension>,
    pub peak: u64,
    /// Bucket holding the peak, for location and violation.
    pub key: Option<String>,
}

impl Recommendation {
    pub fn from_tables(tables: &FrequencyTables) -> Self {
        let mut winner: Option<(Dimension, u64)> = None;
        for dimension in Dimension::ORDER {
            let max = tables.table(dimension).max();
            let best = winner.map(|(_, m)| m).unwrap_or(0);
            if max > best {
                winner = Some((dimension, max));
            }
        }

        match winner {
            Some((dimension, peak)) => {
                let key = match dimension {
                    Dimension::Location | Dimension::Violation => tables
                        .table(dimension)
                        .peak()
                        .map(|(k, _)| k.to_string()),
                    _ => None,
                };
                Self {
                    dimension: Some(dimension),
                    peak,
                    key,
                }
            }
            None => Self {
                dimension: None,
                peak: 0,
                key: None,
            },
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.peak;
        let key = self.key.as_deref().unwrap_or_default();
        match self.dimension {
            Some(Dimension::Daily) => write!(
                f,
                "Daily apprehensions are unusually high ({n}). Increase monitoring efforts today."
            ),
            Some(Dimension::Monthly) => write!(
                f,
                "This month has a significant number of cases ({n}). Consider reviewing policies and resource allocation."
            ),
            Some(Dimension::Yearly) => write!(
                f,
                "Yearly apprehensions are peaking at {n}. A long-term strategic plan is recommended."
            ),
            Some(Dimension::Location) => write!(
                f,
                "The location with the highest apprehensions ({n}) is {key}. Deploy additional resources here."
            ),
            Some(Dimension::Violation) => write!(
                f,
                "The most frequent violation is {key} with {n} occurrences. Consider targeted awareness campaigns and stricter enforcement."
            ),
            None => f.write_str(NO_SIGNIFICANT_ISSUES),
        }
    }
}

/// Recommendation text for a set of frequency tables.
pub fn recommend(tables: &FrequencyTables) -> String {
    Recommendation::from_tables(tables).to_string()
}

// ── Chart series ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    HorizontalBar,
}

/// One chart: a label plus ordered (bucket, count) points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSeries {
    pub dimension: Dimension,
    pub kind: ChartKind,
    pub points: Vec<(String, u64)>,
}

impl ChartSeries {
    pub fn label(&self) -> &'static str {
        self.dimension.chart_label()
    }
}

/// Everything the statistics page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsReport {
    pub series: Vec<ChartSeries>,
    pub recommendation: String,
}

impl StatisticsReport {
    /// Chart series in page order plus the recommendation.
    ///
    /// The violation chart is limited to the [`TOP_VIOLATIONS`] most frequent names.
    pub fn from_tables(tables: &FrequencyTables) -> Self {
        let owned = |points: Vec<(&str, u64)>| -> Vec<(String, u64)> {
            points.into_iter().map(|(k, c)| (k.to_string(), c)).collect()
        };
        let series = Dimension::ORDER
            .into_iter()
            .map(|dimension| {
                let table = tables.table(dimension);
                let (kind, points) = match dimension {
                    Dimension::Daily => (ChartKind::Line, owned(table.iter().collect())),
                    Dimension::Violation => (
                        ChartKind::HorizontalBar,
                        owned(table.top_n(TOP_VIOLATIONS)),
                    ),
                    _ => (ChartKind::Bar, owned(table.iter().collect())),
                };
                ChartSeries {
                    dimension,
                    kind,
                    points,
                }
            })
            .collect();
        Self {
            series,
            recommendation: recommend(tables),
        }
    }
}

// ── Dashboard ──

/// Dashboard charts: apprehensions per full month name and per location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardTables {
    pub monthly: FrequencyTable,
    pub location: FrequencyTable,
}

/// Build the dashboard tables, keeping only records in `month` (a full month
/// name such as `March`) when one is given. An empty name means all records.
pub fn dashboard_tables_in<Tz: TimeZone>(
    records: &[ApprehensionRecord],
    month: Option<&str>,
    tz: &Tz,
) -> DashboardTables {
    let month = month.filter(|m| !m.is_empty());
    let mut tables = DashboardTables::default();
    for record in records {
        let name = dates::month_name(record.timestamp, tz);
        if month.is_some_and(|m| m != name) {
            continue;
        }
        tables.monthly.increment(name);
        tables.location.increment(&record.address);
    }
    tables
}

pub fn dashboard_tables(records: &[ApprehensionRecord], month: Option<&str>) -> DashboardTables {
    dashboard_tables_in(records, month, &Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apprehension::{PaymentStatus, Violation};
    use chrono::Utc;

    // 2024-03-05T08:00:00Z
    const MAR_5_2024: i64 = 1_709_625_600;
    // 2024-03-06T08:00:00Z
    const MAR_6_2024: i64 = MAR_5_2024 + 86_400;
    // 2023-03-05T08:00:00Z
    const MAR_5_2023: i64 = MAR_5_2024 - 366 * 86_400;
    // 2024-07-01T00:00:00Z
    const JUL_1_2024: i64 = 1_719_792_000;

    fn record(ts: i64, address: &str, violations: &[&str]) -> ApprehensionRecord {
        ApprehensionRecord {
            timestamp: ts,
            address: address.to_string(),
            status: PaymentStatus::Unpaid,
            selected_violations: violations.iter().map(|v| Violation::named(*v)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn month_and_year_tables_partition_records() {
        let records = vec![
            record(MAR_5_2024, "Elm St", &["No Helmet"]),
            record(MAR_6_2024, "Oak Ave", &[]),
            record(MAR_5_2023, "Elm St", &["Speeding", "No Helmet"]),
            record(JUL_1_2024, "Pine Rd", &["Speeding"]),
        ];
        let tables = build_frequency_tables_in(&records, &Utc);
        assert_eq!(tables.monthly.total(), records.len() as u64);
        assert_eq!(tables.yearly.total(), records.len() as u64);
        assert_eq!(tables.daily.total(), records.len() as u64);
        assert_eq!(tables.location.total(), records.len() as u64);
    }

    #[test]
    fn months_collapse_across_years() {
        let records = vec![
            record(MAR_5_2024, "Elm St", &[]),
            record(MAR_5_2023, "Elm St", &[]),
        ];
        let tables = build_frequency_tables_in(&records, &Utc);
        assert_eq!(tables.monthly.get("Mar"), 2);
        assert_eq!(tables.yearly.get("2024"), 1);
        assert_eq!(tables.yearly.get("2023"), 1);
        assert_eq!(tables.daily.get("3/5/2024"), 1);
        assert_eq!(tables.daily.get("3/5/2023"), 1);
    }

    #[test]
    fn each_violation_is_its_own_increment() {
        let records = vec![record(MAR_5_2024, "Elm St", &["A", "B", "C"])];
        let tables = build_frequency_tables_in(&records, &Utc);
        assert_eq!(tables.violation.len(), 3);
        assert_eq!(tables.violation.total(), 3);
        assert_eq!(tables.violation.get("B"), 1);
    }

    #[test]
    fn missing_violations_contribute_nothing() {
        let records = vec![record(MAR_5_2024, "Elm St", &[])];
        let tables = build_frequency_tables_in(&records, &Utc);
        assert!(tables.violation.is_empty());
        assert_eq!(tables.monthly.total(), 1);
    }

    #[test]
    fn locations_are_case_sensitive() {
        let records = vec![
            record(MAR_5_2024, "Main St", &[]),
            record(MAR_5_2024, "main st", &[]),
        ];
        let tables = build_frequency_tables_in(&records, &Utc);
        assert_eq!(tables.location.len(), 2);
    }

    #[test]
    fn empty_set_gives_fallback_text() {
        let tables = build_frequency_tables_in(&[], &Utc);
        assert_eq!(
            recommend(&tables),
            "No significant issues detected. Continue with the current strategy."
        );
    }

    #[test]
    fn daily_wins_ties_with_monthly() {
        let mut tables = FrequencyTables::default();
        for _ in 0..5 {
            tables.daily.increment("3/5/2024");
            tables.monthly.increment("Mar");
        }
        for _ in 0..3 {
            tables.location.increment("Elm St");
        }
        let rec = Recommendation::from_tables(&tables);
        assert_eq!(rec.dimension, Some(Dimension::Daily));
        assert_eq!(
            rec.to_string(),
            "Daily apprehensions are unusually high (5). Increase monitoring efforts today."
        );
    }

    #[test]
    fn location_beats_calendar_tables_only_when_strictly_greater() {
        let mut tables = FrequencyTables::default();
        tables.daily.increment("3/5/2024");
        tables.yearly.increment("2024");
        tables.location.increment("Elm St");
        // Location equal to daily: daily still wins.
        assert_eq!(
            Recommendation::from_tables(&tables).dimension,
            Some(Dimension::Daily)
        );

        tables.location.increment("Elm St");
        let rec = Recommendation::from_tables(&tables);
        assert_eq!(rec.dimension, Some(Dimension::Location));
        assert_eq!(
            rec.to_string(),
            "The location with the highest apprehensions (2) is Elm St. Deploy additional resources here."
        );
    }

    #[test]
    fn violation_names_the_first_peak_key() {
        let mut tables = FrequencyTables::default();
        for name in ["Speeding", "No Helmet", "No Helmet", "Speeding", "Speeding", "No Helmet"] {
            tables.violation.increment(name);
        }
        let rec = Recommendation::from_tables(&tables);
        assert_eq!(rec.key.as_deref(), Some("Speeding"));
        assert_eq!(
            rec.to_string(),
            "The most frequent violation is Speeding with 3 occurrences. Consider targeted awareness campaigns and stricter enforcement."
        );
    }

    #[test]
    fn monthly_and_yearly_templates() {
        let mut tables = FrequencyTables::default();
        tables.monthly.increment("Mar");
        tables.monthly.increment("Mar");
        assert_eq!(
            recommend(&tables),
            "This month has a significant number of cases (2). Consider reviewing policies and resource allocation."
        );

        let mut tables = FrequencyTables::default();
        tables.yearly.increment("2024");
        assert_eq!(
            recommend(&tables),
            "Yearly apprehensions are peaking at 1. A long-term strategic plan is recommended."
        );
    }

    #[test]
    fn recommend_is_deterministic() {
        let records = vec![
            record(MAR_5_2024, "Elm St", &["No Helmet"]),
            record(MAR_6_2024, "Elm St", &["No Helmet"]),
        ];
        let tables = build_frequency_tables_in(&records, &Utc);
        assert_eq!(recommend(&tables), recommend(&tables.clone()));
        // monthly (2) ties location (2) and violation (2): monthly comes first.
        assert_eq!(
            Recommendation::from_tables(&tables).dimension,
            Some(Dimension::Monthly)
        );
    }

    #[test]
    fn top_n_sorts_descending_and_truncates() {
        let table: FrequencyTable = ["a", "b", "b", "c", "c", "c", "d"].into_iter().collect();
        let top = table.top_n(2);
        assert_eq!(top, vec![("c", 3), ("b", 2)]);
        // Ties keep first-seen order.
        let tied: FrequencyTable = ["x", "y"].into_iter().collect();
        assert_eq!(tied.top_n(10), vec![("x", 1), ("y", 1)]);
    }

    #[test]
    fn statistics_report_has_five_series() {
        let names: Vec<String> = (0..12).map(|i| format!("V{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let records = vec![record(MAR_5_2024, "Elm St", &refs)];
        let tables = build_frequency_tables_in(&records, &Utc);
        let report = StatisticsReport::from_tables(&tables);
        assert_eq!(report.series.len(), 5);
        assert_eq!(report.series[0].kind, ChartKind::Line);
        assert_eq!(report.series[0].label(), "Individuals Apprehended (Daily)");
        assert_eq!(report.series[4].kind, ChartKind::HorizontalBar);
        assert_eq!(report.series[4].points.len(), TOP_VIOLATIONS);
    }

    #[test]
    fn dashboard_filters_by_full_month_name() {
        let records = vec![
            record(MAR_5_2024, "Elm St", &[]),
            record(JUL_1_2024, "Pine Rd", &[]),
            record(MAR_5_2023, "Oak Ave", &[]),
        ];
        let all = dashboard_tables_in(&records, None, &Utc);
        assert_eq!(all.monthly.get("March"), 2);
        assert_eq!(all.monthly.get("July"), 1);

        let march = dashboard_tables_in(&records, Some("March"), &Utc);
        assert_eq!(march.monthly.len(), 1);
        assert_eq!(march.location.get("Pine Rd"), 0);
        assert_eq!(march.location.total(), 2);

        let empty_filter = dashboard_tables_in(&records, Some(""), &Utc);
        assert_eq!(empty_filter.monthly.total(), 3);
    }
}
