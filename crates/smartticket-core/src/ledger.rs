//! Paid / unpaid ledger views over the apprehension set.

use std::fmt;
use std::str::FromStr;

use crate::apprehension::{ApprehensionRecord, PaymentStatus};

/// Which ledger table a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusGroup {
    Paid,
    UnpaidOrOverdue,
}

impl StatusGroup {
    pub fn matches(&self, status: PaymentStatus) -> bool {
        match self {
            Self::Paid => status == PaymentStatus::Paid,
            Self::UnpaidOrOverdue => {
                matches!(status, PaymentStatus::Unpaid | PaymentStatus::Overdue)
            }
        }
    }

    /// Caption shown before the running total.
    pub fn total_caption(&self) -> &'static str {
        match self {
            Self::Paid => "Total Paid Amount",
            Self::UnpaidOrOverdue => "Unpaid/Overdue Total",
        }
    }

    /// Badge text for rows of this group.
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::UnpaidOrOverdue => "Unpaid",
        }
    }
}

impl fmt::Display for StatusGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Paid => "paid",
            Self::UnpaidOrOverdue => "unpaid",
        })
    }
}

impl FromStr for StatusGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paid" => Ok(Self::Paid),
            "unpaid" | "overdue" | "unpaid-or-overdue" => Ok(Self::UnpaidOrOverdue),
            other => Err(format!("unknown ledger '{other}' (expected paid or unpaid)")),
        }
    }
}

/// Optional narrowing criteria. An empty field is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFilter {
    /// Exact violation name the record must carry.
    pub violation: String,
    /// Substring of the record's address.
    pub address: String,
    /// Substring of the record's vehicle type.
    pub vehicle_type: String,
}

impl LedgerFilter {
    /// All active criteria hold for `record`.
    pub fn matches(&self, record: &ApprehensionRecord) -> bool {
        (self.violation.is_empty() || record.has_violation(&self.violation))
            && (self.address.is_empty() || record.address.contains(self.address.as_str()))
            && (self.vehicle_type.is_empty()
                || record.vehicle_type.contains(self.vehicle_type.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.violation.is_empty() && self.address.is_empty() && self.vehicle_type.is_empty()
    }
}

/// Rows of one ledger table and their amount total.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerView<'a> {
    pub group: StatusGroup,
    pub rows: Vec<&'a ApprehensionRecord>,
    pub total: f64,
}

impl LedgerView<'_> {
    pub fn total_line(&self) -> String {
        format!(
            "{}: {}",
            self.group.total_caption(),
            crate::money::format_amount(self.total)
        )
    }
}

/// Records in `group` that satisfy every active criterion, in input order,
/// with the sum of their `totalAmount`.
///
/// The total is recomputed from scratch on each call.
pub fn filter_by_status_and_criteria<'a>(
    records: &'a [ApprehensionRecord],
    group: StatusGroup,
    filter: &LedgerFilter,
) -> LedgerView<'a> {
    let rows: Vec<&ApprehensionRecord> = records
        .iter()
        .filter(|r| group.matches(r.status) && filter.matches(r))
        .collect();
    let total: f64 = rows.iter().map(|r| r.total_amount).sum();
    LedgerView { group, rows, total }
}

/// Most recent apprehension first.
pub fn sort_recent_first(records: &mut [ApprehensionRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
