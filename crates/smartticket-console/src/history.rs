//! History log listing.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use smartticket_core::HistoryLogEntry;
use smartticket_core::dates::INVALID_DATE;
use smartticket_store::list_records;

use crate::console::Console;
use crate::error::ConsoleError;

pub const NO_HISTORY: &str = "No history logs available.";

/// `M/D/YYYY, h:mm:ss AM` in `tz`, or `Invalid Date`.
pub fn timestamp_label<Tz>(iso: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match DateTime::parse_from_rfc3339(iso) {
        Ok(ts) => ts
            .with_timezone(tz)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string(),
        Err(_) => INVALID_DATE.to_string(),
    }
}

/// Display lines for one entry: headline, performer, optional receipt and amount, time.
pub fn describe_in<Tz>(entry: &HistoryLogEntry, tz: &Tz) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = vec![
        format!("{} - {}", entry.action_type, entry.details),
        format!("By: {}", entry.performer()),
    ];
    if let Some(or) = entry.or_number.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("OR Number: {or}"));
    }
    if let Some(total) = entry.total_payment.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Total Payment: {total}"));
    }
    lines.push(timestamp_label(&entry.timestamp, tz));
    lines
}

pub fn describe(entry: &HistoryLogEntry) -> Vec<String> {
    describe_in(entry, &Local)
}

impl Console {
    /// Every audit entry, in store listing order.
    pub async fn history(&self) -> Result<Vec<HistoryLogEntry>, ConsoleError> {
        list_records(self.store()).await.map_err(|e| {
            self.notifier()
                .error("Error!", "Failed to fetch history logs.");
            e.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::fixture;
    use chrono::Utc;
    use smartticket_core::PaymentStatus;
    use smartticket_store::create_record;

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_709_625_600, 0).unwrap()
    }

    #[test]
    fn payment_entry_lines() {
        let entry = HistoryLogEntry::payment(1500.0, "OR-7", "ops@lgu.ph", at());
        assert_eq!(
            describe_in(&entry, &Utc),
            vec![
                "Payment - Payment of 1500 made",
                "By: ops@lgu.ph",
                "OR Number: OR-7",
                "Total Payment: ₱1500.00",
                "3/5/2024, 8:00:00 AM",
            ]
        );
    }

    #[test]
    fn status_entry_omits_payment_lines() {
        let entry = HistoryLogEntry::status_change("a1", PaymentStatus::Overdue, "", at());
        let lines = describe_in(&entry, &Utc);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "By: Unknown");
    }

    #[test]
    fn garbage_timestamp_is_invalid_date() {
        assert_eq!(timestamp_label("yesterday", &Utc), "Invalid Date");
    }

    #[tokio::test]
    async fn history_lists_entries() {
        let fx = fixture(true);
        let entry = HistoryLogEntry::payment(10.0, "OR-1", "ops@lgu.ph", at());
        create_record(fx.store.as_ref(), &entry).await.unwrap();
        let entries = fx.console.history().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].id.is_empty());
    }
}
