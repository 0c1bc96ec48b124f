//! Collection names, the record-to-collection mapping, and spreadsheet layouts.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Logical document collections held by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    RegisteredDrivers,
    Apprehensions,
    HistoryLogs,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Self::Users,
        Self::RegisteredDrivers,
        Self::Apprehensions,
        Self::HistoryLogs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::RegisteredDrivers => "registered_drivers",
            Self::Apprehensions => "apprehensions",
            Self::HistoryLogs => "historyLogs",
        }
    }

    /// Look up a collection by its backend name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record type stored as documents of one collection.
///
/// The document id is not part of the stored fields: it is skipped on
/// serialisation and attached with [`set_id`](Self::set_id) after decoding.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

/// Column layouts for the spreadsheet export.
pub mod export {
    use chrono::NaiveDate;

    pub const DRIVER_SHEET: &str = "Drivers";

    pub const DRIVER_HEADERS: &[&str] = &[
        "First Name",
        "Last Name",
        "License Number",
        "Address",
        "Sex",
    ];

    pub const APPREHENSION_SHEET: &str = "Apprehensions";

    pub const APPREHENSION_HEADERS: &[&str] = &[
        "Full Name",
        "OR Number",
        "Status",
        "Address",
        "Plate Number",
        "Vehicle Type",
        "Violations",
        "Date",
        "Officer Apprehended",
        "Total Amount",
    ];

    /// `drivers` + 2024-03-05 → `drivers_data_2024-03-05.xlsx`
    pub fn file_name(entity: &str, date: NaiveDate) -> String {
        format!("{entity}_data_{}.xlsx", date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn collection_names_match_backend() {
        assert_eq!(Collection::Users.as_str(), "users");
        assert_eq!(Collection::RegisteredDrivers.as_str(), "registered_drivers");
        assert_eq!(Collection::Apprehensions.as_str(), "apprehensions");
        assert_eq!(Collection::HistoryLogs.as_str(), "historyLogs");
    }

    #[test]
    fn from_name_round_trips_every_collection() {
        for c in Collection::ALL {
            assert_eq!(Collection::from_name(c.as_str()), Some(c));
        }
        assert_eq!(Collection::from_name("violations"), None);
    }

    #[test]
    fn export_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            export::file_name("drivers", date),
            "drivers_data_2024-03-05.xlsx"
        );
    }

    #[test]
    fn export_layouts_have_expected_columns() {
        assert_eq!(export::DRIVER_HEADERS.len(), 5);
        assert_eq!(export::APPREHENSION_HEADERS.len(), 10);
        assert_eq!(export::APPREHENSION_HEADERS[9], "Total Amount");
    }
}
