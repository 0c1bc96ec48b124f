//! Apprehension records: one traffic-violation incident with its payment state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{dates, money};
use crate::schema::{Collection, Entity};

/// Payment state of an apprehension.
///
/// Statuses the console does not know about decode as [`Unknown`](Self::Unknown)
/// and match neither ledger group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Overdue,
    Paid,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Overdue => "overdue",
            Self::Paid => "paid",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unpaid" => Ok(Self::Unpaid),
            "overdue" => Ok(Self::Overdue),
            "paid" => Ok(Self::Paid),
            other => Err(format!(
                "unknown status '{other}' (expected unpaid, overdue, or paid)"
            )),
        }
    }
}

/// One violation attached to an apprehension.
///
/// Only `name` is interpreted; the intake app may attach other fields
/// (fine, code, ...) which are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Violation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Violation {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            extra: Map::new(),
        }
    }
}

/// A recorded traffic-violation incident.
///
/// Created by the field intake app; the console only changes `status`,
/// `orNumber` and `totalAmount`, and never deletes one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprehensionRecord {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub plate_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vehicle_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub officer_apprehend: String,
    #[serde(default)]
    pub or_number: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: PaymentStatus,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_amount: f64,
    /// Seconds since the Unix epoch.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub selected_violations: Vec<Violation>,
}

impl ApprehensionRecord {
    /// Names of the attached violations, skipping nameless entries.
    pub fn violation_names(&self) -> impl Iterator<Item = &str> {
        self.selected_violations
            .iter()
            .filter_map(|v| v.name.as_deref())
            .filter(|n| !n.is_empty())
    }

    pub fn has_violation(&self, name: &str) -> bool {
        self.violation_names().any(|n| n == name)
    }

    /// When the apprehension happened, in `tz`.
    pub fn apprehended_at<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        crate::dates::from_epoch(self.timestamp, tz)
    }

    /// Non-empty OR number, if one has been recorded.
    pub fn receipt(&self) -> Option<&str> {
        self.or_number.as_deref().filter(|s| !s.is_empty())
    }
}

impl Entity for ApprehensionRecord {
    const COLLECTION: Collection = Collection::Apprehensions;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Treat an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(money::amount_from_value(&value))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(dates::timestamp_from_value(&value))
}
