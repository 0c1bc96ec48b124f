//! Record sets rendered as table rows with their action buttons.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::TimeZone;
use smartticket_core::dates::date_label;
use smartticket_core::{DriverRecord, LedgerView, UserRecord, format_amount};

use crate::dispatch::{ActionEvent, ActionId};

pub const NOT_AVAILABLE: &str = "N/A";

/// `N/A` for a blank cell.
pub fn or_na(value: &str) -> String {
    if value.trim().is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: String,
    pub cells: Vec<String>,
    pub actions: Vec<ActionEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Row>,
    /// Running total line under ledger tables.
    pub footer: Option<String>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }
}

const USER_HEADERS: &[&str] = &[
    "Picture", "Name", "Email", "Birthdate", "Gender", "Address", "Position",
];

const DRIVER_HEADERS: &[&str] = &["Image", "Name", "License Number", "Address", "Sex"];

const LEDGER_HEADERS: &[&str] = &[
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

fn plain(action: ActionId, id: &str) -> ActionEvent {
    ActionEvent::new(action, id, BTreeMap::new())
}

pub fn users_table(users: &[UserRecord]) -> Table {
    let rows = users
        .iter()
        .map(|u| Row {
            id: u.id.clone(),
            cells: vec![
                or_na(&u.profile_picture),
                u.full_name(),
                or_na(&u.email),
                or_na(&u.birthdate),
                or_na(&u.gender),
                or_na(&u.address),
                or_na(&u.position),
            ],
            actions: vec![
                plain(ActionId::EditUser, &u.id),
                plain(ActionId::DeleteUser, &u.id),
            ],
        })
        .collect();
    Table {
        title: "Users".to_string(),
        headers: USER_HEADERS.to_vec(),
        rows,
        footer: None,
    }
}

pub fn drivers_table(drivers: &[DriverRecord]) -> Table {
    let rows = drivers
        .iter()
        .map(|d| Row {
            id: d.id.clone(),
            cells: vec![
                or_na(&d.image),
                d.full_name(),
                or_na(&d.licensed_number),
                or_na(&d.address),
                or_na(&d.sex),
            ],
            actions: vec![
                plain(ActionId::EditDriver, &d.id),
                plain(ActionId::DeleteDriver, &d.id),
            ],
        })
        .collect();
    Table {
        title: "Registered Drivers".to_string(),
        headers: DRIVER_HEADERS.to_vec(),
        rows,
        footer: None,
    }
}

/// One ledger table with its footer total. Dates render in `tz`.
pub fn ledger_table<Tz>(view: &LedgerView<'_>, tz: &Tz) -> Table
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let rows = view
        .rows
        .iter()
        .map(|r| {
            let or_number = r.receipt().unwrap_or_default();
            let violations: Vec<&str> = r.violation_names().collect();
            let amount = r.total_amount.to_string();

            let details = ActionEvent::new(
                ActionId::ViewDetails,
                &r.id,
                BTreeMap::from([
                    ("or".to_string(), or_number.to_string()),
                    ("amount".to_string(), amount.clone()),
                ]),
            );
            let change = ActionEvent::new(
                ActionId::ChangeStatus,
                &r.id,
                BTreeMap::from([
                    ("status".to_string(), r.status.to_string()),
                    ("total".to_string(), amount),
                ]),
            );
            Row {
                id: r.id.clone(),
                cells: vec![
                    or_na(&r.full_name),
                    or_na(or_number),
                    view.group.badge().to_string(),
                    or_na(&r.address),
                    or_na(&r.plate_number),
                    or_na(&r.vehicle_type),
                    or_na(&violations.join(", ")),
                    date_label(r.timestamp, tz),
                    or_na(&r.officer_apprehend),
                    format_amount(r.total_amount),
                ],
                actions: vec![details, change],
            }
        })
        .collect();
    Table {
        title: match view.group {
            smartticket_core::StatusGroup::Paid => "Paid Apprehensions".to_string(),
            smartticket_core::StatusGroup::UnpaidOrOverdue => {
                "Unpaid/Overdue Apprehensions".to_string()
            }
        },
        headers: LEDGER_HEADERS.to_vec(),
        rows,
        footer: Some(view.total_line()),
    }
}
