//! Spreadsheet export of the driver registry and the apprehension ledger.
//!
//! One sheet per file, a bold header row, then one row per record. Blank
//! cells read `N/A`.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, TimeZone, Utc};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use smartticket_core::dates::date_label;
use smartticket_core::ledger::sort_recent_first;
use smartticket_core::schema::export;
use smartticket_core::{ApprehensionRecord, DriverRecord, format_amount_fixed};
use tracing::info;

use crate::console::Console;
use crate::error::ConsoleError;
use crate::table::or_na;

pub fn driver_row(driver: &DriverRecord) -> Vec<String> {
    vec![
        or_na(&driver.first_name),
        or_na(&driver.last_name),
        or_na(&driver.licensed_number),
        or_na(&driver.address),
        or_na(&driver.sex),
    ]
}

/// Cells in [`export::APPREHENSION_HEADERS`] order, dated in `tz`.
pub fn apprehension_row<Tz>(record: &ApprehensionRecord, tz: &Tz) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let violations = record.violation_names().collect::<Vec<_>>().join(", ");
    vec![
        or_na(&record.full_name),
        or_na(record.receipt().unwrap_or_default()),
        record.status.as_str().to_string(),
        or_na(&record.address),
        or_na(&record.plate_number),
        or_na(&record.vehicle_type),
        or_na(&violations),
        date_label(record.timestamp, tz),
        or_na(&record.officer_apprehend),
        format_amount_fixed(record.total_amount),
    ]
}

/// Today's UTC calendar date, used in export file names.
pub fn export_date() -> NaiveDate {
    Utc::now().date_naive()
}

/// Write `rows` under `headers` into a single-sheet workbook at `path`.
pub fn write_sheet(
    path: &Path,
    sheet: &str,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            worksheet.write_string(r, col as u16, cell)?;
        }
    }
    workbook.save(path)?;
    Ok(())
}

impl Console {
    /// Export every registered driver to `dir/drivers_data_<today>.xlsx`.
    pub async fn export_drivers(&self, dir: &Path) -> Result<PathBuf, ConsoleError> {
        self.export_drivers_on(dir, export_date()).await
    }

    pub async fn export_drivers_on(
        &self,
        dir: &Path,
        date: NaiveDate,
    ) -> Result<PathBuf, ConsoleError> {
        let drivers = self.drivers().await?;
        let rows: Vec<_> = drivers.iter().map(driver_row).collect();
        let path = dir.join(export::file_name("drivers", date));
        write_sheet(&path, export::DRIVER_SHEET, export::DRIVER_HEADERS, &rows)?;
        info!(path = %path.display(), rows = rows.len(), "drivers exported");
        Ok(path)
    }

    /// Export every apprehension, most recent first, to
    /// `dir/apprehensions_data_<today>.xlsx`. Dates in the sheet are local.
    pub async fn export_apprehensions(&self, dir: &Path) -> Result<PathBuf, ConsoleError> {
        self.export_apprehensions_in(dir, export_date(), &Local)
            .await
    }

    pub async fn export_apprehensions_in<Tz>(
        &self,
        dir: &Path,
        date: NaiveDate,
        tz: &Tz,
    ) -> Result<PathBuf, ConsoleError>
    where
        Tz: TimeZone + Sync,
        Tz::Offset: Display,
    {
        let mut records = self.apprehensions().await?;
        sort_recent_first(&mut records);
        let rows: Vec<_> = records.iter().map(|r| apprehension_row(r, tz)).collect();
        let path = dir.join(export::file_name("apprehensions", date));
        write_sheet(
            &path,
            export::APPREHENSION_SHEET,
            export::APPREHENSION_HEADERS,
            &rows,
        )?;
        info!(path = %path.display(), rows = rows.len(), "apprehensions exported");
        Ok(path)
    }
}
