//! Dashboard and statistics pages.

use std::fmt::Display;

use chrono::{Local, TimeZone};
use smartticket_core::stats::{DashboardTables, StatisticsReport, dashboard_tables_in};
use smartticket_core::{Collection, build_frequency_tables_in};
use tracing::info;

use crate::console::Console;
use crate::error::ConsoleError;

/// Dashboard cards and charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub apprehensions: usize,
    pub drivers: usize,
    /// Full month name the charts are limited to, if any.
    pub month: Option<String>,
    pub tables: DashboardTables,
}

impl Console {
    /// Document counts plus the monthly and location charts, in the local zone.
    pub async fn dashboard(&self, month: Option<&str>) -> Result<DashboardSummary, ConsoleError> {
        self.dashboard_in(month, &Local).await
    }

    pub async fn dashboard_in<Tz>(
        &self,
        month: Option<&str>,
        tz: &Tz,
    ) -> Result<DashboardSummary, ConsoleError>
    where
        Tz: TimeZone + Sync,
    {
        let records = self.apprehensions().await?;
        let drivers = self.store().list(Collection::RegisteredDrivers).await?.len();
        let month = month.map(str::trim).filter(|m| !m.is_empty());
        let tables = dashboard_tables_in(&records, month, tz);
        info!(
            apprehensions = records.len(),
            drivers,
            month = month.unwrap_or("all"),
            "dashboard loaded"
        );
        Ok(DashboardSummary {
            apprehensions: records.len(),
            drivers,
            month: month.map(str::to_string),
            tables,
        })
    }

    /// Five chart series and the recommendation, in the local zone.
    pub async fn statistics(&self) -> Result<StatisticsReport, ConsoleError> {
        self.statistics_in(&Local).await
    }

    pub async fn statistics_in<Tz>(&self, tz: &Tz) -> Result<StatisticsReport, ConsoleError>
    where
        Tz: TimeZone + Sync,
        Tz::Offset: Display,
    {
        let records = self.apprehensions().await?;
        let tables = build_frequency_tables_in(&records, tz);
        let report = StatisticsReport::from_tables(&tables);
        info!(records = records.len(), "statistics computed");
        Ok(report)
    }
}
