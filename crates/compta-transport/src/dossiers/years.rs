use std::collections::HashSet;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::domain::YearStatus;

/// Open/closed state per fiscal year. Years never seen are open.
#[derive(Debug, Clone, Default)]
pub struct YearStatusRegistry {
    statuses: Vec<YearStatus>,
}

impl YearStatusRegistry {
    /// Rebuild from persisted entries. If a year appears twice the first entry wins.
    pub fn from_statuses(statuses: Vec<YearStatus>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(statuses.len());
        for status in statuses {
            if seen.insert(status.year) {
                kept.push(status);
            } else {
                warn!(year = status.year, "dropping duplicate year status entry");
            }
        }
        Self { statuses: kept }
    }

    pub fn statuses(&self) -> &[YearStatus] {
        &self.statuses
    }

    pub fn status(&self, year: i32) -> Option<&YearStatus> {
        self.statuses.iter().find(|status| status.year == year)
    }

    pub fn is_closed(&self, year: i32) -> bool {
        self.status(year).is_some_and(|status| status.is_closed)
    }

    /// Close `year`, stamping `now`. Closing an already closed year refreshes the date.
    pub fn close(&mut self, year: i32, now: DateTime<Utc>) -> YearStatus {
        match self.statuses.iter_mut().find(|status| status.year == year) {
            Some(status) => {
                status.is_closed = true;
                status.closed_date = Some(now);
                status.clone()
            }
            None => {
                let status = YearStatus {
                    year,
                    is_closed: true,
                    closed_date: Some(now),
                };
                self.statuses.push(status.clone());
                status
            }
        }
    }

    /// Reopen `year`. Returns false when there was no entry, in which case nothing is created.
    pub fn reopen(&mut self, year: i32) -> bool {
        match self.statuses.iter_mut().find(|status| status.year == year) {
            Some(status) => {
                status.is_closed = false;
                status.closed_date = None;
                true
            }
            None => false,
        }
    }

    pub fn overview(&self, years: RangeInclusive<i32>) -> Vec<YearOverviewEntry> {
        years
            .map(|year| {
                let status = self.status(year);
                YearOverviewEntry {
                    year,
                    is_closed: status.is_some_and(|status| status.is_closed),
                    closed_date: status.and_then(|status| status.closed_date),
                }
            })
            .collect()
    }
}

/// Row of the admin year listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearOverviewEntry {
    pub year: i32,
    pub is_closed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<DateTime<Utc>>,
}

impl YearOverviewEntry {
    pub const fn state_label(&self) -> &'static str {
        if self.is_closed {
            "Clôturée"
        } else {
            "Ouverte"
        }
    }
}
