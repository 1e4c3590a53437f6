//! Dashboard statistics over recorded sales.
//!
//! All calendar math is UTC. Aggregation is pure over `SaleSummary` rows so
//! it can be tested without a database; `dashboard` only fetches and folds.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use time::{Date, Month, OffsetDateTime, UtcOffset};

use super::sales::{self, SaleSummary, SalesError};

/// Months shown in the revenue chart, current month included.
pub const CHART_MONTHS: u32 = 6;

const MONTH_LABELS: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SalesStats {
    pub daily: Decimal,
    pub monthly: Decimal,
    pub yearly: Decimal,
    pub daily_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueBucket {
    pub label: &'static str,
    pub year: i32,
    /// 1-based.
    pub month: u8,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub stats: SalesStats,
    pub revenue: Vec<RevenueBucket>,
}

fn utc_date(at: OffsetDateTime) -> Date {
    at.to_offset(UtcOffset::UTC).date()
}

fn month_key(date: Date) -> (i32, u8) {
    (date.year(), u8::from(date.month()))
}

/// Daily, month-to-date and year-to-date totals relative to `now`.
#[must_use]
pub fn aggregate_sales(summaries: &[SaleSummary], now: OffsetDateTime) -> SalesStats {
    let today = utc_date(now);
    let mut stats = SalesStats::default();
    for sale in summaries {
        let date = utc_date(sale.sale_date);
        if date.year() != today.year() {
            continue;
        }
        stats.yearly += sale.total_amount;
        if date.month() == today.month() {
            stats.monthly += sale.total_amount;
            if date == today {
                stats.daily += sale.total_amount;
                stats.daily_count += 1;
            }
        }
    }
    stats
}

/// One bucket per calendar month for the last `months` months, oldest first.
#[must_use]
pub fn monthly_revenue(summaries: &[SaleSummary], now: OffsetDateTime, months: u32) -> Vec<RevenueBucket> {
    let today = utc_date(now);
    let current = today.year() * 12 + i32::from(u8::from(today.month())) - 1;
    let months = i32::try_from(months).unwrap_or(i32::MAX).min(1200);

    let mut buckets: Vec<RevenueBucket> = (0..months)
        .rev()
        .map(|back| {
            let index = current - back;
            let month0 = index.rem_euclid(12);
            RevenueBucket {
                label: MONTH_LABELS[usize::try_from(month0).unwrap_or(0)],
                year: index.div_euclid(12),
                month: u8::try_from(month0 + 1).unwrap_or(1),
                total: Decimal::ZERO,
            }
        })
        .collect();

    for sale in summaries {
        let key = month_key(utc_date(sale.sale_date));
        if let Some(bucket) = buckets.iter_mut().find(|b| (b.year, b.month) == key) {
            bucket.total += sale.total_amount;
        }
    }
    buckets
}

/// Earliest instant either the stats or the chart need: Jan 1 of this year
/// or the first day of the oldest chart month, whichever is earlier.
#[must_use]
pub fn window_start(now: OffsetDateTime, months: u32) -> OffsetDateTime {
    let today = utc_date(now);
    let current = today.year() * 12 + i32::from(u8::from(today.month())) - 1;
    let oldest = current - i32::try_from(months.saturating_sub(1)).unwrap_or(0);
    let start_index = oldest.min(today.year() * 12);

    let month = u8::try_from(start_index.rem_euclid(12) + 1)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .unwrap_or(Month::January);
    Date::from_calendar_date(start_index.div_euclid(12), month, 1)
        .map(|d| d.midnight().assume_utc())
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Fetch the sales in range and fold them into stats and chart buckets.
///
/// # Errors
///
/// Returns a database error if the summaries query fails.
pub async fn dashboard(pool: &PgPool, now: OffsetDateTime) -> Result<Dashboard, SalesError> {
    let summaries = sales::list_sale_summaries(pool, window_start(now, CHART_MONTHS)).await?;
    Ok(Dashboard {
        stats: aggregate_sales(&summaries, now),
        revenue: monthly_revenue(&summaries, now, CHART_MONTHS),
    })
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
