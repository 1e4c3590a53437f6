use super::*;
use time::macros::datetime;

fn sale(cents: i64, at: OffsetDateTime) -> SaleSummary {
    SaleSummary { total_amount: Decimal::new(cents, 2), sale_date: at }
}

#[test]
fn aggregate_splits_day_month_year() {
    let now = datetime!(2026-03-15 18:00 UTC);
    let sales = [
        sale(1_000, datetime!(2026-03-15 09:30 UTC)),
        sale(500, datetime!(2026-03-15 00:00 UTC)),
        sale(2_000, datetime!(2026-03-01 12:00 UTC)),
        sale(4_000, datetime!(2026-01-10 12:00 UTC)),
        sale(9_999, datetime!(2025-12-31 23:59 UTC)),
    ];
    let stats = aggregate_sales(&sales, now);
    assert_eq!(stats.daily, Decimal::new(1_500, 2));
    assert_eq!(stats.daily_count, 2);
    assert_eq!(stats.monthly, Decimal::new(3_500, 2));
    assert_eq!(stats.yearly, Decimal::new(7_500, 2));
}

#[test]
fn aggregate_uses_utc_calendar_dates() {
    // 23:30 at -05:00 is already the next day in UTC.
    let now = datetime!(2026-03-16 01:00 UTC);
    let stats = aggregate_sales(&[sale(700, datetime!(2026-03-15 23:30 -5))], now);
    assert_eq!(stats.daily, Decimal::new(700, 2));
}

#[test]
fn aggregate_of_nothing_is_zero() {
    assert_eq!(aggregate_sales(&[], OffsetDateTime::UNIX_EPOCH), SalesStats::default());
}

#[test]
fn monthly_revenue_has_current_month_last() {
    let now = datetime!(2026-03-15 12:00 UTC);
    let buckets = monthly_revenue(&[], now, 6);
    let labels: Vec<_> = buckets.iter().map(|b| b.label).collect();
    assert_eq!(labels, ["Oct", "Nov", "Dec", "Jan", "Feb", "Mar"]);
    assert_eq!((buckets[0].year, buckets[0].month), (2025, 10));
    assert_eq!((buckets[5].year, buckets[5].month), (2026, 3));
    assert!(buckets.iter().all(|b| b.total.is_zero()));
}

#[test]
fn monthly_revenue_sums_into_buckets_and_ignores_out_of_range() {
    let now = datetime!(2026-03-15 12:00 UTC);
    let sales = [
        sale(100, datetime!(2026-03-02 10:00 UTC)),
        sale(250, datetime!(2026-03-20 10:00 UTC)),
        sale(400, datetime!(2025-12-24 20:00 UTC)),
        sale(999, datetime!(2025-09-30 10:00 UTC)),
    ];
    let buckets = monthly_revenue(&sales, now, 6);
    assert_eq!(buckets[5].total, Decimal::new(350, 2));
    assert_eq!(buckets[2].total, Decimal::new(400, 2));
    let sum: Decimal = buckets.iter().map(|b| b.total).sum();
    assert_eq!(sum, Decimal::new(750, 2));
}

#[test]
fn zero_months_yields_empty_chart() {
    assert!(monthly_revenue(&[], datetime!(2026-03-15 12:00 UTC), 0).is_empty());
}

#[test]
fn window_start_covers_year_and_chart() {
    // Chart reaches back to October of the previous year.
    assert_eq!(window_start(datetime!(2026-03-15 12:00 UTC), 6), datetime!(2025-10-01 00:00 UTC));
    // Late in the year Jan 1 is earlier than the chart start.
    assert_eq!(window_start(datetime!(2026-11-15 12:00 UTC), 6), datetime!(2026-01-01 00:00 UTC));
}
