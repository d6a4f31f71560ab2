use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

/// Calendar date in the reference zone.
pub fn market_today(tz: Tz, now_utc: DateTime<Utc>) -> NaiveDate {
    now_utc.with_timezone(&tz).date_naive()
}

pub fn resolve_run_date(
    as_of_date_arg: Option<&str>,
    tz: Tz,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?);
    }
    Ok(market_today(tz, now_utc))
}

/// Wall-clock time for the briefing footer, e.g. "08:15 AM ET".
pub fn eastern_clock(now_utc: DateTime<Utc>) -> String {
    now_utc
        .with_timezone(&chrono_tz::US::Eastern)
        .format("%I:%M %p ET")
        .to_string()
}

// NYSE closures that fall on the same calendar day every year.
const FIXED_CLOSURES: [(u32, u32); 4] = [(1, 1), (6, 19), (7, 4), (12, 25)];
const FIXED_CLOSURE_YEARS: std::ops::RangeInclusive<i32> = 2024..=2030;

/// False on weekends, fixed-date closures and any date listed in
/// `US_MARKET_HOLIDAYS` (floating holidays such as Thanksgiving go there).
pub fn is_trading_day(date: NaiveDate) -> bool {
    if date.weekday().number_from_monday() > 5 {
        return false;
    }
    if FIXED_CLOSURE_YEARS.contains(&date.year())
        && FIXED_CLOSURES.contains(&(date.month(), date.day()))
    {
        return false;
    }
    let extra = std::env::var("US_MARKET_HOLIDAYS").unwrap_or_default();
    !parse_holiday_list(&extra).contains(&date)
}

/// "2026-11-26, 2026-04-03" -> dates; malformed entries are skipped.
pub fn parse_holiday_list(raw: &str) -> Vec<NaiveDate> {
    raw.split(',')
        .filter_map(|part| NaiveDate::parse_from_str(part.trim(), "%Y-%m-%d").ok())
        .collect()
}
