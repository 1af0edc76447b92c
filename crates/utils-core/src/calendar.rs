//! Calendar-date handling for the organisation's reference timezone.
//!
//! Publication dates and deadlines are civil dates, not instants. They are
//! parsed from the leading `YYYY-MM-DD` of whatever the store hands back and
//! compared against "today" as observed in a single configured zone.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use thiserror::Error;

pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";
pub const DATE_PLACEHOLDER: &str = "—";

#[derive(Debug, Error)]
#[error("Unknown timezone: {0}")]
pub struct UnknownTimezone(pub String);

/// Source of "today" for every date rule in the system.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceClock {
    tz: Tz,
    fixed_today: Option<NaiveDate>,
}

impl ReferenceClock {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            fixed_today: None,
        }
    }

    pub fn from_name(name: &str) -> Result<Self, UnknownTimezone> {
        let tz = name
            .trim()
            .parse::<Tz>()
            .map_err(|_| UnknownTimezone(name.to_string()))?;
        Ok(Self::new(tz))
    }

    /// A clock frozen on `today`, still reporting the given zone.
    pub fn fixed(tz: Tz, today: NaiveDate) -> Self {
        Self {
            tz,
            fixed_today: Some(today),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn today(&self) -> NaiveDate {
        match self.fixed_today {
            Some(day) => day,
            None => Utc::now().with_timezone(&self.tz).date_naive(),
        }
    }
}

impl Default for ReferenceClock {
    fn default() -> Self {
        Self::new(chrono_tz::America::Sao_Paulo)
    }
}

/// Parses the calendar-date part of `raw`. Anything from a `T` onwards is
/// ignored so that timestamps stored by other tools still resolve to the
/// civil date they were written for.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split('T').next()?;
    let mut parts = date_part.split('-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let day = parts.next()?.parse::<u32>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `dd/mm/yyyy`, or the placeholder for absent and malformed input.
pub fn format_display_date_raw(raw: Option<&str>) -> String {
    raw.and_then(parse_calendar_date)
        .map(format_display_date)
        .unwrap_or_else(|| DATE_PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_date_and_ignores_time_suffix() {
        assert_eq!(parse_calendar_date("2024-03-05"), Some(date(2024, 3, 5)));
        assert_eq!(
            parse_calendar_date("2024-03-05T23:59:59-03:00"),
            Some(date(2024, 3, 5))
        );
        assert_eq!(
            parse_calendar_date("2024-03-05T00:00:00.000Z"),
            Some(date(2024, 3, 5))
        );
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert_eq!(parse_calendar_date(""), None);
        assert_eq!(parse_calendar_date("05/03/2024"), None);
        assert_eq!(parse_calendar_date("2024-02-30"), None);
        assert_eq!(parse_calendar_date("2024-03"), None);
        assert_eq!(parse_calendar_date("2024-03-05-01"), None);
    }

    #[test]
    fn display_format_uses_placeholder() {
        assert_eq!(format_display_date_raw(Some("2024-12-01")), "01/12/2024");
        assert_eq!(format_display_date_raw(Some("garbage")), DATE_PLACEHOLDER);
        assert_eq!(format_display_date_raw(None), DATE_PLACEHOLDER);
    }

    #[test]
    fn clock_resolves_named_zone() {
        let clock = ReferenceClock::from_name("America/Sao_Paulo").unwrap();
        assert_eq!(clock.timezone(), chrono_tz::America::Sao_Paulo);
        assert!(ReferenceClock::from_name("Mars/Olympus_Mons").is_err());
    }

    #[test]
    fn fixed_clock_reports_pinned_day() {
        let clock = ReferenceClock::fixed(chrono_tz::UTC, date(2025, 1, 10));
        assert_eq!(clock.today(), date(2025, 1, 10));
    }
}
