//! Calendar helpers: day-first date parsing, calendar-month shifts and the
//! month-start cadence used for future periods.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};

/// Display/export format for dates (zero-padded day/month/year).
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// Day-first date layouts, tried in order.
const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Two-digit-year variants; only tried when the year field has two digits.
const DAY_FIRST_SHORT_YEAR_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];

/// Year-first layouts are unambiguous and accepted as-is.
const YEAR_FIRST_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const TIME_SUFFIXES: &[&str] = &[" %H:%M:%S", " %H:%M", "T%H:%M:%S", "T%H:%M"];

/// Month-only layouts, as (prefix, suffix, full-date format): the text is
/// padded with day 1 and parsed as a complete date.
const YEAR_MONTH_LAYOUTS: &[(&str, &str, &str)] = &[
    ("", "-01", "%Y-%m-%d"),
    ("", "/01", "%Y/%m/%d"),
    ("01/", "", "%d/%m/%Y"),
    ("01-", "", "%d-%m-%Y"),
    ("01.", "", "%d.%m.%Y"),
    ("01 ", "", "%d %b %Y"),
];

/// Parse a date string using the day-first convention.
///
/// "03/04/2024" is the 3rd of April. ISO `yyyy-mm-dd` is still read
/// year-first. A trailing time of day is accepted and dropped. Dates with
/// only a month and a four-digit year ("2023-01", "01/2023", "Jan 2023")
/// resolve to the first of that month.
pub fn parse_day_first(text: &str) -> Option<NaiveDate> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    let year_first = s.len() >= 5 && s.as_bytes()[..4].iter().all(u8::is_ascii_digit);
    let formats: &[&str] = if year_first {
        YEAR_FIRST_DATE_FORMATS
    } else if has_short_year(s) {
        DAY_FIRST_SHORT_YEAR_FORMATS
    } else {
        DAY_FIRST_DATE_FORMATS
    };

    for fmt in formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
        for suffix in TIME_SUFFIXES {
            let full = format!("{}{}", fmt, suffix);
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, &full) {
                return Some(dt.date());
            }
        }
    }
    parse_year_month(s)
}

/// Two-field dates made of a month and a four-digit year, in either order.
fn parse_year_month(s: &str) -> Option<NaiveDate> {
    let fields: Vec<&str> = s.split(['/', '-', '.', ' ']).collect();
    if fields.len() != 2 {
        return None;
    }
    let has_full_year = fields
        .iter()
        .any(|f| f.len() == 4 && f.bytes().all(|b| b.is_ascii_digit()));
    if !has_full_year {
        return None;
    }

    YEAR_MONTH_LAYOUTS.iter().find_map(|(prefix, suffix, fmt)| {
        NaiveDate::parse_from_str(&format!("{}{}{}", prefix, s, suffix), fmt).ok()
    })
}

/// True when the third date field (the year) has exactly two digits.
fn has_short_year(s: &str) -> bool {
    let date_part = s.split([' ', 'T']).next().unwrap_or(s);
    date_part
        .split(['/', '-', '.'])
        .nth(2)
        .map(|year| year.len() == 2)
        .unwrap_or(false)
}

/// Format a date as zero-padded `dd/mm/yyyy`.
pub fn format_day_first(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// Shift a date by a signed number of calendar months.
///
/// When the day does not exist in the target month it is clamped to that
/// month's last day (Jan 31 + 1 month = Feb 28/29). Returns None only when
/// the result leaves chrono's supported range.
pub fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let magnitude = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// The first `periods` month-start dates strictly after `last`.
///
/// If `last` is itself a month start the sequence begins one month later;
/// otherwise it begins at the start of the following month.
pub fn month_starts_after(last: NaiveDate, periods: usize) -> Option<Vec<NaiveDate>> {
    let first = month_start(last).checked_add_months(Months::new(1))?;
    (0..periods)
        .map(|i| first.checked_add_months(Months::new(u32::try_from(i).ok()?)))
        .collect()
}

/// Days since 1970-01-01 (negative before the epoch).
pub fn days_since_epoch(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days() as f64
}

/// Inverse of [`days_since_epoch`], rounding to the nearest whole day.
pub fn date_from_epoch_days(days: f64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    if !days.is_finite() {
        return None;
    }
    epoch.checked_add_signed(Duration::try_days(days.round() as i64)?)
}

/// Detect the most common spacing (in days) between consecutive dates.
/// Returns 1 if fewer than 2 dates or no positive spacing exists.
pub fn detect_spacing_days(dates: &[NaiveDate]) -> i64 {
    if dates.len() < 2 {
        return 1;
    }

    let mut diffs: Vec<i64> = dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .filter(|d| *d > 0)
        .collect();
    if diffs.is_empty() {
        return 1;
    }
    diffs.sort_unstable();

    // Mode of the sorted differences
    let mut best_val = diffs[0];
    let mut best_count = 1usize;
    let mut current_val = diffs[0];
    let mut current_count = 1usize;

    for &d in &diffs[1..] {
        if d == current_val {
            current_count += 1;
        } else {
            if current_count > best_count {
                best_count = current_count;
                best_val = current_val;
            }
            current_val = d;
            current_count = 1;
        }
    }
    if current_count > best_count {
        best_val = current_val;
    }

    best_val
}
