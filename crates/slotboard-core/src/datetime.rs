use anyhow::anyhow;
use chrono::{
  DateTime,
  Datelike,
  Duration,
  Locale,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  TimeZone,
  Timelike,
  Utc,
  Weekday
};
use chrono_tz::Tz;

pub const TIMEZONE_ENV_VAR: &str =
  "SLOTBOARD_TIMEZONE";
const LOCAL_ZONE_KEY: &str = "local";
const FALLBACK_LOCALE: Locale =
  Locale::en_US;

/// Zone in which calendar fields of an
/// instant are read.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum DisplayZone {
  /// Host clock.
  #[default]
  Local,
  Named(Tz)
}

impl DisplayZone {
  #[must_use]
  pub fn naive_local(
    &self,
    instant: DateTime<Utc>
  ) -> NaiveDateTime {
    match self {
      | DisplayZone::Local => {
        instant
          .with_timezone(&chrono::Local)
          .naive_local()
      }
      | DisplayZone::Named(tz) => {
        instant
          .with_timezone(tz)
          .naive_local()
      }
    }
  }

  #[must_use]
  pub fn today(
    &self,
    now: DateTime<Utc>
  ) -> NaiveDate {
    self.naive_local(now).date()
  }

  #[must_use]
  pub fn label(&self) -> String {
    match self {
      | DisplayZone::Local => {
        LOCAL_ZONE_KEY.to_string()
      }
      | DisplayZone::Named(tz) => {
        tz.name().to_string()
      }
    }
  }
}

/// Env var first, then the configured
/// value, then the host clock.
pub fn resolve_display_zone(
  configured: Option<&str>
) -> DisplayZone {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(zone) =
      parse_display_zone(
        &raw,
        TIMEZONE_ENV_VAR
      )
  {
    return zone;
  }

  if let Some(raw) = configured
    && let Some(zone) =
      parse_display_zone(
        raw,
        "config:time.zone"
      )
  {
    return zone;
  }

  DisplayZone::Local
}

pub fn parse_display_zone(
  raw: &str,
  source: &str
) -> Option<DisplayZone> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  if trimmed
    .eq_ignore_ascii_case(LOCAL_ZONE_KEY)
  {
    return Some(DisplayZone::Local);
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured display timezone"
      );
      Some(DisplayZone::Named(tz))
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct CalendarFields {
  pub hour:  u32,
  pub day:   u32,
  /// 1-based.
  pub month: u32,
  pub year:  i32
}

#[must_use]
pub fn calendar_fields(
  instant: DateTime<Utc>,
  zone: DisplayZone
) -> CalendarFields {
  let local = zone.naive_local(instant);
  CalendarFields {
    hour:  local.hour(),
    day:   local.day(),
    month: local.month(),
    year:  local.year()
  }
}

/// `HH:MM`, 24-hour, zero padded.
#[must_use]
pub fn format_clock(
  instant: DateTime<Utc>,
  zone: DisplayZone
) -> String {
  zone
    .naive_local(instant)
    .format("%H:%M")
    .to_string()
}

/// Full weekday name of `date` in
/// `locale` (`pt_BR`, `pt-BR`, `en_US`,
/// ...). Unknown locales render in
/// `en_US`. Names come from the POSIX
/// locale tables, so `pt_BR` Monday is
/// `segunda`.
#[must_use]
pub fn format_weekday_name(
  date: NaiveDate,
  locale: &str
) -> String {
  format_date_localized(
    date, "%A", locale
  )
}

/// `<month name> <year>` heading for
/// the month containing `month`.
#[must_use]
pub fn format_month_heading(
  month: NaiveDate,
  locale: &str
) -> String {
  format_date_localized(
    month_start(month),
    "%B %Y",
    locale
  )
}

/// Abbreviated weekday names, ordered
/// from `week_start`.
#[must_use]
pub fn weekday_abbreviations(
  week_start: Weekday,
  locale: &str
) -> Vec<String> {
  // 2024-01-01 was a Monday.
  let monday = first_day_of_month(2024, 1);
  let offset = i64::from(
    week_start.num_days_from_monday()
  );
  (0..7)
    .map(|idx| {
      format_date_localized(
        add_days(monday, offset + idx),
        "%a",
        locale
      )
    })
    .collect()
}

fn format_date_localized(
  date: NaiveDate,
  fmt: &str,
  locale: &str
) -> String {
  let locale = resolve_locale(locale);
  Utc
    .from_utc_datetime(
      &date.and_time(NaiveTime::MIN)
    )
    .format_localized(fmt, locale)
    .to_string()
}

pub fn resolve_locale(
  raw: &str
) -> Locale {
  let normalized =
    raw.trim().replace('-', "_");
  match Locale::try_from(
    normalized.as_str()
  ) {
    | Ok(locale) => locale,
    | Err(_) => {
      tracing::warn!(
        locale = %raw,
        fallback = "en_US",
        "unknown locale; using fallback"
      );
      FALLBACK_LOCALE
    }
  }
}

/// Accepts RFC 3339 with an offset, or
/// a naive `YYYY-MM-DDTHH:MM[:SS[.f]]`
/// read as UTC.
pub fn parse_instant(
  raw: &str
) -> anyhow::Result<DateTime<Utc>> {
  let token = raw.trim();

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(dt.with_timezone(&Utc));
  }

  for fmt in [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M"
  ] {
    if let Ok(ndt) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return Ok(
        Utc.from_utc_datetime(&ndt)
      );
    }
  }

  Err(anyhow!(
    "unrecognized instant: {raw}"
  ))
}

#[must_use]
pub fn is_weekend(
  date: NaiveDate
) -> bool {
  matches!(
    date.weekday(),
    Weekday::Sat | Weekday::Sun
  )
}

#[must_use]
pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

#[must_use]
pub fn month_start(
  date: NaiveDate
) -> NaiveDate {
  first_day_of_month(
    date.year(),
    date.month()
  )
}

#[must_use]
pub fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
}

#[must_use]
pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month).day()
}

#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

#[must_use]
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let mut year = date.year();
  let mut month =
    date.month() as i32 + months;

  while month < 1 {
    month += 12;
    year = year.saturating_sub(1);
  }
  while month > 12 {
    month -= 12;
    year = year.saturating_add(1);
  }

  let month = month as u32;
  let day = date
    .day()
    .min(days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .unwrap_or(date)
}

#[must_use]
pub fn same_month(
  a: NaiveDate,
  b: NaiveDate
) -> bool {
  a.year() == b.year()
    && a.month() == b.month()
}
