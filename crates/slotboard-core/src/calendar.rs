use std::collections::BTreeSet;

use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};

use crate::datetime::{
  add_days,
  is_weekend,
  last_day_of_month,
  month_start,
  same_month,
  shift_months
};

pub const WEEK_START: Weekday =
  Weekday::Sun;

/// What the calendar surface knows about
/// a single cell.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub struct DayModifiers {
  /// Monday to Friday.
  pub available: bool,
  /// Weekend, unavailable, or outside
  /// the viewed month.
  pub disabled:  bool,
  pub selected:  bool,
  pub today:     bool,
  pub outside:   bool
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct CalendarCell {
  pub date:      NaiveDate,
  pub modifiers: DayModifiers
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
  pub month:       NaiveDate,
  pub weeks:       Vec<Vec<CalendarCell>>,
  pub can_go_back: bool
}

impl MonthGrid {
  pub fn cell(
    &self,
    date: NaiveDate
  ) -> Option<&CalendarCell> {
    self
      .weeks
      .iter()
      .flatten()
      .find(|cell| cell.date == date)
  }
}

#[must_use]
pub fn day_modifiers(
  date: NaiveDate,
  viewed_month: NaiveDate,
  unavailable: &BTreeSet<NaiveDate>,
  selected: NaiveDate,
  today: NaiveDate
) -> DayModifiers {
  let weekend = is_weekend(date);
  let outside =
    !same_month(date, viewed_month);
  DayModifiers {
    available: !weekend,
    disabled: weekend
      || outside
      || unavailable.contains(&date),
    selected: date == selected,
    today: date == today,
    outside
  }
}

/// Months before the current one are not
/// navigable.
#[must_use]
pub fn earliest_month(
  today: NaiveDate
) -> NaiveDate {
  month_start(today)
}

#[must_use]
pub fn previous_month(
  viewed_month: NaiveDate,
  today: NaiveDate
) -> Option<NaiveDate> {
  let candidate = month_start(
    shift_months(viewed_month, -1)
  );
  (candidate >= earliest_month(today))
    .then_some(candidate)
}

fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

#[tracing::instrument(skip(unavailable), fields(unavailable_count = unavailable.len()))]
pub fn build_month_grid(
  viewed_month: NaiveDate,
  unavailable: &BTreeSet<NaiveDate>,
  selected: NaiveDate,
  today: NaiveDate
) -> MonthGrid {
  let first = month_start(viewed_month);
  let last = last_day_of_month(
    first.year(),
    first.month()
  );

  let mut cursor =
    start_of_week(first, WEEK_START);
  let mut weeks = Vec::new();
  while cursor <= last {
    let week = (0..7)
      .map(|offset| {
        let date =
          add_days(cursor, offset);
        CalendarCell {
          date,
          modifiers: day_modifiers(
            date,
            first,
            unavailable,
            selected,
            today
          )
        }
      })
      .collect::<Vec<_>>();
    weeks.push(week);
    cursor = add_days(cursor, 7);
  }

  MonthGrid {
    month: first,
    weeks,
    can_go_back: previous_month(
      first, today
    )
    .is_some()
  }
}
