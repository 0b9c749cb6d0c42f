use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use slotboard_shared::MonthAvailabilityArgs;
use tracing::{instrument, warn};

use crate::api::FetchError;
use crate::feed::{FeedSlot, RefreshOutcome, RefreshTicket};
use crate::model::DayAvailability;

pub type MonthTicket = RefreshTicket<MonthAvailabilityArgs>;

/// Per-day availability flags of the viewed month.
#[derive(Debug, Clone, Default)]
pub struct MonthAvailabilityStore {
    slot: FeedSlot<MonthAvailabilityArgs, DayAvailability>,
}

impl MonthAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_refresh(&mut self, year: i32, month: u32) -> MonthTicket {
        self.slot.issue(MonthAvailabilityArgs { year, month })
    }

    #[instrument(skip(self, result), fields(request_id = ticket.id()))]
    pub fn complete(
        &mut self,
        ticket: MonthTicket,
        result: Result<Vec<DayAvailability>, FetchError>,
    ) -> Result<RefreshOutcome, FetchError> {
        self.slot.complete(ticket, result)
    }

    pub fn days(&self) -> &[DayAvailability] {
        self.slot.items()
    }

    pub fn loaded_for(&self) -> Option<MonthAvailabilityArgs> {
        self.slot.loaded_for()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.slot.last_error()
    }

    pub fn is_loading(&self) -> bool {
        self.slot.is_loading()
    }

    /// Unavailable days placed in `viewed_month`'s year and month. An empty
    /// feed means the whole month is available.
    pub fn unavailable_dates(&self, viewed_month: NaiveDate) -> BTreeSet<NaiveDate> {
        let year = viewed_month.year();
        let month = viewed_month.month();

        self.days()
            .iter()
            .filter(|entry| !entry.available)
            .filter_map(|entry| {
                let date = NaiveDate::from_ymd_opt(year, month, entry.day);
                if date.is_none() {
                    warn!(day = entry.day, year, month, "availability day outside month; ignoring");
                }
                date
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::MonthAvailabilityStore;
    use crate::api::FetchError;
    use crate::model::DayAvailability;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn day(day: u32, available: bool) -> DayAvailability {
        DayAvailability { day, available }
    }

    #[test]
    fn march_2024_day_ten_is_the_only_unavailable_date() {
        let mut store = MonthAvailabilityStore::new();
        let ticket = store.begin_refresh(2024, 3);
        store
            .complete(ticket, Ok(vec![day(10, false)]))
            .expect("apply feed");

        let dates = store.unavailable_dates(date(2024, 3, 1));
        assert_eq!(dates.into_iter().collect::<Vec<_>>(), vec![date(2024, 3, 10)]);
    }

    #[test]
    fn empty_feed_means_fully_available() {
        let mut store = MonthAvailabilityStore::new();
        let ticket = store.begin_refresh(2024, 3);
        store.complete(ticket, Ok(vec![])).expect("apply feed");
        assert!(store.unavailable_dates(date(2024, 3, 1)).is_empty());
    }

    #[test]
    fn identical_refreshes_yield_identical_dates() {
        let feed = vec![day(1, true), day(4, false), day(29, false), day(30, true)];
        let mut store = MonthAvailabilityStore::new();

        let first = store.begin_refresh(2024, 2);
        store.complete(first, Ok(feed.clone())).expect("first refresh");
        let once = store.unavailable_dates(date(2024, 2, 1));

        let second = store.begin_refresh(2024, 2);
        store.complete(second, Ok(feed)).expect("second refresh");
        let twice = store.unavailable_dates(date(2024, 2, 1));

        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn days_outside_the_month_are_ignored() {
        let mut store = MonthAvailabilityStore::new();
        let ticket = store.begin_refresh(2023, 2);
        store
            .complete(ticket, Ok(vec![day(28, false), day(30, false)]))
            .expect("apply feed");
        let dates = store.unavailable_dates(date(2023, 2, 1));
        assert_eq!(dates.into_iter().collect::<Vec<_>>(), vec![date(2023, 2, 28)]);
    }

    #[test]
    fn failed_refresh_keeps_previous_month() {
        let mut store = MonthAvailabilityStore::new();
        let ok = store.begin_refresh(2024, 3);
        store.complete(ok, Ok(vec![day(10, false)])).expect("apply feed");

        let failing = store.begin_refresh(2024, 4);
        let err = FetchError::Status {
            endpoint: "/providers/u/month-availability".to_string(),
            status: 503,
            body: String::new(),
        };
        assert!(store.complete(failing, Err(err.clone())).is_err());
        assert_eq!(store.days(), &[day(10, false)]);
        assert_eq!(store.last_error(), Some(&err));
        assert_eq!(store.loaded_for().map(|args| args.month), Some(3));
    }
}
