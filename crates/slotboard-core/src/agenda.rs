use chrono::{Datelike, NaiveDate};
use slotboard_shared::DayAgendaArgs;
use tracing::instrument;

use crate::api::FetchError;
use crate::datetime::DisplayZone;
use crate::feed::{FeedSlot, RefreshOutcome, RefreshTicket};
use crate::model::{AgendaEntry, Appointment};

pub type DayTicket = RefreshTicket<DayAgendaArgs>;

/// Appointments of the selected day, each with its `HH:MM` display time.
#[derive(Debug, Clone)]
pub struct DayAgendaStore {
    zone: DisplayZone,
    slot: FeedSlot<DayAgendaArgs, AgendaEntry>,
}

impl DayAgendaStore {
    pub fn new(zone: DisplayZone) -> Self {
        Self {
            zone,
            slot: FeedSlot::new(),
        }
    }

    pub fn begin_refresh(&mut self, day: u32, month: u32, year: i32) -> DayTicket {
        self.slot.issue(DayAgendaArgs { day, month, year })
    }

    pub fn begin_refresh_for(&mut self, date: NaiveDate) -> DayTicket {
        self.begin_refresh(date.day(), date.month(), date.year())
    }

    #[instrument(skip(self, result), fields(request_id = ticket.id()))]
    pub fn complete(
        &mut self,
        ticket: DayTicket,
        result: Result<Vec<Appointment>, FetchError>,
    ) -> Result<RefreshOutcome, FetchError> {
        let zone = self.zone;
        let entries = result.map(|appointments| {
            appointments
                .into_iter()
                .map(|appointment| AgendaEntry::new(appointment, zone))
                .collect()
        });
        self.slot.complete(ticket, entries)
    }

    pub fn entries(&self) -> &[AgendaEntry] {
        self.slot.items()
    }

    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    pub fn loaded_for(&self) -> Option<DayAgendaArgs> {
        self.slot.loaded_for()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.slot.last_error()
    }

    pub fn is_loading(&self) -> bool {
        self.slot.is_loading()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::DayAgendaStore;
    use crate::api::FetchError;
    use crate::datetime::DisplayZone;
    use crate::feed::RefreshOutcome;
    use crate::model::{Appointment, AppointmentUser};

    fn appointment(id: &str, hour: u32, minute: u32) -> Appointment {
        Appointment {
            id: id.to_string(),
            date: Utc
                .with_ymd_and_hms(2024, 3, 11, hour, minute, 0)
                .single()
                .expect("valid instant"),
            user: AppointmentUser {
                name: format!("client {id}"),
                avatar_url: None,
            },
        }
    }

    #[test]
    fn refresh_formats_every_entry() {
        let mut store = DayAgendaStore::new(DisplayZone::Named(chrono_tz::UTC));
        let ticket = store.begin_refresh(11, 3, 2024);
        let outcome = store
            .complete(
                ticket,
                Ok(vec![appointment("a", 9, 0), appointment("b", 14, 5)]),
            )
            .expect("apply agenda");
        assert_eq!(outcome, RefreshOutcome::Applied { count: 2 });

        let hours: Vec<&str> = store
            .entries()
            .iter()
            .map(|entry| entry.hour_formatted.as_str())
            .collect();
        assert_eq!(hours, vec!["09:00", "14:05"]);
        assert_eq!(store.loaded_for().map(|args| args.day), Some(11));
    }

    #[test]
    fn failure_keeps_previous_agenda() {
        let mut store = DayAgendaStore::new(DisplayZone::Named(chrono_tz::UTC));
        let ticket = store.begin_refresh(11, 3, 2024);
        store
            .complete(ticket, Ok(vec![appointment("a", 9, 0)]))
            .expect("apply agenda");

        let failing = store.begin_refresh(12, 3, 2024);
        let result = store.complete(
            failing,
            Err(FetchError::Decode {
                endpoint: "/appointments/me".to_string(),
                message: "expected array".to_string(),
            }),
        );
        assert!(result.is_err());
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.entries()[0].id(), "a");
        assert!(store.last_error().is_some());
    }

    #[test]
    fn no_size_cap_on_agenda() {
        let mut store = DayAgendaStore::new(DisplayZone::Named(chrono_tz::UTC));
        let ticket = store.begin_refresh(11, 3, 2024);
        let many: Vec<Appointment> = (0..500)
            .map(|idx| appointment(&format!("id-{idx}"), 8 + (idx % 10), idx % 60))
            .collect();
        store.complete(ticket, Ok(many)).expect("apply agenda");
        assert_eq!(store.entries().len(), 500);
    }
}
