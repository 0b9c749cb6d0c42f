use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use slotboard_shared::MonthAvailabilityArgs;
use tracing::{debug, info, instrument};

use crate::agenda::{DayAgendaStore, DayTicket};
use crate::api::{BookingApi, FetchError};
use crate::availability::{MonthAvailabilityStore, MonthTicket};
use crate::calendar::{self, DayModifiers, MonthGrid};
use crate::datetime::{DisplayZone, is_weekend, month_start};
use crate::feed::RefreshOutcome;
use crate::model::{Appointment, DayAvailability, Session};

/// The two calendar cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_day: NaiveDate,
    /// Always the first day of the viewed month.
    pub viewed_month: NaiveDate,
}

/// A refresh the host still has to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingRefresh {
    Month(MonthTicket),
    Day(DayTicket),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub applied: usize,
    pub discarded: usize,
    pub failures: Vec<FetchError>,
}

impl SyncReport {
    fn record(&mut self, result: Result<RefreshOutcome, FetchError>) {
        match result {
            Ok(RefreshOutcome::Applied { .. }) => self.applied += 1,
            Ok(RefreshOutcome::Discarded { .. }) => self.discarded += 1,
            Err(err) => self.failures.push(err),
        }
    }

    /// Folds the outcome of a later sync into this one.
    pub fn merge(&mut self, other: SyncReport) {
        self.applied += other.applied;
        self.discarded += other.discarded;
        self.failures.extend(other.failures);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the selection cursors and both stores. Cursor changes queue refresh
/// tickets; the host performs them with [`CalendarController::sync`] or by
/// hand through [`CalendarController::take_pending`].
#[derive(Debug)]
pub struct CalendarController {
    session: Session,
    zone: DisplayZone,
    selection: SelectionState,
    availability: MonthAvailabilityStore,
    agenda: DayAgendaStore,
    pending_month: Option<MonthTicket>,
    pending_day: Option<DayTicket>,
}

impl CalendarController {
    #[instrument(skip(session, now), fields(user = %session.user.id))]
    pub fn new(session: Session, zone: DisplayZone, now: DateTime<Utc>) -> Self {
        let today = zone.today(now);
        let mut controller = Self {
            session,
            zone,
            selection: SelectionState {
                selected_day: today,
                viewed_month: month_start(today),
            },
            availability: MonthAvailabilityStore::new(),
            agenda: DayAgendaStore::new(zone),
            pending_month: None,
            pending_day: None,
        };
        controller.queue_month_refresh();
        controller.queue_day_refresh();
        info!(today = %today, zone = %zone.label(), "calendar controller mounted");
        controller
    }

    /// Moves the selected day when the calendar surface reports the cell as
    /// available and not disabled. Weekends and days the availability feed
    /// marks unavailable are refused regardless of the flags.
    #[instrument(skip(self), fields(current = %self.selection.selected_day))]
    pub fn pick_day(&mut self, candidate: NaiveDate, is_available: bool, is_disabled: bool) -> bool {
        if !is_available || is_disabled {
            debug!("pick refused by calendar modifiers");
            return false;
        }
        if is_weekend(candidate) {
            debug!("pick refused: weekend");
            return false;
        }
        if self.is_marked_unavailable(candidate) {
            debug!("pick refused: day marked unavailable");
            return false;
        }

        if candidate != self.selection.selected_day {
            self.selection.selected_day = candidate;
            self.queue_day_refresh();
            info!(selected = %candidate, "selected day changed");
        }
        true
    }

    /// [`CalendarController::pick_day`] with the modifiers the month grid
    /// would show for `candidate`.
    pub fn pick_day_on_calendar(&mut self, candidate: NaiveDate, today: NaiveDate) -> bool {
        let modifiers = self.modifiers_for(candidate, today);
        self.pick_day(candidate, modifiers.available, modifiers.disabled)
    }

    #[instrument(skip(self), fields(current = %self.selection.viewed_month))]
    pub fn change_month(&mut self, new_month: NaiveDate) {
        let normalized = month_start(new_month);
        if normalized == self.selection.viewed_month {
            return;
        }
        self.selection.viewed_month = normalized;
        self.queue_month_refresh();
        info!(viewed = %normalized, "viewed month changed");
    }

    /// Re-queues both refreshes for the current cursors.
    pub fn reload(&mut self) {
        self.queue_month_refresh();
        self.queue_day_refresh();
    }

    pub fn take_pending(&mut self) -> Vec<PendingRefresh> {
        let mut pending = Vec::with_capacity(2);
        if let Some(ticket) = self.pending_month.take() {
            pending.push(PendingRefresh::Month(ticket));
        }
        if let Some(ticket) = self.pending_day.take() {
            pending.push(PendingRefresh::Day(ticket));
        }
        pending
    }

    pub fn has_pending(&self) -> bool {
        self.pending_month.is_some() || self.pending_day.is_some()
    }

    pub fn complete_month(
        &mut self,
        ticket: MonthTicket,
        result: Result<Vec<DayAvailability>, FetchError>,
    ) -> Result<RefreshOutcome, FetchError> {
        self.availability.complete(ticket, result)
    }

    pub fn complete_day(
        &mut self,
        ticket: DayTicket,
        result: Result<Vec<Appointment>, FetchError>,
    ) -> Result<RefreshOutcome, FetchError> {
        self.agenda.complete(ticket, result)
    }

    /// Performs every queued refresh. Both reads run concurrently and are
    /// applied once both have resolved.
    #[instrument(skip_all)]
    pub async fn sync<A>(&mut self, api: &A) -> SyncReport
    where
        A: BookingApi + ?Sized,
    {
        let month_ticket = self.pending_month.take();
        let day_ticket = self.pending_day.take();

        let month_read = async move {
            match month_ticket {
                Some(ticket) => Some((ticket, api.month_availability(ticket.params()).await)),
                None => None,
            }
        };
        let day_read = async move {
            match day_ticket {
                Some(ticket) => Some((ticket, api.day_agenda(ticket.params()).await)),
                None => None,
            }
        };
        let (month, day) = tokio::join!(month_read, day_read);

        let mut report = SyncReport::default();
        if let Some((ticket, result)) = month {
            report.record(self.complete_month(ticket, result));
        }
        if let Some((ticket, result)) = day {
            report.record(self.complete_day(ticket, result));
        }

        debug!(
            applied = report.applied,
            discarded = report.discarded,
            failures = report.failures.len(),
            "sync finished"
        );
        report
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    pub fn availability(&self) -> &MonthAvailabilityStore {
        &self.availability
    }

    pub fn agenda(&self) -> &DayAgendaStore {
        &self.agenda
    }

    pub fn unavailable_dates(&self) -> BTreeSet<NaiveDate> {
        self.availability.unavailable_dates(self.selection.viewed_month)
    }

    pub fn modifiers_for(&self, date: NaiveDate, today: NaiveDate) -> DayModifiers {
        calendar::day_modifiers(
            date,
            self.selection.viewed_month,
            &self.unavailable_dates(),
            self.selection.selected_day,
            today,
        )
    }

    pub fn month_grid(&self, today: NaiveDate) -> MonthGrid {
        calendar::build_month_grid(
            self.selection.viewed_month,
            &self.unavailable_dates(),
            self.selection.selected_day,
            today,
        )
    }

    fn is_marked_unavailable(&self, date: NaiveDate) -> bool {
        let args = MonthAvailabilityArgs {
            year: date.year(),
            month: date.month(),
        };
        self.availability.loaded_for() == Some(args)
            && self
                .availability
                .days()
                .iter()
                .any(|entry| !entry.available && entry.day == date.day())
    }

    fn queue_month_refresh(&mut self) {
        let month = self.selection.viewed_month;
        self.pending_month = Some(self.availability.begin_refresh(month.year(), month.month()));
    }

    fn queue_day_refresh(&mut self) {
        self.pending_day = Some(self.agenda.begin_refresh_for(self.selection.selected_day));
    }
}
