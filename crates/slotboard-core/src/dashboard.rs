use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::calendar::MonthGrid;
use crate::controller::CalendarController;
use crate::datetime::format_weekday_name;
use crate::model::AgendaEntry;
use crate::partition::{AgendaOrdering, next_upcoming, partition_by_hour};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOptions {
    pub locale: String,
    pub ordering: AgendaOrdering,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            locale: "en_US".to_string(),
            ordering: AgendaOrdering::FeedOrder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    Url(String),
    /// Bundled default picture.
    Placeholder,
}

impl Avatar {
    fn from_url(url: Option<&str>) -> Self {
        match url.map(str::trim) {
            Some(url) if !url.is_empty() => Avatar::Url(url.to_string()),
            _ => Avatar::Placeholder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileHeader {
    pub name: String,
    pub avatar: Avatar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleHeader {
    pub date: NaiveDate,
    pub is_today: bool,
    pub day_of_month: u32,
    pub weekday: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentCard {
    pub id: String,
    pub client_name: String,
    pub avatar: Avatar,
    pub hour_formatted: String,
}

impl From<&AgendaEntry> for AppointmentCard {
    fn from(entry: &AgendaEntry) -> Self {
        Self {
            id: entry.appointment.id.clone(),
            client_name: entry.appointment.user.name.clone(),
            avatar: Avatar::from_url(entry.appointment.user.avatar_url.as_deref()),
            hour_formatted: entry.hour_formatted.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Morning,
    Afternoon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaSection {
    pub period: Period,
    pub appointments: Vec<AppointmentCard>,
}

impl AgendaSection {
    fn new(period: Period, entries: &[&AgendaEntry]) -> Self {
        Self {
            period,
            appointments: entries.iter().map(|entry| AppointmentCard::from(*entry)).collect(),
        }
    }

    /// Empty sections render the "no appointments" placeholder.
    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }
}

/// Everything the dashboard screen shows, derived from the controller on
/// every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub profile: ProfileHeader,
    pub schedule: ScheduleHeader,
    pub next_appointment: Option<AppointmentCard>,
    pub morning: AgendaSection,
    pub afternoon: AgendaSection,
    pub calendar: MonthGrid,
    pub loading: bool,
    /// Failed refreshes, for display next to stale data.
    pub notices: Vec<String>,
}

impl DashboardView {
    #[tracing::instrument(skip(controller, options))]
    pub fn derive(
        controller: &CalendarController,
        now: DateTime<Utc>,
        options: &DashboardOptions,
    ) -> Self {
        let zone = controller.zone();
        let today = zone.today(now);
        let selected = controller.selection().selected_day;
        let entries = controller.agenda().entries();

        let buckets = partition_by_hour(entries, zone, options.ordering);
        let next_appointment =
            next_upcoming(entries, now, options.ordering).map(AppointmentCard::from);

        let user = &controller.session().user;
        let notices = [controller.availability().last_error(), controller.agenda().last_error()]
            .into_iter()
            .flatten()
            .map(ToString::to_string)
            .collect();

        Self {
            profile: ProfileHeader {
                name: user.name.clone(),
                avatar: Avatar::from_url(user.avatar_url.as_deref()),
            },
            schedule: ScheduleHeader {
                date: selected,
                is_today: selected == today,
                day_of_month: selected.day(),
                weekday: format_weekday_name(selected, &options.locale),
            },
            next_appointment,
            morning: AgendaSection::new(Period::Morning, &buckets.morning),
            afternoon: AgendaSection::new(Period::Afternoon, &buckets.afternoon),
            calendar: controller.month_grid(today),
            loading: controller.availability().is_loading() || controller.agenda().is_loading(),
            notices,
        }
    }
}
