use chrono::{DateTime, Utc};
use slotboard_shared::{AppointmentDto, DayAvailabilityDto};

use crate::datetime::{DisplayZone, format_clock, parse_instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayAvailability {
    pub day: u32,
    pub available: bool,
}

impl From<DayAvailabilityDto> for DayAvailability {
    fn from(dto: DayAvailabilityDto) -> Self {
        Self {
            day: dto.day,
            available: dto.available,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentUser {
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub id: String,
    pub date: DateTime<Utc>,
    pub user: AppointmentUser,
}

impl TryFrom<AppointmentDto> for Appointment {
    type Error = anyhow::Error;

    fn try_from(dto: AppointmentDto) -> Result<Self, Self::Error> {
        let date = parse_instant(&dto.date)?;
        Ok(Self {
            id: dto.id,
            date,
            user: AppointmentUser {
                name: dto.user.name,
                avatar_url: dto.user.avatar_url.filter(|url| !url.trim().is_empty()),
            },
        })
    }
}

/// An appointment as held by the agenda store, with its display time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaEntry {
    pub appointment: Appointment,
    pub hour_formatted: String,
}

impl AgendaEntry {
    pub fn new(appointment: Appointment, zone: DisplayZone) -> Self {
        let hour_formatted = format_clock(appointment.date, zone);
        Self {
            appointment,
            hour_formatted,
        }
    }

    pub fn id(&self) -> &str {
        &self.appointment.id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.appointment.date
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// The signed-in user and the bearer token used for API reads.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}
