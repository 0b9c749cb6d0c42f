use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};

use crate::datetime::{DisplayZone, calendar_fields};
use crate::model::AgendaEntry;

pub const AFTERNOON_START_HOUR: u32 = 12;

/// How far the agenda feed's ordering is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgendaOrdering {
    /// Keep the feed's order; the server sorts by start time.
    #[default]
    FeedOrder,
    /// Sort buckets by `date` and pick the earliest upcoming entry.
    Chronological,
}

impl FromStr for AgendaOrdering {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "feed" | "feed-order" => Ok(Self::FeedOrder),
            "chronological" | "sorted" => Ok(Self::Chronological),
            other => Err(anyhow!("invalid agenda.ordering: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgendaBuckets<'a> {
    pub morning: Vec<&'a AgendaEntry>,
    pub afternoon: Vec<&'a AgendaEntry>,
}

impl AgendaBuckets<'_> {
    pub fn len(&self) -> usize {
        self.morning.len() + self.afternoon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Morning is every entry whose hour in `zone` is before noon; afternoon is
/// the rest.
pub fn partition_by_hour(
    entries: &[AgendaEntry],
    zone: DisplayZone,
    ordering: AgendaOrdering,
) -> AgendaBuckets<'_> {
    let (mut morning, mut afternoon): (Vec<&AgendaEntry>, Vec<&AgendaEntry>) = entries
        .iter()
        .partition(|entry| calendar_fields(entry.date(), zone).hour < AFTERNOON_START_HOUR);

    if ordering == AgendaOrdering::Chronological {
        morning.sort_by_key(|entry| entry.date());
        afternoon.sort_by_key(|entry| entry.date());
    }

    AgendaBuckets { morning, afternoon }
}

/// The appointment to call out as "next": strictly after `now`.
pub fn next_upcoming(
    entries: &[AgendaEntry],
    now: DateTime<Utc>,
    ordering: AgendaOrdering,
) -> Option<&AgendaEntry> {
    let mut upcoming = entries.iter().filter(|entry| entry.date() > now);
    match ordering {
        AgendaOrdering::FeedOrder => upcoming.next(),
        AgendaOrdering::Chronological => upcoming.min_by_key(|entry| entry.date()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Timelike, Utc};

    use super::{AgendaOrdering, next_upcoming, partition_by_hour};
    use crate::datetime::DisplayZone;
    use crate::model::{AgendaEntry, Appointment, AppointmentUser};

    const ZONE: DisplayZone = DisplayZone::Named(chrono_tz::UTC);

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 11, hour, minute, 0)
            .single()
            .expect("valid instant")
    }

    fn entry(id: &str, hour: u32, minute: u32) -> AgendaEntry {
        AgendaEntry::new(
            Appointment {
                id: id.to_string(),
                date: at(hour, minute),
                user: AppointmentUser {
                    name: id.to_string(),
                    avatar_url: None,
                },
            },
            ZONE,
        )
    }

    fn ids(entries: &[&AgendaEntry]) -> Vec<String> {
        entries.iter().map(|entry| entry.id().to_string()).collect()
    }

    #[test]
    fn splits_nine_half_eleven_and_two() {
        let agenda = vec![entry("09:00", 9, 0), entry("11:30", 11, 30), entry("14:00", 14, 0)];
        let buckets = partition_by_hour(&agenda, ZONE, AgendaOrdering::FeedOrder);
        assert_eq!(ids(&buckets.morning), vec!["09:00", "11:30"]);
        assert_eq!(ids(&buckets.afternoon), vec!["14:00"]);
    }

    #[test]
    fn noon_belongs_to_afternoon_and_late_morning_to_morning() {
        let agenda = vec![entry("noon", 12, 0), entry("late", 11, 59), entry("midnight", 0, 0)];
        let buckets = partition_by_hour(&agenda, ZONE, AgendaOrdering::FeedOrder);
        assert_eq!(ids(&buckets.morning), vec!["late", "midnight"]);
        assert_eq!(ids(&buckets.afternoon), vec!["noon"]);
    }

    #[test]
    fn buckets_are_a_permutation_of_the_input() {
        let agenda: Vec<AgendaEntry> = (0..24)
            .map(|hour| entry(&format!("h{hour}"), (hour * 7) % 24, hour))
            .collect();
        for ordering in [AgendaOrdering::FeedOrder, AgendaOrdering::Chronological] {
            let buckets = partition_by_hour(&agenda, ZONE, ordering);
            assert_eq!(buckets.len(), agenda.len());

            let mut seen = ids(&buckets.morning);
            seen.extend(ids(&buckets.afternoon));
            seen.sort();
            let mut expected: Vec<String> =
                agenda.iter().map(|entry| entry.id().to_string()).collect();
            expected.sort();
            assert_eq!(seen, expected);

            assert!(buckets.morning.iter().all(|entry| entry.date().hour() < 12));
            assert!(buckets.afternoon.iter().all(|entry| entry.date().hour() >= 12));
        }
    }

    #[test]
    fn feed_order_is_preserved_within_buckets() {
        let agenda = vec![entry("b", 10, 0), entry("a", 8, 0), entry("d", 16, 0), entry("c", 13, 0)];
        let kept = partition_by_hour(&agenda, ZONE, AgendaOrdering::FeedOrder);
        assert_eq!(ids(&kept.morning), vec!["b", "a"]);
        assert_eq!(ids(&kept.afternoon), vec!["d", "c"]);

        let sorted = partition_by_hour(&agenda, ZONE, AgendaOrdering::Chronological);
        assert_eq!(ids(&sorted.morning), vec!["a", "b"]);
        assert_eq!(ids(&sorted.afternoon), vec!["c", "d"]);
    }

    #[test]
    fn empty_agenda_has_empty_buckets_and_no_next() {
        let agenda: Vec<AgendaEntry> = vec![];
        let buckets = partition_by_hour(&agenda, ZONE, AgendaOrdering::FeedOrder);
        assert!(buckets.morning.is_empty());
        assert!(buckets.afternoon.is_empty());
        assert!(next_upcoming(&agenda, at(10, 0), AgendaOrdering::FeedOrder).is_none());
    }

    #[test]
    fn next_after_ten_is_half_eleven() {
        let agenda = vec![entry("09:00", 9, 0), entry("11:30", 11, 30), entry("14:00", 14, 0)];
        let next = next_upcoming(&agenda, at(10, 0), AgendaOrdering::FeedOrder)
            .expect("an upcoming entry");
        assert_eq!(next.id(), "11:30");
    }

    #[test]
    fn next_is_strictly_after_now() {
        let agenda = vec![entry("09:00", 9, 0), entry("11:30", 11, 30)];
        let next = next_upcoming(&agenda, at(9, 0), AgendaOrdering::FeedOrder)
            .expect("an upcoming entry");
        assert_eq!(next.id(), "11:30");
        assert!(next_upcoming(&agenda, at(11, 30), AgendaOrdering::FeedOrder).is_none());
    }

    #[test]
    fn feed_order_takes_first_match_chronological_takes_minimum() {
        let agenda = vec![entry("late", 15, 0), entry("early", 11, 0), entry("past", 8, 0)];
        let now = at(10, 0);
        assert_eq!(
            next_upcoming(&agenda, now, AgendaOrdering::FeedOrder).map(|entry| entry.id()),
            Some("late")
        );
        assert_eq!(
            next_upcoming(&agenda, now, AgendaOrdering::Chronological).map(|entry| entry.id()),
            Some("early")
        );
    }

    #[test]
    fn ordering_parses_from_config_values() {
        assert_eq!(
            "Chronological".parse::<AgendaOrdering>().expect("parse"),
            AgendaOrdering::Chronological
        );
        assert_eq!("feed".parse::<AgendaOrdering>().expect("parse"), AgendaOrdering::FeedOrder);
        assert!("random".parse::<AgendaOrdering>().is_err());
    }
}
