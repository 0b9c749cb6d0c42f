use std::io::{self, IsTerminal, Write};

use chrono::Datelike;
use unicode_width::UnicodeWidthStr;

use crate::calendar::{CalendarCell, MonthGrid, WEEK_START};
use crate::config::Config;
use crate::dashboard::{AgendaSection, AppointmentCard, Avatar, DashboardView, Period};
use crate::datetime::{format_month_heading, weekday_abbreviations};

/// Fixed dashboard text for one language.
#[derive(Debug, PartialEq, Eq)]
pub struct Labels {
    pub welcome: &'static str,
    pub scheduled: &'static str,
    pub today: &'static str,
    pub day: &'static str,
    pub refreshing: &'static str,
    pub next_appointment: &'static str,
    pub morning: &'static str,
    pub afternoon: &'static str,
    pub empty_section: &'static str,
    pub legend: &'static str,
}

const ENGLISH: Labels = Labels {
    welcome: "Welcome,",
    scheduled: "Scheduled appointments",
    today: "Today",
    day: "day",
    refreshing: "(refreshing...)",
    next_appointment: "Next appointment",
    morning: "Morning",
    afternoon: "Afternoon",
    empty_section: "No appointments for this period",
    legend: "[dd] selected   dd- unavailable",
};

const PORTUGUESE: Labels = Labels {
    welcome: "Bem-vindo,",
    scheduled: "Horários agendados",
    today: "Hoje",
    day: "dia",
    refreshing: "(atualizando...)",
    next_appointment: "Agendamento a seguir",
    morning: "Manhã",
    afternoon: "Tarde",
    empty_section: "Nenhum agendamento para esse período",
    legend: "[dd] selecionado   dd- indisponível",
};

impl Labels {
    /// Portuguese for any `pt` locale, English otherwise.
    pub fn for_locale(locale: &str) -> &'static Labels {
        let language = locale
            .trim()
            .split(['_', '-'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "pt" => &PORTUGUESE,
            _ => &ENGLISH,
        }
    }

    fn period(&self, period: Period) -> &'static str {
        match period {
            Period::Morning => self.morning,
            Period::Afternoon => self.afternoon,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    locale: String,
    labels: &'static Labels,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        let color = cfg.get_bool("color").unwrap_or(true) && io::stdout().is_terminal();
        let locale = cfg.get("locale").unwrap_or_else(|| "en_US".to_string());
        Self::plain().with_locale(&locale).with_color(color)
    }

    pub fn plain() -> Self {
        Self {
            color: false,
            locale: "en_US".to_string(),
            labels: &ENGLISH,
        }
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.labels = Labels::for_locale(locale);
        self.locale = locale.to_string();
        self
    }

    fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    #[tracing::instrument(skip(self, view), fields(locale = %self.locale))]
    pub fn print_dashboard(&self, view: &DashboardView) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        self.write_dashboard(out, view)
    }

    pub fn write_dashboard<W: Write>(&self, mut out: W, view: &DashboardView) -> anyhow::Result<()> {
        let labels = self.labels;
        writeln!(
            out,
            "{} {} {}",
            labels.welcome,
            self.paint(&view.profile.name, "1"),
            avatar_label(&view.profile.avatar)
        )?;
        writeln!(out)?;

        writeln!(out, "{}", self.paint(labels.scheduled, "1"))?;
        let mut header = Vec::new();
        if view.schedule.is_today {
            header.push(self.paint(labels.today, "33"));
        }
        header.push(format!("{} {}", labels.day, view.schedule.day_of_month));
        header.push(view.schedule.weekday.clone());
        writeln!(out, "{}", header.join(" | "))?;

        if view.loading {
            writeln!(out, "{}", self.paint(labels.refreshing, "90"))?;
        }
        for notice in &view.notices {
            writeln!(out, "{} {notice}", self.paint("!", "31"))?;
        }
        writeln!(out)?;

        if let Some(next) = &view.next_appointment {
            writeln!(out, "{}", self.paint(labels.next_appointment, "1"))?;
            writeln!(out, "  {}", self.card_line(next))?;
            writeln!(out)?;
        }

        self.write_section(&mut out, &view.morning)?;
        self.write_section(&mut out, &view.afternoon)?;

        self.write_calendar(&mut out, &view.calendar)?;
        Ok(())
    }

    fn write_section<W: Write>(&self, out: &mut W, section: &AgendaSection) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(self.labels.period(section.period), "1"))?;
        if section.is_empty() {
            writeln!(out, "  {}", self.labels.empty_section)?;
        }
        for card in &section.appointments {
            writeln!(out, "  {}", self.card_line(card))?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn card_line(&self, card: &AppointmentCard) -> String {
        format!(
            "{}  {} {}",
            self.paint(&card.hour_formatted, "36"),
            card.client_name,
            avatar_label(&card.avatar)
        )
    }

    fn write_calendar<W: Write>(&self, out: &mut W, grid: &MonthGrid) -> anyhow::Result<()> {
        let back = if grid.can_go_back { "<" } else { " " };
        writeln!(
            out,
            "{back} {} >",
            self.paint(&format_month_heading(grid.month, &self.locale), "1")
        )?;

        let headers = weekday_abbreviations(WEEK_START, &self.locale);
        let rows = grid
            .weeks
            .iter()
            .map(|week| week.iter().map(|cell| self.calendar_cell(cell)).collect())
            .collect();
        write_table(&mut *out, headers, rows)?;
        writeln!(out, "{}", self.labels.legend)?;
        Ok(())
    }

    fn calendar_cell(&self, cell: &CalendarCell) -> String {
        let modifiers = cell.modifiers;
        if modifiers.outside {
            return String::new();
        }

        let day = cell.date.day();
        let text = if modifiers.selected {
            format!("[{day:>2}]")
        } else if modifiers.disabled {
            format!("{day:>2}-")
        } else {
            format!("{day:>2}")
        };

        if modifiers.today {
            self.paint(&text, "33")
        } else if modifiers.disabled {
            self.paint(&text, "90")
        } else {
            text
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn avatar_label(avatar: &Avatar) -> String {
    match avatar {
        Avatar::Url(url) => format!("<{url}>"),
        Avatar::Placeholder => String::new(),
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:>width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", " ".repeat(padding), cell)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;

    use super::{Labels, Renderer, strip_ansi};
    use crate::calendar::build_month_grid;
    use crate::config::Config;
    use crate::dashboard::{
        AgendaSection, AppointmentCard, Avatar, DashboardView, Period, ProfileHeader,
        ScheduleHeader,
    };
    use crate::datetime::format_weekday_name;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn view() -> DashboardView {
        let today = date(2024, 3, 11);
        let card = AppointmentCard {
            id: "b".to_string(),
            client_name: "Bia".to_string(),
            avatar: Avatar::Url("https://cdn.example/b.png".to_string()),
            hour_formatted: "14:00".to_string(),
        };
        DashboardView {
            profile: ProfileHeader {
                name: "Marta".to_string(),
                avatar: Avatar::Placeholder,
            },
            schedule: ScheduleHeader {
                date: today,
                is_today: true,
                day_of_month: 11,
                weekday: "Monday".to_string(),
            },
            next_appointment: Some(card.clone()),
            morning: AgendaSection {
                period: Period::Morning,
                appointments: vec![],
            },
            afternoon: AgendaSection {
                period: Period::Afternoon,
                appointments: vec![card],
            },
            calendar: build_month_grid(today, &BTreeSet::from([date(2024, 3, 12)]), today, today),
            loading: false,
            notices: vec!["/appointments/me answered HTTP 500: boom".to_string()],
        }
    }

    #[test]
    fn plain_dashboard_text() {
        let mut out = Vec::new();
        Renderer::plain()
            .write_dashboard(&mut out, &view())
            .expect("render");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("Welcome, Marta"));
        assert!(text.contains("Today | day 11 | Monday"));
        assert!(text.contains("! /appointments/me answered HTTP 500: boom"));
        assert!(text.contains("Next appointment\n  14:00  Bia <https://cdn.example/b.png>"));
        assert!(text.contains("Morning\n  No appointments for this period"));
        assert!(text.contains("March 2024"));
        assert!(text.contains("[11]"));
        assert!(text.contains("12-"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn portuguese_locale_translates_every_label() {
        let mut view = view();
        view.schedule.weekday = format_weekday_name(view.schedule.date, "pt_BR");

        let mut out = Vec::new();
        Renderer::plain()
            .with_locale("pt_BR")
            .write_dashboard(&mut out, &view)
            .expect("render");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("Bem-vindo, Marta"));
        assert!(text.contains("Horários agendados"));
        assert!(text.contains("Hoje | dia 11 | segunda"));
        assert!(text.contains("Agendamento a seguir\n  14:00  Bia"));
        assert!(text.contains("Manhã\n  Nenhum agendamento para esse período"));
        assert!(text.contains("Tarde\n  14:00"));
        assert!(text.lines().any(|line| line.trim_start().starts_with("dom")));
        assert!(text.contains("dd- indisponível"));
        for english in ["Welcome", "Today", "Morning", "Afternoon", "March", "Sun"] {
            assert!(!text.contains(english), "unexpected {english:?} in:\n{text}");
        }
    }

    #[test]
    fn renderer_reads_color_and_locale_from_config() {
        let mut cfg = Config::default();
        cfg.apply_overrides([
            ("color".to_string(), "off".to_string()),
            ("locale".to_string(), "pt-BR".to_string()),
        ]);
        let renderer = Renderer::new(&cfg);
        assert!(!renderer.color);
        assert_eq!(renderer.locale, "pt-BR");
        assert_eq!(renderer.labels, Labels::for_locale("pt_BR"));
        assert_eq!(Labels::for_locale("fr_FR").morning, "Morning");
    }

    #[test]
    fn strip_ansi_removes_escape_codes() {
        assert_eq!(strip_ansi("\x1b[33m[11]\x1b[0m"), "[11]");
    }
}
