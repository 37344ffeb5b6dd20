//! Titles and sublines of result entries.
//!
//! Sublines summarise when an event happens or a task is due:
//!
//! | Input                          | Subline                          |
//! |--------------------------------|----------------------------------|
//! | timed event, same day          | `20.08.20 15:00 - 17:00`         |
//! | timed event, spanning days     | `20.08.20 15:00 - 21.08.20 17:00`|
//! | all-day event, one day         | `25.08.20`                       |
//! | all-day event, several days    | `25.08.20 - 28.08.20`            |
//! | completed task                 | `Completed on 20.08.20`          |
//! | task with a due date           | `Due on 20.08.20`                |
//!
//! Times are shown in the wall clock they were written in.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use davsearch_core::{IcalComponent, IcalDateTime, parse_duration};

const DEFAULT_DATE_FORMAT: &str = "%d.%m.%y";
const DEFAULT_TIME_FORMAT: &str = "%H:%M";

/// Configuration options for entry formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// `strftime` pattern for dates.
    pub date_format: String,
    /// `strftime` pattern for times.
    pub time_format: String,
    /// Title of events without a summary.
    pub untitled_event: String,
    /// Title of tasks without a summary.
    pub untitled_task: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            untitled_event: "Untitled event".to_string(),
            untitled_task: "Untitled task".to_string(),
        }
    }
}

impl FormatOptions {
    /// Builder: set the date pattern.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Builder: set the time pattern.
    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = format.into();
        self
    }

    /// Checks that both patterns are valid `strftime` strings.
    ///
    /// # Errors
    ///
    /// Returns the offending pattern.
    pub fn validate(&self) -> Result<(), String> {
        for pattern in [&self.date_format, &self.time_format] {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(pattern.clone());
            }
        }
        Ok(())
    }

    /// Formats a date, falling back to the default pattern if the
    /// configured one is invalid.
    pub fn format_date(&self, date: NaiveDate) -> String {
        render(|out| write!(out, "{}", date.format(&self.date_format)))
            .unwrap_or_else(|| date.format(DEFAULT_DATE_FORMAT).to_string())
    }

    /// Formats a time of day, with the same fallback as [`Self::format_date`].
    pub fn format_time(&self, at: NaiveDateTime) -> String {
        render(|out| write!(out, "{}", at.format(&self.time_format)))
            .unwrap_or_else(|| at.format(DEFAULT_TIME_FORMAT).to_string())
    }

    fn format_date_time(&self, at: NaiveDateTime) -> String {
        format!("{} {}", self.format_date(at.date()), self.format_time(at))
    }
}

/// chrono reports invalid patterns as a `fmt::Error` while writing.
fn render(f: impl FnOnce(&mut String) -> std::fmt::Result) -> Option<String> {
    let mut out = String::new();
    f(&mut out).ok().map(|()| out)
}

/// Produces the type-specific parts of an entry.
pub trait SublineFormatter: Send + Sync {
    /// Returns the secondary line for `component`, possibly empty.
    fn subline(&self, component: &IcalComponent, options: &FormatOptions) -> String;

    /// Returns the title used when `SUMMARY` is absent or blank.
    fn untitled<'a>(&self, options: &'a FormatOptions) -> &'a str;

    /// Returns the entry title: the trimmed `SUMMARY` or the placeholder.
    fn title(&self, component: &IcalComponent, options: &FormatOptions) -> String {
        component
            .property_value("SUMMARY")
            .map(str::trim)
            .filter(|summary| !summary.is_empty())
            .unwrap_or_else(|| self.untitled(options))
            .to_string()
    }
}

/// Sublines for `VEVENT`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventSubline;

impl EventSubline {
    fn end(component: &IcalComponent, start: &IcalDateTime) -> Option<IcalDateTime> {
        component
            .property("DTEND")
            .and_then(IcalDateTime::from_property)
            .or_else(|| {
                component
                    .property_value("DURATION")
                    .and_then(parse_duration)
                    .and_then(|duration| start.add(duration))
            })
    }
}

impl SublineFormatter for EventSubline {
    fn subline(&self, component: &IcalComponent, options: &FormatOptions) -> String {
        let Some(start) = component
            .property("DTSTART")
            .and_then(IcalDateTime::from_property)
        else {
            return String::new();
        };
        let end = Self::end(component, &start);

        if start.is_all_day() {
            let first = start.date();
            // DTEND of an all-day event is exclusive.
            let last = end
                .map(|end| end.date())
                .filter(|end| *end > first)
                .and_then(|end| end.checked_sub_days(Days::new(1)))
                .unwrap_or(first);
            if last <= first {
                return options.format_date(first);
            }
            return format!(
                "{} - {}",
                options.format_date(first),
                options.format_date(last)
            );
        }

        let from = start.naive();
        let Some(to) = end.map(|end| end.naive()).filter(|to| *to > from) else {
            return options.format_date_time(from);
        };
        if to.date() == from.date() {
            format!("{} - {}", options.format_date_time(from), options.format_time(to))
        } else {
            format!(
                "{} - {}",
                options.format_date_time(from),
                options.format_date_time(to)
            )
        }
    }

    fn untitled<'a>(&self, options: &'a FormatOptions) -> &'a str {
        &options.untitled_event
    }
}

/// Sublines for `VTODO`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskSubline;

impl SublineFormatter for TaskSubline {
    fn subline(&self, component: &IcalComponent, options: &FormatOptions) -> String {
        let date_of = |name: &str| {
            component
                .property(name)
                .and_then(IcalDateTime::from_property)
                .map(|value| options.format_date(value.date()))
        };

        if let Some(completed) = date_of("COMPLETED") {
            return format!("Completed on {completed}");
        }
        if let Some(due) = date_of("DUE") {
            return format!("Due on {due}");
        }
        String::new()
    }

    fn untitled<'a>(&self, options: &'a FormatOptions) -> &'a str {
        &options.untitled_task
    }
}
