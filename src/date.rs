//! Date handling: the [`Clock`] the store asks for "now", and the
//! [`DateFormat`] policy that turns a [`NaiveDate`] into the display string
//! shown next to each article.

use chrono::format::{Item, StrftimeItems};
use chrono::{Local, NaiveDate, Utc};
use std::fmt;

/// The display format used when nothing else is configured. Month and day
/// are zero-padded (`2025年09月25日`).
pub const DEFAULT_DATE_FORMAT: &str = "%Y年%m月%d日";

/// The ISO form dates are written in, both in seed data and in front matter.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of the current date and time. The store never reads the system
/// clock directly so callers (and tests) can pin "now".
pub trait Clock: Send + Sync {
    /// Today's date in the clock's local calendar.
    fn today(&self) -> NaiveDate;

    /// Milliseconds since the Unix epoch. Used for fallback slugs.
    fn timestamp_millis(&self) -> i64;
}

/// The wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn timestamp_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock frozen at a given date and timestamp.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock {
    pub today: NaiveDate,
    pub timestamp_millis: i64,
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn timestamp_millis(&self) -> i64 {
        self.timestamp_millis
    }
}

/// A validated strftime pattern. Validation happens once, up front, because
/// formatting a [`NaiveDate`] with a malformed pattern, or with one that asks
/// for a time or an offset (`%H`, `%z`, ...), panics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFormat(String);

impl DateFormat {
    /// Validates `pattern` and wraps it. The pattern must parse and must be
    /// renderable from a date alone.
    pub fn new<S: Into<String>>(pattern: S) -> Result<DateFormat> {
        use std::fmt::Write;
        let pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(Error::InvalidPattern(pattern));
        }
        let mut sample = String::new();
        if write!(sample, "{}", NaiveDate::default().format(&pattern)).is_err() {
            return Err(Error::InvalidPattern(pattern));
        }
        Ok(DateFormat(pattern))
    }

    pub fn pattern(&self) -> &str {
        &self.0
    }

    /// Renders `date` with this pattern.
    pub fn format(&self, date: NaiveDate) -> String {
        date.format(&self.0).to_string()
    }

    /// Renders an optional ISO date string. `None` renders today's date per
    /// `clock`; anything else must parse as `YYYY-MM-DD`.
    pub fn format_text(&self, text: Option<&str>, clock: &dyn Clock) -> Result<String> {
        match text {
            None => Ok(self.format(clock.today())),
            Some(text) => Ok(self.format(parse_iso_date(text)?)),
        }
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat(DEFAULT_DATE_FORMAT.to_owned())
    }
}

/// Parses a `YYYY-MM-DD` date, ignoring surrounding whitespace.
pub fn parse_iso_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), ISO_DATE_FORMAT).map_err(|err| Error::Parse {
        text: text.to_owned(),
        err,
    })
}

/// Represents the result of a date operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a date or a date format.
#[derive(Debug)]
pub enum Error {
    /// Returned when a date string isn't a valid ISO date.
    Parse {
        text: String,
        err: chrono::ParseError,
    },

    /// Returned when a display pattern contains an unknown specifier or
    /// needs more than a date to render (a time, an offset).
    InvalidPattern(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse { text, err } => {
                write!(f, "invalid date `{}`: {}", text, err)
            }
            Error::InvalidPattern(pattern) => {
                write!(f, "invalid date format `{}`", pattern)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse { text: _, err } => Some(err),
            Error::InvalidPattern(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn clock() -> FixedClock {
        FixedClock {
            today: NaiveDate::from_ymd_opt(2025, 9, 25).unwrap(),
            timestamp_millis: 1758785688708,
        }
    }

    #[test]
    fn test_format_default() -> Result<()> {
        let format = DateFormat::default();
        assert_eq!("2023年10月15日", format.format_text(Some("2023-10-15"), &clock())?);
        assert_eq!("2025年09月25日", format.format_text(None, &clock())?);
        Ok(())
    }

    #[test]
    fn test_format_custom_pattern() -> Result<()> {
        let format = DateFormat::new("%B %-d, %Y")?;
        assert_eq!("October 15, 2023", format.format_text(Some("2023-10-15"), &clock())?);
        Ok(())
    }

    #[test]
    fn test_invalid_pattern() {
        match DateFormat::new("%Y年%Q") {
            Err(Error::InvalidPattern(p)) => assert_eq!("%Y年%Q", p),
            other => panic!("expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn test_time_specifiers_rejected() {
        for pattern in &["%H", "%Y %H:%M", "%Y-%m-%d %S", "%Z", "%z"] {
            match DateFormat::new(*pattern) {
                Err(Error::InvalidPattern(p)) => assert_eq!(*pattern, p),
                other => panic!("expected InvalidPattern for {}, got {:?}", pattern, other),
            }
        }
    }

    #[test]
    fn test_unparsable_date() {
        match DateFormat::default().format_text(Some("15/10/2023"), &clock()) {
            Err(Error::Parse { text, .. }) => assert_eq!("15/10/2023", text),
            other => panic!("expected Parse, got {:?}", other),
        }
    }
}
