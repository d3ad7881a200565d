// Assemble dates from separate form fields

use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::core::filter::Filter;
use crate::models::config::parse_options;
use crate::models::{FilterError, Value};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct DateSelectOptions {
    /// Return null when any required field is empty
    pub null_on_empty: bool,
    /// Return null when every required field is empty
    pub null_on_all_empty: bool,
}

/// Empty-field policy shared by the three select filters
fn empty_outcome(options: &DateSelectOptions, fields: &[Option<&Value>]) -> Option<EmptyOutcome> {
    let empty = fields.iter().filter(|f| f.is_none()).count();
    if empty == 0 {
        return None;
    }
    if options.null_on_empty || (options.null_on_all_empty && empty == fields.len()) {
        Some(EmptyOutcome::Null)
    } else {
        Some(EmptyOutcome::Unchanged)
    }
}

enum EmptyOutcome {
    Null,
    Unchanged,
}

/// A field's value, or `None` when missing, null or an empty string
fn field<'a>(map: &'a IndexMap<String, Value>, name: &str) -> Option<&'a Value> {
    match map.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::Str(s)) if s.is_empty() => None,
        Some(value) => Some(value),
    }
}

/// Integral value of a date component
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
        Value::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Integer in the strict form accepted for month/year fields: no leading zeros
fn strict_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Str(s) => {
            let s = s.trim();
            let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
            if digits.len() > 1 && digits.starts_with('0') {
                return None;
            }
            s.parse().ok()
        }
        other => integer(other),
    }
}

fn calendar_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    if !(1000..=9999).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

/// `{year, month, day}` to `Y-MM-DD`
#[derive(Debug, Clone, Default)]
pub struct DateSelect {
    options: DateSelectOptions,
}

impl DateSelect {
    pub fn new(options: DateSelectOptions) -> Self {
        Self { options }
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Ok(Self::new(parse_options("DateSelect", options)?))
    }
}

impl Filter for DateSelect {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        let Value::Map(map) = &value else {
            return Ok(value);
        };

        let (day, month, year) = (field(map, "day"), field(map, "month"), field(map, "year"));
        match empty_outcome(&self.options, &[day, month, year]) {
            Some(EmptyOutcome::Null) => return Ok(Value::Null),
            Some(EmptyOutcome::Unchanged) => return Ok(value),
            None => {}
        }

        let parsed = (|| {
            let date = calendar_date(integer(year?)?, integer(month?)?, integer(day?)?)?;
            Some(date.format("%Y-%m-%d").to_string())
        })();

        Ok(parsed.map(Value::Str).unwrap_or(value))
    }
}

/// `{year, month, day, hour, minute, second}` to `Y-MM-DD HH:MM:SS`
#[derive(Debug, Clone, Default)]
pub struct DateTimeSelect {
    options: DateSelectOptions,
}

impl DateTimeSelect {
    pub fn new(options: DateSelectOptions) -> Self {
        Self { options }
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Ok(Self::new(parse_options("DateTimeSelect", options)?))
    }
}

impl Filter for DateTimeSelect {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        let Value::Map(map) = &value else {
            return Ok(value);
        };

        let day = field(map, "day");
        let month = field(map, "month");
        let year = field(map, "year");
        let hour = field(map, "hour");
        let minute = field(map, "minute");
        match empty_outcome(&self.options, &[day, month, year, hour, minute]) {
            Some(EmptyOutcome::Null) => return Ok(Value::Null),
            Some(EmptyOutcome::Unchanged) => return Ok(value),
            None => {}
        }
        let second = field(map, "second");

        let parsed = (|| {
            let date = calendar_date(integer(year?)?, integer(month?)?, integer(day?)?)?;
            let second = match second {
                Some(second) => integer(second)?,
                None => 0,
            };
            let time = NaiveTime::from_hms_opt(
                u32::try_from(integer(hour?)?).ok()?,
                u32::try_from(integer(minute?)?).ok()?,
                u32::try_from(second).ok()?,
            )?;
            Some(date.and_time(time).format("%Y-%m-%d %H:%M:%S").to_string())
        })();

        Ok(parsed.map(Value::Str).unwrap_or(value))
    }
}

/// `{year, month}` to `Y-MM`
#[derive(Debug, Clone, Default)]
pub struct MonthSelect {
    options: DateSelectOptions,
}

impl MonthSelect {
    pub fn new(options: DateSelectOptions) -> Self {
        Self { options }
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Ok(Self::new(parse_options("MonthSelect", options)?))
    }
}

impl Filter for MonthSelect {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        let Value::Map(map) = &value else {
            return Ok(value);
        };

        let (month, year) = (field(map, "month"), field(map, "year"));
        match empty_outcome(&self.options, &[month, year]) {
            Some(EmptyOutcome::Null) => return Ok(Value::Null),
            Some(EmptyOutcome::Unchanged) => return Ok(value),
            None => {}
        }

        let month = month.and_then(strict_integer).filter(|m| (1..=12).contains(m));
        let year = year.and_then(strict_integer).filter(|y| (0..=9999).contains(y));
        Ok(match (year, month) {
            (Some(year), Some(month)) => Value::Str(format!("{}-{:02}", year, month)),
            _ => value,
        })
    }
}
