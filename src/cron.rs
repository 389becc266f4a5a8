use cron::{Schedule, TimeUnitSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::Error;

const DAYS_IN_MONTH: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Position of a field in a six field cron expression
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum CronField {
    Second,
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
}

impl CronField {
    pub const ALL: [CronField; 6] = [
        CronField::Second,
        CronField::Minute,
        CronField::Hour,
        CronField::DayOfMonth,
        CronField::Month,
        CronField::DayOfWeek,
    ];

    fn index(&self) -> usize {
        match self {
            CronField::Second => 0,
            CronField::Minute => 1,
            CronField::Hour => 2,
            CronField::DayOfMonth => 3,
            CronField::Month => 4,
            CronField::DayOfWeek => 5,
        }
    }

    /// Inclusive bounds of the values accepted in the field. Day of week accepts 7 as an alias of Sunday.
    pub fn bounds(&self) -> (u32, u32) {
        match self {
            CronField::Second | CronField::Minute => (0, 59),
            CronField::Hour => (0, 23),
            CronField::DayOfMonth => (1, 31),
            CronField::Month => (1, 12),
            CronField::DayOfWeek => (0, 7),
        }
    }

    fn wildcard_bounds(&self) -> (u32, u32) {
        match self {
            CronField::DayOfWeek => (0, 6),
            _ => self.bounds(),
        }
    }
}

impl fmt::Display for CronField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CronField::Second => "second",
            CronField::Minute => "minute",
            CronField::Hour => "hour",
            CronField::DayOfMonth => "dayOfMonth",
            CronField::Month => "month",
            CronField::DayOfWeek => "dayOfWeek",
        };
        write!(f, "{}", name)
    }
}

/// Expanded values of every field of a cron expression, sorted and without duplicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronFields {
    values: [Vec<u32>; 6],
}

fn parse_error(expression: &str, reason: String) -> Error {
    Error::CronParseError {
        expression: expression.to_owned(),
        reason,
    }
}

/// Rewrites one list entry of the day of week field from the 0-7 numbering (Sunday is 0 or 7)
/// to the 1-7 numbering of the `cron` crate (Sunday is 1). Names and wildcards are kept as written.
fn shift_weekday_atom(atom: &str) -> Result<String, String> {
    let field = CronField::DayOfWeek;
    let (base, step) = match atom.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (atom, None),
    };
    let with_step = |base: String| match step {
        Some(step) => format!("{base}/{step}"),
        None => base,
    };
    let weekday = |token: &str| -> Result<Option<u32>, String> {
        match token.parse::<u32>() {
            Ok(value) if value <= 7 => Ok(Some(value)),
            Ok(value) => Err(format!("value {value} out of range 0-7 in {field} field")),
            Err(_) => Ok(None),
        }
    };

    let Some((start, end)) = base.split_once('-') else {
        return Ok(match weekday(base)? {
            Some(value) => with_step((value % 7 + 1).to_string()),
            None => atom.to_owned(),
        });
    };
    let (start, end) = match (weekday(start)?, weekday(end)?) {
        (Some(start), Some(end)) => (start, end),
        _ => return Ok(atom.to_owned()),
    };
    if start > end {
        return Err(format!("invalid range {base} in {field} field"));
    }
    if end < 7 {
        return Ok(with_step(format!("{}-{}", start + 1, end + 1)));
    }
    // Ranges closed by 7 end on Sunday, which comes first in the crate's numbering
    match start {
        0 => Ok(with_step("1-7".to_owned())),
        7 => Ok("1".to_owned()),
        _ => {
            let step_size: u32 = match step {
                Some(step) => step.parse().map_err(|_| format!("invalid step '{step}' in {field} field"))?,
                None => 1,
            };
            let until_saturday = with_step(format!("{}-7", start + 1));
            if step_size != 0 && (7 - start) % step_size == 0 {
                Ok(format!("{until_saturday},1"))
            } else {
                Ok(until_saturday)
            }
        }
    }
}

fn reject_zero_steps(field: CronField, text: &str) -> Result<(), String> {
    let zero_step = text
        .split(',')
        .filter_map(|atom| atom.split_once('/'))
        .any(|(_, step)| step.parse::<u32>() == Ok(0));
    if zero_step {
        return Err(format!("step cannot be zero in {field} field"));
    }
    Ok(())
}

fn ordinals<T: TimeUnitSpec>(spec: &T) -> Vec<u32> {
    spec.iter().collect()
}

/// Run of values with a constant step, `count` is 1 for a single value
#[derive(Debug, Clone, Copy)]
struct ValueRange {
    start: u32,
    end: u32,
    step: u32,
    count: u32,
}

impl ValueRange {
    fn single(value: u32) -> Self {
        ValueRange { start: value, end: value, step: 0, count: 1 }
    }

    fn pair(start: u32, end: u32) -> Self {
        ValueRange { start, end, step: end - start, count: 2 }
    }
}

fn finalize_range(ranges: &mut Vec<ValueRange>, range: ValueRange) {
    if range.count == 2 {
        ranges.push(ValueRange::single(range.start));
        ranges.push(ValueRange::single(range.end));
    } else {
        ranges.push(range);
    }
}

/// Groups sorted values into runs. Two-element runs are kept as single values.
fn compact_field(values: &[u32]) -> Vec<ValueRange> {
    let mut ranges: Vec<ValueRange> = Vec::new();
    let mut current: Option<ValueRange> = None;
    for &value in values {
        current = Some(match current {
            None => ValueRange::single(value),
            Some(range) if range.count == 1 => ValueRange::pair(range.start, value),
            Some(range) if range.step == value - range.end => ValueRange {
                end: value,
                count: range.count + 1,
                ..range
            },
            Some(range) if range.count == 2 => {
                ranges.push(ValueRange::single(range.start));
                ValueRange::pair(range.end, value)
            }
            Some(range) => {
                finalize_range(&mut ranges, range);
                ValueRange::single(value)
            }
        });
    }
    if let Some(range) = current {
        finalize_range(&mut ranges, range);
    }
    ranges
}

fn stringify_field(values: &[u32], min: u32, max: u32) -> String {
    let ranges = compact_field(values);
    if let [range] = ranges.as_slice() {
        if range.count > 1 && range.start == min {
            if range.step == 1 && range.end >= max {
                return "*".to_owned();
            }
            if range.step != 1 && range.end + range.step > max {
                return format!("*/{}", range.step);
            }
        }
    }

    let mut parts: Vec<String> = Vec::new();
    for range in ranges {
        if range.count == 1 {
            parts.push(range.start.to_string());
        } else if range.step == 1 {
            parts.push(format!("{}-{}", range.start, range.end));
        } else if range.end + range.step > max {
            parts.push(format!("{}/{}", range.start, range.step));
        } else {
            parts.push(format!("{}-{}/{}", range.start, range.end, range.step));
        }
    }
    parts.join(",")
}

impl CronFields {
    /// Parses a five or six field expression. Five field expressions run at second 0.
    pub fn parse(expression: &str) -> Result<Self, Error> {
        let tokens: Vec<&str> = expression.split_whitespace().collect();
        let (second, fields) = match tokens.len() {
            5 => ("0", &tokens[..]),
            6 => (tokens[0], &tokens[1..]),
            count => return Err(parse_error(expression, format!("expected 5 or 6 fields, found {count}"))),
        };
        for (field, text) in CronField::ALL.iter().zip(std::iter::once(second).chain(fields.iter().copied())) {
            reject_zero_steps(*field, text).map_err(|reason| parse_error(expression, reason))?;
        }
        let weekdays = fields[4]
            .split(',')
            .map(shift_weekday_atom)
            .collect::<Result<Vec<String>, String>>()
            .map_err(|reason| parse_error(expression, reason))?
            .join(",");
        let normalized = format!("{second} {} {} {} {} {weekdays}", fields[0], fields[1], fields[2], fields[3]);
        let schedule = Schedule::from_str(&normalized).map_err(|err| parse_error(expression, err.to_string()))?;

        Ok(CronFields {
            values: [
                ordinals(schedule.seconds()),
                ordinals(schedule.minutes()),
                ordinals(schedule.hours()),
                ordinals(schedule.days_of_month()),
                ordinals(schedule.months()),
                schedule.days_of_week().iter().map(|day| day - 1).collect(),
            ],
        })
    }

    pub fn get(&self, field: CronField) -> &[u32] {
        &self.values[field.index()]
    }

    /// Replaces the field with a single value
    pub fn set(&mut self, field: CronField, value: u32) -> Result<(), Error> {
        let (min, max) = field.bounds();
        if value < min || value > max {
            return Err(Error::InvalidCycle(format!("value {value} out of range {min}-{max} for {field}")));
        }
        let value = if field == CronField::DayOfWeek && value == 7 { 0 } else { value };
        self.values[field.index()] = vec![value];
        Ok(())
    }

    /// Serializes the fields back into the most compact expression
    pub fn stringify(&self, include_seconds: bool) -> String {
        let skip = if include_seconds { 0 } else { 1 };
        CronField::ALL
            .iter()
            .skip(skip)
            .map(|field| {
                let (mut min, mut max) = field.wildcard_bounds();
                if *field == CronField::DayOfMonth {
                    if let [month] = self.get(CronField::Month) {
                        min = 1;
                        max = DAYS_IN_MONTH[(*month as usize).saturating_sub(1)];
                    }
                }
                stringify_field(self.get(*field), min, max)
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

impl fmt::Display for CronFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stringify(false))
    }
}
