use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

const TIME_MIN_LEN: usize = 4;
const TIME_MAX_LEN: usize = 8;
const TASK_MAX_LEN: usize = 200;

lazy_static! {
    static ref TIME_24H: Regex = Regex::new(r"^([01]?\d|2[0-3]):([0-5]\d)$").unwrap();
    static ref TIME_12H: Regex =
        Regex::new(r"^(0?[1-9]|1[0-2]):([0-5]\d)\s*([aApP][mM])$").unwrap();
}

/// Raw values from the day page's add form.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EntryForm {
    pub start: String,
    pub stop: String,
    pub task: String,
}

/// An entry that passed validation, times normalized to 24-hour `HH:MM`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEntry {
    pub start: String,
    pub stop: String,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

impl EntryForm {
    pub fn validate(&self) -> Result<ValidEntry, Vec<FieldError>> {
        let mut errors = Vec::new();

        let start = check_time("start", &self.start, &mut errors);
        let stop = check_time("stop", &self.stop, &mut errors);
        check_task(&self.task, &mut errors);

        match (start, stop) {
            (Some(start), Some(stop)) if errors.is_empty() => Ok(ValidEntry {
                start,
                stop,
                task: self.task.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// Messages for one field, in the order they were raised.
pub fn messages_for<'a>(errors: &'a [FieldError], field: &str) -> Vec<&'a str> {
    errors
        .iter()
        .filter(|e| e.field == field)
        .map(|e| e.message.as_str())
        .collect()
}

fn check_time(field: &'static str, value: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "This field is required."));
        return None;
    }

    let len = value.chars().count();
    if !(TIME_MIN_LEN..=TIME_MAX_LEN).contains(&len) {
        errors.push(FieldError::new(
            field,
            format!(
                "Field must be between {} and {} characters long.",
                TIME_MIN_LEN, TIME_MAX_LEN
            ),
        ));
        return None;
    }

    let parsed = normalize_time(value);
    if parsed.is_none() {
        errors.push(FieldError::new(
            field,
            "Use 24-hour HH:MM or 12-hour H:MM followed by am/pm.",
        ));
    }
    parsed
}

fn check_task(value: &str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::new("task", "This field is required."));
    } else if value.chars().count() > TASK_MAX_LEN {
        errors.push(FieldError::new(
            "task",
            format!("Field must be between 1 and {} characters long.", TASK_MAX_LEN),
        ));
    }
}

/// Parse a time of day and format it as zero padded 24-hour `HH:MM`.
///
/// Without a suffix the hour is read as 0-23. With an am/pm suffix the hour
/// must be 1-12; `12am` is midnight and `12pm` is noon.
pub fn normalize_time(value: &str) -> Option<String> {
    if let Some(caps) = TIME_24H.captures(value) {
        let hour: u32 = caps[1].parse().ok()?;
        return Some(format!("{:02}:{}", hour, &caps[2]));
    }

    let caps = TIME_12H.captures(value)?;
    let hour: u32 = caps[1].parse().ok()?;
    let pm = caps[3].eq_ignore_ascii_case("pm");
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    Some(format!("{:02}:{}", hour, &caps[2]))
}
