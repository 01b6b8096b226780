#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    pub number: u32,
    pub name: &'static str,
    pub abbrev: &'static str,
}

pub static MONTHS: [Month; 12] = [
    Month { number: 1, name: "January", abbrev: "Jan" },
    Month { number: 2, name: "February", abbrev: "Feb" },
    Month { number: 3, name: "March", abbrev: "Mar" },
    Month { number: 4, name: "April", abbrev: "Apr" },
    Month { number: 5, name: "May", abbrev: "May" },
    Month { number: 6, name: "June", abbrev: "Jun" },
    Month { number: 7, name: "July", abbrev: "Jul" },
    Month { number: 8, name: "August", abbrev: "Aug" },
    Month { number: 9, name: "September", abbrev: "Sep" },
    Month { number: 10, name: "October", abbrev: "Oct" },
    Month { number: 11, name: "November", abbrev: "Nov" },
    Month { number: 12, name: "December", abbrev: "Dec" },
];

/// Resolve a month token from a url segment.
///
/// Accepts a number (`3`, `03`), a three letter abbreviation (`mar`) or a full
/// name (`MARCH`). Anything else resolves to `None`.
pub fn resolve_month(token: &str) -> Option<Month> {
    resolve_in(&MONTHS, token)
}

/// Same as [`resolve_month`], against a caller supplied month table.
pub fn resolve_in(table: &[Month], token: &str) -> Option<Month> {
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        let number = token.parse::<u32>().ok()?;
        return table.iter().find(|m| m.number == number).copied();
    }

    let token = capitalize(token);
    if token.chars().count() == 3 {
        table.iter().find(|m| m.abbrev == token).copied()
    } else {
        table.iter().find(|m| m.name == token).copied()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
