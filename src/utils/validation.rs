//! Field validators.
//!
//! Pure predicates over request fields. None of them trim their input;
//! callers pass values already run through [`non_blank`] where blank
//! strings should count as missing.

use time::{macros::format_description, Date};

/// The trimmed value, or `None` when absent or only whitespace.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Letters, digits, whitespace and `- . , '`.
pub fn is_valid_string(input: &str) -> bool {
    !input.is_empty()
        && input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || "-.,'".contains(c))
}

/// Word characters, whitespace and `-`. Used for street and city.
pub fn is_valid_place(input: &str) -> bool {
    !input.is_empty()
        && input
            .chars()
            .all(|c| is_word_char(c) || c.is_whitespace() || c == '-')
}

/// `local@domain.tld`: local part of word characters, `.` and `-`; one or
/// more domain labels of word characters and `-`; a TLD of at least two
/// letters.
pub fn is_valid_email(input: &str) -> bool {
    let Some((local, domain)) = input.split_once('@') else {
        return false;
    };

    if local.is_empty() || !local.chars().all(|c| is_word_char(c) || c == '.' || c == '-') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let Some((tld, hosts)) = labels.split_last() else {
        return false;
    };

    !hosts.is_empty()
        && hosts
            .iter()
            .all(|label| !label.is_empty() && label.chars().all(|c| is_word_char(c) || c == '-'))
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Exactly ten digits.
pub fn is_valid_mobile(input: &str) -> bool {
    input.len() == 10 && input.bytes().all(|b| b.is_ascii_digit())
}

/// Six to fifteen letters or digits.
pub fn is_valid_password(input: &str) -> bool {
    (6..=15).contains(&input.len()) && input.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Six digits, the first one non-zero.
pub fn is_valid_pincode(input: &str) -> bool {
    input.len() == 6
        && input.bytes().all(|b| b.is_ascii_digit())
        && !input.starts_with('0')
}

/// Exactly thirteen digits.
pub fn is_valid_isbn(input: &str) -> bool {
    input.len() == 13 && input.bytes().all(|b| b.is_ascii_digit())
}

/// Document ids are UUIDs.
pub fn is_valid_id(input: &str) -> bool {
    uuid::Uuid::parse_str(input).is_ok()
}

/// Ratings run from 1 to 5 inclusive.
pub fn is_valid_rating(rating: i64) -> bool {
    (1..=5).contains(&rating)
}

/// The trimmed date if it is already a canonical, existing `YYYY-MM-DD`
/// calendar date.
///
/// `2023-02-30` has the right shape but no such day exists, so it is
/// rejected; so is `2023-2-28`, which parses leniently elsewhere but does
/// not survive a strict round trip.
pub fn canonical_date(input: &str) -> Option<&str> {
    let trimmed = input.trim();

    let shaped = trimmed.len() == 10
        && trimmed.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }

    let format = format_description!("[year]-[month]-[day]");
    let date = Date::parse(trimmed, &format).ok()?;
    let formatted = date.format(&format).ok()?;

    (formatted == trimmed).then_some(trimmed)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
