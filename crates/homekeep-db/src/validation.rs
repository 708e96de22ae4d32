// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use time::macros::format_description;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidMonth,
    DuplicateMonth,
    InvalidYear,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMonth => f.write_str("invalid month value"),
            Self::DuplicateMonth => f.write_str("month listed more than once"),
            Self::InvalidYear => f.write_str("invalid year value"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

pub fn format_cents(cents: i64) -> String {
    let (sign, cents) = normalize_sign(cents);
    let dollars = cents / 100;
    let remainder = cents % 100;
    format!("{sign}${}.{:02}", comma_format(dollars), remainder)
}

/// `$150.00-$300.00`, or a single amount when both ends agree.
pub fn format_cents_range(low: i64, high: i64) -> String {
    if low == high {
        return format_cents(low);
    }
    format!("{}-{}", format_cents(low), format_cents(high))
}

pub fn format_date(value: Option<Date>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// Month number from `7`, `07`, `jul` or `July`.
pub fn parse_month(input: &str) -> ValidationResult<u8> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidMonth);
    }
    if trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        let month = trimmed
            .parse::<u8>()
            .map_err(|_| ValidationError::InvalidMonth)?;
        if (1..=12).contains(&month) {
            return Ok(month);
        }
        return Err(ValidationError::InvalidMonth);
    }

    let lowered = trimmed.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| {
            let name = name.to_ascii_lowercase();
            name == lowered || (lowered.len() == 3 && name.starts_with(&lowered))
        })
        .map(|index| index as u8 + 1)
        .ok_or(ValidationError::InvalidMonth)
}

/// Comma-separated months, in the order given. Empty input is an empty list.
pub fn parse_month_list(input: &str) -> ValidationResult<Vec<u8>> {
    let mut months = Vec::new();
    for part in input.split(',') {
        if part.trim().is_empty() {
            continue;
        }
        let month = parse_month(part)?;
        if months.contains(&month) {
            return Err(ValidationError::DuplicateMonth);
        }
        months.push(month);
    }
    Ok(months)
}

pub fn format_month_list(months: &[u8]) -> String {
    months
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn month_name(month: u8) -> &'static str {
    usize::from(month)
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index))
        .copied()
        .unwrap_or("Unknown")
}

pub fn parse_year(input: &str) -> ValidationResult<i32> {
    let trimmed = input.trim();
    if trimmed.len() != 4 || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::InvalidYear);
    }
    let year = trimmed
        .parse::<i32>()
        .map_err(|_| ValidationError::InvalidYear)?;
    if year < 1900 {
        return Err(ValidationError::InvalidYear);
    }
    Ok(year)
}

fn comma_format(value: i64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let mut chars = digits.chars().collect::<Vec<_>>();
    let mut count = 0usize;
    while let Some(ch) = chars.pop() {
        if count == 3 {
            out.push(',');
            count = 0;
        }
        out.push(ch);
        count += 1;
    }
    out.chars().rev().collect()
}

fn normalize_sign(cents: i64) -> (&'static str, i64) {
    if cents >= 0 {
        return ("", cents);
    }
    if cents == i64::MIN {
        ("-", i64::MAX)
    } else {
        ("-", -cents)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ValidationError, format_cents, format_cents_range, format_date, format_month_list,
        month_name, parse_month, parse_month_list, parse_year,
    };
    use time::{Date, Month};

    #[test]
    fn format_cents_test() {
        assert_eq!(format_cents(123_456), "$1,234.56");
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(-500), "-$5.00");
        assert_eq!(format_cents(123_456_789), "$1,234,567.89");
    }

    #[test]
    fn format_cents_range_test() {
        assert_eq!(format_cents_range(15_000, 30_000), "$150.00-$300.00");
        assert_eq!(format_cents_range(0, 0), "$0.00");
    }

    #[test]
    fn format_date_test() {
        assert_eq!(format_date(None), "");
        let value = Date::from_calendar_date(2025, Month::June, 11).expect("valid date");
        assert_eq!(format_date(Some(value)), "2025-06-11");
    }

    #[test]
    fn parse_month_accepts_numbers_and_names() {
        let cases = [
            ("7", 7),
            ("07", 7),
            (" 12 ", 12),
            ("jul", 7),
            ("July", 7),
            ("SEP", 9),
            ("september", 9),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_month(input), Ok(expected), "input {input}");
        }
        for input in ["", "0", "13", "ju", "juli", "-1"] {
            assert_eq!(
                parse_month(input),
                Err(ValidationError::InvalidMonth),
                "input {input}"
            );
        }
    }

    #[test]
    fn parse_month_list_test() {
        assert_eq!(parse_month_list(""), Ok(Vec::new()));
        assert_eq!(parse_month_list("3,9"), Ok(vec![3, 9]));
        assert_eq!(parse_month_list("mar, sep,"), Ok(vec![3, 9]));
        assert_eq!(parse_month_list("3,mar"), Err(ValidationError::DuplicateMonth));
        assert_eq!(parse_month_list("3,14"), Err(ValidationError::InvalidMonth));
        assert_eq!(format_month_list(&[3, 9]), "3,9");
        assert_eq!(format_month_list(&[]), "");
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(0), "Unknown");
        assert_eq!(month_name(13), "Unknown");
    }

    #[test]
    fn parse_year_test() {
        assert_eq!(parse_year("2026"), Ok(2026));
        for input in ["", "26", "20266", "1899", "abcd"] {
            assert_eq!(parse_year(input), Err(ValidationError::InvalidYear), "input {input}");
        }
    }
}
