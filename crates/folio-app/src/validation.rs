// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use time::macros::format_description;

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidMoney,
    NegativeMoney,
    InvalidDate,
    InvalidInt,
    InvalidIsbn,
    InvalidId,
    ReadOnly,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMoney => f.write_str("invalid price value"),
            Self::NegativeMoney => f.write_str("negative price value"),
            Self::InvalidDate => write!(f, "invalid date value, expected {DATE_LAYOUT}"),
            Self::InvalidInt => f.write_str("invalid whole number"),
            Self::InvalidIsbn => f.write_str("ISBN-13 must be exactly 13 digits"),
            Self::InvalidId => f.write_str("ids must be positive whole numbers"),
            Self::ReadOnly => f.write_str("field is display-only"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Parses a SEK amount into öre. Accepts `129`, `129.5`, `1,299.00` and an
/// optional `kr` suffix.
pub fn parse_required_ore(input: &str) -> ValidationResult<i64> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_suffix("kr")
        .or_else(|| trimmed.strip_suffix("SEK"))
        .unwrap_or(trimmed)
        .trim_end();
    parse_ore(trimmed)
}

pub fn format_ore(ore: i64) -> String {
    let (sign, ore) = normalize_sign(ore);
    let kronor = ore / 100;
    let remainder = ore % 100;
    format!("{sign}{}.{:02} kr", comma_format(kronor), remainder)
}

pub fn parse_required_date(input: &str) -> ValidationResult<Date> {
    parse_date(input.trim())
}

pub fn parse_optional_date(input: &str) -> ValidationResult<Option<Date>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_date(trimmed).map(Some)
}

pub fn format_date(value: Option<Date>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

pub fn parse_required_int(input: &str) -> ValidationResult<i32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidInt);
    }
    let value = trimmed
        .parse::<i32>()
        .map_err(|_| ValidationError::InvalidInt)?;
    if value < 0 {
        return Err(ValidationError::InvalidInt);
    }
    Ok(value)
}

pub fn parse_isbn13(input: &str) -> ValidationResult<String> {
    let clean = input.trim().replace('-', "");
    if clean.len() != 13 || !clean.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::InvalidIsbn);
    }
    Ok(clean)
}

/// Blank input clears the reference.
pub fn parse_optional_id(input: &str) -> ValidationResult<Option<i64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_id(trimmed).map(Some)
}

/// Parses `3, 1 4` into sorted, distinct ids.
pub fn parse_id_list(input: &str) -> ValidationResult<Vec<i64>> {
    let mut ids = input
        .split([',', ' '])
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_id(part.trim()))
        .collect::<ValidationResult<Vec<_>>>()?;
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

pub fn format_id_list(ids: impl IntoIterator<Item = i64>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_id(input: &str) -> ValidationResult<i64> {
    match input.parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ValidationError::InvalidId),
    }
}

pub fn looks_like_email(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.len() > 5 && trimmed.contains('@')
}

fn parse_ore(input: &str) -> ValidationResult<i64> {
    let clean = input.replace(',', "");
    if clean.starts_with('-') {
        return Err(ValidationError::NegativeMoney);
    }
    if clean.is_empty() {
        return Err(ValidationError::InvalidMoney);
    }

    let parts = clean.split('.').collect::<Vec<_>>();
    if parts.len() > 2 {
        return Err(ValidationError::InvalidMoney);
    }

    let whole = parse_digits(parts[0], true)?;
    if whole > i64::MAX / 100 {
        return Err(ValidationError::InvalidMoney);
    }

    let mut frac = 0i64;
    if parts.len() == 2 {
        if parts[1].len() > 2 {
            return Err(ValidationError::InvalidMoney);
        }
        frac = parse_digits(parts[1], false)?;
        if parts[1].len() == 1 {
            frac = frac.checked_mul(10).ok_or(ValidationError::InvalidMoney)?;
        }
    }

    whole
        .checked_mul(100)
        .and_then(|value| value.checked_add(frac))
        .ok_or(ValidationError::InvalidMoney)
}

fn parse_digits(input: &str, allow_empty: bool) -> ValidationResult<i64> {
    if input.is_empty() {
        if allow_empty {
            return Ok(0);
        }
        return Err(ValidationError::InvalidMoney);
    }
    if !input.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::InvalidMoney);
    }
    input
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidMoney)
}

fn parse_date(input: &str) -> ValidationResult<Date> {
    Date::parse(input, &format_description!("[year]-[month]-[day]"))
        .map_err(|_| ValidationError::InvalidDate)
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

fn normalize_sign(ore: i64) -> (&'static str, i64) {
    if ore >= 0 {
        return ("", ore);
    }
    if ore == i64::MIN {
        ("-", i64::MAX)
    } else {
        ("-", -ore)
    }
}
