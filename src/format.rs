use std::fmt::Write as _;
use std::str::FromStr;

use chrono::DateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::config::DisplayConfig;
use crate::error::{Error, Result};
use crate::models::Account;

fn group_int_digits(int_part: &str) -> String {
    // Insert commas every 3 digits, preserving any leading zeros.
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len.saturating_sub(i + 1);
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

fn pad_fraction_to_dp(s: &str, dp: u32) -> String {
    if dp == 0 {
        return s
            .split_once('.')
            .map(|(i, _)| i.to_string())
            .unwrap_or_else(|| s.to_string());
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };

    let mut out = String::with_capacity(int_part.len() + 1 + dp as usize);
    out.push_str(int_part);
    out.push('.');
    out.extend(frac_part.chars().take(dp as usize));
    for _ in frac_part.len().min(dp as usize)..dp as usize {
        out.push('0');
    }
    out
}

fn group_number_string(s: &str) -> String {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let grouped = group_int_digits(int_part);
    match frac_part {
        Some(f) if !f.is_empty() => format!("{grouped}.{f}"),
        _ => grouped,
    }
}

/// Format a monetary amount for human display.
///
/// - `currency_decimals`: round half away from zero, then pad to exactly
///   that many places
/// - `currency_grouping`: thousands separators (`,`)
pub fn format_decimal(value: Decimal, display: &DisplayConfig) -> String {
    let rounded = match display.currency_decimals {
        Some(dp) => value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        None => value,
    };

    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let mut s = rounded.abs().normalize().to_string();
    if let Some(dp) = display.currency_decimals {
        s = pad_fraction_to_dp(&s, dp);
    }
    if display.currency_grouping {
        s = group_number_string(&s);
    }

    if negative {
        format!("-{s}")
    } else {
        s
    }
}

/// Format an amount kept as a provider string.
///
/// Values that do not parse as decimals are shown verbatim.
pub fn format_amount(raw: &str, display: &DisplayConfig) -> String {
    match Decimal::from_str(raw.trim()) {
        Ok(value) => format_decimal(value, display),
        Err(_) => raw.to_string(),
    }
}

fn format_epoch_date(epoch: i64) -> String {
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

/// Plain-text block: a header line for the account and one line per
/// transaction.
pub fn account_summary(account: &Account, display: &DisplayConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Account {} ({}): Balance: {} {}",
        account.name(),
        account.id(),
        format_amount(account.balance(), display),
        account.currency()
    );
    for txn in account.transactions() {
        let _ = writeln!(
            out,
            "  - {}: {} on {}{}",
            txn.description,
            format_amount(&txn.amount, display),
            format_epoch_date(txn.posted),
            if txn.pending { " (pending)" } else { "" }
        );
    }
    out
}

/// Two-space indented JSON.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::decode("pretty JSON", e))
}
