//! Locale-aware currency display formatting.
//!
//! Presentation-only: core arithmetic stays in `Decimal`; this module takes
//! `f64` so degenerate display values (NaN, infinities) route through the
//! fallback instead of panicking.

use freightquote_common::{Currency, Money};
use rust_decimal::prelude::ToPrimitive;

/// Display locale for formatted amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// `$1,234.56`
    #[default]
    EnUs,
    /// `1.234,56 €`
    DeDe,
    /// `1 234,56 €`
    FrFr,
}

impl Locale {
    fn group_separator(&self) -> char {
        match self {
            Locale::EnUs => ',',
            Locale::DeDe => '.',
            Locale::FrFr => ' ',
        }
    }

    fn decimal_separator(&self) -> char {
        match self {
            Locale::EnUs => '.',
            Locale::DeDe | Locale::FrFr => ',',
        }
    }

    fn symbol_is_prefix(&self) -> bool {
        matches!(self, Locale::EnUs)
    }
}

/// Format an amount for display in the given currency and locale.
///
/// Falls back to `"<CODE> <amount to 2 decimals>"` for non-finite amounts
/// or currencies without a known symbol. This function never panics.
pub fn format(amount: f64, currency: &Currency, locale: Locale) -> String {
    if !amount.is_finite() {
        return fallback(amount, currency);
    }

    let Some(symbol) = symbol_for(currency) else {
        return fallback(amount, currency);
    };

    let places = currency.decimal_places() as usize;
    let negative = amount < 0.0;
    let fixed = format!("{:.*}", places, amount.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let grouped = group_digits(int_part, locale.group_separator());
    let mut number = grouped;
    if let Some(frac) = frac_part {
        number.push(locale.decimal_separator());
        number.push_str(frac);
    }

    let sign = if negative { "-" } else { "" };
    if locale.symbol_is_prefix() {
        format!("{sign}{symbol}{number}")
    } else {
        format!("{sign}{number} {symbol}")
    }
}

/// Format a `Money` amount for display.
pub fn format_money(money: &Money, locale: Locale) -> String {
    let amount = money.value.to_f64().unwrap_or(f64::NAN);
    format(amount, &money.currency, locale)
}

fn fallback(amount: f64, currency: &Currency) -> String {
    format!("{} {:.2}", currency.code(), amount)
}

fn symbol_for(currency: &Currency) -> Option<&'static str> {
    match currency.code() {
        "USD" | "CAD" | "AUD" | "SGD" | "HKD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" | "CNY" => Some("¥"),
        "INR" => Some("₹"),
        _ => None,
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_en_us_formatting() {
        assert_eq!(format(1234.56, &Currency::usd(), Locale::EnUs), "$1,234.56");
        assert_eq!(format(0.5, &Currency::usd(), Locale::EnUs), "$0.50");
        assert_eq!(
            format(1_000_000.0, &Currency::usd(), Locale::EnUs),
            "$1,000,000.00"
        );
    }

    #[test]
    fn test_de_and_fr_formatting() {
        assert_eq!(
            format(1234.56, &Currency::eur(), Locale::DeDe),
            "1.234,56 €"
        );
        assert_eq!(
            format(1234.56, &Currency::eur(), Locale::FrFr),
            "1 234,56 €"
        );
    }

    #[test]
    fn test_zero_decimal_currency() {
        assert_eq!(format(1234.0, &Currency::jpy(), Locale::EnUs), "¥1,234");
    }

    #[test]
    fn test_negative_amount() {
        assert_eq!(format(-42.5, &Currency::usd(), Locale::EnUs), "-$42.50");
    }

    #[test]
    fn test_unknown_currency_falls_back() {
        let xof = Currency::new("XOF");
        assert_eq!(format(12.3, &xof, Locale::EnUs), "XOF 12.30");
    }

    #[test]
    fn test_nan_never_panics() {
        assert_eq!(
            format(f64::NAN, &Currency::usd(), Locale::EnUs),
            "USD NaN"
        );
        assert_eq!(
            format(f64::INFINITY, &Currency::usd(), Locale::EnUs),
            "USD inf"
        );
    }

    #[test]
    fn test_format_money() {
        let money = Money::new(dec!(4797), Currency::usd());
        assert_eq!(format_money(&money, Locale::EnUs), "$4,797.00");
    }
}
