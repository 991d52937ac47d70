//! Cell formatting and text wrapping.

use chrono::{DateTime, Utc};

use almacen_core::{Money, NOT_AVAILABLE};

/// `$ 12.345`, `,dd` only when there are cents.
pub fn currency(amount: Money) -> String {
    amount.to_string()
}

/// `dd/mm/yyyy`, or `N/A`.
pub fn date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// `dd/mm/yyyy HH:MM`.
pub fn timestamp(value: DateTime<Utc>) -> String {
    value.format("%d/%m/%Y %H:%M").to_string()
}

/// Trimmed text, or `N/A` when blank.
pub fn text(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

pub fn opt_text(value: Option<&str>) -> String {
    text(value.unwrap_or_default())
}

/// Wraps text to at most `max_chars` characters per line.
///
/// Breaks on whitespace; words longer than a line are split hard. Explicit
/// newlines are kept. Always returns at least one line.
///
/// ```rust
/// use almacen_report::format::wrap;
///
/// assert_eq!(wrap("leche entera deslactosada", 12), vec!["leche entera", "deslactosada"]);
/// assert_eq!(wrap("", 5), vec![""]);
/// ```
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            // Hard-split words that cannot fit on any line.
            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > max_chars && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }

        if current_len > 0 || lines.is_empty() || paragraph.trim().is_empty() {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_currency_and_dates() {
        assert_eq!(currency(Money::from_cents(1_234_500)), "$ 12.345");
        assert_eq!(currency(Money::from_cents(1_234_550)), "$ 12.345,50");
        let d = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        assert_eq!(date(Some(d)), "05/03/2024");
        assert_eq!(date(None), "N/A");
        assert_eq!(timestamp(d), "05/03/2024 14:07");
    }

    #[test]
    fn test_text_defaults() {
        assert_eq!(text("  "), "N/A");
        assert_eq!(opt_text(None), "N/A");
        assert_eq!(opt_text(Some(" Luis ")), "Luis");
    }

    #[test]
    fn test_wrap_long_word() {
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("ab abcdefgh", 4), vec!["ab", "abcd", "efgh"]);
    }

    #[test]
    fn test_wrap_keeps_newlines() {
        assert_eq!(wrap("uno\ndos", 20), vec!["uno", "dos"]);
        assert_eq!(wrap("a b c", 20), vec!["a b c"]);
    }

    #[test]
    fn test_wrap_accented_counts_chars() {
        assert_eq!(wrap("árbol ñame", 5), vec!["árbol", "ñame"]);
    }
}
