//! Normalization rules.

use tts_core::TtsResult;

use crate::num2words::{digits_to_words, num_to_words, ordinal_to_words};

/// A text normalization rule.
pub trait Rule: Send + Sync + std::fmt::Debug {
    /// Get the rule name.
    fn name(&self) -> &str;

    /// Apply the rule to the input text.
    fn apply(&self, input: &str) -> TtsResult<String>;
}

/// Create the default rule pipeline, in application order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(LinkRule),
        Box::new(UnicodeCleanupRule),
        Box::new(NumberRule),
        Box::new(SymbolRule),
        Box::new(WhitespaceRule),
    ]
}

/// Strip markdown-style links `[text](url)` down to the bare text.
#[derive(Debug)]
pub struct LinkRule;

impl Rule for LinkRule {
    fn name(&self) -> &str {
        "link"
    }

    fn apply(&self, input: &str) -> TtsResult<String> {
        let mut result = String::with_capacity(input.len());
        let bytes = input.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'[' {
                // A link needs "](" after the closing bracket and a closing paren.
                if let Some(close) = input[i..].find(']').map(|p| i + p) {
                    if bytes.get(close + 1) == Some(&b'(') {
                        if let Some(paren_end) = input[close..].find(')').map(|p| close + p) {
                            result.push_str(&input[i + 1..close]);
                            i = paren_end + 1;
                            continue;
                        }
                    }
                }
            }
            let ch = input[i..].chars().next().unwrap();
            result.push(ch);
            i += ch.len_utf8();
        }
        Ok(result)
    }
}

/// Replace characters the rest of the pipeline has no use for.
///
/// Directional quotes are kept: the G2P punctuation table distinguishes
/// opening from closing quotation marks.
#[derive(Debug)]
pub struct UnicodeCleanupRule;

impl Rule for UnicodeCleanupRule {
    fn name(&self) -> &str {
        "unicode_cleanup"
    }

    fn apply(&self, input: &str) -> TtsResult<String> {
        let result = input
            .replace('\u{00A0}', " ")
            .replace('\u{2014}', " - ")
            .replace('\u{2013}', "-")
            .replace('\u{2026}', "...");
        Ok(result)
    }
}

/// Expand numeric literals to spelled-out words.
///
/// Handles signed integers with thousands separators, decimals, ordinal
/// suffixes, percent, and dollar amounts. Long digit runs (10+) are read out
/// digit by digit.
#[derive(Debug)]
pub struct NumberRule;

impl Rule for NumberRule {
    fn name(&self) -> &str {
        "number"
    }

    fn apply(&self, input: &str) -> TtsResult<String> {
        Ok(expand_numbers(input))
    }
}

fn expand_numbers(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let starts_number = c.is_ascii_digit()
            || (c == '$' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
            || (c == '-'
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())
                && !prev_is_alnum(&result));

        if !starts_number {
            result.push(c);
            i += 1;
            continue;
        }

        let currency = c == '$';
        let negative = c == '-';
        if currency || negative {
            i += 1;
        }

        // Integer part, tolerating thousands separators like 1,234,567.
        let mut int_digits = String::new();
        while i < chars.len() {
            if chars[i].is_ascii_digit() {
                int_digits.push(chars[i]);
                i += 1;
            } else if chars[i] == ','
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())
                && chars.get(i + 2).is_some_and(|n| n.is_ascii_digit())
                && chars.get(i + 3).is_some_and(|n| n.is_ascii_digit())
                && !chars.get(i + 4).is_some_and(|n| n.is_ascii_digit())
            {
                i += 1;
            } else {
                break;
            }
        }

        // Fractional part.
        let mut frac_digits = String::new();
        if chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()) {
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                frac_digits.push(chars[i]);
                i += 1;
            }
        }

        // Ordinal suffix: 1st, 2nd, 3rd, 4th.
        let suffix: String = chars[i..]
            .iter()
            .take(2)
            .collect::<String>()
            .to_ascii_lowercase();
        let ordinal = frac_digits.is_empty()
            && !currency
            && matches!(suffix.as_str(), "st" | "nd" | "rd" | "th");
        if ordinal {
            i += 2;
        }

        let percent = chars.get(i) == Some(&'%');
        if percent {
            i += 1;
        }

        result.push_str(&spell_number(
            &int_digits,
            &frac_digits,
            negative,
            currency,
            ordinal,
            percent,
        ));
    }

    result
}

fn prev_is_alnum(result: &str) -> bool {
    result.chars().next_back().is_some_and(|c| c.is_alphanumeric())
}

fn spell_number(
    int_digits: &str,
    frac_digits: &str,
    negative: bool,
    currency: bool,
    ordinal: bool,
    percent: bool,
) -> String {
    let mut out = String::new();

    // Past i64 range (or absurdly long), read digits individually.
    let value = int_digits.parse::<i64>().ok().filter(|_| int_digits.len() < 10);
    let Some(value) = value else {
        out.push_str(&digits_to_words(int_digits));
        if percent {
            out.push_str(" percent");
        }
        return out;
    };

    if negative {
        out.push_str("minus ");
    }

    if ordinal {
        out.push_str(&ordinal_to_words(value));
    } else if currency && frac_digits.len() == 2 {
        let cents: i64 = frac_digits.parse().unwrap_or(0);
        out.push_str(&num_to_words(value));
        out.push_str(if value == 1 { " dollar" } else { " dollars" });
        if cents > 0 {
            out.push_str(" and ");
            out.push_str(&num_to_words(cents));
            out.push_str(if cents == 1 { " cent" } else { " cents" });
        }
        return out;
    } else {
        out.push_str(&num_to_words(value));
        if !frac_digits.is_empty() {
            out.push_str(" point ");
            out.push_str(&digits_to_words(frac_digits));
        }
    }

    if currency {
        out.push_str(if value == 1 && frac_digits.is_empty() {
            " dollar"
        } else {
            " dollars"
        });
    }
    if percent {
        out.push_str(" percent");
    }

    out
}

/// Replace standalone symbols with their spoken form; drop the rest.
#[derive(Debug)]
pub struct SymbolRule;

impl Rule for SymbolRule {
    fn name(&self) -> &str {
        "symbol"
    }

    fn apply(&self, input: &str) -> TtsResult<String> {
        let mut result = String::with_capacity(input.len());

        for c in input.chars() {
            match c {
                _ if c.is_alphanumeric() => result.push(c),
                ' ' | '\t' | '\n' | '\r' => result.push(c),
                '.' | ',' | '!' | '?' | ':' | ';' | '-' | '\'' | '"' | '(' | ')' => result.push(c),
                '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' => result.push(c),
                '@' => result.push_str(" at "),
                '&' => result.push_str(" and "),
                '+' => result.push_str(" plus "),
                '=' => result.push_str(" equals "),
                '#' => result.push_str(" number "),
                '/' => result.push_str(" slash "),
                _ => {}
            }
        }

        Ok(result)
    }
}

/// Collapse whitespace runs into single spaces and trim.
#[derive(Debug)]
pub struct WhitespaceRule;

impl Rule for WhitespaceRule {
    fn name(&self) -> &str {
        "whitespace"
    }

    fn apply(&self, input: &str) -> TtsResult<String> {
        Ok(input.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}
