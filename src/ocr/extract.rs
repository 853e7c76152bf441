//! OCR text cleanup.
//!
//! Rebuilds line structure from the word overlay, repairs ALL-CAPS output and
//! shapes the text for the destination field type.

use anyhow::Result;
use regex::Regex;

use super::engine::OcrText;
use crate::form::FieldType;

/// Share of uppercase letters above which text is treated as ALL-CAPS.
const UPPERCASE_RATIO: f64 = 0.8;

/// Words kept lowercase when title-casing, unless they open the text.
const MINOR_WORDS: [&str; 15] = [
    "a", "an", "the", "and", "but", "or", "for", "nor", "on", "at", "to", "from", "by", "of", "in",
];

const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}";

const PHONE_PATTERN: &str = r"(?:\+?1[\s.\-]?)?\(?\d{3}\)?[\s.\-]?\d{3}[\s.\-]?\d{4}";

const MONTHS: &str = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?";

/// Joins lines with `\n`; every line except the last keeps one trailing space.
fn join_with_trailing_spaces(lines: &[String]) -> String {
    let mut out = String::new();
    let last = lines.len().saturating_sub(1);
    for (i, line) in lines.iter().enumerate() {
        out.push_str(line);
        if i < last {
            out.push_str(" \n");
        }
    }
    out
}

/// Rebuilds recognized text.
///
/// With a word overlay, each line is its words joined by single spaces.
/// Otherwise the flat text is split on line breaks. Either way, lines are
/// joined with `\n` and all but the last end with a space.
pub fn reconstruct_text(result: &OcrText) -> String {
    let lines: Vec<String> = if result.has_overlay() {
        result
            .lines
            .iter()
            .map(|line| {
                if line.words.is_empty() {
                    line.text.trim().to_string()
                } else {
                    line.words
                        .iter()
                        .map(|w| w.text.trim())
                        .filter(|w| !w.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ")
                }
            })
            .filter(|line| !line.is_empty())
            .collect()
    } else {
        let flat = result.text.replace("\r\n", "\n").replace('\r', "\n");
        flat.trim_end_matches('\n')
            .split('\n')
            .map(|line| line.trim_end().to_string())
            .collect()
    };

    join_with_trailing_spaces(&lines)
}

/// Returns true if more than 80% of the alphabetic characters are uppercase.
pub fn is_mostly_uppercase(text: &str) -> bool {
    let mut letters = 0usize;
    let mut upper = 0usize;
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        letters += 1;
        if c.is_uppercase() {
            upper += 1;
        }
    }
    letters > 0 && upper as f64 / letters as f64 > UPPERCASE_RATIO
}

/// Upper-cases the first character if it is a letter and lower-cases the
/// rest, so ordinals like `4TH` become `4th`.
fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        _ => word.to_lowercase(),
    }
}

fn title_case_word(word: &str, is_first: bool) -> String {
    let lower = word.to_lowercase();
    let core = lower.trim_matches(|c: char| !c.is_alphanumeric());
    if !is_first && MINOR_WORDS.contains(&core) {
        lower
    } else {
        capitalize_word(word)
    }
}

/// Converts ALL-CAPS text to title case; other text is returned unchanged.
///
/// Whitespace (including line breaks) is preserved exactly.
pub fn fix_capitalization(text: &str) -> String {
    if !is_mostly_uppercase(text) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut word = String::new();
    let mut is_first = true;

    for c in text.chars() {
        if c.is_whitespace() {
            if !word.is_empty() {
                out.push_str(&title_case_word(&word, is_first));
                is_first = false;
                word.clear();
            }
            out.push(c);
        } else {
            word.push(c);
        }
    }
    if !word.is_empty() {
        out.push_str(&title_case_word(&word, is_first));
    }
    out
}

/// Collapses all whitespace, line breaks included, to single spaces.
fn collapse_to_one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn format_email(text: &str) -> Result<String> {
    let one_line = collapse_to_one_line(text);
    let email_regex = Regex::new(EMAIL_PATTERN)?;
    if let Some(m) = email_regex.find(&one_line) {
        return Ok(m.as_str().to_string());
    }
    Ok(one_line
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || "._%+-@".contains(*c))
        .collect())
}

fn format_phone(text: &str) -> Result<String> {
    let one_line = collapse_to_one_line(text);
    let phone_regex = Regex::new(PHONE_PATTERN)?;
    let Some(m) = phone_regex.find(&one_line) else {
        return Ok(one_line);
    };

    let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
    let national = match digits.len() {
        10 => Some(digits.as_str()),
        11 if digits.starts_with('1') => Some(&digits[1..]),
        _ => None,
    };

    Ok(match national {
        Some(d) => format!("({}) {}-{}", &d[0..3], &d[3..6], &d[6..10]),
        None => m.as_str().trim().to_string(),
    })
}

fn format_date(text: &str) -> Result<String> {
    let one_line = collapse_to_one_line(text);
    let patterns = [
        r"\b\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}\b".to_string(),
        format!(r"(?i)\b\d{{1,2}}\s+{}\s*,?\s+\d{{4}}\b", MONTHS),
        format!(r"(?i)\b{}\s+\d{{1,2}}(?:st|nd|rd|th)?\s*,?\s+\d{{4}}\b", MONTHS),
        r"\b\d{4}[/\-.]\d{1,2}[/\-.]\d{1,2}\b".to_string(),
    ];

    for pattern in &patterns {
        let date_regex = Regex::new(pattern)?;
        if let Some(m) = date_regex.find(&one_line) {
            return Ok(m.as_str().to_string());
        }
    }
    Ok(one_line)
}

fn format_number(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Multi-line cleanup: squeeze spaces/tabs, allow at most one blank line in a row.
fn format_multiline(text: &str) -> Result<String> {
    let unified = text.replace("\r\n", "\n");
    let spaces = Regex::new(r"[ \t]+")?;
    let blank_runs = Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+")?;

    let squeezed = spaces.replace_all(&unified, " ");
    let capped = blank_runs.replace_all(&squeezed, "\n\n");
    Ok(capped.trim().to_string())
}

/// Shapes cleaned OCR text for a destination field.
pub fn format_for_field(text: &str, field_type: FieldType) -> Result<String> {
    match field_type {
        FieldType::Email => format_email(text),
        FieldType::Phone => format_phone(text),
        FieldType::Date => format_date(text),
        FieldType::Number => Ok(format_number(text)),
        FieldType::Address | FieldType::Text => Ok(collapse_to_one_line(text)),
        FieldType::TextArea => format_multiline(text),
    }
}

/// Full pipeline: line reconstruction, capitalization repair, field formatting.
pub fn normalize(result: &OcrText, field_type: FieldType) -> Result<String> {
    let rebuilt = reconstruct_text(result);
    let cased = fix_capitalization(&rebuilt);
    format_for_field(&cased, field_type)
}
