//! Log sanitization for patient identifiers.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`], which redacts:
//! - Record ids (UUIDs)
//! - National identity numbers (16-digit NIK)
//! - Indonesian mobile numbers (`+62`, `62` or `08` prefixed)
//! - Email addresses
//! - Patient names in `name=`, `nama:` or `patient_name` fields
//!
//! Sanitizing strings is a fallback. Call sites should still avoid putting
//! patient data into log messages.
//!
//! # Performance
//!
//! `sanitize()` caps its input (see `CARDIOFUZZY_SANITIZE_MAX_BYTES`) so a
//! single huge line cannot stall the logging thread.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PII_PATTERNS: OnceLock<PiiPatterns> = OnceLock::new();

/// Maximum number of bytes to sanitize per call. Defaults to 16 KiB.
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

const SANITIZE_MAX_BYTES_ENV: &str = "CARDIOFUZZY_SANITIZE_MAX_BYTES";

struct PiiPattern {
    regex: Regex,
    replacement: &'static str,
}

struct PiiPatterns {
    set: RegexSet,
    patterns: Vec<PiiPattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var(SANITIZE_MAX_BYTES_ENV)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn get_patterns() -> &'static PiiPatterns {
    PII_PATTERNS.get_or_init(|| {
        // Applied in order; earlier replacements are visible to later patterns.
        let rules: [(&'static str, &'static str); 5] = [
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (r"\b\d{16}\b", "[REDACTED-NIK]"),
            (
                r"(?:\+62|\b62|\b0)8[1-9](?:[-.\s]?[0-9]){6,10}\b",
                "[REDACTED-PHONE]",
            ),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            (
                r#"(?i)\b(patient_name|name|nama)("?\s*[:=]\s*)"?[^",;\n}]+"?"#,
                "${1}${2}[REDACTED-NAME]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let patterns = rules
            .into_iter()
            .map(|(pattern, replacement)| PiiPattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        PiiPatterns { set, patterns }
    })
}

/// Sanitize a string by replacing patient identifiers.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let pattern = &patterns.patterns[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Check if a string contains a patient identifier.
#[must_use]
pub fn contains_pii(input: &str) -> bool {
    let (prefix, _truncated) = truncate_to_char_boundary(input, max_sanitize_bytes());
    get_patterns().set.is_match(prefix)
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log output
/// line by line before it reaches the underlying sink.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M> Clone for SanitizingMakeWriter<M>
where
    M: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            let sanitized = sanitize(&String::from_utf8_lossy(&line));
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A line with no newline must not buffer without bound.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }

        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sanitize_record_id() {
        let input = "Appended diagnosis record 550e8400-e29b-41d4-a716-446655440000";
        let sanitized = sanitize(input);
        assert!(sanitized.contains("[REDACTED-UUID]"));
        assert!(!sanitized.contains("550e8400"));
    }

    #[test]
    fn test_sanitize_nik() {
        let sanitized = sanitize("NIK 3174012305900001 submitted");
        assert_eq!(sanitized, "NIK [REDACTED-NIK] submitted");
    }

    #[test]
    fn test_sanitize_phone_numbers() {
        for input in ["call 081234567890", "call +6281234567890", "call 0812-3456-7890"] {
            let sanitized = sanitize(input);
            assert_eq!(sanitized, "call [REDACTED-PHONE]", "input {input}");
        }
    }

    #[test]
    fn test_sanitize_email() {
        let sanitized = sanitize("Contact: pasien@klinik.co.id");
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
        assert!(!sanitized.contains("klinik"));
    }

    #[test]
    fn test_sanitize_name_fields() {
        let sanitized = sanitize(r#"request {"nama": "Budi Santoso", "usia": 52}"#);
        assert!(sanitized.contains(r#""nama": [REDACTED-NAME]"#));
        assert!(!sanitized.contains("Budi"));
        assert!(sanitized.contains(r#""usia": 52"#));

        let sanitized = sanitize("patient_name=Siti Aminah, tier=high");
        assert_eq!(sanitized, "patient_name=[REDACTED-NAME], tier=high");
    }

    #[test]
    fn test_clinical_values_untouched() {
        let line = "Assessment: 3 rules fired, score 83.71, tier High Risk";
        assert_eq!(sanitize(line), line);
        assert!(!contains_pii(line));
        assert!(contains_pii("nama: Budi"));
    }

    #[test]
    fn test_sanitize_truncates_large_inputs() {
        let input = "prefix 550e8400-e29b-41d4-a716-446655440000 suffix";
        let sanitized = sanitize_with_limit(input, 16);
        assert!(sanitized.ends_with("[TRUNCATED]"));
        assert!(!sanitized.contains("suffix"));
    }

    #[test]
    fn test_writer_sanitizes_each_line() {
        let mut writer = SanitizingWriter::new(Vec::new());
        writer
            .write_all(b"record 550e8400-e29b-41d4-a716-446655440000\npartial nama=Budi")
            .expect("Should write");
        assert_eq!(
            String::from_utf8_lossy(&writer.inner),
            "record [REDACTED-UUID]\n"
        );

        writer.flush().expect("Should flush");
        assert_eq!(
            String::from_utf8_lossy(&writer.inner),
            "record [REDACTED-UUID]\npartial nama=[REDACTED-NAME]"
        );
    }
}
