//! Timestamp parsing and deep-link formatting.
//!
//! Segment start times arrive in two shapes depending on how an index was
//! populated: clock notation (`MM:SS` or `HH:MM:SS`, optionally with a
//! fractional seconds part) and raw decimal seconds (`"61.0"` or a JSON
//! number). Everything is reduced to whole seconds on parse; display and URL
//! forms are derived from that value.

use crate::error::{Result, SearchError};
use serde_json::Value;
use std::fmt;

/// Notation a timestamp was written in. Only affects the URL fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    /// `MM:SS` or `HH:MM:SS`.
    Clock,
    /// Plain seconds.
    Seconds,
}

/// A segment offset in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    seconds: u64,
    notation: Notation,
}

impl Timestamp {
    /// Create a timestamp from whole seconds.
    pub fn from_seconds(seconds: u64) -> Self {
        Self {
            seconds,
            notation: Notation::Seconds,
        }
    }

    /// Parse a clock (`MM:SS`, `HH:MM:SS`) or decimal-seconds (`"61.0"`) string.
    pub fn parse(raw: &str) -> Result<Self> {
        let malformed = || SearchError::MalformedTimestamp(raw.to_string());
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(malformed());
        }

        if trimmed.contains(':') {
            let parts: Vec<&str> = trimmed.split(':').collect();
            let (hours, minutes, secs) = match parts.as_slice() {
                [m, s] => (0, parse_whole(m), parse_decimal(s)),
                [h, m, s] => (parse_whole(h).ok_or_else(malformed)?, parse_whole(m), parse_decimal(s)),
                _ => return Err(malformed()),
            };
            let minutes = minutes.ok_or_else(malformed)?;
            let secs = secs.ok_or_else(malformed)?;

            let seconds = hours
                .checked_mul(3600)
                .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
                .and_then(|hm| hm.checked_add(secs))
                .ok_or_else(malformed)?;

            return Ok(Self {
                seconds,
                notation: Notation::Clock,
            });
        }

        // A bare integer like "5" is ambiguous between deployments and is
        // rejected; raw seconds must carry a decimal point.
        if !trimmed.contains('.') {
            return Err(malformed());
        }

        let seconds = parse_decimal(trimmed).ok_or_else(malformed)?;
        Ok(Self {
            seconds,
            notation: Notation::Seconds,
        })
    }

    /// Read a timestamp out of a metadata value (string or number).
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => {
                if let Some(whole) = n.as_u64() {
                    return Ok(Self::from_seconds(whole));
                }
                match n.as_f64() {
                    Some(f) if f.is_finite() && f >= 0.0 && f < u64::MAX as f64 => {
                        Ok(Self::from_seconds(f.trunc() as u64))
                    }
                    _ => Err(SearchError::MalformedTimestamp(n.to_string())),
                }
            }
            other => Err(SearchError::MalformedTimestamp(other.to_string())),
        }
    }

    /// Offset in whole seconds.
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn notation(&self) -> Notation {
        self.notation
    }

    /// URL fragment form: `1h2m3s` / `2m3s` for clock notation, `61s` for seconds.
    pub fn url_fragment(&self) -> String {
        match self.notation {
            Notation::Seconds => format!("{}s", self.seconds),
            Notation::Clock => {
                let (hours, minutes, secs) = self.components();
                if hours > 0 {
                    format!("{}h{}m{}s", hours, minutes, secs)
                } else {
                    format!("{}m{}s", minutes, secs)
                }
            }
        }
    }

    fn components(&self) -> (u64, u64, u64) {
        (
            self.seconds / 3600,
            (self.seconds % 3600) / 60,
            self.seconds % 60,
        )
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, minutes, secs) = self.components();
        if hours > 0 {
            write!(f, "{:02}:{:02}:{:02}", hours, minutes, secs)
        } else {
            write!(f, "{:02}:{:02}", minutes, secs)
        }
    }
}

impl std::str::FromStr for Timestamp {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse a raw timestamp string into whole seconds.
pub fn parse_to_seconds(raw: &str) -> Result<u64> {
    Timestamp::parse(raw).map(|t| t.seconds())
}

/// Parse a raw timestamp string and render its URL fragment.
pub fn to_url_fragment(raw: &str) -> Result<String> {
    Timestamp::parse(raw).map(|t| t.url_fragment())
}

/// Non-empty run of ASCII digits.
fn parse_whole(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Digits with an optional fractional part, truncated to whole seconds.
fn parse_decimal(part: &str) -> Option<u64> {
    match part.split_once('.') {
        None => parse_whole(part),
        Some((whole, frac)) => {
            if frac.is_empty() && whole.is_empty() {
                return None;
            }
            if !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            if whole.is_empty() {
                Some(0)
            } else {
                parse_whole(whole)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clock_notation_to_seconds() {
        assert_eq!(parse_to_seconds("01:02:03").unwrap(), 3723);
        assert_eq!(parse_to_seconds("02:03").unwrap(), 123);
        assert_eq!(parse_to_seconds("00:01:30").unwrap(), 90);
        assert_eq!(parse_to_seconds(" 10:00 ").unwrap(), 600);
    }

    #[test]
    fn test_clock_matches_reference_formula() {
        for h in [0u64, 1, 2, 10, 99] {
            for m in [0u64, 1, 30, 59] {
                for s in [0u64, 7, 59] {
                    let three = format!("{:02}:{:02}:{:02}", h, m, s);
                    assert_eq!(parse_to_seconds(&three).unwrap(), h * 3600 + m * 60 + s);
                }
                let two = format!("{}:{:02}", m, 42);
                assert_eq!(parse_to_seconds(&two).unwrap(), m * 60 + 42);
            }
        }
    }

    #[test]
    fn test_fractional_seconds_truncate() {
        assert_eq!(parse_to_seconds("61.0").unwrap(), 61);
        assert_eq!(parse_to_seconds("61.99").unwrap(), 61);
        assert_eq!(parse_to_seconds(".5").unwrap(), 0);
        assert_eq!(parse_to_seconds("00:01:30.750").unwrap(), 90);
    }

    #[test]
    fn test_malformed_inputs() {
        for raw in ["", "   ", "abc", "5", "1:2:3:4", "1::2", ":30", "-1:00", "1.2.3", "01:xx", "1e3", "."] {
            let err = parse_to_seconds(raw).unwrap_err();
            assert!(
                matches!(err, SearchError::MalformedTimestamp(_)),
                "{:?} should be malformed",
                raw
            );
        }
    }

    #[test]
    fn test_overflow_is_malformed() {
        let raw = format!("{}:00:00", u64::MAX);
        assert!(parse_to_seconds(&raw).is_err());
    }

    #[test]
    fn test_url_fragment() {
        assert_eq!(to_url_fragment("01:02:03").unwrap(), "1h2m3s");
        assert_eq!(to_url_fragment("00:02:03").unwrap(), "2m3s");
        assert_eq!(to_url_fragment("02:03").unwrap(), "2m3s");
        assert_eq!(to_url_fragment("61.0").unwrap(), "61s");
        // Minutes past the hour in MM:SS roll into the hour component.
        assert_eq!(to_url_fragment("75:00").unwrap(), "1h15m0s");
        assert!(to_url_fragment("5").is_err());
    }

    #[test]
    fn test_from_metadata_value() {
        assert_eq!(Timestamp::from_value(&json!("00:01:30")).unwrap().seconds(), 90);
        assert_eq!(Timestamp::from_value(&json!(90)).unwrap().seconds(), 90);
        assert_eq!(Timestamp::from_value(&json!(61.7)).unwrap().seconds(), 61);
        assert_eq!(Timestamp::from_value(&json!(61.7)).unwrap().url_fragment(), "61s");
        assert!(Timestamp::from_value(&json!(-4)).is_err());
        assert!(Timestamp::from_value(&json!(null)).is_err());
        assert!(Timestamp::from_value(&json!(["00:10"])).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Timestamp::from_seconds(125).to_string(), "02:05");
        assert_eq!(Timestamp::from_seconds(3723).to_string(), "01:02:03");
        assert_eq!("02:03".parse::<Timestamp>().unwrap().notation(), Notation::Clock);
    }
}
