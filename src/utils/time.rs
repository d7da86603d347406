//! Timestamp helpers

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Current time, truncated to microseconds so it survives a store round trip
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 text; lexical order matches chronological order
pub fn encode_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 timestamp into UTC
pub fn decode_time(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_encode_is_fixed_width() {
        let a = Utc.timestamp_opt(1, 0).unwrap();
        let b = Utc.timestamp_opt(1, 500_000_000).unwrap();

        let (ea, eb) = (encode_time(&a), encode_time(&b));
        assert_eq!(ea, "1970-01-01T00:00:01.000000Z");
        assert_eq!(ea.len(), eb.len());
        assert!(ea < eb);
    }

    #[test]
    fn test_decode_round_trip() {
        let at = now();
        assert_eq!(decode_time(&encode_time(&at)).unwrap(), at);
    }

    #[test]
    fn test_decode_converts_offset() {
        let at = decode_time("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(encode_time(&at), "2024-05-01T10:00:00.000000Z");
    }
}
