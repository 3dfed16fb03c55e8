use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::{AppError, AppResult};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses the date shapes the web forms send. Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

pub fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(RawTimestamp::Millis(millis)) => DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp {millis} is out of range"))),
        Some(RawTimestamp::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawTimestamp::Text(text)) => parse_timestamp(&text)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {text}"))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

/// Accepts `12` and `"12"` alike so ownership checks always compare `i64`.
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(id)) => Ok(Some(id)),
        Some(RawId::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawId::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {text}"))),
    }
}

pub fn id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    optional_id(deserializer)?.ok_or_else(|| serde::de::Error::custom("id is required"))
}

pub fn http_url(field: &str, raw: &str) -> AppResult<String> {
    let url = Url::parse(raw.trim())
        .map_err(|e| AppError::validation(format!("{field} is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(AppError::validation(format!(
            "{field} must use http or https, got {other}"
        ))),
    }
}

pub fn required_text(field: &str, value: Option<String>) -> AppResult<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| AppError::validation(format!("{field} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[derive(Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "optional_timestamp")]
        date: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "optional_id")]
        owner: Option<i64>,
    }

    #[test]
    fn parses_form_date_shapes() {
        let rfc = parse_timestamp("2026-03-14T10:30:00-03:00").unwrap();
        assert_eq!(rfc.hour(), 13);

        let local = parse_timestamp("2026-03-14T10:30").unwrap();
        assert_eq!((local.day(), local.hour(), local.minute()), (14, 10, 30));

        let day = parse_timestamp("2026-03-14").unwrap();
        assert_eq!((day.month(), day.hour()), (3, 0));

        assert!(parse_timestamp("next tuesday").is_none());
    }

    #[test]
    fn coerces_string_dates_and_ids() {
        let body: Body = serde_json::from_str(r#"{"date":"2026-01-02","owner":"17"}"#).unwrap();
        assert_eq!(body.date.unwrap().year(), 2026);
        assert_eq!(body.owner, Some(17));

        let body: Body = serde_json::from_str(r#"{"date":1767225600000,"owner":17}"#).unwrap();
        assert_eq!(body.date.unwrap().year(), 2026);
        assert_eq!(body.owner, Some(17));

        let body: Body = serde_json::from_str("{}").unwrap();
        assert!(body.date.is_none());
        assert!(body.owner.is_none());
    }

    #[test]
    fn rejects_garbage_ids() {
        assert!(serde_json::from_str::<Body>(r#"{"owner":"abc"}"#).is_err());
    }

    #[test]
    fn only_http_urls_pass() {
        assert!(http_url("imageUrl", "https://cdn.example.com/a.jpg").is_ok());
        assert!(http_url("imageUrl", "ftp://cdn.example.com/a.jpg").is_err());
        assert!(http_url("imageUrl", "not a url").is_err());
    }
}
