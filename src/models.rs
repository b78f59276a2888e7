use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type EntryId = i64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub id: EntryId,
    pub context: String,
    #[serde(with = "wall_clock")]
    pub time: NaiveDateTime, // local wall-clock time set by sqlite on insert
}

/// Wire form of entry times: `2024-05-01T09:30:00Z`.
///
/// The value is the server's local wall-clock time tagged with `Z`. The web
/// frontend formats times in the UTC zone, so it shows the wall clock unchanged.
mod wall_clock {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use serde_json::json;

    fn entry() -> ClipboardEntry {
        ClipboardEntry {
            id: 7,
            context: "note".to_owned(),
            time: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_milli_opt(9, 30, 5, 250)
                .unwrap(),
        }
    }

    #[test]
    fn time_is_serialized_with_utc_designator() {
        let value = serde_json::to_value(entry()).unwrap();

        assert_eq!(
            value,
            json!({ "id": 7, "context": "note", "time": "2024-05-01T09:30:05Z" })
        );
    }

    #[test]
    fn time_without_designator_is_rejected() {
        let result = serde_json::from_value::<ClipboardEntry>(
            json!({ "id": 1, "context": "x", "time": "2024-05-01T09:30:05" }),
        );

        assert!(result.is_err());
    }

    #[test]
    fn wire_time_reads_back() {
        let parsed: ClipboardEntry =
            serde_json::from_value(json!({ "id": 7, "context": "note", "time": "2024-05-01T09:30:05Z" }))
                .unwrap();

        assert_eq!(parsed.time, entry().time.with_nanosecond(0).unwrap());
    }
}
