//! Wall-clock helpers shared by the scheduling cells.
//!
//! Appointment and consultation times travel as `"HH:MM"` strings, the way
//! the front end sends them. Dates render in messages as `"Mon Oct 14 2025"`.

use chrono::{NaiveDate, NaiveTime};

pub const SLOT_TIME_FORMAT: &str = "%H:%M";

pub fn parse_slot_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, SLOT_TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

pub fn format_slot_time(time: &NaiveTime) -> String {
    time.format(SLOT_TIME_FORMAT).to_string()
}

pub fn display_date(date: &NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}

/// Serde adapter for `NaiveTime` stored as `"HH:MM"`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_slot_time(time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_slot_time(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid time '{}', expected HH:MM", raw)))
    }
}

/// Same as [`hhmm`] for optional fields.
pub mod option_hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_some(&super::format_slot_time(t)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse_slot_time(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid time '{}', expected HH:MM", raw))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Slot {
        #[serde(with = "hhmm")]
        time: NaiveTime,
        #[serde(default, with = "option_hhmm")]
        end: Option<NaiveTime>,
    }

    #[test]
    fn test_parse_accepts_minutes_and_seconds() {
        assert_eq!(parse_slot_time("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_slot_time("17:00:00"), NaiveTime::from_hms_opt(17, 0, 0));
        assert_eq!(parse_slot_time("9.30am"), None);
    }

    #[test]
    fn test_display_date_matches_message_format() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 14).unwrap();
        assert_eq!(display_date(&date), "Tue Oct 14 2025");
    }

    #[test]
    fn test_hhmm_serde() {
        let slot: Slot = serde_json::from_str(r#"{"time":"14:05"}"#).unwrap();
        assert_eq!(slot.time, NaiveTime::from_hms_opt(14, 5, 0).unwrap());
        assert!(slot.end.is_none());
        assert_eq!(serde_json::to_string(&slot).unwrap(), r#"{"time":"14:05","end":null}"#);

        assert!(serde_json::from_str::<Slot>(r#"{"time":"25:00"}"#).is_err());
    }
}
