//! Date helpers for menu planning grids.

use time::{Date, Duration, OffsetDateTime};

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

pub mod iso_date_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use time::Date;

    time::serde::format_description!(inner, Date, "[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(value: &Option<Date>, ser: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wrap<'a>(#[serde(with = "inner")] &'a Date);
        value.as_ref().map(Wrap).serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Date>, D::Error> {
        #[derive(Deserialize)]
        struct Wrap(#[serde(with = "inner")] Date);
        Ok(Option::<Wrap>::deserialize(de)?.map(|w| w.0))
    }
}

pub fn parse_iso_date(value: &str) -> Option<Date> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    Date::parse(value.trim(), &format).ok()
}

pub fn format_iso_date(value: Date) -> String {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    value.format(&format).unwrap_or_else(|_| value.to_string())
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Seven consecutive days starting at `start`.
pub fn week_days(start: Date) -> Vec<Date> {
    (0..7).map(|i| start + Duration::days(i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_iso_dates_leniently() {
        assert_eq!(parse_iso_date(" 2024-03-28 "), Some(date!(2024 - 03 - 28)));
        assert_eq!(parse_iso_date("28/03/2024"), None);
        assert_eq!(parse_iso_date(""), None);
    }

    #[test]
    fn week_grid_is_seven_consecutive_days() {
        let days = week_days(date!(2024 - 03 - 28));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], date!(2024 - 03 - 28));
        assert_eq!(days[3], date!(2024 - 03 - 31));
        assert_eq!(days[6], date!(2024 - 04 - 03));
    }
}
