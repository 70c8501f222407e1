use time::macros::format_description;
use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// `YYYY-MM-DD HH:MM:SS`, used in exported spreadsheets.
pub(crate) fn format_export(value: PrimitiveDateTime) -> String {
    value
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time};

    fn sample() -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        PrimitiveDateTime::new(date, time)
    }

    #[test]
    fn format_primitive_outputs_utc_z() {
        assert_eq!(format_primitive(sample()), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn format_export_uses_space_separator() {
        assert_eq!(format_export(sample()), "2025-01-02 10:20:30");
    }
}
