use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};

use crate::models::Appointment;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("{0} does not exist in the local timezone")]
    NonexistentLocalTime(NaiveDateTime),
}

/// Merge a date picker value and a time picker value into one instant.
///
/// The calendar date comes from `date` and the hour and minute from `time`,
/// both read in `date`'s timezone. Seconds are dropped. A wall-clock time
/// repeated by a DST fall-back resolves to its earlier occurrence.
pub fn combine<Tz: TimeZone>(date: &DateTime<Tz>, time: &DateTime<Tz>) -> Result<DateTime<Utc>, ScheduleError> {
    let tz = date.timezone();
    let clock = time.with_timezone(&tz).time();
    combine_local(date.date_naive(), clock, &tz)
}

pub fn combine_local<Tz: TimeZone>(
    day: NaiveDate,
    clock: NaiveTime,
    tz: &Tz,
) -> Result<DateTime<Utc>, ScheduleError> {
    let clock = NaiveTime::from_hms_opt(clock.hour(), clock.minute(), 0).unwrap_or(clock);
    let naive = day.and_time(clock);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(ScheduleError::NonexistentLocalTime(naive)),
    }
}

/// Local calendar day of the appointment in `tz`.
pub fn local_day<Tz: TimeZone>(appt: &Appointment, tz: &Tz) -> NaiveDate {
    appt.appointment_at.with_timezone(tz).date_naive()
}

/// Case-insensitive substring match on client name or mobile. A blank
/// query matches everything.
pub fn matches_query(appt: &Appointment, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let Some(client) = &appt.client else {
        return false;
    };
    client.mobile.to_lowercase().contains(&needle)
        || client
            .name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&needle))
}

/// Apply the day filter (when set) AND the text query.
pub fn filter_appointments<'a, Tz: TimeZone>(
    list: &'a [Appointment],
    day: Option<NaiveDate>,
    query: &str,
    tz: &Tz,
) -> Vec<&'a Appointment> {
    list.iter()
        .filter(|a| day.is_none_or(|d| local_day(a, tz) == d))
        .filter(|a| matches_query(a, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::testing::appointment;
    use crate::models::AppointmentStatus;
    use chrono::{Datelike, FixedOffset};

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
    }

    #[test]
    fn combine_takes_date_from_one_and_clock_from_other() {
        let tz = ist();
        let date = tz.with_ymd_and_hms(2025, 12, 30, 23, 59, 59).unwrap();
        let time = tz.with_ymd_and_hms(2024, 1, 1, 14, 30, 45).unwrap();

        let at = combine(&date, &time).unwrap();
        let local = at.with_timezone(&tz);
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2025, 12, 30).unwrap());
        assert_eq!((local.hour(), local.minute(), local.second()), (14, 30, 0));
        assert_eq!(at, Utc.with_ymd_and_hms(2025, 12, 30, 9, 0, 0).unwrap());
    }

    #[test]
    fn combine_near_midnight_does_not_drift_a_day() {
        let tz = ist();
        let date = tz.with_ymd_and_hms(2025, 12, 30, 0, 5, 0).unwrap();
        let time = tz.with_ymd_and_hms(2025, 12, 29, 0, 15, 0).unwrap();

        let local = combine(&date, &time).unwrap().with_timezone(&tz);
        assert_eq!(local.day(), 30);
        assert_eq!((local.hour(), local.minute()), (0, 15));
    }

    #[test]
    fn combine_reads_time_in_date_timezone() {
        let tz = ist();
        let date = tz.with_ymd_and_hms(2025, 12, 30, 10, 0, 0).unwrap();
        // 09:00 UTC is 14:30 in IST.
        let time = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap().with_timezone(&tz);

        let local = combine(&date, &time).unwrap().with_timezone(&tz);
        assert_eq!((local.hour(), local.minute()), (14, 30));
    }

    /// Central-European style zone for 2026: +01:00 in winter, +02:00 from
    /// 29 March 01:00Z to 25 October 01:00Z. Local 02:xx is skipped in
    /// March and repeated in October.
    #[derive(Debug, Clone, Copy)]
    struct Shifting;

    impl Shifting {
        const WINTER: i32 = 3600;
        const SUMMER: i32 = 7200;

        fn fixed(secs: i32) -> FixedOffset {
            FixedOffset::east_opt(secs).unwrap()
        }

        fn spring() -> NaiveDate {
            NaiveDate::from_ymd_opt(2026, 3, 29).unwrap()
        }

        fn autumn() -> NaiveDate {
            NaiveDate::from_ymd_opt(2026, 10, 25).unwrap()
        }
    }

    impl TimeZone for Shifting {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            Shifting
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(12, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let (day, hour) = (local.date(), local.hour());
            if day == Self::spring() && hour == 2 {
                LocalResult::None
            } else if day == Self::autumn() && hour == 2 {
                LocalResult::Ambiguous(Self::fixed(Self::SUMMER), Self::fixed(Self::WINTER))
            } else if (day > Self::spring() || (day == Self::spring() && hour > 2))
                && (day < Self::autumn() || (day == Self::autumn() && hour < 2))
            {
                LocalResult::Single(Self::fixed(Self::SUMMER))
            } else {
                LocalResult::Single(Self::fixed(Self::WINTER))
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(12, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            let start = Self::spring().and_hms_opt(1, 0, 0).unwrap();
            let end = Self::autumn().and_hms_opt(1, 0, 0).unwrap();
            if *utc >= start && *utc < end {
                Self::fixed(Self::SUMMER)
            } else {
                Self::fixed(Self::WINTER)
            }
        }
    }

    #[test]
    fn repeated_wall_clock_takes_the_earlier_instant() {
        let clock = NaiveTime::from_hms_opt(2, 30, 15).unwrap();
        let at = combine_local(Shifting::autumn(), clock, &Shifting).unwrap();
        // 02:30 at +02:00 comes an hour before 02:30 at +01:00.
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 10, 25, 0, 30, 0).unwrap());
    }

    #[test]
    fn skipped_wall_clock_is_rejected() {
        let clock = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        let err = combine_local(Shifting::spring(), clock, &Shifting).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::NonexistentLocalTime(Shifting::spring().and_hms_opt(2, 30, 0).unwrap())
        );

        let date = Shifting.with_ymd_and_hms(2026, 3, 29, 9, 0, 0).unwrap();
        let time = Shifting.with_ymd_and_hms(2026, 3, 28, 2, 30, 0).unwrap();
        assert!(matches!(combine(&date, &time), Err(ScheduleError::NonexistentLocalTime(_))));

        let after = combine_local(Shifting::spring(), NaiveTime::from_hms_opt(3, 0, 0).unwrap(), &Shifting);
        assert_eq!(after.unwrap(), Utc.with_ymd_and_hms(2026, 3, 29, 1, 0, 0).unwrap());
    }

    #[test]
    fn local_day_uses_timezone() {
        // 20:00Z on the 29th is already the 30th in IST.
        let appt = appointment(1, "2025-12-29T20:00:00Z", AppointmentStatus::Scheduled, "A", "1");
        assert_eq!(local_day(&appt, &ist()), NaiveDate::from_ymd_opt(2025, 12, 30).unwrap());
        assert_eq!(local_day(&appt, &Utc), NaiveDate::from_ymd_opt(2025, 12, 29).unwrap());
    }

    #[test]
    fn filter_composes_day_and_query() {
        let list = vec![
            appointment(201, "2025-12-30T05:30:00Z", AppointmentStatus::Scheduled, "Aman Verma", "9876543210"),
            appointment(203, "2025-12-29T10:30:00Z", AppointmentStatus::Scheduled, "Karan Mehta", "9988776655"),
            appointment(206, "2025-12-30T09:00:00Z", AppointmentStatus::Scheduled, "Arjun Patel", "9345612789"),
            appointment(207, "2026-01-02T09:30:00Z", AppointmentStatus::Scheduled, "Aman Verma", "9876543210"),
        ];
        let tz = ist();
        let day = NaiveDate::from_ymd_opt(2025, 12, 30);
        let ids = |v: Vec<&Appointment>| v.iter().map(|a| a.id).collect::<Vec<_>>();

        assert_eq!(ids(filter_appointments(&list, day, "", &tz)), vec![201, 206]);
        assert_eq!(ids(filter_appointments(&list, day, "aMaN", &tz)), vec![201]);
        assert_eq!(ids(filter_appointments(&list, day, "93456", &tz)), vec![206]);
        assert_eq!(ids(filter_appointments(&list, None, "verma", &tz)), vec![201, 207]);
        assert_eq!(ids(filter_appointments(&list, None, "  ", &tz)).len(), 4);
        assert!(filter_appointments(&list, day, "karan", &tz).is_empty());
    }

    #[test]
    fn query_without_client_info_never_matches() {
        let mut appt = appointment(1, "2025-12-30T05:30:00Z", AppointmentStatus::Scheduled, "A", "1");
        appt.client = None;
        assert!(matches_query(&appt, ""));
        assert!(!matches_query(&appt, "a"));
    }
}
