use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::models::Meeting;

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The Monday 00:00 through Friday 23:59:59.999 span of the week holding `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub monday: NaiveDateTime,
    pub friday: NaiveDateTime,
}

impl WeekWindow {
    pub fn containing(now: NaiveDateTime) -> Self {
        let since_monday = i64::from(now.weekday().num_days_from_monday());
        let monday = (now.date() - Duration::days(since_monday)).and_time(NaiveTime::MIN);
        let friday = monday + Duration::days(5) - Duration::milliseconds(1);
        Self { monday, friday }
    }

    pub fn for_day(today: NaiveDate) -> Self {
        Self::containing(today.and_time(NaiveTime::MIN))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let at = date.and_time(NaiveTime::MIN);
        self.monday <= at && at <= self.friday
    }
}

/// KPI window test. Independent of weekday: a weekend date never falls inside
/// the window, so nothing needs special-casing here.
pub fn is_this_week(date: NaiveDate, today: NaiveDate) -> bool {
    WeekWindow::for_day(today).contains(date)
}

/// Strict `YYYY-MM-DD`. Rejects the looser forms chrono would accept, such as
/// single-digit months or signed years.
pub fn parse_meeting_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let bytes = raw.as_bytes();
    if bytes.len() != 10 {
        return None;
    }
    let shaped = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeetingBucket {
    AttendedThisWeek,
    ToAttendThisWeek,
    FutureBeyondThisWeek,
    NeedsRescheduling,
    /// Weekday meetings before this week's Monday.
    Earlier,
}

impl MeetingBucket {
    pub fn classify(date: NaiveDate, today: NaiveDate) -> Self {
        if is_weekend(date) {
            return MeetingBucket::NeedsRescheduling;
        }
        if is_this_week(date, today) {
            if date < today {
                MeetingBucket::AttendedThisWeek
            } else {
                MeetingBucket::ToAttendThisWeek
            }
        } else if date > today {
            MeetingBucket::FutureBeyondThisWeek
        } else {
            MeetingBucket::Earlier
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            MeetingBucket::AttendedThisWeek => "Attended this week",
            MeetingBucket::ToAttendThisWeek => "To attend this week",
            MeetingBucket::FutureBeyondThisWeek => "Upcoming",
            MeetingBucket::NeedsRescheduling => "Needs rescheduling",
            MeetingBucket::Earlier => "Earlier",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BucketedMeetings {
    pub attended: Vec<Meeting>,
    pub to_attend: Vec<Meeting>,
    pub future: Vec<Meeting>,
    pub needs_rescheduling: Vec<Meeting>,
    pub earlier: Vec<Meeting>,
}

impl BucketedMeetings {
    pub fn from_meetings(meetings: &[Meeting], today: NaiveDate) -> Self {
        let mut sorted = meetings.to_vec();
        sorted.sort_by(|a, b| a.date.cmp(&b.date));

        let mut buckets = Self::default();
        for meeting in sorted {
            match MeetingBucket::classify(meeting.date, today) {
                MeetingBucket::AttendedThisWeek => buckets.attended.push(meeting),
                MeetingBucket::ToAttendThisWeek => buckets.to_attend.push(meeting),
                MeetingBucket::FutureBeyondThisWeek => buckets.future.push(meeting),
                MeetingBucket::NeedsRescheduling => buckets.needs_rescheduling.push(meeting),
                MeetingBucket::Earlier => buckets.earlier.push(meeting),
            }
        }
        buckets
    }

    pub fn sections(&self) -> [(MeetingBucket, &[Meeting]); 5] {
        [
            (MeetingBucket::NeedsRescheduling, self.needs_rescheduling.as_slice()),
            (MeetingBucket::ToAttendThisWeek, self.to_attend.as_slice()),
            (MeetingBucket::AttendedThisWeek, self.attended.as_slice()),
            (MeetingBucket::FutureBeyondThisWeek, self.future.as_slice()),
            (MeetingBucket::Earlier, self.earlier.as_slice()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn meeting(id: &str, date: NaiveDate) -> Meeting {
        Meeting {
            id: id.to_string(),
            sales_person_id: "1".to_string(),
            client_name: "Acme".to_string(),
            date,
            notes: None,
            outcome: None,
        }
    }

    #[test]
    fn weekend_matches_saturday_and_sunday_only() {
        let mut date = day(2024, 6, 10);
        for _ in 0..14 {
            let expected = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
            assert_eq!(is_weekend(date), expected, "{date}");
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn window_runs_monday_to_friday_end_of_day() {
        let now = day(2024, 6, 12).and_hms_opt(15, 30, 0).unwrap();
        let window = WeekWindow::containing(now);
        assert_eq!(window.monday, day(2024, 6, 10).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(
            window.friday,
            day(2024, 6, 14).and_hms_milli_opt(23, 59, 59, 999).unwrap()
        );
    }

    #[test]
    fn window_on_monday_and_sunday() {
        let monday = WeekWindow::for_day(day(2024, 6, 10));
        assert_eq!(monday.monday.date(), day(2024, 6, 10));

        let sunday = WeekWindow::for_day(day(2024, 6, 16));
        assert_eq!(sunday.monday.date(), day(2024, 6, 10));
        assert_eq!(sunday.friday.date(), day(2024, 6, 14));
    }

    #[test]
    fn this_week_excludes_weekend_days() {
        let today = day(2024, 6, 12);
        assert!(is_this_week(day(2024, 6, 10), today));
        assert!(is_this_week(day(2024, 6, 14), today));
        assert!(!is_this_week(day(2024, 6, 15), today));
        assert!(!is_this_week(day(2024, 6, 9), today));
        assert!(!is_this_week(day(2024, 6, 20), today));
    }

    #[test]
    fn wednesday_scenario_buckets() {
        let today = day(2024, 6, 12);
        assert_eq!(
            MeetingBucket::classify(day(2024, 6, 10), today),
            MeetingBucket::AttendedThisWeek
        );
        assert_eq!(
            MeetingBucket::classify(day(2024, 6, 15), today),
            MeetingBucket::NeedsRescheduling
        );
        assert_eq!(
            MeetingBucket::classify(day(2024, 6, 20), today),
            MeetingBucket::FutureBeyondThisWeek
        );
        assert_eq!(
            MeetingBucket::classify(day(2024, 6, 5), today),
            MeetingBucket::Earlier
        );
    }

    #[test]
    fn meeting_today_is_still_to_attend() {
        let today = day(2024, 6, 12);
        assert_eq!(
            MeetingBucket::classify(today, today),
            MeetingBucket::ToAttendThisWeek
        );
    }

    #[test]
    fn every_date_lands_in_exactly_one_bucket() {
        let today = day(2024, 6, 12);
        let meetings: Vec<Meeting> = (0..42)
            .map(|offset| meeting(&format!("m{offset}"), day(2024, 5, 29) + Duration::days(offset)))
            .collect();
        let buckets = BucketedMeetings::from_meetings(&meetings, today);
        let total: usize = buckets.sections().iter().map(|(_, list)| list.len()).sum();
        assert_eq!(total, meetings.len());
        assert!(buckets
            .needs_rescheduling
            .iter()
            .all(|m| is_weekend(m.date)));
        assert!(buckets.to_attend.iter().all(|m| m.date >= today));
    }

    #[test]
    fn strict_date_parsing() {
        assert_eq!(parse_meeting_date("2024-06-12"), Some(day(2024, 6, 12)));
        assert_eq!(parse_meeting_date(" 2024-06-12 "), Some(day(2024, 6, 12)));
        assert_eq!(parse_meeting_date("2024-6-12"), None);
        assert_eq!(parse_meeting_date("2024-02-30"), None);
        assert_eq!(parse_meeting_date("12/06/2024"), None);
        assert_eq!(parse_meeting_date(""), None);
    }
}
