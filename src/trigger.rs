use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::alarm::Alarm;

/// which date the recurrence pattern is checked against once the
/// alarm time has already passed today and the trigger moved to tomorrow
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceDay {
    /// check today's date, even for a trigger that lands tomorrow.
    /// this is how deployed controllers behave: a weekly or custom alarm
    /// whose time passed today fires tomorrow when *today* is eligible.
    /// kept until the product owner signs off on changing it
    #[default]
    Today,
    /// check the date the trigger actually lands on
    Candidate,
}

/// the next instant `alarm` fires at, or `None` if the pattern rejects the day.
///
/// the candidate is today at the alarm time, moved on by 24 hours when it is
/// not after `now`. the result is not cached, call it again on every pass
#[must_use]
pub fn next_trigger(alarm: &Alarm, now: NaiveDateTime, day: RecurrenceDay) -> Option<NaiveDateTime> {
    let mut candidate = now.date().and_time(alarm.time());
    if candidate <= now {
        candidate += TimeDelta::hours(24);
    }
    let checked = match day {
        RecurrenceDay::Today => now.date(),
        RecurrenceDay::Candidate => candidate.date(),
    };
    alarm
        .recurrence
        .should_trigger(checked)
        .then_some(candidate)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::alarm::{CurveShape, IntensityCurve, RecurrencePattern};

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn alarm(hour: u8, minute: u8, recurrence: RecurrencePattern) -> Alarm {
        Alarm {
            id: "1".to_string(),
            name: "test".to_string(),
            hour,
            minute,
            color: String::new(),
            length: 1,
            curve: IntensityCurve {
                start: 0.0,
                end: 100.0,
                shape: CurveShape::Linear,
            },
            is_active: true,
            recurrence,
        }
    }

    #[test]
    fn later_today() {
        let a = alarm(7, 0, RecurrencePattern::Daily);
        let now = at(16, 6, 59, 30);
        let trigger = next_trigger(&a, now, RecurrenceDay::Today).unwrap();
        assert_eq!(trigger, at(16, 7, 0, 0));
        assert_eq!(trigger - now, TimeDelta::seconds(30));
    }

    #[test]
    fn exactly_now_moves_to_tomorrow() {
        let a = alarm(7, 0, RecurrencePattern::Daily);
        let trigger = next_trigger(&a, at(16, 7, 0, 0), RecurrenceDay::Today).unwrap();
        assert_eq!(trigger, at(17, 7, 0, 0));
    }

    #[test]
    fn passed_moves_to_tomorrow() {
        let a = alarm(7, 0, RecurrencePattern::Daily);
        let trigger = next_trigger(&a, at(16, 22, 15, 0), RecurrenceDay::Today).unwrap();
        assert_eq!(trigger, at(17, 7, 0, 0));
    }

    #[test]
    fn rejected_day_has_no_trigger() {
        // the 16th is a friday (4)
        let a = alarm(7, 0, RecurrencePattern::Weekly {
            days: [0].into_iter().collect(),
        });
        assert_eq!(next_trigger(&a, at(16, 6, 0, 0), RecurrenceDay::Today), None);
    }

    #[test]
    fn today_policy_checks_today_for_tomorrows_trigger() {
        // friday evening, alarm only on fridays: today is eligible so the
        // saturday morning trigger is returned
        let a = alarm(7, 0, RecurrencePattern::Weekly {
            days: [4].into_iter().collect(),
        });
        let now = at(16, 21, 0, 0);
        assert_eq!(
            next_trigger(&a, now, RecurrenceDay::Today),
            Some(at(17, 7, 0, 0))
        );
        assert_eq!(next_trigger(&a, now, RecurrenceDay::Candidate), None);
    }

    #[test]
    fn candidate_policy_checks_the_shifted_date() {
        // friday evening, alarm only on saturdays
        let a = alarm(7, 0, RecurrencePattern::Weekly {
            days: [5].into_iter().collect(),
        });
        let now = at(16, 21, 0, 0);
        assert_eq!(next_trigger(&a, now, RecurrenceDay::Today), None);
        assert_eq!(
            next_trigger(&a, now, RecurrenceDay::Candidate),
            Some(at(17, 7, 0, 0))
        );
    }
}
