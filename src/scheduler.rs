use std::time::Duration;

use chrono::NaiveDateTime;

use crate::{
    alarm::Alarm,
    trigger::{next_trigger, RecurrenceDay},
};

/// holds the active alarms from the last poll and the one that fires first
#[derive(Debug, Default)]
pub struct Scheduler {
    day: RecurrenceDay,
    alarms: Vec<Alarm>,
    // index into `alarms` and the instant it fires at
    next: Option<(usize, NaiveDateTime)>,
}

impl Scheduler {
    #[must_use]
    pub const fn new(day: RecurrenceDay) -> Self {
        Self {
            day,
            alarms: Vec::new(),
            next: None,
        }
    }

    /// throws away the previous alarms, keeps the active ones out of `alarms`
    /// and picks the next one as of `now`
    pub fn refresh(&mut self, alarms: Vec<Alarm>, now: NaiveDateTime) -> Option<&Alarm> {
        self.alarms = alarms.into_iter().filter(|a| a.is_active).collect();
        log::debug!("{} active alarm(s)", self.alarms.len());
        self.select_next(now)
    }

    /// the alarm with the earliest trigger, on a tie the one listed first wins.
    /// alarms that don't fire on the examined day are skipped
    pub fn select_next(&mut self, now: NaiveDateTime) -> Option<&Alarm> {
        let mut soonest: Option<(usize, NaiveDateTime)> = None;
        for (i, alarm) in self.alarms.iter().enumerate() {
            let Some(at) = next_trigger(alarm, now, self.day) else {
                continue;
            };
            if soonest.map_or(true, |(_, best)| at < best) {
                soonest = Some((i, at));
            }
        }
        self.next = soonest;
        self.next_alarm()
    }

    #[must_use]
    pub fn next_alarm(&self) -> Option<&Alarm> {
        self.next.map(|(i, _)| &self.alarms[i])
    }

    #[must_use]
    pub fn next_trigger(&self) -> Option<NaiveDateTime> {
        self.next.map(|(_, at)| at)
    }

    /// how long until the selected alarm fires, never negative
    #[must_use]
    pub fn time_until_next(&self, now: NaiveDateTime) -> Option<Duration> {
        self.next
            .map(|(_, at)| (at - now).to_std().unwrap_or(Duration::ZERO))
    }

    #[must_use]
    pub fn active(&self) -> &[Alarm] {
        &self.alarms
    }
}
