use chrono::{Datelike, NaiveDate};

use crate::alarm::RecurrencePattern;

impl RecurrencePattern {
    /// whether an alarm with this pattern may go off on `date`.
    /// an empty weekday or date set never triggers
    #[must_use]
    pub fn should_trigger(&self, date: NaiveDate) -> bool {
        match self {
            Self::Daily => true,
            Self::Weekly { days } => u8::try_from(date.weekday().num_days_from_monday())
                .is_ok_and(|weekday| days.contains(&weekday)),
            Self::Custom { dates } => dates.contains(&date),
        }
    }
}
