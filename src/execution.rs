//! Runs a single alarm: ramps the light, then plays the melody.
//!
//! # State Machine
//!
//! ```text
//!          run()                ramp time is up
//!  Idle ─────────► Ramping ─────────────────────► RampComplete ──► Melody
//!                     │                                               │
//!                     │ button pressed                                │
//!                     ▼                                               ▼
//!                 Cancelled ────────────────────────────────────► Finished
//! ```
//!
//! - **Ramping:** every ramp step the curve is evaluated at the elapsed
//!   fraction and pushed to the light, then the button is checked.
//! - **RampComplete:** the light is set to exactly the end intensity.
//! - **Melody:** blocks until the melody is over. The button is not
//!   checked while it plays.
//! - **Finished:** light off and sound stopped, whichever way we got here.

use std::time::Duration;

use chrono::NaiveDateTime;

use crate::{
    alarm::Alarm,
    hardware::{Clock, InputSource, IntensitySink, SoundSink},
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Ramping { start: NaiveDateTime, duration: f64 },
    Cancelled,
    RampComplete,
    Melody,
    Finished,
}

/// how a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// a curve value as a light level, clamped and cut down to a whole percent
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_level(intensity: f64) -> u8 {
    if intensity.is_nan() {
        return 0;
    }
    intensity.clamp(0.0, 100.0) as u8
}

/// owns the light and the buzzer while an alarm runs
#[derive(Debug)]
pub struct AlarmRunner<L, S> {
    led: L,
    sound: S,
    step: Duration,
}

impl<L: IntensitySink, S: SoundSink> AlarmRunner<L, S> {
    pub const fn new(led: L, sound: S, step: Duration) -> Self {
        Self { led, sound, step }
    }

    /// runs `alarm` until the ramp and melody are done or the button cancels it
    pub fn run<I, C>(&mut self, alarm: &Alarm, input: &mut I, clock: &C) -> RunOutcome
    where
        I: InputSource + ?Sized,
        C: Clock + ?Sized,
    {
        log::info!("alarm '{}' triggered", alarm.name);
        let mut outcome = RunOutcome::Completed;
        let mut state = State::Idle;
        loop {
            state = match state {
                State::Idle => State::Ramping {
                    start: clock.now(),
                    duration: alarm.duration_secs(),
                },
                State::Ramping { start, duration } => {
                    #[allow(clippy::cast_precision_loss)]
                    let elapsed = (clock.now() - start).num_milliseconds() as f64 / 1000.0;
                    let t = (elapsed / duration).clamp(0.0, 1.0);
                    let intensity = alarm.curve.evaluate(t);
                    log::debug!("t={t:.3} intensity={intensity:.2}");
                    self.led.set_intensity(to_level(intensity));
                    if input.take_press() {
                        State::Cancelled
                    } else if elapsed >= duration {
                        State::RampComplete
                    } else {
                        clock.sleep(self.step);
                        state
                    }
                }
                State::Cancelled => {
                    log::info!("alarm '{}' cancelled by button press", alarm.name);
                    outcome = RunOutcome::Cancelled;
                    State::Finished
                }
                State::RampComplete => {
                    self.led.set_intensity(to_level(alarm.curve.end));
                    State::Melody
                }
                State::Melody => {
                    self.sound.play_melody();
                    State::Finished
                }
                State::Finished => {
                    self.led.off();
                    self.sound.stop();
                    log::info!("alarm '{}' finished", alarm.name);
                    return outcome;
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeDelta};

    use super::*;
    use crate::{
        alarm::{CurveShape, IntensityCurve, RecurrencePattern},
        hardware::{fakes::*, DebouncedButton},
    };

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
    }

    fn alarm(shape: CurveShape) -> Alarm {
        Alarm {
            id: "1".to_string(),
            name: "sunrise".to_string(),
            hour: 7,
            minute: 0,
            color: String::new(),
            length: 1,
            curve: IntensityCurve {
                start: 0.0,
                end: 100.0,
                shape,
            },
            is_active: true,
            recurrence: RecurrencePattern::Daily,
        }
    }

    fn runner(recorder: &Recorder) -> AlarmRunner<Recorder, Recorder> {
        AlarmRunner::new(recorder.clone(), recorder.clone(), Duration::from_millis(100))
    }

    #[test]
    fn full_ramp_then_melody_then_off() {
        let clock = FakeClock::new(start());
        let recorder = Recorder::default();
        let mut button = DebouncedButton::new(
            PressFrom {
                clock: &clock,
                from: None,
            },
            &clock,
            Duration::from_millis(100),
        );
        let outcome = runner(&recorder).run(&alarm(CurveShape::Linear), &mut button, &clock);
        assert_eq!(outcome, RunOutcome::Completed);

        let levels = recorder.intensities();
        assert_eq!(levels.first(), Some(&0));
        assert_eq!(levels.last(), Some(&100));
        assert!(levels.windows(2).all(|w| w[0] <= w[1]));
        // one update per 100ms over a minute, plus the first one and the final end value
        assert_eq!(levels.len(), 602);

        let events = recorder.events();
        let tail = &events[events.len() - 4..];
        assert_eq!(
            tail,
            [
                Event::Intensity(100),
                Event::Melody,
                Event::LedOff,
                Event::SoundStop
            ]
        );
        assert!(clock.sleeps().iter().all(|d| *d == Duration::from_millis(100)));
    }

    #[test]
    fn press_cancels_mid_ramp() {
        let clock = FakeClock::new(start());
        let recorder = Recorder::default();
        let mut button = DebouncedButton::new(
            PressFrom {
                clock: &clock,
                from: Some(start() + TimeDelta::seconds(18)),
            },
            &clock,
            Duration::from_millis(100),
        );
        let outcome = runner(&recorder).run(&alarm(CurveShape::Linear), &mut button, &clock);
        assert_eq!(outcome, RunOutcome::Cancelled);

        let events = recorder.events();
        assert!(!events.contains(&Event::Melody));
        assert_eq!(&events[events.len() - 2..], [Event::LedOff, Event::SoundStop]);
        // stopped at 30% of the ramp
        assert_eq!(recorder.intensities().last(), Some(&30));
        assert_eq!(clock.now(), start() + TimeDelta::seconds(18));
    }

    #[test]
    fn overshooting_curves_are_clamped_for_the_led() {
        let clock = FakeClock::new(start());
        let recorder = Recorder::default();
        let mut button = DebouncedButton::new(
            PressFrom {
                clock: &clock,
                from: None,
            },
            &clock,
            Duration::from_millis(100),
        );
        let shape = CurveShape::Custom {
            points: [0.0, 100.0, 100.0, 0.0, 0.0]
                .iter()
                .map(|y| crate::alarm::ControlPoint::new(0.0, *y))
                .collect(),
        };
        runner(&recorder).run(&alarm(shape), &mut button, &clock);
        assert!(recorder.intensities().iter().all(|l| *l <= 100));
    }

    #[test]
    fn levels() {
        assert_eq!(to_level(-3.0), 0);
        assert_eq!(to_level(49.9), 49);
        assert_eq!(to_level(112.5), 100);
        assert_eq!(to_level(f64::NAN), 0);
    }
}
