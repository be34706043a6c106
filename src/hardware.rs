//! Capabilities the alarm core drives, and their host implementations.
//!
//! The core only ever talks to these traits, so the ramp and the control loop
//! run the same against real hardware, the host stand-ins below, or the
//! recording fakes in tests.

use std::{
    io::BufRead,
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use chrono::{Local, NaiveDateTime, TimeDelta};
use rodio::{source::SineWave, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::config::Note;

/// pause after every note of the melody
pub const NOTE_GAP: Duration = Duration::from_millis(100);

/// local wall clock plus a blocking sleep
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// the light being ramped, intensity goes from 0 (off) to 100 (full)
pub trait IntensitySink {
    fn set_intensity(&mut self, intensity: u8);
    fn off(&mut self);
}

pub trait SoundSink {
    /// plays the wake up melody, returns once it is done
    fn play_melody(&mut self);
    fn stop(&mut self);
}

/// a debounced button.
///
/// `is_held` only looks, `take_press` consumes a press and restarts the
/// debounce window. Cancelling anything goes through `take_press`, so a
/// check in one place never eats a press meant for another
pub trait InputSource {
    fn is_held(&self) -> bool;
    fn take_press(&mut self) -> bool;
}

/// an undebounced digital input
pub trait RawInput {
    fn is_active(&self) -> bool;
}

#[derive(Debug)]
pub struct DebouncedButton<P, C> {
    pin: P,
    clock: C,
    debounce: TimeDelta,
    last_press: Option<NaiveDateTime>,
}

impl<P: RawInput, C: Clock> DebouncedButton<P, C> {
    pub fn new(pin: P, clock: C, debounce: Duration) -> Self {
        Self {
            pin,
            clock,
            debounce: TimeDelta::from_std(debounce).unwrap_or(TimeDelta::zero()),
            last_press: None,
        }
    }

    fn outside_window(&self, now: NaiveDateTime) -> bool {
        self.last_press
            .map_or(true, |last| now - last > self.debounce)
    }
}

impl<P: RawInput, C: Clock> InputSource for DebouncedButton<P, C> {
    fn is_held(&self) -> bool {
        self.pin.is_active()
    }

    fn take_press(&mut self) -> bool {
        if !self.pin.is_active() {
            return false;
        }
        let now = self.clock.now();
        if !self.outside_window(now) {
            return false;
        }
        self.last_press = Some(now);
        true
    }
}

/// stands in for the button on a desktop: every line typed on stdin counts
/// as the button being held down for a moment
#[derive(Debug, Clone)]
pub struct KeyboardInput {
    last_line: Arc<Mutex<Option<Instant>>>,
    hold: Duration,
}

impl KeyboardInput {
    #[must_use]
    pub fn spawn(hold: Duration) -> Self {
        let last_line = Arc::new(Mutex::new(None));
        let latch = Arc::clone(&last_line);
        thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if line.is_err() {
                    break;
                }
                if let Ok(mut last) = latch.lock() {
                    *last = Some(Instant::now());
                }
            }
            log::debug!("stdin closed, keyboard button is dead");
        });
        Self { last_line, hold }
    }
}

impl RawInput for KeyboardInput {
    fn is_active(&self) -> bool {
        self.last_line
            .lock()
            .ok()
            .and_then(|last| *last)
            .is_some_and(|at| at.elapsed() <= self.hold)
    }
}

/// led behind a pwm channel, the duty cycle is only logged on the host
#[derive(Debug)]
pub struct PwmLed {
    pin: u8,
    max_duty: u32,
    intensity: u8,
}

impl PwmLed {
    #[must_use]
    pub const fn new(pin: u8, max_duty: u32) -> Self {
        Self {
            pin,
            max_duty,
            intensity: 0,
        }
    }

    #[must_use]
    pub const fn intensity(&self) -> u8 {
        self.intensity
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn duty(&self) -> u32 {
        // intensity is at most 100, so the result fits back into max_duty's type
        (u64::from(self.intensity) * u64::from(self.max_duty) / 100) as u32
    }
}

impl IntensitySink for PwmLed {
    fn set_intensity(&mut self, intensity: u8) {
        self.intensity = intensity.min(100);
        log::debug!(
            "led on pin {} at {}% (duty {})",
            self.pin,
            self.intensity,
            self.duty()
        );
    }

    fn off(&mut self) {
        self.set_intensity(0);
    }
}

/// plays the melody as plain sine tones on the default audio device
pub struct Buzzer {
    melody: Vec<Note>,
    volume: f32,
    // None when there is no audio device, the buzzer then stays quiet
    stream: Option<OutputStream>,
    sink: Option<Sink>,
}

impl std::fmt::Debug for Buzzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buzzer")
            .field("melody", &self.melody)
            .field("volume", &self.volume)
            .field("has_audio", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}

impl Buzzer {
    #[must_use]
    pub fn new(melody: Vec<Note>, volume: f32) -> Self {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => Some(stream),
            Err(e) => {
                log::warn!("no audio output, melody will be silent: {e}");
                None
            }
        };
        Self {
            melody,
            volume,
            stream,
            sink: None,
        }
    }
}

impl SoundSink for Buzzer {
    fn play_melody(&mut self) {
        let Some(stream) = &self.stream else {
            log::info!("(silently) playing {} notes", self.melody.len());
            return;
        };
        let sink = Sink::connect_new(stream.mixer());
        sink.set_volume(self.volume);
        for note in &self.melody {
            sink.append(
                SineWave::new(note.frequency).take_duration(Duration::from_millis(note.duration_ms)),
            );
            sink.append(SineWave::new(note.frequency).take_duration(NOTE_GAP).amplify(0.0));
        }
        sink.sleep_until_end();
        self.sink = Some(sink);
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}


#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{fakes::*, *};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    #[test]
    fn press_is_debounced() {
        let clock = FakeClock::new(start());
        let pin = PressFrom {
            clock: &clock,
            from: Some(start()),
        };
        let mut button = DebouncedButton::new(pin, &clock, Duration::from_millis(100));
        assert!(button.take_press());
        assert!(!button.take_press());
        clock.advance(Duration::from_millis(100));
        assert!(!button.take_press());
        clock.advance(Duration::from_millis(1));
        assert!(button.take_press());
    }

    #[test]
    fn looking_does_not_consume() {
        let clock = FakeClock::new(start());
        let pin = PressFrom {
            clock: &clock,
            from: Some(start()),
        };
        let mut button = DebouncedButton::new(pin, &clock, Duration::from_millis(100));
        for _ in 0..5 {
            assert!(button.is_held());
        }
        assert!(button.take_press());
        assert!(button.is_held());
    }

    #[test]
    fn released_button_is_never_pressed() {
        let clock = FakeClock::new(start());
        let pin = PressFrom {
            clock: &clock,
            from: None,
        };
        let mut button = DebouncedButton::new(pin, &clock, Duration::from_millis(100));
        assert!(!button.is_held());
        assert!(!button.take_press());
    }

    #[test]
    fn led_duty_follows_intensity() {
        let mut led = PwmLed::new(25, 65535);
        led.set_intensity(50);
        assert_eq!(led.duty(), 32767);
        led.set_intensity(250);
        assert_eq!(led.intensity(), 100);
        assert_eq!(led.duty(), 65535);
        led.off();
        assert_eq!(led.duty(), 0);
    }

    #[test]
    fn led_duty_handles_a_wide_counter() {
        let mut led = PwmLed::new(25, u32::MAX);
        led.set_intensity(100);
        assert_eq!(led.duty(), u32::MAX);
        led.set_intensity(50);
        assert_eq!(led.duty(), u32::MAX / 2);
    }
}
