use std::time::Duration;

use chrono::NaiveDateTime;

use crate::{
    config::TimingConfig,
    execution::{AlarmRunner, RunOutcome},
    hardware::{Clock, InputSource, IntensitySink, SoundSink},
    scheduler::Scheduler,
    source::AlarmSource,
};

/// what one pass of the control loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// nothing to wait for, slept the idle interval
    Idle,
    /// the button was pressed while waiting for the alarm
    CancelledBeforeStart,
    /// the next alarm was cancelled before it started, slept towards its trigger
    Skipped,
    Ran(RunOutcome),
}

/// fetch, schedule, wait, run. everything blocks, nothing overlaps
#[derive(Debug)]
pub struct ControlLoop<Src, L, S, I, C> {
    source: Src,
    scheduler: Scheduler,
    runner: AlarmRunner<L, S>,
    input: I,
    clock: C,
    timing: TimingConfig,
    // id and trigger of an alarm cancelled before it started, until that trigger passes
    skipped: Option<(String, NaiveDateTime)>,
}

impl<Src, L, S, I, C> ControlLoop<Src, L, S, I, C>
where
    Src: AlarmSource,
    L: IntensitySink,
    S: SoundSink,
    I: InputSource,
    C: Clock,
{
    pub fn new(source: Src, led: L, sound: S, input: I, clock: C, timing: TimingConfig) -> Self {
        Self {
            source,
            scheduler: Scheduler::new(timing.recurrence_day),
            runner: AlarmRunner::new(led, sound, timing.ramp_step()),
            input,
            clock,
            timing,
            skipped: None,
        }
    }

    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn run_forever(&mut self) -> ! {
        log::info!("alarm loop started");
        loop {
            let outcome = self.run_cycle();
            log::debug!("cycle ended: {outcome:?}");
        }
    }

    pub fn run_cycle(&mut self) -> CycleOutcome {
        let alarms = self.source.fetch_alarms();
        let now = self.clock.now();
        if self.skipped.as_ref().is_some_and(|(_, at)| *at <= now) {
            self.skipped = None;
        }
        let Some((alarm, at)) = self
            .scheduler
            .refresh(alarms, now)
            .cloned()
            .zip(self.scheduler.next_trigger())
        else {
            log::info!(
                "no active alarms, sleeping {}s",
                self.timing.idle_poll().as_secs()
            );
            self.clock.sleep(self.timing.idle_poll());
            return CycleOutcome::Idle;
        };
        let wait = self.scheduler.time_until_next(now).unwrap_or_default();
        let skipped = (alarm.id.clone(), at);
        if self.skipped.as_ref() == Some(&skipped) {
            let nap = wait.min(self.timing.idle_poll());
            log::info!(
                "alarm '{}' was cancelled before start, sleeping {}s",
                alarm.name,
                nap.as_secs()
            );
            self.clock.sleep(nap);
            return CycleOutcome::Skipped;
        }
        log::info!("next alarm: '{}' in {}s", alarm.name, wait.as_secs());

        if !self.wait_for(wait) {
            log::info!("alarm '{}' cancelled before start by button press", alarm.name);
            self.skipped = Some(skipped);
            return CycleOutcome::CancelledBeforeStart;
        }
        CycleOutcome::Ran(self.runner.run(&alarm, &mut self.input, &self.clock))
    }

    /// sleeps through the whole seconds of `wait`, one wait step at a time,
    /// returns false if the button was pressed on the way
    fn wait_for(&mut self, wait: Duration) -> bool {
        let step = self.timing.wait_step();
        let steps = wait.as_secs() / step.as_secs();
        for _ in 0..steps {
            if self.input.take_press() {
                return false;
            }
            self.clock.sleep(step);
        }
        true
    }
}
