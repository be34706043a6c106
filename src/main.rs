use std::{error::Error, path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use dawnlight::{
    config::Config,
    hardware::{Buzzer, Clock, DebouncedButton, KeyboardInput, PwmLed, SystemClock},
    source::{AlarmSource, FileAlarmSource, HttpAlarmSource},
    ControlLoop, Scheduler,
};

/// how long a line on stdin keeps the button held down
const KEY_HOLD: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// use this config file instead of the default one
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// run the alarm loop forever, press enter to cancel the coming or running alarm
    Run {
        /// read alarms from a json file instead of the server
        #[clap(long)]
        file: Option<PathBuf>,
    },
    /// show which alarm goes off next
    Next {
        #[clap(long)]
        file: Option<PathBuf>,
    },
    /// print the light ramp of an alarm
    Preview {
        id: String,
        #[clap(long, default_value_t = 10)]
        steps: usize,
        #[clap(long)]
        file: Option<PathBuf>,
    },
}

fn source(config: &Config, file: Option<PathBuf>) -> Result<Box<dyn AlarmSource>, Box<dyn Error>> {
    let source: Box<dyn AlarmSource> = match file {
        Some(path) => Box::new(FileAlarmSource::new(path)),
        None => Box::new(HttpAlarmSource::new(
            config.server.url.clone(),
            Duration::from_secs(config.server.timeout_secs),
        )?),
    };
    Ok(source)
}

fn run(config: &Config, file: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let hw = &config.hardware;
    log::info!(
        "led on pin {} ({} hz pwm), buzzer on pin {}, button on pin {}",
        hw.led_pin,
        hw.pwm_freq,
        hw.buzzer_pin,
        hw.button_pin
    );
    let button = DebouncedButton::new(
        KeyboardInput::spawn(KEY_HOLD),
        SystemClock,
        Duration::from_millis(hw.debounce_ms),
    );
    let mut control_loop = ControlLoop::new(
        source(config, file)?,
        PwmLed::new(hw.led_pin, hw.max_duty),
        Buzzer::new(config.melody.clone(), hw.volume),
        button,
        SystemClock,
        config.timing.clone(),
    );
    control_loop.run_forever()
}

fn next(config: &Config, file: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let alarms = source(config, file)?.fetch_alarms();
    let now = SystemClock.now();
    let mut scheduler = Scheduler::new(config.timing.recurrence_day);
    match scheduler.refresh(alarms, now) {
        Some(alarm) => {
            let alarm = alarm.clone();
            let wait = scheduler.time_until_next(now).unwrap_or_default();
            println!(
                "{} ({}) at {:02}:{:02}, in {}h {}m {}s",
                alarm.name,
                alarm.id,
                alarm.hour,
                alarm.minute,
                wait.as_secs() / 3600,
                wait.as_secs() / 60 % 60,
                wait.as_secs() % 60
            );
        }
        None => println!("no alarm coming up"),
    }
    Ok(())
}

fn preview(
    config: &Config,
    id: &str,
    steps: usize,
    file: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let alarms = source(config, file)?.fetch_alarms();
    let Some(alarm) = alarms.into_iter().find(|a| a.id == id) else {
        return Err(format!("no alarm with id {id}").into());
    };
    let minutes = alarm.duration_secs() / 60.0;
    println!("{} over {minutes} min:", alarm.name);
    for (t, intensity) in alarm.curve.sample(steps) {
        println!("{:>6.1} min  {intensity:>6.1}", t * minutes);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("dawnlight").expect("couldn't initialize logger");

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match args.command {
        Some(Command::Init { force }) => {
            if force || !config_path.exists() {
                Config::new().save(&config_path)?;
                println!("wrote {}", config_path.display());
            } else {
                println!("{} already exists, use --force to overwrite", config_path.display());
            }
            Ok(())
        }
        Some(Command::Next { file }) => next(&Config::load_or_default(&config_path)?, file),
        Some(Command::Preview { id, steps, file }) => {
            preview(&Config::load_or_default(&config_path)?, &id, steps, file)
        }
        Some(Command::Run { file }) => run(&Config::load_or_default(&config_path)?, file),
        None => run(&Config::load_or_default(&config_path)?, None),
    }
}
