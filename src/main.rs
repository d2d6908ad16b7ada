use anemometer::configuration::{self, HardwareConfig, Settings, TickCadence};
use anemometer::sdmmc::SdCard;
use anemometer::utils::datetime::SystemClock;
use anemometer::{PulseCounter, WindSpeed};
use log::{info, warn};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const OFF_PULSE_RATIO: u64 = 12;
const ON_PULSE_RATIO: u64 = 1;
const BASE_PULSE_WIDTH: u64 = 5;

// gust for 40 s out of every 120 s
const GUST_PERIOD: Duration = Duration::from_secs(120);
const GUST_LENGTH: Duration = Duration::from_secs(40);

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let hardware = HardwareConfig::default();
    let settings = Settings::default();
    info!("hardware: {:?}", hardware);
    info!("settings: {:?}", settings);

    let card = SdCard::mount(configuration::mount_point());
    let mut wind_speed: WindSpeed<SdCard> =
        WindSpeed::new(&hardware, settings, card, SystemClock);

    wind_speed.set_alarm_callback(|| warn!("WIND ALARM"));

    // the simulator stands in for the rising edge interrupt on the sensor pin
    let counter = wind_speed.pulse_counter();
    let sensor_pin = hardware.sensor_pin;
    thread::Builder::new()
        .name(format!("cups-simulator-gpio{}", sensor_pin))
        .spawn(move || simulate_cups(&counter, sensor_pin))?;

    let cadence = TickCadence::default();
    let interval = Duration::from_millis(u64::from(hardware.sample_interval_ms));
    let mut next_sample = Instant::now() + interval;
    let mut tick: u64 = 0;

    loop {
        thread::sleep(next_sample.saturating_duration_since(Instant::now()));
        next_sample += interval;
        tick += 1;

        let (evaluate, log) = cadence.at(tick);
        wind_speed.calculate_windspeed(evaluate, log);
        info!(
            "wind speed {} ({})",
            wind_speed.windspeed_string(true),
            wind_speed.windspeed_evaluation_string()
        );
    }
}

/// Emulates the reed contact of the cups: a light breeze of about
/// 1.3 m/s, interrupted by gusts of 17.5 m/s.
fn simulate_cups(counter: &PulseCounter, sensor_pin: u8) {
    info!("simulating cup pulses on GPIO{}", sensor_pin);
    let started = Instant::now();

    loop {
        let gusting = started.elapsed().as_secs() % GUST_PERIOD.as_secs() < GUST_LENGTH.as_secs();
        let pulse_width = if gusting {
            BASE_PULSE_WIDTH * ON_PULSE_RATIO
        } else {
            BASE_PULSE_WIDTH * (ON_PULSE_RATIO + OFF_PULSE_RATIO)
        };

        counter.count_pulse();
        thread::sleep(Duration::from_millis(pulse_width));
    }
}
