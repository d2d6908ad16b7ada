use crate::data_processing::*;
use crate::utils::datetime;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Line terminator of the CSV files, matches the files written by the
/// first generation of the instrument.
pub const LINE_ENDING: &str = "\r\n";

/// Battery state reported by the power management next to each log row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PowerStatus {
    pub battery_level: u8,
    pub battery_voltage_mv: u16,
}

/// One plot point, `x` counts from the oldest sample of the window.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedPoint {
    pub x: usize,
    pub y: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RangeReport {
    range_index: usize,
    start_index: usize,
    stop_index: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct EvaluationReport {
    current: f32,
    min: f32,
    max: f32,
    average: f32,
    exceeded_ranges: Vec<RangeReport>,
}

/// Samples of the newest `window` entries, oldest first.
pub fn speed_points<const N: usize>(
    history: &HistoryBuffer<N>,
    window: usize,
) -> Vec<SpeedPoint> {
    history
        .window(window)
        .iter()
        .rev()
        .enumerate()
        .map(|(x, &sample)| SpeedPoint {
            x,
            y: to_speed(sample),
        })
        .collect()
}

pub fn speed_json<const N: usize>(
    history: &HistoryBuffer<N>,
    window: usize,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&speed_points(history, window))
}

pub fn evaluation_json(
    current: f32,
    evaluation: &EvaluationResult,
) -> Result<String, serde_json::Error> {
    let report = EvaluationReport {
        current,
        min: evaluation.min_speed,
        max: evaluation.max_speed,
        average: evaluation.average_speed,
        exceeded_ranges: evaluation
            .exceeded_ranges
            .iter()
            .enumerate()
            .map(|(i, range)| RangeReport {
                range_index: i,
                start_index: range.start,
                stop_index: range.stop,
            })
            .collect(),
    };

    serde_json::to_string(&report)
}

/// Snapshot CSV: the same points as [`speed_json`], with `x` replaced by
/// the wall clock time the sample was taken.
pub fn speed_csv<const N: usize>(
    history: &HistoryBuffer<N>,
    window: usize,
    now: OffsetDateTime,
    interval_ms: u32,
    unit: &str,
) -> Result<String, time::error::Format> {
    let points = speed_points(history, window);
    let mut csv = format!("Timestamp(UTC), Speed[{}]{}", unit, LINE_ENDING);

    let newest = points.len().saturating_sub(1);
    for point in points {
        let age = (newest - point.x) as i64 * i64::from(interval_ms);
        let taken = now - Duration::milliseconds(age);
        csv.push_str(&format!(
            "{},{:.1}{}",
            datetime::timestamp(taken)?,
            point.y,
            LINE_ENDING
        ));
    }

    Ok(csv)
}

pub fn log_header(unit: &str) -> String {
    format!(
        "Timestamp(UTC), Speed[{}], BatteryLevel[%], BatteryVoltage[mV]",
        unit
    )
}

/// Continuous log row. Unknown battery values stay empty.
pub fn log_row(timestamp: &str, speed: f32, power: Option<PowerStatus>) -> String {
    match power {
        Some(power) => format!(
            "{},{:.1},{},{}",
            timestamp, speed, power.battery_level, power.battery_voltage_mv
        ),
        None => format!("{},{:.1},,", timestamp, speed),
    }
}

/// `12.3 m/s` or `12.3`
pub fn speed_string(speed: f32, unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!("{:.1} {}", speed, unit),
        None => format!("{:.1}", speed),
    }
}

/// `MAX:12.3 MIN:0.0 AVG:4.5`
pub fn evaluation_summary(evaluation: &EvaluationResult) -> String {
    format!(
        "MAX:{:.1} MIN:{:.1} AVG:{:.1}",
        evaluation.max_speed, evaluation.min_speed, evaluation.average_speed
    )
}
