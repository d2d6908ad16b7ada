/*
 * ESP32 Anemometer
 *
 * MIT license
 *
 * Copyright (c) 2021-2023 Michael Zill
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 *
 * Apache license, Version 2.0
 *
 * Copyright (c) 2021-2023 Michael Zill
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use serde::{Deserialize, Serialize};

// Build time configuration, read from `cfg.toml` in the crate root. See
// `cfg.toml.example` for the available keys.
#[toml_cfg::toml_config]
pub struct Config {
    #[default(19)]
    sensor_pin: u8,
    #[default(20)]
    pulses_per_revolution: u32,
    #[default(1750)]
    distance_per_revolution_mm: u32,
    #[default(1000)]
    sample_interval_ms: u32,
    #[default(1)]
    evaluate_every_ticks: u32,
    #[default(1)]
    log_every_ticks: u32,
    #[default("./sdcard")]
    mount_point: &'static str,
    #[default("m/s")]
    speed_unit: &'static str,
    #[default(0)]
    lower_threshold: u16,
    #[default(8)]
    upper_threshold: u16,
    #[default(20)]
    duration_range: u16,
    #[default(300)]
    evaluation_window: u16,
    #[default(1)]
    windows_threshold: u16,
}

/// Fixed properties of the wind sensor and the sampling loop.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HardwareConfig {
    /// GPIO the sensor pulse line is wired to (rising edge).
    pub sensor_pin: u8,
    pub pulses_per_revolution: u32,
    /// Distance travelled per cup revolution, in the display unit.
    pub distance_per_revolution: f32,
    pub sample_interval_ms: u32,
    pub speed_unit: &'static str,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            sensor_pin: CONFIG.sensor_pin,
            pulses_per_revolution: CONFIG.pulses_per_revolution,
            distance_per_revolution: CONFIG.distance_per_revolution_mm as f32 / 1000.0,
            sample_interval_ms: CONFIG.sample_interval_ms,
            speed_unit: CONFIG.speed_unit,
        }
    }
}

/// How often the tick loop asks for an evaluation and a log row.
/// An interval of 0 disables the step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TickCadence {
    pub evaluate_every: u32,
    pub log_every: u32,
}

impl TickCadence {
    /// `(evaluate, log)` for the tick with sequence number `tick`,
    /// counting from 1.
    pub fn at(&self, tick: u64) -> (bool, bool) {
        let due = |every: u32| every != 0 && tick % u64::from(every) == 0;
        (due(self.evaluate_every), due(self.log_every))
    }
}

impl Default for TickCadence {
    fn default() -> Self {
        Self {
            evaluate_every: CONFIG.evaluate_every_ticks,
            log_every: CONFIG.log_every_ticks,
        }
    }
}

/// Directory the SD card (or its host stand-in) is mounted at.
pub fn mount_point() -> &'static str {
    CONFIG.mount_point
}

/// Evaluation settings. Owned by the application, copied into the
/// engine and replaceable between two ticks.
///
/// Thresholds are whole units of the configured speed unit; they are
/// scaled by ten to compare against quantized samples.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    pub lower_threshold: u16,
    pub upper_threshold: u16,
    /// Number of consecutive out-of-band samples forming one exceeded range.
    pub duration_range: u16,
    /// Number of samples (newest first) taken into account.
    pub evaluation_window: u16,
    /// Number of exceeded ranges needed to raise the alarm.
    pub windows_threshold: u16,
    pub calibration_factor: f32,
}

impl Settings {
    /// Lower band limit in tenths of a unit.
    pub fn lower_bound(&self) -> u32 {
        u32::from(self.lower_threshold) * 10
    }

    /// Upper band limit in tenths of a unit.
    pub fn upper_bound(&self) -> u32 {
        u32::from(self.upper_threshold) * 10
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lower_threshold: CONFIG.lower_threshold,
            upper_threshold: CONFIG.upper_threshold,
            duration_range: CONFIG.duration_range,
            evaluation_window: CONFIG.evaluation_window,
            windows_threshold: CONFIG.windows_threshold,
            calibration_factor: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_limits_are_scaled_to_tenths() {
        let settings = Settings {
            lower_threshold: 2,
            upper_threshold: 8,
            ..Settings::default()
        };

        assert_eq!(settings.lower_bound(), 20);
        assert_eq!(settings.upper_bound(), 80);
    }

    #[test]
    fn settings_are_read_from_stored_json() {
        let json = r#"{
            "LowerThreshold": 1,
            "UpperThreshold": 12,
            "DurationRange": 10,
            "EvaluationWindow": 120,
            "WindowsThreshold": 2,
            "CalibrationFactor": 1.25
        }"#;

        let settings: Settings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.upper_threshold, 12);
        assert_eq!(settings.evaluation_window, 120);
        assert_eq!(settings.calibration_factor, 1.25);
    }

    #[test]
    fn cadence_selects_ticks() {
        let cadence = TickCadence {
            evaluate_every: 1,
            log_every: 5,
        };

        assert_eq!(cadence.at(1), (true, false));
        assert_eq!(cadence.at(5), (true, true));
        assert_eq!(cadence.at(10), (true, true));
        assert_eq!(cadence.at(11), (true, false));
    }

    #[test]
    fn zero_cadence_disables_step() {
        let cadence = TickCadence {
            evaluate_every: 0,
            log_every: 1,
        };

        assert_eq!(cadence.at(3), (false, true));
    }

    #[test]
    fn hardware_defaults_describe_the_cup_sensor() {
        let hardware = HardwareConfig::default();

        assert!(hardware.pulses_per_revolution > 0);
        assert!(hardware.distance_per_revolution > 0.0);
        assert!(hardware.sample_interval_ms > 0);
    }
}
