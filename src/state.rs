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

use crate::alarm::{AlarmLatch, AlarmState};
use crate::anemometer::{quantize, PulseCounter, SpeedSampler};
use crate::configuration::{HardwareConfig, Settings};
use crate::data_processing::*;
use crate::report::{self, PowerStatus};
use crate::sdmmc::Storage;
use crate::snapshot::SnapshotWriter;
use crate::utils::datetime::{Clock, SystemClock};
use log::*;
use std::sync::Arc;

type AlarmCallback = Box<dyn FnMut() + Send>;

/// The windspeed engine. Owned by the main loop and advanced once per
/// sampling interval through [`WindSpeed::calculate_windspeed`].
pub struct WindSpeed<S, C = SystemClock, const N: usize = DEFAULT_HISTORY_LEN> {
    pulse_counter: Arc<PulseCounter>,
    sampler: SpeedSampler,
    history: HistoryBuffer<N>,
    evaluation: EvaluationResult,
    latch: AlarmLatch,
    settings: Settings,
    power: Option<PowerStatus>,
    unit: &'static str,
    alarm_callback: Option<AlarmCallback>,
    writer: SnapshotWriter<S, C>,
}

impl<S: Storage, C: Clock, const N: usize> WindSpeed<S, C, N> {
    pub fn new(hardware: &HardwareConfig, settings: Settings, storage: S, clock: C) -> Self {
        let mut writer = SnapshotWriter::new(
            storage,
            clock,
            hardware.speed_unit,
            hardware.sample_interval_ms,
        );
        writer.prepare();

        WindSpeed {
            pulse_counter: Arc::new(PulseCounter::new()),
            sampler: SpeedSampler::new(hardware),
            history: HistoryBuffer::new(),
            evaluation: EvaluationResult::default(),
            latch: AlarmLatch::new(),
            settings,
            power: None,
            unit: hardware.speed_unit,
            alarm_callback: None,
            writer,
        }
    }

    /// Counter to be incremented from the sensor interrupt, e.g.
    /// `pin.subscribe(move || counter.count_pulse())`.
    pub fn pulse_counter(&self) -> Arc<PulseCounter> {
        Arc::clone(&self.pulse_counter)
    }

    /// Called once for every new episode of sustained out-of-band wind.
    pub fn set_alarm_callback(&mut self, callback: impl FnMut() + Send + 'static) {
        self.alarm_callback = Some(Box::new(callback));
    }

    /// Takes a new sample. Evaluates the history and raises the alarm if
    /// `evaluate` is set, appends to the continuous log if `log` is set.
    /// Returns the calibrated speed of the new sample.
    pub fn calculate_windspeed(&mut self, evaluate: bool, log: bool) -> f32 {
        let speed = self.sampler.sample(
            self.pulse_counter.pulse_count(),
            self.settings.calibration_factor,
        );
        self.history.push(quantize(speed));

        if evaluate {
            self.evaluate_windspeed();
        }
        if log {
            let current = self.current_windspeed();
            self.writer.log_sample(current, self.power);
        }

        speed
    }

    fn evaluate_windspeed(&mut self) {
        self.evaluation = evaluate(&self.history, &self.settings);

        let exceeded = self.evaluation.number_of_exceeded_ranges();
        if !self.latch.update(exceeded, self.settings.windows_threshold) {
            return;
        }

        info!(
            "wind alarm: {} exceeded ranges (threshold {})",
            exceeded, self.settings.windows_threshold
        );
        if let Some(callback) = self.alarm_callback.as_mut() {
            callback();
        }

        let current = self.current_windspeed();
        self.writer
            .write_snapshot(&self.history, self.window(), current, &self.evaluation);
    }

    /// Replaces the settings, effective with the next tick.
    pub fn update_settings(&mut self, settings: Settings) {
        info!("settings updated: {:?}", settings);
        self.settings = settings;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Battery state written into the following log rows.
    pub fn update_power_status(&mut self, power: PowerStatus) {
        self.power = Some(power);
    }

    pub fn current_windspeed(&self) -> f32 {
        self.history.current_speed()
    }

    pub fn windspeed_evaluation(&self) -> &EvaluationResult {
        &self.evaluation
    }

    /// Quantized sample `index` ticks back.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below the history capacity.
    pub fn history_element(&self, index: usize) -> SpeedSample {
        self.history.get(index)
    }

    pub fn history(&self) -> &HistoryBuffer<N> {
        &self.history
    }

    pub fn alarm_state(&self) -> AlarmState {
        self.latch.state()
    }

    pub fn windspeed_json(&self) -> Result<String, serde_json::Error> {
        report::speed_json(&self.history, self.window())
    }

    pub fn windspeed_evaluation_json(&self) -> Result<String, serde_json::Error> {
        report::evaluation_json(self.current_windspeed(), &self.evaluation)
    }

    pub fn windspeed_string(&self, add_unit_symbol: bool) -> String {
        let unit = if add_unit_symbol { Some(self.unit) } else { None };
        report::speed_string(self.current_windspeed(), unit)
    }

    pub fn windspeed_evaluation_string(&self) -> String {
        report::evaluation_summary(&self.evaluation)
    }

    pub fn storage(&self) -> &S {
        self.writer.storage()
    }

    pub fn clock_mut(&mut self) -> &mut C {
        self.writer.clock_mut()
    }

    fn window(&self) -> usize {
        usize::from(self.settings.evaluation_window).min(N)
    }
}
