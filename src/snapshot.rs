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

use crate::data_processing::{EvaluationResult, HistoryBuffer};
use crate::errors::PersistError;
use crate::report::{self, PowerStatus, LINE_ENDING};
use crate::sdmmc::Storage;
use crate::utils::datetime::{self, Clock};
use log::*;

pub const LOG_DIR: &str = "/logs";
pub const SNAPSHOT_DIR: &str = "/snapshots";

/// Persists the continuous speed log and alarm snapshots.
///
/// Persistence is best effort: every failure is logged and dropped, the
/// next tick simply tries again.
pub struct SnapshotWriter<S, C> {
    storage: S,
    clock: C,
    unit: &'static str,
    interval_ms: u32,
}

impl<S: Storage, C: Clock> SnapshotWriter<S, C> {
    pub fn new(storage: S, clock: C, unit: &'static str, interval_ms: u32) -> Self {
        Self {
            storage,
            clock,
            unit,
            interval_ms,
        }
    }

    /// Creates the log directory. Called once after the card got mounted.
    pub fn prepare(&mut self) {
        if !self.storage.is_mounted() {
            warn!("No SD card attached, logging disabled until it is available");
            return;
        }
        if let Err(e) = self.ensure_dir(LOG_DIR) {
            warn!("mkdir {} failed: {}", LOG_DIR, e);
        }
    }

    /// Appends one row to today's log file.
    pub fn log_sample(&mut self, speed: f32, power: Option<PowerStatus>) {
        if let Err(e) = self.try_log_sample(speed, power) {
            warn!("Failed to log wind speed: {}", e);
        }
    }

    /// Writes history and evaluation of an alarm to three files sharing
    /// one time stamped base name. Returns the base name on success.
    pub fn write_snapshot<const N: usize>(
        &mut self,
        history: &HistoryBuffer<N>,
        window: usize,
        current: f32,
        evaluation: &EvaluationResult,
    ) -> Option<String> {
        match self.try_write_snapshot(history, window, current, evaluation) {
            Ok(base) => {
                info!("alarm snapshot written to {}", base);
                Some(base)
            }
            Err(e) => {
                warn!("Failed to write alarm snapshot: {}", e);
                None
            }
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    fn try_log_sample(
        &mut self,
        speed: f32,
        power: Option<PowerStatus>,
    ) -> Result<(), PersistError> {
        let now = self.clock.now();
        let path = log_file_path(now)?;

        if !self.storage.exists(&path) {
            self.ensure_dir(LOG_DIR)?;
            let header = report::log_header(self.unit);
            self.storage.write(&path, &format!("{}{}", header, LINE_ENDING))?;
            info!("created log file {}", path);
        }

        let row = report::log_row(&datetime::timestamp(now)?, speed, power);
        self.storage.append(&path, &format!("{}{}", row, LINE_ENDING))
    }

    fn try_write_snapshot<const N: usize>(
        &mut self,
        history: &HistoryBuffer<N>,
        window: usize,
        current: f32,
        evaluation: &EvaluationResult,
    ) -> Result<String, PersistError> {
        let now = self.clock.now();
        let base = format!("{}/{}_alarm", SNAPSHOT_DIR, datetime::file_stamp(now)?);

        self.ensure_dir(SNAPSHOT_DIR)?;

        let speed = report::speed_json(history, window)?;
        self.write_artifact(&base, "_windspeed.json", &speed)?;

        let evaluation = report::evaluation_json(current, evaluation)?;
        self.write_artifact(&base, "_evaluation.json", &evaluation)?;

        let csv = report::speed_csv(history, window, now, self.interval_ms, self.unit)?;
        self.write_artifact(&base, "_windspeed.csv", &csv)?;

        Ok(base)
    }

    fn write_artifact(&mut self, base: &str, suffix: &str, data: &str) -> Result<(), PersistError> {
        self.storage.write(&format!("{}{}", base, suffix), data)
    }

    fn ensure_dir(&mut self, dir: &str) -> Result<(), PersistError> {
        if self.storage.exists(dir) {
            return Ok(());
        }
        info!("Creating Dir: {}", dir);
        self.storage.create_dir(dir)
    }
}

/// `/logs/2023-04-01_windspeed.csv`
pub fn log_file_path(now: time::OffsetDateTime) -> Result<String, PersistError> {
    Ok(format!("{}/{}_windspeed.csv", LOG_DIR, datetime::date(now)?))
}
