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

use crate::configuration::HardwareConfig;
use crate::data_processing::SpeedSample;
use std::sync::atomic::{AtomicU64, Ordering};

/// Pulse counter fed by the sensor interrupt.
///
/// The interrupt handler is the only writer, the sampling loop the only
/// reader. The counter is 64 bit wide so it does not overflow during the
/// lifetime of a device; wrap-around is not handled.
#[derive(Debug, Default)]
pub struct PulseCounter {
    count: AtomicU64,
}

impl PulseCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    /// Called from the rising edge interrupt of the sensor pin.
    #[inline(always)]
    pub fn count_pulse(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pulse_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Turns pulse count deltas into calibrated speed values.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpeedSampler {
    pulses_per_revolution: u32,
    distance_per_revolution: f32,
    interval_ms: u32,
    last_count: u64,
}

impl SpeedSampler {
    pub fn new(hardware: &HardwareConfig) -> Self {
        Self {
            pulses_per_revolution: hardware.pulses_per_revolution,
            distance_per_revolution: hardware.distance_per_revolution,
            interval_ms: hardware.sample_interval_ms,
            last_count: 0,
        }
    }

    /// Speed for `delta_pulses` counted during one sampling interval.
    /// Never negative.
    pub fn speed(&self, delta_pulses: u64, calibration_factor: f32) -> f32 {
        if self.pulses_per_revolution == 0 || self.interval_ms == 0 {
            return 0.0;
        }

        let revolutions = delta_pulses as f32 / self.pulses_per_revolution as f32;
        let speed = revolutions
            * self.distance_per_revolution
            * (1000.0 / self.interval_ms as f32)
            * calibration_factor;

        speed.max(0.0)
    }

    /// Takes the current counter value and returns the speed since the
    /// previous call. A counter reading below the previous one counts as
    /// zero pulses.
    pub fn sample(&mut self, pulse_count: u64, calibration_factor: f32) -> f32 {
        let delta = pulse_count.saturating_sub(self.last_count);
        self.last_count = pulse_count;
        self.speed(delta, calibration_factor)
    }
}

/// Speed in tenths of a unit, truncated.
#[inline(always)]
pub fn quantize(speed: f32) -> SpeedSample {
    (speed * 10.0) as SpeedSample
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler() -> SpeedSampler {
        SpeedSampler::new(&HardwareConfig {
            sensor_pin: 19,
            pulses_per_revolution: 20,
            distance_per_revolution: 1.75,
            sample_interval_ms: 1000,
            speed_unit: "m/s",
        })
    }

    #[test]
    fn zero_pulses_is_zero_speed() {
        assert_eq!(sampler().speed(0, 1.0), 0.0);
    }

    #[test]
    fn one_revolution_per_second() {
        let speed = sampler().speed(20, 1.0);

        assert!((speed - 1.75).abs() < 1e-6);
        assert_eq!(quantize(speed), 17);
    }

    #[test]
    fn speed_is_monotonic_and_non_negative() {
        let sampler = sampler();
        let mut previous = 0.0;

        for delta in 0..5000 {
            let speed = sampler.speed(delta, 1.3);
            assert!(speed >= 0.0);
            assert!(speed >= previous);
            previous = speed;
        }
    }

    #[test]
    fn calibration_factor_scales_speed() {
        let sampler = sampler();

        let raw = sampler.speed(40, 1.0);
        let calibrated = sampler.speed(40, 2.0);

        assert!((calibrated - 2.0 * raw).abs() < 1e-6);
        assert_eq!(sampler.speed(40, -1.0), 0.0);
    }

    #[test]
    fn sample_uses_delta_since_last_tick() {
        let counter = PulseCounter::new();
        let mut sampler = sampler();

        for _ in 0..40 {
            counter.count_pulse();
        }
        assert_eq!(quantize(sampler.sample(counter.pulse_count(), 1.0)), 35);

        for _ in 0..20 {
            counter.count_pulse();
        }
        assert_eq!(quantize(sampler.sample(counter.pulse_count(), 1.0)), 17);
        assert_eq!(sampler.sample(counter.pulse_count(), 1.0), 0.0);
    }

    #[test]
    fn counter_going_backwards_reads_as_calm() {
        let mut sampler = sampler();
        sampler.sample(100, 1.0);

        assert_eq!(sampler.sample(10, 1.0), 0.0);
    }

    #[test]
    fn quantize_truncates() {
        assert_eq!(quantize(12.39), 123);
        assert_eq!(quantize(0.0), 0);
    }
}
