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

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AlarmState {
    #[default]
    Armed,
    Signaled,
}

/// Edge detector over the number of exceeded ranges. Fires once when the
/// count reaches the threshold and re-arms only after an evaluation
/// below the threshold.
#[derive(Debug, Default)]
pub struct AlarmLatch {
    state: AlarmState,
}

impl AlarmLatch {
    pub const fn new() -> Self {
        Self {
            state: AlarmState::Armed,
        }
    }

    /// Returns `true` if this evaluation starts a new episode.
    pub fn update(&mut self, exceeded_ranges: usize, windows_threshold: u16) -> bool {
        let breached = exceeded_ranges >= usize::from(windows_threshold);

        match (self.state, breached) {
            (AlarmState::Armed, true) => {
                self.state = AlarmState::Signaled;
                true
            }
            (AlarmState::Signaled, false) => {
                self.state = AlarmState::Armed;
                false
            }
            _ => false,
        }
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }
}
