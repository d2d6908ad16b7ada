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

use crate::errors::PersistError;
use log::{debug, info, warn};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Minimal file system surface the engine needs from its storage medium.
/// Paths are relative to the root of the medium. Mounting and unmounting
/// is done by whoever owns the medium.
pub trait Storage {
    fn is_mounted(&self) -> bool;

    fn exists(&self, path: &str) -> bool;

    fn create_dir(&mut self, path: &str) -> Result<(), PersistError>;

    /// Appends `data`, creating the file if needed.
    fn append(&mut self, path: &str, data: &str) -> Result<(), PersistError>;

    /// Replaces the file content with `data`.
    fn write(&mut self, path: &str, data: &str) -> Result<(), PersistError>;
}

/// SD card mounted into the file system (ESP-IDF VFS or a plain
/// directory on a host).
pub struct SdCard {
    root: PathBuf,
    mounted: bool,
}

impl SdCard {
    pub fn mount(mount_point: impl Into<PathBuf>) -> Self {
        let root = mount_point.into();
        let mounted = root.is_dir();

        if mounted {
            info!("SD card mounted at {}", root.display());
        } else {
            warn!("Card Mount Failed: {} not available", root.display());
        }

        SdCard { root, mounted }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, PersistError> {
        if !self.mounted {
            return Err(PersistError::NotMounted);
        }
        Ok(self.root.join(path.trim_start_matches('/')))
    }
}

impl Storage for SdCard {
    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn create_dir(&mut self, path: &str) -> Result<(), PersistError> {
        let dir = self.resolve(path)?;
        debug!("creating dir {}", dir.display());
        fs::create_dir_all(dir).map_err(PersistError::CreateDirFailed)
    }

    fn append(&mut self, path: &str, data: &str) -> Result<(), PersistError> {
        let file = self.resolve(path)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .map_err(PersistError::OpenFailed)?;

        let bytes = data.as_bytes();
        f.write_all(bytes).map_err(PersistError::WriteFailed)
    }

    fn write(&mut self, path: &str, data: &str) -> Result<(), PersistError> {
        let file = self.resolve(path)?;
        debug!("writing file {}", file.display());
        let mut f = fs::File::create(file).map_err(PersistError::OpenFailed)?;

        let bytes = data.as_bytes();
        f.write_all(bytes).map_err(PersistError::WriteFailed)
    }
}
