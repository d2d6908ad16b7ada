pub mod alarm;
pub mod anemometer;
pub mod configuration;
pub mod data_processing;
pub mod errors;
pub mod report;
pub mod sdmmc;
pub mod snapshot;
pub mod state;
pub mod utils;

pub use alarm::AlarmState;
pub use anemometer::PulseCounter;
pub use configuration::{HardwareConfig, Settings};
pub use data_processing::{EvaluationResult, ExceededRange, HistoryBuffer, WindStatistics};
pub use report::PowerStatus;
pub use sdmmc::{SdCard, Storage};
pub use state::WindSpeed;
