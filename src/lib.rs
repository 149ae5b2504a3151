pub mod audio;
pub mod audio_output;
pub mod commands;
pub mod config;
pub mod error;
pub mod player;

pub use audio::catalog::{SoundCategory, SoundInfo, SoundType};
pub use audio::server::SoundServer;
pub use config::{EngineConfig, StopPolicy};
pub use error::{ConfigError, DeviceError};
pub use player::{FocusNoisePlayer, PlaybackState};
