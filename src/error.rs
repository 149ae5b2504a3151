use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no output device available")]
    NoDevice,

    #[error("output device does not support {channels} channel(s) at {sample_rate} Hz")]
    UnsupportedConfig { sample_rate: u32, channels: u16 },

    #[error("failed to query device configs: {0}")]
    Configs(#[from] cpal::SupportedStreamConfigsError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("output device was released")]
    Disconnected,

    #[error("output device failed: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
