use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Failed to load configuration")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Reader(#[from] pulse_common::Error),

    #[error("Failed to write output")]
    Output(#[from] std::io::Error),

    #[error("Reader task failed")]
    Task(#[from] tokio::task::JoinError),
}
