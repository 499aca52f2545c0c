use scheduler::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("processor is already configured")]
    AlreadyConfigured,

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}
