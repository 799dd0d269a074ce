use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("state lock poisoned")]
    StateLock,
}
