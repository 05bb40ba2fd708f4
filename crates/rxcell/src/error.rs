use thiserror::Error;

pub type Result<T> = std::result::Result<T, PropertyError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    /// The source handed to a synchronous-capture constructor returned from
    /// `subscribe` without delivering any value.
    #[error("source observable did not emit a value synchronously on subscription")]
    NoSynchronousValue,
}
