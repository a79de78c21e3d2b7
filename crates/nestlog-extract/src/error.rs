use thiserror::Error;

/// Transcript input rejected before tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("transcript is not valid UTF-8 (valid up to byte {valid_up_to})")]
    NotUtf8 { valid_up_to: usize },

    #[error("transcript is empty")]
    Empty,

    #[error("transcript has {len} non-whitespace characters, need at least {min}")]
    TooShort { len: usize, min: usize },
}
