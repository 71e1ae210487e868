/// Crate-wide result alias.
pub type ForgeResult<T> = Result<T, ForgeError>;

/// Errors produced by the compositing core.
///
/// `Decode` and `Encode` are the two kinds the session layer turns into user-visible notices;
/// the rest indicate caller mistakes or internal failures.
#[derive(thiserror::Error, Debug)]
pub enum ForgeError {
    /// Invalid input value (zero-sized surface, quality out of range, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Media bytes could not be read or are in an unsupported format.
    #[error("decode error: {0}")]
    Decode(String),

    /// A surface could not be serialized into an encoded asset.
    #[error("encode error: {0}")]
    Encode(String),

    /// Rasterization failed.
    #[error("render error: {0}")]
    Render(String),

    /// Config or overlay JSON could not be parsed or written.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other failure, usually IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ForgeError {
    /// Build a [`ForgeError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ForgeError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`ForgeError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ForgeError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ForgeError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error is a media decode failure.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Whether this error is an asset encode failure.
    pub fn is_encode(&self) -> bool {
        matches!(self, Self::Encode(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
