/// Convenience result type used across fbfsvg.
pub type FbfResult<T> = Result<T, FbfError>;

/// Top-level error taxonomy used by player APIs.
///
/// Malformed markup never surfaces here: numeric and geometry parse failures degrade locally
/// (a `0.0` value, a target without bounds) and only empty or unreadable input is a load error.
#[derive(thiserror::Error, Debug)]
pub enum FbfError {
    /// SVG input could not be loaded (empty content, unreadable file).
    #[error("load error: {0}")]
    Load(String),

    /// Invalid player, tracker or renderer configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Errors while parsing a frame for rasterization or allocating render targets.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FbfError {
    /// Build a [`FbfError::Load`] value.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build a [`FbfError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`FbfError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`FbfError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for FbfError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
