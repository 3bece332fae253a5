//! Error types shared by the controller and the front-ends.

use thiserror::Error;

/// Why a renderer instance could not reach `running`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("container element not found")]
    MissingContainer,
    #[error("container has zero layout size")]
    EmptyContainer,
    #[error("graphics unsupported: {0}")]
    Unsupported(String),
    #[error("shader compile/link failed: {0}")]
    ShaderCompile(String),
    #[error("renderer already initialized")]
    AlreadyInitialized,
    #[error("renderer disposed")]
    Disposed,
}

/// Outcome of a single draw call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("graphics context lost")]
    Lost,
    #[error("surface outdated")]
    Outdated,
    #[error("timed out acquiring frame")]
    Timeout,
    #[error("out of memory")]
    OutOfMemory,
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("noise image must be non-empty, got {width}x{height}")]
    Dimensions { width: u32, height: u32 },
    #[error("expected {expected} bytes of RGBA data, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("decode failed: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum UniformError {
    #[error("resolution must be positive, got {0}x{1}")]
    InvalidResolution(f32, f32),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid options: {0}")]
    Parse(#[from] serde_json::Error),
}
