//! Error taxonomy for GPU-facing operations.
//!
//! Contract violations (using an unconfigured filter, missing framebuffer)
//! are not represented here; they panic at the call site.

use thiserror::Error;

use crate::geom::IntPoint;

pub type GlResult<T> = Result<T, GlError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GlError {
    /// A driver call reported failure. `op` names the failing call site.
    #[error("{op} failed: {detail}")]
    Operation { op: String, detail: String },

    #[error("unknown texture {0}")]
    UnknownTexture(u32),

    #[error("unknown buffer {0}")]
    UnknownBuffer(u32),

    #[error("unknown framebuffer {0}")]
    UnknownFramebuffer(u32),

    #[error("unknown program {0}")]
    UnknownProgram(u32),

    #[error("{op}: expected size {expected:?}, got {actual:?}")]
    SizeMismatch {
        op: &'static str,
        expected: IntPoint,
        actual: IntPoint,
    },

    #[error("bitmap data is {actual} bytes, expected {expected}")]
    InvalidBitmap { expected: usize, actual: usize },

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl GlError {
    pub fn operation(op: impl Into<String>, detail: impl Into<String>) -> Self {
        GlError::Operation {
            op: op.into(),
            detail: detail.into(),
        }
    }

    /// Name of the failing operation, if the error came from a driver call.
    pub fn op(&self) -> Option<&str> {
        match self {
            GlError::Operation { op, .. } => Some(op.as_str()),
            GlError::SizeMismatch { op, .. } => Some(*op),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_errors_carry_their_call_site() {
        let err = GlError::operation("MapBuffer()", "GL_OUT_OF_MEMORY");
        assert_eq!(err.op(), Some("MapBuffer()"));
        assert_eq!(err.to_string(), "MapBuffer() failed: GL_OUT_OF_MEMORY");
    }
}
