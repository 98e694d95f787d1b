//! Pixel format to GL enum mapping.

use gl::types::{GLenum, GLint};
use glmux_core::PixelFormat;

use crate::context::WrapMode;

/// How a pixel format is stored and transferred.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GlFormat {
    pub internal: GLint,
    pub format: GLenum,
    pub ty: GLenum,
    /// Channel swizzle for single-channel formats.
    pub swizzle: Option<[GLenum; 4]>,
}

pub(crate) fn gl_format(pf: PixelFormat) -> GlFormat {
    let plain = |internal: GLenum, format: GLenum, ty: GLenum| GlFormat {
        internal: internal as GLint,
        format,
        ty,
        swizzle: None,
    };
    match pf {
        PixelFormat::B8G8R8A8 | PixelFormat::B8G8R8X8 => plain(gl::RGBA8, gl::BGRA, gl::UNSIGNED_BYTE),
        PixelFormat::R8G8B8A8 | PixelFormat::R8G8B8X8 => plain(gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
        PixelFormat::B8G8R8 => plain(gl::RGB8, gl::BGR, gl::UNSIGNED_BYTE),
        PixelFormat::R8G8B8 => plain(gl::RGB8, gl::RGB, gl::UNSIGNED_BYTE),
        PixelFormat::I8 => GlFormat {
            swizzle: Some([gl::RED, gl::RED, gl::RED, gl::ONE]),
            ..plain(gl::R8, gl::RED, gl::UNSIGNED_BYTE)
        },
        PixelFormat::A8 => GlFormat {
            swizzle: Some([gl::ZERO, gl::ZERO, gl::ZERO, gl::RED]),
            ..plain(gl::R8, gl::RED, gl::UNSIGNED_BYTE)
        },
        PixelFormat::R32G32B32A32F => plain(gl::RGBA32F, gl::RGBA, gl::FLOAT),
        PixelFormat::I32F => GlFormat {
            swizzle: Some([gl::RED, gl::RED, gl::RED, gl::ONE]),
            ..plain(gl::R32F, gl::RED, gl::FLOAT)
        },
    }
}

pub(crate) fn gl_wrap(mode: WrapMode) -> GLint {
    (match mode {
        WrapMode::ClampToEdge => gl::CLAMP_TO_EDGE,
        WrapMode::ClampToBorder => gl::CLAMP_TO_BORDER,
        WrapMode::Repeat => gl::REPEAT,
        WrapMode::MirroredRepeat => gl::MIRRORED_REPEAT,
    }) as GLint
}

pub(crate) fn error_name(err: GLenum) -> &'static str {
    match err {
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown GL error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_channel_formats_are_swizzled() {
        let grey = gl_format(PixelFormat::I8);
        assert_eq!(grey.internal, gl::R8 as GLint);
        assert_eq!(grey.swizzle, Some([gl::RED, gl::RED, gl::RED, gl::ONE]));
        let alpha = gl_format(PixelFormat::A8);
        assert_eq!(alpha.swizzle, Some([gl::ZERO, gl::ZERO, gl::ZERO, gl::RED]));
        assert_eq!(gl_format(PixelFormat::R32G32B32A32F).ty, gl::FLOAT);
        assert_eq!(gl_format(PixelFormat::B8G8R8X8).format, gl::BGRA);
    }

    #[test]
    fn error_names() {
        assert_eq!(error_name(gl::OUT_OF_MEMORY), "GL_OUT_OF_MEMORY");
        assert_eq!(error_name(0xdead), "unknown GL error");
    }
}
