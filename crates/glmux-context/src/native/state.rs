//! Host GL state preservation and error checks.

use gl::types::{GLenum, GLint, GLuint};
use glmux_core::{GlError, GlResult};

use super::format::error_name;

/// Bindings that this backend touches, captured so the host's state can be
/// put back afterwards.
pub(crate) struct SavedGlState {
    pack_buffer: GLint,
    unpack_buffer: GLint,
    array_buffer: GLint,
    draw_framebuffer: GLint,
    read_framebuffer: GLint,
    texture_2d: GLint,
    active_texture: GLint,
    program: GLint,
    vao: GLint,
}

impl SavedGlState {
    /// # Safety
    ///
    /// A GL context must be current on the calling thread.
    pub unsafe fn save() -> Self {
        let mut s = Self {
            pack_buffer: 0,
            unpack_buffer: 0,
            array_buffer: 0,
            draw_framebuffer: 0,
            read_framebuffer: 0,
            texture_2d: 0,
            active_texture: 0,
            program: 0,
            vao: 0,
        };
        gl::GetIntegerv(gl::PIXEL_PACK_BUFFER_BINDING, &mut s.pack_buffer);
        gl::GetIntegerv(gl::PIXEL_UNPACK_BUFFER_BINDING, &mut s.unpack_buffer);
        gl::GetIntegerv(gl::ARRAY_BUFFER_BINDING, &mut s.array_buffer);
        gl::GetIntegerv(gl::DRAW_FRAMEBUFFER_BINDING, &mut s.draw_framebuffer);
        gl::GetIntegerv(gl::READ_FRAMEBUFFER_BINDING, &mut s.read_framebuffer);
        gl::GetIntegerv(gl::TEXTURE_BINDING_2D, &mut s.texture_2d);
        gl::GetIntegerv(gl::ACTIVE_TEXTURE, &mut s.active_texture);
        gl::GetIntegerv(gl::CURRENT_PROGRAM, &mut s.program);
        gl::GetIntegerv(gl::VERTEX_ARRAY_BINDING, &mut s.vao);
        s
    }

    /// # Safety
    ///
    /// Same context as [`SavedGlState::save`].
    pub unsafe fn restore(&self) {
        gl::BindBuffer(gl::PIXEL_PACK_BUFFER, self.pack_buffer as GLuint);
        gl::BindBuffer(gl::PIXEL_UNPACK_BUFFER, self.unpack_buffer as GLuint);
        gl::BindBuffer(gl::ARRAY_BUFFER, self.array_buffer as GLuint);
        gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, self.draw_framebuffer as GLuint);
        gl::BindFramebuffer(gl::READ_FRAMEBUFFER, self.read_framebuffer as GLuint);
        gl::ActiveTexture(self.active_texture as GLenum);
        gl::BindTexture(gl::TEXTURE_2D, self.texture_2d as GLuint);
        gl::UseProgram(self.program as GLuint);
        gl::BindVertexArray(self.vao as GLuint);
    }
}

pub(crate) fn clear_gl_errors() {
    unsafe { while gl::GetError() != gl::NO_ERROR {} }
}

/// Turn any pending GL error into [`GlError::Operation`] naming `op`.
pub(crate) fn check_gl(op: &str) -> GlResult<()> {
    let err = unsafe { gl::GetError() };
    if err == gl::NO_ERROR {
        return Ok(());
    }
    clear_gl_errors();
    Err(GlError::operation(op, error_name(err)))
}

pub(crate) fn is_context_current() -> bool {
    unsafe { !gl::GetString(gl::VERSION).is_null() }
}
