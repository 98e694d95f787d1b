//! Return the host context to a predictable state.

use gl::types::GLuint;

const TEXTURE_TARGETS: [u32; 2] = [gl::TEXTURE_1D, gl::TEXTURE_2D];

/// Unbind programs, textures, buffers and vertex arrays, disable blending
/// and bind `host_fbo` as the framebuffer.
///
/// # Safety
///
/// A GL context must be current on the calling thread.
pub unsafe fn reset_gl_state(host_fbo: GLuint) {
    gl::UseProgram(0);

    let mut units = 0;
    gl::GetIntegerv(gl::MAX_TEXTURE_IMAGE_UNITS, &mut units);
    for target in TEXTURE_TARGETS {
        for unit in 0..units {
            gl::ActiveTexture(gl::TEXTURE0 + unit as u32);
            gl::BindTexture(target, 0);
        }
    }
    gl::ActiveTexture(gl::TEXTURE0);

    gl::BindBuffer(gl::ARRAY_BUFFER, 0);
    gl::BindBuffer(gl::PIXEL_PACK_BUFFER, 0);
    gl::BindBuffer(gl::PIXEL_UNPACK_BUFFER, 0);
    gl::BindVertexArray(0);
    gl::Disable(gl::BLEND);
    gl::BlendFunc(gl::ONE, gl::ZERO);

    gl::BindFramebuffer(gl::FRAMEBUFFER, host_fbo);
}
