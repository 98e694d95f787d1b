//! Running filters inside a host application's GL context.

use anyhow::{Context as _, Result};
use glmux_context::{ContextId, GlContext, NativeGlContext};
use glmux_glium::validate_gl::reset_gl_state;
use glmux_glium::HostGl;
use tracing::debug;

/// The host's current GL context, adopted both for capability queries and
/// as a [`GlContext`].
#[derive(Debug)]
pub struct HostContext {
    host: HostGl,
    gl: NativeGlContext,
}

impl HostContext {
    /// Adopt the context current on this thread. Installs the default log
    /// subscriber unless one already exists.
    ///
    /// # Safety
    ///
    /// A GL context must be current on the calling thread and stay current
    /// whenever the returned value is used.
    pub unsafe fn adopt(size: (u32, u32)) -> Result<Self> {
        glmux_core::log::init_default();
        let host = HostGl::adopt(size)?;
        let gl = NativeGlContext::adopt_current(host.glsl_version())
            .context("failed to adopt the host GL context")?;
        debug!(id = %gl.id(), version = %host.opengl_version(), "host context ready");
        Ok(Self { host, gl })
    }

    pub fn id(&self) -> ContextId {
        self.gl.id()
    }

    pub fn host(&self) -> &HostGl {
        &self.host
    }

    pub fn gl(&mut self) -> &mut NativeGlContext {
        &mut self.gl
    }

    /// Put the host's bindings back into a known state after rendering
    /// into `host_fbo`.
    ///
    /// # Safety
    ///
    /// Same requirements as [`HostContext::adopt`].
    pub unsafe fn reset_host_state(&self, host_fbo: u32) -> Result<()> {
        reset_gl_state(host_fbo);
        self.host.rebuild()
    }

    /// Delete helper objects. Call while the context is still current.
    pub fn release(mut self) {
        self.gl.release();
    }
}
