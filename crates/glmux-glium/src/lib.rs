//! Adopt a GL context owned by a host application.
//!
//! [`HostGl`] loads GL entry points, wraps the host's current context in a
//! glium [`Context`] to query its capabilities and picks the GLSL dialect
//! the filter shaders are compiled with.
//!
//! ### Warning
//!
//! The host must keep its context current on the calling thread for as long
//! as a [`HostGl`] is in use.

use std::rc::Rc;

use anyhow::{Context as _, Result};
use glium::backend::Context;
use glium::CapabilitiesSource;
use glmux_core::GlslVersion;
use tracing::debug;

mod gl_backend;
pub mod glsl;
pub mod validate_gl;

pub use gl_backend::load_gl;
pub use glsl::best_glsl_version;

use gl_backend::HostBackend;

pub struct HostGl {
    pub ctx: Rc<Context>,
    backend: Rc<HostBackend>,
    glsl: GlslVersion,
}

impl std::fmt::Debug for HostGl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostGl").field("glsl", &self.glsl).finish()
    }
}

impl HostGl {
    /// Wrap the context current on this thread. `size` is the host's
    /// default framebuffer size.
    ///
    /// # Safety
    ///
    /// A GL context must be current on the calling thread and stay current
    /// whenever this value is used.
    pub unsafe fn adopt(size: (u32, u32)) -> Result<Self> {
        let backend = Rc::new(HostBackend::new(size));
        debug!("BACKEND: {backend:?}");

        let ctx = Context::new(
            backend.clone(),
            false,
            glium::debug::DebugCallbackBehavior::Ignore,
        )
        .context("host GL context is not usable by glium")?;

        debug!(
            versions = ?ctx.get_capabilities().supported_glsl_versions,
            "OPENGL_VERSION {}",
            ctx.get_opengl_version_string()
        );

        let glsl = best_glsl_version(&*ctx)
            .context("host GL context supports neither GLSL 1.40 nor 1.20")?;

        Ok(Self { ctx, backend, glsl })
    }

    pub fn glsl_version(&self) -> GlslVersion {
        self.glsl
    }

    pub fn size(&self) -> (u32, u32) {
        self.backend.size()
    }

    /// Record a new size for the host's default framebuffer.
    pub fn resize(&self, size: (u32, u32)) {
        glium::backend::Backend::resize(&*self.backend, size);
    }

    pub fn opengl_version(&self) -> String {
        self.ctx.get_opengl_version_string().to_owned()
    }

    /// Resynchronise glium's state cache after the host or another GL user
    /// changed bindings behind its back.
    ///
    /// # Safety
    ///
    /// Same requirements as [`HostGl::adopt`].
    pub unsafe fn rebuild(&self) -> Result<()> {
        self.ctx
            .rebuild(self.backend.clone())
            .context("failed to rebuild glium context")
    }
}
