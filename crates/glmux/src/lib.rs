//! Multi-context GPU resources and GPU image filters.
//!
//! [`ContextMultiplexer`] queues texture and vertex buffer work once and
//! replays it on every rendering context at [`flush`](ContextMultiplexer::flush).
//! [`GpuFilter`] runs a shader pass over a source image through an
//! off-screen framebuffer; [`BlurFilter`] builds a separable Gaussian blur on
//! top of it.
//!
//! Everything talks to GPUs through [`glmux_context::GlContext`], so the same
//! code runs on a host's OpenGL context ([`HostContext`]) or on the software
//! backend.

pub mod blur;
pub mod fbo;
pub mod filter;
pub mod host;
pub mod multiplexer;
pub mod pbo;
pub mod projection;
pub mod shaders;
pub mod texture;

pub use blur::{register_software_shaders, BlurFilter};
pub use fbo::Framebuffer;
pub use filter::{FilterPass, FilterProgram, GpuFilter};
pub use host::HostContext;
pub use multiplexer::{
    write_vertex_array, ContextIdMap, ContextMultiplexer, FlushError, SharedTexture,
    SharedVertexArray,
};
pub use pbo::PixelBuffer;
pub use projection::ImagingProjection;
pub use texture::GlTexture;

pub use glmux_context::{GlContext, SoftContext};
pub use glmux_core::{
    blur_kernel_radius, compute_kernel, Bitmap, GlError, GlResult, IntPoint, IntRect, PixelFormat,
};
