//! Per-context GPU object API.
//!
//! A [`GlContext`] is one live rendering context with its own object
//! namespace. Everything above this crate talks to GPUs only through that
//! trait, so the same code runs against a real OpenGL context
//! ([`native::NativeGlContext`]) or the in-memory [`soft::SoftContext`].

pub mod bytes;
pub mod context;
pub mod native;
pub mod soft;

pub use bytes::AsBytes;
pub use context::{
    BufferKind, BufferUsage, ContextId, DrawCall, GlContext, ProgramSource, TextureDesc, Uniform,
    Vertex, WrapMode, QUAD_INDICES, VERTEX_STRIDE,
};
pub use native::NativeGlContext;
pub use soft::{Fragment, SoftContext};
