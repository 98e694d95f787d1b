//! The [`GlContext`] trait and the descriptors that cross it.

use std::sync::atomic::{AtomicU64, Ordering};

use glmux_core::{next_power_of_two, Bitmap, GlResult, GlslVersion, IntPoint, IntRect, PixelFormat};

use crate::bytes::AsBytes;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a rendering context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    pub fn next() -> Self {
        ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    /// Samples outside the texture read transparent black.
    ClampToBorder,
    Repeat,
    MirroredRepeat,
}

/// Creation parameters of a texture. Every physical texture realised for a
/// logical handle is created from the same descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureDesc {
    pub size: IntPoint,
    pub format: PixelFormat,
    pub mipmap: bool,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    /// Pad the allocation to power-of-two dimensions.
    pub force_pot: bool,
    /// Colour of the padding area when `force_pot` enlarges the texture.
    pub pot_border_color: [f32; 4],
}

impl TextureDesc {
    pub fn new(size: IntPoint, format: PixelFormat) -> Self {
        Self {
            size,
            format,
            mipmap: false,
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::ClampToEdge,
            force_pot: false,
            pot_border_color: [0.0; 4],
        }
    }

    pub fn with_wrap(mut self, wrap_s: WrapMode, wrap_t: WrapMode) -> Self {
        self.wrap_s = wrap_s;
        self.wrap_t = wrap_t;
        self
    }

    pub fn with_mipmap(mut self, mipmap: bool) -> Self {
        self.mipmap = mipmap;
        self
    }

    pub fn with_pot(mut self, border_color: [f32; 4]) -> Self {
        self.force_pot = true;
        self.pot_border_color = border_color;
        self
    }

    /// Size actually allocated on the GPU.
    pub fn gl_size(&self) -> IntPoint {
        if self.force_pot {
            IntPoint::new(next_power_of_two(self.size.x), next_power_of_two(self.size.y))
        } else {
            self.size
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    /// Staging buffer for CPU to texture transfers.
    PixelUnpack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    #[default]
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

/// Shader program source. `name` identifies the program to backends that
/// cannot compile GLSL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSource {
    pub name: String,
    pub vertex: String,
    pub fragment: String,
}

impl ProgramSource {
    pub fn new(name: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Vertex source prefixed with the dialect preamble.
    pub fn vertex_for(&self, version: GlslVersion) -> String {
        format!("{}{}", version.vertex_header(), self.vertex)
    }

    pub fn fragment_for(&self, version: GlslVersion) -> String {
        format!("{}{}", version.fragment_header(), self.fragment)
    }
}

/// Uniform values a draw can set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    /// Column-major.
    Mat4([f32; 16]),
}

/// Vertex layout used by every draw: position then texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub tex_coord: [f32; 2],
}

unsafe impl AsBytes for Vertex {}

pub const VERTEX_STRIDE: usize = std::mem::size_of::<Vertex>();

/// Two triangles over vertices ordered top-left, top-right, bottom-right,
/// bottom-left.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Indexed triangle draw into the bound framebuffer's first colour
/// attachment, clipped to the viewport. Sampler `i` is bound to texture unit
/// `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: u32,
    pub vertex_buffer: u32,
    pub index_buffer: u32,
    pub index_count: usize,
    /// Column-major model-view-projection applied to vertex positions.
    pub transform: [f32; 16],
    pub samplers: Vec<(String, u32)>,
    pub uniforms: Vec<(String, Uniform)>,
}

impl DrawCall {
    pub fn new(program: u32, vertex_buffer: u32, index_buffer: u32, index_count: usize) -> Self {
        Self {
            program,
            vertex_buffer,
            index_buffer,
            index_count,
            transform: IDENTITY,
            samplers: Vec::new(),
            uniforms: Vec::new(),
        }
    }

    pub fn transform(mut self, transform: [f32; 16]) -> Self {
        self.transform = transform;
        self
    }

    pub fn sampler(mut self, name: impl Into<String>, texture: u32) -> Self {
        self.samplers.push((name.into(), texture));
        self
    }

    pub fn uniform(mut self, name: impl Into<String>, value: Uniform) -> Self {
        self.uniforms.push((name.into(), value));
        self
    }
}

pub const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// One live rendering context.
///
/// Object ids are only meaningful within the context that created them.
/// Implementations are driven from the thread that owns the context.
pub trait GlContext {
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    fn id(&self) -> ContextId;

    fn glsl_version(&self) -> GlslVersion;

    fn create_texture(&mut self, desc: &TextureDesc) -> GlResult<u32>;

    /// Replace the texture's top-left `bitmap.size()` region with `bitmap`,
    /// converting formats as needed.
    fn upload_texture(&mut self, texture: u32, bitmap: &Bitmap) -> GlResult<()>;

    fn delete_texture(&mut self, texture: u32) -> GlResult<()>;

    fn texture_desc(&self, texture: u32) -> GlResult<TextureDesc>;

    fn is_texture(&self, texture: u32) -> bool;

    fn create_buffer(&mut self, kind: BufferKind, usage: BufferUsage, size: usize) -> GlResult<u32>;

    /// Map the buffer, copy `data` at `offset` and unmap it.
    fn write_buffer(&mut self, buffer: u32, offset: usize, data: &[u8]) -> GlResult<()>;

    fn delete_buffer(&mut self, buffer: u32) -> GlResult<()>;

    fn is_buffer(&self, buffer: u32) -> bool;

    /// Transfer `size` pixels of `format` from the start of a pixel-unpack
    /// buffer into the texture's top-left corner.
    fn buffer_to_texture(
        &mut self,
        buffer: u32,
        texture: u32,
        size: IntPoint,
        format: PixelFormat,
    ) -> GlResult<()>;

    /// Framebuffer with `attachments[i]` bound as colour attachment `i`.
    fn create_framebuffer(&mut self, attachments: &[u32]) -> GlResult<u32>;

    /// Bind a framebuffer as the draw target; `None` restores the host's.
    fn bind_framebuffer(&mut self, framebuffer: Option<u32>) -> GlResult<()>;

    fn delete_framebuffer(&mut self, framebuffer: u32) -> GlResult<()>;

    /// Read `rect` of colour attachment `attachment` as `format`.
    fn read_pixels(
        &mut self,
        framebuffer: u32,
        attachment: usize,
        rect: IntRect,
        format: PixelFormat,
    ) -> GlResult<Bitmap>;

    /// Copy the top-left `size` pixels of a colour attachment into `texture`.
    fn copy_texture(
        &mut self,
        framebuffer: u32,
        attachment: usize,
        texture: u32,
        size: IntPoint,
    ) -> GlResult<()>;

    fn set_viewport(&mut self, rect: IntRect);

    fn compile_program(&mut self, source: &ProgramSource) -> GlResult<u32>;

    fn delete_program(&mut self, program: u32) -> GlResult<()>;

    fn draw(&mut self, call: &DrawCall) -> GlResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn context_ids_are_unique() {
        let a = ContextId::next();
        let b = ContextId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn pot_textures_pad_their_allocation() {
        let desc = TextureDesc::new(IntPoint::new(5, 17), PixelFormat::R8G8B8A8);
        assert_eq!(desc.gl_size(), IntPoint::new(5, 17));
        assert_eq!(desc.with_pot([0.0; 4]).gl_size(), IntPoint::new(8, 32));
    }

    #[test]
    fn vertices_are_tightly_packed() {
        assert_eq!(VERTEX_STRIDE, 20);
    }
}
