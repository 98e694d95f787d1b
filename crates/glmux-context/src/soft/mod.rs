//! In-memory [`GlContext`].
//!
//! Objects live in hash maps keyed by GL-style names. Draws rasterize the
//! indexed triangles and run a CPU fragment function registered under the
//! program's name, so filters can run (and be tested) without a GPU.

mod raster;
mod sampler;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glmux_core::{Bitmap, GlError, GlResult, GlslVersion, IntPoint, IntRect, PixelFormat};
use tracing::trace;

use crate::context::{
    BufferKind, BufferUsage, ContextId, DrawCall, GlContext, ProgramSource, TextureDesc, Vertex,
    VERTEX_STRIDE,
};

pub use sampler::{Fragment, SoftShader};
use sampler::SoftTexture;

#[derive(Debug, Clone)]
struct SoftBuffer {
    kind: BufferKind,
    data: Vec<u8>,
}

/// Counts of live objects, for leak checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectCounts {
    pub textures: usize,
    pub buffers: usize,
    pub framebuffers: usize,
    pub programs: usize,
}

pub struct SoftContext {
    id: ContextId,
    next_name: u32,
    textures: HashMap<u32, SoftTexture>,
    buffers: HashMap<u32, SoftBuffer>,
    framebuffers: HashMap<u32, Vec<u32>>,
    programs: HashMap<u32, Arc<SoftShader>>,
    shaders: HashMap<String, Arc<SoftShader>>,
    bound_framebuffer: Option<u32>,
    viewport: IntRect,
    failures: HashSet<&'static str>,
}

impl Default for SoftContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftContext {
    pub fn new() -> Self {
        let id = ContextId::next();
        trace!(%id, "software context created");
        Self {
            id,
            next_name: 1,
            textures: HashMap::new(),
            buffers: HashMap::new(),
            framebuffers: HashMap::new(),
            programs: HashMap::new(),
            shaders: HashMap::new(),
            bound_framebuffer: None,
            viewport: IntRect::default(),
            failures: HashSet::new(),
        }
    }

    /// Register the CPU fragment function used for programs named `name`.
    pub fn register_shader<F>(&mut self, name: impl Into<String>, shader: F)
    where
        F: Fn(&Fragment<'_>) -> [f32; 4] + Send + Sync + 'static,
    {
        self.shaders.insert(name.into(), Arc::new(shader));
    }

    pub fn has_shader(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    /// Make the next call to the named trait operation (`"create_texture"`,
    /// `"upload_texture"`, ...) fail with a driver-style error.
    pub fn fail_next(&mut self, op: &'static str) {
        self.failures.insert(op);
    }

    pub fn object_counts(&self) -> ObjectCounts {
        ObjectCounts {
            textures: self.textures.len(),
            buffers: self.buffers.len(),
            framebuffers: self.framebuffers.len(),
            programs: self.programs.len(),
        }
    }

    /// Current contents of a texture.
    pub fn texture_image(&self, texture: u32) -> GlResult<&Bitmap> {
        self.texture(texture).map(|t| &t.image)
    }

    pub fn buffer_data(&self, buffer: u32) -> GlResult<&[u8]> {
        self.buffer(buffer).map(|b| b.data.as_slice())
    }

    pub fn viewport(&self) -> IntRect {
        self.viewport
    }

    pub fn bound_framebuffer(&self) -> Option<u32> {
        self.bound_framebuffer
    }

    fn check(&mut self, op: &'static str) -> GlResult<()> {
        if self.failures.remove(op) {
            return Err(GlError::operation(op, "injected failure"));
        }
        Ok(())
    }

    fn alloc_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    fn texture(&self, texture: u32) -> GlResult<&SoftTexture> {
        self.textures
            .get(&texture)
            .ok_or(GlError::UnknownTexture(texture))
    }

    fn texture_mut(&mut self, texture: u32) -> GlResult<&mut SoftTexture> {
        self.textures
            .get_mut(&texture)
            .ok_or(GlError::UnknownTexture(texture))
    }

    fn buffer(&self, buffer: u32) -> GlResult<&SoftBuffer> {
        self.buffers
            .get(&buffer)
            .ok_or(GlError::UnknownBuffer(buffer))
    }

    fn attachment(&self, framebuffer: u32, attachment: usize) -> GlResult<u32> {
        self.framebuffers
            .get(&framebuffer)
            .ok_or(GlError::UnknownFramebuffer(framebuffer))?
            .get(attachment)
            .copied()
            .ok_or_else(|| {
                GlError::operation(
                    "attachment",
                    format!("framebuffer {framebuffer} has no colour attachment {attachment}"),
                )
            })
    }

    fn read_vertices(&self, buffer: u32) -> GlResult<Vec<Vertex>> {
        let data = &self.buffer(buffer)?.data;
        let floats: Vec<f32> = data
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(floats
            .chunks_exact(VERTEX_STRIDE / 4)
            .map(|f| Vertex {
                pos: [f[0], f[1], f[2]],
                tex_coord: [f[3], f[4]],
            })
            .collect())
    }

    fn read_indices(&self, buffer: u32, count: usize) -> GlResult<Vec<u32>> {
        let data = &self.buffer(buffer)?.data;
        let indices: Vec<u32> = data
            .chunks_exact(4)
            .take(count)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        if indices.len() < count {
            return Err(GlError::operation(
                "draw",
                format!("index buffer {buffer} holds {} of {count} indices", indices.len()),
            ));
        }
        Ok(indices)
    }
}

impl GlContext for SoftContext {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn id(&self) -> ContextId {
        self.id
    }

    fn glsl_version(&self) -> GlslVersion {
        GlslVersion::default()
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> GlResult<u32> {
        self.check("create_texture")?;
        let mut image = Bitmap::new(desc.gl_size(), desc.format);
        if desc.force_pot {
            image.fill(desc.pot_border_color);
        }
        let name = self.alloc_name();
        self.textures.insert(name, SoftTexture { desc: *desc, image });
        trace!(ctx = %self.id, name, ?desc, "texture created");
        Ok(name)
    }

    fn upload_texture(&mut self, texture: u32, bitmap: &Bitmap) -> GlResult<()> {
        self.check("upload_texture")?;
        let tex = self.texture_mut(texture)?;
        let gl_size = tex.image.size();
        if bitmap.size().x > gl_size.x || bitmap.size().y > gl_size.y {
            return Err(GlError::SizeMismatch {
                op: "upload_texture",
                expected: gl_size,
                actual: bitmap.size(),
            });
        }
        if bitmap.size() == gl_size {
            tex.image.copy_pixels(bitmap)?;
        } else {
            tex.image.blit(bitmap, IntPoint::ZERO);
        }
        Ok(())
    }

    fn delete_texture(&mut self, texture: u32) -> GlResult<()> {
        self.check("delete_texture")?;
        self.textures
            .remove(&texture)
            .map(|_| ())
            .ok_or(GlError::UnknownTexture(texture))
    }

    fn texture_desc(&self, texture: u32) -> GlResult<TextureDesc> {
        self.texture(texture).map(|t| t.desc)
    }

    fn is_texture(&self, texture: u32) -> bool {
        self.textures.contains_key(&texture)
    }

    fn create_buffer(&mut self, kind: BufferKind, _usage: BufferUsage, size: usize) -> GlResult<u32> {
        self.check("create_buffer")?;
        let name = self.alloc_name();
        self.buffers.insert(
            name,
            SoftBuffer {
                kind,
                data: vec![0; size],
            },
        );
        Ok(name)
    }

    fn write_buffer(&mut self, buffer: u32, offset: usize, data: &[u8]) -> GlResult<()> {
        self.check("write_buffer")?;
        let buf = self
            .buffers
            .get_mut(&buffer)
            .ok_or(GlError::UnknownBuffer(buffer))?;
        let end = offset + data.len();
        if end > buf.data.len() {
            return Err(GlError::operation(
                "MapBuffer()",
                format!("write of {end} bytes into buffer of {}", buf.data.len()),
            ));
        }
        buf.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: u32) -> GlResult<()> {
        self.check("delete_buffer")?;
        self.buffers
            .remove(&buffer)
            .map(|_| ())
            .ok_or(GlError::UnknownBuffer(buffer))
    }

    fn is_buffer(&self, buffer: u32) -> bool {
        self.buffers.contains_key(&buffer)
    }

    fn buffer_to_texture(
        &mut self,
        buffer: u32,
        texture: u32,
        size: IntPoint,
        format: PixelFormat,
    ) -> GlResult<()> {
        self.check("buffer_to_texture")?;
        let buf = self.buffer(buffer)?;
        if buf.kind != BufferKind::PixelUnpack {
            return Err(GlError::Unsupported(format!(
                "buffer {buffer} is a {:?} buffer, not a pixel buffer",
                buf.kind
            )));
        }
        let len = size.area() * format.bytes_per_pixel();
        if buf.data.len() < len {
            return Err(GlError::InvalidBitmap {
                expected: len,
                actual: buf.data.len(),
            });
        }
        let bitmap = Bitmap::from_pixels(size, format, buf.data[..len].to_vec())?;
        self.upload_texture(texture, &bitmap)
    }

    fn create_framebuffer(&mut self, attachments: &[u32]) -> GlResult<u32> {
        self.check("create_framebuffer")?;
        let mut size = None;
        for &tex in attachments {
            let tex_size = self.texture(tex)?.image.size();
            match size {
                None => size = Some(tex_size),
                Some(s) if s != tex_size => {
                    return Err(GlError::SizeMismatch {
                        op: "create_framebuffer",
                        expected: s,
                        actual: tex_size,
                    })
                }
                Some(_) => {}
            }
        }
        let name = self.alloc_name();
        self.framebuffers.insert(name, attachments.to_vec());
        Ok(name)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<u32>) -> GlResult<()> {
        if let Some(fbo) = framebuffer {
            if !self.framebuffers.contains_key(&fbo) {
                return Err(GlError::UnknownFramebuffer(fbo));
            }
        }
        self.bound_framebuffer = framebuffer;
        Ok(())
    }

    fn delete_framebuffer(&mut self, framebuffer: u32) -> GlResult<()> {
        self.check("delete_framebuffer")?;
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
        }
        self.framebuffers
            .remove(&framebuffer)
            .map(|_| ())
            .ok_or(GlError::UnknownFramebuffer(framebuffer))
    }

    fn read_pixels(
        &mut self,
        framebuffer: u32,
        attachment: usize,
        rect: IntRect,
        format: PixelFormat,
    ) -> GlResult<Bitmap> {
        self.check("read_pixels")?;
        let tex = self.attachment(framebuffer, attachment)?;
        let image = &self.texture(tex)?.image;
        if !IntRect::from_size(image.size()).contains_rect(&rect) {
            return Err(GlError::SizeMismatch {
                op: "read_pixels",
                expected: image.size(),
                actual: rect.br,
            });
        }
        let mut out = Bitmap::new(rect.size(), format);
        for y in 0..rect.height() {
            for x in 0..rect.width() {
                out.set_pixel(x, y, image.pixel(rect.tl.x + x, rect.tl.y + y));
            }
        }
        Ok(out)
    }

    fn copy_texture(
        &mut self,
        framebuffer: u32,
        attachment: usize,
        texture: u32,
        size: IntPoint,
    ) -> GlResult<()> {
        self.check("copy_texture")?;
        let src = self.attachment(framebuffer, attachment)?;
        let src_image = &self.texture(src)?.image;
        if size.x > src_image.size().x || size.y > src_image.size().y {
            return Err(GlError::SizeMismatch {
                op: "copy_texture",
                expected: src_image.size(),
                actual: size,
            });
        }
        let mut region = Bitmap::new(size, src_image.format());
        region.blit(src_image, IntPoint::ZERO);
        self.upload_texture(texture, &region)
    }

    fn set_viewport(&mut self, rect: IntRect) {
        self.viewport = rect;
    }

    fn compile_program(&mut self, source: &ProgramSource) -> GlResult<u32> {
        self.check("compile_program")?;
        let shader = self.shaders.get(&source.name).cloned().ok_or_else(|| {
            GlError::Unsupported(format!("no software shader registered for '{}'", source.name))
        })?;
        let name = self.alloc_name();
        self.programs.insert(name, shader);
        Ok(name)
    }

    fn delete_program(&mut self, program: u32) -> GlResult<()> {
        self.programs
            .remove(&program)
            .map(|_| ())
            .ok_or(GlError::UnknownProgram(program))
    }

    fn draw(&mut self, call: &DrawCall) -> GlResult<()> {
        self.check("draw")?;
        let shader = self
            .programs
            .get(&call.program)
            .cloned()
            .ok_or(GlError::UnknownProgram(call.program))?;
        let fbo = self
            .bound_framebuffer
            .ok_or_else(|| GlError::Unsupported("draw without a bound framebuffer".into()))?;
        let target = self.attachment(fbo, 0)?;
        let target_size = self.texture(target)?.image.size();
        let vertices = self.read_vertices(call.vertex_buffer)?;
        let indices = self.read_indices(call.index_buffer, call.index_count)?;

        let mut writes = Vec::new();
        raster::rasterize(
            &vertices,
            &indices,
            &call.transform,
            self.viewport,
            target_size,
            |x, y, frag_coord, tex_coord| {
                let fragment = Fragment {
                    tex_coord,
                    frag_coord,
                    samplers: &call.samplers,
                    uniforms: &call.uniforms,
                    textures: &self.textures,
                };
                writes.push((x, y, (*shader)(&fragment)));
            },
        );

        let image = &mut self.texture_mut(target)?.image;
        for (x, y, rgba) in writes {
            image.set_pixel(x, y, rgba);
        }
        Ok(())
    }
}
