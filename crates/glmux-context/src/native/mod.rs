//! [`GlContext`] over the host's current OpenGL context.
//!
//! Every entry point saves the host bindings it touches and restores them on
//! the way out, so the host never observes our buffer, texture or program
//! bindings. Driver errors are collected with `glGetError` after each call
//! site and reported as [`GlError::Operation`].

mod format;
mod state;

use std::collections::HashMap;
use std::ffi::CString;

use anyhow::{bail, Result};
use gl::types::{GLchar, GLenum, GLint, GLsizei, GLsizeiptr, GLuint};
use glmux_core::{Bitmap, GlError, GlResult, GlslVersion, IntPoint, IntRect, PixelFormat};
use tracing::{debug, trace, warn};

use crate::context::{
    BufferKind, BufferUsage, ContextId, DrawCall, GlContext, ProgramSource, TextureDesc, Uniform,
    WrapMode, VERTEX_STRIDE,
};
use format::{gl_format, gl_wrap};
use state::{check_gl, clear_gl_errors, is_context_current, SavedGlState};

const ATTRIB_POS: GLuint = 0;
const ATTRIB_TEX_COORD: GLuint = 1;

/// Host-owned context driven through raw `gl` calls.
///
/// Object names are plain integers, so the struct itself holds no GL state
/// beyond two helper objects created on first use.
#[derive(Debug)]
pub struct NativeGlContext {
    id: ContextId,
    glsl: GlslVersion,
    textures: HashMap<u32, TextureDesc>,
    buffers: HashMap<u32, usize>,
    framebuffers: HashMap<u32, Vec<u32>>,
    programs: Vec<u32>,
    /// Draw-side FBO used for framebuffer to texture copies.
    blit_fbo: GLuint,
    vao: GLuint,
    /// Host framebuffer and viewport captured when we first bind our own.
    host_binding: Option<(GLuint, [GLint; 4])>,
}

impl NativeGlContext {
    /// Adopt the OpenGL context that is current on this thread.
    ///
    /// # Safety
    ///
    /// GL entry points must be loaded, and the context must stay current on
    /// this thread whenever the returned value is used.
    pub unsafe fn adopt_current(glsl: GlslVersion) -> Result<Self> {
        if !is_context_current() {
            bail!("no OpenGL context is current on this thread");
        }
        clear_gl_errors();
        let id = ContextId::next();
        debug!(%id, ?glsl, "adopted native GL context");
        Ok(Self {
            id,
            glsl,
            textures: HashMap::new(),
            buffers: HashMap::new(),
            framebuffers: HashMap::new(),
            programs: Vec::new(),
            blit_fbo: 0,
            vao: 0,
            host_binding: None,
        })
    }

    /// Delete the helper objects. Objects created through the trait are
    /// owned by their callers and not touched.
    pub fn release(&mut self) {
        unsafe {
            if self.blit_fbo != 0 {
                gl::DeleteFramebuffers(1, &self.blit_fbo);
                self.blit_fbo = 0;
            }
            if self.vao != 0 {
                gl::DeleteVertexArrays(1, &self.vao);
                self.vao = 0;
            }
        }
    }

    fn desc(&self, texture: u32) -> GlResult<TextureDesc> {
        self.textures
            .get(&texture)
            .copied()
            .ok_or(GlError::UnknownTexture(texture))
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

    /// Run `f` with the host bindings saved and restored around it.
    fn preserving_state<T>(&self, f: impl FnOnce() -> GlResult<T>) -> GlResult<T> {
        unsafe {
            clear_gl_errors();
            let saved = SavedGlState::save();
            let result = f();
            saved.restore();
            result
        }
    }
}

fn uniform_location(program: GLuint, name: &str) -> GlResult<GLint> {
    let cname = CString::new(name)
        .map_err(|_| GlError::operation("GetUniformLocation", format!("invalid name {name:?}")))?;
    Ok(unsafe { gl::GetUniformLocation(program, cname.as_ptr()) })
}

fn info_log(object: GLuint, is_program: bool) -> String {
    unsafe {
        let mut len: GLint = 0;
        if is_program {
            gl::GetProgramiv(object, gl::INFO_LOG_LENGTH, &mut len);
        } else {
            gl::GetShaderiv(object, gl::INFO_LOG_LENGTH, &mut len);
        }
        let mut buf = vec![0u8; len.max(1) as usize];
        let mut written: GLsizei = 0;
        let ptr = buf.as_mut_ptr() as *mut GLchar;
        if is_program {
            gl::GetProgramInfoLog(object, len, &mut written, ptr);
        } else {
            gl::GetShaderInfoLog(object, len, &mut written, ptr);
        }
        buf.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn compile_shader(kind: GLenum, source: &str, op: &str) -> GlResult<GLuint> {
    let csource =
        CString::new(source).map_err(|_| GlError::operation(op, "source contains a NUL byte"))?;
    unsafe {
        let shader = gl::CreateShader(kind);
        gl::ShaderSource(shader, 1, &csource.as_ptr(), std::ptr::null());
        gl::CompileShader(shader);
        let mut ok: GLint = 0;
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut ok);
        if ok == 0 {
            let log = info_log(shader, false);
            gl::DeleteShader(shader);
            return Err(GlError::operation(op, log));
        }
        Ok(shader)
    }
}

fn gl_usage(usage: BufferUsage) -> GLenum {
    match usage {
        BufferUsage::StaticDraw => gl::STATIC_DRAW,
        BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
        BufferUsage::StreamDraw => gl::STREAM_DRAW,
    }
}

impl GlContext for NativeGlContext {
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
        self.glsl
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> GlResult<u32> {
        let glf = gl_format(desc.format);
        let size = desc.gl_size();
        let name = self.preserving_state(|| unsafe {
            let mut tex: GLuint = 0;
            gl::GenTextures(1, &mut tex);
            gl::BindTexture(gl::TEXTURE_2D, tex);
            let min_filter = if desc.mipmap {
                gl::LINEAR_MIPMAP_LINEAR
            } else {
                gl::LINEAR
            };
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, min_filter as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl_wrap(desc.wrap_s));
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl_wrap(desc.wrap_t));
            if desc.wrap_s == WrapMode::ClampToBorder || desc.wrap_t == WrapMode::ClampToBorder {
                let border = [0.0f32; 4];
                gl::TexParameterfv(gl::TEXTURE_2D, gl::TEXTURE_BORDER_COLOR, border.as_ptr());
            }
            if let Some(swizzle) = glf.swizzle {
                let swizzle = swizzle.map(|c| c as GLint);
                gl::TexParameteriv(gl::TEXTURE_2D, gl::TEXTURE_SWIZZLE_RGBA, swizzle.as_ptr());
            }
            gl::BindBuffer(gl::PIXEL_UNPACK_BUFFER, 0);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);

            let fill = desc.force_pot.then(|| {
                let mut bmp = Bitmap::new(size, desc.format);
                bmp.fill(desc.pot_border_color);
                bmp
            });
            let data = fill
                .as_ref()
                .map_or(std::ptr::null(), |b| b.pixels().as_ptr() as *const _);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                glf.internal,
                size.x,
                size.y,
                0,
                glf.format,
                glf.ty,
                data,
            );
            if let Err(err) = check_gl("TexImage2D") {
                gl::DeleteTextures(1, &tex);
                return Err(err);
            }
            Ok(tex)
        })?;
        self.textures.insert(name, *desc);
        trace!(ctx = %self.id, name, ?desc, "texture created");
        Ok(name)
    }

    fn upload_texture(&mut self, texture: u32, bitmap: &Bitmap) -> GlResult<()> {
        let desc = self.desc(texture)?;
        let gl_size = desc.gl_size();
        if bitmap.size().x > gl_size.x || bitmap.size().y > gl_size.y {
            return Err(GlError::SizeMismatch {
                op: "upload_texture",
                expected: gl_size,
                actual: bitmap.size(),
            });
        }
        let converted;
        let bitmap = if bitmap.format() == desc.format {
            bitmap
        } else {
            converted = bitmap.converted(desc.format);
            &converted
        };
        let glf = gl_format(desc.format);
        self.preserving_state(|| unsafe {
            gl::BindBuffer(gl::PIXEL_UNPACK_BUFFER, 0);
            gl::BindTexture(gl::TEXTURE_2D, texture);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexSubImage2D(
                gl::TEXTURE_2D,
                0,
                0,
                0,
                bitmap.size().x,
                bitmap.size().y,
                glf.format,
                glf.ty,
                bitmap.pixels().as_ptr() as *const _,
            );
            if desc.mipmap {
                gl::GenerateMipmap(gl::TEXTURE_2D);
            }
            check_gl("TexSubImage2D")
        })
    }

    fn delete_texture(&mut self, texture: u32) -> GlResult<()> {
        if self.textures.remove(&texture).is_none() {
            return Err(GlError::UnknownTexture(texture));
        }
        unsafe {
            clear_gl_errors();
            gl::DeleteTextures(1, &texture);
        }
        check_gl("DeleteTextures")
    }

    fn texture_desc(&self, texture: u32) -> GlResult<TextureDesc> {
        self.desc(texture)
    }

    fn is_texture(&self, texture: u32) -> bool {
        self.textures.contains_key(&texture) && unsafe { gl::IsTexture(texture) != 0 }
    }

    fn create_buffer(&mut self, kind: BufferKind, usage: BufferUsage, size: usize) -> GlResult<u32> {
        let name = self.preserving_state(|| unsafe {
            let mut buf: GLuint = 0;
            gl::GenBuffers(1, &mut buf);
            gl::BindBuffer(gl::COPY_WRITE_BUFFER, buf);
            gl::BufferData(
                gl::COPY_WRITE_BUFFER,
                size as GLsizeiptr,
                std::ptr::null(),
                gl_usage(usage),
            );
            gl::BindBuffer(gl::COPY_WRITE_BUFFER, 0);
            if let Err(err) = check_gl("BufferData") {
                gl::DeleteBuffers(1, &buf);
                return Err(err);
            }
            Ok(buf)
        })?;
        self.buffers.insert(name, size);
        trace!(ctx = %self.id, name, ?kind, size, "buffer created");
        Ok(name)
    }

    fn write_buffer(&mut self, buffer: u32, offset: usize, data: &[u8]) -> GlResult<()> {
        let size = *self
            .buffers
            .get(&buffer)
            .ok_or(GlError::UnknownBuffer(buffer))?;
        if offset + data.len() > size {
            return Err(GlError::operation(
                "MapBuffer()",
                format!("write of {} bytes at {offset} into buffer of {size}", data.len()),
            ));
        }
        if data.is_empty() {
            return Ok(());
        }
        self.preserving_state(|| unsafe {
            gl::BindBuffer(gl::COPY_WRITE_BUFFER, buffer);
            let ptr = gl::MapBufferRange(
                gl::COPY_WRITE_BUFFER,
                offset as isize,
                data.len() as GLsizeiptr,
                gl::MAP_WRITE_BIT | gl::MAP_INVALIDATE_RANGE_BIT,
            );
            if ptr.is_null() {
                let err = check_gl("MapBuffer()").err();
                gl::BindBuffer(gl::COPY_WRITE_BUFFER, 0);
                return Err(err.unwrap_or_else(|| GlError::operation("MapBuffer()", "null mapping")));
            }
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr as *mut u8, data.len());
            let unmapped = gl::UnmapBuffer(gl::COPY_WRITE_BUFFER);
            gl::BindBuffer(gl::COPY_WRITE_BUFFER, 0);
            if unmapped == gl::FALSE {
                return Err(GlError::operation("UnmapBuffer()", "buffer contents were lost"));
            }
            check_gl("UnmapBuffer()")
        })
    }

    fn delete_buffer(&mut self, buffer: u32) -> GlResult<()> {
        if self.buffers.remove(&buffer).is_none() {
            return Err(GlError::UnknownBuffer(buffer));
        }
        unsafe {
            clear_gl_errors();
            gl::DeleteBuffers(1, &buffer);
        }
        check_gl("DeleteBuffers")
    }

    fn is_buffer(&self, buffer: u32) -> bool {
        self.buffers.contains_key(&buffer) && unsafe { gl::IsBuffer(buffer) != 0 }
    }

    fn buffer_to_texture(
        &mut self,
        buffer: u32,
        texture: u32,
        size: IntPoint,
        format: PixelFormat,
    ) -> GlResult<()> {
        let desc = self.desc(texture)?;
        let len = size.area() * format.bytes_per_pixel();
        let buf_size = *self
            .buffers
            .get(&buffer)
            .ok_or(GlError::UnknownBuffer(buffer))?;
        if buf_size < len {
            return Err(GlError::InvalidBitmap {
                expected: len,
                actual: buf_size,
            });
        }
        let glf = gl_format(format);
        self.preserving_state(|| unsafe {
            gl::BindBuffer(gl::PIXEL_UNPACK_BUFFER, buffer);
            gl::BindTexture(gl::TEXTURE_2D, texture);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexSubImage2D(
                gl::TEXTURE_2D,
                0,
                0,
                0,
                size.x,
                size.y,
                glf.format,
                glf.ty,
                std::ptr::null(),
            );
            if desc.mipmap {
                gl::GenerateMipmap(gl::TEXTURE_2D);
            }
            check_gl("TexSubImage2D")
        })
    }

    fn create_framebuffer(&mut self, attachments: &[u32]) -> GlResult<u32> {
        for tex in attachments {
            self.desc(*tex)?;
        }
        let name = self.preserving_state(|| unsafe {
            let mut fbo: GLuint = 0;
            gl::GenFramebuffers(1, &mut fbo);
            gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, fbo);
            let mut draw_buffers = Vec::with_capacity(attachments.len());
            for (i, &tex) in attachments.iter().enumerate() {
                let slot = gl::COLOR_ATTACHMENT0 + i as GLenum;
                gl::FramebufferTexture2D(gl::DRAW_FRAMEBUFFER, slot, gl::TEXTURE_2D, tex, 0);
                draw_buffers.push(slot);
            }
            gl::DrawBuffers(draw_buffers.len() as GLsizei, draw_buffers.as_ptr());
            let status = gl::CheckFramebufferStatus(gl::DRAW_FRAMEBUFFER);
            let result = if status != gl::FRAMEBUFFER_COMPLETE {
                Err(GlError::operation(
                    "CheckFramebufferStatus",
                    format!("status {status:#x}"),
                ))
            } else {
                check_gl("FramebufferTexture2D")
            };
            if let Err(err) = result {
                gl::DeleteFramebuffers(1, &fbo);
                return Err(err);
            }
            Ok(fbo)
        })?;
        self.framebuffers.insert(name, attachments.to_vec());
        Ok(name)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<u32>) -> GlResult<()> {
        unsafe {
            clear_gl_errors();
            match framebuffer {
                Some(fbo) => {
                    if !self.framebuffers.contains_key(&fbo) {
                        return Err(GlError::UnknownFramebuffer(fbo));
                    }
                    if self.host_binding.is_none() {
                        let mut host: GLint = 0;
                        let mut viewport = [0; 4];
                        gl::GetIntegerv(gl::DRAW_FRAMEBUFFER_BINDING, &mut host);
                        gl::GetIntegerv(gl::VIEWPORT, viewport.as_mut_ptr());
                        self.host_binding = Some((host as GLuint, viewport));
                    }
                    gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, fbo);
                }
                None => {
                    if let Some((host, v)) = self.host_binding.take() {
                        gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, host);
                        gl::Viewport(v[0], v[1], v[2], v[3]);
                    }
                }
            }
        }
        check_gl("BindFramebuffer")
    }

    fn delete_framebuffer(&mut self, framebuffer: u32) -> GlResult<()> {
        if self.framebuffers.remove(&framebuffer).is_none() {
            return Err(GlError::UnknownFramebuffer(framebuffer));
        }
        unsafe {
            clear_gl_errors();
            gl::DeleteFramebuffers(1, &framebuffer);
        }
        check_gl("DeleteFramebuffers")
    }

    fn read_pixels(
        &mut self,
        framebuffer: u32,
        attachment: usize,
        rect: IntRect,
        format: PixelFormat,
    ) -> GlResult<Bitmap> {
        let src = self.attachment(framebuffer, attachment)?;
        let src_format = self.desc(src)?.format;
        let glf = gl_format(src_format);
        let mut out = Bitmap::new(rect.size(), src_format);
        self.preserving_state(|| unsafe {
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER, framebuffer);
            gl::ReadBuffer(gl::COLOR_ATTACHMENT0 + attachment as GLenum);
            gl::BindBuffer(gl::PIXEL_PACK_BUFFER, 0);
            gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
            gl::ReadPixels(
                rect.tl.x,
                rect.tl.y,
                rect.width(),
                rect.height(),
                glf.format,
                glf.ty,
                out.pixels_mut().as_mut_ptr() as *mut _,
            );
            check_gl("ReadPixels")
        })?;
        Ok(if format == src_format {
            out
        } else {
            out.converted(format)
        })
    }

    fn copy_texture(
        &mut self,
        framebuffer: u32,
        attachment: usize,
        texture: u32,
        size: IntPoint,
    ) -> GlResult<()> {
        self.attachment(framebuffer, attachment)?;
        self.desc(texture)?;
        if self.blit_fbo == 0 {
            unsafe { gl::GenFramebuffers(1, &mut self.blit_fbo) };
        }
        let blit_fbo = self.blit_fbo;
        self.preserving_state(|| unsafe {
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER, framebuffer);
            gl::ReadBuffer(gl::COLOR_ATTACHMENT0 + attachment as GLenum);
            gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, blit_fbo);
            gl::FramebufferTexture2D(
                gl::DRAW_FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                gl::TEXTURE_2D,
                texture,
                0,
            );
            gl::BlitFramebuffer(
                0,
                0,
                size.x,
                size.y,
                0,
                0,
                size.x,
                size.y,
                gl::COLOR_BUFFER_BIT,
                gl::NEAREST,
            );
            gl::FramebufferTexture2D(gl::DRAW_FRAMEBUFFER, gl::COLOR_ATTACHMENT0, gl::TEXTURE_2D, 0, 0);
            check_gl("BlitFramebuffer")
        })
    }

    fn set_viewport(&mut self, rect: IntRect) {
        unsafe { gl::Viewport(rect.tl.x, rect.tl.y, rect.width(), rect.height()) };
    }

    fn compile_program(&mut self, source: &ProgramSource) -> GlResult<u32> {
        let vertex = compile_shader(
            gl::VERTEX_SHADER,
            &source.vertex_for(self.glsl),
            "CompileShader(vertex)",
        )?;
        let fragment = match compile_shader(
            gl::FRAGMENT_SHADER,
            &source.fragment_for(self.glsl),
            "CompileShader(fragment)",
        ) {
            Ok(f) => f,
            Err(err) => {
                unsafe { gl::DeleteShader(vertex) };
                return Err(err);
            }
        };
        let program = unsafe {
            let program = gl::CreateProgram();
            gl::AttachShader(program, vertex);
            gl::AttachShader(program, fragment);
            gl::BindAttribLocation(program, ATTRIB_POS, c"pos".as_ptr());
            gl::BindAttribLocation(program, ATTRIB_TEX_COORD, c"texCoord".as_ptr());
            gl::LinkProgram(program);
            gl::DeleteShader(vertex);
            gl::DeleteShader(fragment);
            let mut ok: GLint = 0;
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut ok);
            if ok == 0 {
                let log = info_log(program, true);
                gl::DeleteProgram(program);
                warn!(name = %source.name, "program link failed: {log}");
                return Err(GlError::operation("LinkProgram", log));
            }
            program
        };
        self.programs.push(program);
        debug!(ctx = %self.id, name = %source.name, program, "program linked");
        Ok(program)
    }

    fn delete_program(&mut self, program: u32) -> GlResult<()> {
        let Some(pos) = self.programs.iter().position(|p| *p == program) else {
            return Err(GlError::UnknownProgram(program));
        };
        self.programs.swap_remove(pos);
        unsafe {
            clear_gl_errors();
            gl::DeleteProgram(program);
        }
        check_gl("DeleteProgram")
    }

    fn draw(&mut self, call: &DrawCall) -> GlResult<()> {
        if !self.programs.contains(&call.program) {
            return Err(GlError::UnknownProgram(call.program));
        }
        if self.vao == 0 {
            unsafe { gl::GenVertexArrays(1, &mut self.vao) };
        }
        let vao = self.vao;
        let program = call.program;
        self.preserving_state(|| unsafe {
            let blend = gl::IsEnabled(gl::BLEND) != 0;
            gl::Disable(gl::BLEND);
            gl::UseProgram(program);
            gl::BindVertexArray(vao);
            gl::BindBuffer(gl::ARRAY_BUFFER, call.vertex_buffer);
            gl::EnableVertexAttribArray(ATTRIB_POS);
            gl::VertexAttribPointer(
                ATTRIB_POS,
                3,
                gl::FLOAT,
                gl::FALSE,
                VERTEX_STRIDE as GLsizei,
                std::ptr::null(),
            );
            gl::EnableVertexAttribArray(ATTRIB_TEX_COORD);
            gl::VertexAttribPointer(
                ATTRIB_TEX_COORD,
                2,
                gl::FLOAT,
                gl::FALSE,
                VERTEX_STRIDE as GLsizei,
                (3 * std::mem::size_of::<f32>()) as *const _,
            );
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, call.index_buffer);

            let transform = uniform_location(program, "transform")?;
            gl::UniformMatrix4fv(transform, 1, gl::FALSE, call.transform.as_ptr());
            for (unit, (name, texture)) in call.samplers.iter().enumerate() {
                gl::ActiveTexture(gl::TEXTURE0 + unit as GLenum);
                gl::BindTexture(gl::TEXTURE_2D, *texture);
                gl::Uniform1i(uniform_location(program, name)?, unit as GLint);
            }
            for (name, value) in &call.uniforms {
                let loc = uniform_location(program, name)?;
                match value {
                    Uniform::Int(v) => gl::Uniform1i(loc, *v),
                    Uniform::Float(v) => gl::Uniform1f(loc, *v),
                    Uniform::Vec2(v) => gl::Uniform2f(loc, v[0], v[1]),
                    Uniform::Vec4(v) => gl::Uniform4f(loc, v[0], v[1], v[2], v[3]),
                    Uniform::Mat4(m) => gl::UniformMatrix4fv(loc, 1, gl::FALSE, m.as_ptr()),
                }
            }

            gl::DrawElements(
                gl::TRIANGLES,
                call.index_count as GLsizei,
                gl::UNSIGNED_INT,
                std::ptr::null(),
            );
            let result = check_gl("DrawElements");
            gl::BindVertexArray(0);
            if blend {
                gl::Enable(gl::BLEND);
            }
            result
        })
    }
}
