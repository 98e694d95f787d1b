//! Pixel staging buffers.

use glmux_context::{BufferKind, BufferUsage, GlContext};
use glmux_core::{Bitmap, GlError, GlResult, IntPoint, PixelFormat};

use crate::texture::GlTexture;

/// Staging buffer sized for `size` pixels of `format`, used to move CPU
/// pixels into textures.
#[derive(Debug)]
pub struct PixelBuffer {
    id: u32,
    size: IntPoint,
    format: PixelFormat,
}

impl PixelBuffer {
    pub fn new(
        ctx: &mut dyn GlContext,
        size: IntPoint,
        format: PixelFormat,
        usage: BufferUsage,
    ) -> GlResult<Self> {
        let bytes = size.area() * format.bytes_per_pixel();
        let id = ctx.create_buffer(BufferKind::PixelUnpack, usage, bytes)?;
        Ok(Self { id, size, format })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn size(&self) -> IntPoint {
        self.size
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Copy raw pixel bytes into the start of the buffer.
    pub fn write(&self, ctx: &mut dyn GlContext, data: &[u8]) -> GlResult<()> {
        ctx.write_buffer(self.id, 0, data)
    }

    /// Fill `tex` from the start of the buffer. The texture must not be
    /// larger than the buffer.
    pub fn move_to_texture(&self, ctx: &mut dyn GlContext, tex: &GlTexture) -> GlResult<()> {
        let size = tex.size();
        if size.x > self.size.x || size.y > self.size.y {
            return Err(GlError::SizeMismatch {
                op: "PixelBuffer::move_to_texture",
                expected: self.size,
                actual: size,
            });
        }
        ctx.buffer_to_texture(self.id, tex.id(), size, self.format)
    }

    /// Stage `bitmap` and transfer it into `tex`, converting to the
    /// buffer's format first if needed.
    pub fn move_bitmap_to_texture(
        &self,
        ctx: &mut dyn GlContext,
        bitmap: &Bitmap,
        tex: &GlTexture,
    ) -> GlResult<()> {
        if bitmap.size() != self.size {
            return Err(GlError::SizeMismatch {
                op: "PixelBuffer::move_bitmap_to_texture",
                expected: self.size,
                actual: bitmap.size(),
            });
        }
        if bitmap.format() == self.format {
            self.write(ctx, bitmap.pixels())?;
        } else {
            self.write(ctx, bitmap.converted(self.format).pixels())?;
        }
        self.move_to_texture(ctx, tex)
    }

    pub fn release(self, ctx: &mut dyn GlContext) -> GlResult<()> {
        ctx.delete_buffer(self.id)
    }
}
