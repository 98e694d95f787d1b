//! Off-screen render targets.

use glmux_context::{GlContext, TextureDesc, WrapMode};
use glmux_core::{Bitmap, GlResult, IntPoint, IntRect, PixelFormat};
use tracing::trace;

use crate::texture::GlTexture;

/// Framebuffer with `n` colour attachments and `n` destination textures
/// that receive a copy of the attachments after rendering.
#[derive(Debug)]
pub struct Framebuffer {
    id: u32,
    size: IntPoint,
    format: PixelFormat,
    attachments: Vec<GlTexture>,
    dest_textures: Vec<GlTexture>,
}

/// Textures first, then the framebuffer over the attachments. Whatever was
/// created before a failure is left in the vectors.
fn create_parts(
    ctx: &mut dyn GlContext,
    desc: TextureDesc,
    num_textures: usize,
    attachments: &mut Vec<GlTexture>,
    dest_textures: &mut Vec<GlTexture>,
) -> GlResult<u32> {
    for _ in 0..num_textures {
        attachments.push(GlTexture::new(ctx, desc)?);
        dest_textures.push(GlTexture::new(ctx, desc)?);
    }
    let ids: Vec<u32> = attachments.iter().map(GlTexture::id).collect();
    ctx.create_framebuffer(&ids)
}

impl Framebuffer {
    pub fn new(
        ctx: &mut dyn GlContext,
        size: IntPoint,
        format: PixelFormat,
        num_textures: usize,
    ) -> GlResult<Self> {
        Self::with_wrap(ctx, size, format, num_textures, WrapMode::ClampToEdge)
    }

    /// Like [`Framebuffer::new`], with `wrap` applied to every texture.
    pub fn with_wrap(
        ctx: &mut dyn GlContext,
        size: IntPoint,
        format: PixelFormat,
        num_textures: usize,
        wrap: WrapMode,
    ) -> GlResult<Self> {
        assert!(num_textures > 0, "framebuffer needs at least one attachment");
        let desc = TextureDesc::new(size, format).with_wrap(wrap, wrap);
        let mut attachments = Vec::with_capacity(num_textures);
        let mut dest_textures = Vec::with_capacity(num_textures);
        let created = create_parts(ctx, desc, num_textures, &mut attachments, &mut dest_textures);
        let id = match created {
            Ok(id) => id,
            Err(err) => {
                for tex in attachments.into_iter().chain(dest_textures) {
                    let _ = tex.release(ctx);
                }
                return Err(err);
            }
        };
        trace!(id, ?size, %format, num_textures, "framebuffer created");
        Ok(Self {
            id,
            size,
            format,
            attachments,
            dest_textures,
        })
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

    pub fn num_textures(&self) -> usize {
        self.attachments.len()
    }

    /// Make this the draw target.
    pub fn activate(&self, ctx: &mut dyn GlContext) -> GlResult<()> {
        ctx.bind_framebuffer(Some(self.id))
    }

    pub fn deactivate(&self, ctx: &mut dyn GlContext) -> GlResult<()> {
        ctx.bind_framebuffer(None)
    }

    /// Texture rendered into by colour attachment `i`.
    pub fn attachment(&self, i: usize) -> &GlTexture {
        &self.attachments[i]
    }

    /// Copy target of colour attachment `i`.
    pub fn dest_texture(&self, i: usize) -> &GlTexture {
        &self.dest_textures[i]
    }

    /// Read back colour attachment 0 in the framebuffer's format.
    pub fn image(&self, ctx: &mut dyn GlContext) -> GlResult<Bitmap> {
        ctx.read_pixels(self.id, 0, IntRect::from_size(self.size), self.format)
    }

    pub fn copy_to_dest_texture(&self, ctx: &mut dyn GlContext) -> GlResult<()> {
        for (i, dest) in self.dest_textures.iter().enumerate() {
            ctx.copy_texture(self.id, i, dest.id(), self.size)?;
        }
        Ok(())
    }

    pub fn release(self, ctx: &mut dyn GlContext) -> GlResult<()> {
        ctx.delete_framebuffer(self.id)?;
        for tex in self.attachments.into_iter().chain(self.dest_textures) {
            tex.release(ctx)?;
        }
        Ok(())
    }
}
