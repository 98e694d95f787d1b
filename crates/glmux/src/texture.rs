//! Texture owned by a single context.

use glmux_context::{GlContext, TextureDesc, WrapMode};
use glmux_core::{Bitmap, GlResult, IntPoint, PixelFormat};

/// Physical texture on one context. Release it with
/// [`GlTexture::release`] or forget it after the context is lost.
#[derive(Debug)]
pub struct GlTexture {
    id: u32,
    desc: TextureDesc,
}

impl GlTexture {
    pub fn new(ctx: &mut dyn GlContext, desc: TextureDesc) -> GlResult<Self> {
        let id = ctx.create_texture(&desc)?;
        Ok(Self { id, desc })
    }

    pub fn with_format(
        ctx: &mut dyn GlContext,
        size: IntPoint,
        format: PixelFormat,
        wrap: WrapMode,
    ) -> GlResult<Self> {
        Self::new(ctx, TextureDesc::new(size, format).with_wrap(wrap, wrap))
    }

    pub fn from_bitmap(ctx: &mut dyn GlContext, bitmap: &Bitmap) -> GlResult<Self> {
        let tex = Self::new(ctx, TextureDesc::new(bitmap.size(), bitmap.format()))?;
        ctx.upload_texture(tex.id, bitmap)?;
        Ok(tex)
    }

    pub fn upload(&self, ctx: &mut dyn GlContext, bitmap: &Bitmap) -> GlResult<()> {
        ctx.upload_texture(self.id, bitmap)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn size(&self) -> IntPoint {
        self.desc.size
    }

    pub fn format(&self) -> PixelFormat {
        self.desc.format
    }

    pub fn release(self, ctx: &mut dyn GlContext) -> GlResult<()> {
        ctx.delete_texture(self.id)
    }
}
