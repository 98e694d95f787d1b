//! Generic GPU filter pipeline.
//!
//! A [`GpuFilter`] owns the destination framebuffer, the projection and, in
//! standalone mode, the source texture and staging buffer. The actual shader
//! work is supplied by a [`FilterProgram`].

use glmux_context::bytes::slice_as_bytes;
use glmux_context::{BufferUsage, ContextId, DrawCall, GlContext, TextureDesc, WrapMode};
use glmux_core::{
    compute_kernel_with, Bitmap, DRect, DPoint, GlError, GlResult, IntPoint, IntRect, KernelParams,
    PixelFormat,
};
use tracing::{debug, trace};

use crate::fbo::Framebuffer;
use crate::multiplexer::SharedTexture;
use crate::pbo::PixelBuffer;
use crate::projection::ImagingProjection;
use crate::texture::GlTexture;

/// Everything a [`FilterProgram`] needs for one pass. The destination
/// framebuffer is bound and the viewport set when the program runs.
pub struct FilterPass<'a> {
    pub ctx: &'a mut dyn GlContext,
    pub src_texture: u32,
    pub projection: &'a ImagingProjection,
    pub framebuffer: &'a Framebuffer,
}

impl FilterPass<'_> {
    /// Submit a draw prepared from [`ImagingProjection::draw_call`].
    pub fn draw(&mut self, call: &DrawCall) -> GlResult<()> {
        self.ctx.draw(call)
    }
}

/// Shader step of a filter.
pub trait FilterProgram {
    fn apply_on_gpu(&mut self, pass: &mut FilterPass<'_>) -> GlResult<()>;
}

impl<F> FilterProgram for F
where
    F: FnMut(&mut FilterPass<'_>) -> GlResult<()>,
{
    fn apply_on_gpu(&mut self, pass: &mut FilterPass<'_>) -> GlResult<()> {
        self(pass)
    }
}

pub struct GpuFilter {
    pf_src: PixelFormat,
    pf_dest: PixelFormat,
    standalone: bool,
    num_textures: usize,
    src_size: IntPoint,
    dest_rect: IntRect,
    src_tex: Option<GlTexture>,
    src_pbo: Option<PixelBuffer>,
    fbo: Option<Framebuffer>,
    projection: Option<ImagingProjection>,
    kernel_params: KernelParams,
    /// Kernel upload buffer and the context it lives on, created on first
    /// use and kept for the lifetime of that context.
    kernel_staging: Option<(ContextId, PixelBuffer)>,
}

impl std::fmt::Debug for GpuFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuFilter")
            .field("pf_src", &self.pf_src)
            .field("pf_dest", &self.pf_dest)
            .field("standalone", &self.standalone)
            .field("src_size", &self.src_size)
            .field("dest_rect", &self.dest_rect)
            .finish_non_exhaustive()
    }
}

impl GpuFilter {
    /// Unconfigured filter. In `standalone` mode the filter owns a source
    /// texture and accepts CPU bitmaps; otherwise it only filters textures.
    pub fn new(pf_src: PixelFormat, pf_dest: PixelFormat, standalone: bool, num_textures: usize) -> Self {
        Self {
            pf_src,
            pf_dest,
            standalone,
            num_textures,
            src_size: IntPoint::ZERO,
            dest_rect: IntRect::default(),
            src_tex: None,
            src_pbo: None,
            fbo: None,
            projection: None,
            kernel_params: KernelParams::default(),
            kernel_staging: None,
        }
    }

    pub fn with_kernel_params(mut self, params: KernelParams) -> Self {
        self.kernel_params = params;
        self
    }

    pub fn kernel_params(&self) -> &KernelParams {
        &self.kernel_params
    }

    /// Configure for a source of `src_size` rendered one to one.
    pub fn set_dimensions(&mut self, ctx: &mut dyn GlContext, src_size: IntPoint) -> GlResult<()> {
        self.set_dimensions_with(ctx, src_size, IntRect::from_size(src_size), WrapMode::ClampToEdge)
    }

    /// Configure for a source of `src_size` whose `dest_rect` region (in
    /// source pixels, possibly extending past it) is rendered. GPU objects
    /// are only rebuilt for the parts that changed.
    pub fn set_dimensions_with(
        &mut self,
        ctx: &mut dyn GlContext,
        src_size: IntPoint,
        dest_rect: IntRect,
        wrap: WrapMode,
    ) -> GlResult<()> {
        let mut projection_changed = false;
        if dest_rect != self.dest_rect || self.fbo.is_none() {
            let fbo = Framebuffer::new(ctx, dest_rect.size(), self.pf_dest, self.num_textures)?;
            if let Some(old) = self.fbo.replace(fbo) {
                old.release(ctx)?;
            }
            self.dest_rect = dest_rect;
            projection_changed = true;
        }
        if self.standalone && (src_size != self.src_size || self.src_tex.is_none()) {
            let desc = TextureDesc::new(src_size, self.pf_src).with_wrap(wrap, wrap);
            let tex = GlTexture::new(ctx, desc)?;
            let pbo = match PixelBuffer::new(ctx, src_size, self.pf_src, BufferUsage::StreamDraw) {
                Ok(pbo) => pbo,
                Err(err) => {
                    let _ = tex.release(ctx);
                    return Err(err);
                }
            };
            if let Some(old) = self.src_tex.replace(tex) {
                old.release(ctx)?;
            }
            if let Some(old) = self.src_pbo.replace(pbo) {
                old.release(ctx)?;
            }
            projection_changed = true;
        }
        if src_size != self.src_size {
            projection_changed = true;
        }
        self.src_size = src_size;
        if projection_changed {
            let projection = ImagingProjection::new(ctx, src_size, dest_rect)?;
            if let Some(old) = self.projection.replace(projection) {
                old.release(ctx)?;
            }
            debug!(?src_size, ?dest_rect, "filter dimensions changed");
        }
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.fbo.is_some() && self.projection.is_some()
    }

    /// Filter a CPU bitmap and read the result back.
    ///
    /// The result covers the destination rectangle and always has the
    /// format of `bitmap`, whatever format the filter renders in.
    ///
    /// # Panics
    ///
    /// If the filter is not standalone or has not been configured.
    pub fn apply(
        &mut self,
        ctx: &mut dyn GlContext,
        program: &mut dyn FilterProgram,
        bitmap: &Bitmap,
    ) -> GlResult<Bitmap> {
        let (Some(src_tex), Some(src_pbo)) = (&self.src_tex, &self.src_pbo) else {
            panic!("GpuFilter::apply: filter not configured (standalone: {})", self.standalone);
        };
        assert!(self.fbo.is_some(), "GpuFilter::apply: filter not configured");
        src_pbo.move_bitmap_to_texture(ctx, bitmap, src_tex)?;
        let src_id = src_tex.id();
        self.apply_texture(ctx, program, src_id)?;

        let filtered = self.image(ctx)?;
        if filtered.format() == bitmap.format() {
            return Ok(filtered);
        }
        let mut dest = Bitmap::new(self.dest_rect.size(), bitmap.format());
        dest.copy_pixels(&filtered)?;
        Ok(dest)
    }

    /// Filter a texture on the GPU. The result stays in
    /// [`dest_texture`](Self::dest_texture); nothing is read back.
    ///
    /// # Panics
    ///
    /// If the filter has not been configured.
    pub fn apply_texture(
        &mut self,
        ctx: &mut dyn GlContext,
        program: &mut dyn FilterProgram,
        src_texture: u32,
    ) -> GlResult<()> {
        let (Some(fbo), Some(projection)) = (&self.fbo, &self.projection) else {
            panic!("GpuFilter::apply_texture: filter not configured");
        };
        fbo.activate(ctx)?;
        projection.activate(ctx);
        let result = {
            let mut pass = FilterPass {
                ctx: &mut *ctx,
                src_texture,
                projection,
                framebuffer: fbo,
            };
            program.apply_on_gpu(&mut pass)
        };
        fbo.deactivate(ctx)?;
        result?;
        fbo.copy_to_dest_texture(ctx)?;
        trace!(src_texture, "filter applied");
        Ok(())
    }

    /// [`apply_texture`](Self::apply_texture) on the physical texture a
    /// shared handle has on `ctx`.
    pub fn apply_shared(
        &mut self,
        ctx: &mut dyn GlContext,
        program: &mut dyn FilterProgram,
        texture: &SharedTexture,
    ) -> GlResult<()> {
        let id = texture.gl_id(ctx.id()).ok_or_else(|| {
            GlError::operation(
                "GpuFilter::apply_shared",
                format!("texture handle {} is not realised on {}", texture.id(), ctx.id()),
            )
        })?;
        self.apply_texture(ctx, program, id)
    }

    fn fbo(&self) -> &Framebuffer {
        match &self.fbo {
            Some(fbo) => fbo,
            None => panic!("GpuFilter: filter not configured"),
        }
    }

    /// Copy of the rendered colour attachment `i`.
    pub fn dest_texture(&self, i: usize) -> &GlTexture {
        self.fbo().dest_texture(i)
    }

    /// Read back the last result in the filter's destination format.
    pub fn image(&self, ctx: &mut dyn GlContext) -> GlResult<Bitmap> {
        self.fbo().image(ctx)
    }

    pub fn framebuffer(&self) -> Option<&Framebuffer> {
        self.fbo.as_ref()
    }

    pub fn projection(&self) -> Option<&ImagingProjection> {
        self.projection.as_ref()
    }

    pub fn src_texture(&self) -> Option<&GlTexture> {
        self.src_tex.as_ref()
    }

    pub fn src_size(&self) -> IntPoint {
        self.src_size
    }

    pub fn dest_rect(&self) -> IntRect {
        self.dest_rect
    }

    pub fn src_format(&self) -> PixelFormat {
        self.pf_src
    }

    pub fn dest_format(&self) -> PixelFormat {
        self.pf_dest
    }

    /// Destination rectangle in units of the source size.
    pub fn rel_dest_rect(&self) -> DRect {
        let src = DPoint::from(self.src_size);
        DRect::from_coords(
            f64::from(self.dest_rect.tl.x) / src.x,
            f64::from(self.dest_rect.tl.y) / src.y,
            f64::from(self.dest_rect.br.x) / src.x,
            f64::from(self.dest_rect.br.y) / src.y,
        )
    }

    /// Gaussian kernel for `std_dev` as a `width x 1` RGBA float texture,
    /// every channel holding the weight.
    pub fn calc_blur_kernel_tex(
        &mut self,
        ctx: &mut dyn GlContext,
        std_dev: f32,
        opacity: f32,
    ) -> GlResult<GlTexture> {
        let kernel = compute_kernel_with(&self.kernel_params, std_dev, opacity);
        let texels: Vec<[f32; 4]> = kernel.iter().map(|w| [*w; 4]).collect();

        let ctx_id = ctx.id();
        let staging = match self.kernel_staging.take() {
            Some((owner, pbo)) if owner == ctx_id => pbo,
            cached => {
                if let Some((owner, _)) = cached {
                    debug!(%owner, ctx = %ctx_id, "kernel staging buffer belongs to another context, replacing");
                }
                PixelBuffer::new(
                    ctx,
                    IntPoint::new(self.kernel_params.max_kernel_width() as i32, 1),
                    PixelFormat::R32G32B32A32F,
                    BufferUsage::StreamDraw,
                )?
            }
        };
        let (_, staging) = self.kernel_staging.insert((ctx_id, staging));

        let tex = GlTexture::new(
            ctx,
            TextureDesc::new(IntPoint::new(kernel.len() as i32, 1), PixelFormat::R32G32B32A32F),
        )?;
        let uploaded = staging
            .write(ctx, slice_as_bytes(&texels))
            .and_then(|_| staging.move_to_texture(ctx, &tex));
        if let Err(err) = uploaded {
            let _ = tex.release(ctx);
            return Err(match err {
                GlError::Operation { op, detail } => GlError::Operation {
                    op: format!("GpuFilter::calc_blur_kernel_tex {op}"),
                    detail,
                },
                other => other,
            });
        }
        trace!(width = kernel.len(), std_dev, opacity, "kernel texture built");
        Ok(tex)
    }

    /// Forget the cached kernel staging buffer without GL calls. Call
    /// before the context it lives on is destroyed.
    pub fn on_context_lost(&mut self) {
        if self.kernel_staging.take().is_some() {
            debug!("kernel staging buffer forgotten");
        }
    }

    /// Release every GPU object of the filter on `ctx` and return to the
    /// unconfigured state.
    pub fn release(&mut self, ctx: &mut dyn GlContext) -> GlResult<()> {
        if let Some(fbo) = self.fbo.take() {
            fbo.release(ctx)?;
        }
        if let Some(projection) = self.projection.take() {
            projection.release(ctx)?;
        }
        if let Some(tex) = self.src_tex.take() {
            tex.release(ctx)?;
        }
        if let Some(pbo) = self.src_pbo.take() {
            pbo.release(ctx)?;
        }
        match self.kernel_staging.take() {
            Some((owner, pbo)) if owner == ctx.id() => pbo.release(ctx)?,
            Some((owner, _)) => debug!(%owner, "kernel staging buffer of another context forgotten"),
            None => {}
        }
        self.src_size = IntPoint::ZERO;
        self.dest_rect = IntRect::default();
        Ok(())
    }
}
