//! Separable Gaussian blur.
//!
//! The horizontal pass renders the padded destination region into an
//! intermediate float framebuffer, the vertical pass renders that into the
//! pipeline's framebuffer. Both passes share one program.

use glmux_context::{GlContext, ProgramSource, SoftContext, Uniform, WrapMode};
use glmux_core::{blur_kernel_radius, Bitmap, GlResult, IntPoint, IntRect, PixelFormat};
use tracing::debug;

use crate::fbo::Framebuffer;
use crate::filter::{FilterPass, FilterProgram, GpuFilter};
use crate::projection::ImagingProjection;
use crate::shaders::{filter_fragment, pre_multiply_alpha, un_pre_multiply_alpha, VERTEX_SHADER};
use crate::texture::GlTexture;

pub const BLUR_PROGRAM: &str = "glmux.blur";

const BLUR_FRAGMENT_BODY: &str = "\
uniform sampler2D srcTex;
uniform sampler2D kernelTex;
uniform vec2 direction;
uniform int radius;
varying vec2 vTexCoord;

void main()
{
    float width = float(2 * radius + 1);
    vec4 sum = vec4(0.0);
    for (int i = -radius; i <= radius; ++i) {
        float w = texture2D(kernelTex, vec2((float(i + radius) + 0.5) / width, 0.5)).r;
        vec4 c = texture2D(srcTex, vTexCoord + direction * float(i));
        preMultiplyAlpha(c);
        sum += c * w;
    }
    unPreMultiplyAlpha(sum);
    gl_FragColor = sum;
}
";

pub fn blur_program_source() -> ProgramSource {
    ProgramSource::new(BLUR_PROGRAM, VERTEX_SHADER, filter_fragment(BLUR_FRAGMENT_BODY))
}

/// Install the CPU version of the blur program on a software context.
pub fn register_software_shaders(ctx: &mut SoftContext) {
    ctx.register_shader(BLUR_PROGRAM, |frag| {
        let radius = frag.int("radius");
        let dir = frag.vec2("direction");
        let width = frag.texture_size("kernelTex").x.max(1) as f32;
        let mut sum = [0.0f32; 4];
        for i in -radius..=radius {
            let w = frag.sample("kernelTex", [((i + radius) as f32 + 0.5) / width, 0.5])[0];
            let uv = [
                frag.tex_coord[0] + dir[0] * i as f32,
                frag.tex_coord[1] + dir[1] * i as f32,
            ];
            let c = pre_multiply_alpha(frag.sample("srcTex", uv));
            for (s, c) in sum.iter_mut().zip(c) {
                *s += c * w;
            }
        }
        un_pre_multiply_alpha(sum)
    });
}

fn new_intermediate(ctx: &mut dyn GlContext, size: IntPoint) -> GlResult<Framebuffer> {
    Framebuffer::with_wrap(ctx, size, PixelFormat::R32G32B32A32F, 1, WrapMode::ClampToBorder)
}

/// GPU objects that only exist once the blur has been configured.
struct BlurPasses {
    program: u32,
    kernel: GlTexture,
    radius: i32,
    intermediate: Framebuffer,
    identity: ImagingProjection,
}

impl BlurPasses {
    fn release(self, ctx: &mut dyn GlContext) -> GlResult<()> {
        ctx.delete_program(self.program)?;
        self.kernel.release(ctx)?;
        self.intermediate.release(ctx)?;
        self.identity.release(ctx)
    }
}

impl FilterProgram for BlurPasses {
    fn apply_on_gpu(&mut self, pass: &mut FilterPass<'_>) -> GlResult<()> {
        let src_size = pass.projection.src_size();
        let dest_size = pass.framebuffer.size();

        self.intermediate.activate(pass.ctx)?;
        pass.projection.activate(pass.ctx);
        let horizontal = pass
            .projection
            .draw_call(self.program)
            .sampler("srcTex", pass.src_texture)
            .sampler("kernelTex", self.kernel.id())
            .uniform("direction", Uniform::Vec2([1.0 / src_size.x.max(1) as f32, 0.0]))
            .uniform("radius", Uniform::Int(self.radius));
        pass.draw(&horizontal)?;

        pass.framebuffer.activate(pass.ctx)?;
        self.identity.activate(pass.ctx);
        let vertical = self
            .identity
            .draw_call(self.program)
            .sampler("srcTex", self.intermediate.attachment(0).id())
            .sampler("kernelTex", self.kernel.id())
            .uniform("direction", Uniform::Vec2([0.0, 1.0 / dest_size.y.max(1) as f32]))
            .uniform("radius", Uniform::Int(self.radius));
        pass.draw(&vertical)
    }
}

/// Gaussian blur of a source image. The output is padded by
/// [`blur_kernel_radius`] on every side.
pub struct BlurFilter {
    filter: GpuFilter,
    std_dev: f32,
    opacity: f32,
    passes: Option<BlurPasses>,
}

impl BlurFilter {
    pub fn new(pf_src: PixelFormat, pf_dest: PixelFormat, standalone: bool) -> Self {
        Self {
            filter: GpuFilter::new(pf_src, pf_dest, standalone, 1),
            std_dev: 0.0,
            opacity: 1.0,
            passes: None,
        }
    }

    pub fn std_dev(&self) -> f32 {
        self.std_dev
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn filter(&self) -> &GpuFilter {
        &self.filter
    }

    /// Rectangle of the source (in source pixels) the output covers.
    pub fn dest_rect_for(&self, src_size: IntPoint) -> IntRect {
        IntRect::from_size(src_size).expanded(blur_kernel_radius(self.std_dev))
    }

    /// Configure for `src_size` with the current standard deviation.
    pub fn set_dimensions(&mut self, ctx: &mut dyn GlContext, src_size: IntPoint) -> GlResult<()> {
        let dest_rect = self.dest_rect_for(src_size);
        self.filter
            .set_dimensions_with(ctx, src_size, dest_rect, WrapMode::ClampToBorder)?;
        self.rebuild_passes(ctx)
    }

    /// Change the blur strength. A configured filter resizes its output and
    /// regenerates the kernel texture.
    pub fn set_std_dev(
        &mut self,
        ctx: &mut dyn GlContext,
        std_dev: f32,
        opacity: f32,
    ) -> GlResult<()> {
        assert!(std_dev >= 0.0, "negative standard deviation {std_dev}");
        self.std_dev = std_dev;
        self.opacity = opacity;
        if self.filter.is_configured() {
            self.set_dimensions(ctx, self.filter.src_size())?;
        }
        Ok(())
    }

    fn rebuild_passes(&mut self, ctx: &mut dyn GlContext) -> GlResult<()> {
        let dest_size = self.filter.dest_rect().size();
        let kernel = self.filter.calc_blur_kernel_tex(ctx, self.std_dev, self.opacity)?;
        let radius = (kernel.size().x - 1) / 2;

        let (program, intermediate, identity) = match self.passes.take() {
            Some(old) if old.intermediate.size() == dest_size => {
                old.kernel.release(ctx)?;
                (old.program, old.intermediate, old.identity)
            }
            Some(old) => {
                let program = old.program;
                old.kernel.release(ctx)?;
                old.intermediate.release(ctx)?;
                old.identity.release(ctx)?;
                let intermediate = new_intermediate(ctx, dest_size)?;
                (program, intermediate, ImagingProjection::identity(ctx, dest_size)?)
            }
            None => {
                let program = ctx.compile_program(&blur_program_source())?;
                let intermediate = new_intermediate(ctx, dest_size)?;
                (program, intermediate, ImagingProjection::identity(ctx, dest_size)?)
            }
        };
        debug!(std_dev = self.std_dev, radius, ?dest_size, "blur configured");
        self.passes = Some(BlurPasses {
            program,
            kernel,
            radius,
            intermediate,
            identity,
        });
        Ok(())
    }

    /// Blur a CPU bitmap. The result has the format of `bitmap`.
    ///
    /// # Panics
    ///
    /// If the filter has not been configured.
    pub fn apply(&mut self, ctx: &mut dyn GlContext, bitmap: &Bitmap) -> GlResult<Bitmap> {
        let Some(passes) = self.passes.as_mut() else {
            panic!("BlurFilter::apply: filter not configured");
        };
        self.filter.apply(ctx, passes, bitmap)
    }

    /// Blur a texture on the GPU; the result is in
    /// [`dest_texture`](Self::dest_texture).
    pub fn apply_texture(&mut self, ctx: &mut dyn GlContext, src_texture: u32) -> GlResult<()> {
        let Some(passes) = self.passes.as_mut() else {
            panic!("BlurFilter::apply_texture: filter not configured");
        };
        self.filter.apply_texture(ctx, passes, src_texture)
    }

    pub fn dest_texture(&self) -> &GlTexture {
        self.filter.dest_texture(0)
    }

    pub fn on_context_lost(&mut self) {
        self.filter.on_context_lost();
        self.passes = None;
    }

    pub fn release(&mut self, ctx: &mut dyn GlContext) -> GlResult<()> {
        if let Some(passes) = self.passes.take() {
            passes.release(ctx)?;
        }
        self.filter.release(ctx)
    }
}
