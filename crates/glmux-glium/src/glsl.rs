//! GLSL dialect selection from glium capabilities.

use glium::CapabilitiesSource;
use glmux_core::GlslVersion;

/// Newest dialect the filter shaders can be compiled as: `Glsl140` when
/// available, otherwise `Glsl120`, `None` if the context supports neither.
pub fn best_glsl_version(ctx: &impl CapabilitiesSource) -> Option<GlslVersion> {
    let versions = &ctx.get_capabilities().supported_glsl_versions;
    let supports = |minor| {
        versions
            .iter()
            .any(|v| *v == glium::Version(glium::Api::Gl, 1, minor))
    };

    if supports(4) {
        Some(GlslVersion::Glsl140)
    } else if supports(2) {
        Some(GlslVersion::Glsl120)
    } else {
        None
    }
}
