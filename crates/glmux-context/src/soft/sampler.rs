//! Fragment inputs and nearest-neighbour texture sampling for software
//! shaders.

use std::collections::HashMap;

use glmux_core::{Bitmap, IntPoint};

use crate::context::{TextureDesc, Uniform, WrapMode};

/// CPU fragment function standing in for a compiled fragment shader.
pub type SoftShader = dyn Fn(&Fragment<'_>) -> [f32; 4] + Send + Sync;

#[derive(Debug, Clone)]
pub(crate) struct SoftTexture {
    pub desc: TextureDesc,
    pub image: Bitmap,
}

/// Everything a software fragment function can see for one pixel.
pub struct Fragment<'a> {
    /// Interpolated texture coordinate.
    pub tex_coord: [f32; 2],
    /// Window coordinate of the pixel centre.
    pub frag_coord: [f32; 2],
    pub(crate) samplers: &'a [(String, u32)],
    pub(crate) uniforms: &'a [(String, Uniform)],
    pub(crate) textures: &'a HashMap<u32, SoftTexture>,
}

impl Fragment<'_> {
    fn bound(&self, sampler: &str) -> Option<&SoftTexture> {
        self.samplers
            .iter()
            .find(|(name, _)| name == sampler)
            .and_then(|(_, tex)| self.textures.get(tex))
    }

    /// Nearest sample of the texture bound to `sampler`. Unbound samplers
    /// read transparent black.
    pub fn sample(&self, sampler: &str, uv: [f32; 2]) -> [f32; 4] {
        match self.bound(sampler) {
            Some(tex) => sample_nearest(tex, uv),
            None => [0.0; 4],
        }
    }

    /// Allocated size of the texture bound to `sampler`.
    pub fn texture_size(&self, sampler: &str) -> IntPoint {
        self.bound(sampler)
            .map(|tex| tex.image.size())
            .unwrap_or(IntPoint::ZERO)
    }

    pub fn uniform(&self, name: &str) -> Option<Uniform> {
        self.uniforms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| *value)
    }

    pub fn float(&self, name: &str) -> f32 {
        match self.uniform(name) {
            Some(Uniform::Float(v)) => v,
            Some(Uniform::Int(v)) => v as f32,
            _ => 0.0,
        }
    }

    pub fn int(&self, name: &str) -> i32 {
        match self.uniform(name) {
            Some(Uniform::Int(v)) => v,
            Some(Uniform::Float(v)) => v as i32,
            _ => 0,
        }
    }

    pub fn vec2(&self, name: &str) -> [f32; 2] {
        match self.uniform(name) {
            Some(Uniform::Vec2(v)) => v,
            _ => [0.0; 2],
        }
    }

    pub fn vec4(&self, name: &str) -> [f32; 4] {
        match self.uniform(name) {
            Some(Uniform::Vec4(v)) => v,
            _ => [0.0; 4],
        }
    }
}

/// Resolve a texel index against a wrap mode. `None` means the border.
pub(crate) fn wrap(i: i32, extent: i32, mode: WrapMode) -> Option<i32> {
    if extent <= 0 {
        return None;
    }
    match mode {
        WrapMode::ClampToEdge => Some(i.clamp(0, extent - 1)),
        WrapMode::ClampToBorder => (0..extent).contains(&i).then_some(i),
        WrapMode::Repeat => Some(i.rem_euclid(extent)),
        WrapMode::MirroredRepeat => {
            let p = i.rem_euclid(2 * extent);
            Some(if p >= extent { 2 * extent - 1 - p } else { p })
        }
    }
}

fn sample_nearest(tex: &SoftTexture, uv: [f32; 2]) -> [f32; 4] {
    let size = tex.image.size();
    let x = (uv[0] * size.x as f32).floor() as i32;
    let y = (uv[1] * size.y as f32).floor() as i32;
    match (
        wrap(x, size.x, tex.desc.wrap_s),
        wrap(y, size.y, tex.desc.wrap_t),
    ) {
        (Some(x), Some(y)) => tex.image.pixel(x, y),
        _ => [0.0; 4],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_modes() {
        assert_eq!(wrap(-1, 4, WrapMode::ClampToEdge), Some(0));
        assert_eq!(wrap(9, 4, WrapMode::ClampToEdge), Some(3));
        assert_eq!(wrap(-1, 4, WrapMode::ClampToBorder), None);
        assert_eq!(wrap(3, 4, WrapMode::ClampToBorder), Some(3));
        assert_eq!(wrap(-1, 4, WrapMode::Repeat), Some(3));
        assert_eq!(wrap(5, 4, WrapMode::Repeat), Some(1));
        assert_eq!(wrap(4, 4, WrapMode::MirroredRepeat), Some(3));
        assert_eq!(wrap(-1, 4, WrapMode::MirroredRepeat), Some(0));
    }
}
