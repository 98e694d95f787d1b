//! GLSL dialects the shader sources are written against.

/// Supported GLSL targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlslVersion {
    #[default]
    Glsl120,
    Glsl140,
}

impl GlslVersion {
    /// Preamble for a vertex shader. Sources are written in the 1.20 idiom
    /// (`attribute`, `varying`, `texture2D`); the 1.40 preamble maps those
    /// keywords onto their core equivalents.
    pub fn vertex_header(self) -> &'static str {
        match self {
            GlslVersion::Glsl120 => "#version 120\n",
            GlslVersion::Glsl140 => {
                "#version 140\n#define attribute in\n#define varying out\n#define texture2D texture\n"
            }
        }
    }

    /// Preamble for a fragment shader.
    pub fn fragment_header(self) -> &'static str {
        match self {
            GlslVersion::Glsl120 => "#version 120\n",
            GlslVersion::Glsl140 => {
                "#version 140\n#define varying in\n#define texture2D texture\nout vec4 glmux_FragColor;\n#define gl_FragColor glmux_FragColor\n"
            }
        }
    }
}
