//! Shader sources shared by every filter, and their CPU counterparts.

/// Alpha helpers every filter fragment shader can call.
pub const STD_SHADER_CODE: &str = "\
void unPreMultiplyAlpha(inout vec4 color)
{
    if (color.a > 0.0) {
        color.rgb /= color.a;
    }
}

void preMultiplyAlpha(inout vec4 color)
{
    color.rgb *= color.a;
}

";

/// Vertex stage used by all filter programs.
pub const VERTEX_SHADER: &str = "\
uniform mat4 transform;
attribute vec3 pos;
attribute vec2 texCoord;
varying vec2 vTexCoord;

void main()
{
    vTexCoord = texCoord;
    gl_Position = transform * vec4(pos, 1.0);
}
";

/// Fragment source with the standard helpers prepended.
pub fn filter_fragment(body: &str) -> String {
    format!("{STD_SHADER_CODE}{body}")
}

/// Scale rgb by alpha.
pub fn pre_multiply_alpha(c: [f32; 4]) -> [f32; 4] {
    [c[0] * c[3], c[1] * c[3], c[2] * c[3], c[3]]
}

/// Divide rgb by alpha. Colours with zero alpha are returned unchanged.
pub fn un_pre_multiply_alpha(c: [f32; 4]) -> [f32; 4] {
    if c[3] > 0.0 {
        [c[0] / c[3], c[1] / c[3], c[2] / c[3], c[3]]
    } else {
        c
    }
}
