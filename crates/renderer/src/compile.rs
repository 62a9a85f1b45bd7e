//! Shader dialect sources and compilation.
//!
//! The same visual program exists in two textual renderings, one per
//! [`ContextVariant`]. The modern dialect synthesizes the full-screen
//! triangle from the vertex index and closes with the cosine-palette colour
//! at alpha 0.40; the legacy dialect reads positions from an explicit vertex
//! buffer and closes with a tinted grayscale at alpha 0.55. The opacity and
//! palette divergence is deliberate visual tuning carried over from the
//! shipped dialects, not drift to be unified.
//!
//! Compilation goes through naga's GLSL front end inside a wgpu validation
//! error scope so a rejected stage surfaces its diagnostic log instead of
//! panicking the device.

use std::borrow::Cow;

use wgpu::naga::ShaderStage as NagaStage;

use crate::error::RenderError;
use crate::types::{ContextVariant, ShaderStage};

/// Vertex stage, modern dialect: corner coordinates come from the per-vertex
/// index, no buffer bound. The derived UV is produced for interface symmetry
/// with the legacy stage even though the fragment's dominant path reads
/// `gl_FragCoord` instead.
const VERTEX_MODERN: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 POSITIONS[3] = vec2[3](
    vec2(-1.0, -1.0),
    vec2(3.0, -1.0),
    vec2(-1.0, 3.0)
);

void main() {
    vec2 pos = POSITIONS[uint(gl_VertexIndex)];
    v_uv = 0.5 * (pos + vec2(1.0, 1.0));
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Vertex stage, legacy dialect: reads the oversized triangle from a 2-float
/// attribute fed by an explicit 3-vertex buffer.
const VERTEX_LEGACY: &str = r"#version 450
layout(location = 0) in vec2 a_pos;
layout(location = 0) out vec2 v_uv;

void main() {
    v_uv = 0.5 * (a_pos + vec2(1.0, 1.0));
    gl_Position = vec4(a_pos, 0.0, 1.0);
}
";

/// Field math shared verbatim between the two fragment renderings.
///
/// Kept as one block so the dialects cannot drift apart in the algorithm;
/// only the colour epilogues differ. Mirrored on the CPU by [`crate::field`].
const FRAGMENT_COMMON: &str = r"
float hash21(vec2 p) {
    p = fract(p * vec2(123.34, 456.21));
    p += dot(p, p + 45.32);
    return fract(p.x * p.y);
}

vec2 hash22(vec2 p) {
    float n = hash21(p);
    return vec2(n, hash21(p + n));
}

float vnoise(vec2 p) {
    vec2 i = floor(p);
    vec2 f = fract(p);
    vec2 u = f * f * (3.0 - 2.0 * f);

    float a = hash21(i);
    float b = hash21(i + vec2(1.0, 0.0));
    float c = hash21(i + vec2(0.0, 1.0));
    float d = hash21(i + vec2(1.0, 1.0));

    return mix(mix(a, b, u.x), mix(c, d, u.x), u.y);
}

float fbm(vec2 p) {
    float f = 0.0;
    float a = 0.5;
    mat2 m = mat2(1.6, 1.2, -1.2, 1.6);
    for (int i = 0; i < 5; i++) {
        f += a * vnoise(p);
        p = m * p;
        a *= 0.55;
    }
    return f;
}

float worley(vec2 p) {
    vec2 i = floor(p);
    vec2 f = fract(p);
    float dmin = 1e9;

    for (int y = -1; y <= 1; y++) {
        for (int x = -1; x <= 1; x++) {
            vec2 g = vec2(float(x), float(y));
            vec2 o = hash22(i + g);
            o = 0.5 + 0.45 * sin(6.2831 * (o + ubo.u_time * 0.07));
            vec2 r = g + o - f;
            float d = dot(r, r);
            dmin = min(dmin, d);
        }
    }
    return sqrt(dmin);
}

float field_value(vec2 p, float t, out float edge_out) {
    vec2 q = p;
    float n1 = fbm(q * 1.1 + vec2(0.0, t * 0.05));
    float n2 = fbm(q * 1.2 + vec2(t * 0.04, 0.0));
    vec2 warp = vec2(n1, n2) * 0.9;

    float c = worley(q * 2.0 + warp * 1.1);

    float bands = 0.5 + 0.5 * cos((c * 12.0 - t * 0.7) * 3.14159);
    float edge = smoothstep(0.15, 0.55, bands) - smoothstep(0.55, 0.95, bands);
    edge = abs(edge);

    float ripple = sin(length(q + warp * 0.4) * 8.0 - t) * 0.5 + 0.5;

    float v = bands * 0.8 + ripple * 0.2;
    v = mix(v, 1.0 - c, 0.35);
    v = pow(max(v, 0.0), 1.35);
    v *= 0.65 + 0.35 * (1.0 - edge);

    edge_out = edge;
    return v;
}
";

/// Preamble shared by both fragment renderings: IO and the uniform block.
/// The std140 layout must match `FieldUniforms` in `gpu/uniforms.rs`.
const FRAGMENT_PRELUDE: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 out_color;

layout(std140, set = 0, binding = 0) uniform FieldParams {
    vec2 u_resolution;
    float u_time;
    float u_strength;
} ubo;
";

/// Modern colour epilogue: cosine palette mixed over a near-black base,
/// scaled by the inverted edge signal, alpha 0.40.
const FRAGMENT_MAIN_MODERN: &str = r"
void main() {
    vec2 uv = gl_FragCoord.xy / ubo.u_resolution.xy;
    vec2 p = uv * 2.0 - 1.0;
    p.x = p.x * (ubo.u_resolution.x / ubo.u_resolution.y);

    float t = ubo.u_time;
    float edge = 0.0;
    float v = field_value(p, t, edge);

    float tcol = clamp(1.0 - edge, 0.0, 1.0);
    float hue = 0.55 + 0.08 * sin(t * 0.1) + 0.18 * tcol;

    vec3 bias = vec3(0.40, 0.40, 0.42);
    vec3 amp = vec3(0.28, 0.26, 0.24);
    vec3 freq = vec3(1.00, 1.00, 1.00);
    vec3 phase = vec3(0.00, 0.10, 0.20);
    vec3 pal = bias + amp * cos(6.28318 * (freq * hue + phase));

    vec3 base = vec3(0.06, 0.06, 0.0);
    vec3 col = mix(base, pal, 0.55);
    col = col * (0.55 + 0.80 * tcol);

    out_color = vec4(col, 0.40 * ubo.u_strength);
}
";

/// Legacy colour epilogue: tinted grayscale straight from the field value,
/// alpha 0.55.
const FRAGMENT_MAIN_LEGACY: &str = r"
void main() {
    vec2 uv = gl_FragCoord.xy / ubo.u_resolution.xy;
    vec2 p = uv * 2.0 - 1.0;
    p.x = p.x * (ubo.u_resolution.x / ubo.u_resolution.y);

    float t = ubo.u_time;
    float edge = 0.0;
    float v = field_value(p, t, edge);

    vec3 col = vec3(v, v, v);
    col = col * vec3(0.95, 0.98, 1.05);

    out_color = vec4(col, 0.55 * ubo.u_strength);
}
";

/// Returns the vertex source for the given variant.
pub(crate) fn vertex_source(variant: ContextVariant) -> &'static str {
    match variant {
        ContextVariant::Modern => VERTEX_MODERN,
        ContextVariant::Legacy => VERTEX_LEGACY,
    }
}

/// Assembles the fragment source for the given variant.
pub(crate) fn fragment_source(variant: ContextVariant) -> String {
    let epilogue = match variant {
        ContextVariant::Modern => FRAGMENT_MAIN_MODERN,
        ContextVariant::Legacy => FRAGMENT_MAIN_LEGACY,
    };
    format!("{FRAGMENT_PRELUDE}{FRAGMENT_COMMON}{epilogue}")
}

/// Compiles one shader stage, surfacing the naga diagnostic log on rejection.
fn compile_stage(
    device: &wgpu::Device,
    stage: ShaderStage,
    source: Cow<'static, str>,
) -> Result<wgpu::ShaderModule, RenderError> {
    let naga_stage = match stage {
        ShaderStage::Vertex => NagaStage::Vertex,
        ShaderStage::Fragment => NagaStage::Fragment,
    };

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(match stage {
            ShaderStage::Vertex => "blobwall vertex",
            ShaderStage::Fragment => "blobwall fragment",
        }),
        source: wgpu::ShaderSource::Glsl {
            shader: source,
            stage: naga_stage,
            defines: &[],
        },
    });
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::CompileError {
            stage,
            log: error.to_string(),
        });
    }
    Ok(module)
}

/// Compiles the vertex stage matching the context variant.
pub(crate) fn compile_vertex_shader(
    device: &wgpu::Device,
    variant: ContextVariant,
) -> Result<wgpu::ShaderModule, RenderError> {
    compile_stage(
        device,
        ShaderStage::Vertex,
        Cow::Borrowed(vertex_source(variant)),
    )
}

/// Compiles the fragment stage matching the context variant.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    variant: ContextVariant,
) -> Result<wgpu::ShaderModule, RenderError> {
    compile_stage(
        device,
        ShaderStage::Fragment,
        Cow::Owned(fragment_source(variant)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::naga::front::glsl::{Frontend, Options};
    use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

    fn assert_parses(stage: NagaStage, source: &str, what: &str) {
        let mut frontend = Frontend::default();
        let module = frontend
            .parse(&Options::from(stage), source)
            .unwrap_or_else(|err| panic!("{what} failed to parse: {err:?}"));
        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .unwrap_or_else(|err| panic!("{what} failed validation: {err:?}"));
    }

    #[test]
    fn both_vertex_dialects_are_valid_glsl() {
        assert_parses(
            NagaStage::Vertex,
            vertex_source(ContextVariant::Modern),
            "modern vertex",
        );
        assert_parses(
            NagaStage::Vertex,
            vertex_source(ContextVariant::Legacy),
            "legacy vertex",
        );
    }

    #[test]
    fn both_fragment_dialects_are_valid_glsl() {
        assert_parses(
            NagaStage::Fragment,
            &fragment_source(ContextVariant::Modern),
            "modern fragment",
        );
        assert_parses(
            NagaStage::Fragment,
            &fragment_source(ContextVariant::Legacy),
            "legacy fragment",
        );
    }

    #[test]
    fn dialects_keep_their_distinct_alpha_constants() {
        let modern = fragment_source(ContextVariant::Modern);
        let legacy = fragment_source(ContextVariant::Legacy);
        assert!(modern.contains("0.40 * ubo.u_strength"));
        assert!(legacy.contains("0.55 * ubo.u_strength"));
    }

    #[test]
    fn only_the_legacy_vertex_reads_an_attribute() {
        assert!(vertex_source(ContextVariant::Legacy).contains("in vec2 a_pos"));
        assert!(!vertex_source(ContextVariant::Modern).contains("in vec2"));
        assert!(vertex_source(ContextVariant::Modern).contains("gl_VertexIndex"));
    }

    #[test]
    fn fragment_renderings_share_the_field_math() {
        for variant in [ContextVariant::Modern, ContextVariant::Legacy] {
            let source = fragment_source(variant);
            assert!(source.contains("float hash21"));
            assert!(source.contains("mat2(1.6, 1.2, -1.2, 1.6)"));
            assert!(source.contains("6.2831 * (o + ubo.u_time * 0.07)"));
        }
    }
}
