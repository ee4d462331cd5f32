/// WGSL shader for lit instanced boxes: ambient, one spot light and four
/// point lights, Lambert diffuse only.
pub const BOX_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    ambient: vec4<f32>,
    // w > 0.5 when the spot light is on
    spot_position: vec4<f32>,
    // w = cosine of the cone half-angle
    spot_direction: vec4<f32>,
    spot_color: vec4<f32>,
    // w = range
    point_positions: array<vec4<f32>, 4>,
    // w = intensity
    point_colors: array<vec4<f32>, 4>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) world_pos: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_normal = normalize(world_normal);
    out.world_pos = world_pos.xyz;
    out.color = instance.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    var light = uniforms.ambient.rgb;

    if (uniforms.spot_position.w > 0.5) {
        let l = normalize(uniforms.spot_position.xyz - in.world_pos);
        let axis = normalize(uniforms.spot_direction.xyz);
        if (dot(-l, axis) > uniforms.spot_direction.w) {
            light += uniforms.spot_color.rgb * max(dot(n, l), 0.0);
        }
    }

    for (var i = 0u; i < 4u; i = i + 1u) {
        let to_light = uniforms.point_positions[i].xyz - in.world_pos;
        let dist = max(length(to_light), 0.0001);
        let falloff = clamp(1.0 - dist / uniforms.point_positions[i].w, 0.0, 1.0);
        let diffuse = max(dot(n, to_light / dist), 0.0);
        light += uniforms.point_colors[i].rgb * uniforms.point_colors[i].w * falloff * diffuse;
    }

    return vec4<f32>(in.color.rgb * light, in.color.a);
}
"#;

/// WGSL shader for unlit helper lines (axes, spot light cone).
pub const LINE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct LineVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_line(vertex: LineVertex) -> LineOutput {
    var out: LineOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_line(in: LineOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
