//! WGSL sources. Both programs share the `Uniforms` block layout at group 0;
//! the skybox shader declares only the prefix it reads.

/// Textured meshes lit by the directional sun and the camera spot light.
pub const LIGHTING_SHADER: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    // xyz: camera position, w: shininess
    view_pos: vec4<f32>,
    dir_direction: vec4<f32>,
    dir_ambient: vec4<f32>,
    dir_diffuse: vec4<f32>,
    dir_specular: vec4<f32>,
    // w: enabled flag
    spot_position: vec4<f32>,
    // w: cos of inner cone
    spot_direction: vec4<f32>,
    // w: cos of outer cone
    spot_ambient: vec4<f32>,
    spot_diffuse: vec4<f32>,
    spot_specular: vec4<f32>,
    // x: constant, y: linear, z: quadratic
    spot_attenuation: vec4<f32>,
    // x: has diffuse, y: has specular, z: point light count
    flags: vec4<u32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

@group(1) @binding(0) var texture_diffuse1: texture_2d<f32>;
@group(1) @binding(1) var texture_specular1: texture_2d<f32>;
@group(1) @binding(2) var texture_normal1: texture_2d<f32>;
@group(1) @binding(3) var texture_height1: texture_2d<f32>;
@group(1) @binding(4) var missing_texture: texture_2d<f32>;
@group(1) @binding(5) var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = u.model * vec4<f32>(in.position, 1.0);
    // Uniform scale assumed; non-uniform scale slightly skews normals.
    let normal = (u.model * vec4<f32>(in.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = u.projection * u.view * world;
    out.world_position = world.xyz;
    out.normal = normal;
    out.tex_coords = in.tex_coords;
    return out;
}

fn directional(normal: vec3<f32>, view_dir: vec3<f32>, albedo: vec3<f32>, spec: vec3<f32>) -> vec3<f32> {
    let light_dir = normalize(-u.dir_direction.xyz);
    let diff = max(dot(normal, light_dir), 0.0);
    let reflect_dir = reflect(-light_dir, normal);
    let s = pow(max(dot(view_dir, reflect_dir), 0.0), u.view_pos.w);
    return u.dir_ambient.xyz * albedo + u.dir_diffuse.xyz * diff * albedo + u.dir_specular.xyz * s * spec;
}

fn spot(normal: vec3<f32>, frag_pos: vec3<f32>, view_dir: vec3<f32>, albedo: vec3<f32>, spec: vec3<f32>) -> vec3<f32> {
    let light_dir = normalize(u.spot_position.xyz - frag_pos);
    let diff = max(dot(normal, light_dir), 0.0);
    let reflect_dir = reflect(-light_dir, normal);
    let s = pow(max(dot(view_dir, reflect_dir), 0.0), u.view_pos.w);

    let distance = length(u.spot_position.xyz - frag_pos);
    let att = u.spot_attenuation;
    let attenuation = 1.0 / (att.x + att.y * distance + att.z * distance * distance);

    let theta = dot(light_dir, normalize(-u.spot_direction.xyz));
    let epsilon = u.spot_direction.w - u.spot_ambient.w;
    let intensity = clamp((theta - u.spot_ambient.w) / epsilon, 0.0, 1.0);

    let ambient = u.spot_ambient.xyz * albedo;
    let diffuse = u.spot_diffuse.xyz * diff * albedo;
    let specular = u.spot_specular.xyz * s * spec;
    return (ambient + (diffuse + specular) * intensity) * attenuation;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let diffuse = textureSample(texture_diffuse1, material_sampler, in.tex_coords);
    let fallback = textureSample(missing_texture, material_sampler, in.tex_coords);
    let specular = textureSample(texture_specular1, material_sampler, in.tex_coords).rgb;
    let color = select(fallback, diffuse, u.flags.x != 0u);
    let spec = select(vec3<f32>(0.5), specular, u.flags.y != 0u);
    if (color.a < 0.1) {
        discard;
    }

    let normal = normalize(in.normal);
    let view_dir = normalize(u.view_pos.xyz - in.world_position);
    var result = directional(normal, view_dir, color.rgb, spec);
    if (u.spot_position.w != 0.0) {
        result += spot(normal, in.world_position, view_dir, color.rgb, spec);
    }
    return vec4<f32>(result, color.a);
}
"#;

/// Cubemap background. Depth is forced to the far plane with `xyww`.
pub const SKYBOX_SHADER: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;
@group(1) @binding(0) var skybox: texture_cube<f32>;
@group(1) @binding(1) var skybox_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    let clip = u.projection * u.view * vec4<f32>(position, 1.0);
    var out: VertexOutput;
    out.clip_position = clip.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(skybox, skybox_sampler, in.direction);
}
"#;
