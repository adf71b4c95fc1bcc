// Unlit vertex-color shader: clip = projection * view * model * position
pub const SCENE_SHADER: &str = r#"
struct CameraUniform {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
};
@group(0) @binding(0) var<uniform> camera: CameraUniform;

struct ModelUniform {
    transform: mat4x4<f32>,
};
@group(1) @binding(0) var<uniform> mesh: ModelUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(model: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.projection * camera.view * mesh.transform * vec4<f32>(model.position, 1.0);
    out.color = model.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

/// Longest backend log kept in a [`ShaderError`].
pub const MAX_LOG_BYTES: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("shader `{label}` failed to compile:\n{log}")]
    Compile { label: String, log: String },
    #[error("pipeline `{label}` failed to link:\n{log}")]
    Link { label: String, log: String },
}

pub fn compile(device: &wgpu::Device, label: &str, source: &str) -> Result<wgpu::ShaderModule, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label), source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(module),
        Some(err) => {
            let log = truncate_log(&err.to_string(), MAX_LOG_BYTES).to_owned();
            log::error!("shader `{label}` failed to compile:\n{log}");
            Err(ShaderError::Compile { label: label.to_owned(), log })
        }
    }
}

/// Runs `build` inside a validation scope so pipeline errors surface as values.
pub fn link<T>(device: &wgpu::Device, label: &str, build: impl FnOnce() -> T) -> Result<T, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let built = build();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(built),
        Some(err) => {
            let log = truncate_log(&err.to_string(), MAX_LOG_BYTES).to_owned();
            log::error!("pipeline `{label}` failed to link:\n{log}");
            Err(ShaderError::Link { label: label.to_owned(), log })
        }
    }
}

pub fn truncate_log(log: &str, max: usize) -> &str {
    if log.len() <= max {
        return log;
    }
    let mut end = max;
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    &log[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_logs_pass_through() {
        assert_eq!(truncate_log("error: x", MAX_LOG_BYTES), "error: x");
    }

    #[test]
    fn long_logs_are_cut() {
        let log = "e".repeat(2000);
        assert_eq!(truncate_log(&log, MAX_LOG_BYTES).len(), 512);
    }

    #[test]
    fn cut_respects_char_boundaries() {
        // 'é' is two bytes; 3 bytes of budget can only hold one of them.
        assert_eq!(truncate_log("ééé", 3), "é");
    }

    #[test]
    fn scene_shader_declares_entry_points() {
        assert!(SCENE_SHADER.contains("fn vs_main"));
        assert!(SCENE_SHADER.contains("fn fs_main"));
        assert!(SCENE_SHADER.contains("@location(1) color"));
    }
}
