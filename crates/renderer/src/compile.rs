use crate::error::RenderError;
use crate::types::ThreadGroup;

/// Maps a surface format onto the WGSL storage-texture format name used for
/// the output binding. Only formats WGSL can store to are listed; sRGB
/// variants are never storage-capable.
pub fn storage_format_name(format: wgpu::TextureFormat) -> Option<&'static str> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => Some("rgba8unorm"),
        wgpu::TextureFormat::Bgra8Unorm => Some("bgra8unorm"),
        wgpu::TextureFormat::Rgba16Float => Some("rgba16float"),
        wgpu::TextureFormat::Rgba32Float => Some("rgba32float"),
        _ => None,
    }
}

/// Produces a self-contained WGSL module from a kernel source.
///
/// Steps performed:
///
/// 1. Hoist global directives (`enable`, `requires`, `diagnostic`) so they
///    stay ahead of every declaration.
/// 2. Prepend the prelude, which declares the `Uniforms` struct, the three
///    contract bindings with the output format substituted, and the
///    `GROUP_WIDTH`/`GROUP_HEIGHT` constants kernels pass to
///    `@workgroup_size`.
///
/// Sources that declare their own group-0 bindings or `Uniforms` struct are
/// rejected; the prelude owns both.
pub fn wrap_kernel_source(
    source: &str,
    output_format: wgpu::TextureFormat,
    group: ThreadGroup,
) -> Result<String, RenderError> {
    let format_name = storage_format_name(output_format).ok_or_else(|| {
        RenderError::initialization(format!(
            "surface format {output_format:?} cannot be bound as a storage texture"
        ))
    })?;

    let mut directives = String::new();
    let mut body = String::new();
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("@group(0)") {
            return Err(RenderError::initialization(
                "kernel source redeclares a group 0 binding owned by the prelude",
            ));
        }
        if declares_uniforms_struct(trimmed) {
            return Err(RenderError::initialization(
                "kernel source redeclares the Uniforms struct owned by the prelude",
            ));
        }
        if trimmed.starts_with("enable ")
            || trimmed.starts_with("requires ")
            || trimmed.starts_with("diagnostic(")
        {
            directives.push_str(line);
            directives.push('\n');
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }

    let prelude = PRELUDE
        .replace("{output_format}", format_name)
        .replace("{group_width}", &group.width.to_string())
        .replace("{group_height}", &group.height.to_string());

    Ok(format!("{directives}{prelude}\n{body}"))
}

/// True for `struct Uniforms` itself, not for structs that merely share the prefix.
fn declares_uniforms_struct(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("struct") else {
        return false;
    };
    if !rest.starts_with(char::is_whitespace) {
        return false;
    }
    rest.trim_start()
        .strip_prefix("Uniforms")
        .is_some_and(|tail| tail.is_empty() || tail.starts_with(|c: char| c.is_whitespace() || c == '{'))
}

/// WGSL prologue injected ahead of every kernel.
///
/// `Uniforms` must match [`crate::Uniforms`] field for field.
const PRELUDE: &str = r"struct Uniforms {
    width: u32,
    height: u32,
    frame_index: u32,
}

@group(0) @binding(0) var accumulation_texture: texture_storage_2d<rgba16float, read_write>;
@group(0) @binding(1) var output_texture: texture_storage_2d<{output_format}, write>;
@group(0) @binding(2) var<uniform> uniforms: Uniforms;

const GROUP_WIDTH: u32 = {group_width}u;
const GROUP_HEIGHT: u32 = {group_height}u;
";

#[cfg(test)]
mod tests {
    use super::*;

    const KERNEL: &str = r"
@compute @workgroup_size(GROUP_WIDTH, GROUP_HEIGHT, 1)
fn pathtrace_kernel(@builtin(global_invocation_id) id: vec3<u32>) {
    if (id.x >= uniforms.width || id.y >= uniforms.height) {
        return;
    }
    textureStore(output_texture, vec2<i32>(id.xy), vec4<f32>(1.0));
}
";

    fn group() -> ThreadGroup {
        ThreadGroup::for_pipeline(8, 256)
    }

    #[test]
    fn prelude_declares_contract_bindings() {
        let wrapped =
            wrap_kernel_source(KERNEL, wgpu::TextureFormat::Bgra8Unorm, group()).unwrap();

        assert!(wrapped.contains("@group(0) @binding(0) var accumulation_texture: texture_storage_2d<rgba16float, read_write>;"));
        assert!(wrapped.contains("@group(0) @binding(1) var output_texture: texture_storage_2d<bgra8unorm, write>;"));
        assert!(wrapped.contains("@group(0) @binding(2) var<uniform> uniforms: Uniforms;"));
        assert!(wrapped.contains("const GROUP_WIDTH: u32 = 8u;"));
        assert!(wrapped.contains("const GROUP_HEIGHT: u32 = 32u;"));
        assert!(wrapped.contains("fn pathtrace_kernel"));
        assert!(!wrapped.contains("{output_format}"));
        assert!(!wrapped.contains("{group_width}"));
    }

    #[test]
    fn uniforms_struct_lists_fields_in_contract_order() {
        let wrapped =
            wrap_kernel_source(KERNEL, wgpu::TextureFormat::Rgba8Unorm, group()).unwrap();
        let width = wrapped.find("width: u32").unwrap();
        let height = wrapped.find("height: u32").unwrap();
        let frame = wrapped.find("frame_index: u32").unwrap();
        assert!(width < height && height < frame);
    }

    #[test]
    fn directives_stay_ahead_of_the_prelude() {
        let source = format!("enable f16;\n{KERNEL}");
        let wrapped =
            wrap_kernel_source(&source, wgpu::TextureFormat::Rgba8Unorm, group()).unwrap();
        assert!(wrapped.starts_with("enable f16;\n"));
        assert_eq!(wrapped.matches("enable f16;").count(), 1);
    }

    #[test]
    fn rejects_sources_that_bind_group_zero() {
        let source = format!("@group(0) @binding(3) var<uniform> extra: vec4<f32>;\n{KERNEL}");
        let err =
            wrap_kernel_source(&source, wgpu::TextureFormat::Rgba8Unorm, group()).unwrap_err();
        assert!(matches!(err, RenderError::Initialization(_)));
    }

    #[test]
    fn rejects_sources_that_redefine_uniforms() {
        let source = format!("struct Uniforms {{ width: u32 }}\n{KERNEL}");
        assert!(wrap_kernel_source(&source, wgpu::TextureFormat::Rgba8Unorm, group()).is_err());

        let spaced = format!("struct  Uniforms{{ width: u32 }}\n{KERNEL}");
        assert!(wrap_kernel_source(&spaced, wgpu::TextureFormat::Rgba8Unorm, group()).is_err());
    }

    #[test]
    fn accepts_structs_that_only_share_the_uniforms_prefix() {
        let source = format!(
            "struct UniformsExtra {{ exposure: f32 }}\nstruct Uniforms2 {{ x: u32 }}\n{KERNEL}"
        );
        let wrapped =
            wrap_kernel_source(&source, wgpu::TextureFormat::Rgba8Unorm, group()).unwrap();
        assert!(wrapped.contains("struct UniformsExtra {"));
        assert!(wrapped.contains("struct Uniforms2 {"));
    }

    #[test]
    fn rejects_formats_that_cannot_be_stored() {
        let err = wrap_kernel_source(KERNEL, wgpu::TextureFormat::Bgra8UnormSrgb, group())
            .unwrap_err();
        assert!(err.to_string().contains("Bgra8UnormSrgb"));
        assert_eq!(storage_format_name(wgpu::TextureFormat::Rgba8UnormSrgb), None);
        assert_eq!(
            storage_format_name(wgpu::TextureFormat::Rgba16Float),
            Some("rgba16float")
        );
    }
}
