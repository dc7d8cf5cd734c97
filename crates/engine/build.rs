const SHADERS: &[&str] = &["src/layers/renderer/shader.wgsl"];

/// Entry points the render pipelines look up by name
const ENTRY_POINTS: &[(naga::ShaderStage, &str)] = &[
    (naga::ShaderStage::Vertex, "vertex"),
    (naga::ShaderStage::Fragment, "fragment"),
];

fn main() {
    for path in SHADERS {
        println!("cargo:rerun-if-changed={}", path);
        check_shader(path);
    }
}

fn check_shader(path: &str) {
    let source = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read shader file {}: {}", path, e));

    let module = naga::front::wgsl::parse_str(&source)
        .unwrap_or_else(|e| panic!("Shader parsing failed for {}:\n{}", path, e.emit_to_string(&source)));

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    if let Err(e) = validator.validate(&module) {
        panic!("Shader validation failed for {}:\n{:?}", path, e);
    }

    for (stage, name) in ENTRY_POINTS {
        let found = module
            .entry_points
            .iter()
            .any(|entry| entry.stage == *stage && entry.name == *name);
        if !found {
            panic!("{} has no {:?} entry point named '{}'", path, stage, name);
        }
    }
}
