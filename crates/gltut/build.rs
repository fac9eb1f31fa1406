// build.rs
// Shader sources are embedded with include_str!, so a change to any file under
// resources/ must rebuild the crate.

use std::path::Path;

const SHADER_EXTENSIONS: [&str; 2] = ["vert", "frag"];

fn watch_dir(dir: &Path, shader_count: &mut usize) {
    println!("cargo:rerun-if-changed={}", dir.display());

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => {
            println!("cargo:warning=resource directory {} not found", dir.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            watch_dir(&path, shader_count);
            continue;
        }
        println!("cargo:rerun-if-changed={}", path.display());

        let is_shader = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SHADER_EXTENSIONS.contains(&ext));
        if is_shader {
            *shader_count += 1;
        }
    }
}

fn main() {
    let mut shader_count = 0;
    watch_dir(Path::new("resources"), &mut shader_count);
    if shader_count == 0 {
        println!("cargo:warning=no GLSL sources under resources/shaders");
    }
}
