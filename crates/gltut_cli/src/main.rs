//! `gltut` command line tool
//!
//! Validates mesh documents, checks the shader library, prints the mesh
//! schema, writes generated meshes and runs tutorials headlessly.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use gltut::application::AppEvent;
use gltut::assets::mesh::generator::MeshKind;
use gltut::assets::mesh::schema::MESH_SCHEMA_RNC;
use gltut::assets::mesh::{MeshData, MeshLayout};
use gltut::core::{Config, TutorialConfig};
use gltut::engine::Engine;
use gltut::input::KeyEvent;
use gltut::render::shader::{ShaderLibrary, BUILTIN_PROGRAMS};
use gltut::render::RecordingBackend;
use gltut::tutorials::{self, TUTORIALS};

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Parser)]
#[command(name = "gltut", version, about = "Mesh, shader and tutorial tooling for the gltut scenes")]
struct Cli {
    /// Log filter used when RUST_LOG is unset; overrides the config file's `log_level`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse and validate mesh documents
    Validate {
        /// Mesh XML files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Reflect and link every built-in program pair
    Shaders {
        /// Directory whose shaders override the built-in sources
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print the mesh document schema (RELAX NG compact)
    Schema,
    /// Write a procedural mesh as XML
    Generate {
        /// Mesh kind, e.g. UnitCubeColor
        kind: String,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a tutorial against the recording backend
    Run {
        /// Tutorial name; `list` prints the available names
        tutorial: String,
        /// Frames to draw
        #[arg(long, default_value_t = 60)]
        frames: u64,
        /// Window width
        #[arg(long)]
        width: Option<u32>,
        /// Window height
        #[arg(long)]
        height: Option<u32>,
        /// Key event at a frame, e.g. `space@10` or `shift+w:repeat@3`
        #[arg(long = "key", value_name = "KEY@FRAME")]
        keys: Vec<String>,
        /// TOML or RON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.command {
        Command::Run { config: Some(path), .. } => Some(load_config(path)?),
        _ => None,
    };
    gltut::foundation::logging::init(log_level(cli.log_level.as_deref(), config.as_ref()));

    match cli.command {
        Command::Validate { files } => validate(&files),
        Command::Shaders { dir } => shaders(dir.as_deref()),
        Command::Schema => {
            print!("{MESH_SCHEMA_RNC}");
            Ok(())
        }
        Command::Generate { kind, output } => generate(&kind, output.as_deref()),
        Command::Run {
            tutorial,
            frames,
            width,
            height,
            keys,
            ..
        } => run(&tutorial, frames, width, height, &keys, config.unwrap_or_default()),
    }
}

fn validate(files: &[PathBuf]) -> Result<()> {
    let mut failures = 0;
    for path in files {
        match MeshData::load(path) {
            Ok(mesh) => {
                let layout = MeshLayout::build(&mesh);
                println!(
                    "{}: ok, {} vertices, {} attributes, {} VAOs, {} {} commands, {} vertex bytes, {} index bytes",
                    path.display(),
                    mesh.vertex_count(),
                    mesh.attributes.len(),
                    mesh.vaos.len(),
                    mesh.commands.len(),
                    if mesh.is_indexed() { "indexed" } else { "array" },
                    layout.vertex_data.len(),
                    layout.index_data.len(),
                );
            }
            Err(err) => {
                println!("{}: {err}", path.display());
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} meshes failed validation", files.len());
    }
    Ok(())
}

fn shaders(dir: Option<&Path>) -> Result<()> {
    let mut library = ShaderLibrary::builtin();
    if let Some(dir) = dir {
        let count = library
            .load_dir(dir)
            .with_context(|| format!("Failed to load shaders from {}", dir.display()))?;
        log::info!("{count} shaders loaded from {}", dir.display());
    }

    let mut failures = 0;
    for (vertex, fragment) in BUILTIN_PROGRAMS {
        match library.link(vertex, fragment) {
            Ok(program) => {
                let uniforms: Vec<&str> = program.uniforms.iter().map(|u| u.name.as_str()).collect();
                let blocks: Vec<&str> = program.blocks.iter().map(|b| b.name.as_str()).collect();
                println!(
                    "{vertex} + {fragment}: {} attributes, uniforms [{}], blocks [{}]",
                    program.attributes.len(),
                    uniforms.join(", "),
                    blocks.join(", ")
                );
            }
            Err(err) => {
                println!("{vertex} + {fragment}: {err}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} programs failed to link", BUILTIN_PROGRAMS.len());
    }
    Ok(())
}

fn generate(kind: &str, output: Option<&Path>) -> Result<()> {
    let kind = MeshKind::from_name(kind).ok_or_else(|| {
        let names: Vec<&str> = MeshKind::ALL.iter().map(|k| k.name()).collect();
        anyhow!("Unknown mesh kind '{kind}', expected one of: {}", names.join(", "))
    })?;
    let xml = kind.generate().to_xml();
    match output {
        Some(path) => {
            std::fs::write(path, xml).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {} to {}", kind.name(), path.display());
        }
        None => print!("{xml}"),
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<TutorialConfig> {
    TutorialConfig::load_from_file(path).with_context(|| format!("Failed to load configuration {}", path.display()))
}

/// The `--log-level` flag, else the config file's level, else the default
fn log_level<'a>(flag: Option<&'a str>, config: Option<&'a TutorialConfig>) -> &'a str {
    flag.or_else(|| config.map(|c| c.log_level.as_str()))
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

/// `KEY@FRAME`; the frame defaults to 0
fn parse_key(arg: &str) -> Result<(u64, KeyEvent)> {
    let (key, frame) = match arg.rsplit_once('@') {
        Some((key, frame)) => {
            let frame = frame.parse().with_context(|| format!("Invalid frame in '{arg}'"))?;
            (key, frame)
        }
        None => (arg, 0),
    };
    let event = key.parse().with_context(|| format!("Invalid key in '{arg}'"))?;
    Ok((frame, event))
}

fn run(
    name: &str,
    frames: u64,
    width: Option<u32>,
    height: Option<u32>,
    keys: &[String],
    mut config: TutorialConfig,
) -> Result<()> {
    if name == "list" {
        for entry in TUTORIALS {
            println!("{:<22}{}", entry.name, entry.description);
        }
        return Ok(());
    }

    if let Some(width) = width {
        config.window.width = width;
    }
    if let Some(height) = height {
        config.window.height = height;
    }

    let tutorial = tutorials::create(name).ok_or_else(|| {
        let names: Vec<&str> = tutorials::registry::names().collect();
        anyhow!("Unknown tutorial '{name}', expected one of: {}", names.join(", "))
    })?;
    let mut engine = Engine::new(config, RecordingBackend::new(), tutorial)?;
    for arg in keys {
        let (frame, event) = parse_key(arg)?;
        engine.schedule(frame, AppEvent::Key(event));
    }

    let drawn = engine.run_frames(frames)?;
    println!("{name}: {drawn} frames");
    println!("{}", engine.backend().summary());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gltut::input::{KeyAction, KeyCode, Modifiers};

    #[test]
    fn test_parse_key_with_frame() {
        let (frame, event) = parse_key("shift+w:repeat@12").unwrap();
        assert_eq!(frame, 12);
        assert_eq!(event.key, KeyCode::W);
        assert_eq!(event.action, KeyAction::Repeat);
        assert_eq!(event.mods, Modifiers::SHIFT);
    }

    #[test]
    fn test_parse_key_defaults_to_first_frame() {
        let (frame, event) = parse_key("space").unwrap();
        assert_eq!(frame, 0);
        assert_eq!(event.key, KeyCode::Space);
        assert!(parse_key("space@soon").is_err());
        assert!(parse_key("nokey@1").is_err());
    }

    #[test]
    fn test_log_level_prefers_flag_then_config() {
        let config = TutorialConfig::default().with_log_level("debug");
        assert_eq!(log_level(None, Some(&config)), "debug");
        assert_eq!(log_level(Some("warn"), Some(&config)), "warn");
        assert_eq!(log_level(None, None), DEFAULT_LOG_LEVEL);

        let cli = Cli::try_parse_from(["gltut", "schema"]).unwrap();
        assert_eq!(cli.log_level, None);
    }

    #[test]
    fn test_log_level_comes_from_config_file() {
        let path = std::env::temp_dir().join(format!("gltut-cli-log-{}.toml", std::process::id()));
        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();
        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(log_level(None, Some(&config)), "debug");
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from(["gltut", "run", "world", "--frames", "3", "--key", "space@1"]).unwrap();
        match cli.command {
            Command::Run { tutorial, frames, keys, .. } => {
                assert_eq!(tutorial, "world");
                assert_eq!(frames, 3);
                assert_eq!(keys, ["space@1"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
