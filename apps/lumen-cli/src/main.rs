use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use glam::Vec3;
use lumen_assets::{SceneLoad, import_obj, load_missing_texture, load_scene, load_skybox_cubemap};
use lumen_common::{Config, ModelId, Rotation, Transform};
use lumen_remote::RemoteClient;
use lumen_remote::protocol::{GET_OBJECTS, MOVE_OBJECT, ROTATE_OBJECT, SCALE_OBJECT, UPDATE_OBJECT};
use lumen_render::{Camera, FrameToggles, RecordingBackend, SceneRenderer, Skybox};
use lumen_scene::{ObjectInfo, SceneDescription};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumen-cli", about = "CLI tool for lumen scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Remote control server address
    #[arg(long, global = true, default_value = "127.0.0.1:8080")]
    address: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, defaults and the remote API
    Info,
    /// Check a config file and a scene description
    Validate {
        #[arg(long, default_value = "config.yaml")]
        config: PathBuf,
        #[arg(long, default_value = "scene.yaml")]
        scene: PathBuf,
    },
    /// Load a scene and print the draw calls of one frame
    Trace {
        #[arg(long, default_value = "config.yaml")]
        config: PathBuf,
        #[arg(long, default_value = "scene.yaml")]
        scene: PathBuf,
        /// Camera position as x,y,z
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        eye: Option<Vec3>,
        #[arg(long)]
        flashlight: bool,
        #[arg(long)]
        wireframe: bool,
    },
    /// List the objects of a running viewer
    Objects,
    /// Set an object's position
    Move {
        id: u32,
        #[arg(value_parser = parse_vec3, allow_hyphen_values = true)]
        position: Vec3,
    },
    /// Set an object's rotation
    Rotate {
        id: u32,
        /// Rotation axis as x,y,z
        #[arg(value_parser = parse_vec3, allow_hyphen_values = true)]
        axis: Vec3,
        /// Angle in degrees
        #[arg(allow_hyphen_values = true)]
        angle: f32,
    },
    /// Set an object's scale
    Scale {
        id: u32,
        #[arg(value_parser = parse_vec3, allow_hyphen_values = true)]
        scale: Vec3,
    },
    /// Set position, rotation and scale in one request
    Update {
        id: u32,
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        position: Vec3,
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        axis: Vec3,
        #[arg(long, allow_hyphen_values = true)]
        angle: f32,
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        scale: Vec3,
    },
}

/// Parse `x,y,z`.
fn parse_vec3(text: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z, got '{text}'"));
    };
    let parse = |s: &str| {
        s.parse::<f32>()
            .map_err(|e| format!("invalid component '{s}': {e}"))
    };
    Ok(Vec3::new(parse(x)?, parse(y)?, parse(z)?))
}

fn format_object(object: &ObjectInfo) -> String {
    let t = &object.transform;
    format!(
        "{:>4}  {:<20} pos=({:.2}, {:.2}, {:.2}) rot=({:.2}, {:.2}, {:.2}) {:.1}deg scale=({:.2}, {:.2}, {:.2})",
        object.id.to_string(),
        object.name,
        t.position.x,
        t.position.y,
        t.position.z,
        t.rotation.axis.x,
        t.rotation.axis.y,
        t.rotation.axis.z,
        t.rotation.angle_degrees,
        t.scale.x,
        t.scale.y,
        t.scale.z,
    )
}

/// Check both files and try importing every object. Returns one report
/// line per problem.
fn validate(config: &Path, scene: &Path) -> anyhow::Result<Vec<String>> {
    let config =
        Config::load(config).with_context(|| format!("invalid config {}", config.display()))?;
    let description = SceneDescription::load(scene)
        .with_context(|| format!("invalid scene {}", scene.display()))?;

    let mut problems = Vec::new();
    if !config.missing_texture.exists() {
        problems.push(format!(
            "missing texture {} does not exist",
            config.missing_texture.display()
        ));
    }
    if let Some(dir) = &config.skybox {
        if !dir.is_dir() {
            problems.push(format!("skybox directory {} does not exist", dir.display()));
        }
    }
    for (index, object) in description.objects.iter().enumerate() {
        if let Err(e) = import_obj(&object.path) {
            problems.push(format!("object {} ({}): {e}", ModelId(index as u32), object.display_name()));
        }
    }
    Ok(problems)
}

/// Load a scene into the recording backend and render one frame.
fn trace(
    config: &Config,
    description: &SceneDescription,
    eye: Option<Vec3>,
    toggles: FrameToggles,
) -> anyhow::Result<String> {
    let mut backend = RecordingBackend::new();
    match load_missing_texture(&config.missing_texture, &mut backend) {
        Ok(missing) => backend.set_missing_texture(missing),
        Err(e) => tracing::warn!("using a placeholder for the missing texture: {e}"),
    }
    let skybox = match &config.skybox {
        Some(dir) => {
            let cubemap = load_skybox_cubemap(dir, &mut backend)
                .with_context(|| format!("load skybox {}", dir.display()))?;
            Some(Skybox::new(&mut backend, cubemap))
        }
        None => None,
    };
    let renderer = SceneRenderer::new(skybox, config.shininess);

    let SceneLoad { mut scene, skipped } = load_scene(description, &mut backend);
    for (id, e) in &skipped {
        tracing::warn!(%id, "skipped: {e}");
    }

    let mut camera = Camera::from_config(config);
    if let Some(eye) = eye {
        camera.set_position(eye);
    }

    backend.clear_frame();
    let stats = renderer.render_frame(
        &mut backend,
        &mut scene,
        &camera,
        config.aspect_ratio(),
        toggles,
    );
    let mut out = backend.summary();
    out.push_str(&format!(
        "models={} skipped={} draw_calls={}\n",
        stats.models,
        skipped.len(),
        stats.draw_calls
    ));
    Ok(out)
}

fn connect(address: &str) -> anyhow::Result<RemoteClient> {
    RemoteClient::connect(address).with_context(|| format!("connect to {address}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let config = Config::default();
            println!("lumen-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "defaults: {}x{} fov={} maxFov={} clip={}..{} speed={} remote={}",
                config.width,
                config.height,
                config.fov,
                config.max_fov,
                config.render_distance_min,
                config.render_distance_max,
                config.camera_speed,
                config.remote_address
            );
            println!(
                "remote methods: {GET_OBJECTS}, {MOVE_OBJECT}, {ROTATE_OBJECT}, {SCALE_OBJECT}, {UPDATE_OBJECT}"
            );
            println!("keys: WASD move, Space/LeftCtrl up/down, LeftShift sprint, F flashlight, Z wireframe, Esc quit");
        }
        Commands::Validate { config, scene } => {
            let problems = validate(&config, &scene)?;
            if !problems.is_empty() {
                for problem in &problems {
                    println!("  {problem}");
                }
                bail!("{} problem(s) found", problems.len());
            }
            println!("OK: {} and {} are valid", config.display(), scene.display());
        }
        Commands::Trace {
            config,
            scene,
            eye,
            flashlight,
            wireframe,
        } => {
            let config = Config::load(&config)
                .with_context(|| format!("load config {}", config.display()))?;
            let description = SceneDescription::load(&scene)
                .with_context(|| format!("load scene {}", scene.display()))?;
            let out = trace(
                &config,
                &description,
                eye,
                FrameToggles {
                    flashlight,
                    wireframe,
                },
            )?;
            print!("{out}");
        }
        Commands::Objects => {
            let objects = connect(&cli.address)?.get_objects()?;
            println!("{} object(s)", objects.len());
            for object in &objects {
                println!("{}", format_object(object));
            }
        }
        Commands::Move { id, position } => {
            connect(&cli.address)?.move_object(ModelId(id), position)?;
            println!("moved {}", ModelId(id));
        }
        Commands::Rotate { id, axis, angle } => {
            connect(&cli.address)?.rotate_object(ModelId(id), Rotation::new(axis, angle))?;
            println!("rotated {}", ModelId(id));
        }
        Commands::Scale { id, scale } => {
            connect(&cli.address)?.scale_object(ModelId(id), scale)?;
            println!("scaled {}", ModelId(id));
        }
        Commands::Update {
            id,
            position,
            axis,
            angle,
            scale,
        } => {
            let transform = Transform {
                position,
                rotation: Rotation::new(axis, angle),
                scale,
            };
            connect(&cli.address)?.update_object(ModelId(id), transform)?;
            println!("updated {}", ModelId(id));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TRIANGLE: &str = "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    fn scene_with_objects(dir: &Path, paths: &[&str]) -> PathBuf {
        let mut yaml = String::from("objects:\n");
        for (i, path) in paths.iter().enumerate() {
            yaml.push_str(&format!(
                "  - path: {}\n    originZ: {}\n",
                dir.join(path).display(),
                -5 * i as i32
            ));
        }
        let scene = dir.join("scene.yaml");
        fs::write(&scene, yaml).unwrap();
        scene
    }

    #[test]
    fn parses_vectors() {
        assert_eq!(parse_vec3("1,-2.5, 3").unwrap(), Vec3::new(1.0, -2.5, 3.0));
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,2,x").is_err());
    }

    #[test]
    fn cli_accepts_negative_components() {
        let cli = Cli::parse_from(["lumen-cli", "move", "3", "-1,0,-10"]);
        let Commands::Move { id, position } = cli.command else {
            panic!("expected move");
        };
        assert_eq!(id, 3);
        assert_eq!(position, Vec3::new(-1.0, 0.0, -10.0));
    }

    #[test]
    fn validate_reports_unloadable_objects() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tri.obj"), TRIANGLE).unwrap();
        let scene = scene_with_objects(dir.path(), &["tri.obj", "gone.obj"]);
        let config = dir.path().join("config.yaml");
        let missing = dir.path().join("missing.png");
        fs::write(&config, format!("missingTexture: {}\n", missing.display())).unwrap();

        let problems = validate(&config, &scene).unwrap();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("missing texture"));
        assert!(problems[1].contains("#1"));
    }

    #[test]
    fn validate_fails_on_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yaml");
        fs::write(&config, "renderDistanceMin: 10\nrenderDistanceMax: 1\n").unwrap();
        let scene = scene_with_objects(dir.path(), &[]);
        assert!(validate(&config, &scene).is_err());
    }

    #[test]
    fn trace_draws_loaded_objects_farthest_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tri.obj"), TRIANGLE).unwrap();
        let scene = scene_with_objects(dir.path(), &["tri.obj", "missing.obj", "tri.obj"]);
        let description = SceneDescription::load(scene).unwrap();

        let out = trace(
            &Config::default(),
            &description,
            Some(Vec3::new(0.0, 0.0, 5.0)),
            FrameToggles::default(),
        )
        .unwrap();

        assert!(out.contains("models=2 skipped=1 draw_calls=2"));
        // Object 2 sits at z=-10 and must be drawn before object 0 at z=0.
        let far = out.find("at=(0.00, 0.00, -10.00)").unwrap();
        let near = out.find("at=(0.00, 0.00, 0.00)").unwrap();
        assert!(far < near);
    }
}
