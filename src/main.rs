use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use strokeraster::camera::PlaybackCamera;
use strokeraster::encoding::encode_scene;
use strokeraster::engine::{export_playback, StrokeRenderEngine};
use strokeraster::error::StrokeError;
use strokeraster::export::DirectorySink;
use strokeraster::options::Options;
use strokeraster::scene::{prepass, SceneFile};

/// Tile-based compute rasterizer for volumetric stroke scenes.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML options file; missing sections use defaults.
    #[arg(long, global = true)]
    options: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a window on a scene with an orbit camera.
    View {
        /// Scene JSON file.
        scene: PathBuf,
    },
    /// Render one PNG per recorded camera pose.
    Export {
        /// Scene JSON file.
        scene: PathBuf,
        /// JSON list of `{eye, target, up?, fovy?}` poses.
        #[arg(long)]
        poses: PathBuf,
        /// Output directory; overrides `export.output_dir`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Resolve every `mix` stroke of a scene to a discrete shape family.
    Prepass {
        /// Input scene JSON.
        input: PathBuf,
        /// Output scene JSON.
        output: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), StrokeError> {
    let options = match &args.options {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    match args.command {
        Command::View { scene } => view(scene, options),
        Command::Export { scene, poses, out } => export(&scene, &poses, out, options),
        Command::Prepass { input, output } => {
            let mut scene = SceneFile::load(&input)?;
            let rewritten = prepass::resolve_mixtures(&mut scene);
            scene.save(&output)?;
            log::info!("wrote {} ({rewritten} strokes rewritten)", output.display());
            Ok(())
        }
    }
}

#[cfg(feature = "viewer")]
fn view(scene: PathBuf, options: Options) -> Result<(), StrokeError> {
    strokeraster::Viewer::builder()
        .with_scene(scene)
        .with_options(options)
        .build()
        .run()
}

#[cfg(not(feature = "viewer"))]
fn view(_scene: PathBuf, _options: Options) -> Result<(), StrokeError> {
    Err(StrokeError::Viewer("built without the `viewer` feature".to_owned()))
}

fn export(
    scene: &Path,
    poses: &Path,
    out: Option<PathBuf>,
    mut options: Options,
) -> Result<(), StrokeError> {
    if let Some(dir) = out {
        options.export.output_dir = dir;
    }
    let camera = PlaybackCamera::load(poses, &options.camera)?;
    let encoded = encode_scene(&SceneFile::load(scene)?);
    if !encoded.skipped.is_empty() {
        log::warn!("{} strokes skipped while encoding", encoded.skipped.len());
    }

    let mut sink = DirectorySink::new(&options.export.output_dir);
    let prefix = options.export.file_prefix.clone();
    let mut engine = pollster::block_on(StrokeRenderEngine::headless(Box::new(camera), options))?;
    engine.set_instances(&encoded.records);

    let frames = export_playback(&mut engine, &mut sink, &prefix)?;
    log::info!("{frames} frames written to {}", sink.dir().display());
    Ok(())
}
