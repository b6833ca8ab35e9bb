use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use body_overlay::config::Config;
use body_overlay::foundation::logging;
use body_overlay::prelude::*;
use clap::{Args, Parser, Subcommand};

mod scene_file;
use scene_file::{read_vertices, SceneDescription};

#[derive(Debug, Parser)]
#[command(name = "overlay", about = "Renders body meshes over background frames with a weak-perspective camera")]
struct Cli {
    /// Renderer configuration file (.toml or .ron)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Render triangle edges only
    #[arg(long, global = true)]
    wireframe: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render one body mesh over a frame
    Human(HumanArgs),
    /// Render one object mesh over a frame
    Object(ObjectArgs),
    /// Push every mesh of a scene file and render them together
    Scene(SceneArgs),
    /// Unproject a pixel through a weak-perspective camera
    Unproject(UnprojectArgs),
    /// Write the default renderer configuration
    DefaultConfig {
        /// Destination (.toml or .ron)
        output: PathBuf,
    },
}

#[derive(Debug, Args)]
struct CameraArg {
    /// Weak-perspective camera
    #[arg(long, num_args = 4, value_names = ["SX", "SY", "TX", "TY"], allow_negative_numbers = true, required = true)]
    camera: Vec<f32>,
}

impl CameraArg {
    fn params(&self) -> Result<CameraParams> {
        let [sx, sy, tx, ty] = <[f32; 4]>::try_from(self.camera.as_slice())
            .map_err(|_| anyhow::anyhow!("--camera takes exactly four values"))?;
        CameraParams::new(sx, sy, tx, ty).context("Invalid camera parameters")
    }
}

#[derive(Debug, Args)]
struct HumanArgs {
    /// Background frame
    #[arg(short, long)]
    background: PathBuf,
    /// OBJ with the body vertices
    #[arg(short, long)]
    mesh: PathBuf,
    /// OBJ providing the face table; defaults to the faces of --mesh
    #[arg(short, long)]
    template: Option<PathBuf>,
    #[command(flatten)]
    camera: CameraArg,
    /// Extra rotation angle in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    angle: f32,
    /// Extra rotation axis
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [0.0, 1.0, 0.0], allow_negative_numbers = true)]
    axis: Vec<f32>,
    /// Mesh color
    #[arg(long, num_args = 3, value_names = ["R", "G", "B"])]
    color: Option<Vec<f32>>,
    /// Write the coordinate-corrected mesh here
    #[arg(long)]
    export: Option<PathBuf>,
    /// Output frame
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Debug, Args)]
struct ObjectArgs {
    /// Background frame
    #[arg(short, long)]
    background: PathBuf,
    /// OBJ mesh
    #[arg(short, long)]
    mesh: PathBuf,
    #[command(flatten)]
    camera: CameraArg,
    /// Translation
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [0.0, 0.0, 0.0], allow_negative_numbers = true)]
    translate: Vec<f32>,
    /// Rotation angle in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    angle: f32,
    /// Rotation axis
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [1.0, 0.0, 0.0], allow_negative_numbers = true)]
    axis: Vec<f32>,
    /// Per-axis scale
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [1.0, 1.0, 1.0])]
    scale: Vec<f32>,
    /// Mesh color
    #[arg(long, num_args = 3, value_names = ["R", "G", "B"])]
    color: Option<Vec<f32>>,
    /// Output frame
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Debug, Args)]
struct SceneArgs {
    /// Scene description (.toml or .ron)
    scene: PathBuf,
    /// Output frame
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Debug, Args)]
struct UnprojectArgs {
    #[command(flatten)]
    camera: CameraArg,
    /// Pixel column
    x: f32,
    /// Pixel row
    y: f32,
}

fn triple(values: &[f32], name: &str) -> Result<[f32; 3]> {
    <[f32; 3]>::try_from(values).map_err(|_| anyhow::anyhow!("--{name} takes exactly three values"))
}

fn load_config(cli: &Cli) -> Result<RendererConfig> {
    let mut config = match &cli.config {
        Some(path) => RendererConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => RendererConfig::default(),
    };
    if cli.wireframe {
        config = config.with_wireframe(true);
    }
    if let Some(level) = &cli.log_level {
        config = config.with_log_level(level.clone());
    }
    Ok(config)
}

/// Size the session after the background it composites onto
fn fit_to(config: RendererConfig, background: &image::RgbImage) -> RendererConfig {
    let resolution = background.dimensions();
    if config.resolution != resolution {
        log::debug!("Using background resolution {:?} instead of {:?}", resolution, config.resolution);
    }
    RendererConfig { resolution, ..config }
}

fn load_frame(path: &Path) -> Result<image::RgbImage> {
    load_background(path).with_context(|| format!("Failed to load background {}", path.display()))
}

/// Tear the session down whatever `result` is; a render error wins over a teardown error
fn finish<R: Rasterizer>(session: RenderSession<R>, result: Result<()>) -> Result<()> {
    let torn = session.teardown().context("Session teardown failed");
    result?;
    torn.map(drop)
}

fn run_human(config: RendererConfig, args: &HumanArgs) -> Result<()> {
    let background = load_frame(&args.background)?;
    let template = args.template.as_ref().unwrap_or(&args.mesh);
    let body = BodyTopology::from_obj(template)
        .with_context(|| format!("Failed to load body template {}", template.display()))?;
    let vertices = read_vertices(&args.mesh)?;

    let rotation = (args.angle != 0.0)
        .then(|| triple(&args.axis, "axis").map(|axis| AxisRotation::new(args.angle, axis)))
        .transpose()?;
    let color = args.color.as_deref().map(|c| triple(c, "color")).transpose()?;

    let camera = args.camera.params()?;

    let mut session = RenderSession::with_software(fit_to(config, &background), body)?;
    let result = session
        .render(&background, &vertices, camera, rotation, args.export.as_deref(), color)
        .context("Body render failed")
        .and_then(|frame| Ok(save_frame(&frame, &args.output)?));
    finish(session, result)
}

fn run_object(config: RendererConfig, args: &ObjectArgs) -> Result<()> {
    let background = load_frame(&args.background)?;

    let mut placement = ObjectPlacement::at(triple(&args.translate, "translate")?)
        .with_rotation(args.angle, triple(&args.axis, "axis")?)
        .with_scale(triple(&args.scale, "scale")?);
    if let Some(color) = &args.color {
        placement = placement.with_color(triple(color, "color")?);
    }

    let camera = args.camera.params()?;

    let body = BodyTopology::from_triangles(Vec::<[u32; 3]>::new());
    let mut session = RenderSession::with_software(fit_to(config, &background), body)?;
    let result = session
        .render_obj(&background, &args.mesh, camera, &placement)
        .with_context(|| format!("Object render of {} failed", args.mesh.display()))
        .and_then(|frame| Ok(save_frame(&frame, &args.output)?));
    finish(session, result)
}

fn run_scene(config: RendererConfig, args: &SceneArgs) -> Result<()> {
    let mut scene = SceneDescription::load_from_file(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;
    if let Some(base) = args.scene.parent() {
        scene.resolve_paths(base);
    }

    let config = match &scene.background {
        Some(path) => fit_to(config, &load_frame(path)?),
        None => config,
    };
    let mut session = RenderSession::with_software(config, scene.topology()?)?;
    let result = scene
        .render(&mut session)
        .and_then(|frame| Ok(save_frame(&frame, &args.output)?));
    finish(session, result)
}

fn run_unproject(config: RendererConfig, args: &UnprojectArgs) -> Result<()> {
    let camera = args.camera.params()?;

    let mut session = RenderSession::with_software(config, BodyTopology::from_triangles(Vec::<[u32; 3]>::new()))?;
    let result = session
        .push_cam(camera)
        .and_then(|()| session.screenspace_to_worldspace(args.x, args.y))
        .map(|world| println!("{:.6} {:.6} {:.6} {:.6}", world.x, world.y, world.z, world.w))
        .map_err(anyhow::Error::from);
    finish(session, result)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    logging::init_with_level(&config.logging.level);

    match &cli.command {
        Command::Human(args) => run_human(config, args),
        Command::Object(args) => run_object(config, args),
        Command::Scene(args) => run_scene(config, args),
        Command::Unproject(args) => run_unproject(config, args),
        Command::DefaultConfig { output } => {
            config
                .save_to_file(output)
                .with_context(|| format!("Failed to write configuration to {}", output.display()))?;
            log::info!("Wrote configuration to {}", output.display());
            Ok(())
        }
    }
}
