use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fbfsvg::{
    AnimationController, CompositorCell, DirtyRect, GridCompositor, GridConfig, Player,
    PlayerConfig, RenderContext, RenderContextOpts, SmilAnimation, extract_animation_bounds,
    format_time,
};

#[derive(Parser, Debug)]
#[command(name = "fbfsvg", version)]
struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the animations in an SVG document.
    Info(InfoArgs),
    /// Report full/partial render decisions for a simulated playback run.
    Simulate(SimulateArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Lay several SVG documents out in one grid document.
    Compose(ComposeArgs),
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input SVG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Player configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input SVG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Display refresh rate driving the simulated clock.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Simulated wall time.
    #[arg(long, default_value_t = 5.0)]
    seconds: f64,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Player configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input SVG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Timeline position in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Player configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Output SVG path.
    #[arg(long)]
    out: PathBuf,

    /// Cells per row.
    #[arg(long, default_value_t = 3)]
    columns: usize,

    /// Output width.
    #[arg(long, default_value_t = 1920.0)]
    width: f32,

    /// Output height.
    #[arg(long, default_value_t = 1080.0)]
    height: f32,

    /// Caption each cell with its file name.
    #[arg(long, default_value_t = false)]
    labels: bool,

    /// Input SVG documents, in grid order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(serde::Serialize)]
struct InfoReport<'a> {
    file: &'a Path,
    duration: f64,
    duration_text: String,
    total_frames: usize,
    frame_rate: f64,
    animations: Vec<SmilAnimation>,
    bounds: BTreeMap<String, DirtyRect>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Simulate(args) => cmd_simulate(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Compose(args) => cmd_compose(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PlayerConfig> {
    match path {
        Some(path) => Ok(PlayerConfig::from_json_file(path)?),
        None => Ok(PlayerConfig::default()),
    }
}

fn read_svg(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read svg '{}'", path.display()))
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let controller = AnimationController::with_opts(config.controller);
    controller.load_from_file(&args.in_path)?;

    let animations = controller.animations();
    let bounds = extract_animation_bounds(&controller.processed_content(), &animations);
    let report = InfoReport {
        file: &args.in_path,
        duration: controller.duration(),
        duration_text: format_time(controller.duration()),
        total_frames: controller.total_frames(),
        frame_rate: controller.frame_rate(),
        animations,
        bounds,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("file:        {}", report.file.display());
    println!(
        "duration:    {} ({:.3}s)",
        report.duration_text, report.duration
    );
    println!("frames:      {}", report.total_frames);
    println!("frame rate:  {:.3} fps", report.frame_rate);
    println!("animations:  {}", report.animations.len());
    for anim in &report.animations {
        let bounds = report.bounds.get(&anim.target_id).map_or_else(
            || "unknown".to_owned(),
            |r| format!("{},{} {}x{}", r.x, r.y, r.width, r.height),
        );
        println!(
            "  #{:<24} {:<12} {:>4} values  {:.3}s  repeat={}  bounds={}",
            anim.target_id,
            anim.attribute_name,
            anim.values.len(),
            anim.duration,
            anim.repeat,
            bounds
        );
    }
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    if !(args.fps > 0.0 && args.fps.is_finite()) {
        anyhow::bail!("--fps must be positive");
    }
    if !(args.seconds >= 0.0 && args.seconds.is_finite()) {
        anyhow::bail!("--seconds must be >= 0");
    }

    let config = load_config(args.config.as_deref())?;
    let ctx = RenderContext::new(&RenderContextOpts {
        load_system_fonts: false,
        ..RenderContextOpts::default()
    });
    let svg = read_svg(&args.in_path)?;
    let mut player = Player::load(&ctx, &svg, config)?;
    player.controller().play();

    let frames = (args.fps * args.seconds).ceil().min(f64::from(u32::MAX)) as u32;
    let summary = player.simulate(1.0 / args.fps, frames);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("frames:         {}", summary.frames);
    println!("changed:        {}", summary.changed_frames);
    println!("skipped:        {}", summary.skipped);
    println!("full renders:   {}", summary.full);
    println!("partial renders: {}", summary.partial);
    println!(
        "mean partial coverage: {:.2}%",
        summary.mean_partial_coverage * 100.0
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let resources_dir = args.in_path.parent().map(Path::to_path_buf);
    let ctx = RenderContext::new(&RenderContextOpts {
        resources_dir,
        ..RenderContextOpts::default()
    });

    let svg = read_svg(&args.in_path)?;
    let mut player = Player::load(&ctx, &svg, config)?;
    player.controller().seek_to(args.time);
    player.invalidate();
    player.tick(&ctx, 0.0)?;
    let frame = player.frame().into_straight();

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let config = GridConfig {
        columns: args.columns,
        rows: 0,
        container_width: args.width,
        container_height: args.height,
        label_height: if args.labels { 24.0 } else { 0.0 },
        ..GridConfig::default()
    };
    let cells = args
        .inputs
        .iter()
        .map(|path| {
            let label = if args.labels {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            } else {
                String::new()
            };
            Ok(CompositorCell::from_svg(read_svg(path)?, label))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let result = GridCompositor::compose(&cells, &config)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &result.svg_content)
        .with_context(|| format!("write svg '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} cells, {}x{})",
        args.out.display(),
        result.cell_count,
        result.total_width,
        result.total_height
    );
    Ok(())
}
