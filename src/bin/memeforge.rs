use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "memeforge", version)]
struct Cli {
    /// Engine config JSON. `MEMEFORGE_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the captioned media at full resolution.
    Export(ExportArgs),
    /// Write the interactive preview surface as a PNG.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct CaptionArgs {
    /// Image, GIF or video path, or a `data:` URL.
    #[arg(long)]
    media: String,

    /// Top caption text.
    #[arg(long)]
    top: Option<String>,

    /// Bottom caption text.
    #[arg(long)]
    bottom: Option<String>,

    /// Caption pair JSON (`{"top": {...}, "bottom": {...}}`), applied before --top/--bottom.
    #[arg(long)]
    overlays: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    captions: CaptionArgs,

    /// Output format for still images. Video frames are always PNG.
    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    format: FormatChoice,

    /// Encoder quality, 0.1 to 1.0 (JPEG only).
    #[arg(long, default_value_t = 0.9)]
    quality: f32,

    /// Video capture resolution.
    #[arg(long, value_enum, default_value_t = TierChoice::High)]
    tier: TierChoice,

    /// Directory the asset is written into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    captions: CaptionArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Refresh ticks to play before pausing (video only).
    #[arg(long, default_value_t = 0)]
    frames: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Jpeg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TierChoice {
    Low,
    Medium,
    High,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Export(args) => cmd_export(config, args),
        Command::Preview(args) => cmd_preview(config, args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<memeforge::EngineConfig> {
    let cfg = match path {
        Some(p) => memeforge::EngineConfig::from_path(p)?,
        None => memeforge::EngineConfig::default(),
    }
    .with_env();
    cfg.validate()?;
    Ok(cfg)
}

fn open_session(
    config: memeforge::EngineConfig,
    args: &CaptionArgs,
) -> anyhow::Result<memeforge::Session> {
    let mut session = memeforge::Session::new(config)?;

    if let Some(path) = &args.overlays {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read overlays '{}'", path.display()))?;
        let pair = memeforge::OverlayPair::from_json(&json)?;
        session.edit_overlays(|current| *current = pair)?;
    }
    if let Some(top) = &args.top {
        session.edit_overlays(|pair| pair.top.content = top.clone())?;
    }
    if let Some(bottom) = &args.bottom {
        session.edit_overlays(|pair| pair.bottom.content = bottom.clone())?;
    }

    let media = memeforge::MediaSource::parse(&args.media)?;
    let mut state = session.select_media(media)?;
    // Video metadata and the first frame can take a few polls.
    let mut polls = 0u32;
    while state == memeforge::PreviewState::Loading {
        polls += 1;
        if polls > 1_000 {
            anyhow::bail!("media did not become ready");
        }
        std::thread::sleep(session.config().refresh_interval());
        state = session.poll()?;
    }
    Ok(session)
}

fn cmd_export(config: memeforge::EngineConfig, args: ExportArgs) -> anyhow::Result<()> {
    let mut session = open_session(config, &args.captions)?;

    let format = match args.format {
        FormatChoice::Png => memeforge::ExportFormat::Png,
        FormatChoice::Jpeg => memeforge::ExportFormat::Jpeg,
    };
    let tier = match args.tier {
        TierChoice::Low => memeforge::ResolutionTier::Low,
        TierChoice::Medium => memeforge::ResolutionTier::Medium,
        TierChoice::High => memeforge::ResolutionTier::High,
    };
    let cfg = memeforge::ExportConfig::new(format, args.quality, tier)?;

    let asset = session.export(&cfg)?;
    let path = asset.write_to_dir(&args.out_dir)?;
    eprintln!("wrote {} ({})", path.display(), asset.size);
    Ok(())
}

fn cmd_preview(config: memeforge::EngineConfig, args: PreviewArgs) -> anyhow::Result<()> {
    let mut session = open_session(config, &args.captions)?;

    if args.frames > 0 {
        session.play()?;
        let interval = session.config().refresh_interval();
        for _ in 0..args.frames {
            std::thread::sleep(interval);
            session.refresh_tick()?;
        }
        session.pause();
    }

    let surface = session
        .preview()
        .surface()
        .context("preview surface is not ready")?;
    let bytes = memeforge::encode_surface(surface, &memeforge::ExportConfig::default())?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, bytes)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {} ({})", args.out.display(), surface.size());
    Ok(())
}
