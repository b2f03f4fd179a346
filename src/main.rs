//! Chat Animator CLI.
//!
//! Usage:
//!   chat-anim render -o chat.gif                 # Demo conversation as a looping GIF
//!   chat-anim render -s scene.json -o chat.mp4   # Scene file to video (needs ffmpeg)
//!   chat-anim screenshot -t 6.5 -o still.webp    # One frame at 6.5 seconds
//!   chat-anim inspect -s scene.json --every 30   # Per-frame layout table
//!   chat-anim demo -o scene.json                 # Write the demo scene to start from

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chat_animator::images::ImageStore;
use chat_animator::recording::{
    save_still, FrameEncoder, GifSink, OutputFormat, Preview, Recorder,
};
use chat_animator::render::{FixedAdvance, FontBook, NullRenderer, SoftwareRenderer, TextMetrics};
use chat_animator::{Result, SceneFile, Session, TickOutcome};

#[derive(Parser)]
#[command(name = "chat-anim")]
#[command(about = "Render chat conversations as animated bubble reveals")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one full loop to a GIF, PNG sequence, MP4 or WebM
    Render {
        /// Scene file (JSON); the demo conversation if omitted
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Output path: .gif, .mp4, .webm, or a directory for PNG frames
        #[arg(short, long, default_value = "chat.gif")]
        output: PathBuf,

        /// Keep every n-th frame (2 halves the frame rate)
        #[arg(long, default_value_t = 1)]
        step: u64,

        /// Extra font files to load
        #[arg(long)]
        font: Vec<PathBuf>,
    },

    /// Render a single frame
    Screenshot {
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Output file (.webp is lossy WebP, anything else by extension)
        #[arg(short, long, default_value = "still.webp")]
        output: PathBuf,

        /// Time into the loop in seconds
        #[arg(short, long, conflicts_with = "frame")]
        time: Option<f64>,

        /// Frame number into the loop
        #[arg(long)]
        frame: Option<u64>,

        /// WebP quality (0-100)
        #[arg(long, default_value_t = 80.0)]
        quality: f32,

        #[arg(long)]
        font: Vec<PathBuf>,
    },

    /// Print visible bubbles and their positions frame by frame
    Inspect {
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Print every n-th frame
        #[arg(long, default_value_t = 10)]
        every: u64,

        /// Measure with a fixed per-character advance instead of real fonts
        #[arg(long)]
        fixed_metrics: bool,
    },

    /// Write the demo scene as JSON
    Demo {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Render {
            scene,
            output,
            step,
            font,
        } => cmd_render(scene.as_deref(), &output, step, &font),
        Commands::Screenshot {
            scene,
            output,
            time,
            frame,
            quality,
            font,
        } => cmd_screenshot(scene.as_deref(), &output, time, frame, quality, &font),
        Commands::Inspect {
            scene,
            every,
            fixed_metrics,
        } => cmd_inspect(scene.as_deref(), every, fixed_metrics),
        Commands::Demo { output } => cmd_demo(output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Load a scene file, or the demo scene. Image paths resolve relative to the file.
fn load_scene(path: Option<&Path>) -> Result<(SceneFile, ImageStore)> {
    match path {
        Some(path) => {
            let scene = SceneFile::load(path)?;
            let base = path.parent().unwrap_or(Path::new("."));
            Ok((scene, ImageStore::with_base_dir(base)))
        }
        None => Ok((SceneFile::demo(), ImageStore::new())),
    }
}

fn font_book(extra: &[PathBuf]) -> FontBook {
    if extra.is_empty() {
        FontBook::new()
    } else {
        FontBook::with_font_files(extra)
    }
}

fn cmd_render(scene: Option<&Path>, output: &Path, step: u64, fonts: &[PathBuf]) -> Result<()> {
    let (scene, images) = load_scene(scene)?;
    let fonts = font_book(fonts);
    let render_fonts = fonts.fork();
    let mut session = scene.into_session(fonts, images)?;
    let config = session.config().clone();
    let step = step.max(1);

    let format = OutputFormat::from_path(output);
    let encoder: Box<dyn FrameEncoder> = match format {
        OutputFormat::Gif => {
            let fps = config.frame_rate.round().max(1.0) as u32;
            let step_ms = u32::try_from(step).unwrap_or(u32::MAX).saturating_mul(1000);
            Box::new(GifSink::create(output, config.frame_rate)?.with_delay_ms(step_ms, fps))
        }
        other => other.open(
            output,
            config.canvas.width,
            config.canvas.height,
            config.frame_rate / step as f64,
        )?,
    };

    let mut recorder = Recorder::new(SoftwareRenderer::new(render_fonts))
        .with_frame_step(step);
    recorder.start(encoder);
    session.restart();

    let total = session.total_frames();
    println!(
        "Rendering {} frames ({:.1}s) to {}",
        total + 1,
        (total + 1) as f64 / config.frame_rate,
        output.display()
    );
    while recorder.is_recording() {
        if session.tick(&mut recorder).is_finished() {
            break;
        }
    }
    println!("Wrote {} frames", recorder.frames_written());
    Ok(())
}

fn cmd_screenshot(
    scene: Option<&Path>,
    output: &Path,
    time: Option<f64>,
    frame: Option<u64>,
    quality: f32,
    fonts: &[PathBuf],
) -> Result<()> {
    let (scene, images) = load_scene(scene)?;
    let fonts = font_book(fonts);
    let render_fonts = fonts.fork();
    let mut session = scene.into_session(fonts, images)?;
    let frame = match (time, frame) {
        (_, Some(f)) => f,
        (Some(t), None) => (t.max(0.0) * session.config().frame_rate).round() as u64,
        (None, None) => session.total_frames(),
    };

    let mut renderer = Preview(SoftwareRenderer::new(render_fonts));
    session.seek(frame, &mut renderer);
    save_still(renderer.0.canvas(), output, quality)?;
    println!("Saved frame {} to {}", frame.min(session.total_frames()), output.display());
    Ok(())
}

fn cmd_inspect(scene: Option<&Path>, every: u64, fixed_metrics: bool) -> Result<()> {
    let (scene, images) = load_scene(scene)?;
    if fixed_metrics {
        let session = scene.into_session(FixedAdvance::default(), images)?;
        print_layout_table(session, every);
    } else {
        let session = scene.into_session(FontBook::new(), images)?;
        print_layout_table(session, every);
    }
    Ok(())
}

fn print_layout_table<M: TextMetrics>(mut session: Session<M>, every: u64) {
    let every = every.max(1);
    let total = session.total_frames();
    println!("{} messages, {} frames", session.messages().len(), total + 1);
    println!("{:>6}  {:>7}  positions (index:actual)", "frame", "visible");

    let mut headless = Preview(NullRenderer);
    session.restart();
    loop {
        match session.tick(&mut headless) {
            TickOutcome::Animating { frame, visible } => {
                if frame % every != 0 {
                    continue;
                }
                let membership = session.membership_at(frame);
                let positions: Vec<String> = membership
                    .visible
                    .iter()
                    .map(|&i| format!("{}:{:.3}", i, session.messages()[i].actual_position))
                    .collect();
                println!("{:>6}  {:>7}  {}", frame, visible, positions.join("  "));
            }
            TickOutcome::Finished { frame } => {
                println!("{:>6}  loop finished", frame);
                break;
            }
        }
    }
}

fn cmd_demo(output: Option<&Path>) -> Result<()> {
    let json = SceneFile::demo().to_json_pretty()?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Wrote demo scene to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
