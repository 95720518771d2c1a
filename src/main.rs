// SPDX-License-Identifier: GPL-3.0-or-later
// src/main.rs
//
// Entry point: opens the window, or drives the session from the terminal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tokio::runtime::{Handle, Runtime};

use pictor::app::crop::{CropEvent, CropOutcome, CropTool, DragGesture};
use pictor::app::display::TerminalDisplay;
use pictor::app::generation::{ImageGenerator, PlaceholderGenerator};
use pictor::app::{App, AppMessage, UpdateResult};
use pictor::config::AppConfig;
use pictor::domain::crop::TargetSize;
use pictor::domain::image::DisplayableImage;
use pictor::ui;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Two-stage diffusion front-end", long_about = None)]
pub struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Without a subcommand the window opens.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Open the desktop window
    Gui {
        /// Delay per step of the placeholder backend, in milliseconds
        #[arg(long, default_value = "25")]
        step_delay_ms: u64,
    },
    /// Generate an image from a prompt
    Generate(GenerateArgs),
    /// Crop an image to a fixed size through the preview
    Crop(CropArgs),
    /// Print the effective configuration
    Config {
        /// Also write it to the default config location
        #[arg(long)]
        init: bool,
    },
}

#[derive(ClapArgs, Debug, Clone)]
struct GenerateArgs {
    /// Text prompt describing the image to generate
    #[arg(short, long)]
    prompt: String,

    /// Reference image to condition on (PNG or JPEG)
    #[arg(short, long)]
    reference: Option<PathBuf>,

    /// Reference crop as X0,Y0,X1,Y1 in preview coordinates
    #[arg(long, requires = "reference")]
    region: Option<DragGesture>,

    /// Inference steps per stage
    #[arg(short, long)]
    steps: Option<u32>,

    /// Share of denoising done by the base stage
    #[arg(long)]
    split: Option<f32>,

    /// How far generation may drift from the reference (0 to 1)
    #[arg(long)]
    strength: Option<f32>,

    /// Output file path (PNG format)
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,

    /// Delay per step of the placeholder backend, in milliseconds
    #[arg(long, default_value = "0")]
    step_delay_ms: u64,
}

#[derive(ClapArgs, Debug, Clone)]
struct CropArgs {
    /// Image to crop
    input: PathBuf,

    /// Region as X0,Y0,X1,Y1 in preview coordinates
    #[arg(long)]
    region: DragGesture,

    /// Output size as WIDTHxHEIGHT (defaults to the generation size)
    #[arg(long)]
    size: Option<TargetSize>,

    /// Output file path (PNG format)
    #[arg(short, long)]
    output: PathBuf,

    /// Also write the scaled preview the region refers to
    #[arg(long)]
    preview: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    let runtime = Runtime::new().context("Failed to start the async runtime")?;
    let command = args.command.unwrap_or(Command::Gui { step_delay_ms: 25 });

    match command {
        Command::Gui { step_delay_ms } => {
            config.validate()?;
            let flags = ui::Flags {
                generator: generator(&config, step_delay_ms),
                config,
                runtime: runtime.handle().clone(),
            };
            ui::run(flags)?;
            Ok(())
        }
        Command::Generate(generate) => runtime.block_on(run_generate(config, generate)),
        Command::Crop(crop) => run_crop(&config, crop),
        Command::Config { init } => {
            if init {
                let path = AppConfig::default_path().context("No config directory on this system")?;
                config.save(&path)?;
                log::info!("Configuration written to {}", path.display());
            }
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn run_generate(mut config: AppConfig, args: GenerateArgs) -> anyhow::Result<()> {
    if let Some(steps) = args.steps {
        config.total_steps = steps;
    }
    if let Some(split) = args.split {
        config.split_fraction = split;
    }
    if let Some(strength) = args.strength {
        config.reference_strength = strength;
    }
    config.validate()?;

    let generator = generator(&config, args.step_delay_ms);

    log::info!("Loading models...");
    let loader = Arc::clone(&generator);
    tokio::task::spawn_blocking(move || loader.prepare())
        .await
        .context("Model loading task failed")??;
    log::info!("Models loaded successfully!");

    let tick = Duration::from_millis(config.tick_interval_ms);
    let mut app = App::new(config, generator, Handle::current());
    let mut display = TerminalDisplay::default();

    app.update(AppMessage::PromptChanged(args.prompt));

    if let Some(reference) = args.reference {
        dispatch(&mut app, AppMessage::AddReference(Some(reference)))?;
        let events = match args.region {
            Some(gesture) => gesture.events().to_vec(),
            None => vec![CropEvent::Cancel],
        };
        for event in events {
            if let Err(e) = dispatch(&mut app, AppMessage::Crop(event)) {
                app.update(AppMessage::Crop(CropEvent::Cancel));
                return Err(e);
            }
        }
        app.render(&mut display);
    }

    dispatch(&mut app, AppMessage::Generate)?;

    let mut ticker = tokio::time::interval(tick);
    while app.model.generating {
        ticker.tick().await;
        app.update(AppMessage::Tick);
        app.render(&mut display);
    }
    display.finish();

    if app.model.generated.is_none() {
        bail!("{}", app.model.status.message);
    }
    dispatch(&mut app, AppMessage::SaveAs(Some(args.output)))?;
    app.render(&mut display);
    Ok(())
}

fn run_crop(config: &AppConfig, args: CropArgs) -> anyhow::Result<()> {
    let source = DisplayableImage::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let target = match args.size {
        Some(size) => size,
        None => config.target_size()?,
    };

    let tool = CropTool::open(source, target, config.preview_bound)?;
    let (w, h) = tool.transform().display_size();
    log::info!("Preview {w}x{h} (scale {:.3})", tool.transform().scale());
    if let Some(preview) = &args.preview {
        tool.preview().save_png(preview)?;
    }

    match tool.run(args.region.events()) {
        CropOutcome::Cropped(image) => {
            let written = image.save_png(&args.output)?;
            log::info!("Cropped image saved to: {}", written.display());
            Ok(())
        }
        CropOutcome::Cancelled => bail!("Crop was cancelled: the region selects no pixels"),
    }
}

fn generator(config: &AppConfig, step_delay_ms: u64) -> Arc<dyn ImageGenerator> {
    Arc::new(
        PlaceholderGenerator::new(Duration::from_millis(step_delay_ms))
            .with_models(&config.base_model, &config.refiner_model),
    )
}

/// Send a message and turn a rejection into an error.
fn dispatch(app: &mut App, message: AppMessage) -> anyhow::Result<()> {
    match app.update(message) {
        UpdateResult::Handled => Ok(()),
        UpdateResult::Rejected(e) => Err(e.into()),
    }
}
