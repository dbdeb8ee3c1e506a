use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use glitchtext::animation::{AnimationScheduler, TweenTarget};
use glitchtext::char_effect::{EffectStack, RevealEffect, TweenedTransform};
use glitchtext::easing::Easing;
use glitchtext::glitch::GlitchGenerator;
use glitchtext::glitch_config::{load_glitch_config, GlitchConfig};
use glitchtext::math::Vec3;
use glitchtext::text_renderer::{BoxGlyphs, Canvas, FontdueGlyphs, GlyphSource, TextRenderer};

const BACKGROUND: [u8; 4] = [8, 8, 12, 255];
const TEXT_COLOR: Vec3 = Vec3::new(0.92, 0.94, 1.0);
const FADE_IN_SECONDS: f32 = 0.5;
const REVEAL_SECONDS: f32 = 1.2;

#[derive(Debug, Parser)]
#[command(name = "glitchtext")]
#[command(about = "Procedural glitch text renderer")]
#[command(version = env!("GLITCHTEXT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load and validate a glitch config.
    Check { config: PathBuf },
    /// Step the glitch timing state machine and print one line per step.
    Trace {
        config: PathBuf,
        #[arg(long, default_value_t = 5.0)]
        seconds: f32,
        #[arg(long, default_value_t = 1.0 / 60.0)]
        step: f32,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Render glitched text to a numbered PNG sequence.
    Render {
        config: PathBuf,
        #[arg(long)]
        text: String,
        #[arg(long)]
        font: Option<PathBuf>,
        #[arg(long, default_value_t = 64.0)]
        font_size: f32,
        #[arg(long, default_value_t = 1280)]
        width: u32,
        #[arg(long, default_value_t = 360)]
        height: u32,
        #[arg(long, default_value_t = 90)]
        frames: u32,
        #[arg(long, default_value_t = 30)]
        fps: u32,
        #[arg(long)]
        seed: Option<u64>,
        /// Start glitching on the first frame instead of after the idle time.
        #[arg(long)]
        trigger: bool,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },
}

struct RenderJob<'a> {
    config: GlitchConfig,
    text: &'a str,
    width: u32,
    height: u32,
    frames: u32,
    fps: u32,
    trigger: bool,
    output: &'a Path,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => run_check(&config),
        Commands::Trace {
            config,
            seconds,
            step,
            seed,
        } => run_trace(&config, seconds, step, seed),
        Commands::Render {
            config,
            text,
            font,
            font_size,
            width,
            height,
            frames,
            fps,
            seed,
            trigger,
            output,
        } => {
            let mut glitch_config = load_glitch_config(&config)?;
            if seed.is_some() {
                glitch_config.seed = seed;
            }
            if width == 0 || height == 0 {
                bail!("render size must be non-zero, got {width}x{height}");
            }
            if fps == 0 {
                bail!("fps must be > 0");
            }

            let job = RenderJob {
                config: glitch_config,
                text: &text,
                width,
                height,
                frames,
                fps,
                trigger,
                output: &output,
            };
            match font {
                Some(font_path) => {
                    let glyphs = FontdueGlyphs::from_path(&font_path, font_size)?;
                    run_render(TextRenderer::new(glyphs), &job)
                }
                None => {
                    let glyphs = BoxGlyphs::new(font_size * 0.6, font_size);
                    run_render(TextRenderer::new(glyphs), &job)
                }
            }
        }
    }
}

fn run_check(config_path: &Path) -> Result<()> {
    let config = load_glitch_config(config_path)?;

    println!(
        "OK: {} ({:?}, intensity {:.2}, active {:.2}s, idle {:.2}s, {:.2} Hz)",
        config_path.display(),
        config.kind,
        config.intensity,
        config.duration,
        config.idle_time,
        config.frequency
    );

    let effects: Vec<&str> = [
        (config.character_displacement, "displacement"),
        (config.text_slicing, "slicing"),
        (config.block_displacement, "blocks"),
        (config.text_duplication, "duplication"),
        (config.rgb_separation, "rgb_separation"),
        (config.chromatic_aberration, "chromatic"),
        (config.random_corruption, "corruption"),
        (config.scanlines, "scanlines"),
    ]
    .into_iter()
    .filter_map(|(enabled, name)| enabled.then_some(name))
    .collect();
    println!("Effects: {}", effects.join(", "));
    Ok(())
}

fn run_trace(config_path: &Path, seconds: f32, step: f32, seed: Option<u64>) -> Result<()> {
    if !(step > 0.0 && step.is_finite()) {
        bail!("step must be a positive number of seconds, got {step}");
    }
    if !(seconds >= 0.0 && seconds.is_finite()) {
        bail!("seconds must be >= 0, got {seconds}");
    }

    let mut config = load_glitch_config(config_path)?;
    if seed.is_some() {
        config.seed = seed;
    }

    let mut generator = GlitchGenerator::new(config)?;
    generator.initialize();

    let steps = (seconds / step).ceil() as u64;
    for _ in 0..steps {
        generator.update(step);
        let runtime = generator.runtime();
        println!(
            "{:>9.4}  {:<6}  {:.4}",
            runtime.elapsed_time,
            if runtime.is_glitching { "active" } else { "idle" },
            runtime.current_intensity
        );
    }
    Ok(())
}

fn run_render<G: GlyphSource>(mut renderer: TextRenderer<G>, job: &RenderJob<'_>) -> Result<()> {
    fs::create_dir_all(job.output)
        .with_context(|| format!("failed to create output directory {}", job.output.display()))?;

    let mut generator = GlitchGenerator::new(job.config.clone())?;
    generator.initialize();
    generator.set_screen_size(job.width, job.height);
    if job.trigger {
        generator.trigger_glitch();
    }

    let mut scheduler = AnimationScheduler::new();
    scheduler.initialize();

    let alpha = TweenTarget::new(0.0_f32);
    let reveal = TweenTarget::new(0.0_f32);
    scheduler.create_tween(&alpha, 0.0, 1.0, FADE_IN_SECONDS, Easing::EaseOutCubic, None);
    scheduler.create_tween(
        &reveal,
        0.0,
        1.0,
        REVEAL_SECONDS,
        Easing::Linear,
        Some(Box::new(|| log::info!("text fully revealed"))),
    );

    let fade = TweenedTransform {
        alpha: Some(alpha),
        ..TweenedTransform::default()
    };
    let typewriter = RevealEffect::new(reveal);

    let delta_time = 1.0 / job.fps as f32;
    let scale = 1.0;
    let x = ((job.width as f32 - renderer.text_width(job.text, scale)) / 2.0).max(0.0);
    let y = ((job.height as f32 - renderer.line_height(scale)) / 2.0).max(0.0);
    let mut canvas = Canvas::filled(job.width, job.height, BACKGROUND);

    for frame_index in 0..job.frames {
        canvas.clear(BACKGROUND);
        let effect = EffectStack::new()
            .with(&generator)
            .with(&fade)
            .with(&typewriter);
        let stats =
            renderer.render_text_with_effect(&mut canvas, job.text, x, y, scale, TEXT_COLOR, &effect);

        let config = generator.config();
        if config.scanlines {
            let band_height = config.scanline_height * generator.resolution_scale();
            canvas.apply_scanlines(generator.scanline_phase(), band_height);
        }

        let frame_path = job.output.join(format!("frame_{frame_index:05}.png"));
        canvas
            .to_image()?
            .save(&frame_path)
            .with_context(|| format!("failed to write {}", frame_path.display()))?;

        log::debug!(
            "frame {}: {} drawn, {} hidden, {} duplicates",
            frame_index,
            stats.drawn,
            stats.hidden,
            stats.duplicates
        );
        if frame_index % job.fps == 0 {
            eprintln!("rendered frame {}/{}", frame_index + 1, job.frames);
        }

        generator.update(delta_time);
        scheduler.update(delta_time);
    }

    scheduler.shutdown();
    println!("Wrote {} frames to {}", job.frames, job.output.display());
    Ok(())
}
