use anyhow::{Context, Result};
use clap::Parser;
use pixels::{Pixels, SurfaceTexture};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use track_racer::draw::{self, Canvas};
use track_racer::evolve::{self, EvoTrainer};
use track_racer::{SimConfig, Track};
use winit::dpi::LogicalSize;
use winit::event::{Event, VirtualKeyCode};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;
use winit_input_helper::WinitInputHelper;

#[derive(Debug, Parser)]
#[command(name = "track-racer", about = "Evolve vehicle policies on a raster track")]
struct Args {
    /// JSON run configuration; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Track image; opaque white pixels are walls
    #[arg(long, default_value = "map.png")]
    track: PathBuf,
    /// Train without opening a window
    #[arg(long)]
    headless: bool,
    /// Override the number of generations to run
    #[arg(long)]
    generations: Option<u64>,
    /// Write the best policy here after every generation
    #[arg(long)]
    checkpoint: Option<PathBuf>,
    /// Seed the first population from a saved checkpoint
    #[arg(long)]
    resume: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(generations) = args.generations {
        config.generations = generations;
    }
    config.validate()?;

    let track = Track::load(&args.track).with_context(|| format!("loading track {}", args.track.display()))?;

    let trainer = match &args.resume {
        Some(path) => {
            let checkpoint = evolve::load_checkpoint(path)
                .with_context(|| format!("loading checkpoint {}", path.display()))?;
            info!(
                generation = checkpoint.generation,
                fitness = checkpoint.fitness,
                "Resuming from checkpoint"
            );
            EvoTrainer::from_seed_policy(config, checkpoint.policy)
        }
        None => EvoTrainer::new(config),
    };

    info!(
        population = config.population_size,
        generations = config.generations,
        headless = args.headless,
        "Starting track-racer"
    );
    if args.headless {
        run_headless(trainer, &track, config.generations, args.checkpoint.as_deref())
    } else {
        run_viewer(trainer, track, config.generations, args.checkpoint)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn save_champion(trainer: &EvoTrainer, path: &Path) -> Result<()> {
    if let Some(champion) = trainer.champion() {
        evolve::save_checkpoint(path, champion)
            .with_context(|| format!("writing checkpoint {}", path.display()))?;
    }
    Ok(())
}

fn run_headless(mut trainer: EvoTrainer, track: &Track, generations: u64, checkpoint: Option<&Path>) -> Result<()> {
    for _ in 0..generations {
        trainer.run_generation(track)?;
        if let Some(path) = checkpoint {
            save_champion(&trainer, path)?;
        }
    }
    if let Some(champion) = trainer.champion() {
        info!(generation = champion.generation, fitness = champion.fitness, "Training finished");
    }
    Ok(())
}

fn run_viewer(mut trainer: EvoTrainer, track: Track, generations: u64, checkpoint: Option<PathBuf>) -> Result<()> {
    let (width, height) = (track.width(), track.height());
    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();

    let window = WindowBuilder::new()
        .with_title("Track Racer")
        .with_inner_size(LogicalSize::new(width, height))
        .with_resizable(false)
        .build(&event_loop)
        .context("creating window")?;

    let mut pixels = {
        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        Pixels::new(width, height, surface_texture)?
    };

    let background = draw::track_background(&track);
    let mut paused = false;
    let mut ticks_per_frame: u32 = 1;
    let mut finished: u64 = 0;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Event::RedrawRequested(_) = event {
            if let Some(mut canvas) = Canvas::new(pixels.frame_mut(), width, height) {
                canvas.blit(&background);
                let generation = trainer.generation();
                for vehicle in generation.vehicles().iter().filter(|v| v.is_alive()) {
                    draw::draw_vehicle(&mut canvas, vehicle);
                }
                draw::draw_hud(&mut canvas, trainer.generation_number(), generation.alive_count(), generation.tick());
            }
            if let Err(err) = pixels.render() {
                error!(%err, "Render failed");
                *control_flow = ControlFlow::Exit;
                return;
            }
        }

        if input.update(&event) {
            if input.key_pressed(VirtualKeyCode::Escape) || input.close_requested() || input.destroyed() {
                *control_flow = ControlFlow::Exit;
                return;
            }
            if input.key_pressed(VirtualKeyCode::P) {
                paused = !paused;
            }
            if input.key_pressed(VirtualKeyCode::NumpadAdd) || input.key_pressed(VirtualKeyCode::Equals) {
                ticks_per_frame = ticks_per_frame.saturating_mul(2).min(1024);
            }
            if input.key_pressed(VirtualKeyCode::NumpadSubtract) || input.key_pressed(VirtualKeyCode::Minus) {
                ticks_per_frame = (ticks_per_frame / 2).max(1);
            }

            if !paused {
                for _ in 0..ticks_per_frame {
                    match trainer.step(&track) {
                        Ok(None) => {}
                        Ok(Some(_)) => {
                            finished += 1;
                            if let Some(path) = &checkpoint {
                                if let Err(err) = save_champion(&trainer, path) {
                                    error!(err = %format!("{err:#}"), "Checkpoint failed");
                                }
                            }
                            if finished >= generations {
                                *control_flow = ControlFlow::Exit;
                                return;
                            }
                            // show the fresh population before racing on
                            break;
                        }
                        Err(err) => {
                            error!(%err, "Simulation failed");
                            *control_flow = ControlFlow::Exit;
                            return;
                        }
                    }
                }
            }
            window.request_redraw();
        }
    });
}
