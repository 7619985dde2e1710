mod demo;

use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use scenescript_common::Viewport;
use scenescript_events::{EventBus, EventData, listener, names};
use scenescript_render::{DebugTextDevice, EffectPass, RenderCoordinator};
use scenescript_runtime::{EngineConfig, LifecycleRunner, SceneRegistry, destroy_scene};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_SCENE: &str = "demo";

#[derive(Parser)]
#[command(name = "scenescript-cli", about = "CLI tool for scenescript operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate version and default engine settings
    Info,
    /// Run the demo scene headless against the text device
    Run {
        /// Number of frames to step
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Seconds per frame
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
        /// YAML engine config
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Route frames through the post-processing composer
        #[arg(long)]
        post_processing: bool,
        /// Effect pass to append (repeatable, implies --post-processing)
        #[arg(long = "effect")]
        effects: Vec<String>,
        /// Frame at which the graphics context is lost
        #[arg(long)]
        lose_context_at: Option<u64>,
        /// Frames until a lost context is restored
        #[arg(long, default_value = "10")]
        restore_after: u64,
        /// Resize the surface halfway through, e.g. 1920x1080
        #[arg(long, value_parser = parse_size)]
        resize: Option<Viewport>,
        /// Frames the demo loader's start stays pending
        #[arg(long, default_value = "3")]
        load_frames: u32,
        /// Print the text device output for every drawn frame
        #[arg(long)]
        print_frames: bool,
    },
    /// Print the default engine config as YAML
    Config,
}

fn parse_size(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    if width == 0 || height == 0 {
        return Err("size must be non-zero".into());
    }
    Ok(Viewport::new(width, height))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let config = EngineConfig::default();
            println!("scenescript-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "viewport: {}x{}",
                config.viewport.width, config.viewport.height
            );
            println!(
                "camera: fov={} near={} far={}",
                config.camera.fov_degrees, config.camera.near, config.camera.far
            );
            println!(
                "fixed step: {:.4}s (max {} per frame)",
                config.fixed_step, config.max_fixed_steps
            );
        }
        Commands::Run {
            frames,
            dt,
            config,
            post_processing,
            effects,
            lose_context_at,
            restore_after,
            resize,
            load_frames,
            print_frames,
        } => {
            let mut config = match config {
                Some(path) => EngineConfig::load(&path)?,
                None => EngineConfig::default(),
            };
            config.post_processing |= post_processing || !effects.is_empty();
            config.validate()?;

            let bus = Rc::new(EventBus::new());
            bus.on(
                names::PERFORMANCE_SAMPLE,
                listener(|data| {
                    if let EventData::PerformanceSample(sample) = data {
                        info!(
                            frame = sample.frame,
                            fps = sample.fps,
                            max_ms = sample.max_frame_ms,
                            "performance"
                        );
                    }
                    Ok(())
                }),
            );

            let device = DebugTextDevice::new(config.viewport.width, config.viewport.height);
            let recorder = device.recorder();
            let mut coordinator = RenderCoordinator::with_device(Box::new(device));
            coordinator.bind_context_events(&bus);
            if config.post_processing {
                coordinator.enable_post_processing()?;
                for effect in &effects {
                    coordinator.add_pass(Box::new(EffectPass::new(effect.as_str())))?;
                }
            }

            let mut registry = SceneRegistry::with_settings(config.viewport, config.camera);
            let demo = demo::populate(&mut registry, DEMO_SCENE, load_frames)?;
            registry.set_active(DEMO_SCENE, coordinator.state_mut())?;
            let mut runner = LifecycleRunner::new(&config).with_event_bus(bus.clone());

            println!("Demo objects: cube={} floor={}", demo.cube, demo.floor);
            println!(
                "Running {frames} frames of {DEMO_SCENE:?} (dt={dt}, post_processing={})",
                config.post_processing
            );
            let restore_at = lose_context_at.map(|f| f + restore_after);
            let mut skipped = 0;
            for frame in 1..=frames {
                if lose_context_at == Some(frame) {
                    bus.emit(names::CONTEXT_LOST, &EventData::None);
                }
                if restore_at == Some(frame) {
                    bus.emit(names::CONTEXT_RESTORED, &EventData::None);
                }
                if let Some(size) = resize.filter(|_| frame == frames / 2 + 1) {
                    runner.resize(&mut registry, &mut coordinator, size.width, size.height);
                }

                let report = runner.frame(&mut registry, &mut coordinator, dt);
                if !report.render.drawn() {
                    skipped += 1;
                    continue;
                }
                if let Some(text) = recorder.last_frame().filter(|_| print_frames) {
                    print!("{text}");
                }
            }

            let stats = demo.stats.borrow();
            println!(
                "Frames: {frames}, drawn={}, skipped={skipped}, effects={}",
                recorder.draw_calls(),
                recorder.effect_calls()
            );
            println!(
                "Render hooks: pre={}, post={}, assets loaded={}",
                stats.pre_render,
                stats.post_render,
                demo.loaded.get()
            );
            drop(stats);

            let record = destroy_scene(&mut registry, coordinator.state_mut(), DEMO_SCENE)?;
            coordinator.unbind_context_events(&bus);
            println!("Destroyed {:?} ({} scripts left)", record.name(), record.script_count());
        }
        Commands::Config => {
            print!("{}", EngineConfig::default().to_yaml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_accepts_width_by_height() {
        assert_eq!(parse_size("1920x1080").unwrap(), Viewport::new(1920, 1080));
        assert_eq!(parse_size("64X48").unwrap(), Viewport::new(64, 48));
    }

    #[test]
    fn parse_size_rejects_bad_input() {
        assert!(parse_size("1920").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("ax10").is_err());
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "scenescript-cli",
            "run",
            "--frames",
            "5",
            "--effect",
            "bloom",
            "--effect",
            "fxaa",
            "--resize",
            "800x600",
        ])
        .unwrap();
        let Commands::Run {
            frames,
            effects,
            resize,
            ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(frames, 5);
        assert_eq!(effects, ["bloom", "fxaa"]);
        assert_eq!(resize, Some(Viewport::new(800, 600)));
    }
}
