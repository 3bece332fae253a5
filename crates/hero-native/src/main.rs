//! Desktop preview of the cloud hero: a winit window driven by the same
//! lifecycle controller as the web build, or a CPU still export.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use hero_core::scroll::ScrollMapper;
use hero_core::{
    render_rgba8, Controller, FrameHandle, FrameInputs, FrameScheduler, GpuState, HeroEvent,
    HeroOptions, InitError, NoiseImage, ScrollDirection, Viewport,
};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

const SCROLL_STEP: f32 = 0.05;

#[derive(Parser, Debug)]
#[command(name = "hero-native", about = "Volumetric cloud hero preview")]
struct Args {
    /// Render one frame on the CPU to this PNG and exit
    #[arg(long)]
    still: Option<PathBuf>,
    /// Animation time for --still, in seconds
    #[arg(long, default_value_t = 0.0)]
    time: f32,
    /// Scroll progress for --still
    #[arg(long, default_value_t = 0.0)]
    scroll: f32,
    #[arg(long, default_value_t = 480)]
    width: u32,
    #[arg(long, default_value_t = 270)]
    height: u32,
    /// JSON file with renderer options (same keys as the web build)
    #[arg(long)]
    options: Option<PathBuf>,
    /// Noise texture; overrides texturePath from the options
    #[arg(long)]
    texture: Option<PathBuf>,
    /// Cycle through primitives instead of a single sphere
    #[arg(long)]
    morph: bool,
}

/// Redraw requests stand in for animation frames.
struct RedrawScheduler {
    window: Arc<Window>,
    next: i32,
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        self.window.request_redraw();
        self.next = self.next.wrapping_add(1);
        Some(FrameHandle(self.next))
    }

    // winit has no way to withdraw a redraw; the controller drops stale ones
    fn cancel_frame(&mut self, _handle: FrameHandle) {}
}

fn load_options(args: &Args) -> anyhow::Result<HeroOptions> {
    let mut options = match &args.options {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            HeroOptions::from_json(&json)?
        }
        None => HeroOptions::default(),
    };
    if args.morph {
        options.morph = true;
    }
    Ok(options)
}

fn load_noise(path: &Path) -> NoiseImage {
    let started = Instant::now();
    match std::fs::read(path)
        .map_err(anyhow::Error::from)
        .and_then(|bytes| Ok(NoiseImage::decode(&bytes)?))
    {
        Ok(image) => {
            log::info!(
                "texture {} {}x{} loaded in {:?}",
                path.display(),
                image.width(),
                image.height(),
                started.elapsed()
            );
            image
        }
        Err(e) => {
            log::warn!("texture {}: {e:#}; using procedural noise", path.display());
            NoiseImage::fallback()
        }
    }
}

fn render_still(
    args: &Args,
    options: &HeroOptions,
    noise: &NoiseImage,
    out: &Path,
) -> anyhow::Result<()> {
    let mut scroll = ScrollMapper::new(options.scroll);
    scroll.set_progress(args.scroll, ScrollDirection::Forward);
    let inputs = FrameInputs {
        time: args.time,
        camera: scroll.camera(),
        fade: scroll.fade(),
        sun_direction: options.sun(),
        march: options.march(),
        primitive: options.primitive(),
        ..FrameInputs::default()
    };
    let started = Instant::now();
    let pixels = render_rgba8(noise, &inputs, args.width, args.height);
    let image = image::RgbaImage::from_raw(args.width, args.height, pixels)
        .context("frame buffer size mismatch")?;
    image
        .save(out)
        .with_context(|| format!("writing {}", out.display()))?;
    log::info!(
        "wrote {} ({}x{}) in {:?}",
        out.display(),
        args.width,
        args.height,
        started.elapsed()
    );
    Ok(())
}

fn run_window(args: &Args, mut options: HeroOptions, noise: NoiseImage) -> anyhow::Result<()> {
    // the preview window is opaque; fade is reported, not composited
    options.transparent = false;

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Cloud hero (native)")
            .with_inner_size(winit::dpi::PhysicalSize::new(args.width, args.height))
            .build(&event_loop)?,
    );
    let size = window.inner_size();
    let viewport = Viewport::new(size.width, size.height);

    let mut controller = Controller::new(RedrawScheduler {
        window: window.clone(),
        next: 0,
    });
    controller.begin_initialize(options.clone(), viewport)?;
    controller.install_noise_texture(noise);

    let instance = wgpu::Instance::default();
    let backend = build_gpu(&instance, &window, viewport, options.transparent);
    controller.complete_initialize(backend);
    log_events(&mut controller);

    let start = Instant::now();
    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop.run(move |event, elwt| {
        let Event::WindowEvent { event, .. } = event else {
            return;
        };
        match event {
            WindowEvent::RedrawRequested => {
                controller.flush_resize(|| {
                    let size = window.inner_size();
                    Viewport::new(size.width, size.height)
                });
                controller.on_frame(start.elapsed().as_secs_f64() * 1000.0);
            }
            WindowEvent::Resized(_) => controller.request_resize(),
            WindowEvent::Occluded(hidden) => controller.set_hidden(hidden),
            WindowEvent::CloseRequested => {
                controller.dispose();
                elwt.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match logical_key {
                Key::Named(NamedKey::ArrowDown) => controller.step_scroll(SCROLL_STEP),
                Key::Named(NamedKey::ArrowUp) => controller.step_scroll(-SCROLL_STEP),
                Key::Named(NamedKey::Space) => {
                    if controller.state() == hero_core::LifecycleState::Paused {
                        controller.resume();
                    } else {
                        controller.pause();
                    }
                    log::info!("{}", controller.state().as_str());
                }
                Key::Named(NamedKey::Escape) => {
                    controller.dispose();
                    elwt.exit();
                }
                Key::Character(c) if c.as_str() == "m" => {
                    let reduced = !controller.reduced_motion();
                    controller.set_reduced_motion(reduced);
                    log::info!("reduced motion: {}", controller.reduced_motion());
                }
                _ => {}
            },
            _ => {}
        }
        // a lost device announces no restore here; rebuild straight away
        if log_events(&mut controller) && controller.context_restored() {
            let size = window.inner_size();
            let viewport = Viewport::new(size.width, size.height);
            let backend = build_gpu(&instance, &window, viewport, options.transparent);
            controller.complete_initialize(backend);
            log_events(&mut controller);
        }
    })?;
    Ok(())
}

fn build_gpu(
    instance: &wgpu::Instance,
    window: &Arc<Window>,
    viewport: Viewport,
    transparent: bool,
) -> Result<GpuState<'static>, InitError> {
    let surface = instance
        .create_surface(window.clone())
        .map_err(|e| InitError::Unsupported(e.to_string()))?;
    pollster::block_on(GpuState::new(instance, surface, viewport, transparent))
}

/// Returns true when the graphics context was lost.
fn log_events(controller: &mut Controller<GpuState<'static>, RedrawScheduler>) -> bool {
    let mut lost = false;
    for event in controller.drain_events() {
        log::info!("event: {event}");
        lost |= matches!(event, HeroEvent::ContextLost);
    }
    lost
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let options = load_options(&args)?;
    let noise = match &args.texture {
        Some(path) => load_noise(path),
        None => {
            let path = PathBuf::from(options.texture_path.trim_start_matches('/'));
            if path.exists() {
                load_noise(&path)
            } else {
                NoiseImage::fallback()
            }
        }
    };

    match &args.still {
        Some(out) => render_still(&args, &options, &noise, out),
        None => run_window(&args, options, noise),
    }
}
