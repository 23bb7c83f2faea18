use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use pathtrace_renderer::gpu::{GpuContext, WindowSurface};
use pathtrace_renderer::{Extent, ProgressiveRenderer, RenderError};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

use crate::cli::Cli;
use crate::input::{action_for_key_event, InputAction};
use crate::kernel::load_kernel_source;
use crate::pacer::{FramePacer, RenderStats};

const WINDOW_TITLE: &str = "Progressive Path Tracer";

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Window plus everything drawn into it. Fields drop in declaration order,
/// so the surface goes before the window it was created from.
struct Viewer {
    surface: WindowSurface,
    renderer: ProgressiveRenderer<GpuContext>,
    window: Arc<Window>,
    pacer: FramePacer,
    stats: RenderStats,
}

impl Viewer {
    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let extent = Extent::from(new_size);
        self.surface.resize(extent);
        // Allocation failures leave the previous targets in place; keep going.
        if let Err(err) = self.renderer.on_resize(extent) {
            warn!(error = %err, requested = %extent, "resize failed; keeping previous render targets");
        }
    }

    fn reset(&mut self) {
        let frames = self.renderer.frame_index();
        self.renderer.reset_accumulation();
        info!(discarded_frames = frames, "accumulation restarted");
    }

    fn draw(&mut self, now: Instant) -> Result<(), RenderError> {
        let status = self.renderer.on_draw_requested(&mut self.surface);
        self.pacer.mark_rendered(now);
        match status {
            Ok(status) => self.stats.record(status.is_presented()),
            Err(err) if err.is_fatal_for_host() => return Err(err),
            Err(err) => warn!(error = %err, "frame dropped"),
        }

        if let Some(report) = self.stats.poll(now) {
            debug!(
                fps = report.fps,
                skipped = report.skipped,
                frame_index = self.renderer.frame_index(),
                max_samples = self.renderer.max_samples(),
                extent = %self.renderer.extent(),
                "render stats"
            );
        }
        Ok(())
    }

    fn schedule(&self, elwt: &EventLoopWindowTarget<()>) {
        let now = Instant::now();
        if self.pacer.ready_for_frame(now) {
            trace!("pacer: issuing redraw now");
            self.window.request_redraw();
            elwt.set_control_flow(ControlFlow::Wait);
        } else if let Some(deadline) = self.pacer.next_deadline() {
            trace!(
                deadline_ms = deadline.saturating_duration_since(now).as_millis(),
                "pacer: waiting until next frame"
            );
            elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
        } else {
            elwt.set_control_flow(ControlFlow::Wait);
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let kernel_source = load_kernel_source(cli.kernel.as_deref())?;
    let requested = cli.window_size();

    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(PhysicalSize::new(requested.width, requested.height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);
    let initial = Extent::from(window.inner_size());

    let (context, surface) =
        GpuContext::new(window.as_ref(), initial, &cli.gpu_options(), kernel_source)
            .context("failed to initialise GPU context")?;
    let profile = context.adapter_profile().clone();
    info!(
        adapter = %profile.name,
        backend = ?profile.backend,
        format = ?context.output_format(),
        present_mode = ?surface.present_mode(),
        "gpu context ready"
    );
    if profile.is_software() {
        warn!(
            adapter = %profile.name,
            "software adapter detected; convergence will be slow (use --fps to lower the redraw rate)"
        );
    }

    let renderer = ProgressiveRenderer::initialize(context, initial, &cli.renderer_config())
        .context("failed to initialise progressive renderer")?;
    let target_fps = cli.target_fps();
    info!(
        extent = %renderer.extent(),
        target_fps,
        max_samples = renderer.max_samples(),
        "rendering; press Space to restart accumulation, Escape to quit"
    );

    let mut viewer = Viewer {
        surface,
        renderer,
        window,
        pacer: FramePacer::new(target_fps),
        stats: RenderStats::new(Instant::now()),
    };
    let mut outcome: Result<()> = Ok(());

    event_loop
        .run(|event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == viewer.window.id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                    WindowEvent::KeyboardInput { event, .. } => {
                        match action_for_key_event(&event) {
                            Some(InputAction::ResetAccumulation) => viewer.reset(),
                            Some(InputAction::Exit) => elwt.exit(),
                            None => {}
                        }
                    }
                    WindowEvent::Resized(new_size) => viewer.resize(new_size),
                    WindowEvent::RedrawRequested => {
                        if let Err(err) = viewer.draw(Instant::now()) {
                            error!(error = %err, "presentation failed; exiting");
                            outcome = Err(err.into());
                            elwt.exit();
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => viewer.schedule(elwt),
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))?;

    if outcome.is_ok() && viewer.renderer.is_converged() {
        info!(frame_index = viewer.renderer.frame_index(), "exited with a converged image");
    }
    outcome
}
