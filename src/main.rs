use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{WindowBuilder, CursorGrabMode, Fullscreen, Window},
};
use std::sync::Arc;
use std::time::Instant;

mod camera;
mod config;
mod controller;
mod drawable;
mod gpu;
mod input;
mod mesh;
mod scene;
mod shader;
mod state;
mod vertex;

use config::ViewerConfig;
use gpu::GpuContext;
use state::ViewerState;

// Helper to handle the "messy" grab logic explicitly
fn set_cursor_grab(window: &Window, grabbed: bool) {
    if grabbed {
        if window.set_cursor_grab(CursorGrabMode::Confined).is_err() {
            // Fallback if Confined fails
            let _ = window.set_cursor_grab(CursorGrabMode::Locked);
        }
        window.set_cursor_visible(false);
    } else {
        let _ = window.set_cursor_grab(CursorGrabMode::None);
        window.set_cursor_visible(true);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = ViewerConfig::from_env()?;
    config.validate()?;
    let (scene_mesh, player_mesh) = state::load_meshes(&config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut builder = WindowBuilder::new()
        .with_title(&config.window_title)
        .with_inner_size(PhysicalSize::new(config.window_width, config.window_height));
    if config.fullscreen {
        builder = builder.with_fullscreen(Some(Fullscreen::Borderless(event_loop.primary_monitor())));
    }
    let window = Arc::new(builder.build(&event_loop)?);

    let title = config.window_title.clone();
    let ctx = pollster::block_on(GpuContext::new(window.clone(), config.msaa_samples))?;
    let mut state = ViewerState::new(ctx, config, &scene_mesh, &player_mesh)?;
    drop((scene_mesh, player_mesh));

    set_cursor_grab(&window, true);
    state.set_mouse_captured(true);

    let mut last_fps_print = Instant::now();
    let mut frames = 0;

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent { ref event, window_id } if window_id == window.id() => {
                // Pass input to state first
                if !state.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => state.resize(*physical_size),
                        WindowEvent::RedrawRequested => {
                            if state.update().quit {
                                elwt.exit();
                                return;
                            }
                            match state.render() {
                                Ok(_) => {}
                                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => state.resize(state.ctx.size),
                                Err(wgpu::SurfaceError::OutOfMemory) => {
                                    log::error!("out of GPU memory, exiting");
                                    elwt.exit();
                                }
                                Err(e) => log::warn!("render error: {e:?}"),
                            }
                        }
                        WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                            set_cursor_grab(&window, true);
                            state.set_mouse_captured(true);
                        }
                        WindowEvent::Focused(false) => {
                            set_cursor_grab(&window, false);
                            state.focus_lost();
                        }
                        _ => {}
                    }
                }
            },
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                state.pointer_moved(delta);
            },
            Event::AboutToWait => {
                // FPS Counter
                frames += 1;
                if last_fps_print.elapsed().as_secs_f32() >= 1.0 {
                    window.set_title(&format!("{title} | FPS: {frames}"));
                    frames = 0;
                    last_fps_print = Instant::now();
                }
                window.request_redraw();
            },
            _ => {}
        }
    })?;
    Ok(())
}
