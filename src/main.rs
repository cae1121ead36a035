use anyhow::{Context, Result};
use log::{debug, error, info};
use pollster::FutureExt as _;
use winit::{
    dpi::LogicalSize,
    event::{DeviceEvent, ElementState, Event, KeyboardInput, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

mod app;
mod assets;
mod color;
mod config;
mod debug;
mod entity;
mod error;
mod fireflies;
mod frame_loop;
mod orbit;
mod renderer;
mod window;

use app::App;
use config::Config;
use frame_loop::{FrameLoop, LoopState, SystemClock};

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load().context("Failed to load configuration")?;
    debug!("{:#?}", config);

    // Everything the scene needs is on hand before the first frame.
    let assets = tokio::runtime::Runtime::new()
        .context("Failed to start asset loader")?
        .block_on(assets::load(&config.assets))?;

    let event_loop = EventLoop::new();

    let window = WindowBuilder::new()
        .with_title(&config.window.title)
        .with_inner_size(LogicalSize::<u32> {
            width: config.window.width,
            height: config.window.height,
        })
        .build(&event_loop)
        .context("Failed to build window")?;

    let mut app = App::new(window, &config, &assets).block_on()?;
    drop(assets);

    let mut frame_loop = FrameLoop::new(SystemClock::start());
    let stop = frame_loop.stop_handle();

    event_loop.run(move |e, _, control_flow| match e {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => {
                stop.stop();
                *control_flow = ControlFlow::Exit;
            }
            WindowEvent::Resized(size) => app.on_resize(size),
            WindowEvent::ScaleFactorChanged {
                scale_factor,
                new_inner_size,
            } => app.on_scale_factor_changed(*new_inner_size, scale_factor),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => app.on_mouse_button(state == ElementState::Pressed),
            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => {
                app.on_pointer_lost()
            }
            WindowEvent::MouseWheel { delta, .. } => app.on_mouse_scroll(delta),
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state: ElementState::Pressed,
                        virtual_keycode: Some(keycode),
                        ..
                    },
                ..
            } => app.on_key_down(keycode),
            _ => (),
        },
        Event::DeviceEvent {
            event: DeviceEvent::MouseMotion { delta },
            ..
        } => app.on_mouse_move(delta),
        Event::MainEventsCleared => {
            if frame_loop.state() == LoopState::Running {
                app.request_redraw();
            }
        }
        Event::RedrawRequested(..) => match frame_loop.tick(&mut app) {
            Ok(LoopState::Running) => (),
            Ok(LoopState::Stopped) => {
                info!("Stopped after {} frames", frame_loop.frames());
                *control_flow = ControlFlow::Exit;
            }
            Err(err) => {
                error!("{:?}", err);
                stop.stop();
                *control_flow = ControlFlow::Exit;
            }
        },
        _ => (),
    });
}
