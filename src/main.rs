mod display;

use std::sync::Arc;

use clap::Parser;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::WindowBuilder,
};

use gpu_scene_tracer::config::Args;
use gpu_scene_tracer::gpu::{generate_instance, GpuContext};
use gpu_scene_tracer::input::InputEvent;
use gpu_scene_tracer::logging::init_logging;
use gpu_scene_tracer::renderer::status_line;
use gpu_scene_tracer::snapshot::save_png;
use gpu_scene_tracer::{Control, Frame, FrameState, Renderer};

use display::Display;

const WINDOW_TITLE: &str = "GPU Scene Tracer";

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(args.log.as_deref());

    let result = if args.headless {
        run_headless(&args)
    } else {
        run(&args)
    };

    if let Err(e) = &result {
        log::error!("{e:#}");
    }

    result
}

fn run_headless(args: &Args) -> anyhow::Result<()> {
    let renderer = Renderer::new(GpuContext::headless()?, &args.kernel, &args.assets);
    let state = FrameState::new(args.scene_mode(), args.max_depth);

    let frame = renderer.render_frame(&state, args.width, args.height)?;
    save_png(&frame, &args.output)?;

    Ok(())
}

fn run(args: &Args) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;

    let window = Arc::new(
        WindowBuilder::new()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(args.width, args.height))
            .build(&event_loop)?,
    );

    let instance = generate_instance();
    let surface = instance.create_surface(window.clone())?;
    let gpu = GpuContext::new(&instance, Some(&surface))?;

    let mut display = Display::new(&gpu, surface, window.inner_size(), window.scale_factor())?;
    let renderer = Renderer::new(gpu, &args.kernel, &args.assets);

    let mut state = FrameState::new(args.scene_mode(), args.max_depth);
    let mut shift = false;
    let mut last_frame: Option<Frame> = None;
    let mut fatal: Option<anyhow::Error> = None;

    event_loop.set_control_flow(ControlFlow::Wait);

    event_loop.run(|event, target| {
        if target.exiting() {
            return;
        }

        display.handle_event(&event);

        let Event::WindowEvent { event, .. } = event else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => target.exit(),

            WindowEvent::ModifiersChanged(modifiers) => shift = modifiers.state().shift_key(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                let Some(input) = InputEvent::from_key(code, shift) else {
                    return;
                };

                match state.apply(input) {
                    Control::Quit => target.exit(),
                    Control::Snapshot => {
                        if let Some(frame) = &last_frame {
                            if let Err(e) = save_png(frame, &args.output) {
                                fatal = Some(e.into());
                                target.exit();
                            }
                        }
                    }
                    Control::Continue => window.request_redraw(),
                }
            }

            WindowEvent::Resized(new_size) => {
                display.resize(&renderer.gpu.device, new_size);
                window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let size = display.size();

                let frame = match renderer.render_frame(&state, size.width, size.height) {
                    Ok(frame) => frame,
                    Err(e) => {
                        fatal = Some(e.into());
                        target.exit();
                        return;
                    }
                };

                let overlay = [state.mode.title().to_string(), status_line(&state, &frame)];

                if let Err(e) = display.present(&renderer.gpu, &frame, &overlay) {
                    fatal = Some(e);
                    target.exit();
                }

                last_frame = Some(frame);
            }

            _ => {}
        }
    })?;

    match fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
