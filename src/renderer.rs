use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::buffers::FrameBuffers;
use super::camera::FrameState;
use super::define_scene::define_render_scene;
use super::error::TracerResult;
use super::gpu::GpuContext;
use super::kernel::{KernelDispatcher, KernelParams};

/// One rendered image: RGBA, row 0 is the top row.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub elapsed: Duration,
}

#[cfg(test)]
impl Frame {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let start = ((y as u64 * self.width as u64 + x as u64) * super::buffers::BYTES_PER_PIXEL) as usize;
        [
            self.pixels[start],
            self.pixels[start + 1],
            self.pixels[start + 2],
            self.pixels[start + 3],
        ]
    }
}

/// One-line frame summary shown on screen.
pub fn status_line(state: &FrameState, frame: &Frame) -> String {
    let [x, y, z] = state.light_position();
    format!(
        "Size {}x{} Time {:.3} s Angle {},{} Levels {} Light {x:.0},{y:.0},{z:.0}",
        frame.width,
        frame.height,
        frame.elapsed.as_secs_f32(),
        state.view.azimuth(),
        state.view.elevation(),
        state.max_depth,
    )
}

/// Runs the whole per-frame pipeline: scene, upload, dispatch, readback.
/// Nothing but the device context survives from one frame to the next.
pub struct Renderer {
    pub gpu: GpuContext,
    dispatcher: KernelDispatcher,
    assets_dir: PathBuf,
}

impl Renderer {
    pub fn new(gpu: GpuContext, kernel_path: impl Into<PathBuf>, assets_dir: impl Into<PathBuf>) -> Renderer {
        Renderer {
            gpu,
            dispatcher: KernelDispatcher::new(kernel_path),
            assets_dir: assets_dir.into(),
        }
    }

    pub fn render_frame(&self, state: &FrameState, width: u32, height: u32) -> TracerResult<Frame> {
        let start = Instant::now();

        let scene = define_render_scene(state.mode, state.light_offset, &self.assets_dir)?;

        let params = KernelParams::new(
            &scene,
            width,
            height,
            state.max_depth,
            state.zoom,
            state.view.rotation(),
        );

        let pixels = {
            let buffers = FrameBuffers::new(&self.gpu.device, &scene, width, height)?;
            self.dispatcher.dispatch(&self.gpu, &buffers, &params)?
        };

        let elapsed = start.elapsed();

        log::info!(
            "{}: {} triangles, {} spheres, {width}x{height} in {:.3} s",
            state.mode.title(),
            params.triangle_count,
            params.sphere_count,
            elapsed.as_secs_f32()
        );

        Ok(Frame {
            width,
            height,
            pixels,
            elapsed,
        })
    }
}
