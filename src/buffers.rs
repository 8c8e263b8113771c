use wgpu::{util::DeviceExt, Buffer, Device};

use super::error::{TracerError, TracerResult};
use super::gpu::capture_errors;
use super::scene::Scene;

/// 4 bytes of u8 per pixel, RGBA
pub const BYTES_PER_PIXEL: u64 = std::mem::size_of::<[u8; 4]>() as u64;

pub fn pixel_buffer_size(width: u32, height: u32) -> u64 {
    width as u64 * height as u64 * BYTES_PER_PIXEL
}

/// Bytes uploaded for a primitive list. An empty list becomes one zeroed
/// record: wgpu rejects zero-sized bindings, and the kernel is told the true
/// count (0), so the sentinel is never read.
pub fn upload_contents<T: bytemuck::Pod>(records: &[T], sentinel: &T) -> Vec<u8> {
    if records.is_empty() {
        bytemuck::bytes_of(sentinel).to_vec()
    } else {
        bytemuck::cast_slice(records).to_vec()
    }
}

/// Per-frame device buffers. Dropping the value releases the device memory.
pub struct FrameBuffers {
    pub pixel_buffer_size: u64,
    pub triangle_buffer: Buffer,
    pub sphere_buffer: Buffer,
    pub light_buffer: Buffer,
    pub pixel_buffer: Buffer,
}

impl FrameBuffers {
    pub fn new(device: &Device, scene: &Scene, width: u32, height: u32) -> TracerResult<FrameBuffers> {
        let triangle_buffer = create_storage_init(
            device,
            "Triangle Buffer",
            &upload_contents(&scene.triangles, &bytemuck::Zeroable::zeroed()),
        )?;

        let sphere_buffer = create_storage_init(
            device,
            "Sphere Buffer",
            &upload_contents(&scene.spheres, &bytemuck::Zeroable::zeroed()),
        )?;

        let light_buffer = create_storage_init(
            device,
            "Light Buffer",
            &upload_contents(&scene.lights, &bytemuck::Zeroable::zeroed()),
        )?;

        let pixel_buffer_size = pixel_buffer_size(width, height);
        if pixel_buffer_size == 0 {
            return Err(TracerError::allocation(
                "Pixel Buffer",
                format!("frame of {width}x{height} has no pixels"),
            ));
        }

        let pixel_buffer = capture_errors(device, || {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Pixel Buffer"),
                size: pixel_buffer_size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        })
        .map_err(|e| TracerError::allocation("Pixel Buffer", e))?;

        log::debug!(
            "uploaded {} triangles, {} spheres, {} lights, {} pixel bytes",
            scene.triangle_count(),
            scene.sphere_count(),
            scene.light_count(),
            pixel_buffer_size
        );

        Ok(FrameBuffers {
            pixel_buffer_size,
            triangle_buffer,
            sphere_buffer,
            light_buffer,
            pixel_buffer,
        })
    }
}

impl Drop for FrameBuffers {
    fn drop(&mut self) {
        self.triangle_buffer.destroy();
        self.sphere_buffer.destroy();
        self.light_buffer.destroy();
        self.pixel_buffer.destroy();
    }
}

fn create_storage_init(device: &Device, label: &'static str, contents: &[u8]) -> TracerResult<Buffer> {
    capture_errors(device, || {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: wgpu::BufferUsages::STORAGE,
        })
    })
    .map_err(|e| TracerError::allocation(label, e))
}
