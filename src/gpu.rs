use wgpu::{
    Adapter, Backends, Device, Dx12Compiler, Gles3MinorVersion, Instance, InstanceDescriptor,
    InstanceFlags, Queue, Surface,
};

use crate::error::{TracerError, TracerResult};

/// Upper bound on the work-group size, whatever the device reports.
const MAX_LOCAL_SIZE: u32 = 256;

/// Device, queue and the work-group size probed from them. Created once at
/// start-up and shared by every frame.
pub struct GpuContext {
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
    local_size: u32,
}

impl GpuContext {
    pub fn new(instance: &Instance, compatible_surface: Option<&Surface<'_>>) -> TracerResult<GpuContext> {
        let adapter = pollster::block_on(create_adapter(instance, compatible_surface))?;
        let (device, queue) = pollster::block_on(generate_device_and_queue(&adapter))?;

        device.on_uncaptured_error(Box::new(|error| {
            log::error!("uncaptured device error: {error}");
        }));

        let local_size = probe_local_size(&device.limits());

        let info = adapter.get_info();
        log::info!(
            "using {} ({:?}), work-group size {}",
            info.name,
            info.backend,
            local_size
        );

        Ok(GpuContext {
            adapter,
            device,
            queue,
            local_size,
        })
    }

    /// Context without a window, for off-screen rendering and tests.
    pub fn headless() -> TracerResult<GpuContext> {
        GpuContext::new(&generate_instance(), None)
    }

    pub fn local_size(&self) -> u32 {
        self.local_size
    }
}

pub fn generate_instance() -> Instance {
    let instance_desc: wgpu::InstanceDescriptor = InstanceDescriptor {
        backends: Backends::PRIMARY,
        flags: InstanceFlags::default(),
        dx12_shader_compiler: Dx12Compiler::default(),
        gles_minor_version: Gles3MinorVersion::default(),
    };

    wgpu::Instance::new(instance_desc)
}

async fn create_adapter(
    instance: &Instance,
    compatible_surface: Option<&Surface<'_>>,
) -> TracerResult<Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface,
        })
        .await
        .ok_or_else(|| TracerError::DeviceUnavailable("no appropriate adapter".to_string()))
}

async fn generate_device_and_queue(adapter: &Adapter) -> TracerResult<(Device, Queue)> {
    let adapter_limits = adapter.limits();

    let required_limits = wgpu::Limits {
        max_storage_buffers_per_shader_stage: 4,
        max_compute_workgroup_size_x: adapter_limits.max_compute_workgroup_size_x,
        max_compute_invocations_per_workgroup: adapter_limits.max_compute_invocations_per_workgroup,
        max_compute_workgroups_per_dimension: adapter_limits.max_compute_workgroups_per_dimension,
        max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
        max_buffer_size: adapter_limits.max_buffer_size,
        ..wgpu::Limits::downlevel_defaults().using_resolution(adapter_limits)
    };

    adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Tracer Device"),
                required_features: wgpu::Features::empty(),
                required_limits,
            },
            None,
        )
        .await
        .map_err(|e| TracerError::DeviceUnavailable(e.to_string()))
}

/// Work-group size the device can run along X, capped at [`MAX_LOCAL_SIZE`].
pub fn probe_local_size(limits: &wgpu::Limits) -> u32 {
    limits
        .max_compute_workgroup_size_x
        .min(limits.max_compute_invocations_per_workgroup)
        .clamp(1, MAX_LOCAL_SIZE)
}

/// Runs `make` inside validation and out-of-memory error scopes and reports
/// the first error raised by the device, if any.
pub fn capture_errors<T>(device: &Device, make: impl FnOnce() -> T) -> Result<T, String> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let value = make();

    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());

    match validation.or(out_of_memory) {
        Some(error) => Err(error.to_string()),
        None => Ok(value),
    }
}
