//! Host side of the ray tracing kernel: argument ABI, per-frame compilation,
//! dispatch and blocking readback.
//!
//! The kernel source is read and compiled again on every dispatch. Program,
//! pipeline and bind group only live for the duration of one call.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use wgpu::{BindGroupLayout, Buffer, ComputePipeline, Device, ShaderModule};

use crate::buffers::FrameBuffers;
use crate::error::{TracerError, TracerResult};
use crate::gpu::{capture_errors, GpuContext};
use crate::math::Mat3;
use crate::scene::Scene;

/// Name of the compute entry point every kernel source must define.
pub const KERNEL_ENTRY_POINT: &str = "ray_trace_scene_pixel";

/// Constant the kernel sizes its work groups with. It is not declared in the
/// kernel file; [`with_workgroup_size`] prepends it at compile time.
pub const WORKGROUP_SIZE_CONSTANT: &str = "WORKGROUP_SIZE";

/// Lines [`with_workgroup_size`] adds in front of the kernel file.
const PRELUDE_LINES: u32 = 1;

/// Every scalar uniform occupies one 16-byte slot.
const UNIFORM_SLOT_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    ReadOnlyStorage,
    Uniform,
    ReadWriteStorage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelArg {
    pub binding: u32,
    pub name: &'static str,
    pub kind: ArgKind,
}

const fn arg(binding: u32, name: &'static str, kind: ArgKind) -> KernelArg {
    KernelArg {
        binding,
        name,
        kind,
    }
}

/// Kernel arguments in ABI order. Binding `i` of group 0 is argument `i + 1`.
pub const KERNEL_ABI: [KernelArg; 12] = [
    arg(0, "triangles", ArgKind::ReadOnlyStorage),
    arg(1, "spheres", ArgKind::ReadOnlyStorage),
    arg(2, "lights", ArgKind::ReadOnlyStorage),
    arg(3, "triangle_count", ArgKind::Uniform),
    arg(4, "sphere_count", ArgKind::Uniform),
    arg(5, "light_count", ArgKind::Uniform),
    arg(6, "width", ArgKind::Uniform),
    arg(7, "height", ArgKind::Uniform),
    arg(8, "max_depth", ArgKind::Uniform),
    arg(9, "zoom", ArgKind::Uniform),
    arg(10, "rotation", ArgKind::Uniform),
    arg(11, "pixels", ArgKind::ReadWriteStorage),
];

const _: () = {
    let mut i = 0;
    while i < KERNEL_ABI.len() {
        assert!(KERNEL_ABI[i].binding == i as u32);
        i += 1;
    }
};

/// Values of the by-value kernel arguments (4 through 11).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelParams {
    pub triangle_count: u32,
    pub sphere_count: u32,
    pub light_count: u32,
    pub width: u32,
    pub height: u32,
    pub max_depth: u32,
    pub zoom: f32,
    pub rotation: Mat3,
}

impl KernelParams {
    pub fn new(scene: &Scene, width: u32, height: u32, max_depth: u32, zoom: f32, rotation: Mat3) -> KernelParams {
        KernelParams {
            triangle_count: scene.triangle_count(),
            sphere_count: scene.sphere_count(),
            light_count: scene.light_count(),
            width,
            height,
            max_depth,
            zoom,
            rotation,
        }
    }

    /// Uniform contents for arguments 4 to 11, in ABI order. Scalars are
    /// zero-padded to a full slot.
    pub fn uniform_contents(&self) -> [Vec<u8>; 8] {
        [
            scalar_slot(bytemuck::bytes_of(&self.triangle_count)),
            scalar_slot(bytemuck::bytes_of(&self.sphere_count)),
            scalar_slot(bytemuck::bytes_of(&self.light_count)),
            scalar_slot(bytemuck::bytes_of(&self.width)),
            scalar_slot(bytemuck::bytes_of(&self.height)),
            scalar_slot(bytemuck::bytes_of(&self.max_depth)),
            scalar_slot(bytemuck::bytes_of(&self.zoom)),
            bytemuck::bytes_of(&self.rotation).to_vec(),
        ]
    }
}

fn scalar_slot(value: &[u8]) -> Vec<u8> {
    let mut slot = vec![0u8; UNIFORM_SLOT_SIZE];
    slot[..value.len()].copy_from_slice(value);
    slot
}

/// How a frame is split into work groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSize {
    pub work_items: u32,
    pub local_size: u32,
    pub global_size: u32,
    pub workgroups: u32,
}

/// Rounds `width * height` up to a multiple of `local_size`. The padding
/// invocations are discarded by the kernel, which bounds-checks against the
/// real width and height.
pub fn dispatch_size(width: u32, height: u32, local_size: u32) -> TracerResult<DispatchSize> {
    let too_large = || TracerError::dispatch(format!("{width}x{height} pixels exceed the work item range"));

    let work_items = width.checked_mul(height).ok_or_else(too_large)?;
    let workgroups = work_items.div_ceil(local_size);
    let global_size = workgroups.checked_mul(local_size).ok_or_else(too_large)?;

    Ok(DispatchSize {
        work_items,
        local_size,
        global_size,
        workgroups,
    })
}

/// Source path naga reports locations against, as in `wgsl:12:5`.
const SOURCE_PATH: &str = "wgsl:";

/// Rewrites the line numbers in a compiler log so they point into the kernel
/// file rather than into the source with the prelude in front of it. Both the
/// `wgsl:LINE:COLUMN` headers and the numbered source gutter are shifted.
pub fn shift_source_lines(log: &str, prelude_lines: u32) -> String {
    log.lines()
        .map(|line| shift_line(line, prelude_lines))
        .collect::<Vec<_>>()
        .join("\n")
}

fn shift_line(line: &str, prelude_lines: u32) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    // gutter, e.g. "12 │     let t = ..."
    if let Some((number, rest)) = trimmed.split_once(" │") {
        if let Ok(number) = number.parse::<u32>() {
            return format!("{indent}{} │{rest}", number.saturating_sub(prelude_lines));
        }
    }

    let mut shifted = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(found) = rest.find(SOURCE_PATH) {
        let (head, tail) = rest.split_at(found + SOURCE_PATH.len());
        shifted.push_str(head);

        let digits = tail
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(tail.len());
        match tail[..digits].parse::<u32>() {
            Ok(number) => shifted.push_str(&number.saturating_sub(prelude_lines).to_string()),
            Err(_) => shifted.push_str(&tail[..digits]),
        }
        rest = &tail[digits..];
    }
    shifted.push_str(rest);
    shifted
}

/// Kernel source with the work-group size declared in front of it.
pub fn with_workgroup_size(source: &str, local_size: u32) -> String {
    format!("const {WORKGROUP_SIZE_CONSTANT}: u32 = {local_size}u;\n{source}")
}

pub fn read_kernel_source(path: &Path) -> TracerResult<String> {
    std::fs::read_to_string(path).map_err(|e| TracerError::resource_missing(path, e))
}

macro_rules! bind_group_entry {
    ($binding:expr, $resource:expr) => {
        wgpu::BindGroupEntry {
            binding: $binding,
            resource: $resource.as_entire_binding(),
        }
    };
}

/// Compiles, binds and runs the kernel once per call.
pub struct KernelDispatcher {
    kernel_path: PathBuf,
}

impl KernelDispatcher {
    pub fn new(kernel_path: impl Into<PathBuf>) -> KernelDispatcher {
        KernelDispatcher {
            kernel_path: kernel_path.into(),
        }
    }

    /// Runs one frame and returns exactly `4 * width * height` bytes of RGBA.
    /// Does not return before the pixels are on the host.
    pub fn dispatch(
        &self,
        gpu: &GpuContext,
        buffers: &FrameBuffers,
        params: &KernelParams,
    ) -> TracerResult<Vec<u8>> {
        let device = &gpu.device;

        let source = read_kernel_source(&self.kernel_path)?;
        let program = compile_program(device, with_workgroup_size(&source, gpu.local_size()))?;

        let bind_group_layout = create_bind_group_layout(device);
        let kernel = create_kernel(device, &program, &bind_group_layout)?;

        let uniforms = create_uniform_buffers(device, params)?;
        let bind_group = bind_arguments(device, &bind_group_layout, buffers, &uniforms)?;

        let size = dispatch_size(params.width, params.height, gpu.local_size())?;
        let max_workgroups = device.limits().max_compute_workgroups_per_dimension;
        if size.workgroups > max_workgroups {
            return Err(TracerError::dispatch(format!(
                "{} work groups exceed the device limit of {max_workgroups}",
                size.workgroups
            )));
        }

        log::debug!(
            "dispatching {} work items as {} groups of {} ({} padded)",
            size.work_items,
            size.workgroups,
            size.local_size,
            size.global_size
        );

        let pixels = run_and_read_back(gpu, &kernel, &bind_group, buffers, size.workgroups)?;

        // release the transient program objects before handing the pixels out
        drop(bind_group);
        drop(kernel);
        drop(program);
        for uniform in &uniforms {
            uniform.destroy();
        }

        Ok(pixels)
    }
}

/// naga reports no warnings of its own, so every message it produces is an
/// error and fails the build.
fn compile_program(device: &Device, source: String) -> TracerResult<ShaderModule> {
    capture_errors(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ray Trace Kernel"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
        })
    })
    .map_err(|log| TracerError::ProgramBuildFailure {
        log: shift_source_lines(&log, PRELUDE_LINES),
    })
}

fn create_bind_group_layout(device: &Device) -> BindGroupLayout {
    let entries: Vec<wgpu::BindGroupLayoutEntry> = KERNEL_ABI
        .iter()
        .map(|arg| wgpu::BindGroupLayoutEntry {
            binding: arg.binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: match arg.kind {
                    ArgKind::ReadOnlyStorage => wgpu::BufferBindingType::Storage { read_only: true },
                    ArgKind::Uniform => wgpu::BufferBindingType::Uniform,
                    ArgKind::ReadWriteStorage => {
                        wgpu::BufferBindingType::Storage { read_only: false }
                    }
                },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        })
        .collect();

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Kernel Argument Layout"),
        entries: &entries,
    })
}

/// Resolves the entry point against the argument layout. A kernel whose
/// declared bindings drift from [`KERNEL_ABI`] fails here.
fn create_kernel(
    device: &Device,
    program: &ShaderModule,
    bind_group_layout: &BindGroupLayout,
) -> TracerResult<ComputePipeline> {
    capture_errors(device, || {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Kernel Pipeline Layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Ray Trace Pipeline"),
            layout: Some(&pipeline_layout),
            module: program,
            entry_point: KERNEL_ENTRY_POINT,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        })
    })
    .map_err(|e| TracerError::bind(KERNEL_ENTRY_POINT, e))
}

fn create_uniform_buffers(device: &Device, params: &KernelParams) -> TracerResult<Vec<Buffer>> {
    use wgpu::util::DeviceExt;

    let uniform_args = KERNEL_ABI.iter().filter(|arg| arg.kind == ArgKind::Uniform);

    uniform_args
        .zip(params.uniform_contents())
        .map(|(arg, contents)| {
            capture_errors(device, || {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(arg.name),
                    contents: &contents,
                    usage: wgpu::BufferUsages::UNIFORM,
                })
            })
            .map_err(|e| TracerError::bind(arg.name, e))
        })
        .collect()
}

fn bind_arguments(
    device: &Device,
    bind_group_layout: &BindGroupLayout,
    buffers: &FrameBuffers,
    uniforms: &[Buffer],
) -> TracerResult<wgpu::BindGroup> {
    let mut resources: Vec<&Buffer> = vec![
        &buffers.triangle_buffer,
        &buffers.sphere_buffer,
        &buffers.light_buffer,
    ];
    resources.extend(uniforms);
    resources.push(&buffers.pixel_buffer);

    if resources.len() != KERNEL_ABI.len() {
        return Err(TracerError::bind(
            "arguments",
            format!("{} resources for {} arguments", resources.len(), KERNEL_ABI.len()),
        ));
    }

    let entries: Vec<wgpu::BindGroupEntry> = KERNEL_ABI
        .iter()
        .zip(&resources)
        .map(|(arg, buffer)| bind_group_entry!(arg.binding, buffer))
        .collect();

    capture_errors(device, || {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Kernel Arguments"),
            layout: bind_group_layout,
            entries: &entries,
        })
    })
    .map_err(|e| TracerError::bind("arguments", e))
}

fn run_and_read_back(
    gpu: &GpuContext,
    kernel: &ComputePipeline,
    bind_group: &wgpu::BindGroup,
    buffers: &FrameBuffers,
    workgroups: u32,
) -> TracerResult<Vec<u8>> {
    let device = &gpu.device;
    let size = buffers.pixel_buffer_size;

    let staging = capture_errors(device, || {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pixel Readback Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    })
    .map_err(|e| TracerError::allocation("Pixel Readback Buffer", e))?;

    capture_errors(device, || {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Kernel Encoder"),
        });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Ray Trace Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(kernel);
            compute_pass.set_bind_group(0, bind_group, &[]);
            compute_pass.dispatch_workgroups(workgroups, 1, 1);
        }

        encoder.copy_buffer_to_buffer(&buffers.pixel_buffer, 0, &staging, 0, size);

        gpu.queue.submit(Some(encoder.finish()));
    })
    .map_err(|e| TracerError::dispatch(format!("cannot run kernel: {e}")))?;

    let buffer_slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    // no timeout: a hung device blocks here
    let _ = device.poll(wgpu::Maintain::Wait);

    rx.recv()
        .map_err(|_| TracerError::dispatch("readback channel closed"))?
        .map_err(|e| TracerError::dispatch(format!("cannot copy pixels from device to host: {e}")))?;

    let pixels = buffer_slice.get_mapped_range().to_vec();
    staging.unmap();
    staging.destroy();

    Ok(pixels)
}
