#[cfg(feature = "gpu-tests")]
mod dispatch {
    use std::path::{Path, PathBuf};

    use gpu_scene_tracer::gpu::GpuContext;
    use gpu_scene_tracer::{FrameState, Renderer, SceneMode, TracerError};

    fn crate_path(relative: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
    }

    fn renderer_with_kernel(kernel: PathBuf) -> Renderer {
        Renderer::new(GpuContext::headless().unwrap(), kernel, crate_path("assets"))
    }

    fn renderer() -> Renderer {
        renderer_with_kernel(crate_path("shaders/ray_trace.wgsl"))
    }

    /// Kernel file in the temp dir holding `source`.
    fn kernel_file(name: &str, source: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{name}-{}.wgsl", std::process::id()));
        std::fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn frame_has_four_bytes_per_pixel() {
        let frame = renderer()
            .render_frame(&FrameState::default(), 640, 480)
            .unwrap();

        assert_eq!(frame.pixels.len(), 1_228_800);
        assert!(frame.pixels.chunks_exact(4).all(|pixel| pixel[3] == 255));
    }

    #[test]
    fn identical_frames_are_byte_identical() {
        let renderer = renderer();
        let state = FrameState::new(SceneMode::SphereAndCube, 4);

        let first = renderer.render_frame(&state, 320, 240).unwrap();
        let second = renderer.render_frame(&state, 320, 240).unwrap();

        assert_eq!(first.pixels, second.pixels);
    }

    #[test]
    fn scene_without_spheres_renders() {
        let state = FrameState::new(SceneMode::TwoCubes, 8);
        let frame = renderer().render_frame(&state, 160, 120).unwrap();
        assert_eq!(frame.pixels.len(), 160 * 120 * 4);
    }

    #[test]
    fn sizes_that_do_not_fill_a_work_group() {
        let frame = renderer()
            .render_frame(&FrameState::default(), 641, 3)
            .unwrap();
        assert_eq!(frame.pixels.len(), 641 * 3 * 4);
    }

    #[test]
    fn missing_kernel_file_is_reported() {
        let err = renderer_with_kernel(crate_path("shaders/missing.wgsl"))
            .render_frame(&FrameState::default(), 64, 64)
            .unwrap_err();
        assert!(matches!(err, TracerError::ResourceMissing { .. }), "{err}");
    }

    #[test]
    fn broken_kernel_fails_to_build_with_a_log() {
        let path = kernel_file("broken-kernel", "fn ray_trace_scene_pixel( {\n");
        let result = renderer_with_kernel(path.clone()).render_frame(&FrameState::default(), 64, 64);
        std::fs::remove_file(&path).unwrap();

        match result {
            // the error sits on line 1 of the file, after the prelude is taken off
            Err(TracerError::ProgramBuildFailure { log }) => assert!(log.contains("wgsl:1:"), "{log}"),
            other => panic!("expected a build failure, got {other:?}"),
        }
    }

    #[test]
    fn kernel_with_drifted_arguments_fails_to_bind() {
        let source = std::fs::read_to_string(crate_path("shaders/ray_trace.wgsl")).unwrap();
        let drifted = source.replace(
            "@group(0) @binding(9) var<uniform> zoom: f32;",
            "@group(0) @binding(9) var<storage, read> zoom: f32;",
        );
        assert_ne!(source, drifted);

        let path = kernel_file("drifted-kernel", &drifted);
        let result = renderer_with_kernel(path.clone()).render_frame(&FrameState::default(), 64, 64);
        std::fs::remove_file(&path).unwrap();

        assert!(
            matches!(result, Err(TracerError::KernelBindFailure { .. })),
            "{result:?}"
        );
    }
}
