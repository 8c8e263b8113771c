use std::path::PathBuf;

use clap::Parser;

use crate::define_scene::SceneMode;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Ray traces small scenes on the GPU, one kernel dispatch per frame", long_about = None)]
pub struct Args {
    /// Initial window (or headless image) width in pixels.
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Initial window (or headless image) height in pixels.
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// WGSL kernel, re-read and recompiled for every frame.
    #[arg(long, default_value = "shaders/ray_trace.wgsl")]
    pub kernel: PathBuf,

    /// Directory holding the mesh files.
    #[arg(long, default_value = "assets")]
    pub assets: PathBuf,

    /// Scene to start with, taken modulo 5.
    #[arg(long, default_value_t = 0)]
    pub scene: usize,

    /// Initial maximum reflection depth.
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_depth: u32,

    /// Render a single frame to `--output` and exit.
    #[arg(long)]
    pub headless: bool,

    /// PNG written by `--headless` and by the snapshot key.
    #[arg(short, long, default_value = "frame.png")]
    pub output: PathBuf,

    /// Log filter in env_logger syntax, e.g. "debug" or "gpu_scene_tracer=debug,wgpu=warn".
    #[arg(long)]
    pub log: Option<String>,
}

impl Args {
    pub fn scene_mode(&self) -> SceneMode {
        SceneMode::from_index(self.scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["gpu_scene_tracer"]);
        assert_eq!((args.width, args.height), (640, 480));
        assert_eq!(args.kernel, PathBuf::from("shaders/ray_trace.wgsl"));
        assert_eq!(args.max_depth, 8);
        assert!(!args.headless);
        assert_eq!(args.scene_mode(), SceneMode::TwoSpheres);
    }

    #[test]
    fn scene_index_wraps() {
        let args = Args::parse_from(["gpu_scene_tracer", "--scene", "7", "--headless"]);
        assert_eq!(args.scene_mode(), SceneMode::TwoCubes);
        assert!(args.headless);
    }

    #[test]
    fn zero_depth_is_rejected() {
        assert!(Args::try_parse_from(["gpu_scene_tracer", "--max-depth", "0"]).is_err());
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
