//! Entry point for objview.
//! Logging + CLI flags: --model, --gpu-backend, --size/--width/--height.

use anyhow::Result;
use platform::ViewerConfig;

fn parse_model_arg(args: &[String]) -> Option<String> {
    args.iter()
        .filter_map(|arg| arg.strip_prefix("--model="))
        .filter(|val| !val.is_empty())
        .last()
        .map(str::to_owned)
}

/// `--gpu-backend=auto|vulkan|dx12|metal|gl`; the last flag wins.
fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    args.iter()
        .filter_map(|arg| arg.strip_prefix("--gpu-backend="))
        .last()
        .map_or(wgpu::Backends::all(), backend_from_name)
}

fn backend_from_name(name: &str) -> wgpu::Backends {
    match name.to_ascii_lowercase().as_str() {
        "auto" => wgpu::Backends::all(),
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" | "d3d12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" | "opengl" | "gles" => wgpu::Backends::GL,
        other => {
            log::warn!("Unknown backend '{}', falling back to auto.", other);
            wgpu::Backends::all()
        }
    }
}

/// Window size from `--size=WxH`, `--width=` and `--height=`; later flags
/// override earlier ones and unparsable values are ignored.
fn parse_size_args(args: &[String], (mut width, mut height): (u32, u32)) -> (u32, u32) {
    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            let parsed = v
                .split_once(['x', 'X'])
                .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)));
            match parsed {
                Some(size) => (width, height) = size,
                None => log::warn!("Ignoring malformed --size value '{}'", v),
            }
        } else if let Some(Ok(w)) = arg.strip_prefix("--width=").map(str::parse::<u32>) {
            width = w;
        } else if let Some(Ok(h)) = arg.strip_prefix("--height=").map(str::parse::<u32>) {
            height = h;
        }
    }
    (width.max(1), height.max(1))
}

fn parse_config(args: &[String]) -> ViewerConfig {
    let defaults = ViewerConfig::default();
    let (width, height) = parse_size_args(args, (defaults.width, defaults.height));
    ViewerConfig {
        model: parse_model_arg(args).unwrap_or(defaults.model),
        backends: parse_backend_arg(args),
        width,
        height,
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = parse_config(&args);
    log::info!(
        "Starting objview. Model: {}, backend: {:?}, window_size={}x{}",
        config.model,
        config.backends,
        config.width,
        config.height
    );

    platform::run_viewer(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
