//! Command-line entry: render one of the built-in scenes.

// std
use std::process::exit;
use std::sync::atomic::AtomicBool;
// others
use structopt::StructOpt;
// lumen
use rs_lumen::core::renderer::{render, IntegratorType, RenderError};
use rs_lumen::scenes::{create_scene, BUILTIN_SCENES};

#[derive(StructOpt)]
#[structopt(name = "rs_lumen", about = "Physically based light transport in Rust")]
struct Cli {
    /// Name of a built-in scene.
    scene: String,
    /// Samples per pixel (overrides the scene default).
    #[structopt(long = "spp")]
    spp: Option<i32>,
    /// Output image path (.png or .hdr).
    #[structopt(long = "out")]
    out: Option<String>,
    /// Worker thread count; defaults to the hardware parallelism.
    #[structopt(long = "threads")]
    threads: Option<usize>,
    /// Integrator override (path, vol_path, bdpt, sppm, ...).
    #[structopt(long = "integrator")]
    integrator: Option<String>,
}

fn main() {
    let cli: Cli = Cli::from_args();
    let mut info = match create_scene(&cli.scene) {
        Some(info) => info,
        None => {
            eprintln!(
                "unknown scene {:?}; built-in scenes: {}",
                cli.scene,
                BUILTIN_SCENES.join(", ")
            );
            exit(1);
        }
    };
    if let Some(spp) = cli.spp {
        if spp <= 0 {
            eprintln!("--spp must be positive");
            exit(1);
        }
        info.camera_info.sampler_info.spp = spp;
    }
    if let Some(out) = cli.out {
        info.camera_info.film_info.filename = out;
    }
    if let Some(name) = cli.integrator {
        match IntegratorType::parse(&name) {
            Some(integrator_type) => info.integrator_info.integrator_type = integrator_type,
            None => {
                eprintln!("unknown integrator {:?}", name);
                exit(1);
            }
        }
    }
    let threads: usize = cli.threads.unwrap_or_else(num_cpus::get);
    let cancel: AtomicBool = AtomicBool::new(false);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        render(&info, threads, &cancel)
    }));
    match result {
        Ok(Ok(())) => {}
        Ok(Err(err @ RenderError::Config(_))) => {
            eprintln!("{}", err);
            exit(1);
        }
        Ok(Err(err @ RenderError::AssetLoad(_))) => {
            eprintln!("{}", err);
            exit(2);
        }
        Err(_) => {
            eprintln!("internal assertion failed");
            exit(3);
        }
    }
}
