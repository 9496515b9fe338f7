//! Pi-cam-hal binary for exercising the camera module.

use std::path::PathBuf;

use clap::Parser;
use pi_cam_hal::{
    CameraHal, DeviceOps, FourCC, HalConfig, StreamDescriptor, StreamType,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Module configuration file. Defaults to a single camera without a sensor.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera to open.
    #[arg(long, default_value = "0")]
    camera: String,

    /// Preview width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Preview height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    if let Err(err) = run(&args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(args: &CliArgs) -> pi_cam_hal::Result<()> {
    let config = match &args.config {
        Some(path) => HalConfig::from_file(path)?,
        None => HalConfig::default(),
    };
    let hal = CameraHal::new(&config);

    println!("Cameras: {}", hal.number_of_cameras());
    for id in (0u32..).take(hal.number_of_cameras()) {
        let info = hal.camera_info(id)?;
        println!(
            "  camera {id}: {:?}, orientation {}",
            info.facing, info.orientation
        );
    }

    let device = hal.open_device(&args.camera)?;
    if let Some(caps) = device.camera().sensor_capabilities() {
        println!("Sensor: {} ({})", caps.card, caps.driver);
    }

    let mut streams = vec![
        StreamDescriptor::new(StreamType::Output, args.width, args.height, FourCC::NV21),
        StreamDescriptor::new(StreamType::Output, args.width, args.height, FourCC::MJPG),
    ];

    // Configure twice; the second pass should reuse every stream.
    for pass in 1..=2 {
        device.camera().configure_streams(&mut streams)?;
        println!("Configuration {pass}:");
        for stream in device.camera().streams() {
            println!(
                "  {} {:?} {}x{} {} usage={:#x} max_buffers={}",
                stream.handle,
                stream.stream_type,
                stream.width,
                stream.height,
                stream.format,
                stream.usage.bits(),
                stream.max_buffers
            );
        }
    }

    let status = device.close();
    println!("Closed with status {status}");
    Ok(())
}
