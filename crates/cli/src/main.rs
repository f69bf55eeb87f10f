use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

use maskwatch_core::capture::domain::video_source::VideoSource;
use maskwatch_core::capture::infrastructure::jpeg_frame_sampler::JpegFrameSampler;
use maskwatch_core::capture::infrastructure::still_image_camera::StillImageCamera;
use maskwatch_core::detection::infrastructure::fail_open_detection_client::FailOpenDetectionClient;
use maskwatch_core::detection::infrastructure::gemini_inference::GeminiInference;
use maskwatch_core::overlay::infrastructure::raster_surface::RasterSurface;
use maskwatch_core::overlay::overlay_renderer::OverlayRenderer;
use maskwatch_core::session::detection_loop::DetectionLoop;
use maskwatch_core::session::session_controller::SessionController;
use maskwatch_core::session::session_store::{SessionEvent, SessionStore};
use maskwatch_core::shared::settings::Settings;

/// Live mask detection over a still image served as a camera.
#[derive(Parser)]
#[command(name = "maskwatch")]
struct Cli {
    /// Image file to use as the camera feed.
    image: PathBuf,

    /// Write the final overlay, composited over the displayed frame, as PNG.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Seconds to keep the session running (Ctrl-C stops early).
    #[arg(long, default_value = "10")]
    duration: u64,

    /// On-screen video size as WIDTHxHEIGHT (defaults to the image size).
    #[arg(long, value_parser = parse_display)]
    display: Option<DisplaySize>,

    /// Gemini model name.
    #[arg(long)]
    model: Option<String>,

    /// Milliseconds between detection cycles.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Per-request timeout for the inference call, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// API key for the inference service.
    #[arg(long, env = "MASKWATCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct DisplaySize {
    width: u32,
    height: u32,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let settings = build_settings(&cli);

    let inference = GeminiInference::new(&settings)?;
    log::info!("Using model {}", inference.model());

    let mut camera = StillImageCamera::from_path(&cli.image);
    if let Some(display) = cli.display {
        camera = camera.with_displayed_size(display.width, display.height);
    }

    let store = Arc::new(SessionStore::new());
    let detection_loop = DetectionLoop::new(
        store.clone(),
        Arc::new(JpegFrameSampler::new(settings.jpeg_quality)),
        Arc::new(FailOpenDetectionClient::new(inference)),
    )
    .with_interval(settings.detection_interval());
    let controller = SessionController::new(Arc::new(camera), store.clone(), detection_loop);

    spawn_event_printer(&store);

    controller.toggle().await;
    let Some(source) = controller.video_source() else {
        let error = controller.snapshot().error.unwrap_or_default();
        controller.teardown();
        return Err(format!("Could not open {}: {error}", cli.image.display()).into());
    };

    let renderer = OverlayRenderer::new(store.clone());
    let surface = Arc::new(Mutex::new(RasterSurface::default()));
    let render = renderer.spawn(surface, source.clone(), settings.render_interval());

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(cli.duration)) => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            log::info!("Interrupted");
        }
    }

    render.cancel().await;

    if let Some(output) = &cli.output {
        write_overlay(&renderer, source.as_ref(), output)?;
        log::info!("Overlay written to {}", output.display());
    }

    controller.toggle().await;
    controller.teardown();
    Ok(())
}

fn build_settings(cli: &Cli) -> Settings {
    let mut settings = Settings::from_env();
    if let Some(key) = &cli.api_key {
        settings.api_key = Some(key.clone());
    }
    if let Some(model) = &cli.model {
        settings.model = model.clone();
    }
    if let Some(ms) = cli.interval_ms {
        settings.detection_interval_ms = ms;
    }
    if cli.timeout_secs.is_some() {
        settings.request_timeout_secs = cli.timeout_secs;
    }
    settings
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.image.exists() {
        return Err(format!("Image file not found: {}", cli.image.display()).into());
    }
    if cli.interval_ms == Some(0) {
        return Err("Detection interval must be at least 1 ms".into());
    }
    if let Some(output) = &cli.output {
        let is_png = output
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if !is_png {
            return Err(format!("Output must be a .png file, got {}", output.display()).into());
        }
    }
    Ok(())
}

/// Prints session changes as they happen. Ends when the store goes away.
fn spawn_event_printer(store: &SessionStore) {
    let events = store.subscribe();
    std::thread::spawn(move || {
        for event in events {
            match event {
                SessionEvent::Status(message) => println!("{message}"),
                SessionEvent::Error(Some(error)) => eprintln!("{error}"),
                SessionEvent::Detections(detections) => {
                    for d in detections.iter() {
                        log::info!(
                            "{} at ({:.2}, {:.2}) {:.2}x{:.2}",
                            d.label(),
                            d.bbox.x,
                            d.bbox.y,
                            d.bbox.width,
                            d.bbox.height
                        );
                    }
                }
                other => log::debug!("{other:?}"),
            }
        }
    });
}

/// Paints the current results once and lays them over the frame scaled to
/// the displayed size.
fn write_overlay(
    renderer: &OverlayRenderer,
    source: &dyn VideoSource,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = source
        .current_frame()
        .and_then(|f| f.to_rgb_image())
        .ok_or("No frame available to composite")?;

    let mut surface = RasterSurface::default();
    renderer.paint(&mut surface, source);
    let overlay = surface.into_image();

    let mut composed: RgbaImage = DynamicImage::ImageRgb8(frame).to_rgba8();
    if composed.dimensions() != overlay.dimensions() {
        composed = imageops::resize(
            &composed,
            overlay.width(),
            overlay.height(),
            FilterType::Triangle,
        );
    }
    imageops::overlay(&mut composed, &overlay, 0, 0);
    composed.save(output)?;
    Ok(())
}

fn parse_display(value: &str) -> Result<DisplaySize, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: u32 = w.trim().parse().map_err(|_| format!("bad width '{w}'"))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("bad height '{h}'"))?;
    if width == 0 || height == 0 {
        return Err("display size must be non-zero".to_string());
    }
    Ok(DisplaySize { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display() {
        assert_eq!(
            parse_display("1280x720"),
            Ok(DisplaySize {
                width: 1280,
                height: 720
            })
        );
        assert_eq!(
            parse_display("640X360").map(|d| d.height),
            Ok(360)
        );
        assert!(parse_display("1280").is_err());
        assert!(parse_display("0x720").is_err());
        assert!(parse_display("wide x tall").is_err());
    }
}
