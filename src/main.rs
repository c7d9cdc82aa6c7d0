use anyhow::{Context, Result};
use cameraview::{
    BackendKind, CameraBackend, CameraViewConfig, EventBus, EventFilter, EventReceiver,
    SessionEvent, SessionHost, Size, StaticSurface, SurfaceKind,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// Upper bound on waiting for a single preview frame
const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "cameraview")]
#[command(about = "Camera session engine driven against a simulated device stack")]
#[command(version)]
#[command(long_about = "Opens a camera session on a simulated two-sensor device stack, \
negotiates capture parameters, feeds screen-orientation readings into the session \
and reports the resulting lifecycle and frame events.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "cameraview.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to daily files in this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<String>,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without opening a camera")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Screen orientations to apply after the session starts
    #[arg(long, value_delimiter = ',', default_value = "0,90,180,270")]
    orientations: Vec<u32>,

    /// Preview frames to wait for before stopping
    #[arg(long, default_value_t = 30)]
    frames: u64,

    /// Switch to the other camera after the first run of frames
    #[arg(long)]
    switch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let _log_guard = init_logging(&args)?;

    info!("Starting CameraView v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match CameraViewConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        if args.validate_config {
            eprintln!("✗ Configuration validation failed: {}", e);
            std::process::exit(1);
        }
        return Err(e.into());
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    run(config, args).await
}

async fn run(config: CameraViewConfig, args: Args) -> Result<()> {
    let bus = EventBus::new(config.events.capacity);
    let mut frames = EventReceiver::new(
        &bus,
        EventFilter::EventTypes(vec!["frame_received"]),
        "frame-counter",
    );
    let logger = tokio::spawn(log_events(EventReceiver::new(
        &bus,
        EventFilter::All,
        "cli-logger",
    )));

    let surface = Arc::new(StaticSurface::new(
        SurfaceKind::Texture,
        Size::new(1080, 1920),
    ));
    let primary: Box<dyn CameraBackend> =
        Box::new(config.simulator.build_backend(config.backend.kind));
    let mut host = SessionHost::new(primary, surface).with_event_bus(bus.clone());
    if config.backend.kind == BackendKind::Advanced && config.backend.fallback_to_legacy {
        host = host.with_fallback(Box::new(
            config.simulator.build_backend(BackendKind::Legacy),
        ));
    }

    let parameters = config.session.to_parameters();
    let orientations = args.orientations.clone();
    let host = tokio::task::spawn_blocking(move || -> Result<SessionHost> {
        host.start(parameters).context("Failed to start camera session")?;
        info!(
            "Session started on {} backend, preview {:?}",
            host.backend_kind(),
            host.parameters().preview_size
        );
        for degrees in orientations {
            host.on_orientation_changed(degrees)
                .with_context(|| format!("Failed to apply orientation {}", degrees))?;
        }
        Ok(host)
    })
    .await??;

    wait_for_frames(&mut frames, args.frames).await?;

    let host = if args.switch {
        let host = tokio::task::spawn_blocking(move || -> Result<SessionHost> {
            let mut host = host;
            host.switch_camera().context("Failed to switch camera")?;
            Ok(host)
        })
        .await??;
        wait_for_frames(&mut frames, args.frames).await?;
        host
    } else {
        host
    };

    tokio::task::spawn_blocking(move || {
        let mut host = host;
        host.close();
    })
    .await?;

    drop(bus);
    match tokio::time::timeout(Duration::from_secs(1), logger).await {
        Ok(Err(e)) => warn!("Event logger ended abnormally: {}", e),
        Err(_) => debug!("Event logger still attached at shutdown"),
        Ok(Ok(())) => {}
    }

    info!("CameraView finished");
    Ok(())
}

async fn wait_for_frames(frames: &mut EventReceiver, count: u64) -> Result<()> {
    for received in 0..count {
        tokio::time::timeout(FRAME_TIMEOUT, frames.recv())
            .await
            .with_context(|| format!("Timed out after {} of {} frames", received, count))??;
    }
    info!("Received {} preview frames", count);
    Ok(())
}

async fn log_events(mut receiver: EventReceiver) {
    while let Ok(event) = receiver.recv().await {
        match &event {
            SessionEvent::FrameReceived { .. } => debug!("{}", event.description()),
            SessionEvent::BackendFallback { .. } => warn!("{}", event.description()),
            _ => info!("{}", event.description()),
        }
    }
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cameraview={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    // Capture threads log too, so file output goes through a non-blocking writer
    let (file_layer, guard) = match &args.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "cameraview.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# CameraView Configuration File");
    println!("# This is the default configuration with all available options");
    println!("# Environment overrides use CAMERAVIEW__<SECTION>__<KEY>");
    println!();

    let rendered = CameraViewConfig::default()
        .to_toml()
        .context("Failed to render default configuration")?;
    println!("{}", rendered);
    Ok(())
}
