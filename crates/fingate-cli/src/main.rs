//! fingate - terminal simulator for the fingerprint access-control core.
//!
//! Runs the real menu, enrollment and identification code against the mock
//! sensor (or an R30x module behind a TCP serial bridge), with the LCD drawn
//! on stdout and logs on stderr.

mod keys;
mod terminal;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use clap::Parser;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fingate_core::ControllerConfig;
use fingate_core::constants::DEFAULT_SENSOR_PASSWORD;
use fingate_hardware::devices::AnySensor;
use fingate_hardware::mock::{MockSensor, MockSensorHandle, MockWifi};
use fingate_hardware::serial::{BoxedLink, SerialSensor};
use fingate_hardware::{ButtonLatches, SystemClock, Uptime};
use fingate_menu::{MenuController, Peripherals};

use crate::terminal::TerminalDisplay;

#[derive(Parser, Debug)]
#[command(name = "fingate")]
#[command(about = "Fingerprint access-control appliance simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON controller configuration
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Pre-fill template slots 1..=N in the mock sensor
    #[arg(long, default_value_t = 0)]
    occupied: u16,

    /// Report WiFi as connected with this address
    #[arg(long, value_name = "ADDR")]
    wifi_ip: Option<String>,

    /// Control loop period in milliseconds
    #[arg(long, default_value_t = 10)]
    tick_ms: u64,

    /// Use an R30x module behind a serial-to-TCP bridge instead of the mock
    #[arg(long, value_name = "HOST:PORT")]
    sensor_tcp: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    info!(version = env!("CARGO_PKG_VERSION"), "fingate simulator starting");

    let (sensor, finger) = open_sensor(&cli, &config).await?;
    info!(sensor = sensor.kind(), "sensor ready");

    let wifi = match &cli.wifi_ip {
        Some(ip) => MockWifi::connected(ip.clone()),
        None => MockWifi::disconnected(),
    };

    let uptime = Uptime::start();
    let latches = Arc::new(ButtonLatches::new(config.debounce_ms));
    let peripherals = Peripherals {
        sensor,
        display: TerminalDisplay::default(),
        clock: SystemClock::new(build_time()),
        wifi,
    };
    let mut menu = MenuController::new(peripherals, &config, uptime);

    eprintln!("{}", keys::HELP);
    menu.show_status();

    let (quit_tx, mut quit_rx) = watch::channel(false);
    tokio::spawn(keys::read_keys(Arc::clone(&latches), uptime, finger, quit_tx));

    let mut ticker = tokio::time::interval(Duration::from_millis(cli.tick_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => menu.poll(&latches).await,
            _ = quit_rx.changed() => break,
        }
    }

    info!("shutting down");
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<ControllerConfig> {
    match path {
        Some(path) => ControllerConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(ControllerConfig::default()),
    }
}

async fn open_sensor(
    cli: &Cli,
    config: &ControllerConfig,
) -> Result<(AnySensor, Option<MockSensorHandle>)> {
    if let Some(addr) = &cli.sensor_tcp {
        if cli.occupied > 0 {
            warn!("--occupied only applies to the mock sensor");
        }
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("connecting to sensor bridge at {}", addr))?;
        let link: BoxedLink = Box::new(stream);
        let mut sensor = SerialSensor::connect(link, DEFAULT_SENSOR_PASSWORD)
            .await
            .context("sensor handshake")?;
        match sensor.template_count().await {
            Ok(count) => info!(count, "templates on module"),
            Err(e) => warn!(error = %e, "could not read template count"),
        }
        return Ok((AnySensor::Serial(sensor), None));
    }

    let (sensor, handle) = MockSensor::new();
    let occupied = cli.occupied.min(config.slot_capacity);
    handle.occupy_first(occupied);
    info!(occupied, "mock sensor template store filled");
    Ok((AnySensor::Mock(sensor), Some(handle)))
}

/// Reference time for "Set RTC Time": when this binary was built.
fn build_time() -> NaiveDateTime {
    env!("FINGATE_BUILD_EPOCH")
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|utc| utc.with_timezone(&Local).naive_local())
        .unwrap_or_else(|| Local::now().naive_local())
}
