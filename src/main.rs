//! Mobile APRS station controller — ingests GPS fixes and KISS-framed TNC
//! packets, runs SmartBeaconing, encodes MIC-E/plain/status beacons, and
//! publishes station state to a display process over a datagram socket.
//!
//! Usage:
//!   aprs-tracker -c /etc/aprs-tracker/aprs.conf
//!   aprs-tracker -c /etc/aprs-tracker/aprs.conf --testing --verbose

mod aprs_text;
mod beacon;
mod cache;
mod comment;
mod config;
mod context;
mod display;
mod error;
mod eventloop;
mod ingest;
mod kiss;
mod mice;
mod nmea;
mod position;
mod scheduler;
mod serial;
mod smartbeacon;
mod telemetry;
mod util;

use std::io::{BufRead, BufReader, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::{error, info, warn};
use tokio::sync::mpsc;

use config::GpsType;
use context::AppState;
use display::DisplaySink;

const DEFAULT_DISPLAY_PORT: u16 = 10001;
const CHANNEL_DEPTH: usize = 64;

#[derive(Debug, Parser)]
#[command(name = "aprs-tracker", about = "Mobile APRS station controller")]
struct Cli {
    /// Path to the station configuration file.
    #[arg(short = 'c', long = "conf", default_value = "/etc/aprs-tracker/aprs.conf")]
    conf: PathBuf,

    /// Override the configured TNC serial device.
    #[arg(short = 't', long = "tnc")]
    tnc: Option<String>,

    /// Override the configured GPS serial device.
    #[arg(short = 'g', long = "gps")]
    gps: Option<String>,

    /// Override the configured telemetry serial device.
    #[arg(short = 'T', long = "telemetry")]
    telemetry: Option<String>,

    /// Synthesize GPS fixes from the `[static]` config section instead of
    /// reading a real GPS device.
    #[arg(long = "testing")]
    testing: bool,

    /// Log to stderr at debug level instead of syslog.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Display process endpoint: a filesystem path for a Unix datagram
    /// socket, or a `host:port` for UDP. Defaults to the config file's
    /// `display` key.
    #[arg(short = 'd', long = "display")]
    display: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut cfg = match config::load_config(&cli.conf) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("aprs-tracker: config error: {e}");
            process::exit(1);
        }
    };

    if let Some(tnc) = &cli.tnc {
        cfg.tnc_port = tnc.clone();
    }
    if let Some(gps) = &cli.gps {
        cfg.gps_port = gps.clone();
        cfg.gps_type = GpsType::Serial;
    }
    if let Some(tel) = &cli.telemetry {
        cfg.tel_port = tel.clone();
    }
    if cli.testing {
        cfg.gps_type = GpsType::Static;
    }
    if let Some(display) = &cli.display {
        cfg.display = display.clone();
    }

    if let Err(e) = config::validate_config(&cfg) {
        eprintln!("aprs-tracker: config validation: {e}");
        process::exit(1);
    }

    setup_logging(cli.verbose, &cfg.log_file).expect("failed to set up logging");

    info!("aprs-tracker {} starting for {}", env!("CARGO_PKG_VERSION"), cfg.station.mycall);

    let display_sink = match open_display_sink(&cfg.display) {
        Ok(sink) => sink,
        Err(e) => {
            error!("cannot open display endpoint {}: {e}", cfg.display);
            process::exit(1);
        }
    };

    let tnc_file = match serial::open_serial(&cfg.tnc_port, cfg.tnc_rate) {
        Ok(f) => f,
        Err(e) => {
            error!("cannot open TNC device {}: {e}", cfg.tnc_port);
            process::exit(1);
        }
    };
    let tnc_write = tnc_file.try_clone().expect("dup TNC fd for writer task");

    let (tnc_data_tx, tnc_rx) = mpsc::channel::<Vec<u8>>(CHANNEL_DEPTH);
    let (tnc_out_tx, tnc_out_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    spawn_byte_reader(tnc_file, tnc_data_tx);
    spawn_tnc_writer(tnc_write, tnc_out_rx);

    let gps_rx = if cfg.gps_type == GpsType::Serial && !cfg.gps_port.is_empty() {
        match serial::open_serial(&cfg.gps_port, cfg.gps_rate) {
            Ok(f) => {
                let (tx, rx) = mpsc::channel::<String>(CHANNEL_DEPTH);
                spawn_line_reader(f, tx);
                Some(rx)
            }
            Err(e) => {
                warn!("cannot open GPS device {}: {e} (continuing without live GPS)", cfg.gps_port);
                None
            }
        }
    } else {
        None
    };

    let tel_rx = if !cfg.tel_port.is_empty() {
        match serial::open_serial(&cfg.tel_port, cfg.tel_rate) {
            Ok(f) => {
                let (tx, rx) = mpsc::channel::<String>(CHANNEL_DEPTH);
                spawn_line_reader(f, tx);
                Some(rx)
            }
            Err(e) => {
                warn!("cannot open telemetry device {}: {e} (continuing without telemetry)", cfg.tel_port);
                None
            }
        }
    } else {
        None
    };

    let mut state = AppState::new(cfg, display_sink);
    state.testing = cli.testing;
    let inputs = eventloop::Inputs { tnc_rx, gps_rx, tel_rx, tnc_tx: tnc_out_tx };

    eventloop::run(state, inputs).await;
    error!("event loop exited; all serial inputs have gone away");
    process::exit(1);
}

/// `display` is a filesystem path (Unix datagram socket) unless it parses
/// as a `host:port` or bare host, in which case it's treated as a UDP
/// endpoint.
fn open_display_sink(display: &str) -> std::io::Result<DisplaySink> {
    if let Ok(addr) = display.parse::<SocketAddr>() {
        return DisplaySink::udp(addr);
    }
    if !display.contains('/') {
        if let Ok(mut addrs) = std::net::ToSocketAddrs::to_socket_addrs(&(display, DEFAULT_DISPLAY_PORT)) {
            if let Some(addr) = addrs.next() {
                return DisplaySink::udp(addr);
            }
        }
    }
    DisplaySink::unix(std::path::Path::new(display))
}

fn spawn_byte_reader(file: std::fs::File, tx: mpsc::Sender<Vec<u8>>) {
    tokio::task::spawn_blocking(move || {
        let mut reader = BufReader::new(file);
        let mut buf = [0u8; 256];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.blocking_send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("TNC read error: {e}");
                    break;
                }
            }
        }
    });
}

fn spawn_line_reader(file: std::fs::File, tx: mpsc::Sender<String>) {
    tokio::task::spawn_blocking(move || {
        let mut reader = BufReader::new(file);
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    let trimmed = line.trim_end_matches(['\r', '\n']).to_string();
                    if !trimmed.is_empty() && tx.blocking_send(trimmed).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("serial read error: {e}");
                    break;
                }
            }
        }
    });
}

fn spawn_tnc_writer(mut file: std::fs::File, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    tokio::task::spawn_blocking(move || {
        use std::io::Write;
        while let Some(bytes) = rx.blocking_recv() {
            if let Err(e) = file.write_all(&bytes) {
                warn!("TNC write error: {e}");
            }
        }
    });
}

/// In verbose mode, log to stderr at debug level. Otherwise try syslog
/// first (the normal unattended-daemon path); if the syslog socket isn't
/// reachable, redirect stdout/stderr to the configured log file instead,
/// matching the original's `redir_log` fallback.
fn setup_logging(verbose: bool, log_file: &std::path::Path) -> anyhow::Result<()> {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
        return Ok(());
    }

    let formatter = syslog::Formatter3164 {
        facility: syslog::Facility::LOG_DAEMON,
        hostname: None,
        process: "aprs-tracker".into(),
        pid: process::id(),
    };
    match syslog::unix(formatter) {
        Ok(logger) => {
            log::set_boxed_logger(Box::new(syslog::BasicLogger::new(logger)))
                .map(|()| log::set_max_level(log::LevelFilter::Info))
                .map_err(|e| anyhow::anyhow!("set_logger: {e}"))?;
        }
        Err(e) => {
            eprintln!("aprs-tracker: syslog unavailable ({e}), falling back to {}", log_file.display());
            redirect_stdio_to_file(log_file)?;
            env_logger::Builder::from_default_env()
                .filter_level(log::LevelFilter::Info)
                .init();
        }
    }
    Ok(())
}

fn redirect_stdio_to_file(path: &std::path::Path) -> anyhow::Result<()> {
    use std::os::unix::io::AsRawFd;
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    nix::unistd::dup2(file.as_raw_fd(), std::io::stdout().as_raw_fd())?;
    nix::unistd::dup2(file.as_raw_fd(), std::io::stderr().as_raw_fd())?;
    Ok(())
}
