use anyhow::{Context, Result};
use clap::Parser;
use linkmon_core::protocol;
use linkmon_core::{Config, DataLog};
use once_cell::sync::OnceCell;
use rand::Rng;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(author, version, about = "linkmon-feed: link quality collector and relay")]
struct Args {
    /// Path to config TOML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override listen address
    #[arg(long)]
    listen: Option<String>,
    /// Override wireless interface
    #[arg(long)]
    interface: Option<String>,
    /// Override RTT probe address
    #[arg(long)]
    probe: Option<String>,
    /// Override sampling interval
    #[arg(long)]
    interval: Option<humantime::Duration>,
    /// Emit synthetic measurements
    #[arg(long)]
    simulate: bool,
}

type ClientRegistry = Arc<Mutex<Vec<Sender<String>>>>;

#[derive(Debug, Clone, Copy)]
struct LinkSample {
    rssi: i32,
    rtt: i32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    init_logging(&config)?;
    info!("starting linkmon-feed on {}", config.feed.listen);

    let log = Arc::new(Mutex::new(DataLog::new(config.thresholds)));
    let clients: ClientRegistry = Arc::new(Mutex::new(Vec::new()));

    let running = Arc::new(AtomicBool::new(true));
    let reload = Arc::new(AtomicBool::new(false));
    setup_signals(running.clone(), reload.clone());

    let pid_guard = PidGuard::new(config.feed.pid_file.clone())?;

    let listener =
        TcpListener::bind(&config.feed.listen).context("binding feed listen address")?;
    spawn_listener(listener, clients.clone(), log.clone(), running.clone());

    let mut simulator = config.feed.simulate.then(Simulator::new);
    let mut counter: u64 = 0;

    while running.load(Ordering::SeqCst) {
        if reload.swap(false, Ordering::SeqCst) {
            info!("reloading config");
            match Config::load(args.config.as_deref()) {
                Ok(mut new_cfg) => {
                    apply_overrides(&mut new_cfg, &args);
                    config = new_cfg;
                }
                Err(err) => warn!("failed to reload config: {err}"),
            }
        }

        let sample = match &mut simulator {
            Some(sim) => sim.next_sample(),
            None => sample_kernel(&config),
        };
        collect_cycle(&log, &clients, sample, &mut counter, simulator.is_some());

        thread::sleep(config.feed.interval);
    }

    drop(pid_guard);
    info!("linkmon-feed stopped");
    Ok(())
}

/// Fold one sampling attempt into the log and fan the resulting lines out
/// to every viewer. Link status transitions are edge-triggered: one
/// STATUS line per change, not per cycle.
fn collect_cycle(
    log: &Mutex<DataLog>,
    clients: &ClientRegistry,
    sample: Option<LinkSample>,
    counter: &mut u64,
    simulated: bool,
) {
    let mut lines: Vec<String> = Vec::new();

    match sample {
        Some(LinkSample { rssi, rtt }) => {
            *counter += 1;
            // Synthetic streams skip counter values now and then so the
            // packet-loss accounting has something to see.
            if simulated && rand::thread_rng().gen_bool(0.02) {
                *counter += rand::thread_rng().gen_range(1..=2);
            }

            let mut log = lock_log(log);
            if !log.connection().is_connected() {
                let change = log.set_connected();
                lines.push(protocol::encode_status(change.status));
            }
            let measurement = log.add_measurement(rssi, rtt, *counter);
            lines.push(protocol::encode_data(rssi, rtt, *counter));
            if let Some(warning) = &measurement.warning {
                match protocol::encode_warning(warning) {
                    Ok(line) => lines.push(line),
                    Err(err) => warn!("failed to encode warning: {err}"),
                }
            }
            if *counter % 10 == 0 {
                match protocol::encode_stats(&log.stats_payload()) {
                    Ok(line) => lines.push(line),
                    Err(err) => warn!("failed to encode stats: {err}"),
                }
            }
        }
        None => {
            let mut log = lock_log(log);
            if log.connection().is_connected() {
                let change = log.set_disconnected();
                warn!("link lost");
                lines.push(protocol::encode_status(change.status));
                if let Some(warning) = &change.warning {
                    if let Ok(line) = protocol::encode_warning(warning) {
                        lines.push(line);
                    }
                }
            }
        }
    }

    if !lines.is_empty() {
        broadcast(clients, &lines);
    }
}

fn sample_kernel(config: &Config) -> Option<LinkSample> {
    let rssi = match read_wireless_rssi(config.feed.interface.as_deref()) {
        Ok((interface, rssi)) => {
            tracing::debug!(%interface, rssi, "sampled wireless signal");
            rssi
        }
        Err(err) => {
            tracing::debug!("wireless read failed: {err}");
            return None;
        }
    };
    let rtt = match &config.feed.probe {
        Some(addr) => match probe_rtt(addr) {
            Ok(rtt) => rtt,
            Err(err) => {
                tracing::debug!("rtt probe failed: {err}");
                return None;
            }
        },
        None => 0,
    };
    Some(LinkSample { rssi, rtt })
}

/// Signal level in dBm for the requested (or first) wireless interface.
fn read_wireless_rssi(interface: Option<&str>) -> Result<(String, i32)> {
    let content =
        fs::read_to_string("/proc/net/wireless").context("reading /proc/net/wireless")?;
    parse_wireless(&content, interface)
}

fn parse_wireless(content: &str, interface: Option<&str>) -> Result<(String, i32)> {
    // Two header lines, then one row per interface:
    //   wlan0: 0000   54.  -56.  -256  ...
    for line in content.lines().skip(2) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }
        let name = parts[0].trim_end_matches(':');
        if let Some(want) = interface {
            if name != want {
                continue;
            }
        }
        let signal: f64 = parts[3]
            .trim_end_matches('.')
            .parse()
            .with_context(|| format!("parsing signal level {:?}", parts[3]))?;
        return Ok((name.to_string(), signal as i32));
    }
    anyhow::bail!("no matching interface in /proc/net/wireless")
}

/// Round-trip estimate from a TCP connect to the probe address.
fn probe_rtt(addr: &str) -> Result<i32> {
    let resolved = addr
        .to_socket_addrs()
        .with_context(|| format!("resolving probe address {addr}"))?
        .next()
        .context("probe address resolved to nothing")?;
    let start = Instant::now();
    TcpStream::connect_timeout(&resolved, Duration::from_secs(2))
        .with_context(|| format!("probing {addr}"))?;
    Ok(start.elapsed().as_millis() as i32)
}

/// Random-walk link model for demos and development without a radio.
struct Simulator {
    rssi: f64,
    down_for: u32,
}

impl Simulator {
    fn new() -> Self {
        Self {
            rssi: -50.0,
            down_for: 0,
        }
    }

    fn next_sample(&mut self) -> Option<LinkSample> {
        let mut rng = rand::thread_rng();
        if self.down_for > 0 {
            self.down_for -= 1;
            return None;
        }
        if rng.gen_bool(0.01) {
            self.down_for = rng.gen_range(3..8);
            return None;
        }
        self.rssi = (self.rssi + rng.gen_range(-3.0..3.0)).clamp(-95.0, -35.0);
        // Weaker signal drags the round trip up with it.
        let base = 10.0 + (self.rssi.abs() - 35.0) * 1.2;
        let rtt = (base + rng.gen_range(-5.0..15.0)).max(1.0);
        Some(LinkSample {
            rssi: self.rssi as i32,
            rtt: rtt as i32,
        })
    }
}

fn spawn_listener(
    listener: TcpListener,
    clients: ClientRegistry,
    log: Arc<Mutex<DataLog>>,
    running: Arc<AtomicBool>,
) {
    thread::spawn(move || {
        for stream in listener.incoming() {
            if !running.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => {
                    let peer = stream
                        .peer_addr()
                        .map(|a| a.to_string())
                        .unwrap_or_else(|_| "unknown".into());
                    info!("viewer connected from {peer}");
                    let (tx, rx) = mpsc::channel();
                    {
                        let mut clients = clients.lock().unwrap_or_else(|e| e.into_inner());
                        clients.push(tx);
                    }
                    let log = log.clone();
                    let running = running.clone();
                    thread::spawn(move || {
                        if let Err(err) = serve_client(stream, rx, &log, &running) {
                            info!("viewer {peer} dropped: {err}");
                        }
                    });
                }
                Err(err) => warn!("accept failed: {err}"),
            }
        }
    });
}

/// One thread per viewer: greet with status + snapshot, then relay
/// broadcast lines and answer STATS control requests until the socket
/// goes away.
fn serve_client(
    stream: TcpStream,
    rx: Receiver<String>,
    log: &Mutex<DataLog>,
    running: &AtomicBool,
) -> Result<()> {
    stream.set_read_timeout(Some(Duration::from_millis(200)))?;
    let mut writer = stream.try_clone().context("cloning client stream")?;
    let mut reader = BufReader::new(stream);

    {
        let log = lock_log(log);
        writeln!(writer, "{}", protocol::encode_status(log.connection()))?;
        writeln!(writer, "{}", protocol::encode_snapshot(&log.snapshot())?)?;
    }

    let mut line = String::new();
    while running.load(Ordering::SeqCst) {
        while let Ok(message) = rx.try_recv() {
            writeln!(writer, "{message}")?;
        }

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if protocol::parse_control(&line) == Some(protocol::ControlMessage::RequestStats) {
                    let payload = lock_log(log).stats_payload();
                    writeln!(writer, "{}", protocol::encode_stats(&payload)?)?;
                }
            }
            Err(err)
                if err.kind() == io::ErrorKind::WouldBlock
                    || err.kind() == io::ErrorKind::TimedOut => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Push lines to every viewer, dropping the ones that hung up.
fn broadcast(clients: &ClientRegistry, lines: &[String]) {
    let mut clients = clients.lock().unwrap_or_else(|e| e.into_inner());
    clients.retain(|tx| lines.iter().all(|line| tx.send(line.clone()).is_ok()));
}

fn lock_log(log: &Mutex<DataLog>) -> MutexGuard<'_, DataLog> {
    log.lock().unwrap_or_else(|e| e.into_inner())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(listen) = &args.listen {
        config.feed.listen = listen.clone();
    }
    if let Some(interface) = &args.interface {
        config.feed.interface = Some(interface.clone());
    }
    if let Some(probe) = &args.probe {
        config.feed.probe = Some(probe.clone());
    }
    if let Some(interval) = args.interval {
        config.feed.interval = *interval;
    }
    if args.simulate {
        config.feed.simulate = true;
    }
}

fn setup_signals(running: Arc<AtomicBool>, reload: Arc<AtomicBool>) {
    let r1 = running.clone();
    ctrlc::set_handler(move || {
        r1.store(false, Ordering::SeqCst);
    })
    .expect("failed to set ctrlc handler");

    let r2 = running.clone();
    let reload_flag = reload.clone();
    let _ = signal_hook::flag::register(signal_hook::consts::SIGHUP, reload_flag);
    let _ = signal_hook::flag::register(signal_hook::consts::SIGTERM, r2.clone());
}

fn init_logging(config: &Config) -> Result<()> {
    let writer: BoxMakeWriter = if let Some(path) = &config.logging.file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file at {:?}", path))?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        static LOG_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();
        let _ = LOG_GUARD.set(guard);
        BoxMakeWriter::new(writer)
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.clone())
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(writer)
        .finish()
        .try_init()
        .ok();
    Ok(())
}

struct PidGuard {
    path: Option<PathBuf>,
}

impl PidGuard {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = &path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            if let Ok(pid_str) = std::fs::read_to_string(path) {
                if let Ok(pid) = pid_str.trim().parse::<u32>() {
                    if std::path::Path::new(&format!("/proc/{pid}")).exists() {
                        anyhow::bail!("another linkmon-feed seems to be running with pid {pid}");
                    }
                }
            }
            std::fs::write(path, format!("{}\n", std::process::id()))?;
        }
        Ok(Self { path })
    }
}

impl Drop for PidGuard {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIRELESS: &str = "\
Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
 face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
 wlan0: 0000   54.  -56.  -256        0      0      0      0      0        0
 wlp2s0: 0000   70.  -40.  -256       0      0      0      0      0        0
";

    #[test]
    fn parses_first_wireless_interface() {
        let (name, rssi) = parse_wireless(WIRELESS, None).unwrap();
        assert_eq!(name, "wlan0");
        assert_eq!(rssi, -56);
    }

    #[test]
    fn parses_requested_interface() {
        let (name, rssi) = parse_wireless(WIRELESS, Some("wlp2s0")).unwrap();
        assert_eq!(name, "wlp2s0");
        assert_eq!(rssi, -40);
    }

    #[test]
    fn missing_interface_is_an_error() {
        assert!(parse_wireless(WIRELESS, Some("eth0")).is_err());
        assert!(parse_wireless("", None).is_err());
    }

    #[test]
    fn simulator_stays_in_band() {
        let mut sim = Simulator::new();
        let mut seen = 0;
        for _ in 0..200 {
            if let Some(sample) = sim.next_sample() {
                assert!((-95..=-35).contains(&sample.rssi));
                assert!(sample.rtt >= 1);
                seen += 1;
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn collect_cycle_broadcasts_data_lines() {
        let log = Mutex::new(DataLog::default());
        let clients: ClientRegistry = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel();
        clients
            .lock()
            .unwrap()
            .push(tx);

        let mut counter = 0;
        collect_cycle(
            &log,
            &clients,
            Some(LinkSample { rssi: -58, rtt: 36 }),
            &mut counter,
            false,
        );

        // First cycle brings the link up, then streams the sample.
        assert_eq!(rx.try_recv().unwrap(), "STATUS:CONNECTED");
        assert_eq!(rx.try_recv().unwrap(), "DATA:-58,36,1");
    }

    #[test]
    fn losing_the_link_is_edge_triggered() {
        let log = Mutex::new(DataLog::default());
        let clients: ClientRegistry = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel();
        clients.lock().unwrap().push(tx);

        let mut counter = 0;
        collect_cycle(&log, &clients, Some(LinkSample { rssi: -50, rtt: 20 }), &mut counter, false);
        while rx.try_recv().is_ok() {}

        collect_cycle(&log, &clients, None, &mut counter, false);
        assert_eq!(rx.try_recv().unwrap(), "STATUS:DISCONNECTED");
        assert!(rx.try_recv().unwrap().starts_with("WARN:"));

        // A second dry cycle stays quiet.
        collect_cycle(&log, &clients, None, &mut counter, false);
        assert!(rx.try_recv().is_err());
    }
}
