mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use linkmon_core::protocol::{self, ControlMessage, FeedMessage};
use linkmon_core::timeutils::format_rfc3339;
use linkmon_core::{
    Config, ConnectionStatus, Dashboard, LinkEvent, Measurement, StatsChannel, StatusChange,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(author, version, about = "linkmon viewer")]
struct Args {
    /// Path to config TOML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Feed address, host:port
    #[arg(long)]
    feed: Option<String>,
    /// Chart points per channel
    #[arg(long)]
    capacity: Option<usize>,
    /// Print the first snapshot as JSON and exit
    #[arg(long)]
    json: bool,
    /// Print the visible sample window as CSV and exit
    #[arg(long)]
    csv: bool,
}

/// What the transport thread reports back to the UI loop.
enum TransportEvent {
    Event(LinkEvent),
    FeedConnected(String),
    FeedDisconnected,
}

struct App {
    config: Config,
    dashboard: Dashboard,
    stats_channel: StatsChannel,
    show_warnings: bool,
    feed_connected: bool,
    status: String,
    events: Receiver<TransportEvent>,
    control: Sender<ControlMessage>,
}

impl App {
    fn new(config: Config, events: Receiver<TransportEvent>, control: Sender<ControlMessage>) -> Self {
        let dashboard = Dashboard::new(config.viewer.chart_capacity);
        Self {
            config,
            dashboard,
            stats_channel: StatsChannel::Rssi,
            show_warnings: true,
            feed_connected: false,
            status: String::from("q quit | 1/2/3 stats channel | w warnings | e export csv"),
            events,
            control,
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.handle_transport(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::FeedConnected(addr) => {
                self.feed_connected = true;
                self.status = format!("feed connected at {addr}");
            }
            TransportEvent::FeedDisconnected => {
                self.feed_connected = false;
                self.status = "feed unavailable, retrying".into();
                // The live indicators reset just like a reported link drop.
                self.dashboard.apply(LinkEvent::Status(StatusChange {
                    status: ConnectionStatus::Disconnected,
                    timestamp: format_rfc3339(linkmon_core::now_utc()),
                    disconnect_count: None,
                    duration: None,
                    warning: None,
                }));
            }
            TransportEvent::Event(event) => {
                if self.config.viewer.bell {
                    if let Some(level) = warning_level(&event) {
                        if level >= 2 {
                            ring_bell();
                        }
                    }
                }
                self.dashboard.apply(event);
            }
        }
    }

    fn select_channel(&mut self, channel: StatsChannel) {
        if self.stats_channel != channel {
            self.stats_channel = channel;
            // Ask the feed for a fresh aggregate payload for the new view.
            let _ = self.control.send(ControlMessage::RequestStats);
        }
    }

    fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["channel", "timestamp", "value"])?;
        let channels = [
            ("rssi", self.dashboard.rssi_series()),
            ("rtt", self.dashboard.rtt_series()),
        ];
        for (name, series) in channels {
            for sample in series.iter() {
                csv_writer.write_record([
                    name,
                    &format_rfc3339(sample.timestamp),
                    &format!("{:.1}", sample.value),
                ])?;
            }
        }
        csv_writer.flush()?;
        Ok(())
    }
}

fn warning_level(event: &LinkEvent) -> Option<u8> {
    match event {
        LinkEvent::Warning(w) => Some(w.level),
        LinkEvent::Sample(m) => m.warning.as_ref().map(|w| w.level),
        LinkEvent::Status(s) => s.warning.as_ref().map(|w| w.level),
        _ => None,
    }
}

/// Audible alert, degrading to nothing where the terminal has no bell.
fn ring_bell() {
    let mut stdout = io::stdout();
    let _ = stdout.write_all(b"\x07");
    let _ = stdout.flush();
}

fn feed_message_to_event(message: FeedMessage) -> LinkEvent {
    match message {
        FeedMessage::Data { rssi, rtt, count } => LinkEvent::Sample(Measurement::from_data(
            rssi,
            rtt,
            count,
            linkmon_core::now_utc(),
        )),
        FeedMessage::Status(status) => LinkEvent::Status(StatusChange {
            status,
            timestamp: format_rfc3339(linkmon_core::now_utc()),
            disconnect_count: None,
            duration: None,
            warning: None,
        }),
        FeedMessage::Snapshot(snapshot) => LinkEvent::Snapshot(snapshot),
        FeedMessage::Stats(payload) => LinkEvent::Stats(payload),
        FeedMessage::Warning(warning) => LinkEvent::Warning(warning),
    }
}

/// Reader thread: connect, stream lines, reconnect forever with a fixed
/// one second backoff. Exits once the UI side hangs up.
fn run_transport(addr: String, events: Sender<TransportEvent>, control: Receiver<ControlMessage>) {
    let backoff = Duration::from_secs(1);
    loop {
        match connect_feed(&addr) {
            Ok(stream) => {
                if events
                    .send(TransportEvent::FeedConnected(addr.clone()))
                    .is_err()
                {
                    return;
                }
                if let Err(err) = read_stream(stream, &events, &control) {
                    debug!("feed stream ended: {err}");
                }
                if events.send(TransportEvent::FeedDisconnected).is_err() {
                    return;
                }
            }
            Err(err) => {
                debug!("feed connect failed: {err}");
                if events.send(TransportEvent::FeedDisconnected).is_err() {
                    return;
                }
            }
        }
        thread::sleep(backoff);
    }
}

fn connect_feed(addr: &str) -> io::Result<TcpStream> {
    use std::net::ToSocketAddrs;
    let resolved = addr
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address resolved"))?;
    TcpStream::connect_timeout(&resolved, Duration::from_secs(2))
}

fn read_stream(
    stream: TcpStream,
    events: &Sender<TransportEvent>,
    control: &Receiver<ControlMessage>,
) -> Result<()> {
    stream.set_read_timeout(Some(Duration::from_millis(200)))?;
    let mut writer = stream.try_clone().context("cloning feed stream")?;
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    loop {
        // Forward any pending control messages before blocking on reads.
        while let Ok(message) = control.try_recv() {
            writeln!(writer, "{}", protocol::encode_control(message))?;
        }

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return Ok(()),
            Ok(_) => match protocol::parse_line(&line) {
                Ok(Some(message)) => {
                    if events
                        .send(TransportEvent::Event(feed_message_to_event(message)))
                        .is_err()
                    {
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(err) => debug!("skipping malformed feed line: {err}"),
            },
            Err(err)
                if err.kind() == io::ErrorKind::WouldBlock
                    || err.kind() == io::ErrorKind::TimedOut => {}
            Err(err) => return Err(err.into()),
        }
    }
}

fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let frame_rate = app.config.viewer.tick;
    let tick_rate = Duration::from_secs(1);
    let mut last_draw = Instant::now();
    let mut force_draw = true;

    loop {
        app.drain_events();

        // Coalesce: one draw covers however many events were drained, and
        // the 1 Hz tick keeps the session clock moving when the stream is
        // quiet.
        if force_draw || app.dashboard.take_dirty() || last_draw.elapsed() >= tick_rate {
            terminal.draw(|f| {
                ui::draw(
                    f,
                    &ui::ViewState {
                        dashboard: &app.dashboard,
                        stats_channel: app.stats_channel,
                        show_warnings: app.show_warnings,
                        feed_connected: app.feed_connected,
                        status: &app.status,
                    },
                )
            })?;
            last_draw = Instant::now();
            force_draw = false;
        }

        if event::poll(frame_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    force_draw = true;
                    match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Char('1') => app.select_channel(StatsChannel::Rssi),
                        KeyCode::Char('2') => app.select_channel(StatsChannel::Rtt),
                        KeyCode::Char('3') => app.select_channel(StatsChannel::Latency),
                        KeyCode::Char('w') => app.show_warnings = !app.show_warnings,
                        KeyCode::Char('e') => {
                            let path = "linkmon-export.csv";
                            match std::fs::File::create(path) {
                                Ok(file) => {
                                    if let Err(err) = app.export_csv(file) {
                                        app.status = format!("csv export failed: {err}");
                                    } else {
                                        app.status = format!("csv exported to {path}");
                                    }
                                }
                                Err(_) => app.status = "unable to write csv".into(),
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Wait for the first snapshot, then run `emit` on the populated app.
fn one_shot<F>(mut app: App, emit: F) -> Result<()>
where
    F: FnOnce(&App) -> Result<()>,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match app.events.recv_timeout(Duration::from_millis(200)) {
            Ok(event) => {
                let got_snapshot =
                    matches!(&event, TransportEvent::Event(LinkEvent::Snapshot(_)));
                app.handle_transport(event);
                if got_snapshot {
                    return emit(&app);
                }
            }
            Err(_) => {
                if Instant::now() >= deadline {
                    anyhow::bail!("no snapshot from the feed within 5s");
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(feed) = &args.feed {
        config.viewer.feed_addr = feed.clone();
    }
    if let Some(capacity) = args.capacity {
        config.viewer.chart_capacity = capacity;
    }

    let (event_tx, event_rx) = mpsc::channel();
    let (control_tx, control_rx) = mpsc::channel();
    let addr = config.viewer.feed_addr.clone();
    thread::spawn(move || run_transport(addr, event_tx, control_rx));

    let app = App::new(config, event_rx, control_tx);

    if args.json {
        return one_shot(app, |app| {
            let snapshot = serde_json::to_string_pretty(&snapshot_view(app))?;
            println!("{snapshot}");
            Ok(())
        });
    }
    if args.csv {
        return one_shot(app, |app| {
            let stdout = io::stdout();
            app.export_csv(stdout.lock())
        });
    }

    run_tui(app)
}

/// Reduced dashboard state for the one-shot JSON dump.
fn snapshot_view(app: &App) -> serde_json::Value {
    let dashboard = &app.dashboard;
    let (rssi_labels, rssi_values) = dashboard.rssi_series().to_series();
    let (rtt_labels, rtt_values) = dashboard.rtt_series().to_series();
    serde_json::json!({
        "connection_status": dashboard.connection(),
        "current": dashboard.current(),
        "stats": dashboard.stats(),
        "quality_distribution": dashboard.quality_distribution(),
        "issues": dashboard.issues(),
        "warning_counts": dashboard.warning_counts(),
        "predictor": dashboard.predictor(),
        "chart_data": {
            "rssi": { "labels": rssi_labels, "values": rssi_values },
            "rtt": { "labels": rtt_labels, "values": rtt_values },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkmon_core::Warning;

    fn app_for_tests() -> App {
        let (_event_tx, event_rx) = mpsc::channel();
        let (control_tx, _control_rx) = mpsc::channel();
        App::new(Config::default(), event_rx, control_tx)
    }

    #[test]
    fn data_messages_become_samples() {
        let event = feed_message_to_event(FeedMessage::Data {
            rssi: -58,
            rtt: 44,
            count: 9,
        });
        match event {
            LinkEvent::Sample(m) => {
                assert_eq!(m.rssi, Some(-58.0));
                assert_eq!(m.rtt, Some(44.0));
                assert_eq!(m.latency, Some(22.0));
                assert_eq!(m.count, Some(9));
            }
            other => panic!("expected sample, got {other:?}"),
        }
    }

    #[test]
    fn csv_export_writes_rows() {
        let mut app = app_for_tests();
        app.dashboard.apply(LinkEvent::Sample(Measurement::from_data(
            -61,
            36,
            1,
            linkmon_core::now_utc(),
        )));

        let mut buf = Vec::new();
        app.export_csv(&mut buf).unwrap();
        let content = String::from_utf8(buf).unwrap();
        assert!(content.contains("rssi"));
        assert!(content.contains("-61.0"));
        assert!(content.contains("36.0"));
    }

    #[test]
    fn warning_levels_are_found_in_any_event_shape() {
        let warning = Warning {
            timestamp: "2026-08-07T12:00:00Z".into(),
            level: 3,
            messages: linkmon_core::MessageSet::One("rtt high".into()),
            source: None,
        };
        assert_eq!(
            warning_level(&LinkEvent::Warning(warning.clone())),
            Some(3)
        );
        let mut sample = Measurement::from_data(-50, 20, 1, linkmon_core::now_utc());
        sample.warning = Some(warning);
        assert_eq!(warning_level(&LinkEvent::Sample(sample)), Some(3));
    }

    #[test]
    fn channel_switch_requests_stats_once() {
        let (_event_tx, event_rx) = mpsc::channel();
        let (control_tx, control_rx) = mpsc::channel();
        let mut app = App::new(Config::default(), event_rx, control_tx);

        app.select_channel(StatsChannel::Rtt);
        app.select_channel(StatsChannel::Rtt);
        assert_eq!(control_rx.try_recv(), Ok(ControlMessage::RequestStats));
        assert!(control_rx.try_recv().is_err());
    }
}
