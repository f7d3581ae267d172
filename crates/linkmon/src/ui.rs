use linkmon_core::gauge::{self, ArcGauge};
use linkmon_core::{format_session_duration, Dashboard, Rgb, StatsChannel, TimeSeriesBuffer};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Axis, Block, Borders, Cell, Chart, Dataset, Gauge, GraphType, List, ListItem, Paragraph, Row, Table};
use ratatui::Frame;

pub struct ViewState<'a> {
    pub dashboard: &'a Dashboard,
    pub stats_channel: StatsChannel,
    pub show_warnings: bool,
    pub feed_connected: bool,
    pub status: &'a str,
}

pub fn draw(frame: &mut Frame<'_>, view: &ViewState<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(12),
            Constraint::Min(8),
            Constraint::Length(7),
            Constraint::Length(3),
        ])
        .split(frame.size());

    draw_header(frame, chunks[0], view);
    draw_gauges(frame, chunks[1], view.dashboard);
    draw_charts(frame, chunks[2], view.dashboard);
    draw_bottom(frame, chunks[3], view);
    draw_footer(frame, chunks[4], view);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, view: &ViewState<'_>) {
    let dashboard = view.dashboard;
    let link = if dashboard.connection().is_connected() {
        Span::styled("● link up", Style::default().fg(Color::Green))
    } else {
        Span::styled("● link down", Style::default().fg(Color::Red))
    };
    let feed = if view.feed_connected {
        Span::styled("feed ok", Style::default().fg(Color::Green))
    } else {
        Span::styled("feed lost", Style::default().fg(Color::Red))
    };
    let header = Line::from(vec![
        link,
        Span::raw("  "),
        feed,
        Span::raw(format!(
            "  up {}  samples {}  disconnects {}  warnings {}",
            format_session_duration(dashboard.session_duration()),
            dashboard.measurement_count(),
            dashboard.disconnect_count(),
            dashboard.warning_counts().total(),
        )),
    ]);
    let widget =
        Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("linkmon"));
    frame.render_widget(widget, area);
}

fn draw_gauges(frame: &mut Frame<'_>, area: Rect, dashboard: &Dashboard) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
        ])
        .split(area);

    let rssi_text = match dashboard.current().rssi {
        Some(v) => format!("{v:.0} dBm"),
        None => "-- dBm".into(),
    };
    draw_arc_gauge(frame, panes[0], dashboard.signal_gauge(), rssi_text);

    let rtt_text = match dashboard.current().rtt {
        Some(v) => format!("{v:.0} ms"),
        None => "-- ms".into(),
    };
    draw_arc_gauge(frame, panes[1], dashboard.latency_gauge(), rtt_text);

    draw_signal_bars(frame, panes[2], dashboard);
    draw_quality_meter(frame, panes[3], dashboard);
}

/// Paint the arc on a braille canvas using the same geometry the SVG
/// surface renders from. Canvas y points up, gauge y points down.
fn draw_arc_gauge(frame: &mut Frame<'_>, area: Rect, arc_gauge: &ArcGauge, readout: String) {
    let spec = arc_gauge.spec();
    let gauge_frame = arc_gauge.frame();

    let background = arc_points(spec.start_angle, spec.end_angle);
    let value = arc_points(spec.start_angle, gauge_frame.target_angle);
    let color = to_color(gauge_frame.color);
    let title = format!("{} ({})", spec.label, spec.unit);

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(symbols::Marker::Braille)
        .x_bounds([0.0, gauge::VIEW_WIDTH])
        .y_bounds([0.0, gauge::VIEW_HEIGHT])
        .paint(move |ctx| {
            ctx.draw(&Points {
                coords: &background,
                color: Color::DarkGray,
            });
            ctx.draw(&Points {
                coords: &value,
                color,
            });
            ctx.print(
                gauge::CENTER_X - 18.0,
                gauge::VIEW_HEIGHT - gauge::CENTER_Y,
                Line::styled(readout.clone(), Style::default().fg(color)),
            );
        });
    frame.render_widget(canvas, area);
}

fn arc_points(start_angle: f64, end_angle: f64) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    let mut angle = start_angle;
    while angle <= end_angle {
        let p = gauge::polar_to_cartesian(gauge::CENTER_X, gauge::CENTER_Y, gauge::RADIUS, angle);
        points.push((p.x, gauge::VIEW_HEIGHT - p.y));
        angle += 1.5;
    }
    points
}

fn draw_signal_bars(frame: &mut Frame<'_>, area: Rect, dashboard: &Dashboard) {
    let level = dashboard.signal_bars().level();
    let active = match level {
        4 | 5 => Color::Green,
        3 => Color::Yellow,
        2 => to_color(Rgb::new(0xf0, 0x88, 0x3e)),
        _ => Color::Red,
    };
    let glyphs = ["▁", "▃", "▅", "▇", "█"];
    let mut spans = Vec::new();
    for (i, glyph) in glyphs.iter().enumerate() {
        let style = if (i as u8) < level {
            Style::default().fg(active)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(*glyph, style));
        spans.push(Span::raw(" "));
    }
    let text = vec![
        Line::default(),
        Line::from(spans),
        Line::default(),
        Line::from(format!("level {level}/5")),
    ];
    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Signal"));
    frame.render_widget(widget, area);
}

fn draw_quality_meter(frame: &mut Frame<'_>, area: Rect, dashboard: &Dashboard) {
    let (label, color, fill) = match dashboard.quality() {
        Some(level) => (
            format!("{} ({}/4)", level.label(), level.score()),
            to_color(level.color()),
            f64::from(level.score()) / 4.0,
        ),
        None => ("-".to_string(), Color::DarkGray, 0.0),
    };
    let widget = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Quality"))
        .gauge_style(Style::default().fg(color))
        .ratio(fill)
        .label(label);
    frame.render_widget(widget, area);
}

fn draw_charts(frame: &mut Frame<'_>, area: Rect, dashboard: &Dashboard) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    draw_chart(
        frame,
        panes[0],
        "RSSI (dBm)",
        dashboard.rssi_series(),
        [-100.0, 0.0],
        to_color(Rgb::new(0x58, 0xa6, 0xff)),
    );

    let rtt_max = dashboard
        .rtt_series()
        .iter()
        .map(|s| s.value)
        .fold(100.0, f64::max);
    draw_chart(
        frame,
        panes[1],
        "RTT (ms)",
        dashboard.rtt_series(),
        [0.0, rtt_max],
        to_color(Rgb::new(0x3f, 0xb9, 0x50)),
    );
}

fn draw_chart(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    series: &TimeSeriesBuffer,
    y_bounds: [f64; 2],
    color: Color,
) {
    let (labels, values) = series.to_series();
    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect();

    let x_labels = vec![
        Span::raw(labels.first().cloned().unwrap_or_default()),
        Span::raw(labels.last().cloned().unwrap_or_default()),
    ];
    let y_labels = vec![
        Span::raw(format!("{:.0}", y_bounds[0])),
        Span::raw(format!("{:.0}", (y_bounds[0] + y_bounds[1]) / 2.0)),
        Span::raw(format!("{:.0}", y_bounds[1])),
    ];

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points);

    let x_max = (series.capacity().saturating_sub(1)).max(1) as f64;
    let chart = Chart::new(vec![dataset])
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .x_axis(Axis::default().bounds([0.0, x_max]).labels(x_labels))
        .y_axis(Axis::default().bounds(y_bounds).labels(y_labels));
    frame.render_widget(chart, area);
}

fn draw_bottom(frame: &mut Frame<'_>, area: Rect, view: &ViewState<'_>) {
    let constraints = if view.show_warnings {
        vec![
            Constraint::Percentage(28),
            Constraint::Percentage(30),
            Constraint::Percentage(42),
        ]
    } else {
        vec![Constraint::Percentage(45), Constraint::Percentage(55)]
    };
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    draw_stats(frame, panes[0], view);
    draw_issues(frame, panes[1], view.dashboard);
    if view.show_warnings {
        draw_warnings(frame, panes[2], view.dashboard);
    }
}

fn draw_stats(frame: &mut Frame<'_>, area: Rect, view: &ViewState<'_>) {
    let channel = view.stats_channel;
    let stats = view.dashboard.stats().channel(channel);
    let unit = channel.unit();

    let rows = vec![
        Row::new(vec![Cell::from("min"), Cell::from(format!("{:.1} {unit}", stats.min))]),
        Row::new(vec![Cell::from("max"), Cell::from(format!("{:.1} {unit}", stats.max))]),
        Row::new(vec![Cell::from("avg"), Cell::from(format!("{:.1} {unit}", stats.avg))]),
        Row::new(vec![
            Cell::from("median"),
            Cell::from(format!("{:.1} {unit}", stats.median)),
        ]),
        Row::new(vec![Cell::from("std"), Cell::from(format!("{:.2}", stats.std))]),
    ];
    let table = Table::new(rows, [Constraint::Length(8), Constraint::Min(10)]).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Stats [{}] 1/2/3", channel.label())),
    );
    frame.render_widget(table, area);
}

fn draw_issues(frame: &mut Frame<'_>, area: Rect, dashboard: &Dashboard) {
    let issues = dashboard.issues();
    let predictor = dashboard.predictor();
    let counts = dashboard.warning_counts();
    let distribution = linkmon_core::QualityLevel::ALL
        .iter()
        .map(|level| {
            format!(
                "{}:{}",
                level.label().chars().next().unwrap_or('?'),
                dashboard.quality_distribution().count(*level)
            )
        })
        .collect::<Vec<_>>()
        .join(" ");
    let text = vec![
        Line::from(format!(
            "lost packets {} ({:.1}%)",
            issues.packet_loss, issues.packet_loss_rate
        )),
        Line::from(format!(
            "disconnects {}  downtime {:.1}s (avg {:.1}s)",
            issues.disconnects, issues.total_downtime, issues.avg_disconnect
        )),
        Line::from(format!(
            "warnings i:{} c:{} w:{} k:{}",
            counts.info, counts.caution, counts.warning, counts.critical
        )),
        Line::from(format!("quality {distribution}")),
        Line::from(format!(
            "predictor {} ({} checks, {} raised)",
            predictor.mode, predictor.total_predictions, predictor.warnings_given
        )),
    ];
    let widget =
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Issues"));
    frame.render_widget(widget, area);
}

fn draw_warnings(frame: &mut Frame<'_>, area: Rect, dashboard: &Dashboard) {
    let items: Vec<ListItem> = dashboard
        .warnings()
        .map(|warning| {
            let clock = warning.timestamp.get(11..19).unwrap_or("");
            let line = format!("{clock} {}", warning.messages.joined());
            ListItem::new(line).style(Style::default().fg(level_color(warning.level)))
        })
        .collect();

    let mut block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Warnings ({})", dashboard.warning_counts().total()));
    if let Some(level) = dashboard.active_indicator() {
        block = block.title_style(
            Style::default()
                .fg(level_color(level))
                .add_modifier(Modifier::BOLD | Modifier::RAPID_BLINK),
        );
    }
    let list = if items.is_empty() {
        List::new(vec![ListItem::new("no warnings yet")
            .style(Style::default().fg(Color::DarkGray))])
    } else {
        List::new(items)
    };
    frame.render_widget(list.block(block), area);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, view: &ViewState<'_>) {
    let widget = Paragraph::new(view.status.to_string())
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(Style::default().fg(Color::White));
    frame.render_widget(widget, area);
}

fn level_color(level: u8) -> Color {
    match level {
        4 => Color::Red,
        3 => to_color(Rgb::new(0xf0, 0x88, 0x3e)),
        2 => Color::Yellow,
        _ => Color::Gray,
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
