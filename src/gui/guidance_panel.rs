use crate::geo::Coordinate;
use crate::gui::error::GuideGuiError;
use crate::guidance::{Guide, GuidanceError, GuidanceState, GuideController, Preview, Session};
use crate::narration::Narrator;

use crossterm::event::{self, KeyCode, KeyEventKind};
use log::debug;
use ratatui::{
    prelude::*,
    symbols,
    widgets::{
        block::{Position, Title},
        *,
    },
    Terminal,
};
use std::time::{Duration, Instant};

/// Hands the panel whatever is being spoken right now, if anything.
pub type CaptionSource = Box<dyn FnMut() -> Option<String>>;

// Degrees of padding around the line so both ends stay off the chart border
const MAP_MARGIN_DEG: f64 = 0.0002;

/// How the user left the guidance panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelExit {
    /// Stopped navigating, wants to pick somewhere else.
    Back,
    /// Wants out of the program.
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelAction {
    Start,
    Next,
    Previous,
    ToggleNarration,
    Stop,
    Quit,
}

fn action_for(code: KeyCode) -> Option<PanelAction> {
    match code {
        KeyCode::Enter | KeyCode::Char('s') => Some(PanelAction::Start),
        KeyCode::Right | KeyCode::Char('n') => Some(PanelAction::Next),
        KeyCode::Left | KeyCode::Char('p') => Some(PanelAction::Previous),
        KeyCode::Char('m') => Some(PanelAction::ToggleNarration),
        KeyCode::Char('x') | KeyCode::Esc => Some(PanelAction::Stop),
        KeyCode::Char('q') => Some(PanelAction::Quit),
        _ => None,
    }
}

/// Carries out one key press against the controller. `Ok(Some(_))` means
/// the panel should close.
fn perform<N: Narrator>(
    controller: &mut GuideController<N>,
    action: PanelAction,
) -> Result<Option<PanelExit>, GuidanceError> {
    match action {
        PanelAction::Start => controller.start()?,
        PanelAction::Next => controller.next()?,
        PanelAction::Previous => controller.previous()?,
        PanelAction::ToggleNarration => {
            let on = controller.toggle_narration();
            debug!("Narration {}", if on { "on" } else { "off" });
        }
        PanelAction::Stop => {
            controller.stop();
            return Ok(Some(PanelExit::Back));
        }
        PanelAction::Quit => {
            controller.close();
            return Ok(Some(PanelExit::Quit));
        }
    }
    Ok(None)
}

/// Runs the preview and step-by-step view for whatever the controller has
/// selected, until the user stops or quits.
///
/// `located_by_fallback` puts a warning on screen that the walk starts from
/// the configured fallback rather than a real fix.
pub fn guidance_panel<B: Backend, N: Narrator>(
    terminal: &mut Terminal<B>,
    controller: &mut GuideController<N>,
    caption: &mut CaptionSource,
    located_by_fallback: bool,
) -> Result<PanelExit, GuideGuiError> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut spoken = None;
    let mut status: Option<String> = located_by_fallback
        .then(|| "Could not get your location, starting from the campus default".to_owned());

    loop {
        if matches!(controller.guide().state(), GuidanceState::Idle) {
            return Ok(PanelExit::Back);
        }

        terminal.draw(|frame| ui(frame, controller.guide(), spoken.as_deref(), status.as_deref()))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let event::Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = action_for(key.code) {
                        match perform(controller, action) {
                            Ok(Some(exit)) => return Ok(exit),
                            Ok(None) => status = None,
                            Err(e) => status = Some(e.to_string()),
                        }
                    }
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            spoken = caption();
            last_tick = Instant::now();
        }
    }
}

fn ui(frame: &mut Frame, guide: &Guide, spoken: Option<&str>, status: Option<&str>) {
    let Some(preview) = guide.preview() else {
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(frame.size());

    frame.render_widget(header(preview, guide.narration_enabled()), rows[0]);
    frame.render_widget(progress_gauge(guide.session()), rows[1]);
    frame.render_widget(instruction(preview, guide.session()), rows[2]);
    render_map(frame, rows[3], preview, guide.session());

    let footer = match (status, spoken) {
        (Some(text), _) => Line::from(text.yellow()),
        (None, Some(text)) => Line::from(vec!["🔊 ".into(), text.italic()]),
        (None, None) => Line::from(""),
    };
    frame.render_widget(Paragraph::new(footer), rows[4]);
}

fn header(preview: &Preview, narration_enabled: bool) -> Paragraph<'static> {
    let room = &preview.destination;
    let title = Title::from(Span::from(format!(" {} ", room.name)).magenta().bold());
    let sound = if narration_enabled { " 🔊 on " } else { " 🔇 off " };
    let mut details = vec![format!(
        "{} • {} • floor {}",
        room.category, room.building, room.floor
    )];
    if let Some(capacity) = room.capacity {
        details.push(format!("capacity {}", capacity));
    }
    if let Some(contact) = &room.contact {
        details.push(contact.clone());
    }

    let mut lines = vec![Line::from(details.join(" • "))];
    if let Some(description) = &room.description {
        lines.push(Line::from(Span::from(description.clone()).dim()));
    }

    Paragraph::new(lines).block(
        Block::default()
            .title(title.alignment(Alignment::Center))
            .title(
                Title::from(sound)
                    .alignment(Alignment::Right)
                    .position(Position::Top),
            )
            .borders(Borders::ALL),
    )
}

fn progress_gauge(session: Option<&Session>) -> Gauge<'static> {
    let (percent, label) = match session {
        Some(session) => {
            let frame = session.frame();
            (
                session.percent_complete(),
                format!("Step {} of {}", frame.step_number, frame.step_count),
            )
        }
        None => (0, "Not started".to_owned()),
    };
    Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Magenta))
        .percent(percent.min(100))
        .label(label)
}

fn instruction(preview: &Preview, session: Option<&Session>) -> Paragraph<'static> {
    let summary = format!(
        "{:.2} km • about {} min • heading {} ({:.0}°)",
        preview.total_distance_km, preview.eta_minutes, preview.cardinal, preview.bearing
    );
    let keys = match session {
        Some(_) => Line::from(vec![
            " Next ".into(),
            "<Right>".magenta().bold(),
            " Back ".into(),
            "<Left>".magenta().bold(),
            " Mute ".into(),
            "<M>".magenta().bold(),
            " Stop ".into(),
            "<X>".magenta().bold(),
            " Quit ".into(),
            "<Q> ".magenta().bold(),
        ]),
        None => Line::from(vec![
            " Start ".into(),
            "<Enter>".magenta().bold(),
            " Mute ".into(),
            "<M>".magenta().bold(),
            " Back ".into(),
            "<X>".magenta().bold(),
            " Quit ".into(),
            "<Q> ".magenta().bold(),
        ]),
    };

    let lines = match session {
        Some(session) => {
            let step = session.frame().step;
            vec![
                Line::from(Span::from(format!("{} {}", step.icon, step.title)).bold()),
                Line::from(step.description.clone()),
                Line::from(
                    Span::from(format!("{:.2} km this step", step.partial_distance_km)).dim(),
                ),
            ]
        }
        None => vec![
            Line::from("Ready when you are".bold()),
            Line::from(summary.clone()),
        ],
    };

    let title = match session {
        Some(_) => Title::from(summary),
        None => Title::from(" Preview "),
    };
    Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(title.alignment(Alignment::Left))
            .title(
                Title::from(keys)
                    .alignment(Alignment::Center)
                    .position(Position::Bottom),
            )
            .borders(Borders::ALL),
    )
}

/// Where the "you are here" dot sits, assuming the user has walked
/// `fraction` of the straight line.
fn along_the_line(origin: &Coordinate, destination: &Coordinate, fraction: f64) -> (f64, f64) {
    (
        origin.longitude + (destination.longitude - origin.longitude) * fraction,
        origin.latitude + (destination.latitude - origin.latitude) * fraction,
    )
}

fn padded_bounds(a: f64, b: f64) -> [f64; 2] {
    [a.min(b) - MAP_MARGIN_DEG, a.max(b) + MAP_MARGIN_DEG]
}

fn axis_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| Span::from(format!("{:.4}", v)))
        .collect()
}

fn render_map(frame: &mut Frame, area: Rect, preview: &Preview, session: Option<&Session>) {
    let origin = preview.origin;
    let destination = preview.destination.coordinate;
    let walked = session.map(Session::walked_fraction).unwrap_or(0.0);

    let line = [
        (origin.longitude, origin.latitude),
        (destination.longitude, destination.latitude),
    ];
    let target = [line[1]];
    let you = [along_the_line(&origin, &destination, walked)];

    let x_bounds = padded_bounds(origin.longitude, destination.longitude);
    let y_bounds = padded_bounds(origin.latitude, destination.latitude);

    let chart = Chart::new(vec![
        Dataset::default()
            .name("Route")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&line),
        Dataset::default()
            .name(preview.destination.id.clone())
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Magenta))
            .data(&target),
        Dataset::default()
            .name("You")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Cyan))
            .data(&you),
    ])
    .block(Block::default().title(" Map ").borders(Borders::ALL))
    .x_axis(
        Axis::default()
            .title("Lng".dim())
            .bounds(x_bounds)
            .labels(axis_labels(x_bounds)),
    )
    .y_axis(
        Axis::default()
            .title("Lat".dim())
            .bounds(y_bounds)
            .labels(axis_labels(y_bounds)),
    );

    frame.render_widget(chart, area);
}
