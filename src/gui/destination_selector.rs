use crate::gui::error::GuideGuiError;

use crossterm::event::{self, KeyCode, KeyEventKind};
use ratatui::{
    prelude::*,
    widgets::{
        block::{Position, Title},
        *,
    },
    Terminal,
};
use std::time::Duration;

/// Shows `labels` as a list and lets the user pick one. Returns the index of
/// the chosen entry, or `None` if they quit.
///
/// `notice` is shown above the list, e.g. to say the location is a guess.
pub fn destination_selector<B: Backend>(
    terminal: &mut Terminal<B>,
    labels: &[String],
    notice: Option<&str>,
) -> Result<Option<usize>, GuideGuiError> {
    let n_rooms = labels.len();
    let mut cursor = 0;
    let mut list_state = ListState::default().with_selected(Some(cursor));

    loop {
        let title = Title::from(" Where to? ".magenta().bold());
        let instructions = Title::from(Line::from(vec![
            " Navigate ".into(),
            "<Up>/<Down>".magenta().bold(),
            " Select ".into(),
            "<Enter>".magenta().bold(),
            " Quit ".into(),
            "<Q> ".magenta().bold(),
        ]));
        let block = Block::default()
            .title(title.alignment(Alignment::Center))
            .title(
                instructions
                    .alignment(Alignment::Center)
                    .position(Position::Bottom),
            )
            .borders(Borders::ALL);
        let list = List::new(labels.iter().map(String::as_str))
            .style(Style::default().fg(Color::White))
            .highlight_symbol(">>")
            .highlight_style(Style::default().fg(Color::Magenta))
            .block(block);
        list_state.select(if n_rooms == 0 { None } else { Some(cursor) });

        terminal.draw(|frame| {
            let area = frame.size();
            match notice {
                Some(text) => {
                    let rows = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([Constraint::Length(1), Constraint::Min(3)])
                        .split(area);
                    frame.render_widget(Paragraph::new(text.yellow()), rows[0]);
                    frame.render_stateful_widget(list, rows[1], &mut list_state);
                }
                None => frame.render_stateful_widget(list, area, &mut list_state),
            }
        })?;

        if event::poll(Duration::from_millis(16))? {
            if let event::Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Down => cursor = move_cursor(cursor, n_rooms, true),
                        KeyCode::Up => cursor = move_cursor(cursor, n_rooms, false),
                        KeyCode::Enter if n_rooms > 0 => return Ok(Some(cursor)),
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(None),
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Moves the cursor one row, wrapping at both ends.
fn move_cursor(cursor: usize, len: usize, down: bool) -> usize {
    if len == 0 {
        0
    } else if down {
        (cursor + 1) % len
    } else {
        (cursor + len - 1) % len
    }
}
