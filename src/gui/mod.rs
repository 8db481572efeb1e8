//! Terminal front end for the navigator: pick a room, then follow the steps.

mod destination_selector;
mod error;
mod guidance_panel;

pub use destination_selector::destination_selector;
pub use error::GuideGuiError;
pub use guidance_panel::{guidance_panel, CaptionSource, PanelExit};

use crate::catalog::RoomCatalog;
use crate::geolocation::{locate_or_fallback, Geolocator};
use crate::guidance::{GuidanceError, GuideController};
use crate::narration::Narrator;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;

/// Takes over the terminal and runs the selector and guidance panel in turn
/// until the user quits. The terminal is put back the way it was even if
/// something goes wrong.
pub fn engage_navigator<N: Narrator, G: Geolocator>(
    catalog: &RoomCatalog,
    controller: &mut GuideController<N>,
    geolocator: &mut G,
    mut caption: CaptionSource,
) -> Result<(), GuideGuiError> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;

    let res = run_navigator(&mut terminal, catalog, controller, geolocator, &mut caption);

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_navigator<B: Backend, N: Narrator, G: Geolocator>(
    terminal: &mut Terminal<B>,
    catalog: &RoomCatalog,
    controller: &mut GuideController<N>,
    geolocator: &mut G,
    caption: &mut CaptionSource,
) -> Result<(), GuideGuiError> {
    loop {
        // Ask again every time, the user may have moved since the last walk
        let here = locate_or_fallback(geolocator, controller.guide().config());
        let nearest = catalog
            .nearby(&here.position, f64::INFINITY)
            .map_err(GuidanceError::from)?;
        let labels: Vec<String> = nearest
            .iter()
            .map(|(room, d)| format!("{}  {:.2} km", room, d))
            .collect();
        let notice = here
            .is_fallback
            .then_some("Location unavailable, distances are from the campus default");

        let Some(choice) = destination_selector(terminal, &labels, notice)? else {
            info!("Navigator closed from the room list");
            return Ok(());
        };
        let (room, _) = nearest[choice];
        controller.select_destination(room, Some(here.position))?;

        if guidance_panel(terminal, controller, caption, here.is_fallback)? == PanelExit::Quit {
            info!("Navigator closed from guidance");
            return Ok(());
        }
    }
}
