//! Full screen navigator: pick a room from the list, then follow the steps
//! on a live map while they're read out.

use clap::Parser;
use roomlocator::{
    args::NavigatorArgs,
    catalog::RoomCatalog,
    config::GuideConfig,
    geolocation::{FixedGeolocator, SimulatedGeolocator},
    gui::{engage_navigator, CaptionSource},
    guidance::GuideController,
    narration::{NarrationEvent, ThreadedNarrator},
};

use log::info;
use std::{
    error::Error,
    process,
    sync::{Arc, Mutex},
    time::Duration,
};

// Roughly how long one spoken word takes at rate 1.0
const WORD_TIME: Duration = Duration::from_millis(350);

fn main() {
    env_logger::init();
    let args = NavigatorArgs::parse();

    if let Err(e) = run(args) {
        eprintln!("navigator: {}", e);
        process::exit(1);
    }
}

fn run(args: NavigatorArgs) -> Result<(), Box<dyn Error>> {
    let config = match &args.common.config {
        Some(path) => GuideConfig::from_path(path)?,
        None => GuideConfig::default(),
    };
    let catalog = RoomCatalog::from_path(args.common.catalog_path())?;
    info!("Loaded {} rooms", catalog.len());

    // Whatever the narrator is saying right now, for the caption line
    let speaking: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let narrator_speaking = speaking.clone();
    let narrator = ThreadedNarrator::spawn(
        WORD_TIME,
        Box::new(move |event| {
            let Ok(mut now) = narrator_speaking.lock() else {
                return;
            };
            match event {
                NarrationEvent::Started(request) => *now = Some(request.text),
                NarrationEvent::Finished(text) | NarrationEvent::Interrupted(text) => {
                    if now.as_deref() == Some(text.as_str()) {
                        *now = None;
                    }
                }
            }
        }),
    );
    let caption: CaptionSource =
        Box::new(move || speaking.lock().ok().and_then(|now| now.clone()));

    let mut controller = GuideController::new(config, narrator);
    let res = if args.simulate {
        let center = args
            .common
            .origin
            .unwrap_or(controller.guide().config().fallback_origin);
        let mut gps = SimulatedGeolocator::builder(center).build();
        engage_navigator(&catalog, &mut controller, &mut gps, caption)
    } else {
        let mut fixed = FixedGeolocator::from(args.common.origin);
        engage_navigator(&catalog, &mut controller, &mut fixed, caption)
    };

    controller.narrator_mut().stop();
    Ok(res?)
}
