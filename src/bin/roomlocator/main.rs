//! Command line room locator. Lists and searches the catalog, previews a
//! walk, and steps through guidance with commands typed on stdin.

use clap::Parser;
use roomlocator::{
    args::{GuideCommand, ListCommand, LocatorArgs, LocatorTask, NearbyCommand, RoomCommand},
    catalog::RoomCatalog,
    config::GuideConfig,
    destination::Destination,
    geolocation::{locate_or_fallback, FixedGeolocator, Located},
    guidance::{Guide, GuideController, Preview},
    narration::{NarrationEvent, ThreadedNarrator},
};

use log::{debug, info};
use std::{
    error::Error,
    io::{self, BufRead},
    process,
    time::Duration,
};

// Roughly how long one spoken word takes at rate 1.0
const WORD_TIME: Duration = Duration::from_millis(350);

// Example:
// cargo run --bin roomlocator -- --origin -12.0464,-77.0428 guide sci-101

fn main() {
    env_logger::init();
    let args = LocatorArgs::parse();

    if let Err(e) = run(args) {
        eprintln!("roomlocator: {}", e);
        process::exit(1);
    }
}

fn run(args: LocatorArgs) -> Result<(), Box<dyn Error>> {
    let config = match &args.common.config {
        Some(path) => GuideConfig::from_path(path)?,
        None => GuideConfig::default(),
    };

    if let LocatorTask::Config = args.command {
        config.to_writer(&mut io::stdout())?;
        println!();
        return Ok(());
    }

    let catalog = RoomCatalog::from_path(args.common.catalog_path())?;
    let here = locate_or_fallback(&mut FixedGeolocator::from(args.common.origin), &config);
    if here.is_fallback {
        println!(
            "Location unknown, measuring from the campus default {}",
            here.position
        );
    }

    match args.command {
        LocatorTask::List(ListCommand {
            query,
            category,
            floor,
        }) => {
            let rooms: Vec<_> = catalog
                .filter(&query, category.as_deref())
                .into_iter()
                .filter(|room| floor.map_or(true, |f| room.floor == f))
                .collect();
            for room in &rooms {
                println!("{:<12} {}", room.id, room);
            }
            debug!("Listed {} of {} rooms", rooms.len(), catalog.len());
        }
        LocatorTask::Nearby(NearbyCommand { radius_km }) => {
            let nearby = catalog.nearby(&here.position, radius_km)?;
            if nearby.is_empty() {
                println!("Nothing within {} km", radius_km);
            }
            for (room, d) in nearby {
                println!("{:>6.2} km  {:<12} {}", d, room.id, room);
            }
        }
        LocatorTask::Preview(RoomCommand { room }) => {
            let room = find(&catalog, &room)?;
            let guide = Guide::new(config)
                .select_destination(room, Some(here.position))?
                .guide;
            if let Some(preview) = guide.preview() {
                print_preview(preview);
            }
        }
        LocatorTask::Guide(GuideCommand { room, mute }) => {
            let room = find(&catalog, &room)?;
            let config = GuideConfig {
                narration_enabled: config.narration_enabled && !mute,
                ..config
            };
            walk(room, config, here)?;
        }
        // Printed before the catalog was loaded
        LocatorTask::Config => {}
    }

    Ok(())
}

fn find<'a>(catalog: &'a RoomCatalog, id: &str) -> Result<&'a Destination, Box<dyn Error>> {
    catalog
        .get(id)
        .ok_or_else(|| format!("no room with id {:?}, try `roomlocator list`", id).into())
}

fn print_preview(preview: &Preview) {
    println!("{}", preview.destination);
    if let Some(description) = &preview.destination.description {
        println!("  {}", description);
    }
    println!(
        "  {:.2} km, about {} min on foot, heading {} ({:.0}°)",
        preview.total_distance_km, preview.eta_minutes, preview.cardinal, preview.bearing
    );
}

fn print_step(guide: &Guide) {
    match guide.session() {
        Some(session) => {
            let step = session.current();
            let (n, total) = session.progress();
            println!(
                "[{}/{}] {} {}: {} ({:.2} km)",
                n, total, step.icon, step.title, step.description, step.partial_distance_km
            );
            if session.is_last() {
                println!("Type x to finish.");
            }
        }
        None => println!("Type s to start walking."),
    }
}

fn walk(room: &Destination, config: GuideConfig, here: Located) -> Result<(), Box<dyn Error>> {
    let narrator = ThreadedNarrator::spawn(
        WORD_TIME,
        Box::new(|event| {
            if let NarrationEvent::Started(request) = event {
                println!("  🔊 {}", request.text);
            }
        }),
    );
    let mut controller = GuideController::new(config, narrator);
    controller.select_destination(room, Some(here.position))?;

    if let Some(preview) = controller.guide().preview() {
        print_preview(preview);
    }
    println!("Commands: s(tart)  n(ext)  p(revious)  m(ute)  x (stop)");

    for line in io::stdin().lock().lines() {
        let outcome = match line?.trim() {
            "s" | "start" => controller.start(),
            "n" | "next" => controller.next(),
            "p" | "previous" => controller.previous(),
            "m" | "mute" => {
                let on = controller.toggle_narration();
                println!("Narration {}", if on { "on" } else { "off" });
                continue;
            }
            "x" | "stop" | "q" | "quit" => {
                controller.stop();
                break;
            }
            "" => continue,
            other => {
                println!("Unknown command {:?}", other);
                continue;
            }
        };

        match outcome {
            Ok(()) => print_step(controller.guide()),
            Err(e) => println!("{}", e),
        }
    }

    info!("Guidance to {} ended", room.name);
    controller.narrator_mut().stop();
    Ok(())
}
