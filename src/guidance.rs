//! Step-by-step walking guidance.
//!
//! A [Guide] is a small state machine:
//!
//! ```text
//!  Idle ──select──> Previewing ──start──> Active ──stop/close──> Idle
//!                     │  ^                  │ next / previous
//!                     └──┘ select           └──┘
//! ```
//!
//! The guidance itself is simple. There is no path finding, the
//! walk is a straight line from origin to destination chopped into four
//! fixed steps (30%, 40%, 30%, then arrival). Every transition is a pure
//! function from one [Guide] to the next, returned in a [Transition] along
//! with the side effects ([Effect]s) the caller should carry out. The
//! [GuideController] does that carrying out against a real [Narrator].

use crate::config::GuideConfig;
use crate::destination::Destination;
use crate::geo::{bearing_degrees, distance_km, Cardinal, Coordinate, GeoError};
use crate::narration::{NarrationRequest, Narrator};

use log::{debug, info, warn};
use std::fmt;

/// Every session has exactly this many steps.
pub const STEP_COUNT: usize = 4;

/// Fraction of the total distance covered by each step.
const STEP_SHARES: [f64; STEP_COUNT] = [0.3, 0.4, 0.3, 0.0];

const STEP_TITLES: [&str; STEP_COUNT] = ["Start", "On the way", "Almost there", "Arrived!"];

const STEP_ICONS: [&str; STEP_COUNT] = ["📍", "🚶", "👀", "🎉"];

// Shaves float noise so that exactly 1.4 km at 1.4 km/h reads 60, not 61.
const ETA_SLACK_MINUTES: f64 = 1e-9;

/// Things the caller did out of order, or gave us nonsense for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuidanceError {
    /// The origin or destination isn't a real coordinate.
    InvalidCoordinate(GeoError),
    /// We were asked for guidance before knowing where the user is.
    MissingOrigin,
    /// A step transition arrived with nothing selected.
    NoDestinationSelected,
    /// A step transition arrived while only previewing.
    NotNavigating,
}

impl fmt::Display for GuidanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuidanceError::InvalidCoordinate(e) => write!(f, "{}", e),
            GuidanceError::MissingOrigin => write!(f, "the user's location is not known yet"),
            GuidanceError::NoDestinationSelected => write!(f, "no destination has been selected"),
            GuidanceError::NotNavigating => write!(f, "navigation has not been started"),
        }
    }
}

impl std::error::Error for GuidanceError {}

impl From<GeoError> for GuidanceError {
    fn from(value: GeoError) -> Self {
        Self::InvalidCoordinate(value)
    }
}

/// One instruction in the walk.
#[derive(Debug, Clone, PartialEq)]
pub struct GuidanceStep {
    /// 0-based position in the walk
    pub index: usize,
    /// Short heading, e.g. "Almost there"
    pub title: String,
    /// The instruction itself; this is what gets spoken
    pub description: String,
    /// How much of the walk this step covers, in km
    pub partial_distance_km: f64,
    /// Little picture for the display
    pub icon: String,
}

/// What we know once a destination is picked: how far, how long, which way.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    /// Where the user was when the destination was picked
    pub origin: Coordinate,
    /// Where the user wants to go
    pub destination: Destination,
    /// Straight-line distance in km
    pub total_distance_km: f64,
    /// Minutes to get there at the configured walking speed
    pub eta_minutes: u32,
    /// Initial bearing from origin to destination, in degrees
    pub bearing: f64,
    /// `bearing` as a compass sector
    pub cardinal: Cardinal,
}

impl Preview {
    fn new(
        destination: &Destination,
        origin: Coordinate,
        walking_speed_kmh: f64,
    ) -> Result<Self, GeoError> {
        let total_distance_km = distance_km(&origin, &destination.coordinate)?;
        let bearing = bearing_degrees(&origin, &destination.coordinate)?;
        Ok(Preview {
            origin,
            destination: destination.clone(),
            total_distance_km,
            eta_minutes: eta_minutes(total_distance_km, walking_speed_kmh),
            bearing,
            cardinal: Cardinal::from_bearing(bearing)?,
        })
    }

    /// Builds the four steps for this walk.
    pub fn steps(&self) -> Vec<GuidanceStep> {
        let total = self.total_distance_km;
        let way = self.cardinal;
        let descriptions = [
            format!("Head toward {}", way),
            format!("Continue {} for about {:.2} km", way, total * STEP_SHARES[1]),
            format!("Getting close, keep heading {} toward your destination", way),
            format!(
                "You have arrived at {}. {}",
                self.destination.name,
                self.destination.arrival_note()
            ),
        ];

        descriptions
            .into_iter()
            .enumerate()
            .map(|(index, description)| GuidanceStep {
                index,
                title: STEP_TITLES[index].to_owned(),
                description,
                partial_distance_km: total * STEP_SHARES[index],
                icon: STEP_ICONS[index].to_owned(),
            })
            .collect()
    }
}

/// Minutes needed to walk `distance_km` at `walking_speed_kmh`, rounded up.
pub fn eta_minutes(distance_km: f64, walking_speed_kmh: f64) -> u32 {
    let minutes = distance_km / walking_speed_kmh * 60.0;
    (minutes - ETA_SLACK_MINUTES).ceil().max(0.0) as u32
}

/// A walk in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    preview: Preview,
    steps: Vec<GuidanceStep>,
    current_step: usize,
}

impl Session {
    fn begin(preview: Preview) -> Self {
        let steps = preview.steps();
        debug_assert_eq!(steps.len(), STEP_COUNT);
        Session {
            preview,
            steps,
            current_step: 0,
        }
    }

    /// The numbers this session was started from.
    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    /// All four steps, in order.
    pub fn steps(&self) -> &[GuidanceStep] {
        &self.steps
    }

    /// Index of the step being shown.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// The step being shown.
    pub fn current(&self) -> &GuidanceStep {
        &self.steps[self.current_step]
    }

    /// True on the arrival step.
    pub fn is_last(&self) -> bool {
        self.current_step + 1 == self.steps.len()
    }

    /// `(step number, step count)`, counting from 1, for "Step 2 of 4".
    pub fn progress(&self) -> (usize, usize) {
        (self.current_step + 1, self.steps.len())
    }

    /// How far through the steps we are, as a rounded percentage.
    pub fn percent_complete(&self) -> u16 {
        let (n, total) = self.progress();
        ((n as f64 / total as f64) * 100.0).round() as u16
    }

    /// Share of the straight line already behind the user when the current
    /// step begins: 0.0 on the first step, 1.0 on arrival.
    pub fn walked_fraction(&self) -> f64 {
        STEP_SHARES[..self.current_step].iter().sum()
    }

    /// Everything a display needs to draw the current moment.
    pub fn frame(&self) -> GuidanceFrame<'_> {
        let (step_number, step_count) = self.progress();
        GuidanceFrame {
            step: self.current(),
            origin: self.preview.origin,
            destination: self.preview.destination.coordinate,
            step_number,
            step_count,
        }
    }
}

/// What the map or overlay is handed to draw: the active step and the two
/// ends of the straight line between origin and destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuidanceFrame<'a> {
    /// The step to show
    pub step: &'a GuidanceStep,
    /// Start of the line
    pub origin: Coordinate,
    /// End of the line
    pub destination: Coordinate,
    /// 1-based
    pub step_number: usize,
    /// Always [STEP_COUNT]
    pub step_count: usize,
}

/// Where the [Guide] is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum GuidanceState {
    /// Nothing selected.
    Idle,
    /// Destination picked, distance and ETA known, not walking yet.
    Previewing(Preview),
    /// Walking, with a valid current step.
    Active(Session),
}

/// A side effect a transition asks for. The state machine never performs
/// these itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Say this.
    Narrate(NarrationRequest),
    /// Shut up whatever is being said.
    CancelNarration,
}

/// The guidance state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Guide {
    state: GuidanceState,
    narration_enabled: bool,
    config: GuideConfig,
}

/// The result of a transition: the guide to use from now on, plus the side
/// effects to perform, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// The guide after the transition
    pub guide: Guide,
    /// Side effects, to be carried out in order
    pub effects: Vec<Effect>,
}

impl Guide {
    /// An idle guide. Narration starts on or off per `config`.
    pub fn new(config: GuideConfig) -> Self {
        Guide {
            state: GuidanceState::Idle,
            narration_enabled: config.narration_enabled,
            config,
        }
    }

    /// Where the guide is in its lifecycle.
    pub fn state(&self) -> &GuidanceState {
        &self.state
    }

    /// The configuration the guide was built with.
    pub fn config(&self) -> &GuideConfig {
        &self.config
    }

    /// Whether transitions will ask for speech.
    pub fn narration_enabled(&self) -> bool {
        self.narration_enabled
    }

    /// The active session, if walking.
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            GuidanceState::Active(session) => Some(session),
            _ => None,
        }
    }

    /// The preview, whether walking or only previewing.
    pub fn preview(&self) -> Option<&Preview> {
        match &self.state {
            GuidanceState::Idle => None,
            GuidanceState::Previewing(preview) => Some(preview),
            GuidanceState::Active(session) => Some(session.preview()),
        }
    }

    fn with_state(&self, state: GuidanceState, effects: Vec<Effect>) -> Transition {
        Transition {
            guide: Guide {
                state,
                ..self.clone()
            },
            effects,
        }
    }

    fn unchanged(&self) -> Transition {
        Transition {
            guide: self.clone(),
            effects: vec![],
        }
    }

    /// Cancel whatever is playing, then say `step` if narration is on.
    fn narrate_step(&self, step: &GuidanceStep) -> Vec<Effect> {
        let mut effects = vec![Effect::CancelNarration];
        if self.narration_enabled {
            effects.push(Effect::Narrate(NarrationRequest {
                text: step.description.clone(),
                language: self.config.narration_language.clone(),
                rate: self.config.narration_rate,
            }));
        }
        effects
    }

    /// Pick where to go from `origin`. Works from any state; a walk already
    /// in progress is dropped, since a new destination needs a new session.
    pub fn select_destination(
        &self,
        destination: &Destination,
        origin: Option<Coordinate>,
    ) -> Result<Transition, GuidanceError> {
        let origin = origin.ok_or(GuidanceError::MissingOrigin)?;
        let preview = Preview::new(destination, origin, self.config.walking_speed_kmh)?;
        debug!(
            "Previewing {}: {:.3} km, {} min, heading {}",
            destination.name, preview.total_distance_km, preview.eta_minutes, preview.cardinal
        );

        let effects = match self.state {
            GuidanceState::Active(_) => vec![Effect::CancelNarration],
            _ => vec![],
        };
        Ok(self.with_state(GuidanceState::Previewing(preview), effects))
    }

    /// Start walking: generate the steps and go to the first one. Starting
    /// again while active begins over from the first step.
    pub fn start(&self) -> Result<Transition, GuidanceError> {
        let preview = match &self.state {
            GuidanceState::Idle => return Err(GuidanceError::NoDestinationSelected),
            GuidanceState::Previewing(preview) => preview.clone(),
            GuidanceState::Active(session) => session.preview().clone(),
        };

        info!("Navigation to {} started", preview.destination.name);
        let session = Session::begin(preview);
        let effects = self.narrate_step(session.current());
        Ok(self.with_state(GuidanceState::Active(session), effects))
    }

    fn step_by(&self, forward: bool) -> Result<Transition, GuidanceError> {
        let session = match &self.state {
            GuidanceState::Idle => return Err(GuidanceError::NoDestinationSelected),
            GuidanceState::Previewing(_) => return Err(GuidanceError::NotNavigating),
            GuidanceState::Active(session) => session,
        };

        let target = if forward {
            session.current_step + 1
        } else {
            match session.current_step.checked_sub(1) {
                Some(i) => i,
                None => return Ok(self.unchanged()),
            }
        };
        if target >= session.steps.len() {
            return Ok(self.unchanged());
        }

        debug!("Step {} -> {}", session.current_step, target);
        let session = Session {
            current_step: target,
            ..session.clone()
        };
        let effects = self.narrate_step(session.current());
        Ok(self.with_state(GuidanceState::Active(session), effects))
    }

    /// Go to the next step. Does nothing on the last step.
    pub fn next(&self) -> Result<Transition, GuidanceError> {
        self.step_by(true)
    }

    /// Go back a step. Does nothing on the first step.
    pub fn previous(&self) -> Result<Transition, GuidanceError> {
        self.step_by(false)
    }

    /// Stop navigating and forget the destination.
    pub fn stop(&self) -> Transition {
        match self.state {
            GuidanceState::Idle => self.unchanged(),
            _ => {
                info!("Navigation stopped");
                self.with_state(GuidanceState::Idle, vec![Effect::CancelNarration])
            }
        }
    }

    /// Close the overlay; the same as [Guide::stop].
    pub fn close(&self) -> Transition {
        self.stop()
    }

    /// Flip narration on or off. Nothing already shown gets read out.
    pub fn toggle_narration(&self) -> Transition {
        Transition {
            guide: Guide {
                narration_enabled: !self.narration_enabled,
                ..self.clone()
            },
            effects: vec![],
        }
    }
}

/// Owns a [Guide] and a [Narrator], and carries out each transition's
/// effects. Speech is fire-and-forget: if the narrator fails, guidance keeps
/// going without sound.
pub struct GuideController<N: Narrator> {
    guide: Guide,
    narrator: N,
}

impl<N: Narrator> GuideController<N> {
    /// An idle controller.
    pub fn new(config: GuideConfig, narrator: N) -> Self {
        GuideController {
            guide: Guide::new(config),
            narrator,
        }
    }

    /// The current state machine.
    pub fn guide(&self) -> &Guide {
        &self.guide
    }

    /// The narrator effects are sent to.
    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    /// Mutable access to the narrator, e.g. to stop its thread.
    pub fn narrator_mut(&mut self) -> &mut N {
        &mut self.narrator
    }

    fn apply(&mut self, transition: Transition) {
        self.guide = transition.guide;
        for effect in transition.effects {
            match effect {
                Effect::Narrate(request) => {
                    if let Err(e) = self.narrator.speak(request) {
                        warn!("Narration failed, continuing silently: {}", e);
                    }
                }
                Effect::CancelNarration => self.narrator.cancel(),
            }
        }
    }

    /// See [Guide::select_destination].
    pub fn select_destination(
        &mut self,
        destination: &Destination,
        origin: Option<Coordinate>,
    ) -> Result<(), GuidanceError> {
        let t = self.guide.select_destination(destination, origin)?;
        self.apply(t);
        Ok(())
    }

    /// See [Guide::start].
    pub fn start(&mut self) -> Result<(), GuidanceError> {
        let t = self.guide.start()?;
        self.apply(t);
        Ok(())
    }

    /// See [Guide::next].
    pub fn next(&mut self) -> Result<(), GuidanceError> {
        let t = self.guide.next()?;
        self.apply(t);
        Ok(())
    }

    /// See [Guide::previous].
    pub fn previous(&mut self) -> Result<(), GuidanceError> {
        let t = self.guide.previous()?;
        self.apply(t);
        Ok(())
    }

    /// See [Guide::stop].
    pub fn stop(&mut self) {
        let t = self.guide.stop();
        self.apply(t);
    }

    /// See [Guide::close].
    pub fn close(&mut self) {
        let t = self.guide.close();
        self.apply(t);
    }

    /// See [Guide::toggle_narration].
    pub fn toggle_narration(&mut self) -> bool {
        let t = self.guide.toggle_narration();
        self.apply(t);
        self.guide.narration_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::tests::room;
    use crate::narration::NarrationError;

    fn campus() -> Coordinate {
        Coordinate::new(-12.0464, -77.0428).unwrap()
    }

    fn lab() -> Destination {
        room("sci-101", "laboratory", -12.0460, -77.0428)
    }

    fn previewing() -> Guide {
        Guide::new(GuideConfig::default())
            .select_destination(&lab(), Some(campus()))
            .unwrap()
            .guide
    }

    fn active() -> Guide {
        previewing().start().unwrap().guide
    }

    fn narrated(effects: &[Effect]) -> Vec<String> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Narrate(req) => Some(req.text.clone()),
                Effect::CancelNarration => None,
            })
            .collect()
    }

    #[test]
    fn select_computes_preview() {
        let guide = previewing();
        let preview = guide.preview().unwrap();
        assert!((preview.total_distance_km - 0.0445).abs() < 0.0005);
        assert!(preview.bearing.abs() < 1e-6);
        assert_eq!(preview.cardinal, Cardinal::North);
        // 0.0445 km at 1.4 km/h is just under two minutes
        assert_eq!(preview.eta_minutes, 2);
        assert!(guide.session().is_none());
    }

    #[test]
    fn select_without_origin() {
        let guide = Guide::new(GuideConfig::default());
        assert_eq!(
            guide.select_destination(&lab(), None),
            Err(GuidanceError::MissingOrigin)
        );
    }

    #[test]
    fn select_with_nan_origin() {
        let guide = Guide::new(GuideConfig::default());
        let nowhere = Coordinate {
            latitude: f64::NAN,
            longitude: 0.0,
        };
        assert!(matches!(
            guide.select_destination(&lab(), Some(nowhere)),
            Err(GuidanceError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn eta_for_a_walk_of_one_point_four_km() {
        assert_eq!(eta_minutes(1.4, 1.4), 60);
        assert_eq!(eta_minutes(0.0, 1.4), 0);
        assert_eq!(eta_minutes(0.01, 1.4), 1);

        let origin = Coordinate::new(0.0, 0.0).unwrap();
        let north = (1.4 / crate::geo::EARTH_RADIUS_KM).to_degrees();
        let dest = room("far", "office", north, 0.0);
        let guide = Guide::new(GuideConfig::default())
            .select_destination(&dest, Some(origin))
            .unwrap()
            .guide;
        let preview = guide.preview().unwrap();
        assert!((preview.total_distance_km - 1.4).abs() < 1e-9);
        assert_eq!(preview.eta_minutes, 60);
    }

    #[test]
    fn walking_speed_comes_from_config() {
        let config = GuideConfig {
            walking_speed_kmh: 5.0,
            ..GuideConfig::default()
        };
        let origin = Coordinate::new(0.0, 0.0).unwrap();
        let north = (5.0 / crate::geo::EARTH_RADIUS_KM).to_degrees();
        let guide = Guide::new(config)
            .select_destination(&room("far", "office", north, 0.0), Some(origin))
            .unwrap()
            .guide;
        assert_eq!(guide.preview().unwrap().eta_minutes, 60);
    }

    #[test]
    fn start_builds_four_steps() {
        let guide = active();
        let session = guide.session().unwrap();
        let total = session.preview().total_distance_km;

        assert_eq!(session.steps().len(), STEP_COUNT);
        assert_eq!(session.current_step(), 0);
        let sum: f64 = session.steps().iter().map(|s| s.partial_distance_km).sum();
        assert!((sum - total).abs() < 1e-9);
        assert_eq!(session.steps()[3].partial_distance_km, 0.0);
        for (i, step) in session.steps().iter().enumerate() {
            assert_eq!(step.index, i);
            assert!(step.partial_distance_km >= 0.0);
        }
    }

    #[test]
    fn step_text() {
        let guide = active();
        let steps = guide.session().unwrap().steps();
        assert_eq!(steps[0].description, "Head toward North");
        assert_eq!(steps[1].description, "Continue North for about 0.02 km");
        assert_eq!(
            steps[2].description,
            "Getting close, keep heading North toward your destination"
        );
        assert_eq!(
            steps[3].description,
            "You have arrived at Room sci-101. Welcome to the laboratory."
        );
        assert_eq!(steps[0].title, "Start");
        assert_eq!(steps[3].title, "Arrived!");
    }

    #[test]
    fn arrival_text_for_special_rooms() {
        let guide = Guide::new(GuideConfig::default());
        let wc = room("wc", "restroom", -12.0470, -77.0428);
        let steps = guide
            .select_destination(&wc, Some(campus()))
            .unwrap()
            .guide
            .start()
            .unwrap()
            .guide
            .session()
            .unwrap()
            .steps()
            .to_vec();
        assert_eq!(
            steps[3].description,
            "You have arrived at Room wc. The door is on your right."
        );
        assert!(steps[0].description.ends_with("South"));

        let cafe = room("cafe", "dining", -12.0464, -77.0420);
        let steps = guide
            .select_destination(&cafe, Some(campus()))
            .unwrap()
            .guide
            .start()
            .unwrap()
            .guide
            .session()
            .unwrap()
            .steps()
            .to_vec();
        assert!(steps[3].description.ends_with("Welcome to the dining hall."));
        assert!(steps[0].description.ends_with("East"));
    }

    #[test]
    fn start_from_idle_fails() {
        let guide = Guide::new(GuideConfig::default());
        assert_eq!(guide.start(), Err(GuidanceError::NoDestinationSelected));
    }

    #[test]
    fn start_narrates_first_step() {
        let t = previewing().start().unwrap();
        assert_eq!(t.effects[0], Effect::CancelNarration);
        assert_eq!(narrated(&t.effects), vec!["Head toward North"]);
        match &t.effects[1] {
            Effect::Narrate(req) => {
                assert_eq!(req.language, "en-US");
                assert_eq!(req.rate, 1.2);
            }
            other => panic!("expected narration, got {:?}", other),
        }
    }

    #[test]
    fn next_and_previous_walk_the_steps() {
        let mut guide = active();
        for expected in 1..STEP_COUNT {
            let t = guide.next().unwrap();
            assert_eq!(t.guide.session().unwrap().current_step(), expected);
            assert_eq!(narrated(&t.effects).len(), 1);
            guide = t.guide;
        }

        let t = guide.previous().unwrap();
        let session = t.guide.session().unwrap();
        assert_eq!(session.current_step(), 2);
        assert_eq!(narrated(&t.effects), vec![session.current().description.clone()]);
    }

    #[test]
    fn next_at_the_end_is_a_no_op() {
        let mut guide = active();
        for _ in 0..STEP_COUNT - 1 {
            guide = guide.next().unwrap().guide;
        }
        let t = guide.next().unwrap();
        assert_eq!(t.guide, guide);
        assert!(t.effects.is_empty());
        assert!(t.guide.session().unwrap().is_last());
    }

    #[test]
    fn previous_at_the_start_is_a_no_op() {
        let guide = active();
        let t = guide.previous().unwrap();
        assert_eq!(t.guide.session().unwrap().current_step(), 0);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn stepping_while_previewing() {
        assert_eq!(previewing().next(), Err(GuidanceError::NotNavigating));
        assert_eq!(previewing().previous(), Err(GuidanceError::NotNavigating));
    }

    #[test]
    fn stop_goes_idle_and_next_fails() {
        let t = active().next().unwrap().guide.stop();
        assert_eq!(t.guide.state(), &GuidanceState::Idle);
        assert_eq!(t.effects, vec![Effect::CancelNarration]);
        assert_eq!(t.guide.next(), Err(GuidanceError::NoDestinationSelected));
        assert_eq!(t.guide.previous(), Err(GuidanceError::NoDestinationSelected));
    }

    #[test]
    fn stop_from_preview_and_idle() {
        let t = previewing().close();
        assert_eq!(t.guide.state(), &GuidanceState::Idle);

        let t = t.guide.stop();
        assert!(t.effects.is_empty());
    }

    #[test]
    fn restart_begins_from_the_top() {
        let guide = active().next().unwrap().guide.next().unwrap().guide;
        let restarted = guide.start().unwrap().guide;
        assert_eq!(restarted.session().unwrap().current_step(), 0);
    }

    #[test]
    fn reselecting_drops_the_session() {
        let guide = active().next().unwrap().guide;
        let wc = room("wc", "restroom", -12.0470, -77.0428);
        let t = guide.select_destination(&wc, Some(campus())).unwrap();
        assert!(t.guide.session().is_none());
        assert_eq!(t.guide.preview().unwrap().destination.id, "wc");
        assert_eq!(t.effects, vec![Effect::CancelNarration]);
    }

    #[test]
    fn origin_is_fixed_for_the_session() {
        let guide = active();
        let origin = guide.session().unwrap().preview().origin;
        let later = guide.next().unwrap().guide.next().unwrap().guide;
        assert_eq!(later.session().unwrap().preview().origin, origin);
        assert_eq!(later.session().unwrap().steps(), guide.session().unwrap().steps());
    }

    #[test]
    fn muted_transitions_only_cancel() {
        let guide = previewing().toggle_narration();
        assert!(guide.effects.is_empty());
        assert!(!guide.guide.narration_enabled());

        let t = guide.guide.start().unwrap();
        assert_eq!(t.effects, vec![Effect::CancelNarration]);

        // Turning it back on doesn't read the current step
        let t = t.guide.toggle_narration();
        assert!(t.effects.is_empty());
        let t = t.guide.next().unwrap();
        assert_eq!(narrated(&t.effects).len(), 1);
    }

    #[test]
    fn narration_setting_survives_stop() {
        let guide = active().toggle_narration().guide.stop().guide;
        assert!(!guide.narration_enabled());
    }

    #[test]
    fn progress_and_frame() {
        let guide = active().next().unwrap().guide;
        let session = guide.session().unwrap();
        assert_eq!(session.progress(), (2, 4));
        assert_eq!(session.percent_complete(), 50);

        let frame = session.frame();
        assert_eq!(frame.step.index, 1);
        assert_eq!(frame.origin, campus());
        assert_eq!(frame.destination, lab().coordinate);
        assert_eq!((frame.step_number, frame.step_count), (2, 4));
    }

    #[test]
    fn walked_fraction_follows_the_steps() {
        let mut guide = active();
        let mut seen = vec![guide.session().unwrap().walked_fraction()];
        for _ in 1..STEP_COUNT {
            guide = guide.next().unwrap().guide;
            seen.push(guide.session().unwrap().walked_fraction());
        }
        let expected = [0.0, 0.3, 0.7, 1.0];
        for (got, want) in seen.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{} != {}", got, want);
        }
    }

    #[derive(Default)]
    struct RecordingNarrator {
        spoken: Vec<String>,
        cancels: usize,
        broken: bool,
    }

    impl Narrator for RecordingNarrator {
        fn speak(&mut self, request: NarrationRequest) -> Result<(), NarrationError> {
            if self.broken {
                return Err(NarrationError::Disconnected);
            }
            self.spoken.push(request.text);
            Ok(())
        }

        fn cancel(&mut self) {
            self.cancels += 1;
        }
    }

    #[test]
    fn controller_drives_the_narrator() {
        let mut ctl = GuideController::new(GuideConfig::default(), RecordingNarrator::default());
        ctl.select_destination(&lab(), Some(campus())).unwrap();
        ctl.start().unwrap();
        ctl.next().unwrap();
        ctl.previous().unwrap();
        ctl.previous().unwrap();
        ctl.stop();

        assert_eq!(
            ctl.narrator().spoken,
            vec![
                "Head toward North",
                "Continue North for about 0.02 km",
                "Head toward North",
            ]
        );
        // One cancel before each spoken step, then one for stop
        assert_eq!(ctl.narrator().cancels, 4);
        assert_eq!(ctl.next(), Err(GuidanceError::NoDestinationSelected));
    }

    #[test]
    fn controller_keeps_going_when_narration_breaks() {
        let narrator = RecordingNarrator {
            broken: true,
            ..RecordingNarrator::default()
        };
        let mut ctl = GuideController::new(GuideConfig::default(), narrator);
        ctl.select_destination(&lab(), Some(campus())).unwrap();
        ctl.start().unwrap();
        ctl.next().unwrap();
        assert_eq!(ctl.guide().session().unwrap().current_step(), 1);
        assert!(ctl.narrator().spoken.is_empty());
    }

    #[test]
    fn controller_toggle_reports_new_setting() {
        let mut ctl = GuideController::new(GuideConfig::default(), RecordingNarrator::default());
        assert!(!ctl.toggle_narration());
        ctl.select_destination(&lab(), Some(campus())).unwrap();
        ctl.start().unwrap();
        assert!(ctl.narrator().spoken.is_empty());
        assert!(ctl.toggle_narration());
        ctl.narrator_mut().spoken.clear();
        ctl.close();
        assert_eq!(ctl.guide().state(), &GuidanceState::Idle);
    }
}
