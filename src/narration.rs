//! Spoken instructions.
//!
//! Guidance never waits on speech. A [Narrator] takes a [NarrationRequest]
//! and returns straight away; a newer request or a [Narrator::cancel] cuts
//! off whatever was still being said.

use log::{debug, info, warn};
use std::collections::VecDeque;
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Something to say, and how to say it.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationRequest {
    /// The words to speak
    pub text: String,
    /// BCP 47 language tag, e.g. "en-US"
    pub language: String,
    /// Speech rate, 1.0 is normal speed
    pub rate: f32,
}

/// Ways handing off speech can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationError {
    /// The speech engine has gone away.
    Disconnected,
}

impl fmt::Display for NarrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NarrationError::Disconnected => write!(f, "narrator is no longer running"),
        }
    }
}

impl std::error::Error for NarrationError {}

/// `Narrator`
///
/// A fire-and-forget text to speech engine. `speak` must not block until
/// the speech is done.
pub trait Narrator {
    /// Start speaking `request`, interrupting anything already in progress.
    fn speak(&mut self, request: NarrationRequest) -> Result<(), NarrationError>;

    /// Stop speaking, dropping anything in progress.
    fn cancel(&mut self);
}

impl<N: Narrator + ?Sized> Narrator for Box<N> {
    fn speak(&mut self, request: NarrationRequest) -> Result<(), NarrationError> {
        (**self).speak(request)
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }
}

/// A [Narrator] that writes what it would have said to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNarrator;

impl Narrator for LogNarrator {
    fn speak(&mut self, request: NarrationRequest) -> Result<(), NarrationError> {
        info!(
            "[{} x{:.1}] {}",
            request.language, request.rate, request.text
        );
        Ok(())
    }

    fn cancel(&mut self) {
        debug!("Narration cancelled");
    }
}

/// What happened to an utterance on a [ThreadedNarrator].
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationEvent {
    /// Began speaking this request.
    Started(NarrationRequest),
    /// Got all the way through this text.
    Finished(String),
    /// Was cut off part way through this text.
    Interrupted(String),
}

type EventSink = Box<dyn FnMut(NarrationEvent) + Send>;

// Longest a single word may take, however slow the requested rate
const MAX_WORD_TIME: Duration = Duration::from_secs(60);

/// How long one word takes at `rate`. Rates that aren't positive count as
/// normal speed, and absurdly slow ones are capped.
fn word_duration(word_time: Duration, rate: f32) -> Duration {
    let rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
    let cap = MAX_WORD_TIME.max(word_time);
    Duration::try_from_secs_f64(word_time.as_secs_f64() / f64::from(rate))
        .unwrap_or(cap)
        .min(cap)
}

enum Signal {
    Speak(NarrationRequest),
    Cancel,
    Stop,
}

/// A [Narrator] that "speaks" on its own thread, one word at a time, and
/// reports progress to an event sink. Sending a new request while one is
/// still going interrupts it.
pub struct ThreadedNarrator {
    handle: Option<thread::JoinHandle<()>>,
    tx: mpsc::Sender<Signal>,
}

impl ThreadedNarrator {
    /// Spawns the speech thread. Each word takes `word_time / rate` to say.
    pub fn spawn(word_time: Duration, mut sink: EventSink) -> Self {
        let (tx, rx) = mpsc::channel::<Signal>();

        let handle = thread::spawn(move || {
            let mut current: Option<(NarrationRequest, VecDeque<String>)> = None;
            loop {
                let received = match &current {
                    Some((req, _)) => {
                        match rx.recv_timeout(word_duration(word_time, req.rate)) {
                            Ok(signal) => Some(signal),
                            Err(RecvTimeoutError::Timeout) => None,
                            Err(RecvTimeoutError::Disconnected) => Some(Signal::Stop),
                        }
                    }
                    None => Some(rx.recv().unwrap_or(Signal::Stop)),
                };

                match received {
                    Some(Signal::Speak(req)) => {
                        if let Some((old, _)) = current.take() {
                            sink(NarrationEvent::Interrupted(old.text));
                        }
                        let words = req.text.split_whitespace().map(str::to_owned).collect();
                        sink(NarrationEvent::Started(req.clone()));
                        current = Some((req, words));
                    }
                    Some(Signal::Cancel) => {
                        if let Some((old, _)) = current.take() {
                            sink(NarrationEvent::Interrupted(old.text));
                        }
                    }
                    Some(Signal::Stop) => {
                        if let Some((old, _)) = current.take() {
                            sink(NarrationEvent::Interrupted(old.text));
                        }
                        break;
                    }
                    None => {
                        // One word's worth of time went by
                        let done = match current.as_mut() {
                            Some((_, words)) => {
                                words.pop_front();
                                words.is_empty()
                            }
                            None => false,
                        };
                        if done {
                            if let Some((req, _)) = current.take() {
                                sink(NarrationEvent::Finished(req.text));
                            }
                        }
                    }
                }
            }
            debug!("Narrator thread finished");
        });

        ThreadedNarrator {
            handle: Some(handle),
            tx,
        }
    }

    /// A narrator whose events just go to the log.
    pub fn logging(word_time: Duration) -> Self {
        Self::spawn(
            word_time,
            Box::new(|event| match event {
                NarrationEvent::Started(req) => info!("Speaking: {}", req.text),
                NarrationEvent::Finished(text) => debug!("Finished: {}", text),
                NarrationEvent::Interrupted(text) => debug!("Interrupted: {}", text),
            }),
        )
    }

    /// Shuts the speech thread down and waits for it.
    pub fn stop(&mut self) {
        let _ = self.tx.send(Signal::Stop);
        if let Some(thread) = self.handle.take() {
            if thread.join().is_err() {
                warn!("Narrator thread panicked");
            }
        }
    }
}

impl Narrator for ThreadedNarrator {
    fn speak(&mut self, request: NarrationRequest) -> Result<(), NarrationError> {
        self.tx
            .send(Signal::Speak(request))
            .map_err(|_| NarrationError::Disconnected)
    }

    fn cancel(&mut self) {
        if self.tx.send(Signal::Cancel).is_err() {
            debug!("Cancel sent to a stopped narrator");
        }
    }
}

impl Drop for ThreadedNarrator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> NarrationRequest {
        NarrationRequest {
            text: text.to_owned(),
            language: "en-US".to_owned(),
            rate: 1.2,
        }
    }

    fn channel_narrator(word_time: Duration) -> (ThreadedNarrator, mpsc::Receiver<NarrationEvent>) {
        let (event_tx, event_rx) = mpsc::channel();
        let narrator = ThreadedNarrator::spawn(
            word_time,
            Box::new(move |event| {
                let _ = event_tx.send(event);
            }),
        );
        (narrator, event_rx)
    }

    #[test]
    fn log_narrator_never_fails() {
        let mut narrator = LogNarrator;
        assert_eq!(narrator.speak(request("Head toward North")), Ok(()));
        narrator.cancel();
    }

    #[test]
    fn speaks_to_the_end() {
        let (mut narrator, events) = channel_narrator(Duration::from_millis(1));
        narrator.speak(request("Head toward North")).unwrap();

        let timeout = Duration::from_secs(5);
        assert_eq!(
            events.recv_timeout(timeout),
            Ok(NarrationEvent::Started(request("Head toward North")))
        );
        assert_eq!(
            events.recv_timeout(timeout),
            Ok(NarrationEvent::Finished("Head toward North".to_owned()))
        );
        narrator.stop();
    }

    #[test]
    fn new_request_interrupts_old_one() {
        // Long enough per word that nothing finishes during the test
        let (mut narrator, events) = channel_narrator(Duration::from_secs(60));
        narrator.speak(request("Head toward North")).unwrap();
        narrator.speak(request("Continue North")).unwrap();
        narrator.cancel();
        narrator.stop();

        let got: Vec<_> = events.iter().collect();
        assert_eq!(
            got,
            vec![
                NarrationEvent::Started(request("Head toward North")),
                NarrationEvent::Interrupted("Head toward North".to_owned()),
                NarrationEvent::Started(request("Continue North")),
                NarrationEvent::Interrupted("Continue North".to_owned()),
            ]
        );
    }

    #[test]
    fn word_duration_follows_the_rate() {
        let close = |a: Duration, b: Duration| {
            let gap = if a > b { a - b } else { b - a };
            gap < Duration::from_micros(1)
        };
        let word = Duration::from_millis(300);
        assert!(close(word_duration(word, 1.0), word));
        assert!(close(word_duration(word, 2.0), Duration::from_millis(150)));
        assert!(close(word_duration(word, 0.0), word));
        assert!(close(word_duration(word, -3.0), word));
        assert!(close(word_duration(word, f32::NAN), word));
        assert_eq!(word_duration(word, 1e-30), MAX_WORD_TIME);
        assert_eq!(word_duration(word, f32::MIN_POSITIVE), MAX_WORD_TIME);
    }

    #[test]
    fn tiny_rate_does_not_kill_the_thread() {
        let (mut narrator, events) = channel_narrator(Duration::from_millis(1));
        let crawl = NarrationRequest {
            rate: 1e-30,
            ..request("Head toward North")
        };
        narrator.speak(crawl.clone()).unwrap();
        narrator.speak(request("Continue North")).unwrap();

        let timeout = Duration::from_secs(5);
        assert_eq!(events.recv_timeout(timeout), Ok(NarrationEvent::Started(crawl)));
        assert_eq!(
            events.recv_timeout(timeout),
            Ok(NarrationEvent::Interrupted("Head toward North".to_owned()))
        );
        assert_eq!(
            events.recv_timeout(timeout),
            Ok(NarrationEvent::Started(request("Continue North")))
        );
        assert_eq!(
            events.recv_timeout(timeout),
            Ok(NarrationEvent::Finished("Continue North".to_owned()))
        );
        assert!(narrator.speak(request("still here")).is_ok());
        narrator.stop();
    }

    #[test]
    fn speaking_after_stop_is_an_error() {
        let (mut narrator, _events) = channel_narrator(Duration::from_millis(1));
        narrator.stop();
        assert_eq!(
            narrator.speak(request("anyone there?")),
            Err(NarrationError::Disconnected)
        );
        // Cancelling a stopped narrator is harmless
        narrator.cancel();
    }

    #[test]
    fn boxed_narrators_still_narrate() {
        let mut narrator: Box<dyn Narrator> = Box::new(LogNarrator);
        assert!(narrator.speak(request("hello")).is_ok());
    }
}
