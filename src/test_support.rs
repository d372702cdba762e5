// Test support utilities for both unit and integration tests

use crate::playback::error::PlaybackError;
use crate::playback::loader::{EndedSignal, MediaBackend, MediaResource};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

#[derive(Default)]
struct MockBackendState {
    opened: Vec<String>,
    held: HashSet<String>,
    waiting: HashMap<String, VecDeque<oneshot::Sender<Result<(), String>>>>,
    failing: HashSet<String>,
    reject_play: bool,
    parts: Vec<MockPart>,
}

#[derive(Default)]
struct LiveCounter {
    live: AtomicUsize,
    max_live: AtomicUsize,
}

impl LiveCounter {
    fn acquire(&self) {
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(now, Ordering::SeqCst);
    }

    fn release(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock media backend for testing
///
/// Parts open instantly unless their URL is held or failing. Every opened
/// part is recorded and can be driven from the test (position, end of part).
#[derive(Clone, Default)]
pub struct MockMediaBackend {
    state: Arc<Mutex<MockBackendState>>,
    counter: Arc<LiveCounter>,
}

impl MockMediaBackend {
    /// Create a new mock backend instance
    #[allow(unused)] // Used in tests
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockBackendState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Opens of `url` wait until [`MockMediaBackend::finish_load`] is called
    pub fn hold(&self, url: &str) {
        self.lock().held.insert(url.to_string());
    }

    /// Let the oldest waiting open of `url` complete. Returns false when
    /// nothing was waiting or the load was abandoned.
    pub fn finish_load(&self, url: &str) -> bool {
        self.resolve_waiting(url, Ok(()))
    }

    /// Fail the oldest waiting open of `url`
    pub fn fail_waiting_load(&self, url: &str, message: &str) -> bool {
        self.resolve_waiting(url, Err(message.to_string()))
    }

    fn resolve_waiting(&self, url: &str, outcome: Result<(), String>) -> bool {
        let sender = {
            let mut state = self.lock();
            state.held.remove(url);
            state.waiting.get_mut(url).and_then(|queue| queue.pop_front())
        };
        match sender {
            Some(sender) => sender.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Opens of `url` fail immediately
    pub fn fail(&self, url: &str) {
        self.lock().failing.insert(url.to_string());
    }

    /// Let opens of `url` succeed again after [`MockMediaBackend::fail`]
    pub fn recover(&self, url: &str) {
        self.lock().failing.remove(url);
    }

    /// Make every `play()` call fail, as an autoplay policy would
    pub fn reject_play(&self, reject: bool) {
        self.lock().reject_play = reject;
        for part in self.lock().parts.iter() {
            part.lock().reject_play = reject;
        }
    }

    /// URLs passed to `open`, in call order
    pub fn opened_urls(&self) -> Vec<String> {
        self.lock().opened.clone()
    }

    pub fn open_count(&self, url: &str) -> usize {
        self.lock().opened.iter().filter(|u| u.as_str() == url).count()
    }

    /// Resources opened and not yet released
    pub fn live_resources(&self) -> usize {
        self.counter.live.load(Ordering::SeqCst)
    }

    /// Highest number of resources that were ever live at once
    pub fn max_live_resources(&self) -> usize {
        self.counter.max_live.load(Ordering::SeqCst)
    }

    /// Most recently opened, still live part for `url`
    pub fn part(&self, url: &str) -> Option<MockPart> {
        self.lock()
            .parts
            .iter()
            .rev()
            .find(|part| {
                let part = part.lock();
                part.url == url && !part.released
            })
            .cloned()
    }
}

#[async_trait::async_trait]
impl MediaBackend for MockMediaBackend {
    async fn open(
        &self,
        url: &str,
        ended: EndedSignal,
    ) -> Result<Box<dyn MediaResource>, PlaybackError> {
        let gate = {
            let mut state = self.lock();
            state.opened.push(url.to_string());
            if state.held.contains(url) {
                let (tx, rx) = oneshot::channel();
                state
                    .waiting
                    .entry(url.to_string())
                    .or_default()
                    .push_back(tx);
                Some(rx)
            } else {
                None
            }
        };

        if let Some(gate) = gate {
            match gate.await {
                Ok(Ok(())) => {}
                Ok(Err(message)) => return Err(PlaybackError::load_failed(url, message)),
                Err(_) => return Err(PlaybackError::load_failed(url, "load abandoned")),
            }
        }

        let mut state = self.lock();
        if state.failing.contains(url) {
            return Err(PlaybackError::load_failed(url, "404 Not Found"));
        }

        self.counter.acquire();
        let part = MockPart {
            inner: Arc::new(Mutex::new(MockPartState {
                url: url.to_string(),
                position: 0.0,
                playing: false,
                released: false,
                reject_play: state.reject_play,
                seeks: Vec::new(),
                ended,
            })),
            counter: self.counter.clone(),
        };
        state.parts.push(part.clone());

        Ok(Box::new(MockResource { part }))
    }
}

struct MockPartState {
    url: String,
    position: f64,
    playing: bool,
    released: bool,
    reject_play: bool,
    seeks: Vec<f64>,
    ended: EndedSignal,
}

/// Test-side control of one opened part
#[derive(Clone)]
pub struct MockPart {
    inner: Arc<Mutex<MockPartState>>,
    counter: Arc<LiveCounter>,
}

impl MockPart {
    fn lock(&self) -> MutexGuard<'_, MockPartState> {
        match self.inner.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn url(&self) -> String {
        self.lock().url.clone()
    }

    pub fn position(&self) -> f64 {
        self.lock().position
    }

    pub fn set_position(&self, position: f64) {
        self.lock().position = position;
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    /// Positions passed to `seek`, in call order
    pub fn seeks(&self) -> Vec<f64> {
        self.lock().seeks.clone()
    }

    /// Simulate the part playing through to its end
    pub fn finish(&self) {
        let ended = {
            let mut state = self.lock();
            state.playing = false;
            state.ended.clone()
        };
        ended.fire();
    }

    fn release(&self) {
        let mut state = self.lock();
        if !state.released {
            state.released = true;
            state.playing = false;
            self.counter.release();
        }
    }
}

struct MockResource {
    part: MockPart,
}

impl MediaResource for MockResource {
    fn play(&mut self) -> Result<(), PlaybackError> {
        let mut state = self.part.lock();
        if state.reject_play {
            return Err(PlaybackError::PlaybackRejected(
                "autoplay blocked".to_string(),
            ));
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.part.lock().playing = false;
    }

    fn position(&self) -> f64 {
        self.part.position()
    }

    fn seek(&mut self, position: f64) -> Result<(), PlaybackError> {
        let mut state = self.part.lock();
        state.position = position;
        state.seeks.push(position);
        Ok(())
    }

    fn release(&mut self) {
        self.part.release();
    }
}

impl Drop for MockResource {
    fn drop(&mut self) {
        self.part.release();
    }
}
