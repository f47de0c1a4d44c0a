//! Event sink that captures everything the engine emits

use std::sync::Mutex;

use ramp_engine::notify::{EngineEvent, Notifier};

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_matching(&self, pred: impl Fn(&EngineEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
