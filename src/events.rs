//! Stimulus events read back from the stim channel.
//!
//! The stim channel holds zero between flashes and the event code while a
//! flash is on screen. An event starts at every sample where the channel
//! steps up to a larger non-zero value. A value already present on the
//! first sample is not an event.

use serde::Serialize;

use crate::recording::Recording;

pub const TARGET_CODE: i64 = 33285;
pub const NON_TARGET_CODE: i64 = 33286;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    Target,
    NonTarget,
    Other,
}

impl EventKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            TARGET_CODE => EventKind::Target,
            NON_TARGET_CODE => EventKind::NonTarget,
            _ => EventKind::Other,
        }
    }

    /// Class label used by the P300 pipelines: 1 for non-target, 2 for target.
    pub fn label(self) -> Option<u8> {
        match self {
            EventKind::NonTarget => Some(1),
            EventKind::Target => Some(2),
            EventKind::Other => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Event {
    pub sample: usize,
    pub code: i64,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        EventKind::from_code(self.code)
    }

    pub fn onset_secs(&self, sfreq: f64) -> f64 {
        self.sample as f64 / sfreq
    }
}

pub fn find_events(recording: &Recording) -> Vec<Event> {
    match recording.stim_channel() {
        Some(stim) => onsets(stim.iter().copied()),
        None => Vec::new(),
    }
}

fn onsets(values: impl Iterator<Item = f64>) -> Vec<Event> {
    let mut events = Vec::new();
    let mut previous = None;
    for (sample, value) in values.enumerate() {
        let code = value.round() as i64;
        let Some(last) = previous.replace(code) else {
            continue;
        };
        if code != 0 && code > last {
            events.push(Event { sample, code });
        }
    }
    events
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventCounts {
    pub target: usize,
    pub non_target: usize,
    pub other: usize,
}

pub fn count_events(events: &[Event]) -> EventCounts {
    let mut counts = EventCounts::default();
    for event in events {
        match event.kind() {
            EventKind::Target => counts.target += 1,
            EventKind::NonTarget => counts.non_target += 1,
            EventKind::Other => counts.other += 1,
        }
    }
    counts
}
