// src/sink.rs - Where musical events go once the session has decided on them
use serde::Serialize;
use tracing::info;

use crate::chord::PluckNotes;
use crate::strum::StrumDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoteOn {
    pub pitch: u8,
    pub velocity: u8,
}

/// Receives the session's decisions and turns them into sound.
///
/// Whether that means local synthesis or an external MIDI port is up to the
/// implementation. All pitches arrive with the capo already applied.
pub trait PerformanceSink {
    fn rebuild_chord(&mut self, label: &str, notes: &[u8], pluck: Option<&PluckNotes>);

    fn pluck(&mut self, notes: &[NoteOn]);

    /// `pitches` are already in play order (high to low for an up stroke).
    fn strum(&mut self, direction: StrumDirection, pitches: &[u8], per_note_ms: f64);

    fn capo_changed(&mut self, _capo: i8) {}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PerformanceEvent {
    ChordChanged {
        label: String,
        notes: Vec<u8>,
        pluck: Option<PluckNotes>,
    },
    Pluck {
        notes: Vec<NoteOn>,
    },
    Strum {
        direction: StrumDirection,
        pitches: Vec<u8>,
        per_note_ms: f64,
    },
    CapoChanged {
        capo: i8,
    },
}

impl PerformanceEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChordChanged { .. } => "chord",
            Self::Pluck { .. } => "pluck",
            Self::Strum { .. } => "strum",
            Self::CapoChanged { .. } => "capo",
        }
    }

    /// Hand the event to a sink.
    pub fn dispatch<S: PerformanceSink + ?Sized>(&self, sink: &mut S) {
        match self {
            Self::ChordChanged { label, notes, pluck } => sink.rebuild_chord(label, notes, pluck.as_ref()),
            Self::Pluck { notes } => sink.pluck(notes),
            Self::Strum { direction, pitches, per_note_ms } => sink.strum(*direction, pitches, *per_note_ms),
            Self::CapoChanged { capo } => sink.capo_changed(*capo),
        }
    }
}

/// Keeps every event it receives, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<PerformanceEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }
}

impl PerformanceSink for RecordingSink {
    fn rebuild_chord(&mut self, label: &str, notes: &[u8], pluck: Option<&PluckNotes>) {
        self.events.push(PerformanceEvent::ChordChanged {
            label: label.to_string(),
            notes: notes.to_vec(),
            pluck: pluck.copied(),
        });
    }

    fn pluck(&mut self, notes: &[NoteOn]) {
        self.events.push(PerformanceEvent::Pluck { notes: notes.to_vec() });
    }

    fn strum(&mut self, direction: StrumDirection, pitches: &[u8], per_note_ms: f64) {
        self.events.push(PerformanceEvent::Strum {
            direction,
            pitches: pitches.to_vec(),
            per_note_ms,
        });
    }

    fn capo_changed(&mut self, capo: i8) {
        self.events.push(PerformanceEvent::CapoChanged { capo });
    }
}

/// Writes each event to the log. Used when no audio backend is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl PerformanceSink for LoggingSink {
    fn rebuild_chord(&mut self, label: &str, notes: &[u8], pluck: Option<&PluckNotes>) {
        info!("Chord {} -> {:?} (pluck {:?})", label, notes, pluck);
    }

    fn pluck(&mut self, notes: &[NoteOn]) {
        info!("Pluck {:?}", notes);
    }

    fn strum(&mut self, direction: StrumDirection, pitches: &[u8], per_note_ms: f64) {
        info!("Strum {:?} {:?} @ {:.1}ms/string", direction, pitches, per_note_ms);
    }

    fn capo_changed(&mut self, capo: i8) {
        info!("Capo {:+}", capo);
    }
}

/// Fans every event out to two sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: PerformanceSink, B: PerformanceSink> PerformanceSink for Tee<A, B> {
    fn rebuild_chord(&mut self, label: &str, notes: &[u8], pluck: Option<&PluckNotes>) {
        self.0.rebuild_chord(label, notes, pluck);
        self.1.rebuild_chord(label, notes, pluck);
    }

    fn pluck(&mut self, notes: &[NoteOn]) {
        self.0.pluck(notes);
        self.1.pluck(notes);
    }

    fn strum(&mut self, direction: StrumDirection, pitches: &[u8], per_note_ms: f64) {
        self.0.strum(direction, pitches, per_note_ms);
        self.1.strum(direction, pitches, per_note_ms);
    }

    fn capo_changed(&mut self, capo: i8) {
        self.0.capo_changed(capo);
        self.1.capo_changed(capo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_round_trips_through_recording_sink() {
        let events = vec![
            PerformanceEvent::ChordChanged {
                label: "C".into(),
                notes: vec![48, 52, 55, 60, 64],
                pluck: Some([48, 55, 60, 64]),
            },
            PerformanceEvent::Pluck {
                notes: vec![NoteOn { pitch: 55, velocity: 90 }],
            },
            PerformanceEvent::Strum {
                direction: StrumDirection::Up,
                pitches: vec![64, 60, 55],
                per_note_ms: 20.0,
            },
            PerformanceEvent::CapoChanged { capo: -1 },
        ];

        let mut sink = Tee(RecordingSink::new(), LoggingSink);
        for event in &events {
            event.dispatch(&mut sink);
        }
        assert_eq!(sink.0.events, events);
        assert_eq!(sink.0.count("strum"), 1);
    }
}
