// src/session.rs - Per-performer state machine: landmark frames in, musical events out
use std::collections::BTreeSet;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::capo::{Capo, CapoPolicy, PoseCapoAdjuster};
use crate::chord::{ChordMapper, ChordVoicing};
use crate::classifier::{classify_with_timeout, GestureClassifier};
use crate::config::SessionConfig;
use crate::features::{extract_chord_features, extract_pluck_state, PluckState, ANGLE_FEATURES};
use crate::landmarks::LandmarkFrame;
use crate::sink::{NoteOn, PerformanceEvent, PerformanceSink};
use crate::strum::{StrumAction, StrumDetector, StrumDirection, StrumStroke};

/// What one frame produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// Label the classifier returned this frame, changed or not.
    pub label: Option<String>,
    pub pluck_angles: Option<[f64; ANGLE_FEATURES]>,
    pub events: Vec<PerformanceEvent>,
}

#[derive(Debug, Clone, Default)]
struct SessionState {
    prev_gesture: Option<String>,
    voicing: Option<ChordVoicing>,
    prev_pluck: BTreeSet<usize>,
    capo: Capo,
    frame_counter: u64,
}

pub struct GestureSession<C, S> {
    classifier: C,
    sink: S,
    mapper: ChordMapper,
    config: SessionConfig,
    state: SessionState,
    strum: StrumDetector,
    capo_adjuster: Option<PoseCapoAdjuster>,
}

/// Velocity from finger flexion: a deeper curl plays louder.
pub fn velocity_from_angle(angle: f64) -> u8 {
    if !angle.is_finite() {
        return 1;
    }
    angle.round().clamp(1.0, 127.0) as u8
}

impl<C: GestureClassifier, S: PerformanceSink> GestureSession<C, S> {
    pub fn new(classifier: C, sink: S, config: SessionConfig) -> Self {
        let capo_adjuster = match config.capo_policy {
            CapoPolicy::PoseAuto => Some(PoseCapoAdjuster::new(config.auto_capo_interval)),
            CapoPolicy::Manual => None,
        };
        Self {
            classifier,
            sink,
            mapper: ChordMapper::new(config.tuning),
            strum: StrumDetector::new(config.strum),
            state: SessionState {
                capo: Capo::new(config.initial_capo),
                ..SessionState::default()
            },
            capo_adjuster,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn capo(&self) -> i8 {
        self.state.capo.value()
    }

    pub fn current_gesture(&self) -> Option<&str> {
        self.state.prev_gesture.as_deref()
    }

    pub fn voicing(&self) -> Option<&ChordVoicing> {
        self.state.voicing.as_ref()
    }

    /// Direction of the last strum that sounded, `Idle` before the first.
    pub fn last_stroke(&self) -> StrumAction {
        self.strum.last_action()
    }

    pub fn frame_count(&self) -> u64 {
        self.state.frame_counter
    }

    pub fn increment_capo(&mut self) -> bool {
        self.manual_capo(1)
    }

    pub fn decrement_capo(&mut self) -> bool {
        self.manual_capo(-1)
    }

    fn manual_capo(&mut self, delta: i8) -> bool {
        if self.config.capo_policy != CapoPolicy::Manual {
            warn!("Manual capo change ignored under {:?} policy", self.config.capo_policy);
            return false;
        }
        if !self.state.capo.shift(delta) {
            return false;
        }
        self.sink.capo_changed(self.state.capo.value());
        true
    }

    /// Run the full pipeline for one frame and hand the resulting events to the sink.
    ///
    /// The frame is consumed; nothing from it survives into the next call.
    pub async fn process_frame(&mut self, frame: LandmarkFrame) -> FrameReport {
        self.state.frame_counter += 1;
        let mut report = FrameReport {
            frame: self.state.frame_counter,
            ..FrameReport::default()
        };

        let timeout = self.config.classify_timeout();
        let frame_height = self.config.frame_height;
        let chord_features = if frame.left.is_empty() {
            None
        } else {
            extract_chord_features(&frame.left)
        };

        let (label, (pluck, stroke)) = {
            let classifier = &self.classifier;
            let strum = &mut self.strum;
            let thresholds = &self.config.pluck_thresholds;

            let classify = async {
                let features = chord_features.as_ref()?;
                match classify_with_timeout(classifier, features, timeout).await {
                    Ok(label) => Some(label),
                    Err(e) => {
                        debug!("No gesture this frame: {}", e);
                        None
                    }
                }
            };
            let motion = async {
                let pluck = if frame.right.is_empty() {
                    None
                } else {
                    extract_pluck_state(&frame.right, thresholds)
                };
                let stroke = if frame.pose.is_empty() {
                    None
                } else {
                    strum.process_pose(&frame.pose, frame_height)
                };
                (pluck, stroke)
            };
            tokio::join!(classify, motion)
        };

        if let Some(adjuster) = &self.capo_adjuster {
            if adjuster.update(report.frame, &frame.pose, &mut self.state.capo) {
                report.events.push(PerformanceEvent::CapoChanged {
                    capo: self.state.capo.value(),
                });
            }
        }

        if let Some(label) = &label {
            if let Some(event) = self.change_chord(label) {
                report.events.push(event);
            }
        }
        if let Some(pluck) = &pluck {
            report.pluck_angles = Some(pluck.angles);
            if let Some(event) = self.pluck(pluck) {
                report.events.push(event);
            }
        }
        if let Some(stroke) = &stroke {
            if let Some(event) = self.strum_event(stroke) {
                report.events.push(event);
            }
        }

        for event in &report.events {
            event.dispatch(&mut self.sink);
        }
        report.label = label;
        report
    }

    /// Edge-triggered: only a label different from the last accepted one rebuilds.
    fn change_chord(&mut self, label: &str) -> Option<PerformanceEvent> {
        if self.state.prev_gesture.as_deref() == Some(label) {
            return None;
        }

        let voicing = match self.mapper.voice_label(label) {
            Ok(voicing) => voicing,
            Err(e) => {
                warn!("Keeping previous chord: {}", e);
                return None;
            }
        };
        if voicing.pluck.is_none() {
            warn!("{} has no playable pluck voicing ({:?})", label, voicing.notes);
        }
        debug!("Chord {} -> {:?}", label, voicing.notes);

        let event = PerformanceEvent::ChordChanged {
            label: label.to_string(),
            notes: voicing.notes.clone(),
            pluck: voicing.pluck,
        };
        self.state.prev_gesture = Some(label.to_string());
        self.state.voicing = Some(voicing);
        Some(event)
    }

    fn pluck(&mut self, state: &PluckState) -> Option<PerformanceEvent> {
        // Raised pinky means the hand is closed / resting, not playing.
        if state.is_vetoed() {
            return None;
        }

        let changed: Vec<usize> = state
            .active
            .symmetric_difference(&self.state.prev_pluck)
            .copied()
            .collect();
        self.state.prev_pluck = state.active.clone();

        if changed.is_empty() {
            return None;
        }
        let Some(pluck_notes) = self.state.voicing.as_ref().and_then(|v| v.pluck) else {
            debug!("Fingers {:?} moved but no pluck voicing is loaded", changed);
            return None;
        };

        let capo = self.state.capo;
        let notes: Vec<NoteOn> = changed
            .iter()
            .filter_map(|&finger| {
                let pitch = *pluck_notes.get(finger)?;
                Some(NoteOn {
                    pitch: capo.apply(pitch),
                    velocity: velocity_from_angle(state.angles[finger]),
                })
            })
            .collect();

        if notes.is_empty() {
            return None;
        }
        Some(PerformanceEvent::Pluck { notes })
    }

    fn strum_event(&mut self, stroke: &StrumStroke) -> Option<PerformanceEvent> {
        let voicing = self.state.voicing.as_ref().filter(|v| !v.notes.is_empty());
        let Some(voicing) = voicing else {
            debug!("Strum {:?} with no chord loaded", stroke.direction);
            return None;
        };

        let capo = self.state.capo;
        let mut pitches: Vec<u8> = voicing.notes.iter().map(|&p| capo.apply(p)).collect();
        if stroke.direction == StrumDirection::Up {
            pitches.reverse();
        }
        self.strum.confirm(stroke);
        Some(PerformanceEvent::Strum {
            direction: stroke.direction,
            pitches,
            per_note_ms: stroke.per_note_ms,
        })
    }
}

/// Drive a session from a frame channel until the channel closes or `shutdown` fires.
///
/// A frame still being classified when shutdown arrives is dropped without
/// emitting anything. Each finished frame's report goes to `on_report`.
/// Returns the number of frames fully processed.
pub async fn run<C, S, F>(
    session: &mut GestureSession<C, S>,
    mut frames: mpsc::Receiver<LandmarkFrame>,
    shutdown: oneshot::Receiver<()>,
    mut on_report: F,
) -> u64
where
    C: GestureClassifier,
    S: PerformanceSink,
    F: FnMut(FrameReport),
{
    let mut shutdown = Some(shutdown);
    let mut processed = 0;
    loop {
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => {
                info!("Session shutdown requested");
                break;
            }
            next = frames.recv() => {
                let Some(frame) = next else {
                    debug!("Frame source closed");
                    break;
                };
                tokio::select! {
                    biased;
                    _ = shutdown_requested(&mut shutdown) => {
                        info!("Session shutdown requested, discarding in-flight frame");
                        break;
                    }
                    report = session.process_frame(frame) => {
                        processed += 1;
                        on_report(report);
                    }
                }
            }
        }
    }
    processed
}

/// Resolves only on an explicit shutdown. A dropped sender disarms the
/// receiver and the session keeps running until the frame source closes.
async fn shutdown_requested(shutdown: &mut Option<oneshot::Receiver<()>>) {
    if let Some(rx) = shutdown.as_mut() {
        if rx.await.is_ok() {
            return;
        }
        debug!("Shutdown sender dropped, running until frames run out");
        *shutdown = None;
    }
    std::future::pending::<()>().await
}
