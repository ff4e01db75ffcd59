//! # air_guitar
//!
//! Turns per-frame hand and body landmarks into guitar playing:
//!
//! | Input | Module | Output |
//! |---|---|---|
//! | Left hand | [`features`] → classifier → [`chord`] | chord change (voicing + pluck strings) |
//! | Right hand finger curl | [`features`] → [`session`] | pluck notes |
//! | Right arm swing (pose) | [`strum`] | strum up / down with string spacing |
//! | Wrists vs nose, or explicit calls | [`capo`] | transpose offset |
//!
//! Camera capture, landmark detection, the chord classifier model and audio
//! output all live outside this crate; [`classifier::GestureClassifier`] and
//! [`sink::PerformanceSink`] are the seams.

pub mod capo;
pub mod chord;
pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod geometry;
pub mod landmarks;
pub mod session;
pub mod sink;
pub mod strum;

pub use chord::{ChordLabel, ChordMapper, ChordQuality, ChordVoicing};
pub use classifier::{GestureClassifier, TemplateClassifier};
pub use config::SessionConfig;
pub use landmarks::{Landmark, LandmarkFrame, LandmarkSet};
pub use session::{FrameReport, GestureSession};
pub use sink::{LoggingSink, PerformanceEvent, PerformanceSink, RecordingSink};
