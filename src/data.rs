// src/data.rs - Session event log with CSV export and a JSON summary
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Serialize;

use crate::session::FrameReport;
use crate::sink::PerformanceEvent;

#[derive(Debug, Serialize)]
struct EventRecord {
    frame: u64,
    timestamp: f64,
    kind: &'static str,
    label: Option<String>,
    direction: Option<String>,
    pitches: String,
    velocities: String,
    per_note_ms: Option<f64>,
    capo: Option<i8>,
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct SessionSummary {
    pub session: String,
    pub frames: u64,
    pub frames_with_label: u64,
    pub chord_changes: usize,
    pub plucks: usize,
    pub strums: usize,
    pub capo_changes: usize,
    pub chords: Vec<String>,
}

pub struct EventLog {
    output_dir: PathBuf,
    session_name: String,
    frames: Vec<(f64, FrameReport)>,
}

fn join_numbers<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl EventLog {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            frames: Vec::new(),
        }
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn add_frame(&mut self, report: FrameReport, timestamp: f64) {
        self.frames.push((timestamp, report));
    }

    pub fn event_count(&self) -> usize {
        self.frames.iter().map(|(_, r)| r.events.len()).sum()
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self.session_dir().join("events.csv");
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = File::create(&csv_path)
            .with_context(|| format!("Failed to create {}", csv_path.display()))?;
        let mut writer = Writer::from_writer(file);

        for (timestamp, report) in &self.frames {
            for event in &report.events {
                writer.serialize(Self::create_record(report.frame, *timestamp, event))?;
            }
        }

        writer.flush()?;
        Ok(csv_path)
    }

    fn create_record(frame: u64, timestamp: f64, event: &PerformanceEvent) -> EventRecord {
        let mut record = EventRecord {
            frame,
            timestamp,
            kind: event.kind(),
            label: None,
            direction: None,
            pitches: String::new(),
            velocities: String::new(),
            per_note_ms: None,
            capo: None,
        };

        match event {
            PerformanceEvent::ChordChanged { label, notes, .. } => {
                record.label = Some(label.clone());
                record.pitches = join_numbers(notes.iter());
            }
            PerformanceEvent::Pluck { notes } => {
                record.pitches = join_numbers(notes.iter().map(|n| n.pitch));
                record.velocities = join_numbers(notes.iter().map(|n| n.velocity));
            }
            PerformanceEvent::Strum { direction, pitches, per_note_ms } => {
                record.direction = Some(format!("{:?}", direction));
                record.pitches = join_numbers(pitches.iter());
                record.per_note_ms = Some(*per_note_ms);
            }
            PerformanceEvent::CapoChanged { capo } => {
                record.capo = Some(*capo);
            }
        }

        record
    }

    pub fn summary(&self) -> SessionSummary {
        let mut summary = SessionSummary {
            session: self.session_name.clone(),
            frames: self.frames.len() as u64,
            ..SessionSummary::default()
        };

        for (_, report) in &self.frames {
            if report.label.is_some() {
                summary.frames_with_label += 1;
            }
            for event in &report.events {
                match event {
                    PerformanceEvent::ChordChanged { label, .. } => {
                        summary.chord_changes += 1;
                        if !summary.chords.contains(label) {
                            summary.chords.push(label.clone());
                        }
                    }
                    PerformanceEvent::Pluck { .. } => summary.plucks += 1,
                    PerformanceEvent::Strum { .. } => summary.strums += 1,
                    PerformanceEvent::CapoChanged { .. } => summary.capo_changes += 1,
                }
            }
        }

        summary
    }

    pub fn write_summary(&self) -> Result<PathBuf> {
        let path = self.session_dir().join("summary.json");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.summary())?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}
