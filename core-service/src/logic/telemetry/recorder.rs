//! Engine Event Recorder
//!
//! Append-only JSONL writer, flushed after every line, rotated by size.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::event::EngineEvent;
use crate::constants;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Maximum file size before rotation (50 MB)
const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub(crate) const LOG_EXT: &str = "jsonl";

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl JournalConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: constants::is_journal_enabled(),
            dir: constants::get_journal_dir(),
        }
    }
}

// ============================================================================
// RECORDER
// ============================================================================

pub struct Recorder {
    writer: BufWriter<File>,
    current_file: PathBuf,
    current_size: u64,
    max_file_size: u64,
    base_dir: PathBuf,
    sequence: u32,
}

impl Recorder {
    pub fn new(base_dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&base_dir)?;
        let (file_path, file) = Self::open_new_file(&base_dir, 0)?;

        Ok(Self {
            writer: BufWriter::new(file),
            current_file: file_path,
            current_size: 0,
            max_file_size: MAX_FILE_SIZE,
            base_dir,
            sequence: 0,
        })
    }

    fn open_new_file(base_dir: &Path, sequence: u32) -> std::io::Result<(PathBuf, File)> {
        let filename = format!(
            "safety_{}_{:03}.{}",
            Utc::now().format("%Y_%m_%d_%H%M%S"),
            sequence,
            LOG_EXT
        );
        let file_path = base_dir.join(filename);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        log::info!("Opened safety journal: {:?}", file_path);
        Ok((file_path, file))
    }

    pub fn record(&mut self, event: &EngineEvent) -> std::io::Result<()> {
        let line = event.to_jsonl();
        let bytes = line.as_bytes();

        if self.current_size > 0 && self.current_size + bytes.len() as u64 + 1 > self.max_file_size {
            self.rotate()?;
        }

        self.writer.write_all(bytes)?;
        self.writer.write_all(b"\n")?;
        self.current_size += bytes.len() as u64 + 1;
        self.writer.flush()?;
        Ok(())
    }

    /// Record, logging instead of returning a write failure
    pub fn record_logged(&mut self, event: &EngineEvent) {
        if let Err(e) = self.record(event) {
            log::error!("Failed to record {} event: {}", event.event_type.as_str(), e);
        }
    }

    fn rotate(&mut self) -> std::io::Result<()> {
        self.writer.flush()?;

        self.sequence += 1;
        let (new_path, new_file) = Self::open_new_file(&self.base_dir, self.sequence)?;
        self.writer = BufWriter::new(new_file);

        log::info!("Rotated from {:?} to {:?}", self.current_file, new_path);
        self.current_file = new_path;
        self.current_size = 0;

        Ok(())
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            log::error!("Failed to flush safety journal: {}", e);
        }
    }
}

/// Open the journal if enabled; failure disables journaling, never the engine
pub fn open(config: &JournalConfig) -> Option<Recorder> {
    if !config.enabled {
        log::info!("Safety journal disabled");
        return None;
    }
    match Recorder::new(config.dir.clone()) {
        Ok(recorder) => Some(recorder),
        Err(e) => {
            log::error!("Failed to open safety journal in {:?}: {}", config.dir, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::telemetry::event::EventType;
    use crate::logic::testing::read_journal;
    use tempfile::TempDir;

    #[test]
    fn test_recorder_creation() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = Recorder::new(temp_dir.path().to_path_buf()).unwrap();
        assert!(recorder.current_file.exists());
        assert!(read_journal(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_jsonl_format() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder = Recorder::new(temp_dir.path().to_path_buf()).unwrap();

        for i in 0..3 {
            recorder.record(&EngineEvent::frame_skipped(Some(i), "missing field HR")).unwrap();
        }

        let content = std::fs::read_to_string(&recorder.current_file).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            assert!(serde_json::from_str::<EngineEvent>(line).is_ok());
        }

        let events = read_journal(temp_dir.path());
        assert_eq!(events[2].employee_id, Some(2));
        assert_eq!(events[0].event_type, EventType::FrameSkipped);
    }

    #[test]
    fn test_rotation_by_size() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder = Recorder::new(temp_dir.path().to_path_buf()).unwrap();
        recorder.max_file_size = 200;
        let first = recorder.current_file.clone();

        for i in 0..5 {
            recorder.record(&EngineEvent::frame_skipped(Some(i), "missing field SLEEP")).unwrap();
        }

        assert_ne!(recorder.current_file, first);
        assert!(recorder.sequence >= 1);
        let files = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert!(files >= 2);
        assert_eq!(read_journal(temp_dir.path()).len(), 5);
    }

    #[test]
    fn test_disabled_journal_opens_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = JournalConfig {
            enabled: false,
            dir: temp_dir.path().join("journal"),
        };
        assert!(open(&config).is_none());
        assert!(!config.dir.exists());
    }
}
