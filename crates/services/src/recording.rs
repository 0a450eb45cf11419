//! Capture device boundary for voice interview answers.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use prep_core::model::AudioClip;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("audio capture unsupported: {0}")]
    Unsupported(String),
    #[error("device did not start within {0:?}")]
    TimedOut(Duration),
    #[error("device is not capturing")]
    NotCapturing,
    #[error("capture failed: {0}")]
    Failed(String),
}

/// Audio capture source. One clip per `start`/`stop` pair.
#[async_trait]
pub trait RecordingDevice: Send + Sync {
    /// Begin capturing.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError` when the device is denied, missing or broken.
    async fn start(&mut self) -> Result<(), CaptureError>;

    /// Stop capturing and hand over the recorded clip.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError::NotCapturing` when no capture is running.
    async fn stop(&mut self) -> Result<AudioClip, CaptureError>;

    /// Stop capturing and drop whatever was recorded.
    async fn discard(&mut self);

    /// Make the clip handed out by the last `stop` the next one to record.
    ///
    /// Called when that clip was not accepted, so the same answer can be
    /// recorded again. Live devices capture afresh and need not do anything.
    async fn rewind(&mut self) {}

    fn is_capturing(&self) -> bool;

    /// Device name for logging.
    fn name(&self) -> &str;
}

//
// ─── FILE DEVICE ───────────────────────────────────────────────────────────────
//

/// Plays back pre-recorded answer files, one per recording.
#[derive(Debug)]
pub struct ClipFileDevice {
    pending: VecDeque<PathBuf>,
    current: Option<PathBuf>,
    last: Option<PathBuf>,
}

impl ClipFileDevice {
    #[must_use]
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            pending: paths.into_iter().collect(),
            current: None,
            last: None,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("webm") => "audio/webm",
        Some("wav") => "audio/wav",
        Some("ogg" | "oga") => "audio/ogg",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl RecordingDevice for ClipFileDevice {
    async fn start(&mut self) -> Result<(), CaptureError> {
        if self.current.is_some() {
            return Ok(());
        }
        let path = self
            .pending
            .pop_front()
            .ok_or_else(|| CaptureError::Unsupported("no more answer files".into()))?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(CaptureError::Unsupported(format!(
                    "{} is not a file",
                    path.display()
                )));
            }
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(CaptureError::PermissionDenied);
            }
            Err(err) => {
                return Err(CaptureError::Failed(format!("{}: {err}", path.display())));
            }
        }
        debug!(path = %path.display(), "capture started");
        self.last = None;
        self.current = Some(path);
        Ok(())
    }

    async fn stop(&mut self) -> Result<AudioClip, CaptureError> {
        let path = self.current.take().ok_or(CaptureError::NotCapturing)?;
        self.last = Some(path.clone());
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| CaptureError::Failed(format!("{}: {err}", path.display())))?;
        debug!(path = %path.display(), bytes = bytes.len(), "capture stopped");
        Ok(AudioClip::new(bytes, mime_for(&path)))
    }

    async fn discard(&mut self) {
        if let Some(path) = self.current.take() {
            debug!(path = %path.display(), "capture discarded");
        }
    }

    async fn rewind(&mut self) {
        if let Some(path) = self.last.take() {
            debug!(path = %path.display(), "capture rewound");
            self.pending.push_front(path);
        }
    }

    fn is_capturing(&self) -> bool {
        self.current.is_some()
    }

    fn name(&self) -> &str {
        "clip-file"
    }
}

//
// ─── MEMORY DEVICE ─────────────────────────────────────────────────────────────
//

/// What the next `start` call does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartBehavior {
    Succeed,
    Fail(CaptureError),
    /// Never completes; exercises the start timeout.
    Hang,
}

/// Scriptable in-memory device for tests and offline runs.
#[derive(Debug)]
pub struct MemoryDevice {
    clips: VecDeque<AudioClip>,
    starts: VecDeque<StartBehavior>,
    capturing: bool,
    discarded: usize,
    last: Option<AudioClip>,
}

impl MemoryDevice {
    #[must_use]
    pub fn new(clips: impl IntoIterator<Item = AudioClip>) -> Self {
        Self {
            clips: clips.into_iter().collect(),
            starts: VecDeque::new(),
            capturing: false,
            discarded: 0,
            last: None,
        }
    }

    /// Queue the behavior of an upcoming `start`. Unscripted starts succeed.
    pub fn script_start(&mut self, behavior: StartBehavior) {
        self.starts.push_back(behavior);
    }

    #[must_use]
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

#[async_trait]
impl RecordingDevice for MemoryDevice {
    async fn start(&mut self) -> Result<(), CaptureError> {
        match self.starts.pop_front().unwrap_or(StartBehavior::Succeed) {
            StartBehavior::Succeed => {
                self.capturing = true;
                self.last = None;
                Ok(())
            }
            StartBehavior::Fail(err) => Err(err),
            StartBehavior::Hang => std::future::pending().await,
        }
    }

    async fn stop(&mut self) -> Result<AudioClip, CaptureError> {
        if !self.capturing {
            return Err(CaptureError::NotCapturing);
        }
        self.capturing = false;
        let clip = self
            .clips
            .pop_front()
            .unwrap_or_else(|| AudioClip::webm(vec![0; 16]));
        self.last = Some(clip.clone());
        Ok(clip)
    }

    async fn discard(&mut self) {
        if self.capturing {
            self.capturing = false;
            self.discarded += 1;
        }
    }

    async fn rewind(&mut self) {
        if let Some(clip) = self.last.take() {
            self.clips.push_front(clip);
        }
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for(Path::new("a/answer.WEBM")), "audio/webm");
        assert_eq!(mime_for(Path::new("answer.wav")), "audio/wav");
        assert_eq!(mime_for(Path::new("answer")), "application/octet-stream");
    }

    #[tokio::test]
    async fn file_device_reads_one_file_per_recording() {
        let dir = std::env::temp_dir().join(format!("prep-clip-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("q1.webm");
        tokio::fs::write(&path, b"voice").await.unwrap();

        let mut device = ClipFileDevice::new([path]);
        device.start().await.unwrap();
        assert!(device.is_capturing());
        let clip = device.stop().await.unwrap();
        assert_eq!(clip.bytes(), b"voice");
        assert_eq!(clip.mime_type(), "audio/webm");

        assert!(matches!(
            device.start().await,
            Err(CaptureError::Unsupported(_))
        ));
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn rewound_file_is_recorded_again() {
        let dir = std::env::temp_dir().join(format!("prep-rewind-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let mut paths = Vec::new();
        for name in ["a", "b"] {
            let path = dir.join(format!("{name}.webm"));
            tokio::fs::write(&path, name).await.unwrap();
            paths.push(path);
        }

        let mut device = ClipFileDevice::new(paths);
        device.start().await.unwrap();
        assert_eq!(device.stop().await.unwrap().bytes(), b"a");
        device.rewind().await;
        assert_eq!(device.remaining(), 2);

        device.start().await.unwrap();
        assert_eq!(device.stop().await.unwrap().bytes(), b"a");
        device.start().await.unwrap();
        // Starting again forgets the previous clip.
        device.rewind().await;
        assert_eq!(device.stop().await.unwrap().bytes(), b"b");
        assert_eq!(device.remaining(), 0);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn memory_device_stop_without_start_fails() {
        let mut device = MemoryDevice::new([]);
        assert_eq!(device.stop().await.unwrap_err(), CaptureError::NotCapturing);
    }
}
