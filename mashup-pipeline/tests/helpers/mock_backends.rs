//! In-memory backends
//!
//! Media files are small JSON documents describing run-length encoded PCM
//! (`MockMedia`), so every stage can run without yt-dlp or ffmpeg while the
//! durations, formats and merge order stay checkable.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mashup_common::config::PipelineSettings;
use mashup_pipeline::models::{AudioClip, SearchResult, WorkDirs};
use mashup_pipeline::types::{
    AudioBackend, DownloadBackend, SearchBackend, VideoBackend, VideoHandle,
};
use mashup_pipeline::{BackendError, CodecError, WorkflowOrchestrator};
use serde::{Deserialize, Serialize};

/// Sample rate of mock canonical audio (kept low so fixtures stay tiny)
pub const MOCK_CANONICAL_RATE: u32 = 100;
pub const MOCK_CANONICAL_CHANNELS: u16 = 2;

// ============================================================================
// Mock media format
// ============================================================================

/// Run-length encoded PCM: `(level, frames)` pairs, every channel equal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockMedia {
    pub sample_rate: u32,
    pub channels: u16,
    pub runs: Vec<(f32, usize)>,
}

impl MockMedia {
    pub fn tone(level: f32, seconds: u64, sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            runs: vec![(level, seconds as usize * sample_rate as usize)],
        }
    }

    pub fn frames(&self) -> usize {
        self.runs.iter().map(|(_, frames)| frames).sum()
    }

    pub fn duration_ms(&self) -> u64 {
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    /// Levels in playback order, one entry per run
    pub fn levels(&self) -> Vec<f32> {
        self.runs.iter().map(|(level, _)| *level).collect()
    }

    pub fn to_clip(&self) -> AudioClip {
        let mut samples = Vec::with_capacity(self.frames() * self.channels as usize);
        for (level, frames) in &self.runs {
            for _ in 0..(*frames * self.channels as usize) {
                samples.push(*level);
            }
        }
        AudioClip::new(samples, self.sample_rate, self.channels)
    }

    pub fn from_clip(clip: &AudioClip) -> Self {
        let mut runs: Vec<(f32, usize)> = Vec::new();
        for frame in clip.samples().chunks(clip.channels() as usize) {
            let level = frame[0];
            match runs.last_mut() {
                Some((last, frames)) if *last == level => *frames += 1,
                _ => runs.push((level, 1)),
            }
        }
        Self {
            sample_rate: clip.sample_rate(),
            channels: clip.channels(),
            runs,
        }
    }

    pub fn read(path: &Path) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let bytes = serde_json::to_vec(self).map_err(std::io::Error::other)?;
        std::fs::write(path, bytes)
    }
}

/// Write a canonical-format mock file
pub fn write_media(path: &Path, level: f32, seconds: u64) {
    MockMedia::tone(level, seconds, MOCK_CANONICAL_RATE, MOCK_CANONICAL_CHANNELS)
        .write(path)
        .unwrap();
}

/// Search result pointing at the mock video host
pub fn result(id: &str, duration_secs: Option<f64>) -> SearchResult {
    SearchResult {
        id: id.to_string(),
        title: format!("Clip {}", id),
        duration_secs,
        webpage_url: Some(format!("https://video.test/watch?v={}", id)),
        url: None,
    }
}

// ============================================================================
// Call log
// ============================================================================

/// Shared, clonable record of backend calls
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Clone)]
pub struct MockSearch {
    results: Option<Vec<SearchResult>>,
    pub calls: CallLog,
}

impl MockSearch {
    pub fn returning(results: Vec<SearchResult>) -> Self {
        Self {
            results: Some(results),
            calls: CallLog::default(),
        }
    }

    /// Search that always fails
    pub fn failing() -> Self {
        Self {
            results: None,
            calls: CallLog::default(),
        }
    }
}

impl SearchBackend for MockSearch {
    fn name(&self) -> &'static str {
        "mock-search"
    }

    fn search(&self, query: &str, desired_count: usize) -> Result<Vec<SearchResult>, BackendError> {
        self.calls.push(format!("search:{}:{}", query, desired_count));
        match &self.results {
            Some(results) => Ok(results.iter().take(desired_count).cloned().collect()),
            None => Err(BackendError::CommandFailed {
                tool: "mock-search",
                status: Some(1),
                stderr: "search unavailable".to_string(),
            }),
        }
    }
}

// ============================================================================
// Download
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MockDownloader {
    /// Ids whose fetch fails
    pub failing_ids: HashSet<String>,
    /// Ids delivered as an audio container (`.webm`); others arrive as `.mp4`
    pub audio_ids: HashSet<String>,
    /// Ids whose download is corrupt (undecodable)
    pub corrupt_ids: HashSet<String>,
    /// Clip length per id; default 60 s
    pub seconds: HashMap<String, u64>,
    /// Ids produced by `fetch_by_query`
    pub query_ids: Vec<String>,
    /// Report success without writing anything
    pub silent_success: bool,
    /// Behave as if the binary were not installed
    pub tool_missing: bool,
    pub calls: CallLog,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_raw(&self, id: &str, raw_dir: &Path) -> std::io::Result<()> {
        let ext = if self.audio_ids.contains(id) { "webm" } else { "mp4" };
        let path = raw_dir.join(format!("{}.{}", id, ext));
        if self.corrupt_ids.contains(id) {
            return std::fs::write(path, b"corrupt download");
        }
        let seconds = self.seconds.get(id).copied().unwrap_or(60);
        MockMedia::tone(level_for(id), seconds, MOCK_CANONICAL_RATE, 1).write(&path)
    }

    fn missing(&self) -> BackendError {
        BackendError::ToolMissing {
            tool: "yt-dlp",
            path: PathBuf::from("/missing/yt-dlp"),
        }
    }
}

/// Distinct, deterministic level per id so merge order is observable
pub fn level_for(id: &str) -> f32 {
    let sum: u32 = id.bytes().map(u32::from).sum();
    (sum % 997) as f32 / 1000.0
}

impl DownloadBackend for MockDownloader {
    fn name(&self) -> &'static str {
        "mock-downloader"
    }

    fn fetch(&self, url: &str, raw_dir: &Path) -> Result<(), BackendError> {
        if self.tool_missing {
            return Err(self.missing());
        }
        let id = url.rsplit("v=").next().unwrap_or(url).to_string();
        self.calls.push(format!("fetch:{}", id));

        if self.failing_ids.contains(&id) {
            return Err(BackendError::CommandFailed {
                tool: "yt-dlp",
                status: Some(1),
                stderr: format!("ERROR: [youtube] {}: Video unavailable", id),
            });
        }
        if self.silent_success {
            return Ok(());
        }
        self.write_raw(&id, raw_dir)?;
        Ok(())
    }

    fn fetch_by_query(
        &self,
        query: &str,
        count: usize,
        raw_dir: &Path,
    ) -> Result<(), BackendError> {
        if self.tool_missing {
            return Err(self.missing());
        }
        self.calls.push(format!("query:{}:{}", query, count));
        for id in self.query_ids.iter().take(count) {
            self.write_raw(id, raw_dir)?;
        }
        Ok(())
    }
}

// ============================================================================
// Codec
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MockCodec {
    pub tool_missing: bool,
    pub calls: CallLog,
    /// Video handles currently open
    pub open_handles: Arc<AtomicUsize>,
    /// Files under these directories fail to decode
    pub unreadable_dirs: Vec<PathBuf>,
}

impl MockCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_tool(&self) -> Result<(), CodecError> {
        if self.tool_missing {
            return Err(CodecError::ToolMissing {
                tool: "ffmpeg",
                path: PathBuf::from("/missing/ffmpeg"),
            });
        }
        Ok(())
    }

    fn check_readable(&self, path: &Path) -> Result<(), CodecError> {
        if self.unreadable_dirs.iter().any(|dir| path.starts_with(dir)) {
            return Err(CodecError::Decode {
                path: path.to_path_buf(),
                reason: "unreadable stage directory".to_string(),
            });
        }
        Ok(())
    }

    fn read_media(path: &Path) -> Result<MockMedia, CodecError> {
        MockMedia::read(path).ok_or_else(|| CodecError::Decode {
            path: path.to_path_buf(),
            reason: "not a mock media file".to_string(),
        })
    }

    /// Convert any mock media to the canonical rate and layout
    fn write_canonical(src: &Path, dst: &Path) -> Result<(), CodecError> {
        let media = Self::read_media(src)?;
        let scale =
            |frames: usize| frames * MOCK_CANONICAL_RATE as usize / media.sample_rate as usize;
        let canonical = MockMedia {
            sample_rate: MOCK_CANONICAL_RATE,
            channels: MOCK_CANONICAL_CHANNELS,
            runs: media.runs.iter().map(|(level, frames)| (*level, scale(*frames))).collect(),
        };
        canonical.write(dst)?;
        Ok(())
    }
}

impl AudioBackend for MockCodec {
    fn name(&self) -> &'static str {
        "mock-codec"
    }

    fn load(&self, path: &Path) -> Result<AudioClip, CodecError> {
        self.calls.push(format!("load:{}", path.display()));
        self.check_readable(path)?;
        Ok(Self::read_media(path)?.to_clip())
    }

    fn load_head(&self, path: &Path, max_ms: u64) -> Result<AudioClip, CodecError> {
        self.calls.push(format!("load_head:{}", path.display()));
        self.check_readable(path)?;
        let frame_ms = 1000 / MOCK_CANONICAL_RATE as u64;
        Ok(Self::read_media(path)?.to_clip().slice_ms(0, max_ms + frame_ms))
    }

    fn export(&self, clip: &AudioClip, path: &Path) -> Result<(), CodecError> {
        self.check_tool()?;
        self.calls.push(format!("export:{}", path.display()));
        MockMedia::from_clip(clip).write(path)?;
        Ok(())
    }

    fn transcode(&self, src: &Path, dst: &Path) -> Result<(), CodecError> {
        self.check_tool()?;
        self.calls.push(format!("transcode:{}", src.display()));
        Self::write_canonical(src, dst)
    }
}

pub struct MockVideoHandle {
    path: PathBuf,
    open_handles: Arc<AtomicUsize>,
}

impl VideoHandle for MockVideoHandle {
    fn export_audio(&mut self, dst: &Path) -> Result<(), CodecError> {
        MockCodec::write_canonical(&self.path, dst)
    }
}

impl Drop for MockVideoHandle {
    fn drop(&mut self) {
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

impl VideoBackend for MockCodec {
    fn name(&self) -> &'static str {
        "mock-video"
    }

    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn VideoHandle + 'a>, CodecError> {
        self.check_tool()?;
        self.calls.push(format!("open:{}", path.display()));
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockVideoHandle {
            path: path.to_path_buf(),
            open_handles: Arc::clone(&self.open_handles),
        }))
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Orchestrator over mock backends with no conversion pause
pub fn build_orchestrator(
    root: &Path,
    search: &MockSearch,
    downloader: &MockDownloader,
    codec: &MockCodec,
) -> WorkflowOrchestrator {
    let settings = PipelineSettings {
        conversion_pause_ms: 0,
        ..PipelineSettings::default()
    };
    WorkflowOrchestrator::new(
        WorkDirs::new(root),
        settings,
        Box::new(search.clone()),
        Box::new(downloader.clone()),
        Box::new(codec.clone()),
        Box::new(codec.clone()),
    )
}
