//! Recorded landmark streams and session summary files.
//!
//! The engine itself never touches the filesystem; these helpers feed it from
//! a recording and persist what it produced.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::pose::{Landmark, LandmarkSet};
use crate::session::SessionSummary;

// --- データ構造 ---

/// 検出器が出力した1フレーム
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// 録画開始からの時刻（ミリ秒）
    pub timestamp_ms: u64,
    /// 検出器の順序のままのランドマーク。人物未検出なら空
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

impl RecordedFrame {
    pub fn at(&self) -> Duration {
        Duration::from_millis(self.timestamp_ms)
    }

    /// 人物が検出されていないフレームは None
    pub fn landmark_set(&self) -> Option<LandmarkSet> {
        if self.landmarks.is_empty() {
            None
        } else {
            Some(LandmarkSet::from_slice(&self.landmarks))
        }
    }
}

/// 録画ファイル
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// 録画時に選ばれていた種目 (任意)
    #[serde(default)]
    pub exercise: Option<String>,
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    /// フレームが時刻順に並んでいるか
    pub fn is_ordered(&self) -> bool {
        self.frames
            .windows(2)
            .all(|w| w[0].timestamp_ms <= w[1].timestamp_ms)
    }
}

// --- Save / Load ---

pub fn load_recording<P: AsRef<Path>>(path: P) -> Result<Recording> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read recording {}", path.display()))?;
    let recording: Recording = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse recording {}", path.display()))?;
    if !recording.is_ordered() {
        bail!("recording {} has frames out of timestamp order", path.display());
    }
    Ok(recording)
}

pub fn save_summary<P: AsRef<Path>>(path: P, summary: &SessionSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path.as_ref(), json).context("Failed to write session summary")?;
    Ok(())
}
