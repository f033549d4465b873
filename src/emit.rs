//! Writes the frames of a sweep as an ordered image sequence.

use std::path::{Path, PathBuf};

use log::info;
use rayon::prelude::*;

use crate::error::Result;
use crate::render::Scene;
use crate::sweep::{Frame, Sweep};

/// Base name of the frames for a network file: its file name without the
/// `.xgmml` extension.
pub fn network_stem(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.strip_suffix(".xgmml") {
        Some(stem) => stem.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file_name),
    }
}

/// File names `<stem>.<index>.<score>.png`, zero-padded so that sorting
/// the names reproduces the sweep order.
#[derive(Debug, Clone)]
pub struct FrameNaming {
    stem: String,
    index_width: usize,
    score_width: usize,
}

fn digits(mut n: u64) -> usize {
    let mut d = 1;
    while n >= 10 {
        n /= 10;
        d += 1;
    }
    d
}

impl FrameNaming {
    pub fn new(stem: impl Into<String>, sweep: &Sweep<'_>) -> Self {
        let max_score = sweep
            .thresholds()
            .iter()
            .fold(0.0f64, |acc, t| acc.max(t.abs()));
        FrameNaming {
            stem: stem.into(),
            index_width: digits(sweep.len().saturating_sub(1) as u64),
            score_width: digits(max_score.trunc() as u64),
        }
    }

    pub fn file_name(&self, index: usize, threshold: f64) -> String {
        let score = if threshold.fract() == 0.0 {
            format!("{:0w$}", threshold as i64, w = self.score_width)
        } else {
            format!("{:0w$.2}", threshold, w = self.score_width + 3)
        };
        format!(
            "{}.{:0iw$}.{}.png",
            self.stem,
            index,
            score,
            iw = self.index_width
        )
    }
}

/// Render every frame of `sweep` into `dir`, which must already exist.
///
/// Frames are written in sweep order unless `parallel` is set, in which
/// case they are spread over the rayon pool. The first failure stops the
/// sweep; frames already written stay on disk.
pub fn emit_sequence(
    sweep: &Sweep<'_>,
    scene: &Scene<'_>,
    dir: &Path,
    naming: &FrameNaming,
    label: &str,
    parallel: bool,
) -> Result<Vec<PathBuf>> {
    let total = sweep.len();
    let write = |frame: &Frame<'_>| -> Result<PathBuf> {
        let path = dir.join(naming.file_name(frame.index, frame.threshold));
        scene.write(frame, &path)?;
        info!(
            "Score done for {} ::: {}/{} : {:.2}%",
            label,
            frame.index + 1,
            total,
            (frame.index + 1) as f64 / total as f64 * 100.0
        );
        Ok(path)
    };

    if parallel {
        let frames: Vec<Frame<'_>> = sweep.frames().collect();
        frames.par_iter().map(write).collect()
    } else {
        sweep.frames().map(|frame| write(&frame)).collect()
    }
}
