//! Batch Coordinator
//!
//! Runs the attribution pipeline over many frames. Frames are independent,
//! so they are handed to a pool of worker threads over a channel; reports
//! are put back in input order before they are returned.

use crossbeam_channel::unbounded;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::capture::Frame;
use crate::error::Result;
use crate::vision::{AttributionStats, BubblePipeline, FrameAttribution, LayoutProvider, SpeechBubble};

/// What happened to one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameReport {
    /// Frame identifier (its path)
    pub frame: String,
    #[serde(flatten)]
    pub outcome: FrameOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FrameOutcome {
    Attributed {
        speech_bubbles: Vec<SpeechBubble>,
        stats: AttributionStats,
    },
    Failed {
        error: String,
    },
}

impl FrameReport {
    fn new(frame: String, result: Result<FrameAttribution>) -> Self {
        let outcome = match result {
            Ok(attribution) => FrameOutcome::Attributed {
                speech_bubbles: attribution.bubbles,
                stats: attribution.stats,
            },
            Err(e) => FrameOutcome::Failed {
                error: e.to_string(),
            },
        };
        Self { frame, outcome }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, FrameOutcome::Failed { .. })
    }
}

/// Totals over a batch of frame reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub frames: usize,
    pub failed_frames: usize,
    pub blocks: AttributionStats,
}

impl BatchSummary {
    pub fn from_reports(reports: &[FrameReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.frames += 1;
            match &report.outcome {
                FrameOutcome::Attributed { stats, .. } => {
                    summary.blocks.text_blocks += stats.text_blocks;
                    summary.blocks.attributed += stats.attributed;
                    summary.blocks.degenerate_regions += stats.degenerate_regions;
                    summary.blocks.unmatched_markers += stats.unmatched_markers;
                    summary.blocks.disagreeing_markers += stats.disagreeing_markers;
                }
                FrameOutcome::Failed { .. } => summary.failed_frames += 1,
            }
        }
        summary
    }
}

/// Runs the pipeline over batches of frame files
pub struct BatchRunner {
    pipeline: Arc<BubblePipeline>,
    provider: Arc<dyn LayoutProvider>,
    workers: usize,
}

impl BatchRunner {
    pub fn new(pipeline: BubblePipeline, provider: Arc<dyn LayoutProvider>, workers: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            provider,
            workers: workers.max(1),
        }
    }

    /// Attribute a single decoded frame
    pub fn process_frame(&self, frame: &Frame) -> Result<FrameAttribution> {
        let layout = self.provider.layout_for(frame)?;
        self.pipeline.attribute(frame, &layout)
    }

    /// Decode and attribute a frame file; failures are captured in the report
    pub fn process_path(&self, path: &Path) -> FrameReport {
        let id = path.display().to_string();
        let result = Frame::open(path).and_then(|frame| self.process_frame(&frame));

        match &result {
            Ok(attribution) => info!(
                "{}: {} speech bubble(s) from {} text block(s)",
                id,
                attribution.bubbles.len(),
                attribution.stats.text_blocks
            ),
            Err(e) => error!("{}", e),
        }

        FrameReport::new(id, result)
    }

    /// Process all frames, returning one report per path in input order
    pub fn run(&self, paths: &[PathBuf]) -> Vec<FrameReport> {
        let workers = self.workers.min(paths.len()).max(1);
        info!("Processing {} frame(s) on {} worker(s)", paths.len(), workers);

        let (job_tx, job_rx) = unbounded::<(usize, PathBuf)>();
        let (report_tx, report_rx) = unbounded::<(usize, FrameReport)>();

        for job in paths.iter().cloned().enumerate() {
            // Receivers are alive until the scope below ends
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let report_tx = report_tx.clone();
                scope.spawn(move || {
                    for (index, path) in job_rx.iter() {
                        if report_tx.send((index, self.process_path(&path))).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(report_tx);

        let mut reports: Vec<Option<FrameReport>> = vec![None; paths.len()];
        for (index, report) in report_rx.iter() {
            reports[index] = Some(report);
        }
        reports.into_iter().flatten().collect()
    }
}
