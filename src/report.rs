//! Per-item outcomes and run status.
//!
//! Converters never propagate item failures. Every image, PDF or page that
//! was attempted ends up as one [`ItemOutcome`] in the [`RunReport`], and a
//! run that stopped before doing any work says why in [`RunStatus`].

use crate::error::ConvertError;
use crate::settings::WorkMode;
use std::fmt;
use std::path::PathBuf;

/// How far a run got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every discovered input was attempted.
    Completed,
    /// The configured input directory does not exist.
    InputDirMissing,
    /// The input directory exists but could not be listed.
    InputUnreadable,
    /// The output directory could not be created.
    OutputDirUnavailable,
    /// No matching input files were found.
    NoInputs,
    /// No PDF rasteriser could be bound.
    RasterizerUnavailable,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStatus::Completed => "completed",
            RunStatus::InputDirMissing => "input directory missing",
            RunStatus::InputUnreadable => "input directory unreadable",
            RunStatus::OutputDirUnavailable => "output directory unavailable",
            RunStatus::NoInputs => "nothing to convert",
            RunStatus::RasterizerUnavailable => "pdfium library unavailable",
        })
    }
}

/// Result of one unit of work.
#[derive(Debug)]
pub enum ItemStatus {
    /// The target was written at its configured path.
    Written,
    /// The configured path was taken; the output went to `target` instead.
    Renamed { requested: PathBuf },
    /// The target already existed and overwriting is disabled.
    Skipped,
    /// Conversion or saving failed.
    Failed(ConvertError),
}

/// One image, PDF or page.
#[derive(Debug)]
pub struct ItemOutcome {
    /// Input file, or the input directory for a merged PDF.
    pub source: PathBuf,
    /// Output file, when one was determined.
    pub target: Option<PathBuf>,
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn written(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: Some(target.into()),
            status: ItemStatus::Written,
        }
    }

    pub fn skipped(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: Some(target.into()),
            status: ItemStatus::Skipped,
        }
    }

    pub fn failed(
        source: impl Into<PathBuf>,
        target: Option<PathBuf>,
        error: ConvertError,
    ) -> Self {
        Self {
            source: source.into(),
            target,
            status: ItemStatus::Failed(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ItemStatus::Failed(_))
    }

    /// The error of a failed item.
    pub fn error(&self) -> Option<&ConvertError> {
        match &self.status {
            ItemStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Counts per [`ItemStatus`] kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub written: usize,
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} renamed, {} skipped, {} failed",
            self.written, self.renamed, self.skipped, self.failed
        )
    }
}

/// Everything a converter did in one run.
#[derive(Debug)]
pub struct RunReport {
    pub mode: WorkMode,
    pub status: RunStatus,
    pub items: Vec<ItemOutcome>,
}

impl RunReport {
    pub fn new(mode: WorkMode) -> Self {
        Self {
            mode,
            status: RunStatus::Completed,
            items: Vec::new(),
        }
    }

    /// A run that stopped before attempting any item.
    pub fn stopped(mode: WorkMode, status: RunStatus) -> Self {
        Self {
            mode,
            status,
            items: Vec::new(),
        }
    }

    pub fn summary(&self) -> Summary {
        self.items.iter().fold(Summary::default(), |mut s, item| {
            match item.status {
                ItemStatus::Written => s.written += 1,
                ItemStatus::Renamed { .. } => s.renamed += 1,
                ItemStatus::Skipped => s.skipped += 1,
                ItemStatus::Failed(_) => s.failed += 1,
            }
            s
        })
    }

    /// Paths that were actually written during this run.
    pub fn written_paths(&self) -> Vec<&PathBuf> {
        self.items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Written | ItemStatus::Renamed { .. }))
            .filter_map(|i| i.target.as_ref())
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items.iter().filter(|i| i.is_failed())
    }
}
