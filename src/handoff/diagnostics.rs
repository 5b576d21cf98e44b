//! Stage results that carry their own degradations.
//!
//! Every best-effort stage returns a [`Staged`] value so a missing input is
//! recorded once, where it happens, and later surfaces as an open question in
//! the delta instead of silently producing an empty list.

use std::fmt;

/// A recoverable gap in the inputs of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    NoChangesDetected { base_ref: String },
    LiveStateUnavailable,
    DependencyContextUnavailable,
    EmptyTimeline,
    BranchUnavailable,
    FileUnreadable { path: String, reason: String },
}

impl Degradation {
    /// Position in the rendered open-question list.
    fn order(&self) -> u8 {
        match self {
            Degradation::NoChangesDetected { .. } => 0,
            Degradation::LiveStateUnavailable => 1,
            Degradation::DependencyContextUnavailable => 2,
            Degradation::EmptyTimeline => 3,
            Degradation::BranchUnavailable => 4,
            Degradation::FileUnreadable { .. } => 5,
        }
    }

    pub fn open_question(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::NoChangesDetected { base_ref } => write!(
                f,
                "No changed files detected vs {}. Confirm the base ref and branch state.",
                base_ref
            ),
            Degradation::LiveStateUnavailable => {
                f.write_str("Live watch state was unavailable; timeline may be incomplete.")
            }
            Degradation::DependencyContextUnavailable => f.write_str(
                "Dependency graph context was unavailable; risk files may be incomplete.",
            ),
            Degradation::EmptyTimeline => {
                f.write_str("No recent timeline events matched the lookback window.")
            }
            Degradation::BranchUnavailable => {
                f.write_str("Current branch could not be resolved; branch name is empty.")
            }
            Degradation::FileUnreadable { path, reason } => write!(
                f,
                "Could not read {} ({}); its size and hash are missing.",
                path, reason
            ),
        }
    }
}

/// A stage output plus whatever went missing while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Staged<T> {
    pub value: T,
    pub degradations: Vec<Degradation>,
}

impl<T> Staged<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            degradations: Vec::new(),
        }
    }

    pub fn degraded(value: T, degradation: Degradation) -> Self {
        Self {
            value,
            degradations: vec![degradation],
        }
    }

    /// Move this stage's degradations into `sink` and return the value.
    pub fn drain_into(self, sink: &mut Vec<Degradation>) -> T {
        sink.extend(self.degradations);
        self.value
    }
}

/// Render degradations as open questions in a fixed order, dropping repeats.
pub fn render_open_questions(degradations: &[Degradation]) -> Vec<String> {
    let mut ordered: Vec<&Degradation> = Vec::with_capacity(degradations.len());
    for degradation in degradations {
        if !ordered.contains(&degradation) {
            ordered.push(degradation);
        }
    }
    // Stable sort keeps per-file entries in collection order.
    ordered.sort_by_key(|d| d.order());
    ordered.into_iter().map(Degradation::open_question).collect()
}
