//! Free-text guidance attached to the delta.

use super::diagnostics::{render_open_questions, Degradation};
use super::types::{EventSummary, RiskFile};
use crate::types::RelPath;

pub const REVIEW_DEPENDENTS_STEP: &str =
    "Review downstream dependents for high-impact files before merge.";
pub const RUN_TESTS_STEP: &str = "Run tests covering changed files before handoff.";

/// Facts about one build that decide which guidance applies.
#[derive(Debug, Clone, Copy)]
pub struct GuidanceInputs<'a> {
    pub base_ref: &'a str,
    pub changed: &'a [RelPath],
    pub risk: &'a [RiskFile],
    pub events: &'a [EventSummary],
    pub has_state: bool,
    pub has_dependency_context: bool,
}

impl GuidanceInputs<'_> {
    /// Gaps implied by the build inputs themselves.
    pub fn degradations(&self) -> Vec<Degradation> {
        let mut out = Vec::new();
        if self.changed.is_empty() {
            out.push(Degradation::NoChangesDetected {
                base_ref: self.base_ref.to_string(),
            });
        }
        if !self.has_state {
            out.push(Degradation::LiveStateUnavailable);
        }
        if !self.has_dependency_context {
            out.push(Degradation::DependencyContextUnavailable);
        }
        if self.has_state && self.events.is_empty() {
            out.push(Degradation::EmptyTimeline);
        }
        out
    }

    pub fn next_steps(&self) -> Vec<String> {
        let mut steps = Vec::with_capacity(2);
        if !self.risk.is_empty() {
            steps.push(REVIEW_DEPENDENTS_STEP.to_string());
        }
        if !self.changed.is_empty() {
            steps.push(RUN_TESTS_STEP.to_string());
        }
        steps
    }
}

/// Next steps and open questions for a build. `extra` holds degradations
/// recorded by earlier stages.
pub fn derive_guidance(
    inputs: &GuidanceInputs<'_>,
    extra: &[Degradation],
) -> (Vec<String>, Vec<String>) {
    let mut degradations = inputs.degradations();
    degradations.extend_from_slice(extra);
    (inputs.next_steps(), render_open_questions(&degradations))
}
