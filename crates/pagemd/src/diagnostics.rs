//! Recoverable per-element failures.
//!
//! Stages never abort on a single bad element. Each failure becomes a
//! [`Diagnostic`], is logged at `warn` level and the stage moves on.

use std::fmt;

use tracing::warn;

use crate::dom::NodeId;

/// Pipeline stage that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    IncludeTags,
    TagFilter,
    Images,
    Links,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::IncludeTags => "include-tags",
            Stage::TagFilter => "tag-filter",
            Stage::Images => "images",
            Stage::Links => "links",
        };
        f.write_str(name)
    }
}

/// A skipped element and the reason it was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: Stage,
    pub node: Option<NodeId>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(stage: Stage, node: Option<NodeId>, message: impl Into<String>) -> Self {
        Self {
            stage,
            node,
            message: message.into(),
        }
    }

    pub(crate) fn log(&self) {
        match self.node {
            Some(node) => warn!(stage = %self.stage, %node, "{}", self.message),
            None => warn!(stage = %self.stage, "{}", self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Some(node) => write!(f, "[{}] {}: {}", self.stage, node, self.message),
            None => write!(f, "[{}] {}", self.stage, self.message),
        }
    }
}

/// Outcome of one stage: how many elements were edited, and what was skipped
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub applied: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl StageReport {
    /// Fold step: count a success or record a failure
    pub(crate) fn record<E: fmt::Display>(
        mut self,
        stage: Stage,
        node: NodeId,
        outcome: Result<(), E>,
    ) -> Self {
        match outcome {
            Ok(()) => self.applied += 1,
            Err(err) => {
                let diagnostic = Diagnostic::new(stage, Some(node), err.to_string());
                diagnostic.log();
                self.diagnostics.push(diagnostic);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::new(Stage::Links, None, "bad href");
        assert_eq!(diagnostic.to_string(), "[links] bad href");
    }

    #[test]
    fn test_record_counts_and_collects() {
        let mut doc = Document::new();
        let node = doc.create_element("a", Vec::new());

        let report = StageReport::default()
            .record::<String>(Stage::Links, node, Ok(()))
            .record(Stage::Links, node, Err("relative URL without a base"));

        assert_eq!(report.applied, 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(
            report.diagnostics[0].to_string(),
            format!("[links] {}: relative URL without a base", node)
        );
    }
}
