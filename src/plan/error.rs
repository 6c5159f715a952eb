//! Planning errors.
//!
//! Planning fails as a whole: either every directive is valid and the
//! selection is dependency-safe, or no plan is returned. Each variant carries
//! every problem found so the caller can report them together.

use crate::module_id::ModuleId;
use std::fmt;

/// The directive an id was supplied through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Explicit inclusion.
    Only,
    /// Explicit exclusion, including legacy flags and configured skips.
    Skip,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Only => f.write_str("only"),
            Self::Skip => f.write_str("skip"),
        }
    }
}

/// A single invalid selection directive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    /// A directive names a module the manifest does not declare.
    #[error("unknown module '{id}' in {directive} directive")]
    UnknownModule {
        /// Directive the id came from.
        directive: Directive,
        /// The unrecognised id as supplied.
        id: String,
    },

    /// A phase filter names a phase no module uses.
    #[error("no module is in phase {phase} (phases in use: {})", join_phases(.available))]
    UnknownPhase {
        /// The requested phase.
        phase: u8,
        /// Phases present in the manifest, ascending.
        available: Vec<u8>,
    },

    /// The same module is both requested and skipped.
    #[error("module '{id}' is both requested and skipped")]
    ConflictingDirective {
        /// The doubly-specified module.
        id: ModuleId,
    },
}

/// A selected module that depends on a skipped one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipViolation {
    /// The module that would still run.
    pub module: ModuleId,
    /// Its skipped prerequisite.
    pub dependency: ModuleId,
}

impl fmt::Display for SkipViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' depends on '{}', which is skipped",
            self.module, self.dependency
        )
    }
}

/// Errors returned by [`super::plan_selection`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// One or more directives were invalid.
    #[error("invalid selection: {}", join_all(.0))]
    InvalidDirectives(Vec<DirectiveError>),

    /// Skipping would leave selected modules without prerequisites.
    #[error("dependency violation: {}", join_all(.0))]
    SkipSafety(Vec<SkipViolation>),
}

impl PlanError {
    /// Individual problems, one per line, for reporting.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        match self {
            Self::InvalidDirectives(errors) => errors.iter().map(ToString::to_string).collect(),
            Self::SkipSafety(violations) => violations.iter().map(ToString::to_string).collect(),
        }
    }
}

fn join_all<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_phases(phases: &[u8]) -> String {
    phases
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_phase_lists_available_phases() {
        let err = DirectiveError::UnknownPhase {
            phase: 4,
            available: vec![1, 6, 7],
        };
        assert_eq!(
            err.to_string(),
            "no module is in phase 4 (phases in use: 1, 6, 7)"
        );
    }

    #[test]
    fn skip_safety_names_both_modules() {
        let err = PlanError::SkipSafety(vec![SkipViolation {
            module: ModuleId::parse("agents.claude").expect("valid"),
            dependency: ModuleId::parse("lang.bun").expect("valid"),
        }]);
        let msg = err.to_string();
        assert!(msg.contains("agents.claude"));
        assert!(msg.contains("lang.bun"));
        assert_eq!(err.problems().len(), 1);
    }
}
