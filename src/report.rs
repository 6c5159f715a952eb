//! Human-readable and JSON rendering of validation outcomes.

use crate::schema::SchemaError;
use crate::validate::ValidationReport;

/// Line printed for a manifest with no semantic violations.
pub const SUCCESS_LINE: &str = "Manifest is valid: no errors found.";

/// Render a semantic validation report.
///
/// A valid report renders as [`SUCCESS_LINE`]. Otherwise each error renders
/// as a block holding its code and message, the affected module, and a hint
/// for its kind, followed by a total count.
///
/// # Examples
///
/// ```
/// use modplan::report::{SUCCESS_LINE, format_report};
/// use modplan::validate::ValidationReport;
///
/// let report = ValidationReport::from_errors(Vec::new());
/// assert_eq!(format_report(&report), format!("{SUCCESS_LINE}\n"));
/// ```
#[must_use]
pub fn format_report(report: &ValidationReport) -> String {
    if report.errors.is_empty() {
        return format!("{SUCCESS_LINE}\n");
    }

    let mut out = String::new();
    for error in &report.errors {
        out.push_str(&format!(
            "{error}\n  Module: {}\n  Hint: {}\n\n",
            error.module_id,
            error.kind.hint()
        ));
    }
    out.push_str(&count_line(report.errors.len(), "validation error"));
    out.push('\n');
    out
}

/// Render structural errors, one per line, followed by a total count.
#[must_use]
pub fn format_schema_errors(errors: &[SchemaError]) -> String {
    let mut out = String::new();
    for error in errors {
        out.push_str(&format!("[SCHEMA] {error}\n"));
    }
    out.push_str(&count_line(errors.len(), "structural error"));
    out.push('\n');
    out
}

/// Serialise a report as pretty-printed JSON.
///
/// # Errors
///
/// Returns the serialiser's error; reports contain only strings and
/// integers, so this does not fail in practice.
pub fn report_json(report: &ValidationReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

fn count_line(count: usize, noun: &str) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("Found {count} {noun}{plural}.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::manifest_of;
    use crate::schema::parse_manifest;
    use crate::validate::validate_manifest;
    use rstest::rstest;

    #[rstest]
    fn valid_report_is_a_single_line() {
        let report = validate_manifest(&manifest_of(&[("base.system", 1, &[])]));
        assert_eq!(format_report(&report), "Manifest is valid: no errors found.\n");
    }

    #[rstest]
    fn each_error_gets_code_message_and_hint() {
        let report = validate_manifest(&manifest_of(&[("lang.bun", 6, &["base.sytem"])]));
        let text = format_report(&report);

        assert!(text.starts_with("[MISSING_DEPENDENCY] "));
        assert!(text.contains("  Module: lang.bun\n"));
        assert!(text.contains("  Hint: Declare the missing module"));
        assert!(text.ends_with("Found 1 validation error.\n"));
    }

    #[rstest]
    fn error_blocks_are_separated_by_a_blank_line() {
        let report = validate_manifest(&manifest_of(&[("all", 1, &[]), ("base", 1, &[])]));
        let text = format_report(&report);
        let blocks: Vec<&str> = text.split("\n\n").collect();

        assert_eq!(blocks.len(), 3, "report was:\n{text}");
        for block in blocks.iter().take(2) {
            assert_eq!(block.lines().count(), 3);
            assert!(block.starts_with("[RESERVED_NAME_COLLISION] "));
        }
        assert_eq!(blocks.last().copied(), Some("Found 2 validation errors.\n"));
    }

    #[rstest]
    fn count_is_pluralised() {
        let report = validate_manifest(&manifest_of(&[("all", 1, &[]), ("base", 1, &[])]));
        assert!(format_report(&report).ends_with("Found 2 validation errors.\n"));
    }

    #[rstest]
    fn schema_errors_are_listed_with_paths() {
        let errors = parse_manifest(&serde_json::json!({ "version": 1 }))
            .expect_err("missing fields");
        let text = format_schema_errors(&errors);

        assert!(text.lines().all(|line| line.starts_with("[SCHEMA] ") || line.starts_with("Found ")));
        assert!(text.contains("[SCHEMA] name: "));
    }

    #[rstest]
    fn json_report_round_trips_codes() {
        let report = validate_manifest(&manifest_of(&[("a", 1, &["a"])]));
        let json = report_json(&report).expect("serialise");
        assert!(json.contains("\"DEPENDENCY_CYCLE\""));
        assert!(json.contains("\"cyclePath\""));
    }
}
