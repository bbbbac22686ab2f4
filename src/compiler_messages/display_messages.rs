use crate::analysis::ownership::diagnostics::{DiagnosticKind, OwnershipDiagnostic};
use crate::analysis::ownership::types::OwnershipReport;
use saying::say;

/// One-line plain text rendering, for logs and tests.
pub fn format_diagnostic(diagnostic: &OwnershipDiagnostic) -> String {
    let position = match diagnostic.statement {
        Some(statement) => format!("{} statement {}", diagnostic.block, statement),
        None => format!("{} terminator", diagnostic.block),
    };

    format!(
        "{} [{}] in '{}' at line {} ({}): {}",
        diagnostic_label(diagnostic.kind),
        diagnostic.kind.as_str(),
        diagnostic.routine,
        diagnostic.location.line(),
        position,
        diagnostic.message
    )
}

fn diagnostic_label(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::MalformedRoutine => "error",
        DiagnosticKind::AnalysisIncomplete => "warning",
        DiagnosticKind::UseOfMoved
        | DiagnosticKind::InsufficientOwnership
        | DiagnosticKind::ReturnContractViolated
        | DiagnosticKind::DoubleConsumption => "ownership",
    }
}

pub fn print_ownership_report(report: &OwnershipReport) {
    for diagnostic in &report.diagnostics {
        print_formatted_diagnostic(diagnostic);
    }

    if report.diagnostics.is_empty() {
        say!(Green "No ownership problems found");
    } else {
        say!(
            "\n",
            Bright {report.diagnostics.len()},
            " ownership diagnostics across ",
            Bright {report.stats.routines_analyzed},
            " routines"
        );
    }
}

pub fn print_formatted_diagnostic(diagnostic: &OwnershipDiagnostic) {
    let line_number = diagnostic.location.line();

    match diagnostic.kind {
        DiagnosticKind::UseOfMoved | DiagnosticKind::DoubleConsumption => {
            say!("\n(╯°□°)╯  🔥🔥 ", Dark Magenta diagnostic.routine.to_owned(), " 🔥🔥  Σ(°△°;) ");
            say!(Red diagnostic.kind.as_str());
        }

        DiagnosticKind::InsufficientOwnership | DiagnosticKind::ReturnContractViolated => {
            say!("\n(ಠ_ಠ) ", Dark Magenta diagnostic.routine.to_owned());
            say!(Red diagnostic.kind.as_str());
        }

        DiagnosticKind::MalformedRoutine => {
            say!("\nヽ༼☉ ‿ ⚆༽ﾉ  🔥🔥🔥 ", Dark Magenta diagnostic.routine.to_owned(), " 🔥🔥🔥  ╰(° _ o╰) ");
            say!(Yellow "MALFORMED ROUTINE - ");
            say!(Dark Yellow "the routine was skipped, nothing below it was checked");
        }

        DiagnosticKind::AnalysisIncomplete => {
            say!("\n(-_-) ", Dark Magenta diagnostic.routine.to_owned());
            say!(Yellow "ANALYSIS INCOMPLETE - ");
        }
    }

    say!(Dark Magenta "Line ", Bright {line_number});
    if let Some(path) = &diagnostic.path {
        say!(Dark Magenta "Path ", Bright path.to_owned());
    }
    say!(diagnostic.message.to_owned());
}
