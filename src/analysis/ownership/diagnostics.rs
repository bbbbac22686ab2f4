use crate::analysis::ownership::lattice::Ownership;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::access_path::AccessPath;
use crate::ir::ir_nodes::{BlockId, IrRoutine, RequiredOwnership, ReturnContract, TextLocation};
use crate::string_interning::{StringId, StringTable};
use rustc_hash::FxHashSet;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    UseOfMoved,
    InsufficientOwnership,
    ReturnContractViolated,
    DoubleConsumption,

    /// The routine could not be analysed at all
    MalformedRoutine,

    /// The routine was stopped before its fixpoint
    AnalysisIncomplete,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::UseOfMoved => "use of moved path",
            DiagnosticKind::InsufficientOwnership => "insufficient ownership",
            DiagnosticKind::ReturnContractViolated => "return contract violated",
            DiagnosticKind::DoubleConsumption => "double consumption",
            DiagnosticKind::MalformedRoutine => "malformed routine",
            DiagnosticKind::AnalysisIncomplete => "analysis incomplete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnershipDiagnostic {
    pub routine: String,
    pub block: BlockId,

    /// Statement index inside `block`, None for the terminator or for
    /// routine-level diagnostics
    pub statement: Option<usize>,
    pub location: TextLocation,
    pub kind: DiagnosticKind,
    pub path: Option<String>,
    pub message: String,
}

/// Where inside a routine a finding was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct DiagnosticSite {
    pub block: BlockId,
    pub statement: Option<usize>,
    pub location: TextLocation,
}

/// Collects diagnostics for one routine, reporting each
/// (site, kind, path) combination once.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticReporter {
    seen: FxHashSet<(BlockId, Option<usize>, DiagnosticKind, Option<String>)>,
    diagnostics: Vec<OwnershipDiagnostic>,
}

impl DiagnosticReporter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn report(&mut self, diagnostic: OwnershipDiagnostic) {
        let key = (
            diagnostic.block,
            diagnostic.statement,
            diagnostic.kind,
            diagnostic.path.clone(),
        );

        if self.seen.insert(key) {
            self.diagnostics.push(diagnostic);
        }
    }

    pub(crate) fn extend(&mut self, diagnostics: impl IntoIterator<Item = OwnershipDiagnostic>) {
        for diagnostic in diagnostics {
            self.report(diagnostic);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub(crate) fn into_diagnostics(self) -> Vec<OwnershipDiagnostic> {
        self.diagnostics
    }
}

/// Name resolution and message wording for one routine's diagnostics.
#[derive(Clone, Copy)]
pub(crate) struct OwnershipDiagnostics<'a> {
    string_table: &'a StringTable,
    routine: &'a IrRoutine,
}

impl<'a> OwnershipDiagnostics<'a> {
    pub(crate) fn new(routine: &'a IrRoutine, string_table: &'a StringTable) -> Self {
        Self {
            string_table,
            routine,
        }
    }

    pub(crate) fn routine_name(&self) -> String {
        self.string_table.resolve(self.routine.name).to_owned()
    }

    pub(crate) fn path_name(&self, path: &AccessPath) -> String {
        path.to_string(self.string_table)
    }

    pub(crate) fn callee_name(&self, callee: StringId) -> String {
        self.string_table.resolve(callee).to_owned()
    }

    pub(crate) fn routine_location(&self) -> TextLocation {
        self.routine.location
    }

    fn at_site(
        &self,
        site: DiagnosticSite,
        kind: DiagnosticKind,
        path: Option<&AccessPath>,
        message: String,
    ) -> OwnershipDiagnostic {
        OwnershipDiagnostic {
            routine: self.routine_name(),
            block: site.block,
            statement: site.statement,
            location: site.location,
            kind,
            path: path.map(|path| self.path_name(path)),
            message,
        }
    }

    pub(crate) fn use_of_moved(&self, site: DiagnosticSite, path: &AccessPath) -> OwnershipDiagnostic {
        self.at_site(
            site,
            DiagnosticKind::UseOfMoved,
            Some(path),
            format!(
                "'{}' is used after it was moved or before it was initialised",
                self.path_name(path)
            ),
        )
    }

    pub(crate) fn consumed_twice(
        &self,
        site: DiagnosticSite,
        path: &AccessPath,
        callee: StringId,
    ) -> OwnershipDiagnostic {
        self.at_site(
            site,
            DiagnosticKind::DoubleConsumption,
            Some(path),
            format!(
                "'{}' is passed to '{}' more than once while one of the parameters consumes it",
                self.path_name(path),
                self.callee_name(callee)
            ),
        )
    }

    pub(crate) fn insufficient_for_parameter(
        &self,
        site: DiagnosticSite,
        path: &AccessPath,
        callee: StringId,
        parameter: StringId,
        required: RequiredOwnership,
        found: Ownership,
    ) -> OwnershipDiagnostic {
        self.at_site(
            site,
            DiagnosticKind::InsufficientOwnership,
            Some(path),
            format!(
                "'{}' requires {} ownership for parameter '{}', but '{}' is {}",
                self.callee_name(callee),
                required,
                self.callee_name(parameter),
                self.path_name(path),
                found
            ),
        )
    }

    pub(crate) fn return_violation(
        &self,
        site: DiagnosticSite,
        path: &AccessPath,
        contract: ReturnContract,
        found: Ownership,
    ) -> OwnershipDiagnostic {
        self.at_site(
            site,
            DiagnosticKind::ReturnContractViolated,
            Some(path),
            format!(
                "'{}' promises a {} result, but '{}' is {} here",
                self.routine_name(),
                contract,
                self.path_name(path),
                found
            ),
        )
    }

    pub(crate) fn malformed(&self, error: &CompilerError) -> OwnershipDiagnostic {
        OwnershipDiagnostic {
            routine: self.routine_name(),
            block: self.routine.entry,
            statement: None,
            location: error.location,
            kind: DiagnosticKind::MalformedRoutine,
            path: None,
            message: error.msg.clone(),
        }
    }

    pub(crate) fn incomplete(&self, reason: &str) -> OwnershipDiagnostic {
        OwnershipDiagnostic {
            routine: self.routine_name(),
            block: self.routine.entry,
            statement: None,
            location: self.routine_location(),
            kind: DiagnosticKind::AnalysisIncomplete,
            path: None,
            message: format!(
                "Ownership analysis of '{}' stopped early: {reason}",
                self.routine_name()
            ),
        }
    }
}
