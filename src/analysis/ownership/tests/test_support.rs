#![cfg(test)]

use crate::analysis::ownership::diagnostics::{DiagnosticKind, OwnershipDiagnostic};
use crate::analysis::ownership::environment::TypeEnvironment;
use crate::analysis::ownership::lattice::Ownership;
use crate::analysis::ownership::types::{OwnershipReport, ProgramPoint, RoutineOwnership};
use crate::analysis::ownership::{analyze_routine, check_ownership};
use crate::ir::access_path::AccessPath;
use crate::ir::ir_builder::declare_external_contract;
use crate::ir::ir_nodes::{
    BlockId, ContractTable, IrProgram, IrRoutine, PassingMode, RequiredOwnership, ReturnContract,
};
use crate::settings::AnalysisConfig;
use crate::string_interning::StringTable;

pub(crate) use PassingMode::{Borrowed, Consumed};
pub(crate) use RequiredOwnership::{Shared, Unique};
pub(crate) use ReturnContract::{ReturnsShared, ReturnsUnique};

pub(crate) fn sequential_config() -> AnalysisConfig {
    AnalysisConfig {
        parallel_routines: false,
        ..AnalysisConfig::default()
    }
}

pub(crate) fn path(text: &str, string_table: &mut StringTable) -> AccessPath {
    AccessPath::parse(text, string_table).expect("test paths should parse")
}

/// Register a library callee with the given parameter contracts.
pub(crate) fn external(
    contracts: &mut ContractTable,
    string_table: &mut StringTable,
    name: &str,
    params: &[(PassingMode, RequiredOwnership)],
    returns: ReturnContract,
) {
    declare_external_contract(contracts, string_table, name, params, returns)
        .expect("external contract should register");
}

pub(crate) fn analyze_alone(
    routine: &IrRoutine,
    contracts: &ContractTable,
    string_table: &StringTable,
) -> (RoutineOwnership, Vec<OwnershipDiagnostic>) {
    analyze_routine(routine, contracts, string_table, &sequential_config())
}

pub(crate) fn analyze_program(
    routines: Vec<IrRoutine>,
    contracts: ContractTable,
    string_table: &StringTable,
    config: &AnalysisConfig,
) -> OwnershipReport {
    let program =
        IrProgram::new(routines, contracts, string_table).expect("program should assemble");
    check_ownership(&program, string_table, config)
}

pub(crate) fn kinds(diagnostics: &[OwnershipDiagnostic]) -> Vec<DiagnosticKind> {
    diagnostics.iter().map(|diagnostic| diagnostic.kind).collect()
}

pub(crate) fn state_at(
    ownership: &RoutineOwnership,
    block: BlockId,
    statement: usize,
    text: &str,
    string_table: &mut StringTable,
) -> Option<Ownership> {
    let path = path(text, string_table);
    ownership
        .state_after(ProgramPoint::new(block, statement))
        .and_then(|state| state.lookup(&path))
}

pub(crate) fn exit_binding(
    ownership: &RoutineOwnership,
    block: BlockId,
    text: &str,
    string_table: &mut StringTable,
) -> Option<Ownership> {
    let path = path(text, string_table);
    ownership
        .exit_state(block)
        .and_then(|state| state.lookup(&path))
}

pub(crate) fn env_of(
    bindings: &[(&str, Ownership)],
    string_table: &mut StringTable,
) -> TypeEnvironment {
    bindings
        .iter()
        .map(|(text, ownership)| (path(text, string_table), *ownership))
        .collect()
}
