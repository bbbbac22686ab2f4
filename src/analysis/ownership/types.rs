use crate::analysis::ownership::diagnostics::{DiagnosticKind, OwnershipDiagnostic};
use crate::analysis::ownership::environment::TypeEnvironment;
use crate::analysis::ownership::lattice::Ownership;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::access_path::AccessPath;
use crate::ir::ir_nodes::{BlockId, RoutineId};
use crate::string_interning::{StringId, StringTable};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Identifies the state *after* statement `statement` of `block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ProgramPoint {
    pub block: BlockId,
    pub statement: usize,
}

impl ProgramPoint {
    pub fn new(block: BlockId, statement: usize) -> Self {
        Self { block, statement }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OwnershipReport {
    /// One entry per routine, in program order
    pub routines: Vec<RoutineOwnership>,
    pub diagnostics: Vec<OwnershipDiagnostic>,
    pub stats: OwnershipCheckStats,
}

impl OwnershipReport {
    pub fn routine(&self, name: StringId) -> Option<&RoutineOwnership> {
        self.routines.iter().find(|routine| routine.name == name)
    }

    pub fn diagnostics_for<'a>(
        &'a self,
        routine_name: &'a str,
    ) -> impl Iterator<Item = &'a OwnershipDiagnostic> + 'a {
        self.diagnostics
            .iter()
            .filter(move |diagnostic| diagnostic.routine == routine_name)
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.kind == kind)
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn snapshot(&self, string_table: &StringTable) -> ReportSnapshot {
        ReportSnapshot {
            routines: self
                .routines
                .iter()
                .map(|routine| routine.snapshot(string_table))
                .collect(),
            diagnostics: self.diagnostics.clone(),
            stats: self.stats.clone(),
        }
    }

    pub fn to_json(&self, string_table: &StringTable) -> Result<String, CompilerError> {
        serde_json::to_string_pretty(&self.snapshot(string_table)).map_err(|error| {
            CompilerError::compiler_error(format!(
                "Could not serialise ownership report: {error}"
            ))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OwnershipCheckStats {
    pub routines_analyzed: usize,
    pub routines_malformed: usize,
    pub routines_incomplete: usize,
    pub blocks_analyzed: usize,
    pub statements_analyzed: usize,
    pub call_sites: usize,
    pub worklist_iterations: usize,
    pub diagnostics: usize,
}

impl OwnershipCheckStats {
    pub fn absorb(&mut self, other: &OwnershipCheckStats) {
        self.routines_analyzed += other.routines_analyzed;
        self.routines_malformed += other.routines_malformed;
        self.routines_incomplete += other.routines_incomplete;
        self.blocks_analyzed += other.blocks_analyzed;
        self.statements_analyzed += other.statements_analyzed;
        self.call_sites += other.call_sites;
        self.worklist_iterations += other.worklist_iterations;
        self.diagnostics += other.diagnostics;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoutineStatus {
    /// Fixpoint reached; every reachable program point has a state
    Complete,

    /// Stopped early (ceiling, deadline or cancellation); states are partial
    Incomplete,

    /// Rejected before or during analysis; no states
    Malformed,
}

#[derive(Debug, Clone)]
pub struct RoutineOwnership {
    pub routine: RoutineId,
    pub name: StringId,
    pub status: RoutineStatus,
    pub point_states: FxHashMap<ProgramPoint, TypeEnvironment>,
    pub block_entry_states: FxHashMap<BlockId, TypeEnvironment>,
    pub block_exit_states: FxHashMap<BlockId, TypeEnvironment>,
    pub worklist_iterations: usize,
}

impl RoutineOwnership {
    pub(crate) fn new(routine: RoutineId, name: StringId, status: RoutineStatus) -> Self {
        Self {
            routine,
            name,
            status,
            point_states: FxHashMap::default(),
            block_entry_states: FxHashMap::default(),
            block_exit_states: FxHashMap::default(),
            worklist_iterations: 0,
        }
    }

    pub fn state_after(&self, point: ProgramPoint) -> Option<&TypeEnvironment> {
        self.point_states.get(&point)
    }

    /// The state a statement starts from: the block entry for the first
    /// statement, the previous statement's state otherwise.
    pub fn state_before(&self, point: ProgramPoint) -> Option<&TypeEnvironment> {
        match point.statement {
            0 => self.entry_state(point.block),
            index => self.state_after(ProgramPoint::new(point.block, index - 1)),
        }
    }

    pub fn entry_state(&self, block: BlockId) -> Option<&TypeEnvironment> {
        self.block_entry_states.get(&block)
    }

    pub fn exit_state(&self, block: BlockId) -> Option<&TypeEnvironment> {
        self.block_exit_states.get(&block)
    }

    /// Whether `path` may be encoded as alias-free right after `point`.
    /// Unknown points and unconstrained paths answer false.
    pub fn may_assume_unique(&self, point: ProgramPoint, path: &AccessPath) -> bool {
        self.state_after(point)
            .and_then(|state| state.resolve(path))
            .is_some_and(Ownership::is_unique)
    }

    pub fn is_complete(&self) -> bool {
        self.status == RoutineStatus::Complete
    }

    pub fn snapshot(&self, string_table: &StringTable) -> RoutineSnapshot {
        let mut block_ids = self
            .block_entry_states
            .keys()
            .chain(self.block_exit_states.keys())
            .copied()
            .collect::<Vec<_>>();
        block_ids.sort();
        block_ids.dedup();

        let mut points = self.point_states.keys().copied().collect::<Vec<_>>();
        points.sort();

        let blocks = block_ids
            .into_iter()
            .map(|block| BlockSnapshot {
                block,
                entry: self
                    .entry_state(block)
                    .map(|state| state.snapshot(string_table)),
                exit: self
                    .exit_state(block)
                    .map(|state| state.snapshot(string_table)),
                statements: points
                    .iter()
                    .filter(|point| point.block == block)
                    .map(|point| StatementSnapshot {
                        statement: point.statement,
                        state: self.point_states[point].snapshot(string_table),
                    })
                    .collect(),
            })
            .collect();

        RoutineSnapshot {
            name: string_table.resolve(self.name).to_owned(),
            status: self.status,
            worklist_iterations: self.worklist_iterations,
            blocks,
        }
    }
}

// Serialisable views. Interned ids are resolved so consumers never need the
// string table.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSnapshot {
    pub routines: Vec<RoutineSnapshot>,
    pub diagnostics: Vec<OwnershipDiagnostic>,
    pub stats: OwnershipCheckStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutineSnapshot {
    pub name: String,
    pub status: RoutineStatus,
    pub worklist_iterations: usize,
    pub blocks: Vec<BlockSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockSnapshot {
    pub block: BlockId,
    pub entry: Option<EnvironmentSnapshot>,
    pub exit: Option<EnvironmentSnapshot>,
    pub statements: Vec<StatementSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementSnapshot {
    pub statement: usize,
    pub state: EnvironmentSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentSnapshot {
    pub paths: Vec<PathOwnershipSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathOwnershipSnapshot {
    pub path: String,
    pub ownership: Ownership,
}
