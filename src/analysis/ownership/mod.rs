//! Flow-sensitive ownership analysis.
//!
//! For every reachable program point of every routine, classifies each
//! constrained access path as unique, shared, borrowed or moved, and reports
//! uses that the declared contracts do not allow. Routines are independent:
//! each one is validated, iterated to a fixpoint over its CFG, then walked
//! once more from the stable block entry states to record per-statement
//! environments and diagnostics.

pub mod cancellation;
pub mod diagnostics;
pub mod environment;
pub mod lattice;
mod transfer;
pub mod types;

pub use cancellation::{AnalysisCanceled, CancellationFlag};
pub use diagnostics::{DiagnosticKind, OwnershipDiagnostic};
pub use environment::TypeEnvironment;
pub use lattice::Ownership;
pub use types::{
    OwnershipCheckStats, OwnershipReport, ProgramPoint, RoutineOwnership, RoutineStatus,
};

use crate::analysis::ownership::diagnostics::{DiagnosticReporter, OwnershipDiagnostics};
use crate::analysis::ownership::transfer::{OwnershipTransferContext, TransferPass, transfer_block};
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::access_path::AccessPath;
use crate::ir::ir_nodes::{BlockId, ContractTable, IrProgram, IrRoutine};
use crate::ir::ir_validation::{RoutineLayout, validate_routine};
use crate::settings::{AnalysisConfig, LATTICE_ASCENT_STEPS, STATEMENTS_PER_BLOCK_HINT};
use crate::string_interning::StringTable;
use crate::{ownership_log, return_compiler_error, timer_log};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Analyse every routine in `program`.
pub fn check_ownership(
    program: &IrProgram,
    string_table: &StringTable,
    config: &AnalysisConfig,
) -> OwnershipReport {
    check_ownership_with_cancellation(program, string_table, config, &CancellationFlag::new())
}

/// Like `check_ownership`, stopping early once `cancellation` is tripped.
/// Routines cut short are reported as `Incomplete` with whatever states
/// they had reached.
pub fn check_ownership_with_cancellation(
    program: &IrProgram,
    string_table: &StringTable,
    config: &AnalysisConfig,
    cancellation: &CancellationFlag,
) -> OwnershipReport {
    OwnershipChecker::new(&program.contracts, string_table, config, cancellation).run(program)
}

/// Analyse a single routine against `contracts`, outside of a program.
pub fn analyze_routine(
    routine: &IrRoutine,
    contracts: &ContractTable,
    string_table: &StringTable,
    config: &AnalysisConfig,
) -> (RoutineOwnership, Vec<OwnershipDiagnostic>) {
    let cancellation = CancellationFlag::new();
    let analysis = OwnershipChecker::new(contracts, string_table, config, &cancellation)
        .analyze_routine(routine);

    (analysis.ownership, analysis.diagnostics)
}

struct RoutineAnalysis {
    ownership: RoutineOwnership,
    diagnostics: Vec<OwnershipDiagnostic>,
    stats: OwnershipCheckStats,
}

struct OwnershipChecker<'a> {
    contracts: &'a ContractTable,
    string_table: &'a StringTable,
    config: &'a AnalysisConfig,
    cancellation: &'a CancellationFlag,
    deadline: Option<Instant>,
}

impl<'a> OwnershipChecker<'a> {
    fn new(
        contracts: &'a ContractTable,
        string_table: &'a StringTable,
        config: &'a AnalysisConfig,
        cancellation: &'a CancellationFlag,
    ) -> Self {
        let deadline = config
            .deadline_ms
            .map(|millis| Instant::now() + Duration::from_millis(millis));

        Self {
            contracts,
            string_table,
            config,
            cancellation,
            deadline,
        }
    }

    fn run(&self, program: &IrProgram) -> OwnershipReport {
        let time = Instant::now();

        // Routines share nothing mutable, so they can be analysed on any thread
        let analyses: Vec<RoutineAnalysis> =
            if self.config.parallel_routines && program.routines.len() > 1 {
                program
                    .routines
                    .par_iter()
                    .map(|routine| self.analyze_routine(routine))
                    .collect()
            } else {
                program
                    .routines
                    .iter()
                    .map(|routine| self.analyze_routine(routine))
                    .collect()
            };

        let mut report = OwnershipReport::default();
        for analysis in analyses {
            report.stats.absorb(&analysis.stats);
            report.diagnostics.extend(analysis.diagnostics);
            report.routines.push(analysis.ownership);
        }

        ownership_log!(format!(
            "[Ownership] Completed ownership analysis: routines={} malformed={} incomplete={} blocks={} iterations={} diagnostics={}",
            report.stats.routines_analyzed,
            report.stats.routines_malformed,
            report.stats.routines_incomplete,
            report.stats.blocks_analyzed,
            report.stats.worklist_iterations,
            report.stats.diagnostics
        ));
        timer_log!(time, "Ownership analysis completed in: ");

        report
    }

    fn analyze_routine(&self, routine: &IrRoutine) -> RoutineAnalysis {
        let diagnostics = OwnershipDiagnostics::new(routine, self.string_table);

        let result = validate_routine(routine, self.string_table)
            .and_then(|layout| self.analyze_valid_routine(routine, &layout, diagnostics));

        match result {
            Ok(analysis) => analysis,
            Err(error) => {
                ownership_log!(format!(
                    "[Ownership] Routine '{}' is malformed: {}",
                    diagnostics.routine_name(),
                    error.msg
                ));

                RoutineAnalysis {
                    ownership: RoutineOwnership::new(
                        routine.id,
                        routine.name,
                        RoutineStatus::Malformed,
                    ),
                    diagnostics: vec![diagnostics.malformed(&error)],
                    stats: OwnershipCheckStats {
                        routines_analyzed: 1,
                        routines_malformed: 1,
                        diagnostics: 1,
                        ..OwnershipCheckStats::default()
                    },
                }
            }
        }
    }

    fn analyze_valid_routine(
        &self,
        routine: &IrRoutine,
        layout: &RoutineLayout,
        diagnostics: OwnershipDiagnostics<'_>,
    ) -> Result<RoutineAnalysis, CompilerError> {
        let context = OwnershipTransferContext {
            routine,
            contracts: self.contracts,
            diagnostics,
        };

        let reachable_block_set = layout
            .reachable_blocks
            .iter()
            .copied()
            .collect::<FxHashSet<_>>();
        let ceiling = self.iteration_ceiling(layout);

        let mut in_states: FxHashMap<BlockId, TypeEnvironment> = FxHashMap::default();
        let mut out_states: FxHashMap<BlockId, TypeEnvironment> = FxHashMap::default();
        in_states.insert(routine.entry, entry_environment(routine));

        let mut worklist = VecDeque::new();
        let mut queued = FxHashSet::default();
        worklist.push_back(routine.entry);
        queued.insert(routine.entry);

        let mut worklist_iterations = 0;
        let mut stop_reason = None;

        ownership_log!(format!(
            "[Ownership] Analyzing routine '{}' (entry={} blocks={} ceiling={})",
            diagnostics.routine_name(),
            routine.entry,
            layout.reachable_blocks.len(),
            ceiling
        ));
        ownership_log!(crate::ir::ir_display::display_routine(
            routine,
            self.string_table
        ));

        while let Some(block_id) = worklist.pop_front() {
            queued.remove(&block_id);

            if let Some(reason) = self.stop_reason(worklist_iterations, ceiling) {
                stop_reason = Some(reason);
                break;
            }
            worklist_iterations += 1;

            let Some(input_state) = in_states.get(&block_id).cloned() else {
                continue;
            };

            let Some(block) = layout.block(routine, block_id) else {
                return_compiler_error!(format!(
                    "Ownership analysis lost block {} of routine '{}'",
                    block_id,
                    diagnostics.routine_name()
                ));
            };

            let mut output_state = input_state;
            transfer_block(&context, block, TransferPass::Fixpoint, &mut output_state)?;

            let changed_out = match out_states.get(&block_id) {
                Some(existing) => existing != &output_state,
                None => true,
            };

            if !changed_out {
                continue;
            }

            out_states.insert(block_id, output_state.clone());

            for successor in block.terminator.successors() {
                if !reachable_block_set.contains(&successor) {
                    continue;
                }

                // Incoming states only ever ascend, which bounds the iteration
                let next_state = match in_states.get(&successor) {
                    Some(existing) => existing.merge_pointwise(&output_state),
                    None => output_state.clone(),
                };

                let changed_in = match in_states.get(&successor) {
                    Some(existing) => existing != &next_state,
                    None => true,
                };

                if changed_in {
                    in_states.insert(successor, next_state);
                    if queued.insert(successor) {
                        worklist.push_back(successor);
                    }
                }
            }
        }

        let status = match stop_reason {
            Some(_) => RoutineStatus::Incomplete,
            None => RoutineStatus::Complete,
        };

        let mut ownership = RoutineOwnership::new(routine.id, routine.name, status);
        ownership.worklist_iterations = worklist_iterations;
        if self.config.record_statement_states {
            ownership
                .point_states
                .reserve(layout.reachable_blocks.len() * STATEMENTS_PER_BLOCK_HINT);
        }

        let mut reporter = DiagnosticReporter::new();
        let mut stats = OwnershipCheckStats {
            routines_analyzed: 1,
            blocks_analyzed: layout.reachable_blocks.len(),
            worklist_iterations,
            ..OwnershipCheckStats::default()
        };

        // One pass from the stable entry states. Every diagnostic and
        // per-statement state comes from here.
        for block_id in &layout.reachable_blocks {
            let Some(entry_state) = in_states.get(block_id) else {
                continue;
            };
            let Some(block) = layout.block(routine, *block_id) else {
                continue;
            };

            let mut exit_state = entry_state.clone();
            let block_stats = transfer_block(&context, block, TransferPass::Report, &mut exit_state)?;
            stats.statements_analyzed += block_stats.statements_analyzed;
            stats.call_sites += block_stats.call_sites;
            reporter.extend(block_stats.diagnostics);

            if self.config.record_statement_states {
                for (index, state) in block_stats.statement_states.into_iter().enumerate() {
                    ownership
                        .point_states
                        .insert(ProgramPoint::new(*block_id, index), state);
                }
            }

            ownership_log!(format!(
                "[Ownership]   {} in={} out={}",
                block_id,
                entry_state.display(self.string_table),
                exit_state.display(self.string_table)
            ));

            ownership
                .block_entry_states
                .insert(*block_id, entry_state.clone());
            ownership.block_exit_states.insert(*block_id, exit_state);
        }

        if let Some(reason) = stop_reason {
            ownership_log!(format!(
                "[Ownership] Routine '{}' stopped early: {}",
                diagnostics.routine_name(),
                reason
            ));
            reporter.report(diagnostics.incomplete(&reason));
            stats.routines_incomplete += 1;
        }

        stats.diagnostics = reporter.len();

        Ok(RoutineAnalysis {
            ownership,
            diagnostics: reporter.into_diagnostics(),
            stats,
        })
    }

    /// Blocks one routine may process before it is declared incomplete.
    /// Every reprocessing of a block follows a strict ascent of its incoming
    /// state, and each path can ascend at most `LATTICE_ASCENT_STEPS` times.
    fn iteration_ceiling(&self, layout: &RoutineLayout) -> usize {
        let bound = layout
            .reachable_blocks
            .len()
            .saturating_mul(1 + LATTICE_ASCENT_STEPS.saturating_mul(layout.mentioned_paths));

        match self.config.max_worklist_iterations {
            Some(limit) => bound.min(limit),
            None => bound,
        }
    }

    fn stop_reason(&self, worklist_iterations: usize, ceiling: usize) -> Option<String> {
        if let Err(canceled) = self.cancellation.check() {
            return Some(canceled.to_string());
        }

        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Some(String::from("the deadline passed"));
        }

        if worklist_iterations >= ceiling {
            return Some(format!("no fixpoint within {ceiling} block iterations"));
        }

        None
    }
}

/// Each parameter starts in the state its declared contract grants.
fn entry_environment(routine: &IrRoutine) -> TypeEnvironment {
    routine
        .contract
        .params
        .iter()
        .map(|param| {
            (
                AccessPath::local(param.name),
                Ownership::for_parameter(param.mode, param.required),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests;
