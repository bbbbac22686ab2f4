//! Per-statement transfer function.
//!
//! Every function here takes the environment holding *before* the statement
//! and leaves the environment holding *after* it in the same handle. Usage
//! errors never abort the block: the offending path is treated as `Moved`
//! from then on and the walk continues. Only malformed input (unknown callee,
//! wrong argument count) surfaces as a `CompilerError`.

mod call_semantics;
mod chain;

use crate::analysis::ownership::diagnostics::{
    DiagnosticSite, OwnershipDiagnostic, OwnershipDiagnostics,
};
use crate::analysis::ownership::environment::TypeEnvironment;
use crate::analysis::ownership::lattice::Ownership;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::access_path::AccessPath;
use crate::ir::ir_nodes::{
    ContractTable, IrBlock, IrRoutine, IrStatement, IrStatementKind, IrTerminator,
};

use chain::apply_call;

pub(super) struct OwnershipTransferContext<'a> {
    pub routine: &'a IrRoutine,
    pub contracts: &'a ContractTable,
    pub diagnostics: OwnershipDiagnostics<'a>,
}

/// The fixpoint pass only moves states around. The report pass runs once
/// from the stable entry states and is the only one that produces
/// diagnostics and per-statement states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TransferPass {
    Fixpoint,
    Report,
}

#[derive(Debug, Clone)]
pub(super) struct BlockTransferStats {
    pub pass: TransferPass,
    pub statements_analyzed: usize,
    pub call_sites: usize,
    pub diagnostics: Vec<OwnershipDiagnostic>,

    /// State after each statement, in order. Report pass only.
    pub statement_states: Vec<TypeEnvironment>,
}

impl BlockTransferStats {
    pub(super) fn new(pass: TransferPass) -> Self {
        Self {
            pass,
            statements_analyzed: 0,
            call_sites: 0,
            diagnostics: Vec::new(),
            statement_states: Vec::new(),
        }
    }

    pub(super) fn report(&mut self, build: impl FnOnce() -> OwnershipDiagnostic) {
        if self.pass == TransferPass::Report {
            self.diagnostics.push(build());
        }
    }
}

pub(super) fn transfer_block(
    context: &OwnershipTransferContext<'_>,
    block: &IrBlock,
    pass: TransferPass,
    env: &mut TypeEnvironment,
) -> Result<BlockTransferStats, CompilerError> {
    let mut stats = BlockTransferStats::new(pass);

    for (index, statement) in block.statements.iter().enumerate() {
        let site = DiagnosticSite {
            block: block.id,
            statement: Some(index),
            location: statement.location,
        };

        transfer_statement(context, env, statement, site, &mut stats)?;
        stats.statements_analyzed += 1;

        if pass == TransferPass::Report {
            stats.statement_states.push(env.clone());
        }
    }

    transfer_terminator(context, env, block, &mut stats);

    Ok(stats)
}

pub(super) fn transfer_statement(
    context: &OwnershipTransferContext<'_>,
    env: &mut TypeEnvironment,
    statement: &IrStatement,
    site: DiagnosticSite,
    stats: &mut BlockTransferStats,
) -> Result<(), CompilerError> {
    match &statement.kind {
        IrStatementKind::Declare(local) => {
            bind_target(env, &AccessPath::local(*local), Ownership::Moved);
        }

        IrStatementKind::Copy { target, source } => {
            check_write_prefixes(context, env, target, site, stats);
            transfer_copy(context, env, target, source, site, stats);
        }

        IrStatementKind::AssignNull(target) => {
            check_write_prefixes(context, env, target, site, stats);
            bind_target(env, target, Ownership::UniqueFree);
        }

        IrStatementKind::Call {
            target,
            args,
            result,
        } => {
            stats.call_sites += 1;
            apply_call(context, env, target, args, result.as_ref(), site, stats)?;
        }

        IrStatementKind::Use(path) => {
            read_path(context, env, path, site, stats);
        }
    }

    Ok(())
}

/// `target := source`. What happens to both sides depends on how the
/// source is held right now.
fn transfer_copy(
    context: &OwnershipTransferContext<'_>,
    env: &mut TypeEnvironment,
    target: &AccessPath,
    source: &AccessPath,
    site: DiagnosticSite,
    stats: &mut BlockTransferStats,
) {
    let target_state = match read_path(context, env, source, site, stats) {
        Some(Ownership::Moved) => Ownership::Moved,

        // The borrow is handed off and the old name dies
        Some(Ownership::UniqueBorrowed) => {
            *env = env.with_subtree_moved(source);
            Ownership::UniqueBorrowed
        }
        Some(Ownership::SharedBorrowed) => {
            *env = env.with_subtree_moved(source);
            Ownership::SharedBorrowed
        }

        // Aliasing a unique value demotes both names
        Some(Ownership::UniqueFree) => {
            *env = env.with_binding(source, Ownership::SharedFree);
            Ownership::SharedFree
        }

        Some(Ownership::SharedFree) | None => Ownership::SharedFree,
    };

    bind_target(env, target, target_state);
}

pub(super) fn transfer_terminator(
    context: &OwnershipTransferContext<'_>,
    env: &TypeEnvironment,
    block: &IrBlock,
    stats: &mut BlockTransferStats,
) {
    let site = DiagnosticSite {
        block: block.id,
        statement: None,
        location: block.terminator_location,
    };

    match &block.terminator {
        IrTerminator::If {
            condition: Some(condition),
            ..
        } => {
            read_path(context, env, condition, site, stats);
        }

        IrTerminator::Return(Some(value)) => {
            check_return(context, env, value, site, stats);
        }

        IrTerminator::If {
            condition: None, ..
        }
        | IrTerminator::Return(None)
        | IrTerminator::Jump { .. }
        | IrTerminator::Panic => {}
    }
}

fn check_return(
    context: &OwnershipTransferContext<'_>,
    env: &TypeEnvironment,
    value: &AccessPath,
    site: DiagnosticSite,
    stats: &mut BlockTransferStats,
) {
    let returns = context.routine.contract.returns;
    let current = match env.resolve(value) {
        Some(Ownership::Moved) => {
            stats.report(|| context.diagnostics.use_of_moved(site, value));
            return;
        }
        Some(current) => current,
        None => Ownership::SharedFree,
    };

    if !current.satisfies_return(returns) {
        stats.report(|| {
            context
                .diagnostics
                .return_violation(site, value, returns, current)
        });
    }
}

/// Resolve `path` for a read. Reading a `Moved` path is reported; the state
/// is still returned so callers can fall back to `Moved` themselves.
/// None means the path is unconstrained on every route to this point.
pub(super) fn read_path(
    context: &OwnershipTransferContext<'_>,
    env: &TypeEnvironment,
    path: &AccessPath,
    site: DiagnosticSite,
    stats: &mut BlockTransferStats,
) -> Option<Ownership> {
    let current = env.resolve(path);
    if current == Some(Ownership::Moved) {
        stats.report(|| context.diagnostics.use_of_moved(site, path));
    }

    current
}

/// Writing `x.f.g` goes through `x.f`, which has to be usable.
pub(super) fn check_write_prefixes(
    context: &OwnershipTransferContext<'_>,
    env: &TypeEnvironment,
    target: &AccessPath,
    site: DiagnosticSite,
    stats: &mut BlockTransferStats,
) {
    if let Some(parent) = target.parent() {
        read_path(context, env, &parent, site, stats);
    }
}

/// Rebinding a path starts a new value, so whatever was known about its
/// fields no longer applies.
pub(super) fn bind_target(env: &mut TypeEnvironment, target: &AccessPath, ownership: Ownership) {
    *env = env
        .without_descendants(target)
        .with_binding(target, ownership);
}
