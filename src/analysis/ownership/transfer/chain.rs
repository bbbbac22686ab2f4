//! Calls: argument chains, result binding and virtual dispatch.
//!
//! Arguments are processed strictly left to right against the callee's
//! parameter contracts, because what an earlier argument does to the
//! environment decides what later ones see. A virtual call runs the chain
//! once per candidate callee and merges the outcomes like a branch join.

use crate::analysis::ownership::diagnostics::DiagnosticSite;
use crate::analysis::ownership::environment::TypeEnvironment;
use crate::analysis::ownership::lattice::Ownership;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::access_path::AccessPath;
use crate::ir::ir_nodes::{CallTarget, PassingMode};

use super::call_semantics::{CalleeContract, resolve_call_contracts};
use super::{BlockTransferStats, OwnershipTransferContext, bind_target, check_write_prefixes};

pub(super) fn apply_call(
    context: &OwnershipTransferContext<'_>,
    env: &mut TypeEnvironment,
    target: &CallTarget,
    args: &[AccessPath],
    result: Option<&AccessPath>,
    site: DiagnosticSite,
    stats: &mut BlockTransferStats,
) -> Result<(), CompilerError> {
    let callees = resolve_call_contracts(context, target, args.len(), site.location)?;

    let mut merged: Option<TypeEnvironment> = None;
    let mut result_state: Option<Ownership> = None;

    for callee in &callees {
        let outgoing = apply_chain(context, env, callee, args, site, stats);
        let returned = Ownership::for_return(callee.contract.returns);

        merged = Some(match merged {
            Some(previous) => previous.merge_pointwise(&outgoing),
            None => outgoing,
        });
        result_state = Some(match result_state {
            Some(previous) => previous.join(returned),
            None => returned,
        });
    }

    if let Some(merged) = merged {
        *env = merged;
    }

    if let (Some(result), Some(result_state)) = (result, result_state) {
        check_write_prefixes(context, env, result, site, stats);
        bind_target(env, result, result_state);
    }

    Ok(())
}

/// One left-to-right pass over `args` for a single callee contract.
fn apply_chain(
    context: &OwnershipTransferContext<'_>,
    incoming: &TypeEnvironment,
    callee: &CalleeContract<'_>,
    args: &[AccessPath],
    site: DiagnosticSite,
    stats: &mut BlockTransferStats,
) -> TypeEnvironment {
    let mut env = incoming.clone();

    // Paths this chain moved into the callee, and every path passed so far
    let mut consumed_here: Vec<&AccessPath> = Vec::with_capacity(args.len());
    let mut passed: Vec<&AccessPath> = Vec::with_capacity(args.len());

    // Usage errors fall back to `Moved`, but only once the whole chain is
    // done. Applying them eagerly would turn a later mention of the same path
    // in this call into a second, misleading report.
    let mut fallback_moves: Vec<&AccessPath> = Vec::new();

    for (arg, param) in args.iter().zip(&callee.contract.params) {
        let consumes = param.mode == PassingMode::Consumed;

        match env.resolve(arg) {
            Some(Ownership::Moved) => {
                if consumed_here.iter().any(|earlier| earlier.overlaps(arg)) {
                    stats.report(|| context.diagnostics.consumed_twice(site, arg, callee.name));
                } else {
                    stats.report(|| context.diagnostics.use_of_moved(site, arg));
                }
            }

            state => {
                // Unconstrained paths promise nothing about aliasing
                let current = state.unwrap_or(Ownership::SharedFree);

                if consumes && passed.iter().any(|earlier| earlier.overlaps(arg)) {
                    stats.report(|| context.diagnostics.consumed_twice(site, arg, callee.name));
                    fallback_moves.push(arg);
                } else if !current.satisfies(param.required) {
                    stats.report(|| {
                        context.diagnostics.insufficient_for_parameter(
                            site,
                            arg,
                            callee.name,
                            param.name,
                            param.required,
                            current,
                        )
                    });
                    fallback_moves.push(arg);
                } else if consumes && current.is_unique() {
                    env = env.with_subtree_moved(arg);
                    consumed_here.push(arg);
                }
            }
        }

        passed.push(arg);
    }

    for path in fallback_moves {
        env = env.with_subtree_moved(path);
    }

    env
}
