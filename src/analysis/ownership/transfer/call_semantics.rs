//! Call-target resolution for ownership transfer.
//!
//! Maps a call target to the declared contract of every callee that may run.

use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::ir_nodes::{CallTarget, RoutineContract, TextLocation};
use crate::return_malformed_ir_error;
use crate::string_interning::StringId;

use super::OwnershipTransferContext;

#[derive(Debug, Clone, Copy)]
pub(super) struct CalleeContract<'a> {
    pub(super) name: StringId,
    pub(super) contract: &'a RoutineContract,
}

pub(super) fn resolve_call_contracts<'a>(
    context: &OwnershipTransferContext<'a>,
    target: &CallTarget,
    arg_len: usize,
    location: TextLocation,
) -> Result<Vec<CalleeContract<'a>>, CompilerError> {
    let candidates = target.candidates();
    if candidates.is_empty() {
        return_malformed_ir_error!(
            format!(
                "Virtual call in routine '{}' has no candidate callees",
                context.diagnostics.routine_name()
            ),
            location,
            {
                CompilationStage => "Ownership Analysis",
                RoutineName => context.diagnostics.routine_name(),
            }
        );
    }

    let mut resolved = Vec::with_capacity(candidates.len());
    for callee in candidates {
        resolved.push(resolve_callee(context, *callee, arg_len, location)?);
    }

    Ok(resolved)
}

fn resolve_callee<'a>(
    context: &OwnershipTransferContext<'a>,
    callee: StringId,
    arg_len: usize,
    location: TextLocation,
) -> Result<CalleeContract<'a>, CompilerError> {
    let Some(contract) = context.contracts.get(callee) else {
        return_malformed_ir_error!(
            format!(
                "Routine '{}' calls '{}', which has no declared contract",
                context.diagnostics.routine_name(),
                context.diagnostics.callee_name(callee)
            ),
            location,
            {
                CompilationStage => "Ownership Analysis",
                RoutineName => context.diagnostics.routine_name(),
                CalleeName => context.diagnostics.callee_name(callee),
                PrimarySuggestion => "Register the callee's contract before running the analysis",
            }
        );
    };

    if contract.arity() != arg_len {
        return_malformed_ir_error!(
            format!(
                "Call to '{}' in routine '{}' passes {} arguments, but its contract declares {}",
                context.diagnostics.callee_name(callee),
                context.diagnostics.routine_name(),
                arg_len,
                contract.arity()
            ),
            location,
            {
                CompilationStage => "Ownership Analysis",
                RoutineName => context.diagnostics.routine_name(),
                CalleeName => context.diagnostics.callee_name(callee),
                ExpectedArity => contract.arity().to_string(),
                FoundArity => arg_len.to_string(),
                PrimarySuggestion => "Ensure call argument count matches the callee's contract",
            }
        );
    }

    Ok(CalleeContract {
        name: callee,
        contract,
    })
}
