//! Flow-sensitive ownership and aliasing analysis over routine CFGs.
//!
//! A front end hands over one control-flow graph per routine together with
//! every callee's declared ownership contract. The analysis answers, for
//! each program point, which access paths may be treated as alias-free, and
//! reports uses the contracts do not permit.
//!
//! ```text
//! IrProgram ──validate──▶ RoutineLayout ──fixpoint──▶ stable block states
//!                                                        │
//!                                   report pass ◀────────┘
//!                                        │
//!                        OwnershipReport (states + diagnostics)
//! ```

pub mod settings;
pub mod string_interning;

pub mod ir;

pub mod compiler_messages {
    pub mod compiler_dev_logging;
    pub mod compiler_errors;
    pub mod display_messages;
}

pub mod analysis {
    pub mod ownership;
}

pub use analysis::ownership::{
    CancellationFlag, DiagnosticKind, Ownership, OwnershipDiagnostic, OwnershipReport,
    ProgramPoint, RoutineOwnership, RoutineStatus, TypeEnvironment, analyze_routine,
    check_ownership, check_ownership_with_cancellation,
};
pub use compiler_messages::compiler_errors::{CompilerError, ErrorType};
pub use ir::access_path::AccessPath;
pub use ir::ir_builder::{RoutineBuilder, declare_external_contract};
pub use ir::ir_nodes::{
    BlockId, ContractTable, IrProgram, IrRoutine, PassingMode, RequiredOwnership, ReturnContract,
};
pub use settings::AnalysisConfig;
pub use string_interning::{StringId, StringTable};
