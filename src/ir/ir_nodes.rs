//! ============================================================
//!                     Ownership IR Nodes
//! ============================================================
//! The per-routine control-flow graph the front end hands to the
//! ownership analysis.
//!  - Three-address style statements over canonical access paths
//!  - Basic blocks with explicit successor edges (back edges allowed)
//!  - Declared parameter/return contracts, never inferred
//!
//! The analysis treats everything in here as read-only. Callees are
//! referenced by name and resolved through the `ContractTable`; their
//! bodies are never inspected.

use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::access_path::AccessPath;
use crate::return_malformed_ir_error;
use crate::string_interning::{StringId, StringTable};
use rustc_hash::FxHashMap;
use serde::Serialize;

// ============================================================
// Stable IDs
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RoutineId(pub u32);

// ============================================================
// Source locations
// ============================================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CharPosition {
    pub line_number: i32,
    pub char_column: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TextLocation {
    pub start_pos: CharPosition,
    pub end_pos: CharPosition,
}

impl TextLocation {
    pub fn new_just_line(line: i32) -> Self {
        Self {
            start_pos: CharPosition {
                line_number: line,
                char_column: 0,
            },
            end_pos: CharPosition {
                line_number: line,
                char_column: 120, // Arbitrary number
            },
        }
    }

    pub fn line(&self) -> i32 {
        self.start_pos.line_number
    }
}

// ============================================================
// Contracts
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PassingMode {
    /// The callee promises not to retain an alias past the call.
    Borrowed,

    /// Ownership moves into the callee. The caller's path dies.
    Consumed,
}

/// Minimum ownership the callee needs, orthogonal to the passing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RequiredOwnership {
    Unique,
    Shared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReturnContract {
    ReturnsUnique,
    ReturnsShared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterContract {
    pub name: StringId,
    pub mode: PassingMode,
    pub required: RequiredOwnership,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineContract {
    pub params: Vec<ParameterContract>,
    pub returns: ReturnContract,
}

impl RoutineContract {
    pub fn new(params: Vec<ParameterContract>, returns: ReturnContract) -> Self {
        Self { params, returns }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Callee name → declared contract.
///
/// Holds both the routines being analysed and externally declared callees
/// whose bodies the analysis never sees.
#[derive(Debug, Clone, Default)]
pub struct ContractTable {
    contracts: FxHashMap<StringId, RoutineContract>,
}

impl ContractTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: StringId,
        contract: RoutineContract,
        string_table: &StringTable,
    ) -> Result<(), CompilerError> {
        if self.contracts.contains_key(&name) {
            return_malformed_ir_error!(
                format!(
                    "Contract for callee '{}' is registered twice",
                    string_table.resolve(name)
                ),
                TextLocation::default(),
                {
                    CompilationStage => "Contract Registration",
                    CalleeName => string_table.resolve(name),
                }
            );
        }

        self.contracts.insert(name, contract);
        Ok(())
    }

    pub fn get(&self, name: StringId) -> Option<&RoutineContract> {
        self.contracts.get(&name)
    }
}

// ============================================================
// Program
// ============================================================
#[derive(Debug, Clone, Default)]
pub struct IrProgram {
    pub routines: Vec<IrRoutine>,
    pub contracts: ContractTable,
}

impl IrProgram {
    /// Build a program, registering each routine's own contract under its name
    /// next to the external ones already in `contracts`.
    pub fn new(
        routines: Vec<IrRoutine>,
        mut contracts: ContractTable,
        string_table: &StringTable,
    ) -> Result<Self, CompilerError> {
        for routine in &routines {
            contracts.register(routine.name, routine.contract.clone(), string_table)?;
        }

        Ok(Self {
            routines,
            contracts,
        })
    }
}

// ============================================================
// Routines
// ============================================================
#[derive(Debug, Clone)]
pub struct IrRoutine {
    pub id: RoutineId,
    pub name: StringId,
    pub contract: RoutineContract,
    pub entry: BlockId,
    pub blocks: Vec<IrBlock>,
    pub location: TextLocation,
}

// ============================================================
// Blocks
// ============================================================
#[derive(Debug, Clone)]
pub struct IrBlock {
    pub id: BlockId,
    pub statements: Vec<IrStatement>,
    pub terminator: IrTerminator,
    pub terminator_location: TextLocation,
}

// ============================================================
// Statements
// ============================================================
#[derive(Debug, Clone)]
pub struct IrStatement {
    pub kind: IrStatementKind,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub enum IrStatementKind {
    /// `declare x` with no initializer
    Declare(StringId),

    /// `target := source`, a copy of an already bound path
    Copy {
        target: AccessPath,
        source: AccessPath,
    },

    /// `target := null`
    AssignNull(AccessPath),

    /// `call(args)` or `result := call(args)`
    Call {
        target: CallTarget,
        args: Vec<AccessPath>,
        result: Option<AccessPath>,
    },

    /// A read whose value is discarded (conditions, field reads for effect)
    Use(AccessPath),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    Direct(StringId),

    /// Virtual dispatch: any of these callees may run.
    Virtual(Vec<StringId>),
}

impl CallTarget {
    pub fn candidates(&self) -> &[StringId] {
        match self {
            CallTarget::Direct(name) => std::slice::from_ref(name),
            CallTarget::Virtual(names) => names,
        }
    }
}

// ============================================================
// Terminators
// ============================================================
#[derive(Debug, Clone)]
pub enum IrTerminator {
    Jump {
        target: BlockId,
    },

    If {
        condition: Option<AccessPath>,
        then_block: BlockId,
        else_block: BlockId,
    },

    Return(Option<AccessPath>),

    /// Control never leaves this block normally.
    Panic,
}

impl IrTerminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            IrTerminator::Jump { target } => vec![*target],

            IrTerminator::If {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],

            IrTerminator::Return(_) | IrTerminator::Panic => Vec::new(),
        }
    }
}
