//! The five-element ownership lattice.
//!
//! ```text
//!                 Moved            (top)
//!                   |
//!             SharedBorrowed
//!              /          \
//!   UniqueBorrowed      SharedFree
//!              \          /
//!               UniqueFree         (bottom)
//! ```
//!
//! Lower is stronger: a lower state permits everything a higher one does.
//! `UniqueBorrowed` and `SharedFree` are the only incomparable pair.

use crate::ir::ir_nodes::{PassingMode, RequiredOwnership, ReturnContract};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Ownership {
    /// Sole reference. May be read, written, passed anywhere or consumed.
    UniqueFree,

    /// Sole reference, temporarily lent out. Readable, but must not be
    /// aliased further or consumed while borrowed.
    UniqueBorrowed,

    /// Other live aliases may exist. Readable; writes and consumption cannot
    /// assume the absence of aliases.
    SharedFree,

    /// Shared and lent out.
    SharedBorrowed,

    /// No longer usable.
    Moved,
}

impl Ownership {
    pub const ALL: [Ownership; 5] = [
        Ownership::UniqueFree,
        Ownership::UniqueBorrowed,
        Ownership::SharedFree,
        Ownership::SharedBorrowed,
        Ownership::Moved,
    ];

    /// Partial order test: `self ⊑ other`.
    pub fn leq(self, other: Ownership) -> bool {
        use Ownership::*;

        match (self, other) {
            (a, b) if a == b => true,
            (UniqueFree, _) | (_, Moved) => true,
            (UniqueBorrowed, SharedBorrowed) | (SharedFree, SharedBorrowed) => true,
            _ => false,
        }
    }

    /// Least upper bound.
    pub fn join(self, other: Ownership) -> Ownership {
        if self.leq(other) {
            other
        } else if other.leq(self) {
            self
        } else {
            // Only UniqueBorrowed and SharedFree are incomparable
            Ownership::SharedBorrowed
        }
    }

    /// Greatest lower bound.
    pub fn meet(self, other: Ownership) -> Ownership {
        if self.leq(other) {
            self
        } else if other.leq(self) {
            other
        } else {
            Ownership::UniqueFree
        }
    }

    pub fn is_unique(self) -> bool {
        matches!(self, Ownership::UniqueFree | Ownership::UniqueBorrowed)
    }

    /// Whether a value in this state meets a callee's minimum requirement.
    /// `Unique` accepts anything at or below `UniqueBorrowed`, `Shared` anything
    /// at or below `SharedBorrowed`. `Moved` satisfies nothing.
    pub fn satisfies(self, required: RequiredOwnership) -> bool {
        match required {
            RequiredOwnership::Unique => self.leq(Ownership::UniqueBorrowed),
            RequiredOwnership::Shared => self.leq(Ownership::SharedBorrowed),
        }
    }

    /// Whether this state may leave the routine under the return contract.
    /// Borrowed states never escape through a return.
    pub fn satisfies_return(self, contract: ReturnContract) -> bool {
        match contract {
            ReturnContract::ReturnsUnique => self == Ownership::UniqueFree,
            ReturnContract::ReturnsShared => self.leq(Ownership::SharedFree),
        }
    }

    /// Entry binding for a parameter declared with this contract.
    pub fn for_parameter(mode: PassingMode, required: RequiredOwnership) -> Ownership {
        match (mode, required) {
            (PassingMode::Consumed, RequiredOwnership::Unique) => Ownership::UniqueFree,
            (PassingMode::Borrowed, RequiredOwnership::Unique) => Ownership::UniqueBorrowed,
            (PassingMode::Consumed, RequiredOwnership::Shared) => Ownership::SharedFree,
            (PassingMode::Borrowed, RequiredOwnership::Shared) => Ownership::SharedBorrowed,
        }
    }

    /// Binding for a call result under the callee's return contract.
    pub fn for_return(contract: ReturnContract) -> Ownership {
        match contract {
            ReturnContract::ReturnsUnique => Ownership::UniqueFree,
            ReturnContract::ReturnsShared => Ownership::SharedFree,
        }
    }
}

impl Display for Ownership {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Ownership::UniqueFree => "UniqueFree",
            Ownership::UniqueBorrowed => "UniqueBorrowed",
            Ownership::SharedFree => "SharedFree",
            Ownership::SharedBorrowed => "SharedBorrowed",
            Ownership::Moved => "Moved",
        };
        write!(f, "{name}")
    }
}
