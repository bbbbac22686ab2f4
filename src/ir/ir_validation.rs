//! IR Validation
//!
//! Per-routine structural checks run before ownership analysis. A routine
//! that fails here is malformed: the analysis cannot safely say anything
//! about it, so the driver reports it once and moves on to the next routine.
//!
//! On success the validator hands back a `RoutineLayout` so the driver and
//! transfer functions only need O(1) lookups.

use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::access_path::AccessPath;
use crate::ir::ir_nodes::{BlockId, IrBlock, IrRoutine, IrStatementKind, IrTerminator, TextLocation};
use crate::return_malformed_ir_error;
use crate::string_interning::{StringId, StringTable};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RoutineLayout {
    pub block_index_by_id: FxHashMap<BlockId, usize>,

    /// Breadth-first from the entry block
    pub reachable_blocks: Vec<BlockId>,
    pub predecessors: FxHashMap<BlockId, Vec<BlockId>>,

    /// Distinct paths mentioned anywhere in the routine, parameters included
    pub mentioned_paths: usize,
}

impl RoutineLayout {
    pub fn block<'a>(&self, routine: &'a IrRoutine, block_id: BlockId) -> Option<&'a IrBlock> {
        self.block_index_by_id
            .get(&block_id)
            .map(|index| &routine.blocks[*index])
    }

    pub fn predecessors_of(&self, block_id: BlockId) -> &[BlockId] {
        self.predecessors
            .get(&block_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub fn validate_routine(
    routine: &IrRoutine,
    string_table: &StringTable,
) -> Result<RoutineLayout, CompilerError> {
    RoutineValidator::new(routine, string_table).validate()
}

struct RoutineValidator<'a> {
    routine: &'a IrRoutine,
    string_table: &'a StringTable,
    block_index_by_id: FxHashMap<BlockId, usize>,
    known_locals: FxHashSet<StringId>,
    mentioned_paths: FxHashSet<AccessPath>,
}

impl<'a> RoutineValidator<'a> {
    fn new(routine: &'a IrRoutine, string_table: &'a StringTable) -> Self {
        Self {
            routine,
            string_table,
            block_index_by_id: FxHashMap::default(),
            known_locals: FxHashSet::default(),
            mentioned_paths: FxHashSet::default(),
        }
    }

    fn validate(mut self) -> Result<RoutineLayout, CompilerError> {
        self.collect_block_ids()?;
        self.collect_known_locals()?;
        self.validate_blocks()?;

        let reachable_blocks = self.collect_reachable_blocks();
        let predecessors = self.collect_predecessors(&reachable_blocks);

        Ok(RoutineLayout {
            block_index_by_id: self.block_index_by_id,
            reachable_blocks,
            predecessors,
            mentioned_paths: self.mentioned_paths.len(),
        })
    }

    fn collect_block_ids(&mut self) -> Result<(), CompilerError> {
        for (index, block) in self.routine.blocks.iter().enumerate() {
            if self.block_index_by_id.insert(block.id, index).is_some() {
                return_malformed_ir_error!(
                    format!(
                        "Duplicate block id {} in routine '{}'",
                        block.id,
                        self.routine_name()
                    ),
                    self.routine.location,
                    {
                        CompilationStage => "IR Validation",
                        RoutineName => self.routine_name(),
                        BlockName => block.id.to_string(),
                    }
                );
            }
        }

        if !self.block_index_by_id.contains_key(&self.routine.entry) {
            return_malformed_ir_error!(
                format!(
                    "Entry block {} of routine '{}' does not exist",
                    self.routine.entry,
                    self.routine_name()
                ),
                self.routine.location,
                {
                    CompilationStage => "IR Validation",
                    RoutineName => self.routine_name(),
                }
            );
        }

        Ok(())
    }

    fn collect_known_locals(&mut self) -> Result<(), CompilerError> {
        for param in &self.routine.contract.params {
            if !self.known_locals.insert(param.name) {
                return_malformed_ir_error!(
                    format!(
                        "Parameter '{}' is declared twice in routine '{}'",
                        self.string_table.resolve(param.name),
                        self.routine_name()
                    ),
                    self.routine.location,
                    {
                        CompilationStage => "IR Validation",
                        RoutineName => self.routine_name(),
                        PathName => self.string_table.resolve(param.name),
                    }
                );
            }
            self.mentioned_paths.insert(AccessPath::local(param.name));
        }

        for block in &self.routine.blocks {
            for statement in &block.statements {
                let defined = match &statement.kind {
                    IrStatementKind::Declare(local) => Some(*local),
                    IrStatementKind::Copy { target, .. } | IrStatementKind::AssignNull(target) => {
                        target.is_local().then(|| target.root())
                    }
                    IrStatementKind::Call {
                        result: Some(result),
                        ..
                    } => result.is_local().then(|| result.root()),
                    IrStatementKind::Call { result: None, .. } | IrStatementKind::Use(_) => None,
                };

                if let Some(local) = defined {
                    self.known_locals.insert(local);
                }
            }
        }

        Ok(())
    }

    fn validate_blocks(&mut self) -> Result<(), CompilerError> {
        let routine = self.routine;
        for block in &routine.blocks {
            for statement in &block.statements {
                match &statement.kind {
                    IrStatementKind::Declare(local) => {
                        self.mentioned_paths.insert(AccessPath::local(*local));
                    }
                    IrStatementKind::Copy { target, source } => {
                        self.require_known_path(target, statement.location)?;
                        self.require_known_path(source, statement.location)?;
                    }
                    IrStatementKind::AssignNull(target) | IrStatementKind::Use(target) => {
                        self.require_known_path(target, statement.location)?;
                    }
                    IrStatementKind::Call { args, result, .. } => {
                        for arg in args {
                            self.require_known_path(arg, statement.location)?;
                        }
                        if let Some(result) = result {
                            self.require_known_path(result, statement.location)?;
                        }
                    }
                }
            }

            self.validate_terminator(block)?;
        }

        Ok(())
    }

    fn validate_terminator(&mut self, block: &IrBlock) -> Result<(), CompilerError> {
        for successor in block.terminator.successors() {
            if !self.block_index_by_id.contains_key(&successor) {
                return_malformed_ir_error!(
                    format!(
                        "Block {} of routine '{}' jumps to unknown block {}",
                        block.id,
                        self.routine_name(),
                        successor
                    ),
                    block.terminator_location,
                    {
                        CompilationStage => "IR Validation",
                        RoutineName => self.routine_name(),
                        BlockName => successor.to_string(),
                    }
                );
            }
        }

        match &block.terminator {
            IrTerminator::If {
                condition: Some(path),
                ..
            }
            | IrTerminator::Return(Some(path)) => {
                self.require_known_path(path, block.terminator_location)
            }
            IrTerminator::If {
                condition: None, ..
            }
            | IrTerminator::Return(None)
            | IrTerminator::Jump { .. }
            | IrTerminator::Panic => Ok(()),
        }
    }

    fn require_known_path(
        &mut self,
        path: &AccessPath,
        location: TextLocation,
    ) -> Result<(), CompilerError> {
        if !self.known_locals.contains(&path.root()) {
            return_malformed_ir_error!(
                format!(
                    "Path '{}' in routine '{}' is rooted at a local that is never declared",
                    path.to_string(self.string_table),
                    self.routine_name()
                ),
                location,
                {
                    CompilationStage => "IR Validation",
                    RoutineName => self.routine_name(),
                    PathName => path.to_string(self.string_table),
                    PrimarySuggestion => "Declare the local or add it to the routine's parameter contract",
                }
            );
        }

        self.mentioned_paths.insert(path.clone());
        Ok(())
    }

    fn collect_reachable_blocks(&self) -> Vec<BlockId> {
        let mut visited = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        queue.push_back(self.routine.entry);

        while let Some(block_id) = queue.pop_front() {
            if !visited.insert(block_id) {
                continue;
            }

            order.push(block_id);

            let block = &self.routine.blocks[self.block_index_by_id[&block_id]];
            for next in block.terminator.successors() {
                queue.push_back(next);
            }
        }

        order
    }

    fn collect_predecessors(&self, reachable_blocks: &[BlockId]) -> FxHashMap<BlockId, Vec<BlockId>> {
        let mut predecessors: FxHashMap<BlockId, Vec<BlockId>> = FxHashMap::default();

        for block_id in reachable_blocks {
            let block = &self.routine.blocks[self.block_index_by_id[block_id]];
            for successor in block.terminator.successors() {
                let entry = predecessors.entry(successor).or_default();
                if !entry.contains(block_id) {
                    entry.push(*block_id);
                }
            }
        }

        predecessors
    }

    fn routine_name(&self) -> String {
        self.string_table.resolve(self.routine.name).to_owned()
    }
}
