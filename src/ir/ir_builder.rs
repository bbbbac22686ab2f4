//! Programmatic construction of routine CFGs.
//!
//! Front ends and tests describe a routine by appending statements to blocks
//! using textual paths (`"x"`, `"x.f.g"`). Every statement gets the next line
//! number so diagnostics point somewhere stable. Errors (bad path text,
//! unknown block ids, blocks without a terminator) are collected and returned
//! from `build`, so construction can be chained without `?` at every step.

use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::access_path::AccessPath;
use crate::ir::ir_nodes::{
    BlockId, CallTarget, ContractTable, IrBlock, IrRoutine, IrStatement, IrStatementKind,
    IrTerminator, ParameterContract, PassingMode, RequiredOwnership, ReturnContract,
    RoutineContract, RoutineId, TextLocation,
};
use crate::string_interning::{StringId, StringTable};

struct PendingBlock {
    id: BlockId,
    statements: Vec<IrStatement>,
    terminator: Option<(IrTerminator, TextLocation)>,
}

pub struct RoutineBuilder<'a> {
    string_table: &'a mut StringTable,
    id: RoutineId,
    name: StringId,
    params: Vec<ParameterContract>,
    returns: ReturnContract,
    blocks: Vec<PendingBlock>,
    next_line: i32,
    location: TextLocation,
    error: Option<CompilerError>,
}

impl<'a> RoutineBuilder<'a> {
    /// Starts a routine with an empty entry block `bb0`.
    pub fn new(
        id: u32,
        name: &str,
        returns: ReturnContract,
        string_table: &'a mut StringTable,
    ) -> Self {
        let name = string_table.intern(name);
        Self {
            string_table,
            id: RoutineId(id),
            name,
            params: Vec::new(),
            returns,
            blocks: vec![PendingBlock {
                id: BlockId(0),
                statements: Vec::new(),
                terminator: None,
            }],
            next_line: 1,
            location: TextLocation::new_just_line(1),
            error: None,
        }
    }

    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    pub fn param(
        &mut self,
        name: &str,
        mode: PassingMode,
        required: RequiredOwnership,
    ) -> &mut Self {
        let name = self.string_table.intern(name);
        self.params.push(ParameterContract {
            name,
            mode,
            required,
        });
        self
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(PendingBlock {
            id,
            statements: Vec::new(),
            terminator: None,
        });
        id
    }

    pub fn declare(&mut self, block: BlockId, local: &str) -> &mut Self {
        let local = self.string_table.intern(local);
        self.push_statement(block, IrStatementKind::Declare(local))
    }

    pub fn copy(&mut self, block: BlockId, target: &str, source: &str) -> &mut Self {
        let (Some(target), Some(source)) = (self.path(target), self.path(source)) else {
            return self;
        };
        self.push_statement(block, IrStatementKind::Copy { target, source })
    }

    pub fn assign_null(&mut self, block: BlockId, target: &str) -> &mut Self {
        let Some(target) = self.path(target) else {
            return self;
        };
        self.push_statement(block, IrStatementKind::AssignNull(target))
    }

    pub fn call(&mut self, block: BlockId, callee: &str, args: &[&str]) -> &mut Self {
        let callee = self.string_table.intern(callee);
        self.push_call(block, CallTarget::Direct(callee), args, None)
    }

    pub fn call_into(
        &mut self,
        block: BlockId,
        result: &str,
        callee: &str,
        args: &[&str],
    ) -> &mut Self {
        let callee = self.string_table.intern(callee);
        self.push_call(block, CallTarget::Direct(callee), args, Some(result))
    }

    pub fn call_virtual(
        &mut self,
        block: BlockId,
        result: Option<&str>,
        callees: &[&str],
        args: &[&str],
    ) -> &mut Self {
        let callees = callees
            .iter()
            .map(|callee| self.string_table.intern(callee))
            .collect::<Vec<_>>();
        self.push_call(block, CallTarget::Virtual(callees), args, result)
    }

    pub fn use_path(&mut self, block: BlockId, path: &str) -> &mut Self {
        let Some(path) = self.path(path) else {
            return self;
        };
        self.push_statement(block, IrStatementKind::Use(path))
    }

    pub fn jump(&mut self, block: BlockId, target: BlockId) -> &mut Self {
        self.set_terminator(block, IrTerminator::Jump { target })
    }

    pub fn branch(
        &mut self,
        block: BlockId,
        condition: Option<&str>,
        then_block: BlockId,
        else_block: BlockId,
    ) -> &mut Self {
        let condition = match condition {
            Some(text) => match self.path(text) {
                Some(path) => Some(path),
                None => return self,
            },
            None => None,
        };

        self.set_terminator(
            block,
            IrTerminator::If {
                condition,
                then_block,
                else_block,
            },
        )
    }

    pub fn ret(&mut self, block: BlockId, value: Option<&str>) -> &mut Self {
        let value = match value {
            Some(text) => match self.path(text) {
                Some(path) => Some(path),
                None => return self,
            },
            None => None,
        };

        self.set_terminator(block, IrTerminator::Return(value))
    }

    pub fn panic(&mut self, block: BlockId) -> &mut Self {
        self.set_terminator(block, IrTerminator::Panic)
    }

    pub fn build(self) -> Result<IrRoutine, CompilerError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut blocks = Vec::with_capacity(self.blocks.len());
        for pending in self.blocks {
            let Some((terminator, terminator_location)) = pending.terminator else {
                return Err(CompilerError::new_malformed_ir_error(
                    format!(
                        "Block {} of routine '{}' has no terminator",
                        pending.id,
                        self.string_table.resolve(self.name)
                    ),
                    self.location,
                ));
            };

            blocks.push(IrBlock {
                id: pending.id,
                statements: pending.statements,
                terminator,
                terminator_location,
            });
        }

        Ok(IrRoutine {
            id: self.id,
            name: self.name,
            contract: RoutineContract::new(self.params, self.returns),
            entry: BlockId(0),
            blocks,
            location: self.location,
        })
    }

    fn push_call(
        &mut self,
        block: BlockId,
        target: CallTarget,
        args: &[&str],
        result: Option<&str>,
    ) -> &mut Self {
        let mut parsed_args = Vec::with_capacity(args.len());
        for arg in args {
            let Some(path) = self.path(arg) else {
                return self;
            };
            parsed_args.push(path);
        }

        let result = match result {
            Some(text) => match self.path(text) {
                Some(path) => Some(path),
                None => return self,
            },
            None => None,
        };

        self.push_statement(
            block,
            IrStatementKind::Call {
                target,
                args: parsed_args,
                result,
            },
        )
    }

    fn push_statement(&mut self, block: BlockId, kind: IrStatementKind) -> &mut Self {
        let location = self.take_line();
        let Some(pending) = self.pending_block(block) else {
            return self;
        };

        pending.statements.push(IrStatement { kind, location });
        self
    }

    fn set_terminator(&mut self, block: BlockId, terminator: IrTerminator) -> &mut Self {
        let location = self.take_line();
        let Some(pending) = self.pending_block(block) else {
            return self;
        };

        pending.terminator = Some((terminator, location));
        self
    }

    fn pending_block(&mut self, block: BlockId) -> Option<&mut PendingBlock> {
        let index = block.0 as usize;
        if index >= self.blocks.len() {
            self.record_error(format!("Unknown block {block} while building routine"));
            return None;
        }

        Some(&mut self.blocks[index])
    }

    fn path(&mut self, text: &str) -> Option<AccessPath> {
        let path = AccessPath::parse(text, self.string_table);
        if path.is_none() {
            self.record_error(format!("'{text}' is not a valid access path"));
        }
        path
    }

    fn take_line(&mut self) -> TextLocation {
        self.next_line += 1;
        TextLocation::new_just_line(self.next_line)
    }

    fn record_error(&mut self, msg: String) {
        if self.error.is_none() {
            let location = TextLocation::new_just_line(self.next_line);
            self.error = Some(CompilerError::new_malformed_ir_error(msg, location));
        }
    }
}

/// Register the contract of a callee whose body is not part of the program.
/// Parameters are named `p0`, `p1`, ... in argument order.
pub fn declare_external_contract(
    contracts: &mut ContractTable,
    string_table: &mut StringTable,
    name: &str,
    params: &[(PassingMode, RequiredOwnership)],
    returns: ReturnContract,
) -> Result<StringId, CompilerError> {
    let name = string_table.intern(name);
    let params = params
        .iter()
        .enumerate()
        .map(|(index, (mode, required))| ParameterContract {
            name: string_table.intern(&format!("p{index}")),
            mode: *mode,
            required: *required,
        })
        .collect::<Vec<_>>();

    contracts.register(name, RoutineContract::new(params, returns), string_table)?;
    Ok(name)
}
