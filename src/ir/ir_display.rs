use crate::ir::ir_nodes::{
    BlockId, CallTarget, IrBlock, IrRoutine, IrStatement, IrStatementKind, IrTerminator,
    ParameterContract, PassingMode, RequiredOwnership, ReturnContract, RoutineContract, RoutineId,
};
use crate::string_interning::StringTable;
use std::fmt::{Display, Formatter, Result as FmtResult, Write};

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "bb{}", self.0)
    }
}

impl Display for RoutineId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "routine{}", self.0)
    }
}

impl Display for PassingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PassingMode::Borrowed => write!(f, "borrowed"),
            PassingMode::Consumed => write!(f, "consumed"),
        }
    }
}

impl Display for RequiredOwnership {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RequiredOwnership::Unique => write!(f, "unique"),
            RequiredOwnership::Shared => write!(f, "shared"),
        }
    }
}

impl Display for ReturnContract {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ReturnContract::ReturnsUnique => write!(f, "unique"),
            ReturnContract::ReturnsShared => write!(f, "shared"),
        }
    }
}

pub fn display_parameter(param: &ParameterContract, string_table: &StringTable) -> String {
    format!(
        "{}: {} {}",
        string_table.resolve(param.name),
        param.mode,
        param.required
    )
}

pub fn display_contract(contract: &RoutineContract, string_table: &StringTable) -> String {
    let params = contract
        .params
        .iter()
        .map(|param| display_parameter(param, string_table))
        .collect::<Vec<_>>()
        .join(", ");

    format!("({params}) -> {}", contract.returns)
}

pub fn display_call_target(target: &CallTarget, string_table: &StringTable) -> String {
    match target {
        CallTarget::Direct(name) => string_table.resolve(*name).to_owned(),
        CallTarget::Virtual(names) => {
            let names = names
                .iter()
                .map(|name| string_table.resolve(*name))
                .collect::<Vec<_>>()
                .join(" | ");
            format!("dyn[{names}]")
        }
    }
}

pub fn display_statement(statement: &IrStatement, string_table: &StringTable) -> String {
    match &statement.kind {
        IrStatementKind::Declare(local) => format!("declare {}", string_table.resolve(*local)),

        IrStatementKind::Copy { target, source } => format!(
            "{} := {}",
            target.to_string(string_table),
            source.to_string(string_table)
        ),

        IrStatementKind::AssignNull(target) => {
            format!("{} := null", target.to_string(string_table))
        }

        IrStatementKind::Call {
            target,
            args,
            result,
        } => {
            let args = args
                .iter()
                .map(|arg| arg.to_string(string_table))
                .collect::<Vec<_>>()
                .join(", ");
            let call = format!("{}({args})", display_call_target(target, string_table));

            match result {
                Some(result) => format!("{} := {call}", result.to_string(string_table)),
                None => call,
            }
        }

        IrStatementKind::Use(path) => format!("use {}", path.to_string(string_table)),
    }
}

pub fn display_terminator(terminator: &IrTerminator, string_table: &StringTable) -> String {
    match terminator {
        IrTerminator::Jump { target } => format!("jump {target}"),

        IrTerminator::If {
            condition,
            then_block,
            else_block,
        } => match condition {
            Some(condition) => format!(
                "if {} then {then_block} else {else_block}",
                condition.to_string(string_table)
            ),
            None => format!("if * then {then_block} else {else_block}"),
        },

        IrTerminator::Return(Some(path)) => format!("return {}", path.to_string(string_table)),
        IrTerminator::Return(None) => String::from("return"),
        IrTerminator::Panic => String::from("panic"),
    }
}

pub fn display_block(block: &IrBlock, string_table: &StringTable) -> String {
    let mut output = format!("{}:\n", block.id);
    for statement in &block.statements {
        let _ = writeln!(output, "    {}", display_statement(statement, string_table));
    }
    let _ = writeln!(
        output,
        "    {}",
        display_terminator(&block.terminator, string_table)
    );
    output
}

pub fn display_routine(routine: &IrRoutine, string_table: &StringTable) -> String {
    let mut output = format!(
        "routine {} {} entry={}\n",
        string_table.resolve(routine.name),
        display_contract(&routine.contract, string_table),
        routine.entry
    );

    for block in &routine.blocks {
        output.push_str(&display_block(block, string_table));
    }

    output
}
