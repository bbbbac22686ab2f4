#![cfg(test)]

use crate::analysis::ownership::diagnostics::DiagnosticKind;
use crate::analysis::ownership::lattice::Ownership::{
    Moved, SharedBorrowed, SharedFree, UniqueBorrowed, UniqueFree,
};
use crate::analysis::ownership::tests::test_support::{
    Borrowed, Consumed, ReturnsShared, ReturnsUnique, Shared, Unique, analyze_alone, exit_binding,
    external, kinds, state_at,
};
use crate::ir::ir_builder::RoutineBuilder;
use crate::ir::ir_nodes::{BlockId, ContractTable};
use crate::string_interning::StringTable;

const ENTRY: BlockId = BlockId(0);

#[test]
fn copying_a_fresh_value_shares_both_names() {
    let mut string_table = StringTable::new();
    let routine = {
        let mut builder = RoutineBuilder::new(0, "alias", ReturnsShared, &mut string_table);
        builder
            .assign_null(ENTRY, "x")
            .copy(ENTRY, "z", "x")
            .ret(ENTRY, None);
        builder.build().expect("routine should build")
    };

    let (ownership, diagnostics) = analyze_alone(&routine, &ContractTable::new(), &string_table);

    assert!(diagnostics.is_empty());
    assert_eq!(state_at(&ownership, ENTRY, 0, "x", &mut string_table), Some(UniqueFree));
    assert_eq!(state_at(&ownership, ENTRY, 1, "x", &mut string_table), Some(SharedFree));
    assert_eq!(state_at(&ownership, ENTRY, 1, "z", &mut string_table), Some(SharedFree));
}

#[test]
fn copying_a_borrow_hands_it_off() {
    let mut string_table = StringTable::new();
    let routine = {
        let mut builder = RoutineBuilder::new(0, "hand_off", ReturnsShared, &mut string_table);
        builder
            .param("u", Borrowed, Unique)
            .param("s", Borrowed, Shared);
        builder
            .copy(ENTRY, "u2", "u")
            .copy(ENTRY, "s2", "s")
            .use_path(ENTRY, "u")
            .ret(ENTRY, None);
        builder.build().expect("routine should build")
    };

    let (ownership, diagnostics) = analyze_alone(&routine, &ContractTable::new(), &string_table);

    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UseOfMoved]);
    assert_eq!(diagnostics[0].statement, Some(2));
    assert_eq!(diagnostics[0].path.as_deref(), Some("u"));

    assert_eq!(exit_binding(&ownership, ENTRY, "u2", &mut string_table), Some(UniqueBorrowed));
    assert_eq!(exit_binding(&ownership, ENTRY, "u", &mut string_table), Some(Moved));
    assert_eq!(exit_binding(&ownership, ENTRY, "s2", &mut string_table), Some(SharedBorrowed));
    assert_eq!(exit_binding(&ownership, ENTRY, "s", &mut string_table), Some(Moved));
}

#[test]
fn copying_a_shared_value_leaves_the_source_alone() {
    let mut string_table = StringTable::new();
    let routine = {
        let mut builder = RoutineBuilder::new(0, "share", ReturnsShared, &mut string_table);
        builder.param("s", Consumed, Shared);
        builder.copy(ENTRY, "t", "s").use_path(ENTRY, "s").ret(ENTRY, None);
        builder.build().expect("routine should build")
    };

    let (ownership, diagnostics) = analyze_alone(&routine, &ContractTable::new(), &string_table);

    assert!(diagnostics.is_empty());
    assert_eq!(exit_binding(&ownership, ENTRY, "s", &mut string_table), Some(SharedFree));
    assert_eq!(exit_binding(&ownership, ENTRY, "t", &mut string_table), Some(SharedFree));
}

#[test]
fn declared_locals_are_unusable_until_assigned() {
    let mut string_table = StringTable::new();
    let routine = {
        let mut builder = RoutineBuilder::new(0, "uninit", ReturnsShared, &mut string_table);
        builder
            .declare(ENTRY, "x")
            .use_path(ENTRY, "x")
            .assign_null(ENTRY, "x")
            .use_path(ENTRY, "x")
            .ret(ENTRY, None);
        builder.build().expect("routine should build")
    };

    let (ownership, diagnostics) = analyze_alone(&routine, &ContractTable::new(), &string_table);

    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UseOfMoved]);
    assert_eq!(diagnostics[0].statement, Some(1));
    assert_eq!(state_at(&ownership, ENTRY, 0, "x", &mut string_table), Some(Moved));
    assert_eq!(state_at(&ownership, ENTRY, 2, "x", &mut string_table), Some(UniqueFree));
}

#[test]
fn copying_from_a_moved_path_poisons_the_target() {
    let mut string_table = StringTable::new();
    let routine = {
        let mut builder = RoutineBuilder::new(0, "poison", ReturnsShared, &mut string_table);
        builder
            .declare(ENTRY, "a")
            .copy(ENTRY, "b", "a")
            .use_path(ENTRY, "b")
            .ret(ENTRY, None);
        builder.build().expect("routine should build")
    };

    let (ownership, diagnostics) = analyze_alone(&routine, &ContractTable::new(), &string_table);

    // Fail-soft: both problems surface in one pass
    assert_eq!(
        kinds(&diagnostics),
        vec![DiagnosticKind::UseOfMoved, DiagnosticKind::UseOfMoved]
    );
    assert_eq!(diagnostics[0].path.as_deref(), Some("a"));
    assert_eq!(diagnostics[1].path.as_deref(), Some("b"));
    assert_eq!(exit_binding(&ownership, ENTRY, "b", &mut string_table), Some(Moved));
}

#[test]
fn rebinding_a_local_forgets_its_fields() {
    let mut string_table = StringTable::new();
    let routine = {
        let mut builder = RoutineBuilder::new(0, "rebind", ReturnsShared, &mut string_table);
        builder
            .assign_null(ENTRY, "x")
            .assign_null(ENTRY, "x.f")
            .assign_null(ENTRY, "x")
            .ret(ENTRY, None);
        builder.build().expect("routine should build")
    };

    let (ownership, _) = analyze_alone(&routine, &ContractTable::new(), &string_table);

    assert_eq!(state_at(&ownership, ENTRY, 1, "x.f", &mut string_table), Some(UniqueFree));
    assert_eq!(state_at(&ownership, ENTRY, 2, "x.f", &mut string_table), None);
}

#[test]
fn writing_a_field_of_a_consumed_object_is_a_use() {
    let mut string_table = StringTable::new();
    let mut contracts = ContractTable::new();
    external(&mut contracts, &mut string_table, "consume", &[(Consumed, Unique)], ReturnsShared);

    let routine = {
        let mut builder = RoutineBuilder::new(0, "write_after_move", ReturnsShared, &mut string_table);
        builder.param("x", Consumed, Unique);
        builder
            .call(ENTRY, "consume", &["x"])
            .assign_null(ENTRY, "x.f")
            .ret(ENTRY, None);
        builder.build().expect("routine should build")
    };

    let (_, diagnostics) = analyze_alone(&routine, &contracts, &string_table);

    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UseOfMoved]);
    assert_eq!(diagnostics[0].statement, Some(1));
    assert_eq!(diagnostics[0].path.as_deref(), Some("x"));
}

#[test]
fn fields_of_a_consumed_object_are_moved_too() {
    let mut string_table = StringTable::new();
    let mut contracts = ContractTable::new();
    external(&mut contracts, &mut string_table, "consume", &[(Consumed, Unique)], ReturnsShared);

    let routine = {
        let mut builder = RoutineBuilder::new(0, "field_after_move", ReturnsShared, &mut string_table);
        builder.param("x", Consumed, Unique);
        builder
            .call(ENTRY, "consume", &["x"])
            .use_path(ENTRY, "x.f.g")
            .ret(ENTRY, None);
        builder.build().expect("routine should build")
    };

    let (_, diagnostics) = analyze_alone(&routine, &contracts, &string_table);

    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UseOfMoved]);
    assert_eq!(diagnostics[0].path.as_deref(), Some("x.f.g"));
}

#[test]
fn unique_returns_need_a_free_unique_value() {
    let mut string_table = StringTable::new();
    let routine = {
        let mut builder = RoutineBuilder::new(0, "leak_borrow", ReturnsUnique, &mut string_table);
        builder.param("x", Borrowed, Unique);
        builder.ret(ENTRY, Some("x"));
        builder.build().expect("routine should build")
    };

    let (_, diagnostics) = analyze_alone(&routine, &ContractTable::new(), &string_table);

    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::ReturnContractViolated]);
    assert_eq!(diagnostics[0].statement, None);
    assert!(diagnostics[0].message.contains("unique"));
}

#[test]
fn shared_returns_accept_free_values_only() {
    let mut string_table = StringTable::new();
    let routines = [
        (Consumed, Shared, true),
        (Consumed, Unique, true),
        (Borrowed, Shared, false),
        (Borrowed, Unique, false),
    ];

    for (mode, required, accepted) in routines {
        let routine = {
            let mut builder = RoutineBuilder::new(0, "give_back", ReturnsShared, &mut string_table);
            builder.param("x", mode, required);
            builder.ret(ENTRY, Some("x"));
            builder.build().expect("routine should build")
        };

        let (_, diagnostics) = analyze_alone(&routine, &ContractTable::new(), &string_table);
        assert_eq!(diagnostics.is_empty(), accepted, "{mode} {required}");
    }
}

#[test]
fn returning_a_moved_value_is_a_use_of_moved() {
    let mut string_table = StringTable::new();
    let routine = {
        let mut builder = RoutineBuilder::new(0, "return_moved", ReturnsUnique, &mut string_table);
        builder.declare(ENTRY, "x").ret(ENTRY, Some("x"));
        builder.build().expect("routine should build")
    };

    let (_, diagnostics) = analyze_alone(&routine, &ContractTable::new(), &string_table);

    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UseOfMoved]);
}

#[test]
fn branch_conditions_are_reads() {
    let mut string_table = StringTable::new();
    let routine = {
        let mut builder = RoutineBuilder::new(0, "test_moved", ReturnsShared, &mut string_table);
        let then_block = builder.new_block();
        let else_block = builder.new_block();
        builder.declare(ENTRY, "flag");
        builder.branch(ENTRY, Some("flag"), then_block, else_block);
        builder.ret(then_block, None);
        builder.ret(else_block, None);
        builder.build().expect("routine should build")
    };

    let (_, diagnostics) = analyze_alone(&routine, &ContractTable::new(), &string_table);

    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UseOfMoved]);
    assert_eq!(diagnostics[0].block, ENTRY);
    assert_eq!(diagnostics[0].statement, None);
}
