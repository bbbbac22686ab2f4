#![cfg(test)]

use crate::analysis::ownership::environment::TypeEnvironment;
use crate::analysis::ownership::lattice::Ownership;
use crate::analysis::ownership::lattice::Ownership::{
    Moved, SharedBorrowed, SharedFree, UniqueBorrowed, UniqueFree,
};
use crate::analysis::ownership::tests::test_support::{env_of, path};
use crate::ir::access_path::AccessPath;
use crate::string_interning::StringTable;
use proptest::prelude::*;

const PATH_POOL: [&str; 6] = ["x", "x.f", "x.f.g", "y", "y.h", "z"];

fn pooled_paths(string_table: &mut StringTable) -> Vec<AccessPath> {
    PATH_POOL
        .iter()
        .map(|text| path(text, string_table))
        .collect()
}

fn any_bindings() -> impl Strategy<Value = Vec<(usize, Ownership)>> {
    prop::collection::vec(
        (0..PATH_POOL.len(), prop::sample::select(Ownership::ALL.to_vec())),
        0..8,
    )
}

fn build(pool: &[AccessPath], bindings: &[(usize, Ownership)]) -> TypeEnvironment {
    bindings
        .iter()
        .fold(TypeEnvironment::empty(), |env, (index, ownership)| {
            env.with_binding(&pool[*index], *ownership)
        })
}

#[test]
fn absent_paths_are_carried_through_a_merge() {
    let mut string_table = StringTable::new();
    let branch = env_of(&[("p", UniqueFree)], &mut string_table);
    let untouched = TypeEnvironment::empty();

    let merged = untouched.merge_pointwise(&branch);
    assert!(untouched.is_empty());
    assert_eq!(merged.lookup(&path("p", &mut string_table)), Some(UniqueFree));
    assert_eq!(merged, branch.merge_pointwise(&untouched));
}

#[test]
fn fields_merge_with_the_other_side_ancestor() {
    let mut string_table = StringTable::new();
    let consumed = env_of(&[("x", Moved), ("y", SharedFree)], &mut string_table);
    let written = env_of(&[("x", UniqueFree), ("x.f", UniqueFree)], &mut string_table);
    let x_field = path("x.f", &mut string_table);

    for merged in [consumed.merge_pointwise(&written), written.merge_pointwise(&consumed)] {
        assert_eq!(merged.lookup(&x_field), Some(Moved));
        assert_eq!(merged.lookup(&path("x", &mut string_table)), Some(Moved));
        assert_eq!(merged.lookup(&path("y", &mut string_table)), Some(SharedFree));
    }
}

#[test]
fn shared_bindings_merge_to_the_weaker_state() {
    let mut string_table = StringTable::new();
    let left = env_of(&[("a", UniqueFree), ("b", UniqueBorrowed)], &mut string_table);
    let right = env_of(&[("a", SharedFree), ("b", SharedFree)], &mut string_table);

    let merged = left.merge_pointwise(&right);
    assert_eq!(merged.lookup(&path("a", &mut string_table)), Some(SharedFree));
    assert_eq!(merged.lookup(&path("b", &mut string_table)), Some(SharedBorrowed));
}

#[test]
fn updates_leave_the_original_untouched() {
    let mut string_table = StringTable::new();
    let x = path("x", &mut string_table);
    let before = env_of(&[("x", UniqueFree)], &mut string_table);

    let after = before.with_binding(&x, Moved);

    assert_eq!(before.lookup(&x), Some(UniqueFree));
    assert_eq!(after.lookup(&x), Some(Moved));
}

#[test]
fn fields_resolve_through_their_nearest_bound_ancestor() {
    let mut string_table = StringTable::new();
    let env = env_of(&[("x", UniqueBorrowed), ("x.f", SharedFree)], &mut string_table);

    let deep = path("x.f.g", &mut string_table);
    let sibling = path("x.h", &mut string_table);
    let unrelated = path("y.f", &mut string_table);

    assert_eq!(env.lookup(&deep), None);
    assert_eq!(env.resolve(&deep), Some(SharedFree));
    assert_eq!(env.resolve(&sibling), Some(UniqueBorrowed));
    assert_eq!(env.resolve(&unrelated), None);
}

#[test]
fn rebinding_drops_only_strict_descendants() {
    let mut string_table = StringTable::new();
    let env = env_of(
        &[
            ("x", UniqueFree),
            ("x.f", SharedFree),
            ("x.f.g", Moved),
            ("xy", SharedFree),
        ],
        &mut string_table,
    );

    let trimmed = env.without_descendants(&path("x", &mut string_table));

    assert_eq!(trimmed.len(), 2);
    assert_eq!(trimmed.lookup(&path("x", &mut string_table)), Some(UniqueFree));
    assert_eq!(trimmed.lookup(&path("xy", &mut string_table)), Some(SharedFree));
}

#[test]
fn moving_a_path_moves_its_bound_fields() {
    let mut string_table = StringTable::new();
    let env = env_of(&[("x", UniqueFree), ("x.f", SharedFree), ("y", UniqueFree)], &mut string_table);

    let moved = env.with_subtree_moved(&path("x", &mut string_table));

    assert_eq!(moved.lookup(&path("x", &mut string_table)), Some(Moved));
    assert_eq!(moved.lookup(&path("x.f", &mut string_table)), Some(Moved));
    assert_eq!(moved.lookup(&path("y", &mut string_table)), Some(UniqueFree));
}

#[test]
fn display_lists_paths_in_order() {
    let mut string_table = StringTable::new();
    let env = env_of(&[("y", SharedFree), ("x.f", UniqueFree)], &mut string_table);

    assert_eq!(
        env.display(&string_table),
        "{x.f: UniqueFree, y: SharedFree}"
    );
    assert_eq!(TypeEnvironment::empty().display(&string_table), "{}");
}

#[test]
fn unique_paths_lists_only_unique_bindings() {
    let mut string_table = StringTable::new();
    let env = env_of(
        &[("a", UniqueFree), ("b", SharedFree), ("c", UniqueBorrowed), ("d", Moved)],
        &mut string_table,
    );

    let unique = env
        .unique_paths()
        .into_iter()
        .map(|path| path.to_string(&string_table))
        .collect::<Vec<_>>();
    assert_eq!(unique, vec!["a", "c"]);
}

proptest! {
    #[test]
    fn merging_with_an_empty_environment_is_identity(bindings in any_bindings()) {
        let mut string_table = StringTable::new();
        let pool = pooled_paths(&mut string_table);
        let env = build(&pool, &bindings);

        prop_assert_eq!(env.merge_pointwise(&TypeEnvironment::empty()), env.clone());
        prop_assert_eq!(TypeEnvironment::empty().merge_pointwise(&env), env);
    }

    #[test]
    fn merge_is_commutative(left in any_bindings(), right in any_bindings()) {
        let mut string_table = StringTable::new();
        let pool = pooled_paths(&mut string_table);
        let left = build(&pool, &left);
        let right = build(&pool, &right);

        prop_assert_eq!(left.merge_pointwise(&right), right.merge_pointwise(&left));
    }

    #[test]
    fn merge_never_lowers_a_binding(left in any_bindings(), right in any_bindings()) {
        let mut string_table = StringTable::new();
        let pool = pooled_paths(&mut string_table);
        let left = build(&pool, &left);
        let right = build(&pool, &right);
        let merged = left.merge_pointwise(&right);

        for (path, ownership) in left.iter().chain(right.iter()) {
            let merged_state = merged.lookup(path);
            prop_assert!(merged_state.is_some());
            prop_assert!(ownership.leq(merged_state.unwrap_or(Moved)));
        }
    }

    #[test]
    fn merged_reads_are_no_stronger_than_either_edge(left in any_bindings(), right in any_bindings()) {
        let mut string_table = StringTable::new();
        let pool = pooled_paths(&mut string_table);
        let left = build(&pool, &left);
        let right = build(&pool, &right);
        let merged = left.merge_pointwise(&right);

        for path in &pool {
            let merged_state = merged.resolve(path);
            for edge_state in [left.resolve(path), right.resolve(path)].into_iter().flatten() {
                prop_assert!(merged_state.is_some_and(|state| edge_state.leq(state)));
            }
        }
    }
}
