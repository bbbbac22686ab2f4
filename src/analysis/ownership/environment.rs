use crate::analysis::ownership::lattice::Ownership;
use crate::analysis::ownership::types::{EnvironmentSnapshot, PathOwnershipSnapshot};
use crate::ir::access_path::AccessPath;
use crate::string_interning::StringTable;
use im::OrdMap;

/// The ownership state of every constrained path at one program point.
///
/// Environments are values. Every "update" returns a new environment that
/// shares structure with the old one, so a predecessor's state is never
/// changed by its successors. Paths missing from the map are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeEnvironment {
    bindings: OrdMap<AccessPath, Ownership>,
}

impl TypeEnvironment {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The exact binding for `path`, or None when it is unconstrained.
    pub fn lookup(&self, path: &AccessPath) -> Option<Ownership> {
        self.bindings.get(path).copied()
    }

    /// The binding for `path`, falling back to its nearest bound ancestor.
    /// A field chain with no binding of its own lives inside whatever object
    /// it hangs off, so it carries that object's state.
    pub fn resolve(&self, path: &AccessPath) -> Option<Ownership> {
        if let Some(ownership) = self.lookup(path) {
            return Some(ownership);
        }

        path.ancestors()
            .find_map(|ancestor| self.bindings.get(&ancestor).copied())
    }

    pub fn with_binding(&self, path: &AccessPath, ownership: Ownership) -> Self {
        Self {
            bindings: self.bindings.update(path.clone(), ownership),
        }
    }

    /// Drops bindings strictly below `path`. Used when `path` is rebound to a
    /// new value, since `x.f` no longer names the field of the old object.
    pub fn without_descendants(&self, path: &AccessPath) -> Self {
        let stale = self
            .bindings
            .keys()
            .filter(|candidate| path.is_strict_prefix_of(candidate))
            .cloned()
            .collect::<Vec<_>>();

        if stale.is_empty() {
            return self.clone();
        }

        let mut bindings = self.bindings.clone();
        for candidate in stale {
            bindings.remove(&candidate);
        }

        Self { bindings }
    }

    /// Binds `path` and marks every explicitly bound descendant `Moved` as well.
    pub fn with_subtree_moved(&self, path: &AccessPath) -> Self {
        let mut bindings = self.bindings.clone();
        let descendants = self
            .bindings
            .keys()
            .filter(|candidate| path.is_strict_prefix_of(candidate))
            .cloned()
            .collect::<Vec<_>>();

        for descendant in descendants {
            bindings.insert(descendant, Ownership::Moved);
        }
        bindings.insert(path.clone(), Ownership::Moved);

        Self { bindings }
    }

    /// Control-flow merge of two predecessor environments.
    ///
    /// A path takes the least upper bound of what each edge says about it:
    /// if either edge leaves it weaker, it is weaker at the join. An edge
    /// with no binding for the path still constrains it through a bound
    /// ancestor (`x.f` inherits a moved `x`). Only a path the other edge
    /// knows nothing about, directly or through an ancestor, is carried
    /// through unchanged.
    pub fn merge_pointwise(&self, other: &TypeEnvironment) -> TypeEnvironment {
        if other.bindings.is_empty() {
            return self.clone();
        }
        if self.bindings.is_empty() {
            return other.clone();
        }

        let mut bindings = self.bindings.clone();
        for (path, ownership) in other.bindings.iter() {
            let merged = match self.resolve(path) {
                Some(existing) => existing.join(*ownership),
                None => *ownership,
            };
            bindings.insert(path.clone(), merged);
        }

        // Paths only this side binds, weakened by the other side's ancestors
        for (path, ownership) in self.bindings.iter() {
            if other.bindings.contains_key(path) {
                continue;
            }
            if let Some(inherited) = other.resolve(path) {
                bindings.insert(path.clone(), ownership.join(inherited));
            }
        }

        Self { bindings }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccessPath, &Ownership)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Every path whose own binding is unique. These are the paths a heap
    /// encoding may treat as free of aliases at this point.
    pub fn unique_paths(&self) -> Vec<&AccessPath> {
        self.bindings
            .iter()
            .filter(|(_, ownership)| ownership.is_unique())
            .map(|(path, _)| path)
            .collect()
    }

    pub fn snapshot(&self, string_table: &StringTable) -> EnvironmentSnapshot {
        let mut paths = self
            .bindings
            .iter()
            .map(|(path, ownership)| PathOwnershipSnapshot {
                path: path.to_string(string_table),
                ownership: *ownership,
            })
            .collect::<Vec<_>>();
        paths.sort_by(|left, right| left.path.cmp(&right.path));

        EnvironmentSnapshot { paths }
    }

    pub fn display(&self, string_table: &StringTable) -> String {
        let entries = self
            .snapshot(string_table)
            .paths
            .into_iter()
            .map(|entry| format!("{}: {}", entry.path, entry.ownership))
            .collect::<Vec<_>>()
            .join(", ");

        format!("{{{entries}}}")
    }
}

impl FromIterator<(AccessPath, Ownership)> for TypeEnvironment {
    fn from_iter<T: IntoIterator<Item = (AccessPath, Ownership)>>(iter: T) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}
