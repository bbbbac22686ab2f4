use crate::string_interning::{StringId, StringTable};

/// A canonical addressable location: a local, or a field chain hanging off one.
///
/// AccessPath stores its components as interned ids, so:
/// - Equality is structural (`x.f` == `x.f`, `x.f` != `x.g`)
/// - Comparison and hashing never touch string data
/// - Prefix checks (`x` is a prefix of `x.f.g`) are slice comparisons
///
/// Paths describe locations, not values. Two paths are the same location iff
/// their chains are identical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccessPath {
    /// First component is always the root local
    components: Vec<StringId>,
}

impl AccessPath {
    /// A bare local variable
    pub fn local(local: StringId) -> Self {
        Self {
            components: vec![local],
        }
    }

    /// Parse `x`, `x.f`, `x.f.g`, interning every component.
    /// Returns None for an empty string or an empty component (`x..f`, `.f`).
    pub fn parse(text: &str, string_table: &mut StringTable) -> Option<Self> {
        let mut components = Vec::new();
        for component in text.split('.') {
            let component = component.trim();
            if component.is_empty() {
                return None;
            }
            components.push(string_table.intern(component));
        }

        if components.is_empty() {
            return None;
        }

        Some(Self { components })
    }

    pub fn root(&self) -> StringId {
        self.components[0]
    }

    pub fn is_local(&self) -> bool {
        self.components.len() == 1
    }

    pub fn depth(&self) -> usize {
        self.components.len() - 1
    }

    /// The path with its last field removed. None for a bare local.
    pub fn parent(&self) -> Option<AccessPath> {
        if self.is_local() {
            return None;
        }

        Some(AccessPath {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    /// `x` is a prefix of `x`, `x.f` and `x.f.g`
    pub fn is_prefix_of(&self, other: &AccessPath) -> bool {
        other.components.starts_with(&self.components)
    }

    pub fn is_strict_prefix_of(&self, other: &AccessPath) -> bool {
        self.components.len() < other.components.len() && self.is_prefix_of(other)
    }

    /// True when one path is a prefix of the other (they name overlapping memory)
    pub fn overlaps(&self, other: &AccessPath) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    /// Proper prefixes, nearest first: `x.f.g` yields `x.f`, then `x`
    pub fn ancestors(&self) -> impl Iterator<Item = AccessPath> + '_ {
        (1..self.components.len()).rev().map(move |len| AccessPath {
            components: self.components[..len].to_vec(),
        })
    }

    pub fn to_string(&self, string_table: &StringTable) -> String {
        self.components
            .iter()
            .map(|component| string_table.resolve(*component))
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_builds_field_chains() {
        let mut table = StringTable::new();
        let path = AccessPath::parse("x.f.g", &mut table).expect("valid path");

        assert_eq!(path.depth(), 2);
        assert_eq!(table.resolve(path.root()), "x");
        assert_eq!(path.to_string(&table), "x.f.g");
        assert!(AccessPath::parse("", &mut table).is_none());
        assert!(AccessPath::parse("x..f", &mut table).is_none());
        assert!(AccessPath::parse(".f", &mut table).is_none());
    }

    #[test]
    fn paths_compare_structurally() {
        let mut table = StringTable::new();
        let first = AccessPath::parse("x.f", &mut table).expect("valid path");
        let second = AccessPath::parse("x.f", &mut table).expect("valid path");
        let other = AccessPath::parse("x.g", &mut table).expect("valid path");

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn prefix_relations() {
        let mut table = StringTable::new();
        let x = AccessPath::parse("x", &mut table).expect("valid path");
        let xf = AccessPath::parse("x.f", &mut table).expect("valid path");
        let xfg = AccessPath::parse("x.f.g", &mut table).expect("valid path");
        let xg = AccessPath::parse("x.g", &mut table).expect("valid path");

        assert!(x.is_prefix_of(&x));
        assert!(!x.is_strict_prefix_of(&x));
        assert!(x.is_strict_prefix_of(&xfg));
        assert!(xf.overlaps(&xfg));
        assert!(!xf.overlaps(&xg));
        assert_eq!(xfg.parent(), Some(xf.clone()));
        assert_eq!(x.parent(), None);
        assert_eq!(xfg.ancestors().collect::<Vec<_>>(), vec![xf, x]);
    }
}
