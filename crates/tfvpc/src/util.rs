//! small pure helpers shared by the config loader and the vpc module
use indexmap::IndexMap;
use std::hash::Hash;

/// Merge mappings, later sources override earlier ones
///
/// A key keeps the position of its first appearance, its value is taken from the
/// last source that contains it.
pub fn merge<K, V, I, M>(sources: I) -> IndexMap<K, V>
where
    K: Hash + Eq,
    I: IntoIterator<Item = M>,
    M: IntoIterator<Item = (K, V)>,
{
    let mut merged = IndexMap::new();
    for source in sources {
        merged.extend(source);
    }
    merged
}

/// Element at `index`, wrapping around the end of `items`
///
/// Used to cycle a short list of availability zones across a longer list of subnets.
pub fn element<T>(items: &[T], index: usize) -> Option<&T> {
    if items.is_empty() {
        return None;
    }

    items.get(index % items.len())
}

/// Values that [coalesce] skips over
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for &str {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Blank for &[T] {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

macro_rules! never_blank {
    ($($ty:ty),+) => {
        $(
            impl Blank for $ty {
                fn is_blank(&self) -> bool {
                    false
                }
            }
        )+
    };
}

never_blank!(bool, i32, i64, u8, u32, u64, usize);

/// First candidate that is neither absent nor blank
pub fn coalesce<T, I>(candidates: I) -> Result<T, CoalesceError>
where
    T: Blank,
    I: IntoIterator<Item = Option<T>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.is_blank())
        .ok_or(CoalesceError)
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("no non-empty value to coalesce")]
pub struct CoalesceError;

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn map(pairs: &[(&'static str, &'static str)]) -> IndexMap<&'static str, &'static str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn merge_disjoint_keys() {
        let merged = merge([map(&[("a", "b"), ("c", "d")]), map(&[("e", "f"), ("g", "h")])]);

        assert_eq!(
            merged,
            map(&[("a", "b"), ("c", "d"), ("e", "f"), ("g", "h")])
        );
    }

    #[test]
    fn merge_many_sources() {
        let merged = merge([
            map(&[("a", "b")]),
            map(&[("g", "h")]),
            map(&[("c", "d")]),
            map(&[("e", "f")]),
        ]);

        assert_eq!(merged.len(), 4);
        assert_eq!(merged["a"], "b");
        assert_eq!(merged["c"], "d");
        assert_eq!(merged["e"], "f");
        assert_eq!(merged["g"], "h");
    }

    #[test]
    fn merge_later_source_wins() {
        let merged = merge([
            map(&[("a", "b"), ("c", "d")]),
            map(&[("e", "f"), ("c", "z")]),
            map(&[("e", "f"), ("c", "x")]),
        ]);

        assert_eq!(merged, map(&[("a", "b"), ("c", "x"), ("e", "f")]));
    }

    #[test]
    fn merge_nothing() {
        let merged = merge(Vec::<IndexMap<String, String>>::new());
        assert!(merged.is_empty());
    }

    #[test]
    fn element_in_range() {
        assert_eq!(element(&["a", "b", "c"], 0), Some(&"a"));
    }

    #[test]
    fn element_wraps_around() {
        let items = ["a", "b", "c"];
        assert_eq!(element(&items, 3), Some(&"a"));
        assert_eq!(element(&items, 4), Some(&"b"));
        assert_eq!(element(&items, 5), Some(&"c"));
        assert_eq!(element(&items, 301), Some(&"b"));
    }

    #[test]
    fn element_is_index_modulo_len() {
        let items = ["a", "b", "c", "d", "e"];
        for index in 0..100 {
            assert_eq!(element(&items, index), Some(&items[index % items.len()]));
        }
    }

    #[test]
    fn element_of_nothing() {
        assert_eq!(element::<&str>(&[], 2), None);
    }

    #[test]
    fn coalesce_skips_empty_strings() {
        assert_eq!(coalesce([Some("a"), Some("b")]), Ok("a"));
        assert_eq!(coalesce([Some(""), Some("b")]), Ok("b"));
    }

    #[test]
    fn coalesce_skips_absent() {
        assert_eq!(coalesce([None, Some(1)]), Ok(1));
        assert_eq!(coalesce([Some(1), Some(2)]), Ok(1));
    }

    #[test]
    fn coalesce_lists() {
        let empty: Vec<u8> = vec![];
        assert_eq!(coalesce([Some(empty), Some(vec![1])]), Ok(vec![1]));
    }

    #[test]
    fn coalesce_fails_without_candidate() {
        assert_eq!(coalesce([Some(""), None]), Err(CoalesceError));
        assert_eq!(coalesce(Vec::<Option<String>>::new()), Err(CoalesceError));
    }
}
