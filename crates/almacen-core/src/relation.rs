//! # Relation Resolution
//!
//! The backend nests many-to-many relations in one of two shapes:
//!
//! ```text
//! Direct:      { "categorias": [ { "id_categoria": 1, ... } ] }
//! Join table:  { "proveedor_categorias": [ { "categoria": { "id_categoria": 1, ... } } ] }
//! ```
//!
//! [`Relation::resolve`] tries the direct shape first and falls back to the
//! join-table shape. The result collapses either to a structured list (for
//! computation) or to a deduplicated, comma-joined string (for reports).

use crate::types::join_names;

/// The shape a relation was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation<T> {
    /// Related records listed directly on the parent.
    Direct(Vec<T>),
    /// Related records reached through join rows.
    JoinTable(Vec<T>),
    /// Neither shape carried any record.
    Absent,
}

impl<T> Relation<T> {
    /// Picks the first shape that carries records.
    ///
    /// `join` is the join-table rows already unwrapped to their target
    /// records (rows without a target are dropped by the caller).
    ///
    /// ```rust
    /// use almacen_core::relation::Relation;
    ///
    /// let r = Relation::resolve(Some(vec![]), Some(vec!["a"]));
    /// assert_eq!(r, Relation::JoinTable(vec!["a"]));
    ///
    /// let r = Relation::resolve(Some(vec!["b"]), Some(vec!["a"]));
    /// assert_eq!(r, Relation::Direct(vec!["b"]));
    /// ```
    pub fn resolve(direct: Option<Vec<T>>, join: Option<Vec<T>>) -> Self {
        match (direct, join) {
            (Some(items), _) if !items.is_empty() => Relation::Direct(items),
            (_, Some(items)) if !items.is_empty() => Relation::JoinTable(items),
            _ => Relation::Absent,
        }
    }

    /// Structured list for computation contexts.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Relation::Direct(items) | Relation::JoinTable(items) => items,
            Relation::Absent => Vec::new(),
        }
    }

    /// Deduplicated, comma-joined display string for report contexts.
    pub fn display<F>(&self, name: F) -> String
    where
        F: Fn(&T) -> &str,
    {
        match self {
            Relation::Direct(items) | Relation::JoinTable(items) => {
                join_names(items.iter().map(|item| name(item)))
            }
            Relation::Absent => join_names(std::iter::empty()),
        }
    }
}

/// Removes records whose key was already seen, keeping the first occurrence.
pub fn dedup_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut seen: Vec<K> = Vec::with_capacity(items.len());
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let k = key(&item);
        if !seen.contains(&k) {
            seen.push(k);
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_direct() {
        let r = Relation::resolve(Some(vec![1]), Some(vec![2]));
        assert_eq!(r.into_items(), vec![1]);
    }

    #[test]
    fn test_resolve_falls_back_to_join() {
        let r: Relation<i32> = Relation::resolve(None, Some(vec![2, 3]));
        assert_eq!(r, Relation::JoinTable(vec![2, 3]));
    }

    #[test]
    fn test_resolve_absent() {
        let r: Relation<i32> = Relation::resolve(Some(vec![]), None);
        assert_eq!(r, Relation::Absent);
        assert!(r.into_items().is_empty());
    }

    #[test]
    fn test_display_dedupes() {
        let r = Relation::resolve(None, Some(vec!["Lácteos", "Aseo", "Lácteos"]));
        assert_eq!(r.display(|s| *s), "Lácteos, Aseo");
        assert_eq!(Relation::<&str>::Absent.display(|s| *s), "N/A");
    }

    #[test]
    fn test_dedup_by_key() {
        let items = vec![(1, "a"), (2, "b"), (1, "c")];
        assert_eq!(dedup_by_key(items, |i| i.0), vec![(1, "a"), (2, "b")]);
    }
}
