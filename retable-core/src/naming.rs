//! Table naming and field-rename lookups.

/// Ordered `old suffix -> new suffix` field renames.
///
/// Keeps the order in which the pairs were declared. Every rule that applies
/// the renames as substring replacements walks them in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRename {
    pairs: Vec<(String, String)>,
}

impl FieldRename {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rename. A repeated key replaces the earlier value in place.
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let from = from.into();
        let to = to.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == from) {
            Some(pair) => pair.1 = to,
            None => self.pairs.push((from, to)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldRename {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut rename = FieldRename::new();
        for (k, v) in iter {
            rename.insert(k, v);
        }
        rename
    }
}

/// Ordered lookup table derived from a [`FieldRename`].
///
/// Exact lookups go through [`NameMapping::get`]; substring rewrites go
/// through [`NameMapping::replace_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMapping {
    pairs: Vec<(String, String)>,
}

impl NameMapping {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Apply every pair as a literal substring replacement, in order.
    ///
    /// Each pair scans the output of the previous one, but a single pair never
    /// re-scans the text it has just inserted.
    pub fn replace_all(&self, input: &str) -> String {
        let mut out = input.to_string();
        for (from, to) in &self.pairs {
            if out.contains(from.as_str()) {
                out = out.replace(from.as_str(), to);
            }
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Old/new table identifiers plus the field renames to carry along.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConfig {
    old_table: String,
    new_table: Option<String>,
    field_rename: FieldRename,
}

impl NamingConfig {
    pub fn new(
        old_table: impl Into<String>,
        new_table: Option<String>,
        field_rename: FieldRename,
    ) -> Self {
        Self {
            old_table: old_table.into(),
            new_table: new_table.filter(|t| !t.is_empty()),
            field_rename,
        }
    }

    pub fn old_table(&self) -> &str {
        &self.old_table
    }

    pub fn new_table(&self) -> Option<&str> {
        self.new_table.as_deref()
    }

    pub fn field_rename(&self) -> &FieldRename {
        &self.field_rename
    }

    /// The table name artifacts should carry once migrated.
    pub fn target_table(&self) -> &str {
        self.new_table.as_deref().unwrap_or(&self.old_table)
    }

    /// `"{target}_{k}" -> "{target}_{v}"`, for fully qualified field ids.
    pub fn fields_mapping(&self) -> NameMapping {
        self.qualified_mapping('_')
    }

    /// `"{target}.{k}" -> "{target}.{v}"`, for dot-qualified references in
    /// calculation expressions.
    pub fn calculations_mapping(&self) -> NameMapping {
        self.qualified_mapping('.')
    }

    /// Replace every literal occurrence of the old table name.
    pub fn replace_table(&self, input: &str) -> String {
        input.replace(&self.old_table, self.target_table())
    }

    fn qualified_mapping(&self, separator: char) -> NameMapping {
        let target = self.target_table();
        NameMapping {
            pairs: self
                .field_rename
                .iter()
                .map(|(k, v)| {
                    (
                        format!("{target}{separator}{k}"),
                        format!("{target}{separator}{v}"),
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn naming(old: &str, new: Option<&str>, pairs: &[(&str, &str)]) -> NamingConfig {
        NamingConfig::new(
            old,
            new.map(str::to_string),
            pairs.iter().copied().collect(),
        )
    }

    #[test]
    fn test_target_table_prefers_new_name() {
        assert_eq!(naming("t", Some("u"), &[]).target_table(), "u");
    }

    #[test]
    fn test_empty_new_table_means_no_rename() {
        let config = naming("orders", Some(""), &[]);
        assert_eq!(config.new_table(), None);
        assert_eq!(config.target_table(), "orders");
    }

    #[test]
    fn test_fields_mapping_uses_underscore_qualifier() {
        let config = naming("t", Some("u"), &[("a", "b")]);
        let mapping = config.fields_mapping();
        assert_eq!(mapping.get("u_a"), Some("u_b"));
        assert_eq!(mapping.get("t_a"), None);
    }

    #[test]
    fn test_calculations_mapping_uses_dot_qualifier() {
        let config = naming("t", None, &[("amount", "total")]);
        let mapping = config.calculations_mapping();
        assert_eq!(mapping.get("t.amount"), Some("t.total"));
    }

    #[test]
    fn test_field_rename_repeated_key_keeps_position() {
        let rename: FieldRename = [("a", "b"), ("c", "d"), ("a", "e")].into_iter().collect();
        let pairs: Vec<_> = rename.iter().collect();
        assert_eq!(pairs, vec![("a", "e"), ("c", "d")]);
    }

    #[test]
    fn test_replace_all_chains_pairs_in_order() {
        // The second pair matches text produced by the first one.
        let config = naming("t", None, &[("a", "b"), ("b", "c")]);
        assert_eq!(config.calculations_mapping().replace_all("${t.a}"), "${t.c}");
    }

    #[test]
    fn test_replace_all_does_not_rescan_own_output() {
        let config = naming("t", None, &[("a", "a_a")]);
        assert_eq!(config.calculations_mapping().replace_all("t.a"), "t.a_a");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Without a new table name the target is the old name.
        #[test]
        fn prop_target_defaults_to_old_table(old in "[a-z][a-z0-9_]{0,20}") {
            let config = NamingConfig::new(old.clone(), None, FieldRename::new());
            prop_assert_eq!(config.target_table(), old.as_str());
        }

        /// Every derived field mapping entry is qualified by the target table
        /// and ends with the raw suffix it came from.
        #[test]
        fn prop_fields_mapping_is_target_qualified(
            old in "[a-z]{1,8}",
            new in proptest::option::of("[a-z]{1,8}"),
            pairs in prop::collection::vec(("[a-z_]{1,10}", "[a-z_]{1,10}"), 1..6),
        ) {
            let rename: FieldRename = pairs.iter().cloned().collect();
            let config = NamingConfig::new(old, new, rename.clone());
            let prefix = format!("{}_", config.target_table());
            let mapping = config.fields_mapping();
            prop_assert_eq!(mapping.len(), rename.len());
            for ((key, value), (raw_key, raw_value)) in mapping.iter().zip(rename.iter()) {
                prop_assert!(key.starts_with(&prefix));
                prop_assert!(value.starts_with(&prefix));
                prop_assert!(key.ends_with(raw_key));
                prop_assert!(value.ends_with(raw_value));
            }
        }
    }
}
