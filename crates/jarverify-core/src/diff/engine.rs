use std::hash::Hash;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// How the `added` key set is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddedDetection {
    /// Keys of `right` that are absent from `left`.
    #[default]
    Enabled,
    /// Reproduces historical reports, where the membership test ran against
    /// `right` itself and `added` was therefore always empty.
    LegacyParity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    pub added_detection: AddedDetection,
}

/// One attribute whose values differ between the two sides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDifference {
    pub field: String,
    pub left: Value,
    pub right: Value,
}

impl FieldDifference {
    fn prefixed(&self, prefix: &str) -> Self {
        Self {
            field: format!("{prefix}.{}", self.field),
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }
}

/// Collects field differences for one pair of entities.
///
/// Implementations of [`Diffable`] call [`append`](Self::append) once per
/// attribute; equal values record nothing.
#[derive(Debug, Default)]
pub struct DiffBuilder {
    differences: Vec<FieldDifference>,
}

impl DiffBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<T>(&mut self, field: &str, left: &T, right: &T) -> &mut Self
    where
        T: PartialEq + Serialize + ?Sized,
    {
        if left != right {
            self.differences.push(FieldDifference {
                field: field.to_string(),
                left: to_value(left),
                right: to_value(right),
            });
        }
        self
    }

    /// Compare two keyed maps entry by entry. Removed and added entries are
    /// recorded as `field[key]` with a null on the missing side; changed
    /// entries contribute their own differences as `field[key].attr`.
    pub fn append_map<T>(
        &mut self,
        field: &str,
        left: &IndexMap<String, T>,
        right: &IndexMap<String, T>,
    ) -> &mut Self
    where
        T: Diffable + Serialize,
    {
        let result = diff(left, right, &DiffOptions::default());

        for key in &result.deleted {
            self.differences.push(FieldDifference {
                field: format!("{field}[{key}]"),
                left: to_value(&left[key]),
                right: Value::Null,
            });
        }
        for key in &result.added {
            self.differences.push(FieldDifference {
                field: format!("{field}[{key}]"),
                left: Value::Null,
                right: to_value(&right[key]),
            });
        }
        for (key, nested) in result.changed() {
            self.differences
                .extend(nested.iter().map(|d| d.prefixed(&format!("{field}[{key}]"))));
        }
        self
    }

    /// Like [`append_map`](Self::append_map) when both sides are present;
    /// otherwise the whole values are recorded.
    pub fn append_optional_map<T>(
        &mut self,
        field: &str,
        left: &Option<IndexMap<String, T>>,
        right: &Option<IndexMap<String, T>>,
    ) -> &mut Self
    where
        T: Diffable + Serialize + PartialEq,
    {
        match (left, right) {
            (Some(l), Some(r)) => self.append_map(field, l, r),
            _ => self.append(field, left, right),
        }
    }

    /// Descend into a nested entity when both sides are present.
    pub fn append_optional<T>(&mut self, field: &str, left: &Option<T>, right: &Option<T>) -> &mut Self
    where
        T: Diffable + Serialize + PartialEq,
    {
        match (left, right) {
            (Some(l), Some(r)) => {
                let nested = l.field_differences(r);
                self.differences
                    .extend(nested.iter().map(|d| d.prefixed(field)));
                self
            }
            _ => self.append(field, left, right),
        }
    }

    pub fn build(self) -> Vec<FieldDifference> {
        self.differences
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Value {
    // Snapshot maps are string-keyed; serialization does not fail.
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// An entity that can be compared attribute by attribute.
pub trait Diffable {
    fn diff_fields(&self, other: &Self, builder: &mut DiffBuilder);

    fn field_differences(&self, other: &Self) -> Vec<FieldDifference> {
        let mut builder = DiffBuilder::new();
        self.diff_fields(other, &mut builder);
        builder.build()
    }
}

/// Result of diffing two keyed maps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffResult<K: Hash + Eq> {
    /// Keys present on both sides, in `left` order.
    pub shared: Vec<K>,
    /// Keys only in `right`, in `right` order.
    pub added: Vec<K>,
    /// Keys only in `left`, in `left` order.
    pub deleted: Vec<K>,
    /// Field differences per shared key; every shared key has an entry,
    /// possibly empty.
    pub reports: IndexMap<K, Vec<FieldDifference>>,
}

impl<K: Hash + Eq> DiffResult<K> {
    pub fn changed(&self) -> impl Iterator<Item = (&K, &Vec<FieldDifference>)> {
        self.reports.iter().filter(|(_, diffs)| !diffs.is_empty())
    }

    pub fn has_divergence(&self) -> bool {
        !self.added.is_empty() || !self.deleted.is_empty() || self.changed().next().is_some()
    }
}

/// Compare two keyed maps.
///
/// Membership is set-based; ordering only affects how results are listed.
pub fn diff<K, T>(left: &IndexMap<K, T>, right: &IndexMap<K, T>, options: &DiffOptions) -> DiffResult<K>
where
    K: Hash + Eq + Clone,
    T: Diffable,
{
    let mut shared = Vec::new();
    let mut deleted = Vec::new();
    let mut reports = IndexMap::new();

    for (key, l) in left {
        match right.get(key) {
            Some(r) => {
                shared.push(key.clone());
                reports.insert(key.clone(), l.field_differences(r));
            }
            None => deleted.push(key.clone()),
        }
    }

    let added = match options.added_detection {
        AddedDetection::Enabled => right
            .keys()
            .filter(|key| !left.contains_key(*key))
            .cloned()
            .collect(),
        AddedDetection::LegacyParity => Vec::new(),
    };

    DiffResult {
        shared,
        added,
        deleted,
        reports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        access: u32,
        tags: Vec<&'static str>,
    }

    impl Diffable for Item {
        fn diff_fields(&self, other: &Self, b: &mut DiffBuilder) {
            let Item { access, tags } = self;
            b.append("access", access, &other.access)
                .append("tags", tags, &other.tags);
        }
    }

    fn item(access: u32) -> Item {
        Item {
            access,
            tags: vec!["t"],
        }
    }

    fn map(entries: &[(&'static str, Item)]) -> IndexMap<&'static str, Item> {
        entries.iter().cloned().collect()
    }

    #[test]
    fn diff_against_itself_is_clean() {
        for m in [
            map(&[]),
            map(&[("a", item(1))]),
            map(&[("a", item(1)), ("b", item(2)), ("c", item(3))]),
        ] {
            let result = diff(&m, &m, &DiffOptions::default());

            assert_eq!(result.shared, m.keys().cloned().collect::<Vec<_>>());
            assert!(result.added.is_empty());
            assert!(result.deleted.is_empty());
            assert!(result.reports.values().all(Vec::is_empty));
            assert!(!result.has_divergence());
        }
    }

    #[test]
    fn added_and_deleted_mirror_each_other() {
        let samples = [
            map(&[]),
            map(&[("a", item(1)), ("b", item(1))]),
            map(&[("a", item(2)), ("c", item(1))]),
            map(&[("d", item(1))]),
        ];

        for l in &samples {
            for r in &samples {
                let lr = diff(l, r, &DiffOptions::default());
                let rl = diff(r, l, &DiffOptions::default());

                assert_eq!(lr.added, rl.deleted);
                assert_eq!(lr.deleted, rl.added);
            }
        }
    }

    #[test]
    fn classifies_shared_added_deleted() {
        let left = map(&[("A", item(1)), ("B", item(1))]);
        let right = map(&[("A", item(1)), ("C", item(1))]);

        let result = diff(&left, &right, &DiffOptions::default());

        assert_eq!(result.shared, vec!["A"]);
        assert_eq!(result.deleted, vec!["B"]);
        assert_eq!(result.added, vec!["C"]);
        assert!(result.has_divergence());
    }

    #[test]
    fn shared_keys_follow_left_order() {
        let left = map(&[("b", item(1)), ("a", item(1))]);
        let right = map(&[("a", item(1)), ("b", item(1))]);

        assert_eq!(diff(&left, &right, &DiffOptions::default()).shared, vec!["b", "a"]);
    }

    #[test]
    fn records_one_difference_per_changed_attribute() {
        let left = map(&[("m", item(0x0001))]);
        let right = map(&[("m", item(0x0002))]);

        let result = diff(&left, &right, &DiffOptions::default());
        let report = &result.reports["m"];

        assert_eq!(
            report,
            &vec![FieldDifference {
                field: "access".into(),
                left: Value::from(1),
                right: Value::from(2),
            }]
        );
        assert!(result.has_divergence());
    }

    #[test]
    fn legacy_parity_never_reports_added() {
        let left = map(&[("a", item(1))]);
        let right = map(&[("a", item(1)), ("new", item(1))]);

        let legacy = DiffOptions {
            added_detection: AddedDetection::LegacyParity,
        };
        let result = diff(&left, &right, &legacy);

        assert!(result.added.is_empty());
        assert!(result.deleted.is_empty());
        assert!(!result.has_divergence());
    }
}
