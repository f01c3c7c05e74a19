use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A canonical service key such as `sql_database` or `azure_firewall`.
///
/// Values are produced by [`crate::Taxonomy::normalize`] at ingress; the
/// constructor here trusts its input and is meant for table literals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ServiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceId {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl PartialEq<str> for ServiceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ServiceId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Insertion-ordered set of service ids. The first insertion of an id fixes
/// its position; later insertions of the same id are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ServiceId>", into = "Vec<ServiceId>")]
pub struct ServiceSet {
    items: Vec<ServiceId>,
}

impl ServiceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id was not already present.
    pub fn insert(&mut self, id: ServiceId) -> bool {
        if self.contains(id.as_str()) {
            return false;
        }
        self.items.push(id);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.iter().any(|s| s.as_str() == key)
    }

    pub fn contains_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.contains(k))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServiceId> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[ServiceId] {
        &self.items
    }
}

impl From<Vec<ServiceId>> for ServiceSet {
    fn from(ids: Vec<ServiceId>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<ServiceSet> for Vec<ServiceId> {
    fn from(set: ServiceSet) -> Self {
        set.items
    }
}

impl FromIterator<ServiceId> for ServiceSet {
    fn from_iter<I: IntoIterator<Item = ServiceId>>(iter: I) -> Self {
        let mut set = ServiceSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<ServiceId> for ServiceSet {
    fn extend<I: IntoIterator<Item = ServiceId>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

impl<'a> IntoIterator for &'a ServiceSet {
    type Item = &'a ServiceId;
    type IntoIter = std::slice::Iter<'a, ServiceId>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for ServiceSet {
    type Item = ServiceId;
    type IntoIter = std::vec::IntoIter<ServiceId>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insertion_wins() {
        let mut set = ServiceSet::new();
        assert!(set.insert("dns".into()));
        assert!(set.insert("bastion".into()));
        assert!(!set.insert("dns".into()));

        let keys: Vec<&str> = set.iter().map(|s| s.as_str()).collect();
        assert_eq!(keys, vec!["dns", "bastion"]);
    }

    #[test]
    fn deserializing_drops_duplicates() {
        let set: ServiceSet = serde_json::from_str(r#"["aks","vm","aks"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["aks","vm"]"#);
    }

    #[test]
    fn service_id_compares_with_str() {
        let id = ServiceId::new("key_vault");
        assert_eq!(id, "key_vault");
        assert_eq!(id.to_string(), "key_vault");
    }
}
