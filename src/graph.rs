use crate::models::{is_blank, AttributeRecord, Fact};
use rustc_hash::{FxHashMap, FxHashSet};

/// Alias <-> ORCID bimap plus the attribute record of every alias.
///
/// The two adjacency maps are only ever written together, so an edge is present
/// in `alias_to_orcid` exactly when its mirror is present in `orcid_to_alias`.
#[derive(Debug, Default)]
pub struct IdentityGraph {
    alias_to_orcid: FxHashMap<String, FxHashSet<String>>,
    orcid_to_alias: FxHashMap<String, FxHashSet<String>>,
    records: FxHashMap<String, AttributeRecord>,
}

impl IdentityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, alias: &str, orcid: &str) {
        self.alias_to_orcid
            .entry(alias.to_string())
            .or_default()
            .insert(orcid.to_string());
        self.orcid_to_alias
            .entry(orcid.to_string())
            .or_default()
            .insert(alias.to_string());
    }

    /// Replaces whatever was stored for `alias`.
    pub fn set_attribute_record(&mut self, alias: &str, record: AttributeRecord) {
        self.records.insert(alias.to_string(), record);
    }

    pub fn apply(&mut self, fact: Fact) {
        match fact {
            Fact::Author { alias, orcid } => self.add_edge(&alias, &orcid),
            Fact::Homepage(homepage) => {
                let orcid = if is_blank(&homepage.record.orcid) {
                    None
                } else {
                    homepage.record.orcid.clone()
                };
                for alias in &homepage.aliases {
                    self.set_attribute_record(alias, homepage.record.clone());
                    if let Some(orcid) = &orcid {
                        self.add_edge(alias, orcid);
                    }
                }
            }
        }
    }

    pub fn orcids_of(&self, alias: &str) -> Option<&FxHashSet<String>> {
        self.alias_to_orcid.get(alias)
    }

    pub fn aliases_of(&self, orcid: &str) -> Option<&FxHashSet<String>> {
        self.orcid_to_alias.get(orcid)
    }

    pub fn record(&self, alias: &str) -> Option<&AttributeRecord> {
        self.records.get(alias)
    }

    pub fn alias_to_orcid(&self) -> &FxHashMap<String, FxHashSet<String>> {
        &self.alias_to_orcid
    }

    pub fn orcid_to_alias(&self) -> &FxHashMap<String, FxHashSet<String>> {
        &self.orcid_to_alias
    }

    pub(crate) fn records_mut(&mut self) -> &mut FxHashMap<String, AttributeRecord> {
        &mut self.records
    }

    /// (aliases with edges, orcids, stored attribute records)
    pub fn stats(&self) -> (usize, usize, usize) {
        (
            self.alias_to_orcid.len(),
            self.orcid_to_alias.len(),
            self.records.len(),
        )
    }

    pub fn edge_count(&self) -> usize {
        self.alias_to_orcid.values().map(|orcids| orcids.len()).sum()
    }
}
