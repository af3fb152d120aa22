use rustc_hash::FxHashSet;
use serde::Serialize;

/// Attributes known about one alias, taken from a `www` homepage record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRecord {
    pub source_keys: FxHashSet<String>,
    pub affiliation: Option<String>,
    pub orcid: Option<String>,
    pub researcher_id: Option<String>,
    pub scholar_id: Option<String>,
    pub scopus_id: Option<String>,
    pub acm_id: Option<String>,
    pub homepage: Option<String>,
}

/// Treats `None` and the empty string alike.
pub fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, str::is_empty)
}

impl AttributeRecord {
    /// Copies every non-empty field of `other` into a field that is still empty here.
    /// Source keys are left alone; the merger unions them separately.
    pub fn fill_blanks_from(&mut self, other: &AttributeRecord) {
        fn fill(slot: &mut Option<String>, value: &Option<String>) {
            if is_blank(slot) && !is_blank(value) {
                slot.clone_from(value);
            }
        }

        fill(&mut self.affiliation, &other.affiliation);
        fill(&mut self.orcid, &other.orcid);
        fill(&mut self.researcher_id, &other.researcher_id);
        fill(&mut self.scholar_id, &other.scholar_id);
        fill(&mut self.scopus_id, &other.scopus_id);
        fill(&mut self.acm_id, &other.acm_id);
        fill(&mut self.homepage, &other.homepage);
    }
}

/// A qualifying element exactly as the stream parser saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawElement {
    Author(AuthorElement),
    Homepage(HomepageElement),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorElement {
    pub text: String,
    pub orcid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomepageElement {
    pub key: Option<String>,
    pub authors: Vec<String>,
    /// `(type attribute, text)` of each direct `note` child
    pub notes: Vec<(Option<String>, String)>,
    pub urls: Vec<String>,
}

/// A classified element, ready to be applied to the identity graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fact {
    Author { alias: String, orcid: String },
    Homepage(HomepageFact),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomepageFact {
    pub aliases: FxHashSet<String>,
    pub record: AttributeRecord,
}

/// Which side of the bimap the canonical output is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Orcid,
    Alias,
}

/// One ORCID with every alias pointing to it and the merged attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrcidRecord {
    pub orcid: String,
    pub alias: Vec<String>,
    pub dblp_key: Vec<String>,
    pub affiliation: Option<String>,
    pub researcher_id: Option<String>,
    pub scholar_id: Option<String>,
    pub scopus_id: Option<String>,
    pub acm_id: Option<String>,
    pub homepage: Option<String>,
}

/// One alias with every ORCID it is linked to and its own attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRecord {
    pub alias: String,
    pub orcid: Vec<String>,
    pub dblp_key: String,
    pub affiliation: Option<String>,
    pub researcher_id: Option<String>,
    pub scholar_id: Option<String>,
    pub scopus_id: Option<String>,
    pub acm_id: Option<String>,
    pub homepage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalRecord {
    ByOrcid(OrcidRecord),
    ByAlias(AliasRecord),
}

impl CanonicalRecord {
    /// The key the exporter sorts on.
    pub fn primary_key(&self) -> &str {
        match self {
            CanonicalRecord::ByOrcid(r) => &r.orcid,
            CanonicalRecord::ByAlias(r) => &r.alias,
        }
    }
}

/// CSV row for the grouped-by-ORCID view. Field order is the column order.
#[derive(Debug, Serialize)]
pub struct OrcidRow<'a> {
    pub orcid: &'a str,
    pub alias: String,
    pub dblp_key: String,
    pub affiliation: &'a str,
    pub researcher_id: &'a str,
    pub google_scholar_id: &'a str,
    pub scopus_id: &'a str,
    pub acm_id: &'a str,
    pub homepage: &'a str,
}

/// CSV row for the grouped-by-alias view. Field order is the column order.
#[derive(Debug, Serialize)]
pub struct AliasRow<'a> {
    pub alias: &'a str,
    pub orcid: String,
    pub dblp_key: &'a str,
    pub affiliation: &'a str,
    pub researcher_id: &'a str,
    pub google_scholar_id: &'a str,
    pub scopus_id: &'a str,
    pub acm_id: &'a str,
    pub homepage: &'a str,
}
