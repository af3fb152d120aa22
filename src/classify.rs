use crate::config::HOMEPAGE_KEY_PREFIX;
use crate::models::{AttributeRecord, AuthorElement, Fact, HomepageElement, HomepageFact, RawElement};
use rustc_hash::FxHashSet;

/// Profile sites that carry no identifier we keep and must not be taken as a homepage.
const IGNORED_URL_MARKERS: &[&str] = &[
    "wikidata",
    "genealogy.ams.org",
    "researchgate",
    "mendeley",
    "github",
    "twitter",
    "wikipedia",
    "isni",
    "linkedin",
];

/// What a single homepage URL turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind<'a> {
    Orcid(&'a str),
    ResearcherId(&'a str),
    Scholar(&'a str),
    Scopus(&'a str),
    Acm(&'a str),
    Ignored,
    Homepage(&'a str),
}

/// Everything after the last occurrence of `sep`, or the whole string when absent.
fn after_last<'a>(url: &'a str, sep: &str) -> &'a str {
    url.rsplit_once(sep).map_or(url, |(_, tail)| tail)
}

/// Whitespace and surrounding slashes are not part of the URL's identity.
pub fn normalize_url(url: &str) -> &str {
    url.trim().trim_matches('/')
}

/// Matchers are tried in order and the first hit wins, so an ORCID profile
/// that also mentions "scopus" is still an ORCID.
pub fn classify_url(url: &str) -> UrlKind<'_> {
    if url.contains("orcid.org/") {
        UrlKind::Orcid(after_last(url, "/"))
    } else if url.contains("researcherid") {
        UrlKind::ResearcherId(after_last(url, "/"))
    } else if url.contains("scholar.google") {
        UrlKind::Scholar(after_last(url, "user="))
    } else if url.contains("scopus") {
        UrlKind::Scopus(after_last(url, "authorId="))
    } else if url.contains("dl.acm.org/author_page") {
        UrlKind::Acm(after_last(url, "id="))
    } else if IGNORED_URL_MARKERS.iter().any(|m| url.contains(m)) {
        UrlKind::Ignored
    } else {
        UrlKind::Homepage(url)
    }
}

/// An inline author only becomes a fact when it carries an `orcid` attribute.
pub fn classify_author(element: &AuthorElement) -> Option<Fact> {
    let orcid = element.orcid.as_ref()?;
    Some(Fact::Author {
        alias: element.text.clone(),
        orcid: orcid.clone(),
    })
}

pub fn classify_homepage(element: &HomepageElement) -> Option<Fact> {
    let key = element.key.as_deref()?;
    if !key.starts_with(HOMEPAGE_KEY_PREFIX) {
        return None;
    }

    let aliases: FxHashSet<String> = element
        .authors
        .iter()
        .map(|a| a.trim().to_string())
        .collect();

    let mut record = AttributeRecord {
        source_keys: [key.trim().to_string()].into_iter().collect(),
        affiliation: element
            .notes
            .iter()
            .find(|(kind, _)| kind.as_deref() == Some("affiliation"))
            .map(|(_, text)| text.clone()),
        ..Default::default()
    };

    for raw in &element.urls {
        let url = normalize_url(raw);
        match classify_url(url) {
            UrlKind::Orcid(id) => record.orcid = Some(id.to_string()),
            UrlKind::ResearcherId(id) => record.researcher_id = Some(id.to_string()),
            UrlKind::Scholar(id) => record.scholar_id = Some(id.to_string()),
            UrlKind::Scopus(id) => record.scopus_id = Some(id.to_string()),
            UrlKind::Acm(id) => record.acm_id = Some(id.to_string()),
            UrlKind::Ignored => {}
            // Only one homepage is kept; a later plain URL replaces an earlier one.
            UrlKind::Homepage(url) => record.homepage = Some(url.to_string()),
        }
    }

    Some(Fact::Homepage(HomepageFact { aliases, record }))
}

pub fn classify(element: &RawElement) -> Option<Fact> {
    match element {
        RawElement::Author(author) => classify_author(author),
        RawElement::Homepage(homepage) => classify_homepage(homepage),
    }
}
