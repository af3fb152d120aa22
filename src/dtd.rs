//! Just enough of the DBLP DTD to read the dump: the named character entities
//! it declares and the set of element names it allows.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use quick_xml::escape::unescape;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs;
use std::path::Path;
use tracing::info;

static COMMENT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// General entities only; parameter entities (`<!ENTITY % ...>`) do not match.
static ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<!ENTITY\s+([A-Za-z_:][\w.:-]*)\s+(?:"([^"]*)"|'([^']*)')\s*>"#).unwrap()
});

static ELEMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!ELEMENT\s+([A-Za-z_:][\w.:-]*)").unwrap());

#[derive(Debug, Default, Clone)]
pub struct Dtd {
    entities: FxHashMap<String, String>,
    elements: FxHashSet<String>,
}

impl Dtd {
    /// A DTD that declares nothing: only the predefined XML entities resolve
    /// and element names are not checked.
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self> {
        let text = COMMENT_REGEX.replace_all(text, "");
        let mut dtd = Self::default();

        for caps in ENTITY_REGEX.captures_iter(&text) {
            let name = &caps[1];
            let raw = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            // Values are character references such as "&#233;"
            let value = unescape(raw)
                .with_context(|| format!("Invalid replacement text for entity {}", name))?;
            dtd.entities.insert(name.to_string(), value.into_owned());
        }

        for caps in ELEMENT_REGEX.captures_iter(&text) {
            dtd.elements.insert(caps[1].to_string());
        }

        Ok(dtd)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read DTD: {:?}", path))?;
        // dblp.dtd is declared ISO-8859-1 but is plain ASCII in practice
        let text = String::from_utf8_lossy(&bytes);
        let dtd = Self::parse(&text)?;

        let (entities, elements) = dtd.stats();
        info!(entities, elements, "DTD loaded");

        Ok(dtd)
    }

    /// Adds the declarations of `other`, e.g. from a DOCTYPE internal subset.
    pub fn extend(&mut self, other: Dtd) {
        self.entities.extend(other.entities);
        self.elements.extend(other.elements);
    }

    pub fn resolve_entity(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(String::as_str)
    }

    /// Every name is allowed when no element declarations were loaded.
    pub fn declares_element(&self, name: &[u8]) -> bool {
        if self.elements.is_empty() {
            return true;
        }
        std::str::from_utf8(name).is_ok_and(|n| self.elements.contains(n))
    }

    /// (entities, elements)
    pub fn stats(&self) -> (usize, usize) {
        (self.entities.len(), self.elements.len())
    }
}
