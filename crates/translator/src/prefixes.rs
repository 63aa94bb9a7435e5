//! # Prefix registry
//!
//! The fixed prefixes every rendered statement declares, plus a mutable
//! registry for user-added ones via [`PrefixRegistry::add`]. §4.3 requires
//! every operation's SPARQL text to declare a superset of the prefixes it
//! uses; the simplest way to guarantee that (testable property "prefix
//! closure") is to always emit the whole registry, used or not.

const FIXED_PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("schema", "http://schema.org/"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("solid", "http://www.w3.org/ns/solid/terms#"),
    ("ldp", "http://www.w3.org/ns/ldp#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

/// A prefix → URI table. Starts pre-populated with [`FIXED_PREFIXES`];
/// additional prefixes registered with [`PrefixRegistry::add`] take effect
/// for every statement rendered afterwards.
#[derive(Debug, Clone)]
pub struct PrefixRegistry {
    entries: Vec<(String, String)>,
}

impl Default for PrefixRegistry {
    fn default() -> Self {
        Self {
            entries: FIXED_PREFIXES
                .iter()
                .map(|(p, u)| (p.to_string(), u.to_string()))
                .collect(),
        }
    }
}

impl PrefixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prefix, overwriting any existing binding for the same
    /// short name.
    pub fn add(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        if let Some(existing) = self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            existing.1 = uri.into();
        } else {
            self.entries.push((prefix, uri.into()));
        }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Render the `PREFIX px: <uri>` block every statement opens with.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (prefix, uri) in &self.entries {
            out.push_str(&format!("PREFIX {}: <{}>\n", prefix, uri));
        }
        out
    }
}
