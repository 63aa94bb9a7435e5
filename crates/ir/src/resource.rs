//! # Resource URL conventions
//!
//! Derives container/resource/subject URIs for a table from a session's
//! webId, per §3. These are pure string/URL computations; the executor is
//! responsible for actually reaching out over HTTP.

use std::time::{SystemTime, UNIX_EPOCH};

use url::Url;

use crate::schema::Table;

/// `podBase` and `userPath` split out of a webId, e.g.
/// `https://pod.example/alice/profile/card#me` → `podBase =
/// https://pod.example`, `userPath = /alice/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodIdentity {
    pub pod_base: String,
    pub user_path: String,
}

impl PodIdentity {
    /// Parse a webId into its pod base and user path. The first path
    /// segment is taken as the user segment; callers whose Pod provider
    /// uses a different convention should construct [`PodIdentity`]
    /// directly instead.
    pub fn from_web_id(web_id: &str) -> Option<Self> {
        let url = Url::parse(web_id).ok()?;
        let scheme = url.scheme();
        let host = url.host_str()?;
        let port = url
            .port()
            .map(|p| format!(":{}", p))
            .unwrap_or_default();
        let pod_base = format!("{}://{}{}", scheme, host, port);

        let first_segment = url
            .path_segments()
            .and_then(|mut segs| segs.next())
            .filter(|s| !s.is_empty())?;
        let user_path = format!("/{}/", first_segment);

        Some(Self { pod_base, user_path })
    }
}

/// Absolute container URL for `table`, e.g.
/// `https://pod.example/alice/drizzle-tests/profiles/`.
///
/// An absolute `containerPath` (one that already parses as a URL) passes
/// through unchanged, per §3.
pub fn container_url(identity: &PodIdentity, table: &Table) -> String {
    if Url::parse(&table.container_path).is_ok() {
        return table.container_path.clone();
    }
    format!(
        "{}{}{}",
        identity.pod_base, identity.user_path, table.container_path
    )
}

/// Absolute resource URL for `table`: the container URL plus
/// `<tableName>.ttl`.
pub fn resource_url(identity: &PodIdentity, table: &Table) -> String {
    format!("{}{}.ttl", container_url(identity, table), table.name)
}

/// Subject URI for a row identified by `id` within `table`'s resource.
///
/// Computed as the resource's container URL (without its trailing `/`)
/// fragment-joined with `id`: `<containerUrl-without-slash>#<id>`.
pub fn subject_uri(identity: &PodIdentity, table: &Table, id: &str) -> String {
    let container = container_url(identity, table);
    let trimmed = container.trim_end_matches('/');
    format!("{}#{}", trimmed, id)
}

/// An `id` synthesized for an insert with no explicit identifier: the
/// current system time in milliseconds since the Unix epoch. Not stable
/// across repeated inserts within the same millisecond; callers that need
/// a stable key should set `id` explicitly.
pub fn synthesize_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    millis.to_string()
}

/// Extract the fragment or last path segment from a subject URI, i.e. the
/// substring after the last `/` or `#`. Used by the normalizer to recover
/// `id` from a bound `?subject`.
pub fn id_from_subject(subject: &str) -> String {
    let idx = subject
        .rfind(['/', '#'])
        .map(|i| i + 1)
        .unwrap_or(0);
    subject[idx..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType};

    fn table() -> Table {
        Table::new(
            "profiles",
            "drizzle-tests/profiles/",
            "http://schema.org/Person",
            vec![Column::new("id", ColumnType::String).primary_key()],
        )
        .unwrap()
    }

    #[test]
    fn pod_identity_splits_scheme_host_and_user_segment() {
        let identity = PodIdentity::from_web_id("https://pod.example/alice/profile/card#me").unwrap();
        assert_eq!(identity.pod_base, "https://pod.example");
        assert_eq!(identity.user_path, "/alice/");
    }

    #[test]
    fn resource_url_appends_table_name_and_extension() {
        let identity = PodIdentity::from_web_id("https://pod.example/alice/profile/card#me").unwrap();
        let url = resource_url(&identity, &table());
        assert_eq!(url, "https://pod.example/alice/drizzle-tests/profiles/profiles.ttl");
    }

    #[test]
    fn subject_uri_drops_trailing_slash_before_fragment() {
        let identity = PodIdentity::from_web_id("https://pod.example/alice/profile/card#me").unwrap();
        let subject = subject_uri(&identity, &table(), "42");
        assert_eq!(subject, "https://pod.example/alice/drizzle-tests/profiles#42");
    }

    #[test]
    fn id_from_subject_takes_fragment() {
        assert_eq!(id_from_subject("https://pod.example/x#42"), "42");
    }

    #[test]
    fn id_from_subject_falls_back_to_last_path_segment() {
        assert_eq!(id_from_subject("https://pod.example/x/42"), "42");
    }
}
