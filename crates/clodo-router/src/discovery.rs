//! Domain discovery (spec.md §4.I): domains can come from a JSON
//! config file, the upstream API, or a delimiter-separated environment
//! variable. Each source is independent; discovery merges all
//! configured sources and de-duplicates.

use crate::error::RouterError;
use async_trait::async_trait;
use std::path::Path;

/// One discovery source. `clodo-cli` wires up whichever of these the
/// invocation's flags/environment call for; an orchestration run is
/// free to combine more than one.
#[async_trait]
pub trait DomainSource: Send + Sync {
    async fn discover(&self) -> Result<Vec<String>, RouterError>;
}

/// Reads a JSON array of domain names (or an object with a `domains`
/// array) from disk.
pub struct JsonConfigSource {
    path: std::path::PathBuf,
}

impl JsonConfigSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl DomainSource for JsonConfigSource {
    async fn discover(&self) -> Result<Vec<String>, RouterError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(_) => return Ok(Vec::new()),
        };
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null);

        let domains = if let Some(array) = value.as_array() {
            array.clone()
        } else if let Some(array) = value.get("domains").and_then(|v| v.as_array()) {
            array.clone()
        } else {
            Vec::new()
        };

        Ok(domains
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect())
    }
}

/// Parses a delimiter-separated environment variable, e.g.
/// `CLODO_DOMAINS=api.example.com,static.example.com`.
pub struct EnvVarSource {
    var_name: String,
    delimiter: char,
}

impl EnvVarSource {
    pub fn new(var_name: impl Into<String>, delimiter: char) -> Self {
        Self {
            var_name: var_name.into(),
            delimiter,
        }
    }
}

#[async_trait]
impl DomainSource for EnvVarSource {
    async fn discover(&self) -> Result<Vec<String>, RouterError> {
        Ok(std::env::var(&self.var_name)
            .unwrap_or_default()
            .split(self.delimiter)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect())
    }
}

/// Wraps an injectable closure/future for the "discover via the
/// upstream platform API" source. `UpstreamApi` itself only exposes
/// per-resource probes (spec.md §4.E), not a list-all-domains call, so
/// this source is supplied by the caller (typically backed by whatever
/// account-level listing endpoint the concrete upstream offers).
pub struct CallbackSource<F> {
    callback: F,
}

impl<F> CallbackSource<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

#[async_trait]
impl<F> DomainSource for CallbackSource<F>
where
    F: Fn() -> Vec<String> + Send + Sync,
{
    async fn discover(&self) -> Result<Vec<String>, RouterError> {
        Ok((self.callback)())
    }
}

/// De-duplicates and sorts the union of every source's results.
pub async fn merge_domains(sources: &[Box<dyn DomainSource>]) -> Result<Vec<String>, RouterError> {
    let mut all = Vec::new();
    for source in sources {
        all.extend(source.discover().await?);
    }
    all.sort();
    all.dedup();
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_array_source_parses_plain_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.json");
        std::fs::write(&path, r#"["b.example.com", "a.example.com"]"#).unwrap();

        let source = JsonConfigSource::new(&path);
        let mut domains = source.discover().await.unwrap();
        domains.sort();
        assert_eq!(domains, vec!["a.example.com".to_string(), "b.example.com".to_string()]);
    }

    #[tokio::test]
    async fn json_object_source_reads_domains_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.json");
        std::fs::write(&path, r#"{"domains": ["a.example.com"]}"#).unwrap();

        let source = JsonConfigSource::new(&path);
        let domains = source.discover().await.unwrap();
        assert_eq!(domains, vec!["a.example.com".to_string()]);
    }

    #[tokio::test]
    async fn missing_config_file_yields_empty_list_not_error() {
        let source = JsonConfigSource::new("/nonexistent/domains.json");
        assert_eq!(source.discover().await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn merge_deduplicates_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.json");
        std::fs::write(&path, r#"["b.example.com", "a.example.com"]"#).unwrap();

        let sources: Vec<Box<dyn DomainSource>> = vec![
            Box::new(JsonConfigSource::new(&path)),
            Box::new(CallbackSource::new(|| vec!["a.example.com".to_string(), "c.example.com".to_string()])),
        ];

        let merged = merge_domains(&sources).await.unwrap();
        assert_eq!(
            merged,
            vec!["a.example.com".to_string(), "b.example.com".to_string(), "c.example.com".to_string()]
        );
    }
}
