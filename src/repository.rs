//! `ConfigRepository`: the interface the resolver consumes to look up config
//! headers and enumerate group options, plus two concrete implementations
//! (filesystem-backed, in-memory) and a caching decorator.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::element::{DefaultElement, DefaultSpec, SELF_SENTINEL};
use crate::error::ResolveError;
use crate::key::split_key;
use crate::object_type::ObjectType;

/// The `defaults:` list and declared `# @package` header of one config file,
/// as read from a repository, before resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub defaults: Vec<DefaultSpec>,
    pub declared_package: Option<String>,
}

/// Source of config headers and group options consumed by the resolver.
///
/// Implementations own the actual config storage (filesystem, in-memory map,
/// ...); the resolver only ever sees this trait.
pub trait ConfigRepository {
    /// Load the header of the config at `config_path` (e.g. `"db/mysql"` or
    /// `"config"`). Returns [`ResolveError::ConfigNotFound`] if no such config
    /// exists.
    fn load_header(&self, config_path: &str) -> Result<Header, ResolveError>;

    /// All option names declared under `group`, in the repository's natural
    /// (sorted) order. Empty if the group does not exist.
    fn group_options(&self, group: &str) -> Vec<String>;

    /// Whether `group/option` names a config this repository can load.
    fn exists(&self, group: &str, option: &str) -> bool {
        self.group_options(group).iter().any(|o| o == option)
    }

    /// Classify `path` as a loadable config, a group of options, or neither.
    /// Used by diagnostics that need to tell a missing group from a missing
    /// option apart from a plain `ConfigNotFound`.
    fn object_type(&self, path: &str) -> ObjectType {
        if self.load_header(path).is_ok() {
            ObjectType::Config
        } else if !self.group_options(path).is_empty() {
            ObjectType::Group
        } else {
            ObjectType::NotFound
        }
    }
}

/// Parse one entry of a YAML `defaults:` sequence into a [`DefaultSpec`].
///
/// Accepts the three forms Hydra-style configs use: the bare string
/// `_self_`, a bare string config path, and a single-key mapping
/// `{group[@pkg[:pkg2]]: option}` optionally carrying `optional: true`.
fn parse_defaults_entry(value: &serde_yaml::Value) -> Result<DefaultSpec, ResolveError> {
    use serde_yaml::Value;

    match value {
        Value::String(s) if s == SELF_SENTINEL => Ok(DefaultSpec::SelfRef),
        Value::String(s) => Ok(DefaultSpec::Entry(DefaultElement::config(s.clone()))),
        Value::Mapping(map) => {
            let optional = map
                .get(&Value::String("optional".to_string()))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            for (k, v) in map {
                let key = match k.as_str() {
                    Some(k) if k != "optional" => k,
                    _ => continue,
                };
                let value_str = match v {
                    Value::String(s) => s.clone(),
                    other => {
                        return Err(ResolveError::repository(format!(
                            "defaults entry for '{}' must be a string, got {:?}",
                            key, other
                        )))
                    }
                };
                let (group, package, package2) = split_key(key);
                let mut elem = DefaultElement::group(group, value_str);
                if optional {
                    elem = elem.optional();
                }
                if let Some(p) = package {
                    elem = elem.with_package(p);
                }
                if let Some(p2) = package2 {
                    elem = elem.with_package2(p2);
                }
                return Ok(DefaultSpec::Entry(elem));
            }
            Err(ResolveError::repository("defaults entry mapping has no group key"))
        }
        other => Err(ResolveError::repository(format!("invalid defaults entry: {:?}", other))),
    }
}

/// Scan the leading `# @key value` comment block of a config file, stopping
/// at the first non-comment, non-blank, non-`---` line. Only `# @package`
/// is meaningful today; other `# @key` headers are ignored.
fn extract_declared_package(text: &str) -> Option<String> {
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed == "---" {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix('#') {
            let rest = rest.trim();
            if let Some(value) = rest.strip_prefix('@') {
                let mut parts = value.splitn(2, char::is_whitespace);
                let key = parts.next().unwrap_or("");
                let value = parts.next().unwrap_or("").trim();
                if key == "package" {
                    return Some(value.to_string());
                }
                continue;
            }
            continue;
        }
        break;
    }
    None
}

fn parse_header(text: &str) -> Result<Header, ResolveError> {
    let declared_package = extract_declared_package(text);
    let doc: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| ResolveError::repository(e.to_string()))?;
    let defaults = match doc.get("defaults") {
        Some(serde_yaml::Value::Sequence(seq)) => {
            seq.iter().map(parse_defaults_entry).collect::<Result<Vec<_>, _>>()?
        }
        Some(serde_yaml::Value::Null) | None => Vec::new(),
        Some(other) => {
            return Err(ResolveError::repository(format!("'defaults' must be a sequence, got {:?}", other)))
        }
    };
    Ok(Header { defaults, declared_package })
}

/// Filesystem-backed repository rooted at a single search path, mirroring the
/// teacher's file-extension inference (`.yaml`/`.yml`) and directory-is-group
/// convention.
pub struct FileConfigRepository {
    base_path: PathBuf,
}

impl FileConfigRepository {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    fn resolve_file(&self, config_path: &str) -> Option<PathBuf> {
        for ext in ["yaml", "yml"] {
            let candidate = self.base_path.join(format!("{}.{}", config_path, ext));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }
}

impl ConfigRepository for FileConfigRepository {
    fn load_header(&self, config_path: &str) -> Result<Header, ResolveError> {
        let path = self
            .resolve_file(config_path)
            .ok_or_else(|| ResolveError::config_not_found(config_path))?;
        let text = fs::read_to_string(&path).map_err(|e| ResolveError::repository(e.to_string()))?;
        parse_header(&text)
    }

    fn group_options(&self, group: &str) -> Vec<String> {
        let dir = self.base_path.join(group);
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut options: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if !path.is_file() {
                    return None;
                }
                let stem = path.file_stem()?.to_str()?.to_string();
                let ext = path.extension()?.to_str()?.to_string();
                (ext == "yaml" || ext == "yml").then_some(stem)
            })
            .collect();
        options.sort();
        options.dedup();
        options
    }
}

/// Construction-free repository backed by a `HashMap`, for tests.
#[derive(Default)]
pub struct InMemoryConfigRepository {
    configs: HashMap<String, Header>,
}

impl InMemoryConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a config at `config_path` composed from raw YAML text
    /// (including any leading `# @package` comment).
    pub fn with_config_yaml(mut self, config_path: impl Into<String>, yaml: &str) -> Self {
        let header = parse_header(yaml).expect("fixture YAML must parse");
        self.configs.insert(config_path.into(), header);
        self
    }

    /// Register a config directly from an already-built [`Header`].
    pub fn with_header(mut self, config_path: impl Into<String>, header: Header) -> Self {
        self.configs.insert(config_path.into(), header);
        self
    }
}

impl ConfigRepository for InMemoryConfigRepository {
    fn load_header(&self, config_path: &str) -> Result<Header, ResolveError> {
        self.configs
            .get(config_path)
            .cloned()
            .ok_or_else(|| ResolveError::config_not_found(config_path))
    }

    fn group_options(&self, group: &str) -> Vec<String> {
        let prefix = format!("{}/", group);
        let mut options: Vec<String> = self
            .configs
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(|rest| rest.to_string())
            .collect();
        options.sort();
        options.dedup();
        options
    }
}

/// Wraps any [`ConfigRepository`] and memoizes `load_header` by path,
/// mirroring the teacher's caching wrapper over its own source list.
pub struct CachingConfigRepository<'a, R: ConfigRepository> {
    inner: &'a R,
    cache: RefCell<HashMap<String, Header>>,
}

impl<'a, R: ConfigRepository> CachingConfigRepository<'a, R> {
    pub fn new(inner: &'a R) -> Self {
        Self { inner, cache: RefCell::new(HashMap::new()) }
    }
}

impl<'a, R: ConfigRepository> ConfigRepository for CachingConfigRepository<'a, R> {
    fn load_header(&self, config_path: &str) -> Result<Header, ResolveError> {
        if let Some(cached) = self.cache.borrow().get(config_path) {
            return Ok(cached.clone());
        }
        let header = self.inner.load_header(config_path)?;
        self.cache.borrow_mut().insert(config_path.to_string(), header.clone());
        Ok(header)
    }

    fn group_options(&self, group: &str) -> Vec<String> {
        self.inner.group_options(group)
    }

    fn exists(&self, group: &str, option: &str) -> bool {
        self.inner.exists(group, option)
    }
}
