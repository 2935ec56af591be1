//! Legacy `redis.properties` support.
//!
//! Older deployments configure the pool with a flat Java-style properties
//! file (`redis.pool.maxActive=100`, `redis.host=...`). [`PropertiesSource`]
//! reads such a file and exposes it to the `config` builder under the same
//! paths the TOML files use, so it layers like any other source.

use config::{ConfigError, Map, Source, Value, ValueKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Legacy property keys and the config paths they map to.
const KEY_MAP: &[(&str, &str)] = &[
    ("redis.pool.maxActive", "pool.max_active"),
    ("redis.pool.maxIdle", "pool.max_idle"),
    ("redis.pool.maxWait", "pool.max_wait_ms"),
    ("redis.pool.testOnBorrow", "pool.test_on_borrow"),
    ("redis.pool.testOnReturn", "pool.test_on_return"),
    ("redis.host", "redis.host"),
    ("redis.port", "redis.port"),
    ("redis.database", "redis.database"),
    ("redis.isauth", "redis.auth_enabled"),
    ("redis.auth", "redis.password"),
    ("redis.timeout", "redis.timeout_ms"),
];

/// The legacy key whose value keeps its surrounding whitespace.
const PASSWORD_KEY: &str = "redis.auth";

/// Parses properties text into `(key, value)` pairs in file order.
///
/// Follows the `java.util.Properties` line format: `#` and `!` start
/// comments, a line ending in an odd number of backslashes continues on the
/// next one (whose leading whitespace is dropped), and the key ends at the
/// first unescaped `=`, `:` or whitespace. Escapes (`\t`, `\n`, `\r`, `\f`,
/// `\uXXXX`, `\<char>`) are decoded in keys and values. Trailing whitespace
/// in a value is kept.
#[must_use]
pub fn parse(text: &str) -> Vec<(String, String)> {
    logical_lines(text).iter().map(|line| split_entry(line)).collect()
}

/// Translates legacy keys into config paths, dropping unknown keys.
///
/// Values are trimmed, except the password which is used verbatim.
#[must_use]
pub fn to_config_paths(entries: &[(String, String)]) -> Vec<(&'static str, String)> {
    entries
        .iter()
        .filter_map(|(key, value)| {
            let mapped = KEY_MAP.iter().find(|(legacy, _)| legacy == key).map(|(_, path)| *path);
            if mapped.is_none() {
                debug!(key = %key, "Ignoring unknown property");
            }
            let value = if key == PASSWORD_KEY { value.clone() } else { value.trim().to_string() };
            mapped.map(|path| (path, value))
        })
        .collect()
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{c}')
}

/// Joins continued lines and drops comments and blank lines.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending = String::new();
    let mut continuing = false;

    for raw in text.lines() {
        let line = raw.trim_start_matches(is_blank);
        if !continuing && (line.is_empty() || line.starts_with(['#', '!'])) {
            continue;
        }

        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            pending.push_str(&line[..line.len() - 1]);
            continuing = true;
        } else {
            pending.push_str(line);
            lines.push(std::mem::take(&mut pending));
            continuing = false;
        }
    }

    if continuing && !pending.is_empty() {
        lines.push(pending);
    }
    lines
}

/// Splits one logical line into its decoded key and value.
fn split_entry(line: &str) -> (String, String) {
    let mut split = None;
    let mut escaped = false;

    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                split = Some((idx, &line[idx + 1..]));
                break;
            }
            c if is_blank(c) => {
                let rest = line[idx..].trim_start_matches(is_blank);
                split = Some((idx, rest.strip_prefix(['=', ':']).unwrap_or(rest)));
                break;
            }
            _ => {}
        }
    }

    let (key, rest) = match split {
        Some((idx, rest)) => (&line[..idx], rest),
        None => (line, ""),
    };
    (unescape(key), unescape(rest.trim_start_matches(is_blank)))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        warn!(escape = %hex, "Malformed \\u escape in properties, kept as written");
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// A `config` source backed by a `.properties` file.
#[derive(Debug, Clone)]
pub struct PropertiesSource {
    path: PathBuf,
    required: bool,
}

impl PropertiesSource {
    /// Creates a source for the given file.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required: true,
        }
    }

    /// Sets whether a missing file is an error.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

impl Source for PropertiesSource {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if !self.required && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Map::new());
            }
            Err(e) => return Err(ConfigError::Foreign(Box::new(e))),
        };

        let origin = self.path.display().to_string();
        let mut sections: BTreeMap<&str, Map<String, Value>> = BTreeMap::new();

        for (path, value) in to_config_paths(&parse(&text)) {
            if let Some((section, field)) = path.split_once('.') {
                sections
                    .entry(section)
                    .or_default()
                    .insert(field.to_string(), Value::new(Some(&origin), value));
            }
        }

        Ok(sections
            .into_iter()
            .map(|(section, table)| {
                (section.to_string(), Value::new(Some(&origin), ValueKind::Table(table)))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# pool
redis.pool.maxActive=100
redis.pool.maxIdle = 20
! another comment
redis.pool.maxWait:1000
redis.host=10.0.0.5

redis.isauth=true
redis.auth=
redis.custom=ignored
";

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let entries = parse(SAMPLE);
        assert_eq!(entries.len(), 7);
        assert_eq!(entries[0], ("redis.pool.maxActive".to_string(), "100".to_string()));
        assert_eq!(entries[1], ("redis.pool.maxIdle".to_string(), "20".to_string()));
        assert_eq!(entries[2], ("redis.pool.maxWait".to_string(), "1000".to_string()));
        assert_eq!(entries[5], ("redis.auth".to_string(), String::new()));
    }

    #[test]
    fn test_parse_key_without_separator() {
        assert_eq!(parse("lonely"), vec![("lonely".to_string(), String::new())]);
    }

    #[test]
    fn test_parse_whitespace_separator() {
        let entries = parse("redis.host 10.0.0.5\nredis.port\t:\t6380\nredis.timeout   =  3000\n");
        assert_eq!(entries[0], ("redis.host".to_string(), "10.0.0.5".to_string()));
        assert_eq!(entries[1], ("redis.port".to_string(), "6380".to_string()));
        assert_eq!(entries[2], ("redis.timeout".to_string(), "3000".to_string()));
    }

    #[test]
    fn test_parse_decodes_escapes() {
        let entries = parse("redis.auth=pa\\=ss\\:w\\u0041rd\nmy\\ key=tab\\there\n");
        assert_eq!(entries[0], ("redis.auth".to_string(), "pa=ss:wArd".to_string()));
        assert_eq!(entries[1], ("my key".to_string(), "tab\there".to_string()));
    }

    #[test]
    fn test_parse_joins_continuation_lines() {
        let entries = parse("redis.pool.maxActive=\\\n  100\nlist=a,\\\n    b,\\\n    c\n# done\n");
        assert_eq!(entries[0], ("redis.pool.maxActive".to_string(), "100".to_string()));
        assert_eq!(entries[1], ("list".to_string(), "a,b,c".to_string()));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_parse_escaped_trailing_backslash_does_not_continue() {
        let entries = parse("dir=c:\\\\\nredis.host=h\n");
        assert_eq!(entries[0], ("dir".to_string(), "c:\\".to_string()));
        assert_eq!(entries[1], ("redis.host".to_string(), "h".to_string()));
    }

    #[test]
    fn test_password_keeps_whitespace() {
        let paths = to_config_paths(&parse("redis.auth= secret  \nredis.host = cache  \n"));
        assert!(paths.contains(&("redis.password", "secret  ".to_string())));
        assert!(paths.contains(&("redis.host", "cache".to_string())));
    }

    #[test]
    fn test_mixed_legacy_forms_map_to_paths() {
        let paths = to_config_paths(&parse(
            "redis.host 10.0.0.5\nredis.auth=pa\\=ss\nredis.pool.maxActive=\\\n  100\n",
        ));
        assert_eq!(
            paths,
            vec![
                ("redis.host", "10.0.0.5".to_string()),
                ("redis.password", "pa=ss".to_string()),
                ("pool.max_active", "100".to_string()),
            ]
        );
    }

    #[test]
    fn test_to_config_paths_drops_unknown() {
        let paths = to_config_paths(&parse(SAMPLE));
        assert!(paths.contains(&("pool.max_active", "100".to_string())));
        assert!(paths.contains(&("redis.auth_enabled", "true".to_string())));
        assert!(!paths.iter().any(|(_, v)| v == "ignored"));
    }

    #[test]
    fn test_source_builds_nested_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redis.properties");
        std::fs::write(&path, SAMPLE).unwrap();

        let map = PropertiesSource::new(&path).collect().unwrap();
        assert!(map.contains_key("pool"));
        assert!(map.contains_key("redis"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_missing_optional_file_is_empty() {
        let source = PropertiesSource::new("/nonexistent/redis.properties").required(false);
        assert!(source.collect().unwrap().is_empty());
    }

    #[test]
    fn test_missing_required_file_errors() {
        let source = PropertiesSource::new("/nonexistent/redis.properties");
        assert!(source.collect().is_err());
    }
}
