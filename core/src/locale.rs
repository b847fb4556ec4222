//! Localization catalog
//!
//! Locale files are nested TOML tables flattened into dotted keys, so
//! `[commands.echo] description = "..."` becomes `commands.echo.description`.
//! Templates substitute `{0}`, `{1}`, ... from positional params and `{name}`
//! from named params; unknown placeholders render as nothing.

use crate::similarity::similarity;
use crate::{Error, Result};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Shortest query `compare` runs the subsequence matcher for
const MIN_FUZZY_QUERY: usize = 3;

const BUILTIN_LOCALES: &[(&str, &str)] = &[
    ("en-US", include_str!("../locales/en-US.toml")),
    ("zh-CN", include_str!("../locales/zh-CN.toml")),
];

/// Parameters for a localized template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pub positional: Vec<String>,
    pub named: BTreeMap<String, serde_json::Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional parameters only
    pub fn positional<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            positional: values.into_iter().map(|v| v.to_string()).collect(),
            named: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.named.insert(key.to_string(), value.into());
        self
    }

    fn lookup(&self, key: &str) -> String {
        if let Ok(index) = key.parse::<usize>() {
            return self.positional.get(index).cloned().unwrap_or_default();
        }
        match self.named.get(key) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

/// A catalog entry matched by [`Localizer::find`]
#[derive(Debug, Clone, PartialEq)]
pub struct ShortcutMatch {
    /// Named captures of the pattern, e.g. `name` and `variant`
    pub data: HashMap<String, String>,
    pub similarity: f64,
}

impl ShortcutMatch {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

/// Text lookup and matching
pub trait Localizer: Send + Sync {
    /// Render the first of `keys` found in the locale chain
    fn text(&self, locales: &[String], keys: &[&str], params: &Params) -> Option<String>;

    /// Find catalog entries whose key matches `pattern` and whose text resembles `query`.
    /// Pattern segments in parentheses capture, e.g. `commands.(name).shortcuts.(variant)`.
    fn find(&self, locales: &[String], pattern: &str, query: &str) -> Vec<ShortcutMatch>;

    /// Whether `query` is a near match for `name`
    fn compare(&self, name: &str, query: &str) -> bool;
}

/// In-memory catalog of locale strings
pub struct Catalog {
    locales: HashMap<String, HashMap<String, String>>,
    default_locale: String,
    min_similarity: f64,
    matcher: SkimMatcherV2,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("locales", &self.locales.keys().collect::<Vec<_>>())
            .field("default_locale", &self.default_locale)
            .field("min_similarity", &self.min_similarity)
            .finish()
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([\w.-]+)\}").expect("valid placeholder regex"))
}

/// Substitute placeholders in a template
pub fn interpolate(template: &str, params: &Params) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| params.lookup(&caps[1]))
        .into_owned()
}

fn flatten(prefix: &str, value: &toml::Value, out: &mut HashMap<String, String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, value) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, value, out);
            }
        }
        toml::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}

fn pattern_regex(pattern: &str) -> Result<(Regex, Vec<String>)> {
    let mut source = String::from("^");
    let mut names = Vec::new();
    let mut rest = pattern;

    while let Some(start) = rest.find('(') {
        source.push_str(&regex::escape(&rest[..start]));
        let end = rest[start..]
            .find(')')
            .map(|e| start + e)
            .ok_or_else(|| Error::Locale(format!("Unclosed capture in pattern {}", pattern)))?;
        let name = &rest[start + 1..end];
        source.push_str(&format!("(?P<{}>.+?)", name));
        names.push(name.to_string());
        rest = &rest[end + 1..];
    }
    source.push_str(&regex::escape(rest));
    source.push('$');

    let regex = Regex::new(&source).map_err(|e| Error::Locale(format!("Invalid pattern {}: {}", pattern, e)))?;
    Ok((regex, names))
}

impl Catalog {
    /// Catalog with the built-in locales
    pub fn new(default_locale: &str) -> Self {
        let mut catalog = Self::empty(default_locale);
        for (locale, source) in BUILTIN_LOCALES {
            // Built-in files are part of the crate and always parse
            if let Err(e) = catalog.define_toml(locale, source) {
                tracing::error!("Built-in locale {} failed to load: {}", locale, e);
            }
        }
        catalog
    }

    /// Catalog without any strings
    pub fn empty(default_locale: &str) -> Self {
        Self {
            locales: HashMap::new(),
            default_locale: default_locale.to_string(),
            min_similarity: 0.5,
            matcher: SkimMatcherV2::default(),
        }
    }

    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Merge a single string into a locale
    pub fn define(&mut self, locale: &str, key: &str, text: &str) {
        self.locales
            .entry(locale.to_string())
            .or_default()
            .insert(key.to_string(), text.to_string());
    }

    /// Merge a TOML document into a locale
    pub fn define_toml(&mut self, locale: &str, source: &str) -> Result<usize> {
        let value: toml::Value = toml::from_str(source)?;
        let mut entries = HashMap::new();
        flatten("", &value, &mut entries);
        let count = entries.len();
        self.locales.entry(locale.to_string()).or_default().extend(entries);
        Ok(count)
    }

    /// Merge every `<locale>.toml` file of a directory over the current strings
    pub fn load_directory<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        let mut loaded = 0;
        let entries = fs::read_dir(dir)
            .map_err(|e| Error::Locale(format!("Failed to read locale directory {:?}: {}", dir, e)))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            let Some(locale) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let content = fs::read_to_string(&path)?;
            let count = self
                .define_toml(&locale, &content)
                .map_err(|e| Error::Locale(format!("Failed to parse {:?}: {}", path, e)))?;
            debug!("Merged {} strings into locale {} from {:?}", count, locale, path);
            loaded += 1;
        }

        info!("Loaded {} locale files from {:?}", loaded, dir);
        Ok(loaded)
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    fn chain<'a>(&'a self, locales: &'a [String]) -> Vec<&'a str> {
        let mut chain: Vec<&str> = Vec::new();
        for locale in locales.iter().map(String::as_str).chain([self.default_locale.as_str(), "en-US"]) {
            if !chain.contains(&locale) {
                chain.push(locale);
            }
        }
        chain
    }

    fn raw(&self, locales: &[String], key: &str) -> Option<&str> {
        self.chain(locales)
            .into_iter()
            .find_map(|locale| self.locales.get(locale)?.get(key).map(String::as_str))
    }
}

impl Localizer for Catalog {
    fn text(&self, locales: &[String], keys: &[&str], params: &Params) -> Option<String> {
        keys.iter()
            .find_map(|key| self.raw(locales, key))
            .map(|template| interpolate(template, params))
    }

    fn find(&self, locales: &[String], pattern: &str, query: &str) -> Vec<ShortcutMatch> {
        let (regex, names) = match pattern_regex(pattern) {
            Ok(compiled) => compiled,
            Err(e) => {
                tracing::warn!("{}", e);
                return Vec::new();
            }
        };

        let mut best: HashMap<Vec<String>, ShortcutMatch> = HashMap::new();
        for locale in self.chain(locales) {
            let Some(strings) = self.locales.get(locale) else {
                continue;
            };
            for (key, text) in strings {
                let Some(caps) = regex.captures(key) else {
                    continue;
                };
                let score = similarity(text, query);
                if score < self.min_similarity {
                    continue;
                }
                let data: HashMap<String, String> = names
                    .iter()
                    .filter_map(|n| caps.name(n).map(|m| (n.clone(), m.as_str().to_string())))
                    .collect();
                let identity: Vec<String> = names.iter().map(|n| data.get(n).cloned().unwrap_or_default()).collect();
                match best.get(&identity) {
                    Some(existing) if existing.similarity >= score => {}
                    _ => {
                        best.insert(identity, ShortcutMatch { data, similarity: score });
                    }
                }
            }
        }

        let mut matches: Vec<ShortcutMatch> = best.into_values().collect();
        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.get("name").cmp(&b.get("name")))
                .then_with(|| a.get("variant").cmp(&b.get("variant")))
        });
        debug!("Shortcut search for {:?} found {} candidates", query, matches.len());
        matches
    }

    fn compare(&self, name: &str, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return false;
        }
        let name = name.to_lowercase();
        // Subsequence matching is only meaningful once the query has a few letters
        let fuzzy = query.chars().count() >= MIN_FUZZY_QUERY && self.matcher.fuzzy_match(&name, &query).is_some();
        fuzzy || similarity(&name, &query) >= self.min_similarity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_interpolation() {
        let params = Params::positional(["a", "b"]).with("count", 3).with("who", "fox");
        assert_eq!(interpolate("{0}-{1}-{2}", &params), "a-b-");
        assert_eq!(interpolate("{who} x{count}", &params), "fox x3");
    }

    #[test]
    fn test_builtin_lookup_and_fallback() {
        let catalog = Catalog::new("en-US");
        let text = catalog
            .text(&locales(&["zh-CN"]), &["commands.foxhelp.messages.command-title"], &Params::positional(["echo"]))
            .unwrap();
        assert_eq!(text, "指令：echo");

        // Unknown locale falls back to the default
        let text = catalog
            .text(&locales(&["fr-FR"]), &["commands.foxhelp.messages.not-found"], &Params::new())
            .unwrap();
        assert_eq!(text, "Command not found.");

        assert!(catalog.text(&[], &["commands.missing.description"], &Params::new()).is_none());
    }

    #[test]
    fn test_first_present_key_wins() {
        let mut catalog = Catalog::empty("en-US");
        catalog.define("en-US", "b", "second");
        let text = catalog.text(&[], &["a", "b"], &Params::new());
        assert_eq!(text.as_deref(), Some("second"));
    }

    #[test]
    fn test_find_shortcuts() {
        let mut catalog = Catalog::empty("en-US").with_min_similarity(0.5);
        catalog.define("en-US", "commands.echo.shortcuts.say", "say");
        catalog.define("en-US", "commands.admin.ban.shortcuts.kick", "kickout");
        catalog.define("en-US", "commands.echo.description", "say");

        let matches = catalog.find(&[], "commands.(name).shortcuts.(variant)", "say");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get("name"), Some("echo"));
        assert_eq!(matches[0].similarity, 1.0);

        let matches = catalog.find(&[], "commands.(name).shortcuts.(variant)", "kickou");
        assert_eq!(matches[0].get("name"), Some("admin.ban"));
        assert!(matches[0].similarity < 1.0);

        assert!(catalog.find(&[], "commands.(name).shortcuts.(variant)", "zzzzzz").is_empty());
    }

    #[test]
    fn test_compare() {
        let catalog = Catalog::empty("en-US");
        assert!(catalog.compare("foxhelp", "fxhelp"));
        assert!(catalog.compare("status", "stats"));
        assert!(!catalog.compare("echo", "weather"));
        assert!(!catalog.compare("echo", ""));
    }

    #[test]
    fn test_compare_short_queries_need_similarity() {
        let catalog = Catalog::empty("en-US");
        assert!(!catalog.compare("echo", "e"));
        assert!(!catalog.compare("weather", "ea"));
        assert!(catalog.compare("e", "e"));
        assert!(catalog.compare("ec", "ec"));
        assert!(catalog.compare("echelon", "ech"));
    }

    #[test]
    fn test_load_directory_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("en-US.toml"),
            "[commands.foxhelp.messages]\nnot-found = \"Nothing here.\"\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut catalog = Catalog::new("en-US");
        assert_eq!(catalog.load_directory(dir.path()).unwrap(), 1);
        let text = catalog.text(&[], &["commands.foxhelp.messages.not-found"], &Params::new());
        assert_eq!(text.as_deref(), Some("Nothing here."));
        // Untouched strings survive the merge
        assert!(catalog.text(&[], &["commands.foxhelp.messages.navigation"], &Params::new()).is_some());
    }
}
