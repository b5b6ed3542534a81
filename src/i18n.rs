// i18n.rs
//
// Runtime string catalog:
// - The default catalog is compiled in from assets/i18n.json
//   (format: { "<lang>": { "key": "value" } }).
// - An assets/i18n.json next to the executable or in the working directory
//   overrides individual keys.
// - Lookup: tr("key") / tr_with("key", &[("name", ...)]) with {name} placeholders;
//   missing keys come back as the key itself.
//
// Language comes from --lang, then PANO_PILLARS_LANG, then "en".

use once_cell::sync::OnceCell;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const DEFAULT_LANG: &str = "en";
pub const LANG_ENV: &str = "PANO_PILLARS_LANG";

const BUILTIN: &str = include_str!("../assets/i18n.json");

type LangTable = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub lang: String,
    map: HashMap<String, String>,
    fallback: HashMap<String, String>,
}

impl Catalog {
    /// Build a catalog for `lang` out of `tables`, later tables overriding earlier ones.
    pub fn from_tables(lang: &str, tables: &[LangTable]) -> Self {
        let pick = |code: &str| {
            let mut out = HashMap::new();
            for table in tables {
                if let Some(entries) = table.get(code) {
                    out.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
            out
        };

        Self {
            lang: lang.to_string(),
            map: pick(lang),
            fallback: pick(DEFAULT_LANG),
        }
    }

    pub fn get(&self, key: &str) -> String {
        self.map
            .get(key)
            .or_else(|| self.fallback.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn languages(tables: &[LangTable]) -> Vec<String> {
        let mut codes: Vec<String> = tables.iter().flat_map(|t| t.keys().cloned()).collect();
        codes.sort();
        codes.dedup();
        codes
    }
}

static CATALOG: OnceCell<RwLock<Catalog>> = OnceCell::new();

fn parse_table(text: &str) -> Option<LangTable> {
    match serde_json::from_str(text) {
        Ok(table) => Some(table),
        Err(e) => {
            log::warn!("ignoring malformed string table: {}", e);
            None
        }
    }
}

/// assets/i18n.json beside the executable, then under the working directory.
fn find_override() -> Option<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    exe_dir
        .into_iter()
        .chain(std::iter::once(PathBuf::from(".")))
        .map(|dir| dir.join("assets").join("i18n.json"))
        .find(|p| p.exists())
}

fn load_tables() -> Vec<LangTable> {
    let mut tables: Vec<LangTable> = parse_table(BUILTIN).into_iter().collect();
    if let Some(path) = find_override() {
        if let Some(table) = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| parse_table(&text))
        {
            tables.push(table);
        }
    }
    tables
}

/// Languages that have at least one string, builtin or overridden.
pub fn available_languages() -> Vec<String> {
    Catalog::languages(&load_tables())
}

/// Install the global catalog. Later calls switch language.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let catalog = Catalog::from_tables(&lang, &load_tables());

    if let Some(lock) = CATALOG.get() {
        if let Ok(mut w) = lock.write() {
            *w = catalog;
        }
    } else {
        let _ = CATALOG.set(RwLock::new(catalog));
    }
}

pub fn tr(key: &str) -> String {
    match CATALOG.get().and_then(|l| l.read().ok()) {
        Some(c) => c.get(key),
        None => key.to_string(),
    }
}

/// Like [`tr`], substituting `{name}` placeholders. Unknown placeholders stay as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    substitute(tr(key), args)
}

fn substitute(mut s: String, args: &[(&str, String)]) -> String {
    for (k, v) in args {
        s = s.replace(&format!("{{{}}}", k), v);
    }
    s
}

/// `--lang` wins over the environment; both fall back to English.
pub fn resolve_lang(cli: Option<&str>) -> String {
    if let Some(v) = cli.filter(|v| !v.trim().is_empty()) {
        return v.to_string();
    }
    match std::env::var(LANG_ENV) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => DEFAULT_LANG.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> LangTable {
        parse_table(BUILTIN).expect("builtin table parses")
    }

    #[test]
    fn builtin_has_english_and_chinese() {
        let langs = Catalog::languages(&[builtin()]);
        assert!(langs.contains(&"en".to_string()));
        assert!(langs.contains(&"zh-Hans".to_string()));
    }

    #[test]
    fn every_language_covers_the_english_keys() {
        let table = builtin();
        let en = &table["en"];
        for (lang, entries) in &table {
            for key in en.keys() {
                assert!(entries.contains_key(key), "{} lacks {}", lang, key);
            }
        }
    }

    #[test]
    fn missing_keys_fall_back_to_english_then_key() {
        let mut extra: LangTable = HashMap::new();
        extra.insert(
            "fr".into(),
            HashMap::from([("menu.file".to_string(), "Fichier".to_string())]),
        );
        let catalog = Catalog::from_tables("fr", &[builtin(), extra]);
        assert_eq!(catalog.get("menu.file"), "Fichier");
        assert_eq!(catalog.get("menu.view"), "View");
        assert_eq!(catalog.get("no.such.key"), "no.such.key");
    }

    #[test]
    fn override_table_wins() {
        let mut extra: LangTable = HashMap::new();
        extra.insert(
            "en".into(),
            HashMap::from([("menu.file".to_string(), "Scene".to_string())]),
        );
        let catalog = Catalog::from_tables("en", &[builtin(), extra]);
        assert_eq!(catalog.get("menu.file"), "Scene");
    }

    #[test]
    fn placeholders_are_substituted() {
        let s = substitute(
            "{a} and {b}, not {c}".to_string(),
            &[("a", "1".to_string()), ("b", "2".to_string())],
        );
        assert_eq!(s, "1 and 2, not {c}");
    }

    #[test]
    fn cli_language_beats_default() {
        assert_eq!(resolve_lang(Some("zh-Hans")), "zh-Hans");
    }
}
