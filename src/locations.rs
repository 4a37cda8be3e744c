//! Location name to per-chain theater code lookup.
//!
//! Lookup order for a query string:
//!
//! 1. exact display name;
//! 2. the name with whitespace removed, a leading chain label (`CGV`,
//!    `롯데시네마`, `롯데`, `메가박스`, `MEGABOX`, `LOTTE`) dropped and a
//!    trailing branch suffix `점` dropped, compared against display names
//!    treated the same way;
//! 3. the branch part alone, i.e. the last whitespace-separated word of a
//!    multi-word display name ("대구 수성" answers to "수성").
//!
//! A rule that yields more than one entry fails the lookup instead of
//! falling through, so ambiguous input is never guessed.

use std::{collections::HashMap, fs, path::Path};

use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{Error, Result},
    models::Chain,
};

const PACKAGED_CGV: &str = include_str!("../codes/cgv.json");
const PACKAGED_LOTTE: &str = include_str!("../codes/lotci.json");
const PACKAGED_MEGABOX: &str = include_str!("../codes/megabox.json");

const CHAIN_LABELS: [&str; 6] = ["CGV", "롯데시네마", "롯데", "메가박스", "MEGABOX", "LOTTE"];

/// Ordered `(display name, code)` pairs for one chain. Names are unique; the
/// first occurrence of a name wins, including repeated keys in a table file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CodeTable {
    entries: Vec<(String, String)>,
}

impl CodeTable {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut table = Self::default();
        for (name, code) in entries {
            table.insert(name, code);
        }
        table
    }

    /// Inserts unless the name is already present.
    pub fn insert(&mut self, name: String, code: String) -> bool {
        if self.get(&name).is_some() {
            return false;
        }
        self.entries.push((name, code));
        true
    }

    /// Parses `[{"name": "code", ..}]`, or a bare object. Codes may be text or
    /// numbers.
    pub fn from_json(s: &str) -> Result<Self> {
        let file: TableFile = serde_json::from_str(s).map_err(|e| Error::CodeTable(e.to_string()))?;
        let objects = match file {
            TableFile::List(objects) => objects,
            TableFile::Map(object) => vec![object],
        };
        Ok(Self::new(objects.into_iter().flat_map(|o| o.0)))
    }

    pub fn to_json(&self) -> Result<String> {
        let map: serde_json::Map<String, Value> =
            self.entries.iter().map(|(n, c)| (n.clone(), Value::String(c.clone()))).collect();
        Ok(serde_json::to_string(&Value::Array(vec![Value::Object(map)]))?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, c)| c.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableFile {
    List(Vec<TableObject>),
    Map(TableObject),
}

/// One JSON object of codes, keeping every key in document order.
struct TableObject(Vec<(String, String)>);

#[derive(Deserialize)]
#[serde(untagged)]
enum CodeValue {
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for TableObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(TableObjectVisitor)
    }
}

struct TableObjectVisitor;

impl<'de> Visitor<'de> for TableObjectVisitor {
    type Value = TableObject;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("an object of location name to code")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<TableObject, A::Error> {
        let mut entries = Vec::new();
        while let Some((name, code)) = access.next_entry::<String, CodeValue>()? {
            let code = match code {
                CodeValue::Text(s) => s,
                CodeValue::Number(n) => n.to_string(),
            };
            entries.push((name, code));
        }
        Ok(TableObject(entries))
    }
}

/// Read-only lookup over one code table per chain. Build it once and share it.
#[derive(Clone, Debug, Default)]
pub struct LocationResolver {
    tables: HashMap<Chain, CodeTable>,
}

impl LocationResolver {
    pub fn new(tables: impl IntoIterator<Item = (Chain, CodeTable)>) -> Self {
        Self { tables: tables.into_iter().collect() }
    }

    /// Tables compiled into the crate.
    pub fn packaged() -> Result<Self> {
        Ok(Self::new([
            (Chain::Cgv, CodeTable::from_json(PACKAGED_CGV)?),
            (Chain::Lotte, CodeTable::from_json(PACKAGED_LOTTE)?),
            (Chain::Megabox, CodeTable::from_json(PACKAGED_MEGABOX)?),
        ]))
    }

    /// Reads `cgv.json`, `lotci.json` and `megabox.json` from `dir`.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut tables = Vec::with_capacity(Chain::ALL.len());
        for chain in Chain::ALL {
            let path = dir.join(format!("{}.json", chain.as_str()));
            let table = CodeTable::from_json(&fs::read_to_string(&path)?)?;
            debug!(chain = %chain, path = %path.display(), entries = table.len(), "loaded code table");
            tables.push((chain, table));
        }
        Ok(Self::new(tables))
    }

    pub fn table(&self, chain: Chain) -> Option<&CodeTable> {
        self.tables.get(&chain)
    }

    pub fn available_locations(&self, chain: Chain) -> Vec<String> {
        self.table(chain).map(|t| t.names().map(str::to_string).collect()).unwrap_or_default()
    }

    pub fn resolve(&self, chain: Chain, location: &str) -> Result<&str> {
        self.resolve_entry(chain, location).map(|(_, code)| code)
    }

    /// Like [`resolve`](Self::resolve), returning the matched display name
    /// along with its code.
    pub fn resolve_entry(&self, chain: Chain, location: &str) -> Result<(&str, &str)> {
        let not_found = || Error::LocationNotFound { chain, location: location.to_string() };
        let table = self.table(chain).ok_or_else(not_found)?;

        if let Some((name, code)) = table.entries().iter().find(|(n, _)| n == location) {
            return Ok((name.as_str(), code.as_str()));
        }

        let key = comparable(location);
        if key.is_empty() {
            return Err(not_found());
        }

        let by_name: Vec<&(String, String)> =
            table.entries().iter().filter(|(name, _)| comparable(name) == key).collect();
        let by_branch: Vec<&(String, String)> = table
            .entries()
            .iter()
            .filter(|(name, _)| {
                let mut words = name.split_whitespace();
                let last = words.next_back();
                words.next().is_some() && last.map(comparable).as_deref() == Some(key.as_str())
            })
            .collect();

        for candidates in [by_name, by_branch] {
            match candidates.as_slice() {
                [] => continue,
                [only] => {
                    debug!(chain = %chain, location = %location, matched = %only.0, "resolved location alias");
                    return Ok((only.0.as_str(), only.1.as_str()));
                },
                many => {
                    let names: Vec<&str> = many.iter().map(|(n, _)| n.as_str()).collect();
                    debug!(chain = %chain, location = %location, candidates = ?names, "ambiguous location");
                    return Err(not_found());
                },
            }
        }

        Err(not_found())
    }
}

fn comparable(name: &str) -> String {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    let mut rest = compact.as_str();
    for label in CHAIN_LABELS {
        if let Some(prefix) = rest.get(..label.len())
            && prefix.eq_ignore_ascii_case(label)
        {
            rest = &rest[label.len()..];
            break;
        }
    }
    rest.strip_suffix('점').unwrap_or(rest).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(names: &[&str]) -> CodeTable {
        CodeTable::new(names.iter().enumerate().map(|(i, n)| (n.to_string(), format!("{i:04}"))))
    }

    #[test]
    fn packaged_tables_load() {
        let resolver = LocationResolver::packaged().unwrap();
        for chain in Chain::ALL {
            assert!(!resolver.available_locations(chain).is_empty(), "{chain}");
        }
        assert_eq!(resolver.resolve(Chain::Lotte, "시화").unwrap(), "1|21|3016");
        assert_eq!(resolver.resolve(Chain::Megabox, "안동").unwrap(), "7601");
    }

    #[test]
    fn exact_and_unknown_locations() {
        let resolver = LocationResolver::packaged().unwrap();
        assert!(resolver.resolve(Chain::Cgv, "북수원").unwrap().contains("theatercode="));
        let err = resolver.resolve(Chain::Cgv, "존재하지않는동네").unwrap_err();
        assert!(matches!(err, Error::LocationNotFound { chain: Chain::Cgv, .. }));
    }

    #[test]
    fn chain_label_and_branch_suffix_are_ignored() {
        let resolver = LocationResolver::new([(Chain::Cgv, table(&["수원", "북수원"]))]);
        assert_eq!(resolver.resolve(Chain::Cgv, "CGV 수원").unwrap(), "0000");
        assert_eq!(resolver.resolve(Chain::Cgv, "cgv북수원점").unwrap(), "0001");
        assert_eq!(resolver.resolve(Chain::Cgv, " 수원 ").unwrap(), "0000");
        assert!(resolver.resolve(Chain::Cgv, "CGV").is_err());
    }

    #[test]
    fn alias_resolves_to_table_display_name() {
        let resolver = LocationResolver::new([(Chain::Cgv, table(&["수원", "북수원"]))]);
        assert_eq!(resolver.resolve_entry(Chain::Cgv, "CGV 북수원점").unwrap(), ("북수원", "0001"));
        assert_eq!(resolver.resolve_entry(Chain::Cgv, "수원").unwrap(), ("수원", "0000"));
    }

    #[test]
    fn branch_without_city_prefix() {
        let resolver =
            LocationResolver::new([(Chain::Megabox, table(&["대구 수성", "부산 해운대", "대전"]))]);
        assert_eq!(resolver.resolve(Chain::Megabox, "수성").unwrap(), "0000");
        assert_eq!(resolver.resolve(Chain::Megabox, "메가박스 해운대").unwrap(), "0001");
        // single-word names only answer to rule 1 and 2
        assert_eq!(resolver.resolve(Chain::Megabox, "대전점").unwrap(), "0002");
    }

    #[test]
    fn ambiguous_matches_fail() {
        let resolver =
            LocationResolver::new([(Chain::Lotte, table(&["서울 중앙", "부산 중앙", "수원"]))]);
        assert!(matches!(
            resolver.resolve(Chain::Lotte, "중앙"),
            Err(Error::LocationNotFound { .. })
        ));
        assert!(resolver.resolve(Chain::Lotte, "수").is_err());
    }

    #[test]
    fn missing_table_is_not_found() {
        let resolver = LocationResolver::new([(Chain::Cgv, table(&["수원"]))]);
        assert!(resolver.resolve(Chain::Megabox, "수원").is_err());
        assert!(resolver.available_locations(Chain::Megabox).is_empty());
    }

    #[test]
    fn available_locations_follow_table_order() {
        let resolver = LocationResolver::new([(Chain::Cgv, table(&["홍대", "강남", "수원"]))]);
        assert_eq!(resolver.available_locations(Chain::Cgv), vec!["홍대", "강남", "수원"]);
    }

    #[test]
    fn code_table_json_keeps_order_and_first_duplicate() {
        let table = CodeTable::from_json(r#"[{"하남": "1", "가산": 2}]"#).unwrap();
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["하남", "가산"]);
        assert_eq!(table.get("가산"), Some("2"));

        let reparsed = CodeTable::from_json(&table.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, table);

        let mut table = table;
        assert!(!table.insert("하남".into(), "9".into()));
        assert_eq!(table.get("하남"), Some("1"));

        assert!(CodeTable::from_json(r#"[{"하남": true}]"#).is_err());
        assert!(CodeTable::from_json("[]").unwrap().is_empty());
        assert!(CodeTable::from_json("42").is_err());
    }

    #[test]
    fn repeated_names_in_a_file_keep_the_first_code() {
        let table = CodeTable::from_json(r#"[{"시화": "1|21|3016", "수원": "1|11|3014", "시화": "9|9|9999"}]"#).unwrap();
        assert_eq!(table.get("시화"), Some("1|21|3016"));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["시화", "수원"]);

        let bare = CodeTable::from_json(r#"{"안동": 7601, "안동": 1}"#).unwrap();
        assert_eq!(bare.get("안동"), Some("7601"));
    }
}
