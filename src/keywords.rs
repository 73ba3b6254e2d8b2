//! The TEXT segment keyword registry.
//!
//! Keys are case-insensitive: every key is canonicalized to its ASCII upper-case form on the
//! way in, and lookups canonicalize the same way. Keywords defined by the standard start with
//! [`KEYWORD_SENTINEL`] (`$`); keys without it are kept like any other.
//!
//! The keywords the decoder depends on are enumerated by [`StandardKeyword`], the indexed
//! per-parameter keywords by [`ParameterKeyword`]. Everything else is stored untyped.

use hashbrown::HashMap as FastMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::borrow::Borrow;
use std::fmt;

pub const KEYWORD_SENTINEL: char = '$';

/// A canonical (upper-cased) keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Keyword(String);

impl Keyword {
    pub fn new(raw: &str) -> Self {
        Keyword(raw.to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn standard(&self) -> Option<StandardKeyword> {
        StandardKeyword::from_canonical(&self.0)
    }

    pub fn parameter(&self) -> Option<ParameterKeyword> {
        ParameterKeyword::from_canonical(&self.0)
    }
}

impl Borrow<str> for Keyword {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<StandardKeyword> for Keyword {
    fn from(k: StandardKeyword) -> Self {
        Keyword(k.as_str().to_owned())
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardKeyword {
    BeginSText,
    EndSText,
    BeginAnalysis,
    EndAnalysis,
    BeginData,
    EndData,
    Mode,
    DataType,
    ByteOrd,
    Par,
    Tot,
}

impl StandardKeyword {
    pub const ALL: [StandardKeyword; 11] = [
        StandardKeyword::BeginSText,
        StandardKeyword::EndSText,
        StandardKeyword::BeginAnalysis,
        StandardKeyword::EndAnalysis,
        StandardKeyword::BeginData,
        StandardKeyword::EndData,
        StandardKeyword::Mode,
        StandardKeyword::DataType,
        StandardKeyword::ByteOrd,
        StandardKeyword::Par,
        StandardKeyword::Tot,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StandardKeyword::BeginSText => "$BEGINSTEXT",
            StandardKeyword::EndSText => "$ENDSTEXT",
            StandardKeyword::BeginAnalysis => "$BEGINANALYSIS",
            StandardKeyword::EndAnalysis => "$ENDANALYSIS",
            StandardKeyword::BeginData => "$BEGINDATA",
            StandardKeyword::EndData => "$ENDDATA",
            StandardKeyword::Mode => "$MODE",
            StandardKeyword::DataType => "$DATATYPE",
            StandardKeyword::ByteOrd => "$BYTEORD",
            StandardKeyword::Par => "$PAR",
            StandardKeyword::Tot => "$TOT",
        }
    }

    fn from_canonical(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for StandardKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterField {
    /// `$PnN`
    Name,
    /// `$PnR`
    Range,
}

/// An indexed per-parameter keyword, `$P<index><field>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterKeyword {
    pub index: u32,
    pub field: ParameterField,
}

impl ParameterKeyword {
    fn from_canonical(key: &str) -> Option<Self> {
        let rest = key.strip_prefix(KEYWORD_SENTINEL)?.strip_prefix('P')?;
        let (digits, suffix) = rest.split_at(rest.find(|c: char| !c.is_ascii_digit())?);
        if digits.is_empty() {
            return None;
        }

        let field = match suffix {
            "N" => ParameterField::Name,
            "R" => ParameterField::Range,
            _ => return None,
        };

        Some(ParameterKeyword {
            index: digits.parse().ok()?,
            field,
        })
    }
}

/// Ordered, case-insensitive mapping from keywords to their raw values.
///
/// Inserting an existing key replaces its value. Enumeration is lexicographic by key.
#[derive(Debug, Clone, Default)]
pub struct KeywordRegistry {
    entries: FastMap<Keyword, String, ahash::RandomState>,
}

impl KeywordRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `key`, returning the previous value if there was one.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Option<String> {
        self.entries.insert(Keyword::new(key), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key.to_ascii_uppercase().as_str())
            .map(String::as_str)
    }

    /// Value of `key` as an unsigned decimal integer, ignoring surrounding whitespace.
    pub fn get_int(&self, key: &str) -> Option<u64> {
        self.get(key)?.trim().parse().ok()
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key)?.trim().parse().ok()
    }

    pub fn get_standard(&self, key: StandardKeyword) -> Option<&str> {
        self.entries.get(key.as_str()).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys, sorted lexicographically.
    pub fn keys(&self) -> Vec<&Keyword> {
        let mut keys: Vec<&Keyword> = self.entries.keys().collect();
        keys.sort_unstable();
        keys
    }

    /// All `(key, value)` pairs, sorted lexicographically by key.
    pub fn iter(&self) -> impl Iterator<Item = (&Keyword, &str)> + '_ {
        self.keys()
            .into_iter()
            .map(move |k| (k, self.entries[k].as_str()))
    }

    /// Unordered view used by the parameter indexer.
    pub(crate) fn unordered(&self) -> impl Iterator<Item = (&Keyword, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }
}

impl Serialize for KeywordRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k.as_str(), v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_keys_are_case_insensitive() {
        let mut registry = KeywordRegistry::new();
        registry.set("$BeginData", "1024");

        assert_eq!(registry.get("$BEGINDATA"), Some("1024"));
        assert_eq!(registry.get("$begindata"), Some("1024"));
        assert_eq!(registry.get_standard(StandardKeyword::BeginData), Some("1024"));
        assert_eq!(registry.keys()[0].as_str(), "$BEGINDATA");
    }

    #[test]
    fn test_last_write_wins() {
        let mut registry = KeywordRegistry::new();
        assert_eq!(registry.set("$TOT", "10"), None);
        assert_eq!(registry.set("$tot", "20"), Some("10".to_owned()));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_int("$TOT"), Some(20));
    }

    #[test]
    fn test_numeric_accessors() {
        let mut registry = KeywordRegistry::new();
        registry.set("$PAR", " 12 ");
        registry.set("$P1R", "262144");
        registry.set("$P1E", "0,0");
        registry.set("$TIMESTEP", "0.01");

        assert_eq!(registry.get_int("$PAR"), Some(12));
        assert_eq!(registry.get_int("$P1R"), Some(262144));
        assert_eq!(registry.get_int("$P1E"), None);
        assert_eq!(registry.get_int("$MISSING"), None);
        assert_eq!(registry.get_float("$TIMESTEP"), Some(0.01));
        assert_eq!(registry.get_float("$P1R"), Some(262144.0));
    }

    #[test]
    fn test_iterates_in_lexicographic_order() {
        let mut registry = KeywordRegistry::new();
        registry.set("$TOT", "3");
        registry.set("$BYTEORD", "1,2,3,4");
        registry.set("CREATOR", "cytometer");
        registry.set("$P1N", "FSC-A");

        let keys: Vec<&str> = registry.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["$BYTEORD", "$P1N", "$TOT", "CREATOR"]);
    }

    #[test]
    fn test_classifies_keywords() {
        assert_eq!(
            Keyword::new("$enddata").standard(),
            Some(StandardKeyword::EndData)
        );
        assert_eq!(Keyword::new("CREATOR").standard(), None);

        assert_eq!(
            Keyword::new("$p12n").parameter(),
            Some(ParameterKeyword {
                index: 12,
                field: ParameterField::Name,
            })
        );
        assert_eq!(
            Keyword::new("$P3R").parameter(),
            Some(ParameterKeyword {
                index: 3,
                field: ParameterField::Range,
            })
        );
        assert_eq!(Keyword::new("$P3S").parameter(), None);
        assert_eq!(Keyword::new("$PAR").parameter(), None);
        assert_eq!(Keyword::new("$PN").parameter(), None);
        assert_eq!(Keyword::new("P1N").parameter(), None);
        assert_eq!(Keyword::new("$P1NAME").parameter(), None);
    }
}
