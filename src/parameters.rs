use crate::keywords::{KeywordRegistry, ParameterField};

use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// `$PnN`
    pub name: Option<String>,
    /// `$PnR`, kept as written.
    pub range: Option<String>,
}

/// Maps decoded value slots to parameter names and ranges.
///
/// Slot `k` corresponds to the `k`-th smallest index among the `$PnN` keywords, regardless of
/// the order the keywords appeared in TEXT. Slots past the last named index have no name and no
/// range.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParameterIndex {
    by_index: BTreeMap<u32, ParameterInfo>,
    slots: Vec<u32>,
}

impl ParameterIndex {
    pub fn from_keywords(registry: &KeywordRegistry) -> ParameterIndex {
        let mut names = BTreeMap::new();
        let mut ranges = BTreeMap::new();

        for (key, value) in registry.unordered() {
            if let Some(p) = key.parameter() {
                match p.field {
                    ParameterField::Name => names.insert(p.index, value.to_owned()),
                    ParameterField::Range => ranges.insert(p.index, value.to_owned()),
                };
            }
        }

        let slots: Vec<u32> = names.keys().copied().collect();

        let mut by_index: BTreeMap<u32, ParameterInfo> = BTreeMap::new();
        for (index, name) in names {
            by_index.entry(index).or_default().name = Some(name);
        }
        for (index, range) in ranges {
            by_index.entry(index).or_default().range = Some(range);
        }

        ParameterIndex { by_index, slots }
    }

    /// Number of named slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The 1-based `$Pn` index backing `slot`, if any.
    pub fn index_of_slot(&self, slot: usize) -> Option<u32> {
        self.slots.get(slot).copied()
    }

    pub fn slot(&self, slot: usize) -> Option<&ParameterInfo> {
        self.index_of_slot(slot)
            .and_then(|index| self.by_index.get(&index))
    }

    pub fn get(&self, index: u32) -> Option<&ParameterInfo> {
        self.by_index.get(&index)
    }

    /// Names in slot order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.len()).filter_map(move |slot| self.slot(slot)?.name.as_deref())
    }
}
