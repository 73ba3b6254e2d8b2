use crate::data_segment::DecodedRecord;
use crate::parameters::ParameterIndex;

use serde::Serialize;
use std::fmt;

pub const DEFAULT_DELIMITER: &str = ",";

/// One named, ranged value of an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: Option<String>,
    pub description: Option<String>,
    pub value: f64,
    /// The parameter's `$PnR`, kept as written.
    pub limit: Option<String>,
}

impl Parameter {
    pub fn new(name: Option<String>, value: f64, limit: Option<String>) -> Self {
        Parameter {
            name,
            description: None,
            value,
            limit,
        }
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Order in which an event's parameters are written out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrder {
    /// Sorted by parameter name.
    #[default]
    Alphabetical,
    /// Ascending `$Pn` index, i.e. the order of the values in DATA.
    Index,
}

/// A single measurement: the parameters decoded from one DATA record.
///
/// Parameters are kept in slot order. Inserting a parameter whose name is already present
/// replaces the existing one in place.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Event {
    parameters: Vec<Parameter>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_record(record: DecodedRecord, index: &ParameterIndex) -> Self {
        let mut event = Event {
            parameters: Vec::with_capacity(record.len()),
        };

        for (slot, value) in record.into_iter().enumerate() {
            let info = index.slot(slot);
            event.insert(Parameter::new(
                info.and_then(|i| i.name.clone()),
                value,
                info.and_then(|i| i.range.clone()),
            ));
        }

        event
    }

    /// Adds `parameter`, returning the parameter it replaced.
    pub fn insert(&mut self, parameter: Parameter) -> Option<Parameter> {
        match self
            .parameters
            .iter_mut()
            .find(|p| p.name == parameter.name)
        {
            Some(existing) => Some(std::mem::replace(existing, parameter)),
            None => {
                self.parameters.push(parameter);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name.as_deref() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Parameters in slot order.
    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.parameters.iter()
    }

    pub fn ordered(&self, order: ColumnOrder) -> Vec<&Parameter> {
        let mut params: Vec<&Parameter> = self.parameters.iter().collect();
        if order == ColumnOrder::Alphabetical {
            params.sort_by(|a, b| a.name.cmp(&b.name));
        }
        params
    }

    pub fn names_delimited(&self, delimiter: &str, order: ColumnOrder) -> String {
        self.ordered(order)
            .iter()
            .map(|p| p.name_or_empty())
            .collect::<Vec<_>>()
            .join(delimiter)
    }

    pub fn values_delimited(&self, delimiter: &str, order: ColumnOrder) -> String {
        self.ordered(order)
            .iter()
            .map(|p| format_value(p.value))
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}

impl<'a> IntoIterator for &'a Event {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.values_delimited(DEFAULT_DELIMITER, ColumnOrder::Alphabetical))
    }
}

/// Shortest representation that reads back as the same `f64`, always with a fraction or
/// exponent (`1.0`, `0.10000000149011612`, `1e20`).
pub fn format_value(value: f64) -> String {
    format!("{value:?}")
}
