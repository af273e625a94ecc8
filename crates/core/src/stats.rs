//! Statistics derived from a selection and its assembled content.

use crate::types::{Table, Unit};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Counts reported with every envelope.
///
/// Serialized as `unit_count` plus the format's own alias
/// (`paragraph_count`, `page_count` or `slide_count`) holding the same value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    pub unit: Unit,
    pub unit_count: usize,
    pub table_count: usize,
    pub table_row_counts: Vec<usize>,
    pub char_count: usize,
}

impl Statistics {
    /// All-zero statistics, used by failure envelopes.
    pub fn empty(unit: Unit) -> Self {
        Self {
            unit,
            ..Default::default()
        }
    }

    /// Derive counts after selection and assembly.
    ///
    /// `content` must be the assembled text before any suppression, so the
    /// character count is the same whether or not content is returned.
    pub fn collect<'a>(
        unit: Unit,
        unit_count: usize,
        tables: impl IntoIterator<Item = &'a Table>,
        content: &str,
    ) -> Self {
        let table_row_counts: Vec<usize> = tables.into_iter().map(Table::row_count).collect();
        Self {
            unit,
            unit_count,
            table_count: table_row_counts.len(),
            table_row_counts,
            char_count: content.chars().count(),
        }
    }
}

impl Serialize for Statistics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry(self.unit.count_key(), &self.unit_count)?;
        map.serialize_entry("unit_count", &self.unit_count)?;
        map.serialize_entry("table_count", &self.table_count)?;
        map.serialize_entry("table_row_counts", &self.table_row_counts)?;
        map.serialize_entry("char_count", &self.char_count)?;
        map.end()
    }
}
