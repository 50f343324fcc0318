use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::models::validate_optional_non_negative;
use crate::{Symbol, UtcDateTime, ValidationError};

/// A saved symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub symbol: Symbol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub added_at: UtcDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_price: Option<f64>,
}

impl FavoriteEntry {
    pub fn new(
        symbol: Symbol,
        display_name: Option<String>,
        added_at: UtcDateTime,
        last_price: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_optional_non_negative("last_price", last_price)?;
        Ok(Self {
            symbol,
            display_name: display_name
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty()),
            added_at,
            last_price,
        })
    }
}

/// Caller input for adding a favorite, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewFavorite {
    pub symbol: String,
    pub display_name: Option<String>,
    pub last_price: Option<f64>,
}

impl NewFavorite {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.last_price = Some(price);
        self
    }

    /// Validates the input into a locally stamped entry.
    pub fn into_entry(self, added_at: UtcDateTime) -> Result<FavoriteEntry, ValidationError> {
        let symbol = Symbol::parse(&self.symbol)?;
        FavoriteEntry::new(symbol, self.display_name, added_at, self.last_price)
    }
}

/// Ordered favorites with at most one entry per symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<FavoriteEntry>", into = "Vec<FavoriteEntry>")]
pub struct FavoritesCollection {
    entries: Vec<FavoriteEntry>,
}

impl FavoritesCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FavoriteEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    pub fn position(&self, symbol: &Symbol) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.symbol == symbol)
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&FavoriteEntry> {
        self.entries.iter().find(|entry| &entry.symbol == symbol)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.position(symbol).is_some()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter().map(|entry| &entry.symbol)
    }

    /// Places `entry` first, evicting any entry with the same symbol.
    /// Returns the evicted entry with the index it occupied.
    pub fn upsert_front(&mut self, entry: FavoriteEntry) -> Option<(usize, FavoriteEntry)> {
        let evicted = self.remove(&entry.symbol);
        self.entries.insert(0, entry);
        evicted
    }

    /// Swaps in `entry` where its symbol currently sits, or places it first.
    pub fn replace_or_insert_front(&mut self, entry: FavoriteEntry) {
        match self.position(&entry.symbol) {
            Some(index) => self.entries[index] = entry,
            None => self.entries.insert(0, entry),
        }
    }

    pub fn remove(&mut self, symbol: &Symbol) -> Option<(usize, FavoriteEntry)> {
        let index = self.position(symbol)?;
        Some((index, self.entries.remove(index)))
    }

    /// Puts a previously removed entry back at (or as close as possible to)
    /// its old index, replacing any entry that has since taken its symbol.
    pub fn restore(&mut self, index: usize, entry: FavoriteEntry) {
        let _ = self.remove(&entry.symbol);
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);
    }
}

impl From<Vec<FavoriteEntry>> for FavoritesCollection {
    /// Keeps the first entry seen for each symbol.
    fn from(entries: Vec<FavoriteEntry>) -> Self {
        let mut seen = HashSet::with_capacity(entries.len());
        let entries = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.symbol.clone()))
            .collect();
        Self { entries }
    }
}

impl From<FavoritesCollection> for Vec<FavoriteEntry> {
    fn from(collection: FavoritesCollection) -> Self {
        collection.entries
    }
}

impl FromIterator<FavoriteEntry> for FavoritesCollection {
    fn from_iter<I: IntoIterator<Item = FavoriteEntry>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a> IntoIterator for &'a FavoritesCollection {
    type Item = &'a FavoriteEntry;
    type IntoIter = std::slice::Iter<'a, FavoriteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
