//! Repeated-field groups edited as a list (features, gallery images, results...).

use serde::Serialize;

/// An ordered list of form entries that grows and shrinks one entry at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicList<T> {
    items: Vec<T>,
}

impl<T> DynamicList<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Replace the entry at `index`. Returns false when the index is out of range.
    pub fn update(&mut self, index: usize, value: T) -> bool {
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Remove the entry at `index`, keeping the order of the others.
    /// Out-of-range indexes leave the list untouched.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Default> DynamicList<T> {
    /// Append an empty entry and return its index
    pub fn append(&mut self) -> usize {
        self.items.push(T::default());
        self.items.len() - 1
    }
}

impl<T: Serialize> DynamicList<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.items).unwrap_or_else(|_| "[]".to_string())
    }
}

impl DynamicList<String> {
    /// Entries with surrounding whitespace trimmed and blank entries dropped
    pub fn compacted(&self) -> DynamicList<String> {
        Self::from_vec(
            self.items
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

impl<T> From<Vec<T>> for DynamicList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}
