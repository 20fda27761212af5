use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// An item the window can hold. The key must be unique per item and totally
/// ordered; the window sorts and deduplicates by it.
pub trait TimelineItem: Clone {
    type Key: Ord + Clone + Hash + fmt::Debug;

    fn key(&self) -> Self::Key;
}

/// Number-or-string key. Numbers sort before strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemKey {
    Number(i64),
    Text(String),
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Number(n) => write!(f, "{}", n),
            ItemKey::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ItemKey {
    fn from(value: i64) -> Self {
        ItemKey::Number(value)
    }
}

impl From<&str> for ItemKey {
    fn from(value: &str) -> Self {
        ItemKey::Text(value.to_string())
    }
}

impl From<String> for ItemKey {
    fn from(value: String) -> Self {
        ItemKey::Text(value)
    }
}
