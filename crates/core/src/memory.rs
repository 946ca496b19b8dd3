//! Memory bank: the durable state of the assistant.
//!
//! The memory bank is the single unit of persistence: pantry contents plus
//! recipe feedback, stamped with a schema version. It is loaded once at
//! startup and rewritten in full after every mutating tool call.
//!
//! Tools never mutate the bank directly. They describe the change as a
//! [`StateDelta`], and the dispatch loop applies it and persists the result.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use crate::error::StoreError;

/// Current on-disk schema version of the memory bank.
pub const SCHEMA_VERSION: u32 = 1;

/// Normalize an ingredient or recipe name: trim, collapse inner whitespace,
/// lowercase. Returns `None` for names that are empty after trimming.
pub fn normalize_name(raw: &str) -> Option<String> {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined.to_lowercase())
    }
}

/// The set of ingredients on hand. Names are normalized and unique;
/// iteration is sorted. Names read from a snapshot are normalized too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct Pantry(BTreeSet<String>);

impl Pantry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name. Returns `false` if it was already present or empty.
    pub fn insert(&mut self, name: &str) -> bool {
        match normalize_name(name) {
            Some(n) => self.0.insert(n),
            None => false,
        }
    }

    /// Remove a name. Returns `false` if it was not present.
    pub fn remove(&mut self, name: &str) -> bool {
        match normalize_name(name) {
            Some(n) => self.0.remove(&n),
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        normalize_name(name).is_some_and(|n| self.0.contains(&n))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    /// Sorted snapshot of the contents.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Pantry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut pantry = Pantry::new();
        for name in iter {
            pantry.insert(name.as_ref());
        }
        pantry
    }
}

impl From<Vec<String>> for Pantry {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

/// How the user felt about a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Liked,
    Disliked,
}

impl Sentiment {
    /// Accepted spellings, lowercase.
    pub const ACCEPTED: &'static [&'static str] = &["like", "liked", "dislike", "disliked"];

    /// Parse a loose sentiment tag ("like", "Disliked", ...).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "like" | "liked" => Some(Self::Liked),
            "dislike" | "disliked" => Some(Self::Disliked),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Liked => "liked",
            Self::Disliked => "disliked",
        }
    }
}

/// A single feedback record, keyed by normalized recipe name in the bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub sentiment: Sentiment,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub updated_at: DateTime<Utc>,
}

/// A change to the memory bank, produced by a mutating tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateDelta {
    AddIngredients { names: Vec<String> },
    RemoveIngredients { names: Vec<String> },
    UpsertFeedback {
        recipe: String,
        sentiment: Sentiment,
        #[serde(default)]
        note: Option<String>,
    },
}

/// The aggregate root of durable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBank {
    /// Schema version marker
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub pantry: Pantry,

    /// Normalized recipe name → feedback
    #[serde(default)]
    pub feedback: BTreeMap<String, FeedbackEntry>,
}

fn default_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for MemoryBank {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            pantry: Pantry::new(),
            feedback: BTreeMap::new(),
        }
    }
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a delta. Returns whether anything changed.
    pub fn apply(&mut self, delta: &StateDelta) -> bool {
        match delta {
            StateDelta::AddIngredients { names } => {
                names.iter().fold(false, |changed, n| self.pantry.insert(n) || changed)
            }
            StateDelta::RemoveIngredients { names } => {
                names.iter().fold(false, |changed, n| self.pantry.remove(n) || changed)
            }
            StateDelta::UpsertFeedback { recipe, sentiment, note } => {
                let Some(key) = normalize_name(recipe) else {
                    return false;
                };
                self.feedback.insert(
                    key,
                    FeedbackEntry {
                        sentiment: *sentiment,
                        note: note.clone(),
                        updated_at: Utc::now(),
                    },
                );
                true
            }
        }
    }

    /// Recipe names with the given sentiment, sorted.
    pub fn recipes_with(&self, sentiment: Sentiment) -> Vec<&str> {
        self.feedback
            .iter()
            .filter(|(_, entry)| entry.sentiment == sentiment)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Short human-readable summary used in the model's system context.
    pub fn summary(&self) -> String {
        let pantry = if self.pantry.is_empty() {
            "(empty)".to_string()
        } else {
            self.pantry.to_vec().join(", ")
        };
        let mut out = format!("Pantry: {pantry}");
        let liked = self.recipes_with(Sentiment::Liked);
        if !liked.is_empty() {
            out.push_str(&format!("\nLiked recipes: {}", liked.join(", ")));
        }
        let disliked = self.recipes_with(Sentiment::Disliked);
        if !disliked.is_empty() {
            out.push_str(&format!("\nDisliked recipes: {}", disliked.join(", ")));
        }
        out
    }
}

/// Durable storage for the memory bank.
///
/// Implementations: JSON file (atomic replace), in-memory (for testing).
/// The dispatch loop is the only caller, one turn at a time.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// The store name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Load the last persisted bank, or an empty bank if nothing was saved yet.
    async fn load(&self) -> std::result::Result<MemoryBank, StoreError>;

    /// Persist a complete snapshot of the bank.
    async fn save(&self, bank: &MemoryBank) -> std::result::Result<(), StoreError>;
}
