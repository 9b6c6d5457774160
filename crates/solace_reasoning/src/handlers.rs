//! Participant selection for a turn.

use crate::api_types::MessageAnalysis;
use solace_core::HandlerIds;

/// Handler ids chosen for one turn, in insertion order, without duplicates.
///
/// The conductor always comes first, followed by technical, emotional and
/// creative when their analysis score clears the threshold. Roles that map to
/// the same id collapse into one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerSet {
    ids: Vec<String>,
}

impl HandlerSet {
    pub fn select(analysis: &MessageAnalysis, handlers: &HandlerIds, threshold: f32) -> Self {
        let mut set = Self::default();
        set.insert(&handlers.conductor);
        if analysis.technical_content > threshold {
            set.insert(&handlers.technical);
        }
        if analysis.emotional_content > threshold {
            set.insert(&handlers.emotional);
        }
        if analysis.creativity_needed > threshold {
            set.insert(&handlers.creative);
        }
        set
    }

    fn insert(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push(id.to_string());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|h| h == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
