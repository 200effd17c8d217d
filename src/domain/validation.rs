//! Uniqueness-check intents and their verdicts.

use std::fmt::{Display, Formatter};

/// Request to check whether `field_value` is already taken by another entity.
///
/// `V` is a plain `String` for single-field checks and a whole record
/// candidate for record-level checks.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationIntent<V = String> {
    /// Entity being edited, `None` while creating a new one.
    pub entity_id: Option<i32>,
    pub field_name: String,
    pub field_value: V,
}

impl<V> ValidationIntent<V> {
    pub fn new(entity_id: Option<i32>, field_name: impl Into<String>, field_value: V) -> Self {
        Self {
            entity_id,
            field_name: field_name.into(),
            field_value,
        }
    }

    /// Channel this intent competes on.
    pub fn key(&self) -> ChannelKey {
        ChannelKey {
            entity_id: self.entity_id,
            field_name: self.field_name.clone(),
        }
    }
}

/// Identifies one validation channel: a field of a particular entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    pub entity_id: Option<i32>,
    pub field_name: String,
}

impl ChannelKey {
    pub fn new(entity_id: Option<i32>, field_name: impl Into<String>) -> Self {
        Self {
            entity_id,
            field_name: field_name.into(),
        }
    }
}

impl Display for ChannelKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.entity_id {
            Some(id) => write!(f, "{}#{}", self.field_name, id),
            None => write!(f, "{}#new", self.field_name),
        }
    }
}

/// Outcome of a uniqueness check as seen by a form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Unique,
    Duplicate,
    /// A check is scheduled or in flight: neither valid nor invalid.
    Pending,
    /// The check could not be completed. Inconclusive, never a duplicate.
    Failed(String),
}

impl Verdict {
    pub fn is_pending(&self) -> bool {
        matches!(self, Verdict::Pending)
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Verdict::Duplicate)
    }

    pub fn from_dupe_flag(is_dupe: bool) -> Self {
        if is_dupe {
            Verdict::Duplicate
        } else {
            Verdict::Unique
        }
    }
}
