//! Tag component for marking entities

use crate::ecs::Component;
use std::collections::BTreeSet;

/// Set of string tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagComponent {
    tags: BTreeSet<String>,
}

impl Component for TagComponent {}

impl TagComponent {
    /// Create from a list of tags
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { tags: tags.into_iter().map(Into::into).collect() }
    }

    /// Add a tag
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    /// Remove a tag, returning whether it was present
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    /// Check if has tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Tags in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        let mut tags = TagComponent::new(["enemy", "rock"]);
        assert!(tags.has_tag("rock"));
        tags.add_tag("large");
        assert!(tags.remove_tag("rock"));
        assert!(!tags.remove_tag("rock"));
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["enemy", "large"]);
    }
}
