/// Navigation cursor into the (group, story) space
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pointer to the currently displayed story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NavigationCursor {
    pub group_index: usize,
    pub story_index: usize,
}

impl NavigationCursor {
    pub fn new(group_index: usize, story_index: usize) -> Self {
        Self {
            group_index,
            story_index,
        }
    }

    /// First story of the first group
    pub fn origin() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Display for NavigationCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.group_index, self.story_index)
    }
}
