/// View-tracking types
use serde::{Deserialize, Serialize};

/// Outcome of inserting a view record into the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewInsert {
    /// A new durable record was created
    Inserted,
    /// The uniqueness constraint already held a record for this pair
    AlreadyExists,
}
