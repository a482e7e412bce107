//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Dining table entity (桌台)
///
/// Tables are owned by admin tooling. A table that is still referenced by
/// session history is archived rather than deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    pub restaurant_id: String,
    /// Number or label printed on the table
    pub label: String,
    /// Token encoded in the table's QR code (guest entry point)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

impl DiningTable {
    pub fn new(
        id: impl Into<String>,
        restaurant_id: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            restaurant_id: restaurant_id.into(),
            label: label.into(),
            session_token: None,
            archived: false,
        }
    }
}
