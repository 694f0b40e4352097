use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One public menu impression. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuView {
    pub id: i64,
    pub restaurant_id: i64,
    pub view_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuView {
    pub restaurant_id: i64,
}
