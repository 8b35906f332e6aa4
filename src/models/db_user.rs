use serde::Deserialize;

/// One row per distinct `clerk_user_id` found across the application tables,
/// with per-table row counts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DbUserSummary {
    pub clerk_user_id: String,
    pub trip_count: i64,
    pub master_item_count: i64,
    pub category_count: i64,
    pub bag_template_count: i64,
}
