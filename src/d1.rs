use std::path::PathBuf;
use std::process::Stdio;

use serde_json::{Map, Value};
use tokio::process::Command;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::DbUserSummary;

/// Distinct user ids across the four application tables, each with
/// per-table row counts.
const USER_SUMMARY_SQL: &str = "\
SELECT
    clerk_user_id,
    (SELECT COUNT(*) FROM trips         WHERE trips.clerk_user_id = u.clerk_user_id) AS trip_count,
    (SELECT COUNT(*) FROM master_items  WHERE master_items.clerk_user_id = u.clerk_user_id) AS master_item_count,
    (SELECT COUNT(*) FROM categories    WHERE categories.clerk_user_id = u.clerk_user_id) AS category_count,
    (SELECT COUNT(*) FROM bag_templates WHERE bag_templates.clerk_user_id = u.clerk_user_id) AS bag_template_count
FROM (
    SELECT DISTINCT clerk_user_id FROM trips
    UNION
    SELECT DISTINCT clerk_user_id FROM master_items
    UNION
    SELECT DISTINCT clerk_user_id FROM categories
    UNION
    SELECT DISTINCT clerk_user_id FROM bag_templates
) u
ORDER BY clerk_user_id;";

/// Runs read-only SQL against the remote D1 database through the wrangler
/// CLI. Wrangler is the only remote access path available here, so this is
/// an explicit external-process boundary: SQL in, row mappings out.
pub struct D1Client {
    wrangler_bin: PathBuf,
    db_name: String,
}

impl D1Client {
    pub fn new(config: &Config) -> Self {
        Self {
            wrangler_bin: config.wrangler_bin.clone(),
            db_name: config.db_name.clone(),
        }
    }

    /// Executes one SQL statement remotely and returns the result rows.
    /// A non-zero wrangler exit is fatal, with its stderr surfaced verbatim.
    pub async fn run_query(&self, sql: &str) -> AppResult<Vec<Map<String, Value>>> {
        tracing::debug!("Running D1 query via {}", self.wrangler_bin.display());
        let output = Command::new(&self.wrangler_bin)
            .args(["d1", "execute", self.db_name.as_str(), "--remote", "--json", "--command"])
            .arg(sql)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(AppError::Wrangler(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let data: Value = serde_json::from_slice(&output.stdout)?;
        Ok(extract_results(data))
    }

    /// Fetches the per-user activity summary rows.
    pub async fn fetch_user_summaries(&self) -> AppResult<Vec<DbUserSummary>> {
        let rows = self.run_query(USER_SUMMARY_SQL).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)).map_err(AppError::from))
            .collect()
    }
}

/// Wrangler prints `[ { "results": [ {row}, ... ] } ]` for a single
/// statement. Any other shape yields no rows rather than an error, to
/// tolerate minor output variation between wrangler versions.
fn extract_results(data: Value) -> Vec<Map<String, Value>> {
    let Value::Array(mut result_sets) = data else {
        return Vec::new();
    };
    if result_sets.is_empty() {
        return Vec::new();
    }
    let Value::Object(mut result_set) = result_sets.swap_remove(0) else {
        return Vec::new();
    };
    match result_set.remove("results") {
        Some(Value::Array(rows)) => rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_results_expected_shape() {
        let data = json!([{
            "results": [
                {"clerk_user_id": "user_a", "trip_count": 2},
                {"clerk_user_id": "user_b", "trip_count": 0}
            ],
            "success": true
        }]);

        let rows = extract_results(data);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["clerk_user_id"], "user_a");
    }

    #[test]
    fn test_extract_results_unexpected_shapes_yield_empty() {
        assert!(extract_results(json!({})).is_empty());
        assert!(extract_results(json!([])).is_empty());
        assert!(extract_results(json!([{"rows": []}])).is_empty());
        assert!(extract_results(json!([{"results": "oops"}])).is_empty());
        assert!(extract_results(json!("text")).is_empty());
    }

    #[test]
    fn test_summary_row_deserializes() {
        let row = json!({
            "clerk_user_id": "user_a",
            "trip_count": 3,
            "master_item_count": 12,
            "category_count": 4,
            "bag_template_count": 1
        });

        let summary: DbUserSummary = serde_json::from_value(row).unwrap();
        assert_eq!(summary.clerk_user_id, "user_a");
        assert_eq!(summary.trip_count, 3);
        assert_eq!(summary.bag_template_count, 1);
    }

    #[test]
    fn test_summary_sql_covers_all_tables() {
        for table in ["trips", "master_items", "categories", "bag_templates"] {
            assert!(USER_SUMMARY_SQL.contains(&format!("SELECT DISTINCT clerk_user_id FROM {}", table)));
        }
        assert!(USER_SUMMARY_SQL.contains("ORDER BY clerk_user_id"));
    }
}
