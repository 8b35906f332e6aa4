use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

use crate::models::{DbUserSummary, IdentityUser};

/// Classification of a user id against the two sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    /// Present in Clerk and in the database.
    Ok,
    /// Clerk account with no database rows (unused account).
    NoDbData,
    /// Database rows with no Clerk account (orphaned data).
    OrphanedDbData,
}

impl UserStatus {
    pub fn label(&self) -> &'static str {
        match self {
            UserStatus::Ok => "ok",
            UserStatus::NoDbData => "NO DB DATA",
            UserStatus::OrphanedDbData => "** ORPHANED DB DATA **",
        }
    }
}

/// One merged report line. Derived per run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationRow {
    pub id: String,
    pub email: String,
    pub trips: i64,
    pub items: i64,
    pub cats: i64,
    pub templates: i64,
    pub status: UserStatus,
}

/// Merges both user sets into one row per id, ordered lexicographically.
/// Every id from either source appears exactly once; duplicate identity ids
/// resolve last-write-wins.
pub fn reconcile(
    identity_users: &[IdentityUser],
    db_summaries: &[DbUserSummary],
) -> Vec<ReconciliationRow> {
    let identity_by_id: HashMap<&str, &IdentityUser> = identity_users
        .iter()
        .map(|u| (u.id.as_str(), u))
        .collect();
    let db_by_id: HashMap<&str, &DbUserSummary> = db_summaries
        .iter()
        .map(|r| (r.clerk_user_id.as_str(), r))
        .collect();

    let all_ids: BTreeSet<&str> = identity_by_id
        .keys()
        .chain(db_by_id.keys())
        .copied()
        .collect();

    all_ids
        .into_iter()
        .map(|id| {
            let identity = identity_by_id.get(id);
            let db = db_by_id.get(id);
            let status = match (identity, db) {
                (Some(_), Some(_)) => UserStatus::Ok,
                (Some(_), None) => UserStatus::NoDbData,
                (None, _) => UserStatus::OrphanedDbData,
            };
            ReconciliationRow {
                id: id.to_string(),
                email: identity.map(|u| u.email.clone()).unwrap_or_default(),
                trips: db.map(|r| r.trip_count).unwrap_or(0),
                items: db.map(|r| r.master_item_count).unwrap_or(0),
                cats: db.map(|r| r.category_count).unwrap_or(0),
                templates: db.map(|r| r.bag_template_count).unwrap_or(0),
                status,
            }
        })
        .collect()
}

/// Renders the fixed-width table and summary sections. Output depends only
/// on the inputs, so identical snapshots render byte-identically.
pub fn render_report(
    rows: &[ReconciliationRow],
    identity_count: usize,
    db_count: usize,
) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<36} {:<35} {:>5} {:>5} {:>4} {:>4}  {}",
        "USER_ID", "EMAIL", "TRIPS", "ITEMS", "CATS", "TMPL", "STATUS"
    );
    let _ = writeln!(
        out,
        "{} {} {} {} {} {}  {}",
        "-".repeat(36),
        "-".repeat(35),
        "-".repeat(5),
        "-".repeat(5),
        "-".repeat(4),
        "-".repeat(4),
        "-".repeat(20)
    );

    for row in rows {
        let _ = writeln!(
            out,
            "{:<36} {:<35} {:>5} {:>5} {:>4} {:>4}  {}",
            row.id,
            row.email,
            row.trips,
            row.items,
            row.cats,
            row.templates,
            row.status.label()
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Clerk users:  {}", identity_count);
    let _ = writeln!(out, "DB users:     {}", db_count);

    let orphaned: Vec<&ReconciliationRow> = rows
        .iter()
        .filter(|r| r.status == UserStatus::OrphanedDbData)
        .collect();
    if orphaned.is_empty() {
        let _ = writeln!(
            out,
            "\nNo orphaned DB data found -- all DB users have Clerk accounts."
        );
    } else {
        let _ = writeln!(
            out,
            "\nOrphaned DB users (no Clerk account): {}",
            orphaned.len()
        );
        for row in &orphaned {
            let _ = writeln!(out, "  {}  ({} trips, {} items)", row.id, row.trips, row.items);
        }
    }

    let unused: Vec<&ReconciliationRow> = rows
        .iter()
        .filter(|r| r.status == UserStatus::NoDbData)
        .collect();
    if !unused.is_empty() {
        let _ = writeln!(out, "\nClerk users with no DB data: {}", unused.len());
        for row in &unused {
            let _ = writeln!(out, "  {}  ({})", row.id, row.email);
        }
    }

    out
}
