//! Commit planning for submitted edits.

use std::collections::HashSet;

use crate::types::{CommitPlan, SubmittedValues, TimelogUpdate};

/// Split submitted values into deletions followed by updates.
///
/// Records flagged for deletion are collected first, in submission order.
/// Every other record becomes a comment/duration update, also in submission
/// order. An id that is deleted is never updated.
pub fn plan_commit(values: &SubmittedValues) -> CommitPlan {
    let deletions: Vec<String> = values
        .iter()
        .filter(|(_, entry)| entry.delete)
        .map(|(id, _)| id.to_string())
        .collect();

    let deleted: HashSet<&str> = deletions.iter().map(String::as_str).collect();
    let updates = values
        .iter()
        .filter(|(id, _)| !deleted.contains(id))
        .map(|(id, entry)| TimelogUpdate {
            id: id.to_string(),
            comment: entry.comment.clone(),
            duration_seconds: entry.duration_seconds,
        })
        .collect();

    CommitPlan { deletions, updates }
}
