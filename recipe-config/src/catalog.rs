//! Catalog-level helpers: category listing, filtering and id-keyed updates.

use std::collections::BTreeSet;

use chrono::{DateTime, Local};

use crate::command::Command;

/// Pseudo-category that disables category filtering.
pub const ALL_CATEGORY: &str = "All";

/// `All` followed by every distinct non-empty category, sorted.
pub fn categories(commands: &[Command]) -> Vec<String> {
    let unique: BTreeSet<&str> = commands
        .iter()
        .map(|command| command.category.as_str())
        .filter(|category| !category.is_empty())
        .collect();

    std::iter::once(ALL_CATEGORY)
        .chain(unique)
        .map(String::from)
        .collect()
}

/// Category after `active` in `categories`, wrapping to the first one.
pub fn next_category(categories: &[String], active: &str) -> Option<String> {
    let position = categories.iter().position(|category| category == active);
    match position {
        Some(index) => categories.get((index + 1) % categories.len()).cloned(),
        None => categories.first().cloned(),
    }
}

/// Entries in `category` (unless empty or `All`) whose text matches `filter`.
pub fn filter(commands: &[Command], category: &str, filter: &str) -> Vec<Command> {
    let needle = filter.to_lowercase();
    let any_category = category.is_empty() || category == ALL_CATEGORY;

    commands
        .iter()
        .filter(|command| any_category || command.category == category)
        .filter(|command| command.matches_text(&needle))
        .cloned()
        .collect()
}

/// Replace the record with the same id, or append it. Returns `true` when an
/// existing record was replaced.
pub fn upsert(commands: &mut Vec<Command>, record: Command) -> bool {
    match commands.iter_mut().find(|existing| existing.id == record.id) {
        Some(existing) => {
            *existing = record;
            true
        }
        None => {
            commands.push(record);
            false
        }
    }
}

pub fn remove(commands: &mut Vec<Command>, id: &str) -> Option<Command> {
    let index = commands.iter().position(|command| command.id == id)?;
    Some(commands.remove(index))
}

/// Stamp `last_run` on the entry with `id`. Returns `false` if no entry has
/// that id any more.
pub fn touch_last_run(commands: &mut [Command], id: &str, at: DateTime<Local>) -> bool {
    match commands.iter_mut().find(|command| command.id == id) {
        Some(command) => {
            command.last_run = Some(at);
            true
        }
        None => false,
    }
}

/// Identifier derived from `now` in milliseconds, bumped until it collides
/// with no existing id.
pub fn generate_id(commands: &[Command], now: DateTime<Local>) -> String {
    let mut candidate = now.timestamp_millis();
    loop {
        let id = candidate.to_string();
        if !commands.iter().any(|command| command.id == id) {
            return id;
        }
        candidate += 1;
    }
}
