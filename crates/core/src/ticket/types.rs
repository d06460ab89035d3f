//! Ticket records, filters and search results.

use serde::{Deserialize, Serialize};

use super::classify::classify;

/// Status selector value that disables status filtering.
pub const ALL_STATUSES: &str = "All";

/// Status selector values offered to dashboard users.
pub const STATUS_OPTIONS: [&str; 6] = [
    ALL_STATUSES,
    "Resolved",
    "Assigned",
    "Pending",
    "Work in Progress",
    "Closed",
];

/// A ticket row exactly as read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRow {
    pub id: String,
    pub assignee: String,
    pub short_description: String,
    pub status: String,
    /// Storage-native timestamp text; compared as a string, never parsed.
    pub created_at: String,
}

impl TicketRow {
    pub fn new(
        id: impl Into<String>,
        assignee: impl Into<String>,
        short_description: impl Into<String>,
        status: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            assignee: assignee.into(),
            short_description: short_description.into(),
            status: status.into(),
            created_at: created_at.into(),
        }
    }
}

/// Content-derived ticket category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketType {
    #[serde(rename = "Access Point")]
    AccessPoint,
    #[serde(rename = "Sysmon")]
    Sysmon,
    #[serde(rename = "ONT")]
    Ont,
    #[serde(rename = "")]
    Uncategorized,
}

impl TicketType {
    /// Display label; empty for uncategorized tickets.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::AccessPoint => "Access Point",
            TicketType::Sysmon => "Sysmon",
            TicketType::Ont => "ONT",
            TicketType::Uncategorized => "",
        }
    }
}

impl std::fmt::Display for TicketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket summary handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub assignee: String,
    pub short_description: String,
    pub status: String,
    pub created_at: String,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        let ticket_type = classify(&row.short_description);
        Self {
            id: row.id,
            assignee: row.assignee,
            short_description: row.short_description,
            status: row.status,
            created_at: row.created_at,
            ticket_type,
        }
    }
}

/// Search text plus status selector scoping every count, page and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    ALL_STATUSES.to_string()
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: default_status(),
        }
    }
}

impl TicketFilter {
    pub fn new(search: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            status: status.into(),
        }
    }

    /// Filter matching every ticket.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}

/// Aggregate counts over the whole filtered set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: i64,
    pub resolved: i64,
    pub in_progress: i64,
    pub pending: i64,
    /// Only present when cancelled tickets are counted on their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<i64>,
}

/// One page of tickets with its filter-scoped totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub tickets: Vec<Ticket>,
    pub total: i64,
    pub stats: TicketStats,
    /// Page actually served, after clamping.
    pub page: i64,
    pub page_size: u32,
}

impl SearchResult {
    /// Number of pages for this result; never less than one.
    pub fn total_pages(&self) -> i64 {
        total_pages(self.total, self.page_size)
    }
}

/// Pages needed to show `total` rows, with an empty result still counting as one page.
pub fn total_pages(total: i64, page_size: u32) -> i64 {
    let size = i64::from(page_size.max(1));
    ((total + size - 1) / size).max(1)
}
