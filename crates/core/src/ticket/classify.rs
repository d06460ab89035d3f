//! Keyword classifier deriving a ticket type from its short description.

use super::TicketType;

/// Keyword sets checked in order; the first set with a hit decides the type.
const RULES: [(TicketType, &[&str]); 3] = [
    (TicketType::AccessPoint, &["-ap", " ap down", "down ap"]),
    (TicketType::Sysmon, &["sysmon"]),
    (TicketType::Ont, &["ont", "naba"]),
];

/// Classify a description by case-insensitive substring match.
pub fn classify(description: &str) -> TicketType {
    let description = description.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| description.contains(k)))
        .map(|(ticket_type, _)| *ticket_type)
        .unwrap_or(TicketType::Uncategorized)
}
