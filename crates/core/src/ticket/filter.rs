//! Composable filter predicates over the `tickets` table.
//!
//! A [`FilterClause`] is a conjunction of [`Condition`] values. Each condition
//! renders to an SQL fragment with `?` placeholders plus its bound values, and
//! can also be evaluated directly against a [`TicketRow`]. User text only ever
//! travels as a bound value, and substring tests use `instr` rather than `LIKE`
//! so the text is matched literally at any length.

use crate::config::StatsPolicy;

use super::{TicketFilter, TicketRow, ALL_STATUSES};

/// A single predicate over a ticket row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Identifier or short description contains the text (ASCII case-insensitive).
    TextContains(String),
    /// Status contains the selector (ASCII case-insensitive).
    StatusContains(String),
    /// Status equals one of the values exactly.
    StatusIn(Vec<String>),
    /// Status starts with the prefix (ASCII case-insensitive).
    StatusPrefix(String),
}

impl Condition {
    /// Render as an SQL boolean expression and its bound parameters.
    pub fn to_sql(&self) -> (String, Vec<String>) {
        match self {
            Condition::TextContains(text) => (
                "(instr(lower(ShortDescription), lower(?)) > 0 OR instr(lower(Number), lower(?)) > 0)"
                    .to_string(),
                vec![text.clone(), text.clone()],
            ),
            Condition::StatusContains(status) => (
                "instr(lower(State), lower(?)) > 0".to_string(),
                vec![status.clone()],
            ),
            Condition::StatusIn(values) if values.is_empty() => ("0".to_string(), Vec::new()),
            Condition::StatusIn(values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                (format!("State IN ({})", placeholders), values.clone())
            }
            Condition::StatusPrefix(prefix) => (
                "instr(lower(State), lower(?)) = 1".to_string(),
                vec![prefix.clone()],
            ),
        }
    }

    /// Evaluate against a row with the same semantics SQLite applies to [`Condition::to_sql`].
    pub fn matches(&self, row: &TicketRow) -> bool {
        match self {
            Condition::TextContains(text) => {
                contains_ignore_ascii_case(&row.short_description, text)
                    || contains_ignore_ascii_case(&row.id, text)
            }
            Condition::StatusContains(status) => contains_ignore_ascii_case(&row.status, status),
            Condition::StatusIn(values) => values.iter().any(|v| *v == row.status),
            Condition::StatusPrefix(prefix) => row
                .status
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
        }
    }
}

/// Conjunction of conditions; empty means "match everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterClause {
    conditions: Vec<Condition>,
}

impl FilterClause {
    /// The universal predicate.
    pub fn all() -> Self {
        Self::default()
    }

    /// This clause ANDed with one more condition.
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_universal(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render as `WHERE ...` (or an empty string) plus bound parameters in order.
    pub fn where_sql(&self) -> (String, Vec<String>) {
        if self.conditions.is_empty() {
            return (String::new(), Vec::new());
        }

        let mut fragments = Vec::with_capacity(self.conditions.len());
        let mut params = Vec::new();
        for condition in &self.conditions {
            let (sql, values) = condition.to_sql();
            fragments.push(sql);
            params.extend(values);
        }

        (format!("WHERE {}", fragments.join(" AND ")), params)
    }

    pub fn matches(&self, row: &TicketRow) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }
}

/// Build the base clause for a search text and status selector.
///
/// Blank search text and the `All` selector (or an empty one) add no condition.
pub fn build_filter_clause(filter: &TicketFilter) -> FilterClause {
    let mut clause = FilterClause::all();

    let search = filter.search.trim();
    if !search.is_empty() {
        clause = clause.and(Condition::TextContains(search.to_string()));
    }

    let status = filter.status.as_str();
    if !status.is_empty() && status != ALL_STATUSES {
        clause = clause.and(Condition::StatusContains(status.to_string()));
    }

    clause
}

/// Named status buckets used only for aggregate counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGroup {
    Resolved,
    InProgress,
    Pending,
    Cancelled,
}

impl StatusGroup {
    /// Groups counted under a policy, in stats order.
    pub fn for_policy(policy: StatsPolicy) -> &'static [StatusGroup] {
        match policy {
            StatsPolicy::Separate => &[
                StatusGroup::Resolved,
                StatusGroup::InProgress,
                StatusGroup::Pending,
                StatusGroup::Cancelled,
            ],
            StatsPolicy::CancelledAsResolved => &[
                StatusGroup::Resolved,
                StatusGroup::InProgress,
                StatusGroup::Pending,
            ],
        }
    }

    pub fn condition(self, policy: StatsPolicy) -> Condition {
        match self {
            StatusGroup::Resolved => {
                let mut statuses = vec!["Resolved".to_string(), "Closed".to_string()];
                if policy == StatsPolicy::CancelledAsResolved {
                    statuses.push("Cancelled".to_string());
                }
                Condition::StatusIn(statuses)
            }
            StatusGroup::InProgress => Condition::StatusIn(vec![
                "Assigned".to_string(),
                "Work in Progress".to_string(),
            ]),
            StatusGroup::Pending => Condition::StatusPrefix("Pending".to_string()),
            StatusGroup::Cancelled => Condition::StatusIn(vec!["Cancelled".to_string()]),
        }
    }
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, description: &str, status: &str) -> TicketRow {
        TicketRow::new(id, "someone", description, status, "2024-01-01")
    }

    #[test]
    fn test_empty_filter_is_universal() {
        let clause = build_filter_clause(&TicketFilter::all());
        assert!(clause.is_universal());
        let (sql, params) = clause.where_sql();
        assert_eq!(sql, "");
        assert!(params.is_empty());
    }

    #[test]
    fn test_whitespace_search_is_ignored() {
        let clause = build_filter_clause(&TicketFilter::new("   ", "All"));
        assert!(clause.is_universal());
    }

    #[test]
    fn test_empty_status_is_ignored() {
        let clause = build_filter_clause(&TicketFilter::new("", ""));
        assert!(clause.is_universal());
    }

    #[test]
    fn test_search_only() {
        let clause = build_filter_clause(&TicketFilter::new("  router ", "All"));
        assert_eq!(
            clause.conditions(),
            &[Condition::TextContains("router".to_string())]
        );
        let (sql, params) = clause.where_sql();
        assert_eq!(
            sql,
            "WHERE (instr(lower(ShortDescription), lower(?)) > 0 OR instr(lower(Number), lower(?)) > 0)"
        );
        assert_eq!(params, vec!["router", "router"]);
    }

    #[test]
    fn test_status_only() {
        let clause = build_filter_clause(&TicketFilter::new("", "Pending"));
        let (sql, params) = clause.where_sql();
        assert_eq!(sql, "WHERE instr(lower(State), lower(?)) > 0");
        assert_eq!(params, vec!["Pending"]);
    }

    #[test]
    fn test_both_conditions_are_anded_in_order() {
        let clause = build_filter_clause(&TicketFilter::new("INC1", "Closed"));
        let (sql, params) = clause.where_sql();
        assert!(sql.starts_with("WHERE (instr(lower(ShortDescription)"));
        assert!(sql.ends_with(" AND instr(lower(State), lower(?)) > 0"));
        assert_eq!(params, vec!["INC1", "INC1", "Closed"]);
    }

    #[test]
    fn test_wildcards_in_search_are_bound_verbatim() {
        let clause = build_filter_clause(&TicketFilter::new("50%_off\\", "All"));
        let (sql, params) = clause.where_sql();
        assert!(!sql.contains("LIKE"));
        assert_eq!(params[0], "50%_off\\");

        let condition = Condition::TextContains("50%_off".to_string());
        assert!(condition.matches(&row("1", "Promo 50%_off ends", "New")));
        assert!(!condition.matches(&row("2", "Promo 50 percent off", "New")));
    }

    #[test]
    fn test_user_text_never_reaches_sql() {
        let hostile = "x' OR 1=1; DROP TABLE tickets; --";
        let clause = build_filter_clause(&TicketFilter::new(hostile, hostile));
        let (sql, params) = clause.where_sql();
        assert!(!sql.contains("DROP"));
        assert!(params.iter().all(|p| p.contains("DROP")));
    }

    #[test]
    fn test_text_condition_matches_id_or_description() {
        let condition = Condition::TextContains("inc0042".to_string());
        assert!(condition.matches(&row("INC0042", "Printer jam", "New")));
        assert!(!condition.matches(&row("INC0043", "Printer jam", "New")));

        let condition = Condition::TextContains("JAM".to_string());
        assert!(condition.matches(&row("INC0043", "Printer jam", "New")));
    }

    #[test]
    fn test_status_contains_is_partial() {
        let condition = Condition::StatusContains("Pending".to_string());
        assert!(condition.matches(&row("1", "", "Pending Parts")));
        assert!(condition.matches(&row("2", "", "Pending Vendor")));
        assert!(!condition.matches(&row("3", "", "Assigned")));
    }

    #[test]
    fn test_status_in_is_exact() {
        let condition = Condition::StatusIn(vec!["Closed".to_string()]);
        assert!(condition.matches(&row("1", "", "Closed")));
        assert!(!condition.matches(&row("2", "", "closed")));
        assert!(!condition.matches(&row("3", "", "Closed Incomplete")));
    }

    #[test]
    fn test_status_prefix() {
        let condition = Condition::StatusPrefix("Pending".to_string());
        assert!(condition.matches(&row("1", "", "Pending Parts")));
        assert!(condition.matches(&row("2", "", "pending")));
        assert!(!condition.matches(&row("3", "", "Not Pending")));
        assert!(!condition.matches(&row("4", "", "Pend")));
    }

    #[test]
    fn test_empty_status_in_matches_nothing() {
        let condition = Condition::StatusIn(Vec::new());
        assert_eq!(condition.to_sql(), ("0".to_string(), Vec::new()));
        assert!(!condition.matches(&row("1", "", "Resolved")));
    }

    #[test]
    fn test_status_groups_by_policy() {
        assert_eq!(StatusGroup::for_policy(StatsPolicy::Separate).len(), 4);
        assert_eq!(
            StatusGroup::for_policy(StatsPolicy::CancelledAsResolved).len(),
            3
        );

        let separate = StatusGroup::Resolved.condition(StatsPolicy::Separate);
        assert!(!separate.matches(&row("1", "", "Cancelled")));

        let merged = StatusGroup::Resolved.condition(StatsPolicy::CancelledAsResolved);
        assert!(merged.matches(&row("1", "", "Cancelled")));
        assert!(merged.matches(&row("2", "", "Closed")));
    }

    #[test]
    fn test_group_condition_sql() {
        let (sql, params) = StatusGroup::InProgress
            .condition(StatsPolicy::Separate)
            .to_sql();
        assert_eq!(sql, "State IN (?, ?)");
        assert_eq!(params, vec!["Assigned", "Work in Progress"]);

        let (sql, params) = StatusGroup::Pending.condition(StatsPolicy::Separate).to_sql();
        assert_eq!(sql, "instr(lower(State), lower(?)) = 1");
        assert_eq!(params, vec!["Pending"]);
    }

    #[test]
    fn test_clause_and_composes() {
        let base = build_filter_clause(&TicketFilter::new("ap", "All"));
        let with_group = base
            .clone()
            .and(StatusGroup::Cancelled.condition(StatsPolicy::Separate));
        assert_eq!(with_group.conditions().len(), 2);
        assert!(with_group.matches(&row("1", "site-ap down", "Cancelled")));
        assert!(!with_group.matches(&row("2", "site-ap down", "Resolved")));
        assert!(base.matches(&row("2", "site-ap down", "Resolved")));
    }
}
