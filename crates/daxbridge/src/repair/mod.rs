//! Deterministic repair of generated DAX.
//!
//! Repair runs in two stages:
//!
//! 1. [`normalize`]: rewrite rules for known generation defects
//! 2. [`clean`]: drop trailing commentary and markdown fences
//!
//! Both stages are pure and total. Repairing an already repaired query
//! changes nothing.

mod clean;
mod rules;
pub mod scan;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use clean::{clean, strip_fences, truncate_at_note};
pub use rules::{RULES, Rule, normalize, remove_redundant_addcolumns, rewrite_date_part_calls};

/// Query text after repair. Holds query syntax only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepairedQuery(String);

impl RepairedQuery {
    /// Wrap already repaired text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The query text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when nothing but whitespace is left.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Take the query text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for RepairedQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepairedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Repair raw model output into an executable query.
pub fn repair(raw: &str) -> RepairedQuery {
    let repaired = clean(&normalize(raw));
    debug!(query = %repaired, "repaired DAX");
    RepairedQuery(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_full_pipeline() {
        let raw = "```dax\nEVALUATE\nSUMMARIZECOLUMNS(YEAR(Sales[OrderDate]), \"TotalSales\", SUM(Sales[Amount]))\n```\nNote: grouped by calendar year.";
        assert_eq!(
            repair(raw).as_str(),
            "EVALUATE\nSUMMARIZECOLUMNS(Sales[OrderDate].[Year], \"TotalSales\", SUM(Sales[Amount]))"
        );
    }

    #[test]
    fn test_commentary_only_is_empty() {
        assert!(repair("Note: I cannot answer this").is_empty());
        assert!(repair("```\n```").is_empty());
        assert!(repair("   ").is_empty());
    }

    #[test]
    fn test_repair_is_idempotent() {
        let raw = "```\nEVALUATE CALCULATETABLE(ADDCOLUMNS(SUMMARIZECOLUMNS('Date'[Year]), \"Year\", YEAR('Date'[Date])))\n```";
        let once = repair(raw);
        assert_eq!(repair(once.as_str()), once);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let q = RepairedQuery::new("EVALUATE T");
        assert_eq!(serde_json::to_string(&q).unwrap(), "\"EVALUATE T\"");
    }
}
