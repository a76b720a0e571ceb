//! # Branch Identifiers
//!
//! Branch ids are stored in more than one shape. Older records were written
//! by clients that sent the id as a plain string, newer ones carry the
//! structured `{"$oid": "..."}` form, and some tickets keep the id at the
//! top level instead of under `meta`:
//!
//! ```text
//! ┌────────────────────────────┬──────────────────────────────────────────┐
//! │ Field path                 │ Stored value                             │
//! ├────────────────────────────┼──────────────────────────────────────────┤
//! │ meta.branchId              │ {"$oid": "65f0c2..."}   (structured)     │
//! │ meta.branchId              │ "65f0c2..."             (plain)          │
//! │ branchId                   │ {"$oid": "65f0c2..."}   (legacy, struct) │
//! │ branchId                   │ "65f0c2..."             (legacy, plain)  │
//! └────────────────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! None of these can be rewritten in place, so every comparison goes through
//! [`BranchRef::canonical`] and a named [`BranchMatch`] policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// BranchRef
// =============================================================================

/// A branch id in either of its stored representations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum BranchRef {
    /// `{"$oid": "<id>"}`
    Structured {
        #[serde(rename = "$oid")]
        oid: String,
    },
    /// `"<id>"`
    Plain(String),
}

impl BranchRef {
    /// Builds the structured form, the one new records are written with.
    pub fn structured(id: impl Into<String>) -> Self {
        BranchRef::Structured { oid: id.into() }
    }

    /// Builds the plain string form.
    pub fn plain(id: impl Into<String>) -> Self {
        BranchRef::Plain(id.into())
    }

    /// The comparable id text, whichever representation was stored.
    pub fn canonical(&self) -> &str {
        match self {
            BranchRef::Structured { oid } => oid.trim(),
            BranchRef::Plain(id) => id.trim(),
        }
    }

    /// True when the stored value carries no id at all.
    pub fn is_blank(&self) -> bool {
        self.canonical().is_empty()
    }
}

impl fmt::Display for BranchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

// =============================================================================
// Match Policies
// =============================================================================

/// How a record's branch fields are compared against a requested branch id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchMatch {
    /// Structured or plain, under `meta.branchId` or the top-level `branchId`.
    #[default]
    AnyRepresentation,
    /// Only a plain-string `meta.branchId`. Structured ids and the
    /// top-level field are not looked at.
    NestedOnly,
}

impl BranchMatch {
    /// Returns true when the record with the given branch fields belongs to `id`.
    ///
    /// ## Example
    /// ```rust
    /// use cpr_core::branch::{BranchMatch, BranchRef};
    ///
    /// let legacy = BranchRef::plain("b1");
    /// assert!(BranchMatch::AnyRepresentation.matches(None, Some(&legacy), "b1"));
    /// assert!(!BranchMatch::NestedOnly.matches(None, Some(&legacy), "b1"));
    /// ```
    pub fn matches(&self, nested: Option<&BranchRef>, top_level: Option<&BranchRef>, id: &str) -> bool {
        let id = id.trim();
        if id.is_empty() {
            return false;
        }
        let hit = |r: Option<&BranchRef>| r.is_some_and(|r| r.canonical() == id);

        match self {
            BranchMatch::AnyRepresentation => hit(nested) || hit(top_level),
            // stored value compared as-is
            BranchMatch::NestedOnly => matches!(nested, Some(BranchRef::Plain(p)) if p == id),
        }
    }

    /// Name used in configuration (`any-representation` / `nested-only`).
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchMatch::AnyRepresentation => "any-representation",
            BranchMatch::NestedOnly => "nested-only",
        }
    }
}

impl FromStr for BranchMatch {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any-representation" | "any" => Ok(BranchMatch::AnyRepresentation),
            "nested-only" | "nested" => Ok(BranchMatch::NestedOnly),
            _ => Err(ValidationError::NotAllowed {
                field: "branch match".to_string(),
                allowed: vec!["any-representation".to_string(), "nested-only".to_string()],
            }),
        }
    }
}

/// Branch match policies used when building the daily report.
///
/// Tickets have always been matched on every representation while guarantees
/// were matched on `meta.branchId` alone. Both settings are kept side by side
/// so the difference is visible and configurable in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPolicy {
    pub tickets: BranchMatch,
    pub guarantees: BranchMatch,
}

impl Default for ReportPolicy {
    fn default() -> Self {
        ReportPolicy {
            tickets: BranchMatch::AnyRepresentation,
            guarantees: BranchMatch::NestedOnly,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_both_shapes() {
        let plain: BranchRef = serde_json::from_str("\"b1\"").unwrap();
        assert_eq!(plain, BranchRef::plain("b1"));

        let structured: BranchRef = serde_json::from_str(r#"{"$oid":"b1"}"#).unwrap();
        assert_eq!(structured, BranchRef::structured("b1"));

        assert_eq!(plain.canonical(), structured.canonical());
    }

    #[test]
    fn test_structured_serializes_with_oid_key() {
        let json = serde_json::to_string(&BranchRef::structured("b1")).unwrap();
        assert_eq!(json, r#"{"$oid":"b1"}"#);
    }

    #[test]
    fn test_any_representation_matches_all_four_shapes() {
        let policy = BranchMatch::AnyRepresentation;
        let s = BranchRef::structured("b1");
        let p = BranchRef::plain("b1");

        assert!(policy.matches(Some(&s), None, "b1"));
        assert!(policy.matches(Some(&p), None, "b1"));
        assert!(policy.matches(None, Some(&s), "b1"));
        assert!(policy.matches(None, Some(&p), "b1"));
        assert!(!policy.matches(Some(&p), None, "b2"));
        assert!(!policy.matches(None, None, "b1"));
    }

    #[test]
    fn test_nested_only_wants_a_plain_nested_id() {
        let policy = BranchMatch::NestedOnly;
        let s = BranchRef::structured("b1");
        let p = BranchRef::plain("b1");

        assert!(policy.matches(Some(&p), None, "b1"));
        assert!(!policy.matches(Some(&s), None, "b1"));
        assert!(!policy.matches(None, Some(&p), "b1"));
        assert!(!policy.matches(Some(&BranchRef::plain(" b1")), None, "b1"));
    }

    #[test]
    fn test_blank_id_never_matches() {
        let blank = BranchRef::plain("");
        assert!(blank.is_blank());
        assert!(!BranchMatch::AnyRepresentation.matches(Some(&blank), None, ""));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("nested-only".parse::<BranchMatch>().unwrap(), BranchMatch::NestedOnly);
        assert_eq!(
            "Any-Representation".parse::<BranchMatch>().unwrap(),
            BranchMatch::AnyRepresentation
        );
        assert!("everything".parse::<BranchMatch>().is_err());

        let policy = ReportPolicy::default();
        assert_eq!(policy.tickets, BranchMatch::AnyRepresentation);
        assert_eq!(policy.guarantees, BranchMatch::NestedOnly);
    }
}
