//! Time-bounded, priority-ranked cross-reference from the security scheme to
//! the company scheme.
//!
//! Links for one security are ordered by priority class, then most recent
//! `valid_from` first, then ascending company id. The order does not depend on
//! the order rows arrive in, so resolution is reproducible for an unchanged
//! table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::calendar::open_ended;
use crate::types::{CompanyId, SecurityId};

/// Link priority class. Lower sorts first and wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum LinkPriority {
    Primary,
    Secondary,
    Tertiary,
    Other,
}

impl From<String> for LinkPriority {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "primary" => LinkPriority::Primary,
            "c" | "secondary" => LinkPriority::Secondary,
            "j" | "tertiary" => LinkPriority::Tertiary,
            _ => LinkPriority::Other,
        }
    }
}

/// One row of the external link table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierLink {
    #[serde(alias = "source_id")]
    pub security_id: SecurityId,
    #[serde(alias = "target_id")]
    pub company_id: CompanyId,
    pub valid_from: NaiveDate,
    /// `None` means the link is still active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
    #[serde(alias = "priority_class")]
    pub priority: LinkPriority,
}

#[derive(Debug, Clone)]
struct RankedLink {
    company_id: CompanyId,
    valid_from: NaiveDate,
    valid_to: NaiveDate,
    priority: LinkPriority,
}

impl RankedLink {
    fn contains(&self, date: NaiveDate) -> bool {
        self.valid_from <= date && date <= self.valid_to
    }
}

/// How a resolution was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// A link's validity range contains the reference date.
    Dated,
    /// No link covered the date; the highest-ranked link was used.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub company_id: &'a CompanyId,
    pub kind: MatchKind,
}

#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    links: HashMap<SecurityId, Vec<RankedLink>>,
    warnings: Vec<String>,
}

impl IdentityResolver {
    /// Group links by security and rank each group. Links whose validity
    /// range is inverted are skipped and reported in `warnings()`.
    pub fn build(rows: &[IdentifierLink]) -> Self {
        let mut links: HashMap<SecurityId, Vec<RankedLink>> = HashMap::new();
        let mut warnings = Vec::new();

        for row in rows {
            let valid_to = row.valid_to.unwrap_or_else(open_ended);
            if row.valid_from > valid_to {
                let msg = format!(
                    "Identifier link {} -> {} skipped: valid_from {} after valid_to {}",
                    row.security_id, row.company_id, row.valid_from, valid_to
                );
                tracing::warn!("{msg}");
                warnings.push(msg);
                continue;
            }
            links
                .entry(row.security_id.clone())
                .or_default()
                .push(RankedLink {
                    company_id: row.company_id.clone(),
                    valid_from: row.valid_from,
                    valid_to,
                    priority: row.priority,
                });
        }

        for group in links.values_mut() {
            group.sort_by(|a, b| {
                (a.priority, Reverse(a.valid_from), &a.company_id).cmp(&(
                    b.priority,
                    Reverse(b.valid_from),
                    &b.company_id,
                ))
            });
        }

        tracing::debug!(securities = links.len(), "identity resolver built");
        IdentityResolver { links, warnings }
    }

    /// Company id for `security` as of `reference_date`, with the match kind.
    pub fn resolve_detailed(
        &self,
        security: &SecurityId,
        reference_date: NaiveDate,
    ) -> Option<Resolution<'_>> {
        let group = self.links.get(security)?;
        if let Some(link) = group.iter().find(|l| l.contains(reference_date)) {
            return Some(Resolution {
                company_id: &link.company_id,
                kind: MatchKind::Dated,
            });
        }
        group.first().map(|link| Resolution {
            company_id: &link.company_id,
            kind: MatchKind::Fallback,
        })
    }

    /// Company id for `security` as of `reference_date`; `None` when the
    /// security has no links at all.
    pub fn resolve(&self, security: &SecurityId, reference_date: NaiveDate) -> Option<&CompanyId> {
        self.resolve_detailed(security, reference_date)
            .map(|r| r.company_id)
    }

    pub fn security_count(&self) -> usize {
        self.links.len()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn link(
        sec: &str,
        co: &str,
        from: NaiveDate,
        to: Option<NaiveDate>,
        priority: LinkPriority,
    ) -> IdentifierLink {
        IdentifierLink {
            security_id: sec.into(),
            company_id: co.into(),
            valid_from: from,
            valid_to: to,
            priority,
        }
    }

    #[test]
    fn test_dated_match_preferred_over_priority() {
        let resolver = IdentityResolver::build(&[
            link("1", "A", d(1990, 1, 1), Some(d(1999, 12, 31)), LinkPriority::Primary),
            link("1", "B", d(2000, 1, 1), None, LinkPriority::Secondary),
        ]);
        let r = resolver.resolve_detailed(&"1".into(), d(2005, 6, 30)).unwrap();
        assert_eq!(r.company_id, &CompanyId::from("B"));
        assert_eq!(r.kind, MatchKind::Dated);
    }

    #[test]
    fn test_priority_wins_among_covering_links() {
        let resolver = IdentityResolver::build(&[
            link("1", "C", d(1990, 1, 1), None, LinkPriority::Secondary),
            link("1", "P", d(1990, 1, 1), None, LinkPriority::Primary),
        ]);
        assert_eq!(
            resolver.resolve(&"1".into(), d(2000, 6, 30)),
            Some(&CompanyId::from("P"))
        );
    }

    #[test]
    fn test_fallback_to_highest_priority() {
        let resolver = IdentityResolver::build(&[
            link("1", "B", d(1990, 1, 1), Some(d(1991, 1, 1)), LinkPriority::Tertiary),
            link("1", "A", d(1980, 1, 1), Some(d(1981, 1, 1)), LinkPriority::Primary),
        ]);
        let r = resolver.resolve_detailed(&"1".into(), d(2000, 6, 30)).unwrap();
        assert_eq!(r.company_id, &CompanyId::from("A"));
        assert_eq!(r.kind, MatchKind::Fallback);
    }

    #[test]
    fn test_unknown_security_has_no_mapping() {
        let resolver = IdentityResolver::build(&[]);
        assert!(resolver.resolve(&"404".into(), d(2000, 6, 30)).is_none());
    }

    #[test]
    fn test_equal_priority_tie_break_is_order_independent() {
        let a = link("1", "X", d(1990, 1, 1), None, LinkPriority::Primary);
        let b = link("1", "Y", d(1995, 1, 1), None, LinkPriority::Primary);
        let c = link("1", "Z", d(1995, 1, 1), None, LinkPriority::Primary);

        let forward = IdentityResolver::build(&[a.clone(), b.clone(), c.clone()]);
        let backward = IdentityResolver::build(&[c, b, a]);
        let date = d(2000, 6, 30);

        // Latest valid_from first, then ascending company id.
        assert_eq!(forward.resolve(&"1".into(), date), Some(&CompanyId::from("Y")));
        for _ in 0..5 {
            assert_eq!(
                forward.resolve(&"1".into(), date),
                backward.resolve(&"1".into(), date)
            );
        }
    }

    #[test]
    fn test_inverted_link_skipped_with_warning() {
        let resolver = IdentityResolver::build(&[link(
            "1",
            "A",
            d(2000, 1, 1),
            Some(d(1999, 1, 1)),
            LinkPriority::Primary,
        )]);
        assert_eq!(resolver.security_count(), 0);
        assert_eq!(resolver.warnings().len(), 1);
    }

    #[test]
    fn test_priority_codes_deserialise() {
        let l: IdentifierLink = serde_json::from_str(
            r#"{"source_id":"1","target_id":"A","valid_from":"2000-01-01","priority_class":"C"}"#,
        )
        .unwrap();
        assert_eq!(l.priority, LinkPriority::Secondary);
        assert!(l.valid_to.is_none());
        assert_eq!(LinkPriority::from("N".to_string()), LinkPriority::Other);
        assert_eq!(LinkPriority::from("primary".to_string()), LinkPriority::Primary);
    }
}
