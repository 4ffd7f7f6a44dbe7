//! Temporal record of which securities belong to the tracked universe.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::calendar::open_ended;
use crate::types::{SecurityId, Year};

/// One admission of a security into the index. A security may hold several.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipInterval {
    #[serde(alias = "entity_id")]
    pub security_id: SecurityId,
    #[serde(alias = "start_period")]
    pub start: NaiveDate,
    /// `None` means still a member.
    #[serde(default, alias = "end_period", skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct MembershipIndex {
    spans: HashMap<SecurityId, Vec<Span>>,
    warnings: Vec<String>,
}

impl MembershipIndex {
    /// Group intervals per security into sorted, disjoint spans. Overlapping
    /// or back-to-back intervals are merged; inverted intervals are skipped.
    pub fn build(rows: &[MembershipInterval]) -> Self {
        let mut spans: HashMap<SecurityId, Vec<Span>> = HashMap::new();
        let mut warnings = Vec::new();

        for row in rows {
            let end = row.end.unwrap_or_else(open_ended);
            if row.start > end {
                let msg = format!(
                    "Membership interval for {} skipped: start {} after end {}",
                    row.security_id, row.start, end
                );
                tracing::warn!("{msg}");
                warnings.push(msg);
                continue;
            }
            spans
                .entry(row.security_id.clone())
                .or_default()
                .push(Span {
                    start: row.start,
                    end,
                });
        }

        for list in spans.values_mut() {
            list.sort_by_key(|s| (s.start, s.end));
            let mut merged: Vec<Span> = Vec::with_capacity(list.len());
            for span in list.drain(..) {
                match merged.last_mut() {
                    Some(last) if touches(last, &span) => {
                        if span.end > last.end {
                            last.end = span.end;
                        }
                    }
                    _ => merged.push(span),
                }
            }
            *list = merged;
        }

        tracing::debug!(securities = spans.len(), "membership index built");
        MembershipIndex { spans, warnings }
    }

    /// True when any membership span of `security` overlaps calendar `year`.
    pub fn is_member(&self, security: &SecurityId, year: Year) -> bool {
        self.spans.get(security).is_some_and(|list| {
            list.iter()
                .any(|s| s.start.year() <= year && year <= s.end.year())
        })
    }

    /// True when `security` is a member on the given date.
    pub fn is_member_on(&self, security: &SecurityId, date: NaiveDate) -> bool {
        self.spans
            .get(security)
            .is_some_and(|list| list.iter().any(|s| s.start <= date && date <= s.end))
    }

    /// All members during `year`, sorted by id.
    pub fn members_at(&self, year: Year) -> Vec<&SecurityId> {
        let mut members: Vec<&SecurityId> = self
            .spans
            .keys()
            .filter(|id| self.is_member(id, year))
            .collect();
        members.sort();
        members
    }

    /// Number of disjoint spans held by `security`.
    pub fn span_count(&self, security: &SecurityId) -> usize {
        self.spans.get(security).map_or(0, Vec::len)
    }

    pub fn security_count(&self) -> usize {
        self.spans.len()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

fn touches(last: &Span, next: &Span) -> bool {
    match last.end.succ_opt() {
        Some(day_after) => next.start <= day_after,
        None => true,
    }
}
