//! Read-only lookup tables built once per run before aggregation.

pub mod fundamentals;
pub mod identity;
pub mod membership;

pub use fundamentals::{FinancialStatementRecord, FundamentalsLookup};
pub use identity::{IdentifierLink, IdentityResolver, LinkPriority, MatchKind, Resolution};
pub use membership::{MembershipIndex, MembershipInterval};
