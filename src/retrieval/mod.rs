//! Evidence retrieval.
//!
//! - [`EvidenceSource`]: the search collaborator contract
//! - [`SourceTrustPolicy`]: query rewriting and per-domain trust
//! - [`RateLimiter`] / [`RateLimitedSource`]: request pacing for search backends
//! - [`MockEvidenceSource`]: canned results for tests and offline runs

pub mod mock;
pub mod policy;
pub mod rate_limit;
pub mod traits;

pub use mock::MockEvidenceSource;
pub use policy::{MAX_BOOSTED_DOMAINS, SourceFilterMode, SourceTrustPolicy, domain_for_url};
pub use rate_limit::{RateLimitPermit, RateLimitedSource, RateLimiter};
pub use traits::EvidenceSource;
