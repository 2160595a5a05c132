//! Source-trust policy: query rewriting and domain classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::ConfigError;
use crate::types::SourceTrust;

/// Maximum number of trusted domains added to a boosted query.
pub const MAX_BOOSTED_DOMAINS: usize = 5;

const DEFAULT_TRUSTED: &[&str] = &[
    "wikipedia.org",
    "vi.wikipedia.org",
    "en.wikipedia.org",
    "gov.vn",
    "chinhphu.vn",
    "edu.vn",
    "vnexpress.net",
    "tuoitre.vn",
    "thanhnien.vn",
    "nhandan.vn",
    "baochinhphu.vn",
    "dangcongsan.vn",
];

const DEFAULT_UNTRUSTED: &[&str] = &[
    "facebook.com",
    "fb.com",
    "tiktok.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "youtube.com",
    "reddit.com",
    "quora.com",
    "pinterest.com",
];

/// How the trust lists shape the search query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFilterMode {
    /// Append `-site:` directives for untrusted domains.
    #[default]
    Exclude,
    /// Append an OR-grouped `site:` clause for trusted domains.
    Boost,
    /// Leave the query unchanged.
    None,
}

impl fmt::Display for SourceFilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exclude => "exclude",
            Self::Boost => "boost",
            Self::None => "none",
        };
        f.write_str(s)
    }
}

impl FromStr for SourceFilterMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclude" => Ok(Self::Exclude),
            "boost" => Ok(Self::Boost),
            "none" | "" => Ok(Self::None),
            other => Err(ConfigError::UnknownVariant {
                field: "source filter mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Trusted/untrusted domain lists and the filter mode applied to queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceTrustPolicy {
    /// Query rewriting mode.
    pub mode: SourceFilterMode,
    /// Domains preferred in `boost` mode and tagged as trusted.
    pub trusted_domains: Vec<String>,
    /// Domains excluded in `exclude` mode and tagged as untrusted.
    pub untrusted_domains: Vec<String>,
}

impl Default for SourceTrustPolicy {
    fn default() -> Self {
        Self {
            mode: SourceFilterMode::Exclude,
            trusted_domains: DEFAULT_TRUSTED.iter().map(ToString::to_string).collect(),
            untrusted_domains: DEFAULT_UNTRUSTED.iter().map(ToString::to_string).collect(),
        }
    }
}

impl SourceTrustPolicy {
    /// A policy that never rewrites queries and trusts nothing in particular.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            mode: SourceFilterMode::None,
            trusted_domains: Vec::new(),
            untrusted_domains: Vec::new(),
        }
    }

    /// Set the filter mode.
    #[must_use]
    pub fn with_mode(mut self, mode: SourceFilterMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the trusted domain list.
    #[must_use]
    pub fn with_trusted<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the untrusted domain list.
    #[must_use]
    pub fn with_untrusted<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.untrusted_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Build the query actually sent to the evidence source.
    ///
    /// An empty domain list for the active mode leaves the query unchanged.
    #[must_use]
    pub fn rewrite_query(&self, query: &str) -> String {
        match self.mode {
            SourceFilterMode::Exclude => {
                let exclusions: Vec<String> = usable(&self.untrusted_domains)
                    .map(|d| format!("-site:{d}"))
                    .collect();
                if exclusions.is_empty() {
                    return query.to_string();
                }
                format!("{query} {}", exclusions.join(" "))
            }
            SourceFilterMode::Boost => {
                let preferred: Vec<String> = usable(&self.trusted_domains)
                    .take(MAX_BOOSTED_DOMAINS)
                    .map(|d| format!("site:{d}"))
                    .collect();
                if preferred.is_empty() {
                    return query.to_string();
                }
                format!("{query} ({})", preferred.join(" OR "))
            }
            SourceFilterMode::None => query.to_string(),
        }
    }

    /// Classify a domain against the trust lists.
    ///
    /// A domain matches a listed entry if it equals it or is a subdomain of it.
    /// Untrusted entries take precedence.
    #[must_use]
    pub fn classify(&self, domain: Option<&str>) -> SourceTrust {
        let Some(domain) = domain else {
            return SourceTrust::Unknown;
        };
        let domain = domain.to_ascii_lowercase();
        if usable(&self.untrusted_domains).any(|d| domain_matches(&domain, d)) {
            SourceTrust::Untrusted
        } else if usable(&self.trusted_domains).any(|d| domain_matches(&domain, d)) {
            SourceTrust::Trusted
        } else {
            SourceTrust::Unknown
        }
    }
}

fn usable(domains: &[String]) -> impl Iterator<Item = &str> {
    domains.iter().map(|d| d.trim()).filter(|d| !d.is_empty())
}

fn domain_matches(domain: &str, listed: &str) -> bool {
    let listed = listed.to_ascii_lowercase();
    domain == listed
        || domain
            .strip_suffix(listed.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Host of `url`, lower-cased and without a leading `www.`.
#[must_use]
pub fn domain_for_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    (!host.is_empty()).then_some(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclude_mode() {
        let policy = SourceTrustPolicy::default()
            .with_mode(SourceFilterMode::Exclude)
            .with_untrusted(["facebook.com", "tiktok.com"]);
        assert_eq!(
            policy.rewrite_query("Hà Nội là thủ đô"),
            "Hà Nội là thủ đô -site:facebook.com -site:tiktok.com"
        );
    }

    #[test]
    fn test_boost_mode_limits_domains() {
        let policy = SourceTrustPolicy::default()
            .with_mode(SourceFilterMode::Boost)
            .with_trusted(["a.vn", "b.vn", "c.vn", "d.vn", "e.vn", "f.vn"]);
        assert_eq!(
            policy.rewrite_query("claim"),
            "claim (site:a.vn OR site:b.vn OR site:c.vn OR site:d.vn OR site:e.vn)"
        );
    }

    #[test]
    fn test_empty_lists_leave_query_unchanged() {
        let boost = SourceTrustPolicy::default()
            .with_mode(SourceFilterMode::Boost)
            .with_trusted(Vec::<String>::new());
        assert_eq!(boost.rewrite_query("claim"), "claim");

        let exclude = SourceTrustPolicy::default()
            .with_mode(SourceFilterMode::Exclude)
            .with_untrusted(["", "  "]);
        assert_eq!(exclude.rewrite_query("claim"), "claim");
    }

    #[test]
    fn test_none_mode() {
        let policy = SourceTrustPolicy::default().with_mode(SourceFilterMode::None);
        assert_eq!(policy.rewrite_query("claim"), "claim");
        assert_eq!(SourceTrustPolicy::disabled().rewrite_query("claim"), "claim");
    }

    #[test]
    fn test_default_policy_excludes_social_media() {
        let query = SourceTrustPolicy::default().rewrite_query("claim");
        assert!(query.starts_with("claim -site:facebook.com"));
        assert!(query.contains("-site:youtube.com"));
    }

    #[test]
    fn test_classify() {
        let policy = SourceTrustPolicy::default();
        assert_eq!(policy.classify(Some("vi.wikipedia.org")), SourceTrust::Trusted);
        assert_eq!(policy.classify(Some("chinhphu.gov.vn")), SourceTrust::Trusted);
        assert_eq!(policy.classify(Some("m.facebook.com")), SourceTrust::Untrusted);
        assert_eq!(policy.classify(Some("notfacebook.com")), SourceTrust::Unknown);
        assert_eq!(policy.classify(None), SourceTrust::Unknown);
    }

    #[test]
    fn test_untrusted_wins() {
        let policy = SourceTrustPolicy::default()
            .with_trusted(["example.com"])
            .with_untrusted(["example.com"]);
        assert_eq!(policy.classify(Some("example.com")), SourceTrust::Untrusted);
    }

    #[test]
    fn test_domain_for_url() {
        assert_eq!(
            domain_for_url("https://www.vnexpress.net/path?q=1").as_deref(),
            Some("vnexpress.net")
        );
        assert_eq!(
            domain_for_url("http://VI.Wikipedia.org/wiki/H").as_deref(),
            Some("vi.wikipedia.org")
        );
        assert!(domain_for_url("").is_none());
        assert!(domain_for_url("no scheme").is_none());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("BOOST".parse::<SourceFilterMode>().unwrap(), SourceFilterMode::Boost);
        assert!("goggles".parse::<SourceFilterMode>().is_err());
    }
}
