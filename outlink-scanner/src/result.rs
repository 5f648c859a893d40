use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A hyperlink from a crawled page to a URL outside the site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalLink {
    /// Normalized URL of the page containing the link
    pub page: String,
    /// Resolved link target, kept as found
    pub target: String,
}

impl ExternalLink {
    pub fn new(page: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            target: target.into(),
        }
    }
}

/// Links found on one page, split by site membership.
#[derive(Debug, Clone, Default)]
pub struct PageLinks {
    pub internal: HashSet<String>,
    pub external: HashSet<ExternalLink>,
}

/// Outcome of checking one external URL without following redirects.
///
/// `status` is `None` when the check itself failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    pub status: Option<u16>,
    pub location: Option<String>,
}

impl AuditResult {
    pub fn status(status: u16, location: Option<String>) -> Self {
        Self {
            status: Some(status),
            location,
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }
}

/// External link that passed the audit filter of the current mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuditedLink {
    pub page: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// What a run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditMode {
    /// Every external link on every internal page, no checks
    AllExternal,
    /// External links answering with anything but 200 or 301
    Broken,
    /// External links answering 301, with their redirect target
    Redirected,
}

impl AuditMode {
    pub fn number(self) -> u8 {
        match self {
            AuditMode::AllExternal => 1,
            AuditMode::Broken => 2,
            AuditMode::Redirected => 3,
        }
    }

    pub fn requires_audit(self) -> bool {
        !matches!(self, AuditMode::AllExternal)
    }

    /// Filters an audited link for this mode, attaching the redirect target
    /// in redirect mode.
    pub fn select(self, link: &ExternalLink, result: &AuditResult) -> Option<AuditedLink> {
        let redirect = match (self, result.status) {
            (AuditMode::AllExternal, _) => None,
            (AuditMode::Broken, Some(status)) if status != 200 && status != 301 => None,
            (AuditMode::Redirected, Some(301)) => result.location.clone(),
            _ => return None,
        };

        Some(AuditedLink {
            page: link.page.clone(),
            target: link.target.clone(),
            redirect,
        })
    }
}

impl fmt::Display for AuditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditMode::AllExternal => "external",
            AuditMode::Broken => "broken",
            AuditMode::Redirected => "redirects",
        };
        f.write_str(name)
    }
}

impl FromStr for AuditMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "external" | "all" => Ok(AuditMode::AllExternal),
            "2" | "broken" => Ok(AuditMode::Broken),
            "3" | "redirects" | "redirected" => Ok(AuditMode::Redirected),
            other => Err(format!(
                "unknown mode '{}', expected 1 (external), 2 (broken) or 3 (redirects)",
                other
            )),
        }
    }
}
