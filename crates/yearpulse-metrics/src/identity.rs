//! Contact address to organization mapping.

use std::collections::HashSet;

use yearpulse_core::default_ignored_domains;

/// Maps author e-mail addresses to organizational domains.
///
/// Addresses on personal or free-mail providers map to no organization.
///
/// # Examples
///
/// ```
/// use yearpulse_metrics::identity::OrgResolver;
///
/// let orgs = OrgResolver::default();
/// assert_eq!(orgs.organization("dev@Example.COM").as_deref(), Some("example.com"));
/// assert_eq!(orgs.organization("someone@gmail.com"), None);
/// assert_eq!(orgs.organization("not-an-address"), None);
/// ```
#[derive(Debug, Clone)]
pub struct OrgResolver {
    ignored: HashSet<String>,
}

impl OrgResolver {
    /// Build a resolver that treats `ignored_domains` as personal mail.
    pub fn new<I, S>(ignored_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ignored: ignored_domains
                .into_iter()
                .map(|d| d.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Organizational domain for `email`, lower-cased, or `None`.
    ///
    /// The domain is everything after the last `@`. Empty input, input
    /// without `@`, an empty domain, and ignored domains all yield `None`.
    pub fn organization(&self, email: &str) -> Option<String> {
        let (_, domain) = email.rsplit_once('@')?;
        let domain = domain.to_lowercase();
        if domain.is_empty() || self.ignored.contains(&domain) {
            return None;
        }
        Some(domain)
    }
}

impl Default for OrgResolver {
    fn default() -> Self {
        Self::new(default_ignored_domains())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corporate_domain_is_kept() {
        let orgs = OrgResolver::default();
        assert_eq!(orgs.organization("a@co.com").as_deref(), Some("co.com"));
    }

    #[test]
    fn free_mail_is_ignored_case_insensitively() {
        let orgs = OrgResolver::default();
        assert_eq!(orgs.organization("Someone@GMail.Com"), None);
        assert_eq!(orgs.organization("me@icloud.com"), None);
        assert_eq!(orgs.organization("x@yahoo.co.jp"), None);
    }

    #[test]
    fn github_noreply_is_ignored() {
        let orgs = OrgResolver::default();
        assert_eq!(
            orgs.organization("12345+octocat@users.noreply.github.com"),
            None
        );
    }

    #[test]
    fn malformed_addresses_have_no_org() {
        let orgs = OrgResolver::default();
        assert_eq!(orgs.organization(""), None);
        assert_eq!(orgs.organization("no-at-sign"), None);
        assert_eq!(orgs.organization("trailing@"), None);
    }

    #[test]
    fn last_at_sign_wins() {
        let orgs = OrgResolver::default();
        assert_eq!(
            orgs.organization("odd@name@corp.io").as_deref(),
            Some("corp.io")
        );
    }

    #[test]
    fn custom_ignore_list_replaces_defaults() {
        let orgs = OrgResolver::new(["Corp.io"]);
        assert_eq!(orgs.organization("a@corp.io"), None);
        assert_eq!(orgs.organization("a@gmail.com").as_deref(), Some("gmail.com"));
    }
}
