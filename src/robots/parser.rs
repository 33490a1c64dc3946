//! Robots.txt parser implementation
//!
//! Rules are grouped by user-agent token and matched as plain substrings of the URL. The
//! wildcard and `$` pattern syntax of the full exclusion standard is not interpreted.

use std::collections::HashMap;
use url::Url;

const USER_AGENT_DIRECTIVE: &str = "user-agent:";
const DISALLOW_DIRECTIVE: &str = "disallow:";
const WILDCARD_AGENT: &str = "*";

/// A domain's exclusion rules
///
/// Immutable once built; shared by all workers of a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsPolicy {
    /// Disallow rules keyed by user-agent token, in file order
    groups: HashMap<String, Vec<String>>,
}

impl RobotsPolicy {
    /// Creates a permissive policy that allows everything
    ///
    /// This is what a domain without a robots.txt (HTTP 404) gets.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parses robots.txt content
    ///
    /// # Parsing Rules
    ///
    /// - Lines starting with `#` are comments
    /// - `User-agent: <token>` opens the group for `<token>`
    /// - A line containing `Disallow:` adds every whitespace-separated field after the
    ///   directive to the current group
    /// - A group without `Disallow` lines exists but denies nothing
    /// - Directive names are case-insensitive; everything else is ignored
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    pub fn parse(content: &str) -> Self {
        let mut groups: HashMap<String, Vec<String>> = HashMap::new();
        let mut current_agent = String::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // ASCII lowercasing keeps byte offsets aligned with `line`
            let lowered = line.to_ascii_lowercase();

            if lowered.starts_with(USER_AGENT_DIRECTIVE) {
                current_agent = line[USER_AGENT_DIRECTIVE.len()..].trim().to_string();
                groups.entry(current_agent.clone()).or_default();
                continue;
            }

            // Matched anywhere in the line, so a directive after other text still counts
            if let Some(start) = lowered.find(DISALLOW_DIRECTIVE) {
                let rules = &line[start + DISALLOW_DIRECTIVE.len()..];
                groups
                    .entry(current_agent.clone())
                    .or_default()
                    .extend(rules.split_whitespace().map(str::to_string));
            }
        }

        Self { groups }
    }

    /// Checks if a URL may be fetched by the given user agent
    ///
    /// The group for `user_agent` is used when present, otherwise the `*` group; with
    /// neither, everything is allowed. The URL is denied when its string form contains
    /// any rule of the selected group.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - The crawler's user-agent token, matched exactly
    /// * `url` - The URL to check
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, user_agent: &str, url: &Url) -> bool {
        let Some(rules) = self.rules_for(user_agent) else {
            return true;
        };

        let url = url.as_str();
        !rules.iter().any(|rule| url.contains(rule.as_str()))
    }

    /// Returns the rules that apply to a user agent, after the wildcard fallback
    pub fn rules_for(&self, user_agent: &str) -> Option<&[String]> {
        self.groups
            .get(user_agent)
            .or_else(|| self.groups.get(WILDCARD_AGENT))
            .map(Vec::as_slice)
    }

}
