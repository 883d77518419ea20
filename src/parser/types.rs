use std::fmt;

/// Aggregate layout of a subscription body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionFormat {
    /// Base64 blob wrapping newline-delimited links
    Base64Links,
    /// Newline-delimited links in plain text
    PlainLinks,
    Clash,
    Surge,
    V2Ray,
}

impl SubscriptionFormat {
    /// Sniffs client-native formats by keyword. Returns `None` for
    /// anything that does not look like one.
    pub fn sniff(content: &str) -> Option<SubscriptionFormat> {
        let lower = content.to_lowercase();
        if lower.contains("proxies:") || lower.contains("proxy-groups:") {
            Some(SubscriptionFormat::Clash)
        } else if lower.contains("[proxy]") || lower.contains("[rule]") {
            Some(SubscriptionFormat::Surge)
        } else if lower.contains("outbounds") && (lower.contains("vmess") || lower.contains("vless"))
        {
            Some(SubscriptionFormat::V2Ray)
        } else {
            None
        }
    }
}

impl fmt::Display for SubscriptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubscriptionFormat::Base64Links => "base64 link list",
            SubscriptionFormat::PlainLinks => "plain link list",
            SubscriptionFormat::Clash => "Clash configuration",
            SubscriptionFormat::Surge => "Surge configuration",
            SubscriptionFormat::V2Ray => "V2Ray configuration",
        };
        f.write_str(name)
    }
}
