//! Client identity used to key rate-limit windows.

use axum::http::HeaderMap;
use std::fmt;
use std::net::IpAddr;

/// Who a request is counted against.
///
/// Authenticated callers are tracked by subject id, everyone else by network
/// address. The two live in separate key namespaces, so an authenticated user
/// behind a shared IP never shares a budget with anonymous traffic from that IP.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientIdentity {
    Subject(String),
    Address(String),
}

impl ClientIdentity {
    /// Derives the identity for a request.
    ///
    /// Priority:
    /// 1. `subject` if authentication already ran
    /// 2. Left-most `X-Forwarded-For` entry (only when `trust_forwarded`)
    /// 3. `X-Real-IP` (only when `trust_forwarded`)
    /// 4. Transport peer address
    pub fn derive(
        subject: Option<&str>,
        headers: &HeaderMap,
        peer: Option<IpAddr>,
        trust_forwarded: bool,
    ) -> Self {
        if let Some(subject) = subject {
            return Self::Subject(subject.to_string());
        }

        if trust_forwarded {
            if let Some(ip) = forwarded_for(headers) {
                return Self::Address(ip);
            }
            if let Some(ip) = real_ip(headers) {
                return Self::Address(ip);
            }
        }

        Self::Address(
            peer.map(|ip| ip.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        )
    }

    /// Returns true for identities carrying a resolved subject id.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Subject(_))
    }

    /// Namespaced key fragment, e.g. `user:42` or `ip:10.0.0.1`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subject(id) => write!(f, "user:{id}"),
            Self::Address(ip) => write!(f, "ip:{ip}"),
        }
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn real_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-real-ip")?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<IpAddr> {
        Some("192.0.2.7".parse().unwrap())
    }

    #[test]
    fn test_subject_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.1"));

        let identity = ClientIdentity::derive(Some("user-1"), &headers, peer(), true);

        assert_eq!(identity, ClientIdentity::Subject("user-1".to_string()));
        assert_eq!(identity.key(), "user:user-1");
        assert!(identity.is_authenticated());
    }

    #[test]
    fn test_forwarded_for_uses_leftmost_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 10.0.0.2, 10.0.0.3"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.9"));

        let identity = ClientIdentity::derive(None, &headers, peer(), true);

        assert_eq!(identity.key(), "ip:203.0.113.1");
    }

    #[test]
    fn test_real_ip_when_no_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.9"));

        let identity = ClientIdentity::derive(None, &headers, peer(), true);

        assert_eq!(identity.key(), "ip:198.51.100.9");
    }

    #[test]
    fn test_forwarded_headers_ignored_when_not_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.1"));

        let identity = ClientIdentity::derive(None, &headers, peer(), false);

        assert_eq!(identity.key(), "ip:192.0.2.7");
        assert!(!identity.is_authenticated());
    }

    #[test]
    fn test_unknown_peer() {
        let identity = ClientIdentity::derive(None, &HeaderMap::new(), None, false);
        assert_eq!(identity.key(), "ip:unknown");
    }

    #[test]
    fn test_same_ip_different_namespaces() {
        let anonymous = ClientIdentity::Address("10.0.0.1".to_string());
        let subject = ClientIdentity::Subject("10.0.0.1".to_string());
        assert_ne!(anonymous.key(), subject.key());
    }
}
