//! The two client vocabularies the gateway speaks.
//!
//! Both vocabularies drive the same single session and share every response
//! shape. They differ in three places only:
//!
//! | | RapidPro | Wuzapi |
//! |---|---|---|
//! | extra routes | `/webhook`, `/session/hmac/config` | none |
//! | `tk_` tokens | always accepted | compared like any other |
//! | auto-provision | `/session/qr`, `/session/status` | never |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Client vocabulary served by a gateway instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vocabulary {
    /// RapidPro WhatsApp channel clients.
    #[default]
    RapidPro,
    /// Wuzapi API clients.
    Wuzapi,
}

impl Vocabulary {
    /// Returns the vocabulary name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RapidPro => "rapidpro",
            Self::Wuzapi => "wuzapi",
        }
    }

    /// Returns whether an `Authorization` header value passes this
    /// vocabulary's check against the configured admin token.
    pub fn authorize(&self, header: &str, admin_token: &str) -> bool {
        match self {
            Self::RapidPro => rapidpro_authorized(header, admin_token),
            Self::Wuzapi => wuzapi_authorized(header, admin_token),
        }
    }

    /// Whether `/webhook` and `/session/hmac/config` are answered.
    pub fn serves_probe_routes(&self) -> bool {
        matches!(self, Self::RapidPro)
    }

    /// Whether a missing session may be created on demand.
    pub fn auto_provisions(&self) -> bool {
        matches!(self, Self::RapidPro)
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn matches_token(header: &str, admin_token: &str) -> bool {
    header == admin_token || header.strip_prefix("Bearer ") == Some(admin_token)
}

/// RapidPro check: rejects only when the header lacks the `tk_` prefix, a
/// token is configured, and the header matches neither the raw token nor
/// `Bearer <token>`.
///
/// A `tk_` prefix bypasses comparison entirely, whatever follows it.
pub fn rapidpro_authorized(header: &str, admin_token: &str) -> bool {
    let rejected =
        !header.starts_with("tk_") && !admin_token.is_empty() && !matches_token(header, admin_token);
    !rejected
}

/// Wuzapi check: rejects when a token is configured and the header matches
/// neither the raw token nor `Bearer <token>`.
pub fn wuzapi_authorized(header: &str, admin_token: &str) -> bool {
    let rejected = !admin_token.is_empty() && !matches_token(header, admin_token);
    !rejected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_bearer_accepted_by_both() {
        for vocab in [Vocabulary::RapidPro, Vocabulary::Wuzapi] {
            assert!(vocab.authorize("secret", "secret"));
            assert!(vocab.authorize("Bearer secret", "secret"));
            assert!(!vocab.authorize("Bearer other", "secret"));
            assert!(!vocab.authorize("", "secret"));
            assert!(!vocab.authorize("bearer secret", "secret"));
        }
    }

    #[test]
    fn test_tk_prefix_only_bypasses_rapidpro() {
        assert!(rapidpro_authorized("tk_anything", "secret"));
        assert!(rapidpro_authorized("tk_", "secret"));
        assert!(!wuzapi_authorized("tk_anything", "secret"));
    }

    #[test]
    fn test_empty_token_is_open() {
        assert!(rapidpro_authorized("", ""));
        assert!(rapidpro_authorized("garbage", ""));
        assert!(wuzapi_authorized("", ""));
        assert!(wuzapi_authorized("garbage", ""));
    }

    #[test]
    fn test_vocabulary_serde() {
        let v: Vocabulary = serde_json::from_str("\"wuzapi\"").unwrap();
        assert_eq!(v, Vocabulary::Wuzapi);
        assert_eq!(serde_json::to_string(&Vocabulary::RapidPro).unwrap(), "\"rapidpro\"");
        assert_eq!(Vocabulary::default(), Vocabulary::RapidPro);
    }

    #[test]
    fn test_vocabulary_policies() {
        assert!(Vocabulary::RapidPro.serves_probe_routes());
        assert!(Vocabulary::RapidPro.auto_provisions());
        assert!(!Vocabulary::Wuzapi.serves_probe_routes());
        assert!(!Vocabulary::Wuzapi.auto_provisions());
    }
}
