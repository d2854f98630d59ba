//! Bearer credential verification capability.
//!
//! Token issuance and signature checking live outside core; core only sees
//! the principal id a verifier returns.

use crate::error::{AuthFailure, CapsuleError, CapsuleResult};
use crate::model::capsule::PrincipalId;
use std::collections::HashMap;

/// Maps an opaque token to an authenticated principal.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> CapsuleResult<PrincipalId>;
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> CapsuleResult<&str> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    token.ok_or(CapsuleError::Auth(AuthFailure::MissingToken))
}

/// Fixed token table; used by tests and local CLI wiring.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, PrincipalId>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, principal: PrincipalId) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> CapsuleResult<PrincipalId> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(CapsuleError::Auth(AuthFailure::InvalidToken))
    }
}

#[cfg(test)]
mod tests {
    use super::{bearer_token, StaticTokenVerifier, TokenVerifier};
    use crate::error::{AuthFailure, CapsuleError};
    use crate::model::capsule::PrincipalId;

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        for header in [None, Some("abc"), Some("Bearer "), Some("Basic abc")] {
            assert!(matches!(
                bearer_token(header),
                Err(CapsuleError::Auth(AuthFailure::MissingToken))
            ));
        }
    }

    #[test]
    fn static_verifier_rejects_unknown_tokens() {
        let verifier = StaticTokenVerifier::new().with_token("t1", PrincipalId::new("alice"));
        assert_eq!(verifier.verify("t1").unwrap(), PrincipalId::new("alice"));
        assert!(matches!(
            verifier.verify("t2"),
            Err(CapsuleError::Auth(AuthFailure::InvalidToken))
        ));
    }
}
