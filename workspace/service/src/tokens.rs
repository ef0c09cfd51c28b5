use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// What a signed token may be used for. Encoded as the `aud` claim, so a
/// token minted for one purpose never verifies for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    Session,
    PasswordReset,
}

impl TokenPurpose {
    fn audience(self) -> &'static str {
        match self {
            TokenPurpose::Session => "session",
            TokenPurpose::PasswordReset => "password-reset",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: i32,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Signs and verifies user-bound, expiring tokens with the process-wide
/// secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSigner { .. }")
    }
}

impl TokenSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn sign(&self, purpose: TokenPurpose, user_id: i32, ttl: Duration) -> Result<String> {
        self.sign_at(purpose, user_id, Utc::now(), ttl)
    }

    pub fn sign_at(
        &self,
        purpose: TokenPurpose,
        user_id: i32,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String> {
        let iat = issued_at.timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id,
            aud: purpose.audience().to_string(),
            iat,
            exp: iat.saturating_add(ttl_secs),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// The user id carried by `token`, or `None` when the token is
    /// malformed, tampered with, expired or minted for another purpose.
    pub fn verify(&self, purpose: TokenPurpose, token: &str) -> Option<i32> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(&[purpose.audience()]);

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Some(data.claims.user_id),
            Err(e) => {
                debug!("Rejected {:?} token: {}", purpose, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    const TTL: Duration = Duration::from_secs(1800);

    fn signer() -> TokenSigner {
        TokenSigner::new(b"test-secret")
    }

    #[test]
    fn test_round_trip_before_expiry() {
        let signer = signer();
        let token = signer.sign(TokenPurpose::PasswordReset, 42, TTL).unwrap();
        assert_eq!(signer.verify(TokenPurpose::PasswordReset, &token), Some(42));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let signer = signer();
        let issued = Utc::now() - ChronoDuration::seconds(1801);
        let token = signer
            .sign_at(TokenPurpose::PasswordReset, 42, issued, TTL)
            .unwrap();
        assert_eq!(signer.verify(TokenPurpose::PasswordReset, &token), None);
    }

    #[test]
    fn test_tampered_and_malformed_tokens_are_rejected() {
        let signer = signer();
        let token = signer.sign(TokenPurpose::PasswordReset, 42, TTL).unwrap();

        let (unsigned, signature) = token.rsplit_once('.').unwrap();
        let mut forged: Vec<char> = signature.chars().collect();
        forged[5] = if forged[5] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{}.{}", unsigned, forged.into_iter().collect::<String>());

        // someone else's payload under the original signature
        let other = signer.sign(TokenPurpose::PasswordReset, 43, TTL).unwrap();
        let other_payload = other.split('.').nth(1).unwrap();
        let header = token.split('.').next().unwrap();
        let swapped = format!("{}.{}.{}", header, other_payload, signature);

        assert_eq!(signer.verify(TokenPurpose::PasswordReset, &tampered), None);
        assert_eq!(signer.verify(TokenPurpose::PasswordReset, &swapped), None);
        assert_eq!(signer.verify(TokenPurpose::PasswordReset, "not-a-token"), None);
        assert_eq!(signer.verify(TokenPurpose::PasswordReset, ""), None);
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = signer().sign(TokenPurpose::Session, 7, TTL).unwrap();
        let other = TokenSigner::new(b"another-secret");
        assert_eq!(other.verify(TokenPurpose::Session, &token), None);
    }

    #[test]
    fn test_purposes_do_not_mix() {
        let signer = signer();
        let session = signer.sign(TokenPurpose::Session, 7, TTL).unwrap();
        assert_eq!(signer.verify(TokenPurpose::PasswordReset, &session), None);
        assert_eq!(signer.verify(TokenPurpose::Session, &session), Some(7));
    }
}
