//! Access token codec (HS256 JWT)

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::{Account, Actor, DomainError, DomainResult, Role};
use crate::shared::{Clock, CodecError};

/// Shortest signing secret accepted, in bytes (256 bits for HS256).
pub const MIN_SECRET_LEN: usize = 32;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Access token lifetime
    pub access_ttl: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, access_ttl_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::minutes(access_ttl_minutes),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .finish()
    }
}

/// Claim set carried by every access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (account email)
    pub sub: String,
    /// Role name, e.g. `"ADMIN"`
    pub roles: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AccessClaims {
    /// The explicit actor these claims authenticate.
    pub fn actor(&self) -> Result<Actor, CodecError> {
        let role: Role = self.roles.parse().map_err(|_| CodecError::Malformed)?;
        Ok(Actor::new(self.user_id.clone(), role))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    pub fn expires_in_secs(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds()
    }
}

/// Signs and verifies access tokens.
///
/// Expiry is checked against the injected clock instead of the wall clock,
/// so `exp` handling in `jsonwebtoken` itself is switched off.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig, clock: Arc<dyn Clock>) -> DomainResult<Self> {
        if config.secret.len() < MIN_SECRET_LEN {
            return Err(DomainError::Internal(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if config.access_ttl <= Duration::zero() {
            return Err(DomainError::Internal(
                "access token lifetime must be positive".into(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_ttl: config.access_ttl,
            clock,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Sign a claim set with `iat = now` and `exp = now + ttl`.
    pub fn issue(
        &self,
        subject: &str,
        user_id: &str,
        role: Role,
        ttl: Duration,
    ) -> DomainResult<IssuedToken> {
        let now = self.clock.now();
        let expires_at = now + ttl;
        let claims = AccessClaims {
            sub: subject.to_string(),
            roles: role.as_str().to_string(),
            user_id: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::Internal(format!("Failed to sign access token: {}", e)))?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at,
        })
    }

    /// Access token for `account` with the configured lifetime.
    pub fn issue_for_account(&self, account: &Account) -> DomainResult<IssuedToken> {
        self.issue(&account.email, &account.id, account.role, self.access_ttl)
    }

    /// Verify signature, then structure, then expiry.
    pub fn parse(&self, token: &str) -> Result<AccessClaims, CodecError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(CodecError::Malformed);
        }

        let data = decode::<AccessClaims>(token, &self.decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => CodecError::InvalidSignature,
                ErrorKind::ExpiredSignature => CodecError::Expired,
                _ => CodecError::Malformed,
            },
        )?;

        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(CodecError::Expired);
        }
        Ok(data.claims)
    }

    /// Fails closed: any parse error or subject mismatch is `false`.
    pub fn is_valid_for(&self, token: &str, expected_subject: &str) -> bool {
        matches!(self.parse(token), Ok(claims) if claims.sub == expected_subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ManualClock;
    use chrono::TimeZone;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn codec() -> (TokenCodec, Arc<ManualClock>) {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let codec = TokenCodec::new(&JwtConfig::new(SECRET, 60), clock.clone()).unwrap();
        (codec, clock)
    }

    fn issue(codec: &TokenCodec) -> IssuedToken {
        codec
            .issue("a@x.com", "acc-1", Role::Organizer, Duration::minutes(60))
            .unwrap()
    }

    #[test]
    fn issued_token_validates_for_its_subject() {
        let (codec, _) = codec();
        let issued = issue(&codec);

        assert_eq!(issued.token.split('.').count(), 3);
        assert!(codec.is_valid_for(&issued.token, "a@x.com"));
        assert!(!codec.is_valid_for(&issued.token, "b@x.com"));

        let claims = codec.parse(&issued.token).unwrap();
        assert_eq!(claims.roles, "ORGANIZER");
        assert_eq!(claims.user_id, "acc-1");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.actor().unwrap(), Actor::new("acc-1", Role::Organizer));
    }

    #[test]
    fn claims_use_wire_names() {
        let (codec, _) = codec();
        let issued = issue(&codec);
        let payload = issued.token.split('.').nth(1).unwrap();
        let json = base64::Engine::decode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            payload,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        for key in ["sub", "roles", "userId", "iat", "exp"] {
            assert!(value.get(key).is_some(), "missing claim {}", key);
        }
    }

    #[test]
    fn token_expires_exactly_at_exp() {
        let (codec, clock) = codec();
        let issued = issue(&codec);

        clock.advance(Duration::minutes(59));
        assert!(codec.is_valid_for(&issued.token, "a@x.com"));

        clock.advance(Duration::minutes(1));
        assert_eq!(codec.parse(&issued.token), Err(CodecError::Expired));
        assert!(!codec.is_valid_for(&issued.token, "a@x.com"));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let (codec, _) = codec();
        let issued = issue(&codec);
        let mut parts: Vec<String> = issued.token.split('.').map(String::from).collect();
        let sig = parts[2].clone();
        let flipped = if sig.starts_with('A') { "B" } else { "A" };
        parts[2] = format!("{}{}", flipped, &sig[1..]);

        assert_eq!(
            codec.parse(&parts.join(".")),
            Err(CodecError::InvalidSignature)
        );
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let (codec, clock) = codec();
        let other = TokenCodec::new(
            &JwtConfig::new("ffffffffffffffffffffffffffffffff", 60),
            clock,
        )
        .unwrap();
        let issued = issue(&other);
        assert_eq!(codec.parse(&issued.token), Err(CodecError::InvalidSignature));
    }

    #[test]
    fn structurally_broken_tokens_are_malformed() {
        let (codec, _) = codec();
        for token in ["", "abc", "a.b", "a..c", "a.b.c.d", "not.a.jwt"] {
            assert_eq!(codec.parse(token), Err(CodecError::Malformed), "{}", token);
        }
    }

    #[test]
    fn short_secret_is_refused() {
        let clock = Arc::new(ManualClock::default());
        assert!(TokenCodec::new(&JwtConfig::new("short", 60), clock).is_err());
    }
}
