//! Compact HMAC-SHA256 bearer tokens.
//!
//! `base64url(header).base64url(claims).base64url(signature)` where the
//! signature covers the first two segments exactly as transmitted.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Identity a token is issued for; the service adds `iat` and `exp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Every verification failure: malformed, tampered, wrong key or expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid or expired token")]
pub struct InvalidToken;

pub struct TokenService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, identity: &Identity) -> String {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> String {
        let claims = Claims {
            sub: identity.user_id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        };

        // Serialising two plain structs cannot fail.
        let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap_or_default());
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap_or_default());
        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));

        format!("{signing_input}.{signature}")
    }

    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, InvalidToken> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(InvalidToken);
        };

        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| InvalidToken)?;
        let mut mac = self.mac();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| InvalidToken)?;

        let header: Header = decode_segment(header)?;
        if header.alg != ALGORITHM {
            return Err(InvalidToken);
        }

        let claims: Claims = decode_segment(payload)?;
        if now.timestamp() >= claims.exp {
            return Err(InvalidToken);
        }
        Ok(claims)
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }

    fn mac(&self) -> HmacSha256 {
        <HmacSha256 as Mac>::new_from_slice(&self.secret).expect("hmac accepts any key length")
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, InvalidToken> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|_| InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::hours(24))
    }

    fn identity() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "demo@test.io".to_string(),
            name: "Demo".to_string(),
        }
    }

    #[test]
    fn round_trips_claims() {
        let tokens = service();
        let who = identity();
        let now = Utc::now();

        let claims = tokens.verify_at(&tokens.issue_at(&who, now), now).unwrap();
        assert_eq!(claims.sub, who.user_id);
        assert_eq!(claims.email, who.email);
        assert_eq!(claims.name, who.name);
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn token_has_three_segments() {
        let token = service().issue(&identity());
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn rejects_other_secret() {
        let token = service().issue(&identity());
        let other = TokenService::new("another-secret-that-is-long-enough-too", Duration::hours(24));
        assert_eq!(other.verify(&token), Err(InvalidToken));
    }

    #[test]
    fn expiry_is_a_hard_cliff() {
        let tokens = service();
        let now = Utc::now();
        let token = tokens.issue_at(&identity(), now);

        assert!(tokens.verify_at(&token, now + Duration::hours(24) - Duration::seconds(1)).is_ok());
        assert_eq!(tokens.verify_at(&token, now + Duration::hours(24)), Err(InvalidToken));
        assert_eq!(tokens.verify_at(&token, now + Duration::days(3)), Err(InvalidToken));
    }

    #[test]
    fn any_payload_change_is_detected() {
        let tokens = service();
        let token = tokens.issue(&identity());
        let parts: Vec<&str> = token.split('.').collect();
        let payload = parts[1].as_bytes();

        for i in 0..payload.len() {
            let mut tampered = payload.to_vec();
            tampered[i] = if tampered[i] == b'A' { b'B' } else { b'A' };
            let tampered = format!("{}.{}.{}", parts[0], String::from_utf8(tampered).unwrap(), parts[2]);
            assert_eq!(tokens.verify(&tampered), Err(InvalidToken), "byte {i}");
        }
    }

    #[test]
    fn forged_payload_with_reused_signature_fails() {
        let tokens = service();
        let token = tokens.issue(&identity());
        let parts: Vec<&str> = token.split('.').collect();

        let mut forged = tokens.verify(&token).unwrap();
        forged.sub = Uuid::new_v4();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(tokens.verify(&forged), Err(InvalidToken));
    }

    #[test]
    fn malformed_tokens_are_uniformly_invalid() {
        let tokens = service();
        let valid = tokens.issue(&identity());
        let two_segments = valid.rsplit_once('.').unwrap().0.to_string();
        let four_segments = format!("{valid}.extra");

        for token in ["", "abc", "a.b", "a.b.c", "...", two_segments.as_str(), four_segments.as_str()] {
            assert_eq!(tokens.verify(token), Err(InvalidToken), "accepted {token:?}");
        }
    }

    #[test]
    fn signed_garbage_payload_is_invalid() {
        let tokens = service();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(b"not json");
        let input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(tokens.sign(input.as_bytes()));

        assert_eq!(tokens.verify(&format!("{input}.{signature}")), Err(InvalidToken));
    }
}
