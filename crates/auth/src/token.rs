//! Stateless session tokens.
//!
//! Tokens are HS256 JWTs carrying the user URN, username, session URN and
//! expiry. There is no server-side session table: logout is client-side
//! discard, and the session id in the token is the single source of truth
//! for the `/sessions/{id}` endpoints.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use ssv_domain::{Error, Result, Urn, UrnKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User URN.
    pub sub: String,
    pub username: String,
    /// Session URN.
    pub sid: String,
    /// Unix expiry timestamp.
    pub exp: i64,
}

impl Claims {
    pub fn user_urn(&self) -> Result<Urn> {
        Urn::parse_as(UrnKind::User, &self.sub)
            .map_err(|_| Error::Authentication("invalid token subject".into()))
    }

    pub fn session_urn(&self) -> Result<Urn> {
        Urn::parse_as(UrnKind::Session, &self.sid)
            .map_err(|_| Error::Authentication("invalid token session id".into()))
    }
}

pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_minutes: u32,
}

impl TokenSigner {
    pub fn new(secret: &[u8], expiry_minutes: u32) -> Self {
        TokenSigner {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            expiry_minutes,
        }
    }

    /// Mint a token for a fresh session.
    pub fn mint(&self, user_id: Urn, username: &str, session_id: Urn) -> Result<String> {
        let exp = Utc::now().timestamp() + i64::from(self.expiry_minutes) * 60;
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_owned(),
            sid: session_id.to_string(),
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Authentication(format!("signing token: {e}")))
    }

    /// Verify signature and expiry. Expired and malformed tokens are
    /// distinguished so the API can report `EXPIRED` vs `INVALID`.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Err(Error::Authentication("EXPIRED: token has expired".into()))
                }
                _ => Err(Error::Authentication("INVALID: token is not valid".into())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"test-secret", 60)
    }

    #[test]
    fn mint_and_verify_roundtrip() {
        let user = Urn::random(UrnKind::User);
        let session = Urn::random(UrnKind::Session);
        let token = signer().mint(user, "admin", session).unwrap();
        let claims = signer().verify(&token).unwrap();
        assert_eq!(claims.user_urn().unwrap(), user);
        assert_eq!(claims.session_urn().unwrap(), session);
        assert_eq!(claims.username, "admin");
    }

    #[test]
    fn expired_token_reports_expired() {
        let signer = TokenSigner::new(b"test-secret", 0);
        let token = signer
            .mint(Urn::random(UrnKind::User), "u", Urn::random(UrnKind::Session))
            .unwrap();
        // expiry_minutes=0 makes exp == now; wait past it.
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let err = signer.verify(&token).unwrap_err();
        assert!(err.to_string().contains("EXPIRED"), "{err}");
    }

    #[test]
    fn wrong_secret_reports_invalid() {
        let token = signer()
            .mint(Urn::random(UrnKind::User), "u", Urn::random(UrnKind::Session))
            .unwrap();
        let other = TokenSigner::new(b"other-secret", 60);
        let err = other.verify(&token).unwrap_err();
        assert!(err.to_string().contains("INVALID"), "{err}");
    }

    #[test]
    fn garbage_reports_invalid() {
        let err = signer().verify("not-a-token").unwrap_err();
        assert!(err.to_string().contains("INVALID"), "{err}");
    }
}
