//! Credential verification for the storefront: bcrypt password hashes and
//! HS256 bearer tokens.
//!
//! The gate is stateless by design — every check re-derives identity and
//! role from the token's embedded claims. There is no server-side session
//! store, so a token cannot be revoked before its expiry.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shopd_schemas::Role;
use thiserror::Error;
use uuid::Uuid;

/// Default token lifetime: one hour.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// bcrypt cost factor for password hashes.
pub const BCRYPT_COST: u32 = 12;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer credential was presented at all.
    #[error("Authentication required")]
    MissingCredential,

    /// The credential was present but malformed, tampered with, or expired.
    #[error("Invalid or expired token")]
    InvalidCredential,

    /// The credential is valid but the principal's role does not satisfy
    /// the route's requirement. Distinct from `InvalidCredential`: this is
    /// a 403, never a 401.
    #[error("Admin access required")]
    InsufficientRole,
}

// ---------------------------------------------------------------------------
// Claims / Principal
// ---------------------------------------------------------------------------

/// JWT claim set carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub role: Role,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Authenticated identity derived from a verified credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    /// Enforce a role requirement on an already-authenticated principal.
    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AuthError::InsufficientRole)
        }
    }
}

// ---------------------------------------------------------------------------
// TokenKeys
// ---------------------------------------------------------------------------

/// Paired encoding/decoding keys derived from the shared signing secret.
/// Built once at startup and cloned into the app state.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Sign a token for the given principal with the given lifetime.
    pub fn mint(&self, user_id: Uuid, role: Role, ttl_secs: i64) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|_| AuthError::InvalidCredential)
    }

    /// Verify a token and extract the principal. Signature, structure and
    /// expiry are all checked; expiry has zero leeway so a token is invalid
    /// the second it lapses.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| AuthError::InvalidCredential)?;

        Ok(Principal {
            user_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

/// Hash a plaintext password for storage.
pub fn hash_password(plain: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, BCRYPT_COST)
}

/// Constant-time comparison against a stored hash. A malformed stored hash
/// counts as a mismatch rather than an error surface for callers.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    bcrypt::verify(plain, stored_hash).unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new(b"test-signing-secret")
    }

    #[test]
    fn mint_then_verify_round_trips_identity_and_role() {
        let keys = keys();
        let id = Uuid::new_v4();

        let token = keys.mint(id, Role::Admin, 60).unwrap();
        let principal = keys.verify(&token).unwrap();

        assert_eq!(principal.user_id, id);
        assert_eq!(principal.role, Role::Admin);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys();
        let token = keys.mint(Uuid::new_v4(), Role::User, -60).unwrap();

        assert_eq!(keys.verify(&token), Err(AuthError::InvalidCredential));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert_eq!(
            keys().verify("not-a-jwt"),
            Err(AuthError::InvalidCredential)
        );
    }

    #[test]
    fn tampered_token_is_rejected() {
        let keys = keys();
        let token = keys.mint(Uuid::new_v4(), Role::User, 60).unwrap();

        // Flip the payload segment; the signature no longer matches.
        let mut parts: Vec<&str> = token.split('.').collect();
        let swapped = keys.mint(Uuid::new_v4(), Role::Admin, 60).unwrap();
        let swapped_parts: Vec<&str> = swapped.split('.').collect();
        parts[1] = swapped_parts[1];
        let forged = parts.join(".");

        assert_eq!(keys.verify(&forged), Err(AuthError::InvalidCredential));
    }

    #[test]
    fn token_from_wrong_secret_is_rejected() {
        let other = TokenKeys::new(b"a-different-secret");
        let token = other.mint(Uuid::new_v4(), Role::User, 60).unwrap();

        assert_eq!(keys().verify(&token), Err(AuthError::InvalidCredential));
    }

    #[test]
    fn require_admin_refuses_plain_users() {
        let user = Principal {
            user_id: Uuid::new_v4(),
            role: Role::User,
        };
        let admin = Principal {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };

        assert_eq!(user.require_admin(), Err(AuthError::InsufficientRole));
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn password_hash_verifies_and_rejects_wrong_password() {
        // Low-cost hash here would be faster, but the API pins the cost;
        // one bcrypt round trip per test run is acceptable.
        let hash = hash_password("hunter2").unwrap();

        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-bcrypt-hash"));
    }
}
