/// JWT token generation and validation module
///
/// Tokens are signed with HS256 and assert a single user identity for a
/// bounded time window (24 hours by default). Verification needs only the
/// signing secret, never a store round-trip.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: 24 hours from issuance
/// - **Validation**: Signature, expiration, not-before, and issuer checks
/// - **Secret Management**: The secret comes from configuration. When none is
///   configured the service falls back to [`DEFAULT_JWT_SECRET`], which is
///   public and must never be relied on outside development.
///
/// # Example
///
/// ```
/// use tasklist_shared::auth::jwt::TokenService;
/// use tasklist_shared::models::id::RecordId;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new("test-secret-key-at-least-32-bytes-long");
/// let user_id = RecordId::generate();
///
/// let token = tokens.issue(&user_id)?;
/// assert_eq!(tokens.verify(&token)?, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::id::RecordId;

/// Issuer embedded in and required of every token
pub const ISSUER: &str = "tasklist";

/// Fallback signing key used when no secret is configured
pub const DEFAULT_JWT_SECRET: &str = "your-default-secret";

/// Default token lifetime
pub fn default_token_ttl() -> Duration {
    Duration::hours(24)
}

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature, structure, issuer, or subject is invalid
    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// JWT claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "tasklist")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: RecordId,

    /// Issuer - Always "tasklist"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims expiring after the default lifetime
    pub fn new(user_id: RecordId) -> Self {
        Self::with_expiration(user_id, default_token_ttl())
    }

    /// Creates claims with a custom lifetime
    ///
    /// A negative duration produces claims that are already expired, which
    /// is mostly useful in tests.
    pub fn with_expiration(user_id: RecordId, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        // nbf must not exceed exp, or an already-expired token would be
        // reported as "not yet valid" instead of expired.
        let not_before = now.timestamp().min(expiration.timestamp());

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: not_before,
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Gets time until expiration
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }
}

/// Creates a JWT token from claims
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode_with(claims, &key)
}

/// Validates a JWT token and extracts claims
///
/// # Errors
///
/// - `JwtError::Expired` if the expiration time has passed
/// - `JwtError::Malformed` for any other failure (bad signature, wrong
///   issuer, bad structure, invalid subject)
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    decode_with(token, &key)
}

fn encode_with(claims: &Claims, key: &EncodingKey) -> Result<String, JwtError> {
    encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

fn decode_with(token: &str, key: &DecodingKey) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Malformed(e.to_string()),
    })?;

    Ok(token_data.claims)
}

/// Issues and verifies identity tokens with a fixed key and lifetime
///
/// Keys are derived once at construction; cloning is cheap.
#[derive(Clone)]
pub struct TokenService {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service with the default 24-hour lifetime
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, default_token_ttl())
    }

    /// Creates a token service with a custom lifetime
    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            ttl,
        }
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a signed token for a user
    pub fn issue(&self, user_id: &RecordId) -> Result<String, JwtError> {
        self.issue_claims(&Claims::with_expiration(user_id.clone(), self.ttl))
    }

    /// Signs arbitrary claims with this service's key
    pub fn issue_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        encode_with(claims, &self.encoding)
    }

    /// Verifies a token and returns the embedded user id
    pub fn verify(&self, token: &str) -> Result<RecordId, JwtError> {
        decode_with(token, &self.decoding).map(|claims| claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let user_id = RecordId::generate();
        let claims = Claims::new(user_id.clone());

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, ISSUER);
        assert!(!claims.is_expired());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_claims_with_custom_expiration() {
        let claims = Claims::with_expiration(RecordId::generate(), Duration::hours(1));

        let time_left = claims.time_until_expiration().unwrap();
        assert!(time_left.num_seconds() > 3500);
        assert!(time_left.num_seconds() <= 3600);
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let tokens = TokenService::new(SECRET);
        let user_id = RecordId::generate();

        let token = tokens.issue(&user_id).expect("Should issue token");
        let verified = tokens.verify(&token).expect("Should verify token");

        assert_eq!(verified, user_id);
    }

    #[test]
    fn test_free_functions_roundtrip() {
        let user_id = RecordId::generate();
        let token = create_token(&Claims::new(user_id.clone()), SECRET).unwrap();

        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, ISSUER);
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let token = TokenService::new("secret1").issue(&RecordId::generate()).unwrap();

        let result = TokenService::new("wrong-secret").verify(&token);
        assert!(matches!(result, Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_verify_expired_token() {
        let tokens = TokenService::new(SECRET);
        let claims = Claims::with_expiration(RecordId::generate(), Duration::seconds(-3600));

        assert!(claims.is_expired());
        assert!(claims.time_until_expiration().is_none());

        let token = tokens.issue_claims(&claims).unwrap();
        assert!(matches!(tokens.verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_verify_garbage() {
        let tokens = TokenService::new(SECRET);

        assert!(matches!(tokens.verify("not-a-token"), Err(JwtError::Malformed(_))));
        assert!(matches!(tokens.verify(""), Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_verify_tampered_token() {
        let tokens = TokenService::new(SECRET);
        let token = tokens.issue(&RecordId::generate()).unwrap();

        // Replace the first character of the signature segment
        let (head, signature) = token.rsplit_once('.').unwrap();
        let first = signature.chars().next().unwrap();
        let replacement = if first == 'A' { 'B' } else { 'A' };
        let tampered = format!("{}.{}{}", head, replacement, &signature[1..]);

        assert!(matches!(tokens.verify(&tampered), Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_verify_wrong_issuer() {
        let mut claims = Claims::new(RecordId::generate());
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_custom_ttl() {
        let tokens = TokenService::with_ttl(SECRET, Duration::minutes(5));
        assert_eq!(tokens.ttl(), Duration::minutes(5));

        let token = tokens.issue(&RecordId::generate()).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.exp - claims.iat, 300);
    }
}
