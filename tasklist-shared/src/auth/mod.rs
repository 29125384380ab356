/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Identity token issuance and verification
/// - [`middleware`]: Token extraction and the request auth context
///
/// # Example
///
/// ```
/// use tasklist_shared::auth::jwt::TokenService;
/// use tasklist_shared::auth::password::{hash_password, verify_password};
/// use tasklist_shared::models::id::RecordId;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("secret1")?;
/// assert!(verify_password("secret1", &hash)?);
///
/// let tokens = TokenService::new("secret-key");
/// let token = tokens.issue(&RecordId::generate())?;
/// assert!(tokens.verify(&token).is_ok());
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
