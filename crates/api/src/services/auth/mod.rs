//! Authentication service.
//!
//! Password registration and login, and resolution of bearer tokens back to
//! users. Passwords are hashed exactly once, here, before they reach a store.

mod error;
mod token;

pub use error::AuthError;
pub use token::TokenSigner;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;

use fieldops_core::{Email, Role};

use crate::db::{RepositoryError, Store};
use crate::models::{AuthResponse, LoginRequest, NewUser, Profile, RegisterRequest, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    tokens: &'a TokenSigner,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, tokens: &'a TokenSigner) -> Self {
        Self { store, tokens }
    }

    /// Register a new user and issue their first token.
    ///
    /// The role defaults to team member when the body does not name one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if name, email or password is absent.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let (Some(name), Some(email), Some(password)) = (
            req.name.filter(|n| !n.trim().is_empty()),
            req.email.filter(|e| !e.trim().is_empty()),
            req.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::MissingFields);
        };

        let user = create_user(
            self.store,
            &name,
            &email,
            &password,
            req.role.unwrap_or_default(),
        )
        .await?;
        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        self.respond(&user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AuthError> {
        let (Some(email), Some(password)) = (req.email, req.password) else {
            return Err(AuthError::InvalidCredentials);
        };
        let email = Email::parse(&email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .store
            .find_user_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&password, &password_hash)?;

        self.respond(&user)
    }

    /// Resolve a bearer token to the user it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token does not verify or the
    /// user no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let id = self.tokens.verify(token, Utc::now())?;
        self.store
            .find_user(id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    fn respond(&self, user: &User) -> Result<AuthResponse, AuthError> {
        Ok(AuthResponse {
            profile: Profile::from(user),
            token: self.tokens.issue(user.id, Utc::now())?,
        })
    }
}

/// Create a user with a hashed password.
///
/// Shared by registration and the operator CLI.
///
/// # Errors
///
/// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword` or
/// `AuthError::UserAlreadyExists` as for [`AuthService::register`].
pub async fn create_user(
    store: &dyn Store,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User, AuthError> {
    let email = Email::parse(email)?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    store
        .insert_user(&NewUser {
            name: name.trim().to_owned(),
            email,
            password_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use secrecy::SecretString;

    use super::*;
    use crate::db::{MemoryStore, UserStore};

    fn signer() -> TokenSigner {
        TokenSigner::new(
            SecretString::from("k9$Lm2#Qx7!Vb4@Zr8&Wt1*Np6^Hs3%Ef"),
            Duration::days(30),
        )
    }

    fn register_request(email: &str, role: Option<Role>) -> RegisterRequest {
        RegisterRequest {
            name: Some("Asha Rao".to_owned()),
            email: Some(email.to_owned()),
            password: Some("correct horse".to_owned()),
            role,
        }
    }

    #[test]
    fn test_hash_is_salted_and_verifies() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("correct horse", &first).is_ok());
        assert!(verify_password("wrong horse", &first).is_err());
    }

    #[tokio::test]
    async fn test_register_defaults_to_team_member() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);

        let resp = auth
            .register(register_request("Asha@Example.com", None))
            .await
            .unwrap();
        assert_eq!(resp.profile.role, Role::TeamMember);
        assert_eq!(resp.profile.email.as_str(), "asha@example.com");
        assert_eq!(tokens.verify(&resp.token, Utc::now()).unwrap(), resp.profile.id);
    }

    #[tokio::test]
    async fn test_register_hashes_exactly_once() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);
        auth.register(register_request("asha@example.com", None))
            .await
            .unwrap();

        let (_, stored) = store
            .find_user_with_password(&Email::parse("asha@example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(stored.starts_with("$argon2"));
        assert!(verify_password("correct horse", &stored).is_ok());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);

        let missing = RegisterRequest {
            password: None,
            ..register_request("asha@example.com", None)
        };
        assert!(matches!(
            auth.register(missing).await,
            Err(AuthError::MissingFields)
        ));

        let short = RegisterRequest {
            password: Some("short".to_owned()),
            ..register_request("asha@example.com", None)
        };
        assert!(matches!(
            auth.register(short).await,
            Err(AuthError::WeakPassword(_))
        ));

        assert!(matches!(
            auth.register(register_request("not-an-email", None)).await,
            Err(AuthError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);
        auth.register(register_request("asha@example.com", Some(Role::Distributor)))
            .await
            .unwrap();

        let err = auth
            .register(register_request("ASHA@example.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(err.to_string(), "User already exists");
    }

    #[tokio::test]
    async fn test_login_and_authenticate() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);
        let registered = auth
            .register(register_request("asha@example.com", Some(Role::Admin)))
            .await
            .unwrap();

        let resp = auth
            .login(LoginRequest {
                email: Some("asha@example.com".to_owned()),
                password: Some("correct horse".to_owned()),
            })
            .await
            .unwrap();
        assert_eq!(resp.profile, registered.profile);

        let user = auth.authenticate(&resp.token).await.unwrap();
        assert_eq!(user.id, registered.profile.id);
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);
        auth.register(register_request("asha@example.com", None))
            .await
            .unwrap();

        for (email, password) in [
            ("asha@example.com", "wrong password"),
            ("nobody@example.com", "correct horse"),
            ("garbage", "correct horse"),
        ] {
            let err = auth
                .login(LoginRequest {
                    email: Some(email.to_owned()),
                    password: Some(password.to_owned()),
                })
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Invalid email or password");
        }
    }

    #[tokio::test]
    async fn test_token_for_unknown_user_rejected() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);
        let token = tokens
            .issue(fieldops_core::UserId::new(99), Utc::now())
            .unwrap();
        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AuthError::InvalidToken)
        ));
    }
}
