//! Account registration, login, token verification and password change.

use std::sync::Arc;

use serde::Serialize;

use festflow_auth::{
    Identity, JwtValidator, Passwords, SessionClaims, normalize_email, validate_new_password,
};
use festflow_core::{Clock, DomainError};

use super::error::{ServiceError, ServiceResult, found};
use crate::store::IdentityStore;

/// A freshly issued session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub claims: SessionClaims,
    #[serde(skip_serializing)]
    pub token: String,
}

#[derive(Clone)]
pub struct Authenticator {
    identities: Arc<dyn IdentityStore>,
    passwords: Passwords,
    tokens: Arc<dyn JwtValidator>,
    clock: Arc<dyn Clock>,
}

fn required_password(field: &str, value: Option<String>) -> ServiceResult<String> {
    value
        .filter(|p| !p.is_empty())
        .ok_or_else(|| DomainError::validation(format!("{field} is required")).into())
}

impl Authenticator {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        passwords: Passwords,
        tokens: Arc<dyn JwtValidator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identities,
            passwords,
            tokens,
            clock,
        }
    }

    pub fn passwords(&self) -> &Passwords {
        &self.passwords
    }

    /// Self-service attendee sign-up.
    pub async fn register(
        &self,
        name: Option<String>,
        email: Option<String>,
        password: Option<String>,
    ) -> ServiceResult<Identity> {
        let password = required_password("password", password)?;
        validate_new_password(&password)?;

        // Profile fields first; a rejected sign-up never pays for the hash.
        let identity = Identity::new_user(name, email, String::new(), self.clock.now())?;
        let identity = identity.with_password_hash(self.passwords.hash(&password)?);
        let identity = self.identities.insert(identity).await?;

        tracing::info!(user_id = %identity.id, "account registered");
        Ok(identity)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: Option<String>, password: Option<String>) -> ServiceResult<Session> {
        let email = normalize_email(email.as_deref().unwrap_or_default());
        let password = password.unwrap_or_default();

        let identity = if email.is_empty() {
            None
        } else {
            self.identities.find_by_email(&email).await?
        };

        match identity {
            Some(identity) if self.passwords.verify(&password, &identity.password_hash) => {
                tracing::info!(user_id = %identity.id, role = %identity.role, "login succeeded");
                self.issue(identity.claims())
            }
            Some(identity) => {
                tracing::info!(user_id = %identity.id, "login rejected");
                Err(ServiceError::InvalidCredentials)
            }
            None => {
                self.passwords.verify_dummy(&password);
                tracing::info!("login rejected");
                Err(ServiceError::InvalidCredentials)
            }
        }
    }

    /// Signature, expiry and time-window failures are indistinguishable.
    pub fn verify(&self, token: &str) -> ServiceResult<SessionClaims> {
        self.tokens.validate(token, self.clock.now()).map_err(|err| {
            tracing::debug!(error = %err, "token rejected");
            ServiceError::InvalidOrExpiredToken
        })
    }

    pub fn issue(&self, claims: SessionClaims) -> ServiceResult<Session> {
        let token = self
            .tokens
            .issue(&claims, self.clock.now())
            .map_err(|e| ServiceError::server(e.to_string()))?;
        Ok(Session { claims, token })
    }

    /// On success the forced-change flag is cleared and a new session issued
    /// from the updated identity.
    pub async fn change_password(
        &self,
        claims: &SessionClaims,
        current: Option<String>,
        new: Option<String>,
        confirm: Option<String>,
    ) -> ServiceResult<Session> {
        let new = required_password("newPassword", new)?;
        if confirm.as_deref() != Some(new.as_str()) {
            return Err(ServiceError::PasswordMismatch);
        }
        validate_new_password(&new)?;

        let mut identity = found(self.identities.get(claims.user_id).await?, "account")?;
        let current = current.unwrap_or_default();
        if !self.passwords.verify(&current, &identity.password_hash) {
            return Err(ServiceError::WrongCurrentPassword);
        }

        identity.set_password(self.passwords.hash(&new)?, self.clock.now());
        self.identities.update_credentials(&identity).await?;

        tracing::info!(user_id = %identity.id, "password changed");
        self.issue(identity.claims())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryIdentityStore;
    use festflow_auth::{Hs256JwtValidator, KnownRole};
    use festflow_core::SystemClock;

    fn authenticator() -> (Authenticator, Arc<InMemoryIdentityStore>) {
        let store = Arc::new(InMemoryIdentityStore::default());
        let auth = Authenticator::new(
            store.clone(),
            Passwords::low_cost(),
            Arc::new(Hs256JwtValidator::new(b"test-secret".to_vec())),
            Arc::new(SystemClock),
        );
        (auth, store)
    }

    async fn register(auth: &Authenticator, email: &str) -> Identity {
        auth.register(Some("Meera".into()), Some(email.into()), Some("correct horse".into()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn register_normalizes_email_and_rejects_duplicates() {
        let (auth, _) = authenticator();
        let identity = register(&auth, "  Meera@Campus.EDU ").await;
        assert_eq!(identity.email, "meera@campus.edu");
        assert_eq!(identity.role, KnownRole::User);
        assert!(!identity.must_change_password);
        assert_ne!(identity.password_hash, "correct horse");

        let err = auth
            .register(Some("Other".into()), Some("MEERA@campus.edu".into()), Some("password123".into()))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::DuplicateEmail);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (auth, _) = authenticator();
        for (name, email, password) in [
            (None, Some("a@b.c"), Some("password123")),
            (Some("A"), Some("not-an-email"), Some("password123")),
            (Some("A"), Some("a@b.c"), Some("short")),
            (Some("A"), Some("a@b.c"), None),
        ] {
            let err = auth
                .register(name.map(Into::into), email.map(Into::into), password.map(Into::into))
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
        }
    }

    #[tokio::test]
    async fn register_rejects_profile_before_storing_anything() {
        let (auth, store) = authenticator();
        let err = auth
            .register(Some("A".into()), Some("not-an-email".into()), Some("password123".into()))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Validation("invalid email format".into()));
        assert!(store.find_by_email("not-an-email").await.unwrap().is_none());

        let created = register(&auth, "meera@campus.edu").await;
        assert!(created.password_hash.starts_with("$argon2id$"));
        assert!(auth.passwords().verify("correct horse", &created.password_hash));
    }

    #[tokio::test]
    async fn login_failures_are_uniform() {
        let (auth, _) = authenticator();
        register(&auth, "meera@campus.edu").await;

        let unknown = auth
            .login(Some("nobody@campus.edu".into()), Some("correct horse".into()))
            .await
            .unwrap_err();
        let wrong = auth
            .login(Some("meera@campus.edu".into()), Some("wrong horse".into()))
            .await
            .unwrap_err();
        assert_eq!(unknown, ServiceError::InvalidCredentials);
        assert_eq!(unknown, wrong);
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let (auth, _) = authenticator();
        let identity = register(&auth, "meera@campus.edu").await;

        let session = auth
            .login(Some("MEERA@campus.edu".into()), Some("correct horse".into()))
            .await
            .unwrap();
        assert_eq!(session.claims.user_id, identity.id);
        assert_eq!(auth.verify(&session.token).unwrap(), session.claims);
        assert_eq!(auth.verify("garbage").unwrap_err(), ServiceError::InvalidOrExpiredToken);
    }

    #[tokio::test]
    async fn change_password_checks_in_order_and_clears_flag() {
        let (auth, store) = authenticator();
        let hash = auth.passwords().hash("Temp!pass1").unwrap();
        let admin = Identity::new_super_admin("Admin", "admin@campus.edu", hash, chrono::Utc::now()).unwrap();
        store.insert(admin.clone()).await.unwrap();
        let claims = admin.claims();
        assert!(claims.must_change_password);

        let mismatch = auth
            .change_password(&claims, Some("wrong".into()), Some("newpassword1".into()), Some("other".into()))
            .await
            .unwrap_err();
        assert_eq!(mismatch, ServiceError::PasswordMismatch);

        let wrong = auth
            .change_password(&claims, Some("wrong".into()), Some("newpassword1".into()), Some("newpassword1".into()))
            .await
            .unwrap_err();
        assert_eq!(wrong, ServiceError::WrongCurrentPassword);

        let session = auth
            .change_password(
                &claims,
                Some("Temp!pass1".into()),
                Some("newpassword1".into()),
                Some("newpassword1".into()),
            )
            .await
            .unwrap();
        assert!(!session.claims.must_change_password);
        assert!(!store.get(admin.id).await.unwrap().unwrap().must_change_password);

        auth.login(Some("admin@campus.edu".into()), Some("newpassword1".into()))
            .await
            .unwrap();
    }
}
