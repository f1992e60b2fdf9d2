//! Account use-cases: local sign-up and sign-in, external login with
//! identity reconciliation, and the legacy unverified registration.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::AuthError;
use super::identity::IdentityVerifier;
use super::password::{hash_password, verify_password};
use super::session::SessionTokens;
use crate::models::auth::{ExternalIdentity, NewUser, User};
use crate::store::{StoreError, UserStore};

/// A freshly authenticated user with their session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Attempts at a suffixed username before giving up on an external signup.
const USERNAME_ATTEMPTS: usize = 5;

/// Input for local registration. Field-level validation happens upstream.
#[derive(Debug, Clone, Copy)]
pub struct SignUp<'a> {
    pub name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Input for the legacy registration path.
#[derive(Debug, Clone, Copy)]
pub struct UnverifiedRegistration<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub subject: &'a str,
}

/// Account operations over a credential store.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    tokens: SessionTokens,
    verifier: Arc<dyn IdentityVerifier>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn UserStore>,
        tokens: SessionTokens,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            store,
            tokens,
            verifier,
        }
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    fn session(&self, user: User) -> Result<Session, AuthError> {
        let token = self.tokens.issue(&user)?;
        Ok(Session { token, user })
    }

    /// Register a local account with a password.
    pub async fn sign_up(&self, req: SignUp<'_>) -> Result<Session, AuthError> {
        match self.store.find_by_email(req.email).await {
            Ok(_) => return Err(AuthError::Conflict("Email already registered".to_string())),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let hash = hash_password(req.password)?;
        let user = self
            .store
            .create(NewUser::local(req.username, req.name, req.email, hash))
            .await?;
        info!(user_id = user.id, email = %user.email, "local account created");
        self.session(user)
    }

    /// Authenticate with email and password.
    ///
    /// Unknown email, missing password and wrong password all produce the
    /// same [`AuthError::CredentialError`].
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = match self.store.find_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(AuthError::CredentialError),
            Err(e) => return Err(e.into()),
        };
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AuthError::CredentialError);
        };
        if !verify_password(password, hash) {
            return Err(AuthError::CredentialError);
        }
        debug!(user_id = user.id, "signed in");
        self.session(user)
    }

    /// Verify a provider ID token, reconcile it to a local user and issue a
    /// session.
    pub async fn login_external(&self, id_token: &str) -> Result<Session, AuthError> {
        let identity = self.verifier.verify(id_token).await?;
        let user = self.reconcile(&identity).await?;
        self.session(user)
    }

    /// Map a verified external identity onto exactly one local user.
    ///
    /// A match on subject wins over a match on email, and only an email the
    /// provider marks verified links an existing account. When a concurrent
    /// login creates the same user first, the losing create is retried as a
    /// lookup and converges on the winner's row.
    pub async fn reconcile(&self, identity: &ExternalIdentity) -> Result<User, AuthError> {
        match self.resolve(identity).await {
            Err(AuthError::Conflict(reason)) => {
                debug!(subject = %identity.subject, %reason, "reconcile raced, retrying as lookup");
                self.resolve(identity).await
            }
            other => other,
        }
    }

    async fn resolve(&self, identity: &ExternalIdentity) -> Result<User, AuthError> {
        match self.store.find_by_external_subject(&identity.subject).await {
            Ok(user) => return self.refresh_linked(user, identity).await,
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let Some(email) = identity.email.as_deref() else {
            return Err(AuthError::Validation(
                "external identity carries no email".to_string(),
            ));
        };

        match self.store.find_by_email(email).await {
            Ok(_) if !identity.email_verified => {
                warn!(subject = %identity.subject, "unverified email matches an existing account");
                return Err(AuthError::Conflict("Email already registered".to_string()));
            }
            Ok(mut user) => {
                if let Some(previous) = user.external_id.as_deref() {
                    warn!(user_id = user.id, %previous, "replacing linked external identity");
                }
                user.external_id = Some(identity.subject.clone());
                let user = self.store.update(&user).await?;
                info!(user_id = user.id, "linked external identity by email");
                return Ok(user);
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let display_name = identity
            .display_name
            .as_deref()
            .unwrap_or(&identity.subject);
        let user = self
            .create_external(&identity.subject, display_name, email)
            .await?;
        info!(user_id = user.id, "account created from external identity");
        Ok(user)
    }

    /// Create an external account whose username starts from the subject.
    ///
    /// A username taken by someone else is replaced by the subject plus a
    /// random suffix. Collisions on email or subject are returned as-is.
    async fn create_external(
        &self,
        subject: &str,
        display_name: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        let mut username = subject.to_string();
        for _ in 0..USERNAME_ATTEMPTS {
            match self
                .store
                .create(NewUser::external(&username, display_name, email, subject))
                .await
            {
                Err(StoreError::Conflict(c)) if c.contains("username") => {
                    debug!(%username, "username taken, deriving another");
                    username = suffixed_username(subject);
                }
                other => return Ok(other?),
            }
        }
        Err(AuthError::Conflict("Username already taken".to_string()))
    }

    /// Refresh a linked user's email and display name from the claim.
    ///
    /// An email already owned by another user is left alone so the email
    /// owner is never touched by someone else's login.
    async fn refresh_linked(
        &self,
        mut user: User,
        identity: &ExternalIdentity,
    ) -> Result<User, AuthError> {
        let mut changed = false;
        if let Some(email) = &identity.email
            && *email != user.email
        {
            match self.store.find_by_email(email).await {
                Ok(owner) => {
                    warn!(
                        user_id = user.id,
                        owner_id = owner.id,
                        "claimed email belongs to another user, keeping current"
                    );
                }
                Err(StoreError::NotFound) => {
                    user.email = email.clone();
                    changed = true;
                }
                Err(e) => return Err(e.into()),
            }
        }
        if let Some(name) = &identity.display_name
            && *name != user.display_name
        {
            user.display_name = name.clone();
            changed = true;
        }
        if !changed {
            return Ok(user);
        }
        Ok(self.store.update(&user).await?)
    }

    /// Legacy registration trusting a client-supplied external subject.
    ///
    /// No token verification happens here. Returns the created user without
    /// a session.
    #[deprecated(note = "trusts an unverified subject id; use `login_external`")]
    pub async fn register_unverified(
        &self,
        req: UnverifiedRegistration<'_>,
    ) -> Result<User, AuthError> {
        match self.store.find_by_external_subject(req.subject).await {
            Ok(_) => {
                return Err(AuthError::Conflict(
                    "External identity already registered".to_string(),
                ));
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
        let user = self
            .create_external(req.subject, req.name, req.email)
            .await?;
        warn!(user_id = user.id, "account registered through unverified legacy path");
        Ok(user)
    }
}

/// `subject` cut to fit a 30-character username, plus `_` and six hex digits.
fn suffixed_username(subject: &str) -> String {
    let stem: String = subject.chars().take(23).collect();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{stem}_{}", &suffix[..6])
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::auth::TokenError;
    use crate::store::memory::MemoryUserStore;

    #[derive(Default)]
    struct StubVerifier {
        tokens: HashMap<String, ExternalIdentity>,
    }

    impl StubVerifier {
        fn with(mut self, token: &str, identity: ExternalIdentity) -> Self {
            self.tokens.insert(token.to_string(), identity);
            self
        }
    }

    #[async_trait]
    impl IdentityVerifier for StubVerifier {
        async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, AuthError> {
            self.tokens
                .get(id_token)
                .cloned()
                .ok_or_else(|| AuthError::ExternalIdentity("invalid id token".to_string()))
        }
    }

    fn identity(subject: &str, email: Option<&str>, name: Option<&str>) -> ExternalIdentity {
        ExternalIdentity {
            subject: subject.to_string(),
            email: email.map(str::to_string),
            email_verified: email.is_some(),
            display_name: name.map(str::to_string),
        }
    }

    fn service_with(store: Arc<dyn UserStore>, verifier: StubVerifier) -> AccountService {
        AccountService::new(
            store,
            SessionTokens::with_default_ttl(b"test-secret"),
            Arc::new(verifier),
        )
    }

    fn service(store: Arc<MemoryUserStore>) -> AccountService {
        service_with(store, StubVerifier::default())
    }

    fn ann() -> SignUp<'static> {
        SignUp {
            name: "Ann",
            username: "ann1",
            email: "ann@x.com",
            password: "password123",
        }
    }

    #[tokio::test]
    async fn sign_up_issues_verifiable_token() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        let session = svc.sign_up(ann()).await.unwrap();

        let claims = svc.tokens().verify(&session.token).unwrap();
        assert_eq!(claims.user_id, session.user.id);
        assert_eq!(claims.email, "ann@x.com");
        assert!(session.user.password_hash.is_some());
        assert_eq!(session.user.external_id, None);
    }

    #[tokio::test]
    async fn duplicate_sign_up_conflicts() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        svc.sign_up(ann()).await.unwrap();
        let again = SignUp {
            username: "ann2",
            ..ann()
        };
        let err = svc.sign_up(again).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict(ref m) if m == "Email already registered"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn sign_in_errors_do_not_reveal_which_part_failed() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        svc.sign_up(ann()).await.unwrap();

        let wrong_password = svc.sign_in("ann@x.com", "nope-nope").await.unwrap_err();
        let unknown_email = svc.sign_in("who@x.com", "password123").await.unwrap_err();
        assert!(matches!(wrong_password, AuthError::CredentialError));
        assert!(matches!(unknown_email, AuthError::CredentialError));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());

        let ok = svc.sign_in("ann@x.com", "password123").await.unwrap();
        assert_eq!(ok.user.email, "ann@x.com");
    }

    #[tokio::test]
    async fn external_only_account_cannot_sign_in_with_password() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        svc.reconcile(&identity("uid-1", Some("ext@x.com"), None))
            .await
            .unwrap();
        let err = svc.sign_in("ext@x.com", "").await.unwrap_err();
        assert!(matches!(err, AuthError::CredentialError));
    }

    #[tokio::test]
    async fn subject_match_wins_over_email_match() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        let a = store
            .create(NewUser::external("a", "A", "a@x.com", "uid-a"))
            .await
            .unwrap();
        let b = store
            .create(NewUser::local("b", "B", "b@x.com", "h".into()))
            .await
            .unwrap();

        let resolved = svc
            .reconcile(&identity("uid-a", Some("b@x.com"), Some("A2")))
            .await
            .unwrap();
        assert_eq!(resolved.id, a.id);
        assert_eq!(resolved.email, "a@x.com");
        assert_eq!(resolved.display_name, "A2");

        let b_after = store.find_by_id(b.id).await.unwrap();
        assert_eq!(b_after.external_id, None);
        assert_eq!(b_after.display_name, "B");
        assert_eq!(b_after.updated_at, b.updated_at);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn linked_user_is_refreshed_from_claim() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        let first = svc
            .reconcile(&identity("uid-1", Some("old@x.com"), Some("Old")))
            .await
            .unwrap();
        let second = svc
            .reconcile(&identity("uid-1", Some("new@x.com"), Some("New")))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.email, "new@x.com");
        assert_eq!(second.display_name, "New");
    }

    #[tokio::test]
    async fn unlinked_email_match_is_linked() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        let local = svc.sign_up(ann()).await.unwrap().user;

        let linked = svc
            .reconcile(&identity("uid-ann", Some("ann@x.com"), None))
            .await
            .unwrap();
        assert_eq!(linked.id, local.id);
        assert_eq!(linked.external_id.as_deref(), Some("uid-ann"));
        assert!(linked.password_hash.is_some());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn unknown_identity_creates_user() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        let user = svc
            .reconcile(&identity("uid-9", Some("nine@x.com"), None))
            .await
            .unwrap();
        assert_eq!(user.username, "uid-9");
        assert_eq!(user.display_name, "uid-9");
        assert_eq!(user.external_id.as_deref(), Some("uid-9"));
        assert_eq!(user.password_hash, None);
    }

    #[tokio::test]
    async fn subject_equal_to_taken_username_still_creates_user() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        let squatter = svc
            .sign_up(SignUp {
                username: "kX9fUidAbc123",
                ..ann()
            })
            .await
            .unwrap()
            .user;

        let user = svc
            .reconcile(&identity("kX9fUidAbc123", Some("kx@x.com"), None))
            .await
            .unwrap();
        assert_ne!(user.id, squatter.id);
        assert_eq!(user.external_id.as_deref(), Some("kX9fUidAbc123"));
        assert!(user.username.starts_with("kX9fUidAbc123_"));
        assert_eq!(user.username.len(), "kX9fUidAbc123_".len() + 6);
        assert_eq!(store.len(), 2);

        let again = svc
            .reconcile(&identity("kX9fUidAbc123", Some("kx@x.com"), None))
            .await
            .unwrap();
        assert_eq!(again.id, user.id);
    }

    #[test]
    fn suffixed_username_fits_username_limit() {
        let long = "a".repeat(40);
        let name = suffixed_username(&long);
        assert_eq!(name.chars().count(), 30);
        assert!(name.starts_with(&"a".repeat(23)));
        assert_ne!(suffixed_username("uid"), suffixed_username("uid"));
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        let claim = identity("uid-1", Some("one@x.com"), Some("One"));
        let first = svc.reconcile(&claim).await.unwrap();
        let second = svc.reconcile(&claim).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn claim_without_email_and_no_link_is_rejected() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        let err = svc
            .reconcile(&identity("uid-1", None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert!(store.is_empty());
    }

    /// Store whose first `create` loses a race: a competitor's row lands
    /// just before the write, which then fails on the unique constraint.
    struct RacingStore {
        inner: MemoryUserStore,
        raced: AtomicBool,
    }

    #[async_trait]
    impl UserStore for RacingStore {
        async fn find_by_id(&self, id: i64) -> Result<User, StoreError> {
            self.inner.find_by_id(id).await
        }
        async fn find_by_external_subject(&self, subject: &str) -> Result<User, StoreError> {
            self.inner.find_by_external_subject(subject).await
        }
        async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
            self.inner.find_by_email(email).await
        }
        async fn find_by_username(&self, username: &str) -> Result<User, StoreError> {
            self.inner.find_by_username(username).await
        }
        async fn find_many(&self, ids: &[i64]) -> Result<Vec<User>, StoreError> {
            self.inner.find_many(ids).await
        }
        async fn create(&self, user: NewUser) -> Result<User, StoreError> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                self.inner.create(user.clone()).await?;
            }
            self.inner.create(user).await
        }
        async fn update(&self, user: &User) -> Result<User, StoreError> {
            self.inner.update(user).await
        }
        async fn delete(&self, id: i64) -> Result<(), StoreError> {
            self.inner.delete(id).await
        }
        async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, StoreError> {
            self.inner.search(query, limit).await
        }
        async fn list(&self, exclude: i64, limit: i64) -> Result<Vec<User>, StoreError> {
            self.inner.list(exclude, limit).await
        }
    }

    #[tokio::test]
    async fn lost_create_race_converges_on_winner() {
        let store = Arc::new(RacingStore {
            inner: MemoryUserStore::new(),
            raced: AtomicBool::new(false),
        });
        let svc = service_with(store.clone(), StubVerifier::default());
        let user = svc
            .reconcile(&identity("uid-r", Some("r@x.com"), None))
            .await
            .unwrap();
        assert_eq!(user.external_id.as_deref(), Some("uid-r"));
        assert_eq!(store.inner.len(), 1);
    }

    #[tokio::test]
    async fn unverified_email_does_not_link_existing_account() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        let local = svc.sign_up(ann()).await.unwrap().user;

        let claim = ExternalIdentity {
            email_verified: false,
            ..identity("uid-mallory", Some("ann@x.com"), None)
        };
        let err = svc.reconcile(&claim).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict(ref m) if m == "Email already registered"));

        let after = store.find_by_id(local.id).await.unwrap();
        assert_eq!(after.external_id, None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn unverified_email_still_creates_new_account() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        let claim = ExternalIdentity {
            email_verified: false,
            ..identity("uid-new", Some("new@x.com"), None)
        };
        let user = svc.reconcile(&claim).await.unwrap();
        assert_eq!(user.external_id.as_deref(), Some("uid-new"));
        assert_eq!(user.email, "new@x.com");
    }

    #[tokio::test]
    async fn back_to_back_first_logins_share_one_user() {
        let store = Arc::new(MemoryUserStore::new());
        let verifier =
            StubVerifier::default().with("tok", identity("uid-c", Some("c@x.com"), None));
        let svc = service_with(store.clone(), verifier);

        let (a, b) = tokio::join!(svc.login_external("tok"), svc.login_external("tok"));
        assert_eq!(a.unwrap().user.id, b.unwrap().user.id);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn invalid_provider_token_is_rejected() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        let err = svc.login_external("bogus").await.unwrap_err();
        assert!(matches!(err, AuthError::ExternalIdentity(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn external_session_token_round_trips() {
        let store = Arc::new(MemoryUserStore::new());
        let verifier =
            StubVerifier::default().with("tok", identity("uid-1", Some("e@x.com"), None));
        let svc = service_with(store, verifier);
        let session = svc.login_external("tok").await.unwrap();
        let claims = svc.tokens().verify(&session.token).unwrap();
        assert_eq!(claims.user_id, session.user.id);
        assert_eq!(svc.tokens().verify("x"), Err(TokenError::Malformed));
    }

    #[tokio::test]
    #[allow(deprecated)]
    async fn legacy_registration_rejects_known_subject() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        let req = UnverifiedRegistration {
            name: "Leg",
            email: "leg@x.com",
            subject: "uid-leg",
        };
        let user = svc.register_unverified(req).await.unwrap();
        assert_eq!(user.external_id.as_deref(), Some("uid-leg"));

        let err = svc
            .register_unverified(UnverifiedRegistration {
                email: "other@x.com",
                ..req
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    #[allow(deprecated)]
    async fn legacy_registration_survives_taken_username() {
        let store = Arc::new(MemoryUserStore::new());
        let svc = service(store.clone());
        svc.sign_up(SignUp {
            username: "uid-leg",
            ..ann()
        })
        .await
        .unwrap();

        let user = svc
            .register_unverified(UnverifiedRegistration {
                name: "Leg",
                email: "leg@x.com",
                subject: "uid-leg",
            })
            .await
            .unwrap();
        assert_eq!(user.external_id.as_deref(), Some("uid-leg"));
        assert!(user.username.starts_with("uid-leg_"));
        assert_eq!(store.len(), 2);
    }
}
