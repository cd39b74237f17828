//! Session manager: the login / refresh / logout state machine over the
//! store, plus staff account administration.
//!
//! A refresh token moves `active → rotated (history) → purged`, or
//! `active → logged out (deleted, no history)`, or `active → expired →
//! purged`. Presenting a hash that is only found in history is the reuse
//! signal: the owning account's sessions are all revoked before the
//! request fails.

use std::sync::Arc;
use thiserror::Error;

use super::store::{NewPrincipal, Principal, RefreshRecord, Role, SessionStore};
use super::token::{self, AccessClaims, TokenCodec, TokenError};
use super::{credentials, epoch_secs};

/// Typed failures surfaced to the HTTP boundary. Messages for the 401
/// family are deliberately generic to prevent account enumeration.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account is inactive. Contact admin.")]
    Inactive,
    #[error("{0}")]
    Forbidden(String),
    #[error("Access token required")]
    MissingToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    TokenInvalid,
    #[error("Refresh token required")]
    MissingRefreshToken,
    #[error("Invalid or expired refresh token")]
    InvalidRefresh,
    #[error("Token reuse detected. All sessions revoked.")]
    ReuseDetected,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Something went wrong. Please try again later.")]
    Internal,
}

impl AuthError {
    /// Wrap a storage failure. The detail is logged here and never reaches
    /// the response body.
    fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %err, "internal auth failure");
        AuthError::Internal
    }
}

/// Request metadata recorded on the active refresh record.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// The subset of a principal that is safe to return to clients.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PrincipalSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
}

impl From<&Principal> for PrincipalSummary {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id.clone(),
            username: p.username.clone(),
            email: p.email.clone(),
            role: p.role,
            full_name: p.full_name.clone(),
        }
    }
}

/// Successful login: access token for the response body, refresh secret
/// for the protected cookie.
#[derive(Debug)]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_secret: String,
    pub principal: PrincipalSummary,
}

/// Successful rotation.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub access_token: String,
    pub refresh_secret: String,
}

/// Fields for creating a staff account.
#[derive(Debug, Clone, Copy)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: &'a str,
    pub full_name: Option<&'a str>,
    pub phone: Option<&'a str>,
}

/// Orchestrates credential verification, token issuance, and the session
/// store.
pub struct AuthService {
    store: Arc<SessionStore>,
    codec: TokenCodec,
    refresh_ttl_secs: u64,
}

impl AuthService {
    pub fn new(store: Arc<SessionStore>, codec: TokenCodec, refresh_ttl_secs: u64) -> Self {
        Self {
            store,
            codec,
            refresh_ttl_secs,
        }
    }

    // ── Login ───────────────────────────────────────────────────────

    pub fn login(
        &self,
        email: &str,
        password: &str,
        ctx: &ClientContext,
    ) -> Result<LoginOutcome, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".into(),
            ));
        }

        let principal = match self
            .store
            .find_by_email(email)
            .map_err(AuthError::internal)?
        {
            Some(p) => p,
            None => {
                // Same work and same answer as a wrong password.
                credentials::dummy_verify(password);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !credentials::verify_password(password, &principal.salt, &principal.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if !principal.is_active {
            return Err(AuthError::Inactive);
        }

        let access_token = self.codec.issue_access_token(&principal);
        let refresh_secret = token::generate_refresh_secret();
        self.store
            .create_active(&self.new_record(&principal.id, &refresh_secret, ctx))
            .map_err(AuthError::internal)?;

        tracing::info!(user_id = %principal.id, "login successful");
        Ok(LoginOutcome {
            access_token,
            refresh_secret,
            principal: PrincipalSummary::from(&principal),
        })
    }

    // ── Refresh (rotation + reuse detection) ────────────────────────

    pub fn refresh(
        &self,
        raw_secret: &str,
        ctx: &ClientContext,
    ) -> Result<RefreshOutcome, AuthError> {
        let hash = token::hash_refresh_secret(raw_secret);

        let Some(stored) = self
            .store
            .find_active_by_hash(&hash)
            .map_err(AuthError::internal)?
        else {
            return Err(self.handle_missing_active(&hash));
        };

        let new_secret = token::generate_refresh_secret();
        let new_record = self.new_record(&stored.user_id, &new_secret, ctx);
        let rotated = self
            .store
            .rotate(&stored, &new_record)
            .map_err(AuthError::internal)?;
        if !rotated {
            // Lost the race to a concurrent refresh of the same secret:
            // the winner already moved the hash into history.
            return Err(self.handle_missing_active(&hash));
        }

        let principal = self
            .store
            .find_by_id(&stored.user_id)
            .map_err(AuthError::internal)?
            // Principals are never deleted; fail closed if the row is gone.
            .ok_or(AuthError::InvalidRefresh)?;

        Ok(RefreshOutcome {
            access_token: self.codec.issue_access_token(&principal),
            refresh_secret: new_secret,
        })
    }

    /// The hash is not active: either it was rotated out (reuse — revoke
    /// everything the owner has, then fail) or it never existed / expired
    /// naturally (generic failure; the two are indistinguishable by
    /// design).
    fn handle_missing_active(&self, hash: &str) -> AuthError {
        match self.store.find_revoked_by_hash(hash) {
            Ok(Some(revoked)) => {
                // The cascade must complete before the failure is returned.
                match self.store.delete_all_active_for_principal(&revoked.user_id) {
                    Ok(revoked_count) => {
                        tracing::warn!(
                            user_id = %revoked.user_id,
                            revoked_count,
                            "refresh token reuse detected — all sessions revoked"
                        );
                        AuthError::ReuseDetected
                    }
                    Err(e) => AuthError::internal(e),
                }
            }
            Ok(None) => AuthError::InvalidRefresh,
            Err(e) => AuthError::internal(e),
        }
    }

    // ── Logout ──────────────────────────────────────────────────────

    /// Idempotent: succeeds whether or not a matching record exists.
    pub fn logout(&self, raw_secret: &str) -> Result<(), AuthError> {
        let hash = token::hash_refresh_secret(raw_secret);
        self.store
            .delete_active_by_hash(&hash)
            .map_err(AuthError::internal)?;
        Ok(())
    }

    // ── Access tokens ───────────────────────────────────────────────

    pub fn authenticate_access(&self, bearer: &str) -> Result<AccessClaims, AuthError> {
        self.codec.verify_access_token(bearer).map_err(|e| match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid => AuthError::TokenInvalid,
        })
    }

    pub fn me(&self, claims: &AccessClaims) -> Result<PrincipalSummary, AuthError> {
        let principal = self
            .store
            .find_by_id(&claims.sub)
            .map_err(AuthError::internal)?
            .ok_or_else(|| AuthError::NotFound("User not found".into()))?;
        Ok(PrincipalSummary::from(&principal))
    }

    // ── Staff administration ────────────────────────────────────────

    /// Create a staff account on behalf of the admin. The admin role is
    /// blocked here: only one admin exists, created out of band.
    pub fn register_staff(
        &self,
        created_by: &str,
        req: &RegisterRequest<'_>,
    ) -> Result<PrincipalSummary, AuthError> {
        validate_new_account(req.username, req.email, req.password)?;
        match req.role {
            "staff" => {}
            "admin" => {
                return Err(AuthError::Validation(
                    "An admin account already exists. Only one admin is allowed.".into(),
                ))
            }
            _ => {
                return Err(AuthError::Validation(
                    "Invalid role. Only staff accounts can be created.".into(),
                ))
            }
        }

        let principal = self
            .create_principal_classified(&NewPrincipal {
                username: req.username.trim(),
                email: req.email.trim(),
                password: req.password,
                role: Role::Staff,
                full_name: req.full_name,
                phone: req.phone,
                created_by: Some(created_by),
            })?;

        tracing::info!(user_id = %principal.id, created_by, "staff account created");
        Ok(PrincipalSummary::from(&principal))
    }

    /// Create the bootstrap admin. Fails if an admin already exists.
    pub fn create_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<PrincipalSummary, AuthError> {
        validate_new_account(username, email, password)?;
        let principal = self.create_principal_classified(&NewPrincipal {
            username: username.trim(),
            email: email.trim(),
            password,
            role: Role::Admin,
            full_name,
            phone: None,
            created_by: None,
        })?;
        tracing::info!(user_id = %principal.id, "bootstrap admin created");
        Ok(PrincipalSummary::from(&principal))
    }

    fn create_principal_classified(
        &self,
        new: &NewPrincipal<'_>,
    ) -> Result<Principal, AuthError> {
        self.store.create_principal(new).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("already registered") {
                AuthError::Conflict(msg)
            } else if msg.contains("admin account already exists") {
                AuthError::Validation(msg)
            } else {
                AuthError::internal(e)
            }
        })
    }

    pub fn list_staff(&self) -> Result<Vec<super::store::StaffEntry>, AuthError> {
        self.store.list_staff().map_err(AuthError::internal)
    }

    /// Deactivate an account and immediately revoke all its sessions.
    pub fn deactivate_staff(&self, actor_id: &str, target_id: &str) -> Result<(), AuthError> {
        if actor_id == target_id {
            return Err(AuthError::Validation(
                "Cannot deactivate your own account".into(),
            ));
        }
        let target = self
            .store
            .find_by_id(target_id)
            .map_err(AuthError::internal)?
            .ok_or_else(|| AuthError::NotFound("Staff member not found".into()))?;
        if target.role == Role::Admin {
            return Err(AuthError::Validation(
                "Cannot deactivate the admin account".into(),
            ));
        }

        self.store
            .set_active(target_id, false)
            .map_err(AuthError::internal)?;
        // Kick them out immediately: no refresh token survives.
        let revoked = self
            .store
            .delete_all_active_for_principal(target_id)
            .map_err(AuthError::internal)?;
        tracing::info!(user_id = %target_id, revoked, "staff member deactivated");
        Ok(())
    }

    pub fn reactivate_staff(&self, target_id: &str) -> Result<(), AuthError> {
        let updated = self
            .store
            .set_active(target_id, true)
            .map_err(AuthError::internal)?;
        if !updated {
            return Err(AuthError::NotFound("Staff member not found".into()));
        }
        Ok(())
    }

    fn new_record(&self, user_id: &str, secret: &str, ctx: &ClientContext) -> RefreshRecord {
        let now = epoch_secs() as i64;
        RefreshRecord {
            token_hash: token::hash_refresh_secret(secret),
            user_id: user_id.to_string(),
            ip: ctx.ip.clone(),
            user_agent: ctx.user_agent.clone(),
            created_at: now,
            expires_at: now + self.refresh_ttl_secs as i64,
        }
    }
}

fn validate_new_account(username: &str, email: &str, password: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(AuthError::Validation(
            "Username, email and password are required".into(),
        ));
    }
    if username.trim().len() > 64 {
        return Err(AuthError::Validation(
            "Username too long (max 64 characters)".into(),
        ));
    }
    if !is_valid_email(email.trim()) {
        return Err(AuthError::Validation("Invalid email format".into()));
    }
    if password.len() < 8 {
        return Err(AuthError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

/// Minimal shape check: one `@` with a dot somewhere after it, no
/// whitespace. Deliverability is the mail server's problem.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REFRESH_TTL: u64 = 7 * 24 * 3600;

    fn test_service() -> (TempDir, AuthService) {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(SessionStore::open(&tmp.path().join("auth.db")).unwrap());
        let codec = TokenCodec::new("test-signing-secret", 900);
        (tmp, AuthService::new(store, codec, REFRESH_TTL))
    }

    fn seed_staff(service: &AuthService, email: &str) -> PrincipalSummary {
        service
            .store
            .create_principal(&NewPrincipal {
                username: "staffer",
                email,
                password: "correctpw1",
                role: Role::Staff,
                full_name: None,
                phone: None,
                created_by: None,
            })
            .map(|p| PrincipalSummary::from(&p))
            .unwrap()
    }

    fn ctx() -> ClientContext {
        ClientContext {
            ip: Some("10.0.0.1".into()),
            user_agent: Some("test-agent".into()),
        }
    }

    #[test]
    fn login_creates_one_record_with_window_expiry() {
        let (_tmp, service) = test_service();
        seed_staff(&service, "a@x.com");

        let before = epoch_secs() as i64;
        let outcome = service.login("a@x.com", "correctpw1", &ctx()).unwrap();
        let after = epoch_secs() as i64;

        let hash = token::hash_refresh_secret(&outcome.refresh_secret);
        let record = service.store.find_active_by_hash(&hash).unwrap().unwrap();
        assert!(record.expires_at >= before + REFRESH_TTL as i64);
        assert!(record.expires_at <= after + REFRESH_TTL as i64);
        assert_eq!(record.ip.as_deref(), Some("10.0.0.1"));

        let claims = service.authenticate_access(&outcome.access_token).unwrap();
        assert_eq!(claims.email, "a@x.com");
    }

    #[test]
    fn unknown_email_and_wrong_password_are_indistinguishable() {
        let (_tmp, service) = test_service();
        seed_staff(&service, "a@x.com");

        let unknown = service.login("ghost@x.com", "whatever1", &ctx());
        let wrong = service.login("a@x.com", "wrongpassword", &ctx());
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn inactive_account_is_forbidden() {
        let (_tmp, service) = test_service();
        let p = seed_staff(&service, "a@x.com");
        service.store.set_active(&p.id, false).unwrap();

        let result = service.login("a@x.com", "correctpw1", &ctx());
        assert!(matches!(result, Err(AuthError::Inactive)));
    }

    #[test]
    fn missing_fields_are_a_validation_error() {
        let (_tmp, service) = test_service();
        assert!(matches!(
            service.login("", "pw", &ctx()),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            service.login("a@x.com", "", &ctx()),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn rotation_is_single_use() {
        let (_tmp, service) = test_service();
        seed_staff(&service, "a@x.com");
        let login = service.login("a@x.com", "correctpw1", &ctx()).unwrap();

        let rotated = service.refresh(&login.refresh_secret, &ctx()).unwrap();
        assert_ne!(rotated.refresh_secret, login.refresh_secret);

        // Replaying the consumed secret is the reuse signal.
        let replay = service.refresh(&login.refresh_secret, &ctx());
        assert!(matches!(replay, Err(AuthError::ReuseDetected)));
    }

    #[test]
    fn reuse_cascade_revokes_every_session() {
        let (_tmp, service) = test_service();
        seed_staff(&service, "a@x.com");

        // Two devices.
        let device_a = service.login("a@x.com", "correctpw1", &ctx()).unwrap();
        let device_b = service.login("a@x.com", "correctpw1", &ctx()).unwrap();

        let rotated = service.refresh(&device_a.refresh_secret, &ctx()).unwrap();
        let replay = service.refresh(&device_a.refresh_secret, &ctx());
        assert!(matches!(replay, Err(AuthError::ReuseDetected)));

        // The cascade also killed the rotation's own successor and the
        // other device's still-unexpired session.
        assert!(matches!(
            service.refresh(&rotated.refresh_secret, &ctx()),
            Err(AuthError::InvalidRefresh)
        ));
        assert!(matches!(
            service.refresh(&device_b.refresh_secret, &ctx()),
            Err(AuthError::InvalidRefresh)
        ));
    }

    #[test]
    fn racing_refresh_loser_takes_reuse_path() {
        let (_tmp, service) = test_service();
        let p = seed_staff(&service, "a@x.com");
        let login = service.login("a@x.com", "correctpw1", &ctx()).unwrap();

        // A second request loaded the active record before the first
        // finished rotating.
        let hash = token::hash_refresh_secret(&login.refresh_secret);
        let stale = service.store.find_active_by_hash(&hash).unwrap().unwrap();
        let winner = service.refresh(&login.refresh_secret, &ctx()).unwrap();

        // The stale rotation must not commit a second successor.
        let now = epoch_secs() as i64;
        let late = RefreshRecord {
            token_hash: "late".into(),
            user_id: p.id.clone(),
            ip: None,
            user_agent: None,
            created_at: now,
            expires_at: now + 600,
        };
        assert!(!service.store.rotate(&stale, &late).unwrap());
        assert!(service.store.find_active_by_hash("late").unwrap().is_none());

        // Through the public path the consumed secret is the reuse signal,
        // and the cascade takes the winner's successor with it.
        assert!(matches!(
            service.refresh(&login.refresh_secret, &ctx()),
            Err(AuthError::ReuseDetected)
        ));
        assert!(matches!(
            service.refresh(&winner.refresh_secret, &ctx()),
            Err(AuthError::InvalidRefresh)
        ));
    }

    #[test]
    fn never_existed_secret_is_generic() {
        let (_tmp, service) = test_service();
        let result = service.refresh(&token::generate_refresh_secret(), &ctx());
        assert!(matches!(result, Err(AuthError::InvalidRefresh)));
    }

    #[test]
    fn expired_record_fails_closed() {
        let (_tmp, service) = test_service();
        let p = seed_staff(&service, "a@x.com");

        let secret = token::generate_refresh_secret();
        let hash = token::hash_refresh_secret(&secret);
        let now = epoch_secs() as i64;
        service
            .store
            .create_active(&RefreshRecord {
                token_hash: hash.clone(),
                user_id: p.id.clone(),
                ip: None,
                user_agent: None,
                created_at: now - 2 * REFRESH_TTL as i64,
                expires_at: now - REFRESH_TTL as i64,
            })
            .unwrap();

        // Physically present but expired: same generic failure as unknown.
        let result = service.refresh(&secret, &ctx());
        assert!(matches!(result, Err(AuthError::InvalidRefresh)));
        assert!(service.store.active_row_exists(&hash));
    }

    #[test]
    fn logout_is_idempotent() {
        let (_tmp, service) = test_service();
        seed_staff(&service, "a@x.com");
        let login = service.login("a@x.com", "correctpw1", &ctx()).unwrap();

        service.logout(&login.refresh_secret).unwrap();
        service.logout(&login.refresh_secret).unwrap();

        // Logout leaves no history entry, so replay is generic, not reuse.
        let result = service.refresh(&login.refresh_secret, &ctx());
        assert!(matches!(result, Err(AuthError::InvalidRefresh)));
    }

    #[test]
    fn two_devices_are_independent() {
        let (_tmp, service) = test_service();
        seed_staff(&service, "a@x.com");

        let device_a = service.login("a@x.com", "correctpw1", &ctx()).unwrap();
        let device_b = service.login("a@x.com", "correctpw1", &ctx()).unwrap();

        service.logout(&device_a.refresh_secret).unwrap();
        // Device B still rotates fine.
        assert!(service.refresh(&device_b.refresh_secret, &ctx()).is_ok());
    }

    #[test]
    fn me_reports_missing_principal() {
        let (_tmp, service) = test_service();
        let p = seed_staff(&service, "a@x.com");
        let login = service.login("a@x.com", "correctpw1", &ctx()).unwrap();
        let claims = service.authenticate_access(&login.access_token).unwrap();

        let summary = service.me(&claims).unwrap();
        assert_eq!(summary.id, p.id);

        let ghost = AccessClaims {
            sub: "no-such-id".into(),
            ..claims
        };
        assert!(matches!(
            service.me(&ghost),
            Err(AuthError::NotFound(_))
        ));
    }

    #[test]
    fn register_staff_validates_and_blocks_admin_role() {
        let (_tmp, service) = test_service();
        let admin = service
            .create_admin("boss", "boss@x.com", "password123", None)
            .unwrap();

        let base = RegisterRequest {
            username: "newstaff",
            email: "s@x.com",
            password: "password123",
            role: "staff",
            full_name: None,
            phone: None,
        };

        let created = service.register_staff(&admin.id, &base).unwrap();
        assert_eq!(created.role, Role::Staff);

        let dup = service.register_staff(&admin.id, &base);
        assert!(matches!(dup, Err(AuthError::Conflict(_))));

        let as_admin = RegisterRequest {
            email: "s2@x.com",
            role: "admin",
            ..base
        };
        assert!(matches!(
            service.register_staff(&admin.id, &as_admin),
            Err(AuthError::Validation(_))
        ));

        let bad_email = RegisterRequest {
            email: "not-an-email",
            ..base
        };
        assert!(matches!(
            service.register_staff(&admin.id, &bad_email),
            Err(AuthError::Validation(_))
        ));

        let short_pw = RegisterRequest {
            email: "s3@x.com",
            password: "short",
            ..base
        };
        assert!(matches!(
            service.register_staff(&admin.id, &short_pw),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn second_admin_is_rejected() {
        let (_tmp, service) = test_service();
        service
            .create_admin("boss", "boss@x.com", "password123", None)
            .unwrap();
        let second = service.create_admin("boss2", "boss2@x.com", "password123", None);
        assert!(matches!(second, Err(AuthError::Validation(_))));
    }

    #[test]
    fn deactivate_kicks_out_sessions() {
        let (_tmp, service) = test_service();
        let admin = service
            .create_admin("boss", "boss@x.com", "password123", None)
            .unwrap();
        let staff = seed_staff(&service, "s@x.com");
        let login = service.login("s@x.com", "correctpw1", &ctx()).unwrap();

        service.deactivate_staff(&admin.id, &staff.id).unwrap();

        assert!(matches!(
            service.refresh(&login.refresh_secret, &ctx()),
            Err(AuthError::InvalidRefresh)
        ));
        assert!(matches!(
            service.login("s@x.com", "correctpw1", &ctx()),
            Err(AuthError::Inactive)
        ));

        service.reactivate_staff(&staff.id).unwrap();
        assert!(service.login("s@x.com", "correctpw1", &ctx()).is_ok());
    }

    #[test]
    fn deactivate_guards_self_and_admin() {
        let (_tmp, service) = test_service();
        let admin = service
            .create_admin("boss", "boss@x.com", "password123", None)
            .unwrap();

        assert!(matches!(
            service.deactivate_staff(&admin.id, &admin.id),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            service.deactivate_staff("someone-else", &admin.id),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            service.deactivate_staff(&admin.id, "no-such-id"),
            Err(AuthError::NotFound(_))
        ));
    }

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("missing-at.com"));
        assert!(!is_valid_email("no-dot@domain"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@x."));
    }
}
