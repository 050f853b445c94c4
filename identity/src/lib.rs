//! Identity authority client for the NGSI asset lifecycle.
//!
//! The identity authority (a Keyrock-style IdM) owns the applications that
//! protect published APIs, the roles registered in each application and the
//! role assignments of users. The lifecycle needs four things from it:
//!
//! 1. **Ownership**: the provider registering an asset must hold the
//!    well-known `provider` role on the protecting application
//! 2. **Role resolution**: the role named in the asset must exist in the
//!    application (names compare case-insensitively)
//! 3. **Grant** the role to a customer when an order is placed
//! 4. **Revoke** it when the order is cancelled or suspended
//!
//! # Sessions
//!
//! A client logs in once, when it is built, and keeps the session token for
//! its own lifetime. There is no renewal: a session that expires halfway
//! through a checkpoint surfaces as a plain transport error on the next call.
//! Build a fresh client per checkpoint.
//!
//! Role ids are never cached: every grant or revoke resolves the id by name
//! right before the call.

pub mod error;
pub mod types;

use std::sync::Arc;
use tracing::{debug, info, warn};
use transport::{HttpRequest, HttpTransport};

pub use error::{IdentityError, Result};
pub use types::{IdentityConfig, Role, RoleAssignment, Session, PROVIDER_ROLE_ID};
use types::{RoleAssignments, Roles, AUTH_TOKEN_HEADER, SUBJECT_TOKEN_HEADER};

/// Authenticated client for the identity authority.
///
/// # Example
///
/// ```rust,no_run
/// # async fn demo(transport: std::sync::Arc<dyn transport::HttpTransport>) -> identity::Result<()> {
/// use identity::{IdentityClient, IdentityConfig};
///
/// let config = IdentityConfig {
///     url: "http://idm.docker:5000".into(),
///     user: "idm".into(),
///     password: "idm".into(),
/// };
/// let client = IdentityClient::login(config, transport).await?;
/// client.check_ownership("app1", "alice").await?;
/// client.grant_role("app1", "bob", "consumer").await?;
/// # Ok(())
/// # }
/// ```
pub struct IdentityClient {
    config: IdentityConfig,
    transport: Arc<dyn HttpTransport>,
    session: Session,
}

impl IdentityClient {
    /// Logs in with the configured credentials and returns a ready client.
    pub async fn login(config: IdentityConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let session = Self::authenticate(&config, transport.as_ref()).await?;
        Ok(Self::with_session(config, transport, session))
    }

    /// Builds a client around a session obtained elsewhere.
    pub fn with_session(
        config: IdentityConfig,
        transport: Arc<dyn HttpTransport>,
        session: Session,
    ) -> Self {
        Self {
            config,
            transport,
            session,
        }
    }

    /// Exchanges username and password for a session token.
    ///
    /// Any non-success answer is an [`IdentityError::Authentication`]; nothing
    /// is retried.
    pub async fn authenticate(
        config: &IdentityConfig,
        transport: &dyn HttpTransport,
    ) -> Result<Session> {
        let url = format!("{}/v3/auth/tokens", config.url.trim_end_matches('/'));
        let body = serde_json::json!({
            "name": config.user,
            "password": config.password,
        });

        let response = transport
            .send(HttpRequest::post(url).json(body))
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!("Login to identity authority as {} failed: {}", config.user, e);
                IdentityError::Authentication(e)
            })?;

        let token = response
            .header(SUBJECT_TOKEN_HEADER)
            .filter(|t| !t.is_empty())
            .ok_or(IdentityError::MissingToken)?;

        debug!("Logged in to identity authority as {}", config.user);
        Ok(Session::new(token))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: HttpRequest) -> HttpRequest {
        request.header(AUTH_TOKEN_HEADER, self.session.token())
    }

    /// Role assignments of `principal` on `app_id`.
    pub async fn role_assignments(
        &self,
        app_id: &str,
        principal: &str,
    ) -> Result<Vec<RoleAssignment>> {
        let url = self.url(&format!(
            "/v1/applications/{}/users/{}/roles",
            urlencoding::encode(app_id),
            urlencoding::encode(principal)
        ));
        let response = self
            .transport
            .send(self.authorized(HttpRequest::get(url)))
            .await?
            .error_for_status()?;

        let assignments: RoleAssignments = response.json()?;
        Ok(assignments.role_user_assignments)
    }

    /// Roles registered in `app_id`.
    pub async fn roles(&self, app_id: &str) -> Result<Vec<Role>> {
        let url = self.url(&format!(
            "/v1/applications/{}/roles",
            urlencoding::encode(app_id)
        ));
        let response = self
            .transport
            .send(self.authorized(HttpRequest::get(url)))
            .await?
            .error_for_status()?;

        let roles: Roles = response.json()?;
        Ok(roles.roles)
    }

    /// Succeeds when `principal` holds the provider role on `app_id`.
    pub async fn check_ownership(&self, app_id: &str, principal: &str) -> Result<()> {
        let assignments = self.role_assignments(app_id, principal).await?;

        if assignments.iter().any(|a| a.role_id == PROVIDER_ROLE_ID) {
            debug!("{} owns application {}", principal, app_id);
            Ok(())
        } else {
            warn!("{} is not an owner of application {}", principal, app_id);
            Err(IdentityError::NotOwner {
                app_id: app_id.to_string(),
                principal: principal.to_string(),
            })
        }
    }

    /// Resolves a role name to the authority's internal role id.
    pub async fn resolve_role_id(&self, app_id: &str, role_name: &str) -> Result<String> {
        let roles = self.roles(app_id).await?;
        find_role_id(&roles, role_name)
    }

    /// Assigns the role named `role_name` to `principal` on `app_id`.
    pub async fn grant_role(&self, app_id: &str, principal: &str, role_name: &str) -> Result<()> {
        let role_id = self.resolve_role_id(app_id, role_name).await?;
        let request = HttpRequest::post(self.assignment_url(app_id, principal, &role_id))
            .header("Content-Type", "application/json");

        self.transport
            .send(self.authorized(request))
            .await?
            .error_for_status()?;

        info!(
            "Granted role {} ({}) on application {} to {}",
            role_name, role_id, app_id, principal
        );
        Ok(())
    }

    /// Removes the role named `role_name` from `principal` on `app_id`.
    pub async fn revoke_role(&self, app_id: &str, principal: &str, role_name: &str) -> Result<()> {
        let role_id = self.resolve_role_id(app_id, role_name).await?;
        let request = HttpRequest::delete(self.assignment_url(app_id, principal, &role_id))
            .header("Content-Type", "application/json");

        self.transport
            .send(self.authorized(request))
            .await?
            .error_for_status()?;

        info!(
            "Revoked role {} ({}) on application {} from {}",
            role_name, role_id, app_id, principal
        );
        Ok(())
    }

    fn assignment_url(&self, app_id: &str, principal: &str, role_id: &str) -> String {
        self.url(&format!(
            "/v1/applications/{}/users/{}/roles/{}",
            urlencoding::encode(app_id),
            urlencoding::encode(principal),
            urlencoding::encode(role_id)
        ))
    }
}

/// Case-insensitive lookup of a role id by name.
pub fn find_role_id(roles: &[Role], role_name: &str) -> Result<String> {
    let wanted = role_name.to_lowercase();
    roles
        .iter()
        .find(|role| role.name.to_lowercase() == wanted)
        .map(|role| role.id.clone())
        .ok_or_else(|| IdentityError::UnknownRole {
            role: role_name.to_string(),
            available: roles.iter().map(|r| r.name.clone()).collect(),
        })
}
