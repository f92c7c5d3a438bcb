//! services/client/src/controllers/auth.rs
//!
//! Orchestrates login, registration, logout and the startup token check, and
//! owns the route guard for authenticated-only views.

use std::sync::Arc;

use prd_client_core::domain::{RegisteredAccount, Registration, Route, UserProfile, View};
use prd_client_core::ports::{AuthView, Navigator, PrdService};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::AuthMode;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionStore;

/// An enum representing where the client stands with the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    /// Signed in according to local storage; the backend has not confirmed it yet.
    Verifying(UserProfile),
    Authenticated(UserProfile),
}

impl AuthState {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            AuthState::Unauthenticated => None,
            AuthState::Verifying(user) | AuthState::Authenticated(user) => Some(user),
        }
    }
}

pub struct AuthController {
    api: Arc<dyn PrdService>,
    session: SessionStore,
    view: Arc<dyn AuthView>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<AuthState>,
}

impl AuthController {
    pub fn new(
        api: Arc<dyn PrdService>,
        session: SessionStore,
        view: Arc<dyn AuthView>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            session,
            view,
            navigator,
            state: Mutex::new(AuthState::Unauthenticated),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn state(&self) -> AuthState {
        self.state.lock().await.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Computes the initial state from local storage and renders it right away.
    /// Call `verify` afterwards to reconcile with the backend.
    pub async fn init(&self) -> AuthState {
        let session = match self.session.load() {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to read the stored session: {}", e);
                Default::default()
            }
        };

        let next = match session.user {
            Some(user) if session.token.is_some() => {
                self.view.show_authenticated(&user);
                AuthState::Verifying(user)
            }
            _ => {
                self.view.show_unauthenticated();
                AuthState::Unauthenticated
            }
        };
        *self.state.lock().await = next.clone();
        next
    }

    /// Confirms a `Verifying` session with `GET /users/me`. Any failure logs out.
    pub async fn verify(&self) -> AuthState {
        let user = match self.state().await {
            AuthState::Verifying(user) => user,
            other => return other,
        };

        if self.session.mode() == AuthMode::Disabled {
            return self.set_state(AuthState::Authenticated(user)).await;
        }

        let token = match self.session.token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("Token disappeared before verification");
                self.logout().await;
                return AuthState::Unauthenticated;
            }
            Err(e) => {
                error!("Failed to read the stored token: {}", e);
                self.logout().await;
                return AuthState::Unauthenticated;
            }
        };

        let outcome = self.api.fetch_profile(Some(&token)).await;

        // A login or logout may have replaced the token while the check was in flight.
        if !matches!(self.session.token(), Ok(Some(current)) if current == token) {
            info!("Session changed during verification; ignoring the result");
            return self.state().await;
        }

        match outcome {
            Ok(_) => {
                info!("Stored session verified");
                self.set_state(AuthState::Authenticated(user)).await
            }
            Err(e) => {
                warn!("Token validation failed: {}", e);
                self.logout().await;
                AuthState::Unauthenticated
            }
        }
    }

    /// Exchanges credentials for a token, fetches the profile with it, then
    /// commits both. Nothing is stored unless both calls succeed.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserProfile> {
        let token = self.api.login(email, password).await?;
        let user = self.api.fetch_profile(Some(&token)).await?;
        self.session.commit(&token, &user)?;

        info!("Logged in");
        self.view.show_authenticated(&user);
        self.set_state(AuthState::Authenticated(user.clone())).await;
        Ok(user)
    }

    /// Creates an account. Does not sign in.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> ClientResult<RegisteredAccount> {
        let account = self
            .api
            .register(&Registration {
                full_name: full_name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        info!("Account registered");
        Ok(account)
    }

    /// Clears the session and leaves any authenticated view. Safe to repeat.
    pub async fn logout(&self) {
        self.reset().await;
        self.navigator.navigate(Route::to(View::Home));
    }

    /// A backend call was rejected with 401 while on `from`.
    pub async fn handle_unauthorized(&self, from: View) {
        warn!("Session rejected by the backend on {}", from);
        self.reset().await;
        self.navigator.navigate(Route::login_returning_to(from));
    }

    /// Where to send the user instead of `view`, if anywhere.
    pub fn guard(&self, view: View) -> Option<Route> {
        if view.requires_auth() && !self.is_authenticated() {
            return Some(Route::login_returning_to(view));
        }
        None
    }

    /// Runs the guard and performs the redirect. Returns true when entry is allowed.
    pub fn enter(&self, view: View) -> bool {
        match self.guard(view) {
            Some(route) => {
                info!("{} requires authentication, redirecting to login", view);
                self.navigator.navigate(route);
                false
            }
            None => true,
        }
    }

    /// Routes an error from a protected view: 401s end the session.
    pub async fn intercept(&self, err: &ClientError, from: View) {
        if err.is_auth() {
            self.handle_unauthorized(from).await;
        }
    }

    async fn reset(&self) {
        if let Err(e) = self.session.clear() {
            error!("Failed to clear the stored session: {}", e);
        }
        self.set_state(AuthState::Unauthenticated).await;
        self.view.show_unauthenticated();
    }

    async fn set_state(&self, next: AuthState) -> AuthState {
        *self.state.lock().await = next.clone();
        next
    }
}
