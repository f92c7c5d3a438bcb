//! services/client/src/controllers/forms.rs
//!
//! Login and registration form handling.

use std::sync::Arc;

use prd_client_core::domain::{Route, View};
use prd_client_core::ports::{FormView, Navigator};
use tracing::{error, info};

use super::auth::AuthController;
use crate::error::{ClientError, ClientResult};

pub const REGISTERED_NOTICE: &str =
    "Registration successful! Please log in with your new account.";
const LOGIN_FAILED: &str = "Invalid email or password. Please try again.";
const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
const ACCOUNT_EXISTS: &str = "An account with this email already exists.";
const MIN_PASSWORD_LEN: usize = 8;

//=========================================================================================
// Login
//=========================================================================================

pub struct LoginPage {
    auth: Arc<AuthController>,
    form: Arc<dyn FormView>,
    navigator: Arc<dyn Navigator>,
    route: Route,
}

impl LoginPage {
    /// `route` is the login route that was navigated to, carrying its parameters.
    pub fn new(
        auth: Arc<AuthController>,
        form: Arc<dyn FormView>,
        navigator: Arc<dyn Navigator>,
        route: Route,
    ) -> Self {
        Self {
            auth,
            form,
            navigator,
            route,
        }
    }

    /// Renders the page. Returns false when the user was sent on immediately
    /// because they are already signed in.
    pub fn open(&self) -> bool {
        if self.route.registered {
            self.form.show_notice(REGISTERED_NOTICE);
        }
        if self.auth.is_authenticated() {
            self.form.show_notice(&self.already_signed_in());
            self.redirect_after_login();
            return false;
        }
        true
    }

    /// Names the stored account so credentials passed alongside are not silently dropped.
    fn already_signed_in(&self) -> String {
        match self.auth.session().user() {
            Ok(Some(user)) => format!(
                "Already signed in as {}. Log out first to switch accounts.",
                user.email
            ),
            _ => "Already signed in. Log out first to switch accounts.".to_string(),
        }
    }

    pub async fn submit(&self, email: &str, password: &str) -> ClientResult<()> {
        if email.is_empty() || password.is_empty() {
            let err = ClientError::Validation("Please enter both email and password.".into());
            self.form.show_error(&err.to_string());
            return Err(err);
        }

        self.form.set_busy(true);
        let result = self.auth.login(email, password).await;
        self.form.set_busy(false);

        match result {
            Ok(_) => {
                self.form.hide_error();
                self.redirect_after_login();
                Ok(())
            }
            Err(e) => {
                error!("Login error: {}", e);
                self.form.show_error(LOGIN_FAILED);
                Err(e)
            }
        }
    }

    fn redirect_after_login(&self) {
        let target = self.route.redirect.unwrap_or(View::Generate);
        self.navigator.navigate(Route::to(target));
    }
}

//=========================================================================================
// Registration
//=========================================================================================

/// Raw registration form input.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Checks the form locally; nothing is sent when this fails.
    pub fn validate(&self) -> ClientResult<()> {
        if self.full_name.is_empty()
            || self.email.is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(ClientError::Validation("Please fill out all fields.".into()));
        }
        if self.password != self.confirm_password {
            return Err(ClientError::Validation("Passwords do not match.".into()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::Validation(format!(
                "Password must be at least {} characters long.",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Registered and signed in; sent to the generation view.
    SignedIn,
    /// Registered, but the automatic login failed; sent to the login view.
    LoginRequired,
}

pub struct RegisterPage {
    auth: Arc<AuthController>,
    form: Arc<dyn FormView>,
    navigator: Arc<dyn Navigator>,
}

impl RegisterPage {
    pub fn new(
        auth: Arc<AuthController>,
        form: Arc<dyn FormView>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            auth,
            form,
            navigator,
        }
    }

    pub async fn submit(&self, input: &RegistrationForm) -> ClientResult<RegistrationOutcome> {
        if let Err(err) = input.validate() {
            self.form.show_error(&err.to_string());
            return Err(err);
        }

        self.form.set_busy(true);
        if let Err(e) = self
            .auth
            .register(&input.full_name, &input.email, &input.password)
            .await
        {
            error!("Registration error: {}", e);
            let message = if e.to_string().contains("already exists") {
                ACCOUNT_EXISTS
            } else {
                REGISTRATION_FAILED
            };
            self.form.show_error(message);
            self.form.set_busy(false);
            return Err(e);
        }
        self.form.hide_error();

        let outcome = match self.auth.login(&input.email, &input.password).await {
            Ok(_) => {
                self.navigator.navigate(Route::to(View::Generate));
                RegistrationOutcome::SignedIn
            }
            Err(e) => {
                info!("Automatic login after registration failed: {}", e);
                self.navigator.navigate(Route::login_after_registration());
                RegistrationOutcome::LoginRequired
            }
        };
        self.form.set_busy(false);
        Ok(outcome)
    }
}
