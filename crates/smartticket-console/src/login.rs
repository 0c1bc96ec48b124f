//! Sign-in, sign-out, and password reset.

use smartticket_store::{AuthError, Session};
use tracing::{info, warn};

use crate::console::Console;
use crate::error::ConsoleError;

/// Operator-facing text for a failed password reset request.
pub fn reset_error_text(err: &AuthError) -> &'static str {
    match err {
        AuthError::UserNotFound => "No account found with this email address.",
        AuthError::InvalidEmail => "Please enter a valid email address.",
        _ => "An error occurred. Please try again.",
    }
}

impl Console {
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ConsoleError> {
        match self.auth().sign_in(email.trim(), password).await {
            Ok(session) => {
                info!(uid = %session.uid, "operator signed in");
                self.notifier().success("Login Successful", "Welcome back!");
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "sign-in failed");
                self.notifier().error("Login Failed", "Invalid Credentials");
                Err(e.into())
            }
        }
    }

    pub async fn logout(&self) -> Result<(), ConsoleError> {
        self.auth().sign_out().await?;
        info!("operator signed out");
        Ok(())
    }

    /// Ask the identity backend to email a reset link.
    ///
    /// A blank address only shows a warning; no call is made.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ConsoleError> {
        let email = email.trim();
        if email.is_empty() {
            self.notifier().warning(
                "Email Required",
                "Please enter your email address to reset your password.",
            );
            return Ok(());
        }
        match self.auth().send_password_reset(email).await {
            Ok(()) => {
                self.notifier().success(
                    "Password Reset Sent",
                    "Please check your email to reset your password.",
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "password reset failed");
                self.notifier().error("Error", reset_error_text(&e));
                Err(e.into())
            }
        }
    }
}
