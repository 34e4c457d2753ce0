//! Session commands.

use storefront_sync_client::backend::Credentials;
use storefront_sync_client::{DispatchScope, Dispatcher};

use super::{CliError, settle};

const EMAIL_VAR: &str = "STOREFRONT_EMAIL";
const PASSWORD_VAR: &str = "STOREFRONT_PASSWORD";

/// Sign in with `STOREFRONT_EMAIL` / `STOREFRONT_PASSWORD`.
pub async fn login(dispatcher: &Dispatcher, scope: &DispatchScope) -> Result<(), CliError> {
    let credentials = credentials_from(|key| std::env::var(key).ok())?;
    settle(dispatcher.login(&credentials, scope.token()).await)
}

fn credentials_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Credentials, CliError> {
    let email = lookup(EMAIL_VAR).ok_or(CliError::MissingEnvVar(EMAIL_VAR))?;
    let password = lookup(PASSWORD_VAR).ok_or(CliError::MissingEnvVar(PASSWORD_VAR))?;

    // Info lines become Sentry breadcrumbs; the address stays out of them.
    tracing::info!("Signing in with {EMAIL_VAR}");
    Ok(Credentials::new(email, password))
}

/// Sign in, reload the session from the cookie and print the profile.
pub async fn show(dispatcher: &Dispatcher, scope: &DispatchScope) -> Result<(), CliError> {
    login(dispatcher, scope).await?;
    settle(dispatcher.load_session(scope.token()).await)?;
    dispatcher.store().read(|state| print_profile(state.session.user.as_ref()));
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_profile(user: Option<&storefront_sync_client::backend::UserProfile>) {
    let Some(user) = user else {
        println!("Not signed in.");
        return;
    };
    println!("{} <{}>", user.name, user.email);
    println!("  id:    {}", user.id);
    println!("  role:  {}", user.role);
    if let Some(created_at) = user.created_at {
        println!("  since: {}", created_at.format("%Y-%m-%d"));
    }
}
