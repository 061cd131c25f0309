//! Password login for protected sites
//!
//! Form login submits the site's password form once; the client's cookie
//! store then carries the session for every later request. Basic auth needs
//! no login step (see [`crate::crawler::BasicCredential`]).

use crate::config::{AuthMode, SiteConfig};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::find_login_form;
use url::Url;

/// Attempts made before giving up on form login
const LOGIN_ATTEMPTS: u32 = 2;

/// Result of the login step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// No password configured, or basic auth in use
    NotRequired,
    /// The root page no longer shows a password form
    LoggedIn,
    /// The root page shows no password form to begin with
    NoForm,
    /// The password form is still shown after every attempt
    Rejected,
}

/// Logs into the site when a form password is configured
///
/// Failures never abort the crawl: they are logged and the crawl continues
/// with whatever the site serves anonymously.
pub async fn login(fetcher: &Fetcher, site: &SiteConfig, root: &Url) -> LoginOutcome {
    let Some(password) = site.password.as_deref() else {
        return LoginOutcome::NotRequired;
    };
    if site.auth != AuthMode::Form {
        return LoginOutcome::NotRequired;
    }

    for attempt in 1..=LOGIN_ATTEMPTS {
        let page = match fetcher.fetch_document(root).await {
            Ok(page) => page,
            Err(failure) => {
                tracing::warn!("Login attempt {}: cannot load {}: {}", attempt, root, failure.reason);
                continue;
            }
        };

        let Some(form) = find_login_form(&page.body, &page.final_url) else {
            if attempt == 1 {
                tracing::info!("No password form on {}, continuing without login", root);
                return LoginOutcome::NoForm;
            }
            tracing::info!("Logged in to {}", root);
            return LoginOutcome::LoggedIn;
        };

        tracing::debug!("Submitting password form to {}", form.action);
        let response = fetcher
            .client()
            .post(form.action.clone())
            .form(&form.submission(password))
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_client_error() || response.status().is_server_error() => {
                tracing::warn!("Login attempt {} returned {}", attempt, response.status());
            }
            Ok(_) => {
                if still_locked(fetcher, root).await {
                    tracing::warn!("Login attempt {} did not unlock {}", attempt, root);
                } else {
                    tracing::info!("Logged in to {}", root);
                    return LoginOutcome::LoggedIn;
                }
            }
            Err(e) => tracing::warn!("Login attempt {} failed: {}", attempt, e),
        }
    }

    tracing::warn!("Login to {} failed after {} attempts", root, LOGIN_ATTEMPTS);
    LoginOutcome::Rejected
}

/// Re-fetches the root and checks whether the password form is still shown
async fn still_locked(fetcher: &Fetcher, root: &Url) -> bool {
    match fetcher.fetch_document(root).await {
        Ok(page) => find_login_form(&page.body, &page.final_url).is_some(),
        Err(_) => true,
    }
}
