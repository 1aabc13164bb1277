// * Authenticator - Login Form Session
// * GET the login page, echo back its anti-forgery token, POST credentials.
// * The session lives in the StatementClient cookie jar.

use crate::config::constants::{CSRF_FIELD, DASHBOARD_PATH, LOGIN_PATH};
use crate::config::settings::Credentials;
use crate::network::client::StatementClient;
use crate::network::errors::NetworkError;
use crate::network::identity::IdentityProfile;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{info, warn};
use url::Url;

static SELECTOR_INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input").expect("Invalid input selector"));

/// Login and post-login URLs for a site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginEndpoints {
    pub login_url: Url,
    pub dashboard_url: Url,
    pub token_field: String,
}

impl LoginEndpoints {
    /// Derives `<base>/login/` and `<base>/dash/` from the site root
    pub fn for_site(base_url: &Url) -> Result<Self, NetworkError> {
        let base = with_trailing_slash(base_url);
        Ok(Self {
            login_url: base.join(LOGIN_PATH).map_err(|_| NetworkError::InvalidUrl)?,
            dashboard_url: base.join(DASHBOARD_PATH).map_err(|_| NetworkError::InvalidUrl)?,
            token_field: CSRF_FIELD.to_string(),
        })
    }
}

/// Proof that the login flow reached the dashboard
#[derive(Debug, Clone)]
pub struct Session {
    landed_on: Url,
}

impl Session {
    pub fn landed_on(&self) -> &Url {
        &self.landed_on
    }
}

pub struct Authenticator {
    endpoints: LoginEndpoints,
    identity: IdentityProfile,
}

impl Authenticator {
    pub fn new(endpoints: LoginEndpoints) -> Self {
        Self {
            endpoints,
            identity: IdentityProfile::generate_chrome_120(),
        }
    }

    /// Logs in through the site's form.
    ///
    /// Success is decided only by the final response URL being the dashboard
    /// URL after redirects. The response body and cookies are not inspected,
    /// so a site that serves the dashboard URL for a failed login would be
    /// reported as a success.
    pub async fn login(
        &self,
        client: &StatementClient,
        credentials: &Credentials,
    ) -> Result<Session, NetworkError> {
        let login_url = self.endpoints.login_url.as_str();

        let mut page_headers = HeaderMap::new();
        self.identity.apply_to_headers(&mut page_headers)?;

        let page = client
            .http()
            .get(login_url)
            .headers(page_headers)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let token = extract_form_token(&page, &self.endpoints.token_field)
            .ok_or_else(|| NetworkError::MissingToken(self.endpoints.token_field.clone()))?;

        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            (self.endpoints.token_field.as_str(), token.as_str()),
        ];

        let resp = client
            .http()
            .post(login_url)
            .headers(self.identity.form_headers(login_url)?)
            .form(&form)
            .send()
            .await?;

        let landed_on = resp.url().clone();

        if landed_on == self.endpoints.dashboard_url {
            info!(user = %credentials.username, "Login successful");
            Ok(Session { landed_on })
        } else {
            warn!(user = %credentials.username, landed_on = %landed_on, "Login failed");
            Err(NetworkError::LoginRejected {
                landed_on: landed_on.to_string(),
            })
        }
    }
}

/// Reads the value of the named hidden input from a form page
pub fn extract_form_token(html: &str, field: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&SELECTOR_INPUT)
        .find(|input| input.value().attr("name") == Some(field))
        .and_then(|input| input.value().attr("value"))
        .map(|value| value.to_string())
}

// * Url::join drops the last path segment unless the base ends with '/'
fn with_trailing_slash(url: &Url) -> Url {
    let mut base = url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}
