use statement_flow::config::Credentials;
use statement_flow::network::errors::NetworkError;
use statement_flow::network::{Authenticator, LoginEndpoints, RetryPolicy, StatementClient};
use url::Url;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r#"
<html><body>
  <form method="post" action="/login/">
    <input type="hidden" name="csrfmiddlewaretoken" value="tok123">
    <input type="text" name="username">
    <input type="password" name="password">
  </form>
</body></html>
"#;

async fn mount_login_page(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn authenticator(server: &MockServer) -> Authenticator {
    let base = Url::parse(&server.uri()).unwrap();
    Authenticator::new(LoginEndpoints::for_site(&base).unwrap())
}

#[tokio::test]
async fn test_login_echoes_token_and_lands_on_dashboard() {
    let server = MockServer::start().await;
    mount_login_page(&server, LOGIN_PAGE).await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .and(body_string_contains("csrfmiddlewaretoken=tok123"))
        .and(body_string_contains("username=analyst"))
        .and(header_exists("Referer"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/dash/", server.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dash/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("dashboard"))
        .mount(&server)
        .await;

    let client = StatementClient::new(RetryPolicy::default()).unwrap();
    let session = authenticator(&server)
        .login(&client, &Credentials::new("analyst", "secret"))
        .await
        .unwrap();

    assert_eq!(session.landed_on().path(), "/dash/");
}

#[tokio::test]
async fn test_login_rejected_when_not_on_dashboard() {
    let server = MockServer::start().await;
    mount_login_page(&server, LOGIN_PAGE).await;

    // * Failed logins re-render the form on the same URL
    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(&server)
        .await;

    let client = StatementClient::new(RetryPolicy::default()).unwrap();
    let result = authenticator(&server)
        .login(&client, &Credentials::new("analyst", "wrong"))
        .await;

    match result {
        Err(NetworkError::LoginRejected { landed_on }) => assert!(landed_on.ends_with("/login/")),
        other => panic!("Expected LoginRejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_token_fails_before_posting() {
    let server = MockServer::start().await;
    mount_login_page(&server, "<html><form></form></html>").await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = StatementClient::new(RetryPolicy::default()).unwrap();
    let result = authenticator(&server)
        .login(&client, &Credentials::new("analyst", "secret"))
        .await;

    assert!(matches!(result, Err(NetworkError::MissingToken(field)) if field == "csrfmiddlewaretoken"));
}
