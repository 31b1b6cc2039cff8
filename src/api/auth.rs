use axum::{
    body::Body,
    extract::State,
    http::{header::WWW_AUTHENTICATE, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use headers::authorization::{Authorization, Basic};
use headers::HeaderMapExt;

const CHALLENGE: &str = "Basic realm=\"Authorization Required\"";

/// Username and password accepted by the status API.
#[derive(Clone)]
pub struct BasicCredentials {
    username: String,
    password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"REDACTED")
            .finish()
    }
}

pub async fn basic_auth_middleware(
    State(credentials): State<BasicCredentials>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(Authorization(basic)) = request.headers().typed_get::<Authorization<Basic>>() {
        if credentials.matches(basic.username(), basic.password()) {
            return next.run(request).await;
        }
    }

    tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated status request");
    let mut response = (StatusCode::UNAUTHORIZED, "401 Unauthorized\n").into_response();
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE));
    response
}
