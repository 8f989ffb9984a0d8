//! Request-level access control.
//!
//! Every inbound request passes through [`AccessGate::evaluate`] before any
//! handler runs. The gate is stateless: there is no session or token store,
//! and each request re-validates its credentials independently.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::config::AdminConfig;

/// Path prefix served by the administrative UI.
pub const ADMIN_PREFIX: &str = "/admin";
/// Path prefix served by the programmatic API.
pub const API_PREFIX: &str = "/api";

/// Outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

/// A denied request, carrying the challenge realm to advertise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub realm: Realm,
    pub reason: DenyReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Realm {
    AdminArea,
    AdminApi,
}

impl Realm {
    pub fn name(self) -> &'static str {
        match self {
            Realm::AdminArea => "Admin Area",
            Realm::AdminApi => "Admin API",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingHeader,
    UnsupportedScheme,
    MalformedPayload,
    BadCredentials,
}

/// Stateless per-request authorization gate over the configured admin secrets.
#[derive(Clone)]
pub struct AccessGate {
    user: String,
    pass: String,
}

impl AccessGate {
    pub fn new(admin: &AdminConfig) -> Self {
        Self {
            user: admin.user.clone(),
            pass: admin.pass.clone(),
        }
    }

    /// Decide whether a request may proceed. Rules, in order: CORS preflight
    /// is always allowed; admin paths always need Basic credentials; API
    /// paths need them for non-safe methods only; everything else passes.
    pub fn evaluate(&self, method: &Method, path: &str, authorization: Option<&str>) -> Decision {
        if method == Method::OPTIONS {
            return Decision::Allow;
        }

        if under_prefix(path, ADMIN_PREFIX) {
            return self.check_basic(authorization, Realm::AdminArea);
        }

        if under_prefix(path, API_PREFIX) {
            if is_safe_method(method) {
                return Decision::Allow;
            }
            return self.check_basic(authorization, Realm::AdminApi);
        }

        Decision::Allow
    }

    /// Validate a `Basic user:pass` header against the configured secrets.
    /// Every failure mode, including undecodable base64, folds into a
    /// [`Decision::Deny`]; nothing escapes as an error.
    fn check_basic(&self, authorization: Option<&str>, realm: Realm) -> Decision {
        let deny = |reason| Decision::Deny(Denial { realm, reason });

        let header = match authorization {
            Some(value) => value.trim(),
            None => return deny(DenyReason::MissingHeader),
        };

        let encoded = match split_scheme(header) {
            Some(payload) => payload,
            None => return deny(DenyReason::UnsupportedScheme),
        };

        let decoded = match BASE64.decode(encoded.trim()) {
            Ok(bytes) => bytes,
            Err(_) => return deny(DenyReason::MalformedPayload),
        };
        let decoded = match String::from_utf8(decoded) {
            Ok(text) => text,
            Err(_) => return deny(DenyReason::MalformedPayload),
        };

        let Some((user, pass)) = decoded.split_once(':') else {
            return deny(DenyReason::MalformedPayload);
        };

        if user == self.user && pass == self.pass {
            Decision::Allow
        } else {
            deny(DenyReason::BadCredentials)
        }
    }
}

/// Scheme comparison is case-insensitive per RFC 7617.
fn split_scheme(header: &str) -> Option<&str> {
    let (scheme, payload) = header.split_once(' ')?;
    scheme.eq_ignore_ascii_case("basic").then_some(payload)
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// axum middleware applying the gate to every request; a denial stops the
/// chain with a 401 challenge naming the relevant realm.
pub async fn require_access(
    State(gate): State<Arc<AccessGate>>,
    request: Request,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match gate.evaluate(request.method(), request.uri().path(), authorization) {
        Decision::Allow => next.run(request).await,
        Decision::Deny(denial) => challenge_response(&denial),
    }
}

fn challenge_response(denial: &Denial) -> Response {
    let challenge = format!("Basic realm=\"{}\"", denial.realm.name());
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, challenge)],
        "authentication required\n",
    )
        .into_response()
}
