//! Authentication: password hashing, signed tokens and the request gate.
//!
//! The gate runs as a Rocket request guard. A route family picks the header
//! schemes it accepts through the `Scheme` parameter of [`Authenticated`]:
//! the user and article routes take `Token <jwt>` only, the comment routes
//! take `Token <jwt>` or `Bearer <jwt>`.

use std::fmt;
use std::marker::PhantomData;

use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};

use crate::state::Conduit;
use crate::types::ApiError;

pub mod password;
pub mod token;

use self::token::{Claims, TokenIssuer};

pub const AUTHORIZATION: &str = "Authorization";

/// The identity the gate attaches to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub email: String,
    pub username: Option<String>,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Identity {
        Identity {
            user_id: claims.user_id,
            email: claims.email,
            username: claims.username,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    MissingHeader,
    MalformedHeader,
    MissingToken,
    InvalidToken,
}

impl GateError {
    pub fn message(&self) -> &'static str {
        match self {
            GateError::MissingHeader => "Missing authorization header",
            GateError::MalformedHeader => "Invalid authorization header format",
            GateError::MissingToken => "Missing token",
            GateError::InvalidToken => "Invalid token",
        }
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> ApiError {
        ApiError::unauthorized("token", err.message())
    }
}

/// Runs the header through the gate: presence, scheme prefix, a non-empty
/// token, then validation. Only the first failing step is reported.
pub fn authenticate(header: Option<&str>, schemes: &[&str], tokens: &TokenIssuer) -> Result<Identity, GateError> {
    let header = match header.map(str::trim) {
        Some(h) if !h.is_empty() => h,
        _ => return Err(GateError::MissingHeader),
    };

    let token = schemes
        .iter()
        .find_map(|scheme| strip_scheme(header, scheme))
        .ok_or(GateError::MalformedHeader)?;
    if token.is_empty() {
        return Err(GateError::MissingToken);
    }

    tokens.validate(token).map(Identity::from).map_err(|e| {
        log::debug!("rejected token: {}", e);
        GateError::InvalidToken
    })
}

/// `Some("")` for a bare scheme name, as trailing whitespace may already be gone.
fn strip_scheme<'h>(header: &'h str, scheme: &str) -> Option<&'h str> {
    if header == scheme {
        return Some("");
    }
    header
        .strip_prefix(scheme)
        .and_then(|rest| rest.strip_prefix(' '))
        .map(str::trim)
}

pub trait Scheme: Send + Sync + 'static {
    const ACCEPTS: &'static [&'static str];
}

#[derive(Debug)]
pub struct TokenOnly;

impl Scheme for TokenOnly {
    const ACCEPTS: &'static [&'static str] = &["Token"];
}

#[derive(Debug)]
pub struct TokenOrBearer;

impl Scheme for TokenOrBearer {
    const ACCEPTS: &'static [&'static str] = &["Token", "Bearer"];
}

#[derive(Debug)]
pub struct Authenticated<S> {
    pub identity: Identity,
    scheme: PhantomData<S>,
}

impl<S> Authenticated<S> {
    pub fn new(identity: Identity) -> Self {
        Authenticated { identity, scheme: PhantomData }
    }

    pub fn id(&self) -> i32 {
        self.identity.user_id
    }
}

pub type AuthUser = Authenticated<TokenOnly>;
pub type CommentAuthor = Authenticated<TokenOrBearer>;

/// Guard for routes that must be authenticated; handlers unwrap it with `?`
/// so the rejection renders through `ApiError`.
pub type CurrentUser = Result<AuthUser, ApiError>;
pub type CurrentCommenter = Result<CommentAuthor, ApiError>;

#[rocket::async_trait]
impl<'r, S: Scheme> FromRequest<'r> for Authenticated<S> {
    type Error = ApiError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let conduit = match request.rocket().state::<Conduit>() {
            Some(conduit) => conduit,
            None => {
                let err = ApiError::Internal("application state is not managed".into());
                return Outcome::Error((Status::InternalServerError, err));
            }
        };
        let header = request.headers().get_one(AUTHORIZATION);
        match authenticate(header, S::ACCEPTS, &conduit.tokens) {
            Ok(identity) => Outcome::Success(Authenticated::new(identity)),
            Err(e) => Outcome::Error((Status::Unauthorized, e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn tokens() -> TokenIssuer {
        TokenIssuer::new(b"gate-secret", Duration::hours(1)).unwrap()
    }

    fn valid_token() -> String {
        tokens().issue(3, "jake@jake.jake", Some("jake")).unwrap()
    }

    #[test]
    fn missing_or_empty_header() {
        assert_eq!(authenticate(None, TokenOnly::ACCEPTS, &tokens()), Err(GateError::MissingHeader));
        assert_eq!(authenticate(Some(""), TokenOnly::ACCEPTS, &tokens()), Err(GateError::MissingHeader));
        assert_eq!(authenticate(Some("   "), TokenOnly::ACCEPTS, &tokens()), Err(GateError::MissingHeader));
    }

    #[test]
    fn unrecognised_scheme() {
        let header = format!("Bearer {}", valid_token());
        assert_eq!(
            authenticate(Some(&header), TokenOnly::ACCEPTS, &tokens()),
            Err(GateError::MalformedHeader)
        );
        assert_eq!(
            authenticate(Some(&valid_token()), TokenOnly::ACCEPTS, &tokens()),
            Err(GateError::MalformedHeader)
        );
        assert_eq!(
            authenticate(Some("Tokenabc"), TokenOnly::ACCEPTS, &tokens()),
            Err(GateError::MalformedHeader)
        );
    }

    #[test]
    fn scheme_without_token() {
        assert_eq!(authenticate(Some("Token "), TokenOnly::ACCEPTS, &tokens()), Err(GateError::MissingToken));
        assert_eq!(authenticate(Some("Token"), TokenOnly::ACCEPTS, &tokens()), Err(GateError::MissingToken));
        assert_eq!(
            authenticate(Some("Bearer   "), TokenOrBearer::ACCEPTS, &tokens()),
            Err(GateError::MissingToken)
        );
    }

    #[test]
    fn invalid_token() {
        assert_eq!(
            authenticate(Some("Token invalid.token.here"), TokenOnly::ACCEPTS, &tokens()),
            Err(GateError::InvalidToken)
        );
        let foreign = TokenIssuer::new(b"other-secret", Duration::hours(1))
            .unwrap()
            .issue(3, "jake@jake.jake", None)
            .unwrap();
        let header = format!("Token {}", foreign);
        assert_eq!(authenticate(Some(&header), TokenOnly::ACCEPTS, &tokens()), Err(GateError::InvalidToken));
    }

    #[test]
    fn expired_token() {
        let now = Utc::now();
        let stale = tokens()
            .issue_at(3, "jake@jake.jake", None, now - Duration::hours(2), now - Duration::hours(1))
            .unwrap();
        let header = format!("Token {}", stale);
        assert_eq!(authenticate(Some(&header), TokenOnly::ACCEPTS, &tokens()), Err(GateError::InvalidToken));
    }

    #[test]
    fn authenticates_either_accepted_scheme() {
        let token = valid_token();
        for header in &[format!("Token {}", token), format!("Bearer {}", token)] {
            let identity = authenticate(Some(header), TokenOrBearer::ACCEPTS, &tokens()).unwrap();
            assert_eq!(identity.user_id, 3);
            assert_eq!(identity.email, "jake@jake.jake");
            assert_eq!(identity.username.as_deref(), Some("jake"));
        }
    }

    #[test]
    fn rejections_render_under_token_field() {
        let err = ApiError::from(GateError::MissingToken);
        assert_eq!(err.status(), Status::Unauthorized);
        match err {
            ApiError::Unauthorized(errors) => {
                assert_eq!(errors.messages("token").unwrap(), &["Missing token".to_string()])
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
