use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{errors::AppError, AppState};

/// Guards the MCP route; a server started without a token accepts every caller.
pub async fn require_bearer_token(
    State(state): State<AppState>,
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = auth_header
        .as_ref()
        .map(|TypedHeader(auth)| auth.token());
    authorize(state.api_token.as_deref(), presented)?;

    Ok(next.run(request).await)
}

fn authorize(expected: Option<&str>, presented: Option<&str>) -> Result<(), AppError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    match presented {
        None => Err(AppError::unauthorized(
            "missing_token",
            "missing authorization header",
        )),
        Some(token) if token != expected => Err(AppError::unauthorized(
            "invalid_token",
            "invalid bearer token",
        )),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::authorize;
    use crate::errors::AppError;

    #[test]
    fn no_configured_token_allows_anonymous_callers() {
        assert!(authorize(None, None).is_ok());
        assert!(authorize(None, Some("anything")).is_ok());
    }

    #[test]
    fn configured_token_must_match() {
        assert!(authorize(Some("secret"), Some("secret")).is_ok());
        assert!(matches!(
            authorize(Some("secret"), Some("other")),
            Err(AppError::Unauthorized { code: "invalid_token", .. })
        ));
        assert!(matches!(
            authorize(Some("secret"), None),
            Err(AppError::Unauthorized { code: "missing_token", .. })
        ));
    }
}
