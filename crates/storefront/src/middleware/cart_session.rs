//! Cart session extractor.
//!
//! Ties a browser session to the key of its persisted cart.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::models::{CartToken, OrderConfirmation, session_keys};

/// Extractor giving access to the browser's cart token and last order.
///
/// The token is created lazily: read-only pages never write to the session,
/// so browsing does not mint carts.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(cart_session: CartSession) -> Result<String, AppError> {
///     let key = cart_session.ensure_cart_key().await?;
///     Ok(key)
/// }
/// ```
#[derive(Clone)]
pub struct CartSession {
    session: Session,
    token: Option<CartToken>,
}

/// Error returned when the session layer is missing.
#[derive(Debug)]
pub struct CartSessionRejection;

impl IntoResponse for CartSessionRejection {
    fn into_response(self) -> Response {
        tracing::error!("CartSession used without a session layer");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = CartSessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(CartSessionRejection)?;

        let token = session
            .get::<CartToken>(session_keys::CART_TOKEN)
            .await
            .ok()
            .flatten();

        Ok(Self { session, token })
    }
}

impl CartSession {
    /// Storage key of the existing cart, if this browser has one.
    #[must_use]
    pub fn cart_key(&self) -> Option<String> {
        self.token.as_ref().map(CartToken::storage_key)
    }

    /// Storage key of this browser's cart, minting a token on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn ensure_cart_key(&mut self) -> Result<String, tower_sessions::session::Error> {
        if let Some(token) = &self.token {
            return Ok(token.storage_key());
        }

        let token = CartToken::generate();
        self.session.insert(session_keys::CART_TOKEN, token).await?;
        tracing::debug!(cart_key = %token.storage_key(), "Created cart token");
        self.token = Some(token);
        Ok(token.storage_key())
    }

    /// Remember the confirmation for the order just placed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_last_order(
        &self,
        confirmation: &OrderConfirmation,
    ) -> Result<(), tower_sessions::session::Error> {
        self.session
            .insert(session_keys::LAST_ORDER, confirmation)
            .await
    }

    /// The most recent order placed in this session.
    pub async fn last_order(&self) -> Option<OrderConfirmation> {
        self.session
            .get(session_keys::LAST_ORDER)
            .await
            .ok()
            .flatten()
    }
}
