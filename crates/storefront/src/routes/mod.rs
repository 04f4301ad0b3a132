//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to /products
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (cart storage writable)
//!
//! # Products
//! GET  /products               - Product listing
//! GET  /products/{id}          - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Clear cart (returns cart_items fragment)
//! POST /cart/open              - Show drawer (returns cart_drawer fragment)
//! POST /cart/close             - Hide drawer (returns cart_drawer fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart/drawer            - Cart drawer in its persisted state (fragment)
//! GET  /api/cart               - Cart summary (JSON)
//!
//! # Checkout
//! GET  /checkout               - Checkout form
//! POST /checkout               - Place simulated order
//! GET  /checkout/confirmation  - Last order confirmation
//! ```

pub mod cart;
pub mod checkout;
pub mod health;
pub mod products;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/open", post(cart::open))
        .route("/close", post(cart::close))
        .route("/count", get(cart::count))
        .route("/drawer", get(cart::drawer))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::submit))
        .route("/confirmation", get(checkout::confirmation))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/api/cart", get(cart::api_cart))
        .nest("/checkout", checkout_routes())
}
