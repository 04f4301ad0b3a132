//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The session holds a cart token; the cart itself is loaded from storage,
//! mutated, and saved within a single request.
//!
//! Requests without the `HX-Request` header are plain form posts and get a
//! redirect to the cart page instead of a fragment.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use shopfront_core::cart::{CartState, LineItem, Notice};
use shopfront_core::{CurrencyCode, Price, ProductId, VariantSelection};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::htmx::{HxTrigger, is_htmx_request};
use crate::middleware::CartSession;
use crate::state::AppState;

/// Prefix of form fields carrying variant choices, e.g. `option.size=M`.
pub const OPTION_FIELD_PREFIX: &str = "option.";

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub slug: String,
    pub variant_label: Option<String>,
    /// Selection as `(axis, value)` pairs, for hidden form fields.
    pub options: Vec<(String, String)>,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub stock_limit: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl CartItemView {
    fn new(item: &LineItem, currency: CurrencyCode) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            slug: item.slug.clone(),
            variant_label: item.variant_selection.label(),
            options: item
                .variant_selection
                .iter()
                .map(|(axis, value)| (axis.to_string(), value.to_string()))
                .collect(),
            image_url: item.image_url.clone(),
            quantity: item.quantity,
            stock_limit: item.stock_limit,
            unit_price: format_money(item.unit_price, currency),
            line_total: format_money(item.line_total(), currency),
        }
    }

    /// Whether another unit would exceed the stock ceiling.
    #[must_use]
    pub const fn at_limit(&self) -> bool {
        self.quantity >= self.stock_limit
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u64,
    pub is_open: bool,
}

impl CartView {
    #[must_use]
    pub fn new(state: &CartState, currency: CurrencyCode) -> Self {
        Self {
            items: state
                .items
                .iter()
                .map(|item| CartItemView::new(item, currency))
                .collect(),
            total: format_money(state.total(), currency),
            item_count: state.item_count(),
            is_open: state.is_open,
        }
    }

    /// Create an empty cart.
    #[must_use]
    pub fn empty(currency: CurrencyCode) -> Self {
        Self::new(&CartState::default(), currency)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Format an amount in the storefront currency, e.g. `$19.99`.
#[must_use]
pub fn format_money(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).display()
}

// =============================================================================
// Form Parsing
// =============================================================================

/// A cart form identifying one line, plus an optional quantity.
///
/// Parsed from raw pairs because variant fields are open-ended
/// (`option.<axis>`). Empty option values are treated as not chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineForm {
    pub product_id: ProductId,
    pub selection: VariantSelection,
    pub quantity: Option<i64>,
}

impl LineForm {
    /// Parse urlencoded form pairs.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if `product_id` is missing or the
    /// quantity is not an integer.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self> {
        let mut product_id = None;
        let mut selection = VariantSelection::new();
        let mut quantity = None;

        for (name, value) in pairs {
            if let Some(axis) = name.strip_prefix(OPTION_FIELD_PREFIX) {
                if !axis.is_empty() && !value.is_empty() {
                    selection.insert(axis, value);
                }
                continue;
            }

            match name.as_str() {
                "product_id" => product_id = Some(value),
                "quantity" => {
                    let parsed = value.trim().parse::<i64>().map_err(|_| {
                        AppError::BadRequest(format!("invalid quantity: {value}"))
                    })?;
                    quantity = Some(parsed);
                }
                _ => {}
            }
        }

        let product_id = product_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("missing product_id".to_string()))?;

        Ok(Self {
            product_id: ProductId::new(product_id),
            selection,
            quantity,
        })
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub drawer: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart drawer fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_drawer.html")]
pub struct CartDrawerTemplate {
    pub drawer: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// JSON cart summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<LineItem>,
    pub item_count: u64,
    pub total: Decimal,
    pub currency: &'static str,
    pub is_open: bool,
}

// =============================================================================
// Helpers
// =============================================================================

/// Render the browser's cart, or an empty one if it has none yet.
pub(crate) async fn current_cart(
    state: &AppState,
    cart_session: &CartSession,
) -> Result<CartView> {
    let currency = state.config().cart.currency;
    match cart_session.cart_key() {
        Some(key) => {
            state
                .with_cart(&key, &mut Vec::new(), move |cart| {
                    Ok(CartView::new(cart.state(), currency))
                })
                .await
        }
        None => Ok(CartView::empty(currency)),
    }
}

/// Build the response for a cart mutation.
fn cart_response(
    headers: &HeaderMap,
    view: &CartView,
    notices: &[Notice],
    fragment: impl IntoResponse,
) -> Response {
    if !is_htmx_request(headers) {
        return Redirect::to("/cart").into_response();
    }

    let mut response = fragment.into_response();
    HxTrigger::new()
        .cart_updated(view.item_count, &view.total)
        .toast_from(notices)
        .apply(response.headers_mut());
    response
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, cart_session))]
pub async fn show(State(state): State<AppState>, cart_session: CartSession) -> Result<CartShowTemplate> {
    let cart = current_cart(&state, &cart_session).await?;
    Ok(CartShowTemplate {
        drawer: cart.clone(),
        cart,
    })
}

/// Add one unit of a product to the cart (HTMX).
///
/// The product is fetched from the catalog first and its price and stock are
/// snapshotted into the line.
#[instrument(skip(state, cart_session, headers, pairs))]
pub async fn add(
    State(state): State<AppState>,
    mut cart_session: CartSession,
    headers: HeaderMap,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = LineForm::from_pairs(pairs)?;
    let product = state.catalog().get_product(&form.product_id).await?;
    let candidate = product.candidate(form.selection)?;
    let key = cart_session.ensure_cart_key().await?;

    add_breadcrumb(
        "cart",
        "Add to cart",
        Some(&[("product_id", form.product_id.as_str())]),
    );

    let currency = state.config().cart.currency;
    let mut notices = Vec::new();
    let (outcome, view) = state
        .with_cart(&key, &mut notices, move |cart| {
            let outcome = cart.add_item(candidate)?;
            Ok((outcome, CartView::new(cart.state(), currency)))
        })
        .await?;

    tracing::info!(
        cart_key = %key,
        product_id = %form.product_id,
        ?outcome,
        item_count = view.item_count,
        "Add to cart"
    );

    let count = view.item_count;
    Ok(cart_response(
        &headers,
        &view,
        &notices,
        CartCountTemplate { count },
    ))
}

/// Set the quantity of a cart line (HTMX).
///
/// A quantity of zero or less removes the line.
#[instrument(skip(state, cart_session, headers, pairs))]
pub async fn update(
    State(state): State<AppState>,
    cart_session: CartSession,
    headers: HeaderMap,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = LineForm::from_pairs(pairs)?;
    let quantity = form
        .quantity
        .ok_or_else(|| AppError::BadRequest("missing quantity".to_string()))?;

    let currency = state.config().cart.currency;
    let mut notices = Vec::new();
    let view = match cart_session.cart_key() {
        Some(key) => {
            let LineForm {
                product_id,
                selection,
                ..
            } = form;
            let line_id = product_id.clone();
            let (outcome, view) = state
                .with_cart(&key, &mut notices, move |cart| {
                    let outcome = cart.update_quantity(&line_id, &selection, quantity)?;
                    Ok((outcome, CartView::new(cart.state(), currency)))
                })
                .await?;
            tracing::info!(cart_key = %key, %product_id, ?outcome, "Update quantity");
            view
        }
        None => CartView::empty(currency),
    };

    Ok(cart_response(
        &headers,
        &view,
        &notices,
        CartItemsTemplate { cart: view.clone() },
    ))
}

/// Remove a cart line (HTMX).
#[instrument(skip(state, cart_session, headers, pairs))]
pub async fn remove(
    State(state): State<AppState>,
    cart_session: CartSession,
    headers: HeaderMap,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = LineForm::from_pairs(pairs)?;

    let currency = state.config().cart.currency;
    let mut notices = Vec::new();
    let view = match cart_session.cart_key() {
        Some(key) => {
            let LineForm {
                product_id,
                selection,
                ..
            } = form;
            let line_id = product_id.clone();
            let (outcome, view) = state
                .with_cart(&key, &mut notices, move |cart| {
                    let outcome = cart.remove_item(&line_id, &selection)?;
                    Ok((outcome, CartView::new(cart.state(), currency)))
                })
                .await?;
            tracing::info!(cart_key = %key, %product_id, ?outcome, "Remove from cart");
            view
        }
        None => CartView::empty(currency),
    };

    Ok(cart_response(
        &headers,
        &view,
        &notices,
        CartItemsTemplate { cart: view.clone() },
    ))
}

/// Empty the cart (HTMX).
#[instrument(skip(state, cart_session, headers))]
pub async fn clear(
    State(state): State<AppState>,
    cart_session: CartSession,
    headers: HeaderMap,
) -> Result<Response> {
    let currency = state.config().cart.currency;
    let mut notices = Vec::new();
    let view = match cart_session.cart_key() {
        Some(key) => {
            let view = state
                .with_cart(&key, &mut notices, move |cart| {
                    cart.clear()?;
                    Ok(CartView::new(cart.state(), currency))
                })
                .await?;
            tracing::info!(cart_key = %key, "Cart cleared");
            view
        }
        None => CartView::empty(currency),
    };

    Ok(cart_response(
        &headers,
        &view,
        &notices,
        CartItemsTemplate { cart: view.clone() },
    ))
}

/// Show the cart drawer (HTMX).
#[instrument(skip(state, cart_session, headers))]
pub async fn open(
    State(state): State<AppState>,
    cart_session: CartSession,
    headers: HeaderMap,
) -> Result<Response> {
    set_drawer(&state, cart_session, &headers, true).await
}

/// Hide the cart drawer (HTMX).
#[instrument(skip(state, cart_session, headers))]
pub async fn close(
    State(state): State<AppState>,
    cart_session: CartSession,
    headers: HeaderMap,
) -> Result<Response> {
    set_drawer(&state, cart_session, &headers, false).await
}

async fn set_drawer(
    state: &AppState,
    mut cart_session: CartSession,
    headers: &HeaderMap,
    is_open: bool,
) -> Result<Response> {
    let key = cart_session.ensure_cart_key().await?;
    let currency = state.config().cart.currency;
    let view = state
        .with_cart(&key, &mut Vec::new(), move |cart| {
            if is_open {
                cart.open_cart()?;
            } else {
                cart.close_cart()?;
            }
            Ok(CartView::new(cart.state(), currency))
        })
        .await?;

    if !is_htmx_request(headers) {
        return Ok(Redirect::to("/cart").into_response());
    }
    Ok(CartDrawerTemplate { drawer: view }.into_response())
}

/// Get the cart drawer in its persisted state (HTMX).
#[instrument(skip(state, cart_session))]
pub async fn drawer(
    State(state): State<AppState>,
    cart_session: CartSession,
) -> Result<CartDrawerTemplate> {
    let drawer = current_cart(&state, &cart_session).await?;
    Ok(CartDrawerTemplate { drawer })
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, cart_session))]
pub async fn count(
    State(state): State<AppState>,
    cart_session: CartSession,
) -> Result<CartCountTemplate> {
    let count = current_cart(&state, &cart_session).await?.item_count;
    Ok(CartCountTemplate { count })
}

/// JSON summary of the cart.
#[instrument(skip(state, cart_session))]
pub async fn api_cart(
    State(state): State<AppState>,
    cart_session: CartSession,
) -> Result<Json<CartSummary>> {
    let currency = state.config().cart.currency;
    let summarize = move |cart_state: &CartState| CartSummary {
        items: cart_state.items.clone(),
        item_count: cart_state.item_count(),
        total: cart_state.total(),
        currency: currency.code(),
        is_open: cart_state.is_open,
    };

    let summary = match cart_session.cart_key() {
        Some(key) => {
            state
                .with_cart(&key, &mut Vec::new(), move |cart| Ok(summarize(cart.state())))
                .await?
        }
        None => summarize(&CartState::default()),
    };
    Ok(Json(summary))
}
