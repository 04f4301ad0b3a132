//! Checkout route handlers.
//!
//! Checkout is simulated: the form is validated, payment "takes" the
//! configured delay, and the cart is cleared. Nothing is charged and no order
//! is stored beyond the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopfront_core::CurrencyCode;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::CartSession;
use crate::models::OrderConfirmation;
use crate::routes::cart::{CartView, current_cart, format_money};
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub card_number: String,
}

impl CheckoutForm {
    /// Problems with the submitted form, in field order. Empty if valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !is_plausible_email(self.email.trim()) {
            errors.push("Enter a valid email address".to_string());
        }
        for (value, label) in [
            (&self.full_name, "Full name"),
            (&self.address, "Address"),
            (&self.city, "City"),
            (&self.postal_code, "Postal code"),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{label} is required"));
            }
        }
        if !is_valid_card_number(&self.card_number) {
            errors.push("Enter a valid card number".to_string());
        }

        errors
    }
}

fn is_plausible_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        })
}

/// 12 to 19 digits (spaces and dashes allowed) passing the Luhn check.
fn is_valid_card_number(raw: &str) -> bool {
    let digits: Option<Vec<u32>> = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .map(|c| c.to_digit(10))
        .collect();
    let Some(digits) = digits else {
        return false;
    };
    if !(12..=19).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Confirmed line display data.
#[derive(Clone)]
pub struct ConfirmedLineView {
    pub name: String,
    pub variant_label: Option<String>,
    pub quantity: u32,
    pub line_total: String,
}

/// Order confirmation display data.
#[derive(Clone)]
pub struct ConfirmationView {
    pub order_number: String,
    pub email: String,
    pub lines: Vec<ConfirmedLineView>,
    pub total: String,
    pub placed_at: String,
}

impl ConfirmationView {
    fn new(order: &OrderConfirmation, currency: CurrencyCode) -> Self {
        Self {
            order_number: order.order_number.to_string(),
            email: order.email.clone(),
            lines: order
                .lines
                .iter()
                .map(|line| ConfirmedLineView {
                    name: line.name.clone(),
                    variant_label: line.variant_selection.label(),
                    quantity: line.quantity,
                    line_total: format_money(line.line_total, currency),
                })
                .collect(),
            total: format_money(order.total, currency),
            placed_at: order.placed_at.format("%B %-d, %Y %H:%M UTC").to_string(),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub drawer: CartView,
    pub form: CheckoutForm,
    pub errors: Vec<String>,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub order: ConfirmationView,
    pub drawer: CartView,
}

/// Display the checkout form, or send the shopper back to an empty cart.
#[instrument(skip(state, cart_session))]
pub async fn show(State(state): State<AppState>, cart_session: CartSession) -> Result<Response> {
    let cart = current_cart(&state, &cart_session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok(CheckoutTemplate {
        drawer: cart.clone(),
        cart,
        form: CheckoutForm::default(),
        errors: Vec::new(),
    }
    .into_response())
}

/// Place a simulated order.
#[instrument(skip(state, cart_session, form))]
pub async fn submit(
    State(state): State<AppState>,
    cart_session: CartSession,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let Some(key) = cart_session.cart_key() else {
        return Ok(Redirect::to("/cart").into_response());
    };

    let errors = form.validate();
    if !errors.is_empty() {
        let cart = current_cart(&state, &cart_session).await?;
        if cart.is_empty() {
            return Ok(Redirect::to("/cart").into_response());
        }
        tracing::debug!(error_count = errors.len(), "Checkout form rejected");
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutTemplate {
                drawer: cart.clone(),
                cart,
                form,
                errors,
            },
        )
            .into_response());
    }

    add_breadcrumb("checkout", "Payment started", None);
    tokio::time::sleep(state.config().cart.checkout_delay).await;

    let email = form.email.trim().to_string();
    let order = state
        .with_cart(&key, &mut Vec::new(), move |cart| {
            if cart.is_empty() {
                return Ok(None);
            }
            let order = OrderConfirmation::new(email, cart.items());
            cart.clear()?;
            Ok(Some(order))
        })
        .await?;

    let Some(order) = order else {
        return Ok(Redirect::to("/cart").into_response());
    };

    tracing::info!(
        order_number = %order.order_number,
        cart_key = %key,
        lines = order.lines.len(),
        total = %order.total,
        "Order placed"
    );
    cart_session.set_last_order(&order).await?;

    Ok(Redirect::to("/checkout/confirmation").into_response())
}

/// Display the confirmation for the last order placed in this session.
#[instrument(skip(state, cart_session))]
pub async fn confirmation(
    State(state): State<AppState>,
    cart_session: CartSession,
) -> Result<Response> {
    let Some(order) = cart_session.last_order().await else {
        return Ok(Redirect::to("/products").into_response());
    };

    Ok(ConfirmationTemplate {
        order: ConfirmationView::new(&order, state.config().cart.currency),
        drawer: current_cart(&state, &cart_session).await?,
    }
    .into_response())
}
