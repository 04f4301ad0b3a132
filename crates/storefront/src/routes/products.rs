//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use shopfront_core::{CurrencyCode, ProductId};
use tracing::instrument;

use crate::catalog::Product;
use crate::error::Result;
use crate::middleware::CartSession;
use crate::routes::cart::{CartView, OPTION_FIELD_PREFIX, current_cart, format_money};
use crate::state::AppState;

/// Product card data for the listing page.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub image: Option<ImageView>,
    pub in_stock: bool,
}

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

/// One option axis rendered as a select box.
#[derive(Clone)]
pub struct OptionView {
    pub name: String,
    /// Form field name, `option.<axis>`.
    pub field: String,
    pub values: Vec<String>,
}

/// Product detail data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub images: Vec<ImageView>,
    pub options: Vec<OptionView>,
    pub stock: u32,
}

impl ProductView {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

fn images_of(product: &Product) -> Vec<ImageView> {
    product
        .images
        .iter()
        .map(|image| ImageView {
            url: image.url.clone(),
            alt: image.alt.clone().unwrap_or_else(|| product.name.clone()),
        })
        .collect()
}

impl ProductCardView {
    fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: format_money(product.price, currency),
            compare_at_price: product
                .compare_at_price
                .map(|amount| format_money(amount, currency)),
            image: images_of(product).into_iter().next(),
            in_stock: product.in_stock(),
        }
    }
}

impl ProductView {
    fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: format_money(product.price, currency),
            compare_at_price: product
                .compare_at_price
                .map(|amount| format_money(amount, currency)),
            images: images_of(product),
            options: product
                .variants
                .iter()
                .map(|option| OptionView {
                    name: option.name.clone(),
                    field: format!("{OPTION_FIELD_PREFIX}{}", option.name),
                    values: option.values.clone(),
                })
                .collect(),
            stock: product.stock,
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub drawer: CartView,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub drawer: CartView,
}

/// Display product listing page.
#[instrument(skip(state, cart_session))]
pub async fn index(
    State(state): State<AppState>,
    cart_session: CartSession,
) -> Result<ProductsIndexTemplate> {
    let currency = state.config().cart.currency;
    let products = state
        .catalog()
        .list_products()
        .await?
        .iter()
        .map(|product| ProductCardView::new(product, currency))
        .collect();

    Ok(ProductsIndexTemplate {
        products,
        drawer: current_cart(&state, &cart_session).await?,
    })
}

/// Display product detail page.
#[instrument(skip(state, cart_session), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    cart_session: CartSession,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate> {
    let product = state.catalog().get_product(&ProductId::new(id)).await?;
    Ok(ProductShowTemplate {
        product: ProductView::new(&product, state.config().cart.currency),
        drawer: current_cart(&state, &cart_session).await?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::{ProductImage, VariantOption};

    fn tee() -> Product {
        Product {
            id: ProductId::new("P1"),
            slug: "tee".to_string(),
            name: "Tee".to_string(),
            description: Some("Soft".to_string()),
            price: Decimal::new(2400, 2),
            compare_at_price: Some(Decimal::new(3000, 2)),
            stock: 0,
            images: vec![ProductImage {
                url: "https://cdn.example.com/tee.jpg".to_string(),
                alt: None,
            }],
            variants: vec![VariantOption {
                name: "size".to_string(),
                values: vec!["S".to_string(), "M".to_string()],
            }],
        }
    }

    #[test]
    fn test_product_view() {
        let view = ProductView::new(&tee(), CurrencyCode::USD);
        assert_eq!(view.price, "$24.00");
        assert_eq!(view.compare_at_price.as_deref(), Some("$30.00"));
        assert_eq!(view.options[0].field, "option.size");
        assert_eq!(view.images[0].alt, "Tee");
        assert!(!view.in_stock());
    }

    #[test]
    fn test_product_card_view() {
        let card = ProductCardView::new(&tee(), CurrencyCode::GBP);
        assert!(card.price.ends_with("24.00"));
        assert!(!card.in_stock);
        assert!(card.image.is_some());
    }
}
