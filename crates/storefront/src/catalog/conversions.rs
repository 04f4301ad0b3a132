//! Conversions from catalog products to cart candidates.

use shopfront_core::VariantSelection;
use shopfront_core::cart::ItemCandidate;
use thiserror::Error;

use super::types::Product;

/// A variant selection that does not fit the product's option axes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// An axis the product defines was not chosen.
    #[error("please choose a {0}")]
    MissingOption(String),

    /// The selection names an axis the product does not have.
    #[error("unknown option: {0}")]
    UnknownOption(String),

    /// The chosen value is not offered for that axis.
    #[error("{value} is not available for {option}")]
    InvalidValue { option: String, value: String },
}

impl Product {
    /// Check that `selection` picks exactly one offered value per axis.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, checking the product's axes in order.
    pub fn validate_selection(&self, selection: &VariantSelection) -> Result<(), SelectionError> {
        for option in &self.variants {
            let Some(value) = selection.get(&option.name) else {
                return Err(SelectionError::MissingOption(option.name.clone()));
            };
            if !option.values.iter().any(|v| v == value) {
                return Err(SelectionError::InvalidValue {
                    option: option.name.clone(),
                    value: value.to_string(),
                });
            }
        }

        if let Some((axis, _)) = selection
            .iter()
            .find(|(axis, _)| !self.variants.iter().any(|o| o.name == *axis))
        {
            return Err(SelectionError::UnknownOption(axis.to_string()));
        }

        Ok(())
    }

    /// Snapshot this product as a cart candidate for `selection`.
    ///
    /// Price, stock, and display fields are copied as they are now; the cart
    /// never re-fetches them.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] if the selection does not fit the product.
    pub fn candidate(&self, selection: VariantSelection) -> Result<ItemCandidate, SelectionError> {
        self.validate_selection(&selection)?;

        Ok(ItemCandidate {
            product_id: self.id.clone(),
            variant_selection: selection,
            name: self.name.clone(),
            slug: self.slug.clone(),
            image_url: self.featured_image().map(|image| image.url.clone()),
            unit_price: self.price,
            stock_limit: self.stock,
        })
    }
}
