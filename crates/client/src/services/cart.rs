//! Cart endpoints.

use sheshape_core::ProductId;
use tracing::{debug, instrument};

use crate::api::{ApiClient, ApiError};
use crate::types::{AddItemRequest, Cart, CartCount, CartValidation, UpdateQuantityRequest};

/// Typed access to `/api/cart`.
#[derive(Debug, Clone)]
pub struct CartService {
    api: ApiClient,
}

impl CartService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch the user's cart. A user without a cart yet (404) gets `None`.
    ///
    /// # Errors
    ///
    /// Returns any other [`ApiError`] unchanged.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Option<Cart>, ApiError> {
        match self.api.get::<Cart>("/api/cart").await {
            Ok(cart) => Ok(Some(cart)),
            Err(e) if e.is_not_found() => {
                debug!("No cart exists for user");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Add `quantity` units of a product, creating the cart if needed.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<Cart, ApiError> {
        self.api
            .post(
                "/api/cart/items",
                &AddItemRequest {
                    product_id,
                    quantity,
                },
            )
            .await
    }

    /// Set the quantity of a line. Zero or less removes the line instead.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Cart, ApiError> {
        if quantity <= 0 {
            return self.remove_item(product_id).await;
        }
        self.api
            .put(
                &format!("/api/cart/items/{product_id}"),
                &UpdateQuantityRequest {
                    quantity: quantity.unsigned_abs(),
                },
            )
            .await
    }

    /// Remove a line and return the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: ProductId) -> Result<Cart, ApiError> {
        self.api
            .delete(&format!("/api/cart/items/{product_id}"))
            .await
    }

    /// Delete every line of the cart.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        self.api.delete_unit("/api/cart").await
    }

    /// Ask the server whether every line is still purchasable.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self))]
    pub async fn validate_cart(&self) -> Result<bool, ApiError> {
        let validation: CartValidation = self.api.get("/api/cart/validate").await?;
        Ok(validation.valid)
    }

    /// Number of units in the cart, without fetching the lines.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self))]
    pub async fn item_count(&self) -> Result<u32, ApiError> {
        let count: CartCount = self.api.get("/api/cart/count").await?;
        Ok(count.count)
    }
}
