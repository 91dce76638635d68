//! Order endpoints: checkout, history, cancellation and tracking.

use sheshape_core::OrderId;
use tracing::{info, instrument};

use super::SortDirection;
use crate::api::{ApiClient, ApiError};
use crate::types::{CheckoutRequest, Order, Page};

/// Default page size of the order history.
const DEFAULT_PAGE_SIZE: u32 = 10;

/// Paging and sorting for `GET /api/orders/my-orders`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    /// Zero-based page index.
    pub page: u32,
    pub size: u32,
    pub sort_by: String,
    pub direction: SortDirection,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: "createdAt".to_string(),
            direction: SortDirection::Desc,
        }
    }
}

impl OrderQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("size", self.size.max(1).to_string()),
            ("sortBy", self.sort_by.clone()),
            ("direction", self.direction.as_str().to_string()),
        ]
    }
}

/// Typed access to `/api/orders`.
#[derive(Debug, Clone)]
pub struct OrderService {
    api: ApiClient,
}

impl OrderService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Turn the current cart into an order.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the backend rejects the checkout.
    #[instrument(skip(self, request), fields(payment_method = %request.payment_method))]
    pub async fn checkout(&self, request: &CheckoutRequest) -> Result<Order, ApiError> {
        let order: Order = self.api.post("/api/orders/checkout", request).await?;
        info!(order_number = %order.order_number, "Order placed");
        Ok(order)
    }

    /// One page of the user's order history.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&self, query: &OrderQuery) -> Result<Page<Order>, ApiError> {
        self.api
            .get_query("/api/orders/my-orders", &query.to_pairs())
            .await
    }

    /// The user's `limit` most recent orders.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self))]
    pub async fn recent_orders(&self, limit: u32) -> Result<Vec<Order>, ApiError> {
        self.api
            .get_query(
                "/api/orders/my-orders/recent",
                &[("limit", limit.max(1).to_string())],
            )
            .await
    }

    /// A single order by id.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`]; an unknown id is [`ErrorKind::NotFound`](crate::api::ErrorKind::NotFound).
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ApiError> {
        self.api.get(&format!("/api/orders/{id}")).await
    }

    /// Cancel an order. Without a reason the backend records
    /// "Cancelled by customer".
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the order cannot be cancelled.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(&self, id: OrderId, reason: Option<&str>) -> Result<Order, ApiError> {
        let query: Vec<(&str, String)> = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| vec![("reason", r.to_string())])
            .unwrap_or_default();
        let order: Order = self
            .api
            .put_query(&format!("/api/orders/{id}/cancel"), &query)
            .await?;
        info!(order_number = %order.order_number, status = %order.status, "Order cancelled");
        Ok(order)
    }

    /// Look an order up by its public order number.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`]; an unknown number is [`ErrorKind::NotFound`](crate::api::ErrorKind::NotFound).
    #[instrument(skip(self))]
    pub async fn track_order(&self, order_number: &str) -> Result<Order, ApiError> {
        let order_number = order_number.trim();
        if order_number.is_empty() {
            return Err(ApiError::invalid_request("Order number is required"));
        }
        self.api
            .get(&format!(
                "/api/orders/number/{}",
                urlencoding::encode(order_number)
            ))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_matches_backend_defaults() {
        let pairs = OrderQuery::default().to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page", "0".to_string()),
                ("size", "10".to_string()),
                ("sortBy", "createdAt".to_string()),
                ("direction", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        let query = OrderQuery {
            size: 0,
            ..OrderQuery::default()
        };
        assert!(query.to_pairs().contains(&("size", "1".to_string())));
    }
}
