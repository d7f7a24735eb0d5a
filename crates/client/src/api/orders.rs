//! Order endpoints.

use reqwest::Method;
use tracing::{debug, instrument};

use cropcare_core::{Order, OrderId};

use super::conversions::{convert_order, convert_orders};
use super::{ApiClient, ApiOrder, CreateOrderRequest, Endpoint};
use crate::error::Result;

const LIST_ORDERS: Endpoint = Endpoint::authenticated("fetch orders");
const GET_ORDER: Endpoint =
    Endpoint::authenticated("fetch order").with_not_found("Order not found");
const CREATE_ORDER: Endpoint =
    Endpoint::authenticated("create order").with_bad_request("Cart is empty");

impl ApiClient {
    /// List the current user's orders, newest first as the backend sends them.
    ///
    /// A body that is not a JSON array yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        let builder = self.request(Method::GET, "/orders", true).await;
        let response = self.send(builder, &LIST_ORDERS).await?;
        let orders: Vec<ApiOrder> = Self::decode_list(response).await?;
        debug!(count = orders.len(), "Fetched orders");
        Ok(convert_orders(orders))
    }

    /// Get a single order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound("Order not found")` on a 404, or another
    /// error if the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order> {
        let path = format!("/orders/{}", urlencoding::encode(id.as_str()));
        let builder = self.request(Method::GET, &path, true).await;
        let response = self.send(builder, &GET_ORDER).await?;
        let order: ApiOrder = Self::decode(response).await?;
        Ok(convert_order(order))
    }

    /// Create an order from the current cart.
    ///
    /// The backend empties the cart and pays by cash on delivery.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::BadRequest` on a 400 (the body's `detail`, or
    /// "Cart is empty"), or another error if the request fails.
    #[instrument(skip(self, address))]
    pub async fn create_order(&self, address: &str) -> Result<Order> {
        let builder = self
            .json_request(Method::POST, "/orders", true)
            .await
            .json(&CreateOrderRequest { address });
        let response = self.send(builder, &CREATE_ORDER).await?;
        let order: ApiOrder = Self::decode(response).await?;
        Ok(convert_order(order))
    }
}
