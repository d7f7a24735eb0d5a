//! Cart endpoints.
//!
//! The cart lives on the backend. Mutations only report success or failure;
//! whatever body the backend sends back is not read, so callers reload the
//! cart with [`ApiClient::get_cart`].

use reqwest::Method;
use tracing::instrument;

use cropcare_core::{ProductId, Quantity};

use super::{AddToCartRequest, ApiCart, ApiClient, Endpoint};
use crate::error::Result;

const GET_CART: Endpoint = Endpoint::authenticated("fetch cart");
const ADD_TO_CART: Endpoint =
    Endpoint::authenticated("add to cart").with_not_found("Product not found");
const UPDATE_CART_ITEM: Endpoint = Endpoint::authenticated("update cart item");
const REMOVE_FROM_CART: Endpoint = Endpoint::authenticated("remove from cart");
const CLEAR_CART: Endpoint = Endpoint::authenticated("clear cart");

impl ApiClient {
    /// Get the current user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<ApiCart> {
        let builder = self.request(Method::GET, "/cart", true).await;
        let response = self.send(builder, &GET_CART).await?;
        Self::decode(response).await
    }

    /// Add units of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound("Product not found")` on a 404, or another
    /// error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id, quantity = %quantity))]
    pub async fn add_to_cart(&self, product_id: &ProductId, quantity: Quantity) -> Result<()> {
        let body = AddToCartRequest {
            product_id,
            quantity: quantity.get(),
        };
        let builder = self
            .json_request(Method::POST, "/cart/items", true)
            .await
            .json(&body);
        self.send(builder, &ADD_TO_CART).await?;
        Ok(())
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id, quantity = %quantity))]
    pub async fn update_cart_item(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<()> {
        let path = format!(
            "/cart/items/{}?quantity={}",
            urlencoding::encode(product_id.as_str()),
            quantity.get()
        );
        let builder = self.request(Method::PUT, &path, true).await;
        self.send(builder, &UPDATE_CART_ITEM).await?;
        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_cart(&self, product_id: &ProductId) -> Result<()> {
        let path = format!("/cart/items/{}", urlencoding::encode(product_id.as_str()));
        let builder = self.request(Method::DELETE, &path, true).await;
        self.send(builder, &REMOVE_FROM_CART).await?;
        Ok(())
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        let builder = self.request(Method::DELETE, "/cart", true).await;
        self.send(builder, &CLEAR_CART).await?;
        Ok(())
    }
}
