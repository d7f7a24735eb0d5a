//! Product catalog endpoints.

use reqwest::Method;
use tracing::{debug, instrument};

use cropcare_core::{Product, ProductId};

use super::{ApiClient, Endpoint};
use crate::error::Result;

const LIST_PRODUCTS: Endpoint = Endpoint::authenticated("fetch products");
const GET_PRODUCT: Endpoint =
    Endpoint::authenticated("fetch product").with_not_found("Product not found");

impl ApiClient {
    /// List every product.
    ///
    /// Always hits the backend; the fetched products also refresh the
    /// single-product cache. A body that is not a JSON array yields an empty
    /// list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend answers with a
    /// non-success status.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let builder = self.request(Method::GET, "/products", true).await;
        let response = self.send(builder, &LIST_PRODUCTS).await?;
        let products: Vec<Product> = Self::decode_list(response).await?;

        for product in &products {
            self.inner
                .products
                .insert(product.id.clone(), product.clone())
                .await;
        }

        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound("Product not found")` on a 404, or another
    /// error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product> {
        if let Some(product) = self.inner.products.get(id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let path = format!("/products/{}", urlencoding::encode(id.as_str()));
        let builder = self.request(Method::GET, &path, true).await;
        let response = self.send(builder, &GET_PRODUCT).await?;
        let product: Product = Self::decode(response).await?;

        self.inner
            .products
            .insert(id.clone(), product.clone())
            .await;

        Ok(product)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, id: &ProductId) {
        self.inner.products.invalidate(id).await;
    }

    /// Invalidate every cached product.
    pub async fn invalidate_all(&self) {
        self.inner.products.invalidate_all();
        self.inner.products.run_pending_tasks().await;
    }
}
