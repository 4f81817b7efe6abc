//! Order endpoints.

use gaojie_core::OrderNumber;
use tracing::instrument;

use super::types::{
    CreateOrderRequest, CreatedOrder, CreatedOrderEnvelope, Order, OrderEnvelope, OrderList,
};
use super::{ApiClient, ApiError, BackendCredential};

impl ApiClient {
    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the order or the request fails.
    #[instrument(skip(self, request, credential), fields(items = request.items.len()))]
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
        credential: Option<&BackendCredential>,
    ) -> Result<CreatedOrder, ApiError> {
        let url = self.endpoint(&["orders", "create"])?;
        let envelope: CreatedOrderEnvelope = self
            .execute(self.inner.client.post(url).json(request), credential)
            .await?;

        tracing::info!(order_number = %envelope.order.order_number, "Order created");
        Ok(envelope.order)
    }

    /// Look up an order by its public number.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown number, or an error if
    /// the request fails.
    #[instrument(skip(self, credential), fields(order_number = %number))]
    pub async fn order_by_number(
        &self,
        number: &OrderNumber,
        credential: Option<&BackendCredential>,
    ) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders", "by-number", number.as_str()])?;
        let envelope: OrderEnvelope = self.execute(self.inner.client.get(url), credential).await?;
        Ok(envelope.order)
    }

    /// The signed-in user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] without a valid credential, or an
    /// error if the request fails.
    #[instrument(skip(self, credential))]
    pub async fn my_orders(
        &self,
        page: u32,
        per_page: u32,
        credential: &BackendCredential,
    ) -> Result<OrderList, ApiError> {
        let mut url = self.endpoint(&["orders", "my-orders"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());

        self.execute(self.inner.client.get(url), Some(credential))
            .await
    }
}
