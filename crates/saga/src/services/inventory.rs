//! Inventory reservation client.
//!
//! Every call is attempted once and its outcome normalised into success,
//! `ReservationError::Conflict` (inventory refused the transition) or
//! `ReservationError::Unavailable` (transport failure, timeout, unexpected
//! status or malformed body). No reservation state is kept on this side.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use domain::{Money, PriceList, ProductId, RequestedLine, ReservationId};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalised failure of an inventory call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    /// Inventory rejected the request (insufficient stock, reservation not
    /// in the `reserved` state, unknown reservation).
    #[error("{0}")]
    Conflict(String),

    /// Inventory could not be reached or answered with something unusable.
    #[error("{0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for ReservationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ReservationError::Unavailable(format!("inventory timed out: {err}"))
        } else {
            ReservationError::Unavailable(format!("inventory request failed: {err}"))
        }
    }
}

/// A successful reservation.
///
/// Only the id is read from the reply; any other fields inventory sends
/// back (per-item breakdowns and the like) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: ReservationId,
}

/// Trait for inventory operations used by the billing saga.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Reads the current unit price of every product.
    async fn product_prices(&self) -> Result<PriceList, ReservationError>;

    /// Atomically reserves stock for all lines. `request_id` is an
    /// idempotency token unique to this attempt.
    async fn reserve(
        &self,
        request_id: &str,
        items: &[RequestedLine],
    ) -> Result<Reservation, ReservationError>;

    /// Turns a reservation into a permanent stock deduction.
    async fn commit(&self, reservation_id: &ReservationId) -> Result<(), ReservationError>;

    /// Returns reserved stock.
    async fn release(&self, reservation_id: &ReservationId) -> Result<(), ReservationError>;
}

#[async_trait]
impl<T: InventoryService + ?Sized> InventoryService for Arc<T> {
    async fn product_prices(&self) -> Result<PriceList, ReservationError> {
        (**self).product_prices().await
    }

    async fn reserve(
        &self,
        request_id: &str,
        items: &[RequestedLine],
    ) -> Result<Reservation, ReservationError> {
        (**self).reserve(request_id, items).await
    }

    async fn commit(&self, reservation_id: &ReservationId) -> Result<(), ReservationError> {
        (**self).commit(reservation_id).await
    }

    async fn release(&self, reservation_id: &ReservationId) -> Result<(), ReservationError> {
        (**self).release(reservation_id).await
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Connection settings for the inventory service.
#[derive(Debug, Clone)]
pub struct InventoryClientConfig {
    /// Base URL, e.g. `http://inventory-service:8001/inventory`.
    pub base_url: String,
    /// Optional service bearer token sent on every call.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl InventoryClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ProductRecord {
    product_id: ProductId,
    price: Decimal,
}

#[derive(Debug, Serialize)]
struct ReserveBody<'a> {
    request_id: &'a str,
    items: &'a [RequestedLine],
}

#[derive(Debug, Serialize)]
struct ReservationAction<'a> {
    reservation_id: &'a ReservationId,
}

/// Inventory client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpInventoryService {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpInventoryService {
    /// Builds the client. Fails only if the TLS backend cannot be initialised.
    pub fn new(config: InventoryClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn transition(
        &self,
        action: &str,
        reservation_id: &ReservationId,
    ) -> Result<(), ReservationError> {
        let response = self
            .authorize(self.client.post(self.url(action)))
            .json(&ReservationAction { reservation_id })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = error_detail(response).await;
        match status {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::CONFLICT => Err(
                ReservationError::Conflict(format!("{action} {reservation_id} rejected: {detail}")),
            ),
            _ => Err(ReservationError::Unavailable(format!(
                "{action} {reservation_id} returned {status}: {detail}"
            ))),
        }
    }
}

/// Extracts a human readable reason from an error response. Inventory
/// answers `{"detail": "..."}`; anything else is passed through as text.
async fn error_detail(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body)
        && let Some(detail) = value.get("detail").and_then(serde_json::Value::as_str)
    {
        return detail.to_string();
    }
    if body.trim().is_empty() {
        status.to_string()
    } else {
        body
    }
}

#[async_trait]
impl InventoryService for HttpInventoryService {
    #[tracing::instrument(skip(self))]
    async fn product_prices(&self) -> Result<PriceList, ReservationError> {
        let response = self
            .authorize(self.client.get(self.url("products")))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let detail = error_detail(response).await;
            return Err(ReservationError::Unavailable(format!(
                "product list returned {status}: {detail}"
            )));
        }

        let products: Vec<ProductRecord> = response.json().await.map_err(|e| {
            ReservationError::Unavailable(format!("malformed product list: {e}"))
        })?;

        Ok(products
            .into_iter()
            .map(|p| (p.product_id, Money::new(p.price)))
            .collect())
    }

    #[tracing::instrument(skip(self, items), fields(lines = items.len()))]
    async fn reserve(
        &self,
        request_id: &str,
        items: &[RequestedLine],
    ) -> Result<Reservation, ReservationError> {
        let response = self
            .authorize(self.client.post(self.url("reserve")))
            .json(&ReserveBody { request_id, items })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => response.json().await.map_err(|e| {
                ReservationError::Unavailable(format!("malformed reservation: {e}"))
            }),
            StatusCode::CONFLICT => Err(ReservationError::Conflict(error_detail(response).await)),
            status => {
                let detail = error_detail(response).await;
                Err(ReservationError::Unavailable(format!(
                    "reserve returned {status}: {detail}"
                )))
            }
        }
    }

    #[tracing::instrument(skip(self, reservation_id), fields(reservation_id = %reservation_id))]
    async fn commit(&self, reservation_id: &ReservationId) -> Result<(), ReservationError> {
        self.transition("commit", reservation_id).await
    }

    #[tracing::instrument(skip(self, reservation_id), fields(reservation_id = %reservation_id))]
    async fn release(&self, reservation_id: &ReservationId) -> Result<(), ReservationError> {
        self.transition("release", reservation_id).await
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// Lifecycle of a reservation held by the in-memory inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    Reserved,
    Committed,
    Released,
}

#[derive(Debug)]
struct StockedProduct {
    price: Money,
    stock: u32,
}

#[derive(Debug)]
struct HeldReservation {
    lines: Vec<RequestedLine>,
    status: ReservationStatus,
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    products: HashMap<ProductId, StockedProduct>,
    reservations: HashMap<ReservationId, HeldReservation>,
    request_ids: Vec<String>,
    next_id: u32,
    price_calls: usize,
    commit_calls: usize,
    released: Vec<ReservationId>,
    fail_on_prices: bool,
    fail_on_reserve: bool,
    fail_on_commit: bool,
    fail_on_release: bool,
}

/// In-memory inventory service for testing.
///
/// Holds real stock levels so tests can observe that a conflict leaves
/// stock untouched and a release puts it back.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryService {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryService {
    /// Creates a new in-memory inventory service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn with_product(self, product_id: impl Into<ProductId>, price: Money, stock: u32) -> Self {
        self.write()
            .products
            .insert(product_id.into(), StockedProduct { price, stock });
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, InMemoryInventoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryInventoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Changes the quoted price of a known product; unknown ids are ignored.
    pub fn set_price(&self, product_id: &str, price: Money) {
        if let Some(product) = self.write().products.get_mut(&ProductId::new(product_id)) {
            product.price = price;
        }
    }

    pub fn set_fail_on_prices(&self, fail: bool) {
        self.write().fail_on_prices = fail;
    }

    pub fn set_fail_on_reserve(&self, fail: bool) {
        self.write().fail_on_reserve = fail;
    }

    pub fn set_fail_on_commit(&self, fail: bool) {
        self.write().fail_on_commit = fail;
    }

    pub fn set_fail_on_release(&self, fail: bool) {
        self.write().fail_on_release = fail;
    }

    /// Current stock of a product, if known.
    pub fn stock(&self, product_id: &str) -> Option<u32> {
        self.read()
            .products
            .get(&ProductId::new(product_id))
            .map(|p| p.stock)
    }

    /// Status of a reservation, if known.
    pub fn reservation_status(&self, reservation_id: &ReservationId) -> Option<ReservationStatus> {
        self.read()
            .reservations
            .get(reservation_id)
            .map(|r| r.status)
    }

    /// Number of reserve attempts seen, successful or not.
    pub fn reserve_calls(&self) -> usize {
        self.read().request_ids.len()
    }

    /// Idempotency tokens of every reserve attempt, in order.
    pub fn request_ids(&self) -> Vec<String> {
        self.read().request_ids.clone()
    }

    pub fn price_calls(&self) -> usize {
        self.read().price_calls
    }

    pub fn commit_calls(&self) -> usize {
        self.read().commit_calls
    }

    /// Reservation ids passed to `release`, in call order.
    pub fn release_calls(&self) -> Vec<ReservationId> {
        self.read().released.clone()
    }
}

#[async_trait]
impl InventoryService for InMemoryInventoryService {
    async fn product_prices(&self) -> Result<PriceList, ReservationError> {
        let mut state = self.write();
        state.price_calls += 1;
        if state.fail_on_prices {
            return Err(ReservationError::Unavailable(
                "product list unavailable".to_string(),
            ));
        }
        Ok(state
            .products
            .iter()
            .map(|(id, p)| (id.clone(), p.price))
            .collect())
    }

    async fn reserve(
        &self,
        request_id: &str,
        items: &[RequestedLine],
    ) -> Result<Reservation, ReservationError> {
        let mut state = self.write();
        state.request_ids.push(request_id.to_string());

        if state.fail_on_reserve {
            return Err(ReservationError::Unavailable(
                "inventory unavailable".to_string(),
            ));
        }

        // Check every line before touching stock so a refusal changes nothing
        for item in items {
            let product = state.products.get(&item.product_id).ok_or_else(|| {
                ReservationError::Unavailable(format!("product {} does not exist", item.product_id))
            })?;
            if product.stock < item.quantity {
                return Err(ReservationError::Conflict(format!(
                    "insufficient stock for {}",
                    item.product_id
                )));
            }
        }

        for item in items {
            if let Some(product) = state.products.get_mut(&item.product_id) {
                product.stock -= item.quantity;
            }
        }

        state.next_id += 1;
        let reservation_id = ReservationId::new(format!("RES-{:04}", state.next_id));
        state.reservations.insert(
            reservation_id.clone(),
            HeldReservation {
                lines: items.to_vec(),
                status: ReservationStatus::Reserved,
            },
        );

        Ok(Reservation { reservation_id })
    }

    async fn commit(&self, reservation_id: &ReservationId) -> Result<(), ReservationError> {
        let mut state = self.write();
        state.commit_calls += 1;
        if state.fail_on_commit {
            return Err(ReservationError::Unavailable(
                "inventory unavailable".to_string(),
            ));
        }

        let reservation = state
            .reservations
            .get_mut(reservation_id)
            .ok_or_else(|| ReservationError::Conflict(format!("{reservation_id} not found")))?;
        if reservation.status != ReservationStatus::Reserved {
            return Err(ReservationError::Conflict(format!(
                "{reservation_id} is not reserved"
            )));
        }
        reservation.status = ReservationStatus::Committed;
        Ok(())
    }

    async fn release(&self, reservation_id: &ReservationId) -> Result<(), ReservationError> {
        let mut state = self.write();
        state.released.push(reservation_id.clone());
        if state.fail_on_release {
            return Err(ReservationError::Unavailable(
                "inventory unavailable".to_string(),
            ));
        }

        let reservation = state
            .reservations
            .get_mut(reservation_id)
            .ok_or_else(|| ReservationError::Conflict(format!("{reservation_id} not found")))?;
        if reservation.status != ReservationStatus::Reserved {
            return Err(ReservationError::Conflict(format!(
                "{reservation_id} is not reserved"
            )));
        }
        reservation.status = ReservationStatus::Released;
        let lines = reservation.lines.clone();

        for line in lines {
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.stock += line.quantity;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: &str, quantity: u32) -> RequestedLine {
        RequestedLine {
            product_id: ProductId::new(product_id),
            quantity,
        }
    }

    fn service() -> InMemoryInventoryService {
        InMemoryInventoryService::new()
            .with_product("SKU-001", Money::from_cents(1000), 10)
            .with_product("SKU-002", Money::from_cents(250), 1)
    }

    #[tokio::test]
    async fn test_reserve_commit() {
        let service = service();

        let reservation = service
            .reserve("req-1", &[line("SKU-001", 3)])
            .await
            .unwrap();
        assert!(reservation.reservation_id.as_str().starts_with("RES-"));
        assert_eq!(service.stock("SKU-001"), Some(7));

        service.commit(&reservation.reservation_id).await.unwrap();
        assert_eq!(
            service.reservation_status(&reservation.reservation_id),
            Some(ReservationStatus::Committed)
        );
        assert_eq!(service.stock("SKU-001"), Some(7));
    }

    #[tokio::test]
    async fn test_release_restores_stock() {
        let service = service();
        let reservation = service
            .reserve("req-1", &[line("SKU-001", 4)])
            .await
            .unwrap();

        service.release(&reservation.reservation_id).await.unwrap();

        assert_eq!(service.stock("SKU-001"), Some(10));
        assert_eq!(
            service.reservation_status(&reservation.reservation_id),
            Some(ReservationStatus::Released)
        );
    }

    #[tokio::test]
    async fn test_insufficient_stock_is_conflict_and_changes_nothing() {
        let service = service();

        let result = service
            .reserve("req-1", &[line("SKU-001", 2), line("SKU-002", 5)])
            .await;

        assert!(matches!(result, Err(ReservationError::Conflict(_))));
        assert_eq!(service.stock("SKU-001"), Some(10));
        assert_eq!(service.stock("SKU-002"), Some(1));
    }

    #[tokio::test]
    async fn test_commit_after_release_is_conflict() {
        let service = service();
        let reservation = service
            .reserve("req-1", &[line("SKU-001", 1)])
            .await
            .unwrap();
        service.release(&reservation.reservation_id).await.unwrap();

        let result = service.commit(&reservation.reservation_id).await;
        assert!(matches!(result, Err(ReservationError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unknown_reservation_is_conflict() {
        let service = service();
        let result = service.release(&ReservationId::new("RES-9999")).await;
        assert!(matches!(result, Err(ReservationError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_price_list() {
        let service = service();
        let prices = service.product_prices().await.unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[&ProductId::new("SKU-002")], Money::from_cents(250));
    }
}
