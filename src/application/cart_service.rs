use crate::domain::cart::{Cart, CartEntry};
use crate::domain::money::Cents;
use crate::domain::ports::CartStoreBox;
use crate::domain::pricing::{CartCalculation, PricingEngine};
use crate::error::{CartError, Result};
use serde::Serialize;

/// Outcome of adding a package to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AddOutcome {
    /// The package was appended. `savings` is what the customer saves on it
    /// because some of its biomarkers were already in the cart.
    Added { sku: String, savings: Cents },
    /// The package was already in the cart; nothing changed.
    AlreadyInCart { sku: String },
}

/// What gets handed to booking once the customer checks out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    /// Package names joined by `", "`.
    pub packages: String,
    pub total: Cents,
    pub items: Vec<CartEntry>,
}

/// Entry point for cart operations.
///
/// Every mutation loads the stored cart, changes it, and writes the full entry
/// list back. Calls are awaited in sequence, so one service instance never
/// interleaves its own read-modify-write cycles.
pub struct CartService {
    store: CartStoreBox,
    engine: PricingEngine,
    cart_key: String,
}

impl CartService {
    /// Creates a new `CartService`.
    ///
    /// # Arguments
    ///
    /// * `store` - Where the cart is persisted.
    /// * `engine` - Pricing engine holding the catalog.
    /// * `cart_key` - Key of the cart inside the store.
    pub fn new(store: CartStoreBox, engine: PricingEngine, cart_key: impl Into<String>) -> Self {
        Self {
            store,
            engine,
            cart_key: cart_key.into(),
        }
    }

    pub fn engine(&self) -> &PricingEngine {
        &self.engine
    }

    pub async fn items(&self) -> Result<Vec<CartEntry>> {
        self.store.load(&self.cart_key).await
    }

    pub async fn calculate(&self) -> Result<CartCalculation> {
        let items = self.items().await?;
        Ok(self.engine.calculate(&items))
    }

    /// Adds a package by SKU or storefront page path.
    pub async fn add(&self, reference: &str, image: Option<String>) -> Result<AddOutcome> {
        let sku = self.resolve(reference)?;
        let mut cart = Cart::from_entries(self.items().await?);

        if cart.contains(&sku) {
            tracing::info!(sku = %sku, "package already in cart");
            return Ok(AddOutcome::AlreadyInCart { sku });
        }

        let savings = self.engine.savings_if_added(cart.entries(), &sku);
        let mut entry =
            CartEntry::new(sku.clone()).with_added_at(chrono::Utc::now().timestamp_millis());
        entry.image = image.filter(|i| !i.is_empty());
        cart.add(entry);

        self.store.save(&self.cart_key, cart.into_entries()).await?;
        tracing::info!(sku = %sku, savings = savings.value(), "package added");
        Ok(AddOutcome::Added { sku, savings })
    }

    /// Removes a package; returns whether it was in the cart.
    pub async fn remove(&self, sku: &str) -> Result<bool> {
        let mut cart = Cart::from_entries(self.items().await?);
        if !cart.remove(sku) {
            tracing::debug!(sku, "package not in cart");
            return Ok(false);
        }
        self.store.save(&self.cart_key, cart.into_entries()).await?;
        tracing::info!(sku, "package removed");
        Ok(true)
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(&self.cart_key).await?;
        tracing::info!("cart cleared");
        Ok(())
    }

    /// Savings the customer would get by adding this package now.
    pub async fn quote(&self, reference: &str) -> Result<Cents> {
        let sku = self.resolve(reference)?;
        let items = self.items().await?;
        if items.iter().any(|e| e.sku() == Some(sku.as_str())) {
            return Ok(Cents::ZERO);
        }
        Ok(self.engine.savings_if_added(&items, &sku))
    }

    pub async fn checkout(&self) -> Result<OrderSummary> {
        let items = self.items().await?;
        if items.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let calculation = self.engine.calculate(&items);
        let packages = calculation
            .prices
            .iter()
            .map(|line| line.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(OrderSummary {
            packages,
            total: calculation.total,
            items,
        })
    }

    fn resolve(&self, reference: &str) -> Result<String> {
        self.engine
            .catalog()
            .resolve(reference)
            .map(|package| package.sku.clone())
            .ok_or_else(|| CartError::UnknownSku(reference.to_string()))
    }
}
