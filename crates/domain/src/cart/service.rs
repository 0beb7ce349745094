//! Cart operations against the document store.

use doc_store::DocumentStore;
use serde::Serialize;

use crate::error::DomainError;
use crate::product::{Product, ProductSummary};
use crate::repository::Repository;
use crate::value_objects::{Money, ProductId, UserId};

use super::{Cart, CartError, CartLine, positive_quantity};

/// A cart line with the current product details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price_at_time: Money,
    pub line_total: Money,
    /// None when the product has since been deleted.
    pub product: Option<ProductSummary>,
}

/// A cart as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub user_id: UserId,
    pub items: Vec<CartLineView>,
    pub total_amount: Money,
}

/// Service for the per-user shopping cart.
pub struct CartService<S: DocumentStore> {
    carts: Repository<S, Cart>,
    products: Repository<S, Product>,
}

impl<S: DocumentStore + Clone> CartService<S> {
    /// Creates a new cart service.
    pub fn new(store: S) -> Self {
        Self {
            carts: Repository::new(store.clone()),
            products: Repository::new(store),
        }
    }
}

impl<S: DocumentStore> CartService<S> {
    /// Returns the user's cart, or an empty one if none exists yet.
    pub async fn get(&self, user: UserId) -> Result<CartView, DomainError> {
        match self.carts.get(user).await? {
            Some(cart) => self.populate(&cart).await,
            None => Ok(CartView {
                user_id: user,
                items: Vec::new(),
                total_amount: Money::zero(),
            }),
        }
    }

    /// Adds units of a product, creating the cart on first use.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartView, DomainError> {
        let product = self.products.require(product_id).await?;
        if product.is_owned_by(user) {
            return Err(CartError::OwnProduct.into());
        }

        let existing = self.carts.get(user).await?;
        let is_new = existing.is_none();
        let mut cart = existing.unwrap_or_else(|| Cart::new(user));

        cart.add(product_id, quantity, product.price)?;

        if is_new {
            self.carts.insert(&cart).await?;
        } else {
            self.carts.save(&cart).await?;
        }

        self.populate(&cart).await
    }

    /// Removes a product's line.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user: UserId,
        product_id: ProductId,
    ) -> Result<CartView, DomainError> {
        let mut cart = self.carts.require(user).await?;
        cart.remove(product_id);
        self.carts.save(&cart).await?;
        self.populate(&cart).await
    }

    /// Sets the quantity of an existing line.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartView, DomainError> {
        positive_quantity(quantity)?;

        let mut cart = self.carts.require(user).await?;
        cart.set_quantity(product_id, quantity)?;
        self.carts.save(&cart).await?;
        self.populate(&cart).await
    }

    /// Empties the cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user: UserId) -> Result<CartView, DomainError> {
        let mut cart = self.carts.require(user).await?;
        cart.clear();
        self.carts.save(&cart).await?;
        self.populate(&cart).await
    }

    async fn populate(&self, cart: &Cart) -> Result<CartView, DomainError> {
        let mut items = Vec::with_capacity(cart.items().len());
        for line in cart.items() {
            items.push(self.line_view(line).await?);
        }

        Ok(CartView {
            user_id: cart.user_id,
            items,
            total_amount: cart.total_amount(),
        })
    }

    async fn line_view(&self, line: &CartLine) -> Result<CartLineView, DomainError> {
        let product = self.products.get(line.product_id).await?;
        Ok(CartLineView {
            product_id: line.product_id,
            quantity: line.quantity,
            price_at_time: line.price_at_time,
            line_total: line.line_total(),
            product: product.as_ref().map(ProductSummary::from),
        })
    }
}
