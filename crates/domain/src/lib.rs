//! Domain layer for the marketplace.
//!
//! This crate provides:
//! - Typed repositories over the document store
//! - User accounts with a pluggable password hasher
//! - Product catalogue with owner checks
//! - Cart aggregate with price snapshots and derived totals
//! - Order aggregate, status policy and all-or-nothing checkout

pub mod cart;
pub mod error;
pub mod order;
pub mod product;
pub mod repository;
pub mod user;
pub mod value_objects;

pub use cart::{Cart, CartError, CartLine, CartLineView, CartService, CartView};
pub use error::DomainError;
pub use order::{
    CheckoutItem, CheckoutRequest, MerchantOrderView, Order, OrderDetails, OrderError, OrderItem,
    OrderService, OrderStatus, OrderView, PaymentMethod, PaymentStatus, ShippingAddress,
    check_transition,
};
pub use product::{
    Category, Product, ProductDraft, ProductError, ProductListing, ProductService, ProductSummary,
};
pub use repository::{Entity, Repository};
pub use user::{
    PasswordHasher, ProfileUpdate, Registration, Role, User, UserProfile, UserService, UserSummary,
};
pub use value_objects::{Money, OrderId, ProductId, UserId};
