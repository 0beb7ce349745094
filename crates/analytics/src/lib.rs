//! Read models for merchants.
//!
//! Everything here is computed on demand from stored orders and products:
//! - [`MerchantAnalytics`] dashboard totals, status counts, monthly revenue, top products
//! - [`MerchantSale`] orders reduced to one merchant's lines
//! - [`ProductWithStats`] a merchant's products with units sold and revenue
//!
//! [`AnalyticsService`] loads the data; the `compute` functions are pure.

pub mod error;
pub mod merchant;
pub mod sales;
pub mod service;

pub use error::{AnalyticsError, Result};
pub use merchant::{MerchantAnalytics, MonthlyRevenue, StatusCounts, TopProduct};
pub use sales::{MerchantSale, ProductSalesStats, ProductWithStats};
pub use service::AnalyticsService;
