//! Core types for Lumen Beauty.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod account;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod id;
pub mod lists;
pub mod price;
pub mod product;
pub mod status;

pub use account::{Notification, Order, OrderLine, ReturnRequest, SupportTicket, TicketMessage};
pub use account::{Role, User};
pub use cart::{
    CartError, CartItem, CartLines, CartSummary, MAX_LINE_QUANTITY, ServerTotals, TotalsPolicy,
};
pub use checkout::{Address, DeliveryOption, PaymentMethod, ShippingDetails, ShippingError};
pub use contact::{ContactError, Email, LoginIdentifier, OtpCode, Phone};
pub use id::*;
pub use lists::{
    COMPARE_LIMIT, CompareError, CompareList, FeatureRow, RECENTLY_VIEWED_LIMIT, RecentlyViewed,
    Wishlist,
};
pub use price::{CurrencyCode, ExchangeRates, Price, UnsupportedCurrency, round_money};
pub use product::{
    Category, LOW_STOCK_THRESHOLD, NewReview, Product, RatingSummary, Review, ReviewError,
    SortOrder,
};
pub use status::*;
