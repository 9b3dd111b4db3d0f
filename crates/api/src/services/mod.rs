//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Bearer token signing and verification
//! - `cart` - Cart operations with stock validation
//! - `checkout` - Cart to order, with payment, in one unit of work
//! - `payment` - Payment processor trait and implementations

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod payment;
