//! Client library for the Google Play Music private mobile API.
//!
//! The service spoke JSON over HTTPS with OAuth 2.0 bearer tokens. Nearly
//! every collection endpoint was paginated with opaque continuation tokens;
//! the [`feed`] module implements that iteration protocol once and the
//! [`client::MobileClient`] endpoint methods build on it.
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[macro_use]
extern crate log;

pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod protocol;
pub mod session;
pub mod token;
