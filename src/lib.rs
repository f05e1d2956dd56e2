//! Timelytics: delivery-time prediction for retail orders.
//!
//! The core is [`prediction::Predictor`]: it normalizes raw order attributes,
//! estimates a duration with a swappable [`estimation::EstimationStrategy`],
//! and turns it into a delivery date. Accounts ([`auth`]) and order history
//! ([`history`]) are collaborators wired together by [`service::OrderService`].

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod estimation;
pub mod features;
pub mod history;
pub mod prediction;
pub mod service;
pub mod storage;

pub use error::{InvalidDateError, NormalizationError, PredictionError};
pub use prediction::{DeliveryPrediction, Predictor};
