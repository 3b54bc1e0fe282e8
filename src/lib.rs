//! Wallet Gateway Library
//!
//! This library provides the action gateway in front of the Mono sandbox
//! ledger and the wallet view-model that consumes it.
//!
//! # Modules
//!
//! - `api`: API-layer namespace (handlers, router, OpenAPI document).
//! - `core`: Gateway dispatch, models and shared errors.
//! - `integrations`: HTTP clients for the ledger and for the gateway itself.
//! - `activity`: Operation normalization and day grouping.
//! - `config`: Configuration management.
//! - `display`: COP formatting, masks and card labels.
//! - `errors`: Error handling types.
//! - `external_id`: Idempotency key generation.
//! - `gateway`: Action dispatch and validation.
//! - `handlers`: HTTP request handlers.
//! - `ledger_client`: Mono ledger API client.
//! - `local_store`: Key/value persistence for wallet state.
//! - `models`: Request, upstream and client-side data models.
//! - `openapi`: OpenAPI document.
//! - `profile`: Wallet tenant profile and behaviour switches.
//! - `repository`: Typed access to stored wallet state.
//! - `server`: Router assembly.
//! - `view_model`: Wallet screens and operations.
//! - `wallet_client`: Gateway client used by the wallet.

pub mod api;
pub mod core;
pub mod integrations;

pub mod activity;
pub mod config;
pub mod display;
pub mod errors;
pub mod external_id;
pub mod gateway;
pub mod handlers;
pub mod ledger_client;
pub mod local_store;
pub mod models;
pub mod openapi;
pub mod profile;
pub mod repository;
pub mod server;
pub mod view_model;
pub mod wallet_client;
