//! # Lookbook
//!
//! Find catalog products that look like a photo.
//!
//! Lookbook uploads an image to a similarity endpoint, joins the ranked image
//! identifiers it gets back against a CSV product catalog, and renders up to
//! six product cards.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  POST /upload/   ┌──────────────┐
//! │  image   │─────────────────▶│  similarity  │
//! └──────────┘                  │   endpoint   │
//!                               └──────┬───────┘
//!                   similar_images     │   GET /static/fashion.csv
//!                                      ▼
//!                 ┌────────────┐   ┌──────────┐   ┌────────────┐
//!                 │ Controller │──▶│ Catalog  │──▶│  Renderer  │──▶ ResultsView
//!                 └────────────┘   │  cache   │   └────────────┘
//!                                  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lookbook recommend ./photo.jpg
//! lookbook recommend ./photo.jpg --format html --policy catalog
//! lookbook catalog lookup 15970.jpg
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`catalog`] | CSV parsing, catalog index and cache |
//! | [`client`] | Similarity endpoint client |
//! | [`render`] | Card rendering policies and markup |
//! | [`view`] | Results views |
//! | [`controller`] | The submit workflow |
//! | [`error`] | Error taxonomy |
//! | [`logging`] | Log subscriber setup |

pub mod catalog;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod models;
pub mod render;
pub mod view;
