//! Core library for unifit
//!
//! This crate implements the **Functional Core** of the unifit application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The unifit project uses a two-crate architecture:
//!
//! - **`unifit_core`** (this crate): Pure transformation functions and state machines, zero I/O
//! - **`unifit`**: HTTP clients, terminal output and orchestration (the Imperative Shell)
//!
//! All functions in this crate are deterministic and can be tested with
//! fixture data, no mocking required.
//!
//! # Module Organization
//!
//! - [`catalog`]: Exercise/image join and normalization of catalog API data
//! - [`filter`]: Category filter and free-text search
//! - [`pagination`]: Page slicing and bounded navigation
//! - [`controller`]: Exercise list session state machine
//! - [`auth`]: Form validation, identity provider types, auth context
//! - [`plan`]: Workout plan overview
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use unifit_core::catalog::{build_image_map, normalize_exercises};
//! use unifit_core::filter::filter_exercises;
//! use unifit_core::pagination::{paginate, DEFAULT_PAGE_SIZE};
//!
//! let images = build_image_map(&raw_images, "https://wger.de");
//! let records = normalize_exercises(&raw_exercises, &images);
//! let filtered = filter_exercises(&records, Some("Cardio"), "run");
//! let page = paginate(&filtered, DEFAULT_PAGE_SIZE, 1);
//!
//! assert!(page.info.current_page == 1);
//! ```

pub mod auth;
pub mod catalog;
pub mod controller;
pub mod filter;
pub mod pagination;
pub mod plan;
