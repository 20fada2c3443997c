//! Core library for casegen
//!
//! This crate implements the **Functional Core** of the casegen application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`casegen_core`** (this crate): request validation, prompt building,
//!   model-output parsing, CSV storage and result presentation
//! - **`casegen`**: the HTTP server, the AI collaborators, the HTTP client and
//!   the CLI (the Imperative Shell)
//!
//! Apart from [`storage`], which owns the output directory, nothing in this
//! crate performs I/O. Everything can be tested with fixture data.
//!
//! # Module Organization
//!
//! - [`story`]: user story capture and [`story::GenerationRequest`] validation
//! - [`testcase`]: the prompt and the model-output contract
//! - [`storage`]: CSV serialization and the output directory
//! - [`result`]: [`result::GenerationResult`], the wire outcome of an attempt
//! - [`timeline`]: attempt lifecycle and the client-side event log
//! - [`present`]: rendering a result for the user
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use casegen_core::testcase::{build_prompt, parse_test_cases};
//!
//! let prompt = build_prompt("As a user, I want to log in");
//! let cases = parse_test_cases(&model_response)?;
//! ```

pub mod present;
pub mod result;
pub mod storage;
pub mod story;
pub mod testcase;
pub mod timeline;
