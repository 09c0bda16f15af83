// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Object-store gateway for persisted benchmark results.
//!
//! The harness persists one JSON blob per commit and reads the blob of a
//! previous commit back for comparison. This crate provides the narrow
//! interface the rest of the harness consumes — [`ArtifactStore`] with
//! `put`/`get` over an [`ObjectKey`] — plus the OpenStack Swift
//! implementation used by the CI deployment.
//!
//! There is deliberately no retry logic: a connectivity or auth failure
//! surfaces as one [`StoreError`] signal and the caller skips the dependent
//! feature (upload or comparison) for that run.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod key;
pub mod swift;

pub use key::ObjectKey;
pub use swift::{SwiftCredentials, SwiftStore};

use thiserror::Error;

/// Errors surfaced by an artifact store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// Authentication with the store failed.
    #[error("object store authentication failed: {0}")]
    Auth(String),

    /// The store could not be reached.
    #[error("object store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with a status the gateway does not expect.
    #[error("unexpected object store response {status} for {url}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
    },
}

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// The two operations the harness needs from an object store.
///
/// Behind a trait so the comparison flow is testable without a live store.
pub trait ArtifactStore {
    /// Persist a JSON blob under the given key, overwriting any previous
    /// object.
    fn put(&self, key: &ObjectKey, contents: &[u8]) -> Result<()>;

    /// Fetch the JSON blob stored under the given key.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no object exists under the key; other
    /// variants for connectivity and auth failures.
    fn get(&self, key: &ObjectKey) -> Result<Vec<u8>>;
}
