// SPDX-License-Identifier: Apache-2.0
//! Error taxonomy for the scene graph / GUI runtime (the error handling design).

use thiserror::Error;

/// Errors surfaced by node property access, animation, and clipping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    /// A property was set or read with a value variant it doesn't hold.
    #[error("type mismatch: property does not hold a {0}")]
    TypeMismatch(&'static str),

    /// Syntactically invalid input (empty name, unknown node handle).
    #[error("invalid: {0}")]
    Invalid(String),

    /// The node slot table is full.
    #[error("out of resources: node capacity ({0}) exhausted")]
    OutOfResources(usize),
}
