// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors surfaced while validating the shape of a configuration before it
//! reaches the graph builder.

/// Errors raised by structural validation of configuration data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A pipeline is missing a required role (`receivers` or `exporters`).
    #[error("pipeline \"{pipeline}\" has no {role}")]
    EmptyRole {
        /// The pipeline that failed validation.
        pipeline: String,
        /// The role that was empty (`"receivers"` or `"exporters"`).
        role: &'static str,
    },
}
