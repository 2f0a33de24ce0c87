// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Component identity: a `type` (selects a factory) plus a disambiguating `name`.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Identifies one configured instance of a receiver, processor, exporter, or
/// connector: a `type` that selects the factory, and a `name` that
/// disambiguates multiple instances of the same type.
///
/// The textual form is `type` when the name is empty, or `type/name`
/// otherwise, matching the convention used across this ecosystem's
/// component identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Cow<'static, str>", into = "String")]
pub struct ComponentId {
    kind: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl ComponentId {
    /// Builds a `ComponentId` from a type and an optional disambiguating name.
    #[must_use]
    pub fn new(kind: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Builds a `ComponentId` with an empty name.
    #[must_use]
    pub fn from_type(kind: impl Into<Cow<'static, str>>) -> Self {
        Self::new(kind, "")
    }

    /// Parses the `type` or `type/name` textual form.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.split_once('/') {
            Some((kind, name)) => Self::new(kind.to_owned(), name.to_owned()),
            None => Self::new(s.to_owned(), ""),
        }
    }

    /// The component's type, used to select a factory.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The disambiguating name, empty when the type has a single instance.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TryFrom<Cow<'static, str>> for ComponentId {
    type Error = std::convert::Infallible;

    fn try_from(value: Cow<'static, str>) -> Result<Self, Self::Error> {
        Ok(Self::parse(&value))
    }
}

impl From<ComponentId> for String {
    fn from(value: ComponentId) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}/{}", self.kind, self.name)
        }
    }
}
