/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::message::ArgumentError;

/// The positional and named arguments carried by a [`Message`](crate::message::Message).
///
/// Values are stored as [`serde_json::Value`] so that any serializable data can travel
/// between actors whose concrete types are unknown to one another. Handlers pull typed
/// values back out with [`Arguments::get`] and [`Arguments::named`].
#[derive(Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    named: Map<String, Value>,
}

impl Arguments {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named argument, replacing any earlier value under the same key.
    #[must_use]
    pub fn with_named(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    /// Appends a positional argument in place.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.positional.push(value.into());
    }

    /// Deserializes the positional argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::MissingPositional`] when fewer arguments were supplied and
    /// [`ArgumentError::Mismatch`] when the value cannot be read as `T`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, ArgumentError> {
        let value = self
            .positional
            .get(index)
            .ok_or(ArgumentError::MissingPositional(index))?;
        serde_json::from_value(value.clone()).map_err(|source| ArgumentError::Mismatch {
            argument: index.to_string(),
            source,
        })
    }

    /// Deserializes the positional argument at `index`, or returns `None` when absent or null.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Mismatch`] when a value is present but is not a `T`.
    pub fn get_opt<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, ArgumentError> {
        match self.positional.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get(index).map(Some),
        }
    }

    /// Deserializes the named argument `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::MissingNamed`] or [`ArgumentError::Mismatch`].
    pub fn named<T: DeserializeOwned>(&self, key: &str) -> Result<T, ArgumentError> {
        let value = self
            .named
            .get(key)
            .ok_or_else(|| ArgumentError::MissingNamed(key.to_string()))?;
        serde_json::from_value(value.clone()).map_err(|source| ArgumentError::Mismatch {
            argument: key.to_string(),
            source,
        })
    }

    /// Reads an argument that may be supplied either by name or at a fixed position.
    ///
    /// The named form wins when both are present. A missing or null value yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Mismatch`] when the value present is not a `T`.
    pub fn named_or_at<T: DeserializeOwned>(
        &self,
        key: &str,
        index: usize,
    ) -> Result<Option<T>, ArgumentError> {
        match self.named.get(key) {
            Some(Value::Null) => Ok(None),
            Some(_) => self.named(key).map(Some),
            None => self.get_opt(index),
        }
    }

    /// The raw positional values.
    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// The raw named values.
    #[must_use]
    pub const fn named_values(&self) -> &Map<String, Value> {
        &self.named
    }

    /// Returns a copy with the first `count` positional arguments removed.
    ///
    /// Named arguments are kept as-is. Used when a command forwards its trailing
    /// arguments to another operation.
    #[must_use]
    pub fn skip(&self, count: usize) -> Self {
        Self {
            positional: self.positional.iter().skip(count).cloned().collect(),
            named: self.named.clone(),
        }
    }

    /// Total number of positional and named arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// Whether no arguments were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "args={:?}", self.positional)?;
        if !self.named.is_empty() {
            write!(f, ", kwargs={:?}", self.named)?;
        }
        Ok(())
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(positional: Vec<Value>) -> Self {
        Self {
            positional,
            named: Map::new(),
        }
    }
}

impl<V: Into<Value>> FromIterator<V> for Arguments {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from(iter.into_iter().map(Into::into).collect::<Vec<_>>())
    }
}
