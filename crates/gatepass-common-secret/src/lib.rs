// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for values that grant access.
//!
//! Gateway credentials and the bot token pass through logs, config dumps and
//! error messages on their way around the system. Wrapping them in [`Secret`]
//! keeps them out of all three:
//!
//! - `Debug` and `Display` print `[REDACTED]`
//! - `Serialize` writes `"[REDACTED]"`
//! - the inner buffer is zeroized on drop
//! - reading the value requires an explicit [`Secret::expose`]
//!
//! ```
//! use gatepass_common_secret::SecretString;
//!
//! let credential = SecretString::new("3f0e9c1a-8c1e-4c43-9a55-2a1d1f3c9b10".to_string());
//! assert_eq!(format!("{credential}"), "[REDACTED]");
//! assert_eq!(credential.expose(), "3f0e9c1a-8c1e-4c43-9a55-2a1d1f3c9b10");
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Placeholder written wherever a secret would otherwise be rendered.
pub const REDACTED: &str = "[REDACTED]";

#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Borrow the protected value. Every call site is a place where the
	/// secret leaves the wrapper, so keep them few and obvious.
	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl SecretString {
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self::new(self.inner.clone())
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

impl<T> From<T> for Secret<T>
where
	T: Zeroize,
{
	fn from(inner: T) -> Self {
		Self::new(inner)
	}
}

impl<T> Serialize for Secret<T>
where
	T: Zeroize,
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de, T> Deserialize<'de> for Secret<T>
where
	T: Deserialize<'de> + Zeroize,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		T::deserialize(deserializer).map(Secret::new)
	}
}
