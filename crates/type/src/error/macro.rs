// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

/// Wraps a diagnostic into an [`Error`](crate::Error).
#[macro_export]
macro_rules! error {
	($diagnostic:expr) => {
		$crate::error::Error($diagnostic)
	};
}

/// Creates an internal error diagnostic with automatic source location capture.
#[macro_export]
macro_rules! internal_error {
	($reason:expr) => {
		$crate::error::diagnostic::internal::internal_with_context(
			$reason,
			file!(),
			line!(),
			column!(),
			module_path!(),
		)
	};
	($fmt:expr, $($arg:tt)*) => {
		$crate::error::diagnostic::internal::internal_with_context(
			format!($fmt, $($arg)*),
			file!(),
			line!(),
			column!(),
			module_path!(),
		)
	};
}

/// Returns early with an internal error, capturing the source location.
#[macro_export]
macro_rules! return_internal_error {
	($reason:expr) => {
		return Err($crate::error::Error($crate::internal_error!($reason)))
	};
	($fmt:expr, $($arg:tt)*) => {
		return Err($crate::error::Error($crate::internal_error!($fmt, $($arg)*)))
	};
}

#[cfg(test)]
mod tests {
	use crate::{Error, error::diagnostic::policy};

	#[test]
	fn test_error_macro() {
		let err = error!(policy::permission_denied("bob", "execute"));
		assert_eq!(err.code, "POLICY_001");
	}

	#[test]
	fn test_internal_error_with_format() {
		let diagnostic = internal_error!("lost record for {}", "2024_01");
		assert_eq!(diagnostic.code, "INTERNAL_ERROR");
		assert!(diagnostic.message.contains("lost record for 2024_01"));
		assert!(diagnostic.label.as_ref().unwrap().contains("macro.rs"));
	}

	#[test]
	fn test_return_internal_error() {
		fn broken(value: u32) -> Result<(), Error> {
			return_internal_error!("unexpected value: {:#04x}", value);
		}

		let err = broken(255).unwrap_err();
		assert_eq!(err.code, "INTERNAL_ERROR");
		assert!(err.message.contains("0xff"));
	}
}
