//! Unwrap helpers with good error messages.
//!
//! These replace `unwrap()` and `expect()` in test code; `#[track_caller]`
//! keeps the panic location at the call site.

use std::fmt::Debug;
use std::str::FromStr;

/// Unwrap a `Result`, panicking with the error value on `Err`.
///
/// ```rust
/// use keymux_test_helpers::must;
///
/// let result: Result<i32, &str> = Ok(42);
/// assert_eq!(must(result), 42);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with `msg` on `None`.
///
/// # Panics
///
/// Panics if the option is `None`.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Parse a string into a type, panicking on failure.
///
/// ```rust
/// use keymux_test_helpers::must_parse;
///
/// let value: u16 = must_parse("1133");
/// assert_eq!(value, 1133);
/// ```
///
/// # Panics
///
/// Panics if parsing fails.
#[track_caller]
pub fn must_parse<T: FromStr>(s: &str) -> T
where
    T::Err: Debug,
{
    s.parse()
        .unwrap_or_else(|e| panic!("must_parse: failed to parse {s:?}: {e:?}"))
}

/// Unwrap a `Result` with a context message.
///
/// # Panics
///
/// Panics if the result is `Err`, with the context and error value.
#[track_caller]
pub fn must_with<T, E: Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must_with: {context}: {e:?}"),
    }
}

#[cfg(feature = "async")]
mod async_helpers {
    use super::*;
    use std::future::Future;

    /// Async version of [`must`].
    ///
    /// # Panics
    ///
    /// Panics if the awaited result is `Err`.
    #[track_caller]
    pub async fn must_async<F, T, E>(future: F) -> T
    where
        F: Future<Output = Result<T, E>>,
        E: Debug,
    {
        match future.await {
            Ok(v) => v,
            Err(e) => panic!("must_async: unexpected Err: {e:?}"),
        }
    }

    /// Async version of [`must_some`].
    ///
    /// # Panics
    ///
    /// Panics if the awaited option is `None`.
    #[track_caller]
    pub async fn must_some_async<F, T>(future: F, msg: &str) -> T
    where
        F: Future<Output = Option<T>>,
    {
        match future.await {
            Some(v) => v,
            None => panic!("must_some_async: {msg}"),
        }
    }
}

#[cfg(feature = "async")]
pub use async_helpers::{must_async, must_some_async};
