//! Small chainable combinators over `std::result::Result<T, DungeonError>`,
//! for pass code that wants to react to a prior pass's failure without a
//! `match` at every step.

use crate::error::DungeonError;

pub type DungeonResult<T> = std::result::Result<T, DungeonError>;

pub trait ResultExt<T> {
    /// Run `f` only on success, threading the error through untouched.
    fn map_ok<U>(self, f: impl FnOnce(T) -> U) -> DungeonResult<U>;

    /// Replace the error with one built from the original, keeping any `Ok`.
    fn map_err_to(self, f: impl FnOnce(DungeonError) -> DungeonError) -> DungeonResult<T>;

    /// Chain a further fallible step, short-circuiting on the first error.
    fn and_then_dungeon<U>(self, f: impl FnOnce(T) -> DungeonResult<U>) -> DungeonResult<U>;

    /// Recover from an error by producing a fallback value.
    fn or_else_dungeon(self, f: impl FnOnce(DungeonError) -> DungeonResult<T>) -> DungeonResult<T>;

    /// Unwrap to a default on error, without panicking.
    fn get_or_else(self, default: impl FnOnce(DungeonError) -> T) -> T;

    /// Unwrap on success, or panic with the error's display text. Reserved
    /// for call sites (tests, CLI) that have already decided an error here
    /// is unrecoverable.
    fn get_or_throw(self) -> T;
}

impl<T> ResultExt<T> for DungeonResult<T> {
    fn map_ok<U>(self, f: impl FnOnce(T) -> U) -> DungeonResult<U> {
        self.map(f)
    }

    fn map_err_to(self, f: impl FnOnce(DungeonError) -> DungeonError) -> DungeonResult<T> {
        self.map_err(f)
    }

    fn and_then_dungeon<U>(self, f: impl FnOnce(T) -> DungeonResult<U>) -> DungeonResult<U> {
        self.and_then(f)
    }

    fn or_else_dungeon(self, f: impl FnOnce(DungeonError) -> DungeonResult<T>) -> DungeonResult<T> {
        self.or_else(f)
    }

    fn get_or_else(self, default: impl FnOnce(DungeonError) -> T) -> T {
        match self {
            Ok(v) => v,
            Err(e) => default(e),
        }
    }

    fn get_or_throw(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }
}

/// Wraps a closure that may panic into a `DungeonResult`, for boundary
/// code (e.g. third-party callbacks) that throws instead of returning
/// `Result`.
pub fn from_throwable<T>(f: impl FnOnce() -> T + std::panic::UnwindSafe) -> DungeonResult<T> {
    std::panic::catch_unwind(f).map_err(|_| DungeonError::GenerationFailed("panicked".to_string()))
}
