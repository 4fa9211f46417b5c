use thiserror::Error;

/// Errors that can occur when taking an item out of a [`Pool`][crate::Pool].
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The backing store yielded an entry whose type does not match the item type of the pool.
    ///
    /// This can only happen if something other than the pool itself inserted values into the
    /// backing store. It indicates a bug elsewhere in the program, not a transient condition.
    #[error("corrupt pool: expected an item of type {expected} but the pool contained {actual}")]
    CorruptPool {
        /// Type name of the item type the pool was created for.
        expected: &'static str,

        /// Type name of the value that was found in the backing store.
        actual: &'static str,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug, Clone);

    #[test]
    fn corrupt_pool_message_names_both_types() {
        let error = Error::CorruptPool {
            expected: "i64",
            actual: "u64",
        };

        let message = error.to_string();

        assert!(message.starts_with("corrupt pool"));
        assert!(message.contains("i64"));
        assert!(message.contains("u64"));
    }

    #[test]
    fn corrupt_pool_is_error() {
        let error = Error::CorruptPool {
            expected: "i64",
            actual: "i32",
        };

        let result: Result<()> = Err(error.clone());
        assert_eq!(result, Err(error));
    }
}
