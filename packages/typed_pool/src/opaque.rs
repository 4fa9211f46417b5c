use std::any::{Any, type_name};
use std::fmt;

/// A value of unknown type, as held by a [`RawPool`][crate::RawPool].
///
/// Remembers the name of the type it was created from, so a failed downcast can report what
/// was actually found.
///
/// # Example
///
/// ```rust
/// use typed_pool::OpaqueValue;
///
/// let opaque = OpaqueValue::new(42_u64);
/// assert!(opaque.is::<u64>());
///
/// let opaque = opaque.downcast::<u32>().unwrap_err();
/// assert_eq!(opaque.type_name(), "u64");
///
/// assert_eq!(opaque.downcast::<u64>().unwrap(), 42);
/// ```
pub struct OpaqueValue {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl OpaqueValue {
    /// Wraps a value of any thread-mobile type.
    #[must_use]
    pub fn new<V>(value: V) -> Self
    where
        V: Any + Send,
    {
        Self {
            value: Box::new(value),
            type_name: type_name::<V>(),
        }
    }

    /// Name of the type of the wrapped value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the wrapped value is of type `V`.
    #[must_use]
    pub fn is<V>(&self) -> bool
    where
        V: Any,
    {
        self.value.is::<V>()
    }

    /// Unwraps the value if it is of type `V`.
    ///
    /// # Errors
    ///
    /// If the value is of some other type, `self` is returned unchanged.
    pub fn downcast<V>(self) -> Result<V, Self>
    where
        V: Any,
    {
        let type_name = self.type_name;

        match self.value.downcast::<V>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self { value, type_name }),
        }
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
