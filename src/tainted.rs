use std::fmt;

/// A decoded request payload that has not been validated yet.
///
/// Everything that arrives in a request body is wrapped in `Tainted<T>` at
/// decode time. The only way to hand it to the store is through a
/// [`Sanitizer`](crate::Sanitizer), which returns a [`Verified<T>`](crate::Verified).
///
/// # Security Properties
///
/// - Does NOT implement `Deref` or any implicit conversion traits
/// - Code outside this crate cannot read the inner value
/// - Store methods accept `Verified<T>` only, so a tainted payload cannot be persisted
///
/// # Examples
///
/// ```
/// use tenant_pipeline::{Application, Tainted};
///
/// let payload = Tainted::new(Application::default());
/// println!("{:?}", payload); // Tainted { inner: Application { .. } }
/// ```
#[derive(Clone)]
pub struct Tainted<T> {
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Borrows the inner value for authorization decisions made before validation.
    ///
    /// The pipeline reads the payload's identifier and organization through
    /// this; nothing read here may reach the store.
    pub(crate) fn peek(&self) -> &T {
        &self.inner
    }

    /// Applies a normalization that does not validate anything, keeping the taint.
    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Tainted<U> {
        Tainted::new(f(self.inner))
    }

    /// Extracts the inner value for sanitization.
    ///
    /// Only sanitizer implementations inside this crate call this, and only
    /// to validate the value before wrapping it in `Verified<T>`.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted")
            .field("inner", &self.inner)
            .finish()
    }
}
