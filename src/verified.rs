/// A payload that passed every validation rule.
///
/// `Verified<T>` can only be produced by a [`Sanitizer`](crate::Sanitizer)
/// inside this crate. Store mutations take `&Verified<R>`, which makes
/// "validate before persisting" a property of the types rather than of the
/// call order.
///
/// # Examples
///
/// ```
/// use tenant_pipeline::{Application, ResourceSanitizer, Sanitizer, Tainted};
///
/// let app = Application {
///     owner: "admin".into(),
///     name: "app1".into(),
///     homepage_url: "https://x.io".into(),
///     ..Default::default()
/// };
/// let verified = ResourceSanitizer.sanitize(Tainted::new(app)).unwrap();
/// assert_eq!(verified.as_ref().name, "app1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps a value that has just been validated.
    ///
    /// This is `pub(crate)`: only sanitizers may call it.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper and returns the validated value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_as_ref_returns_reference() {
        let verified = Verified::new_unchecked("admin/app1".to_string());
        assert_eq!(verified.as_ref(), "admin/app1");
    }

    #[test]
    fn verified_as_ref_does_not_consume() {
        let verified = Verified::new_unchecked(vec![1, 2, 3]);

        let ref1 = verified.as_ref();
        let ref2 = verified.as_ref();
        assert_eq!(ref1, ref2);

        assert_eq!(verified.into_inner(), vec![1, 2, 3]);
    }

    #[test]
    fn verified_prevents_direct_construction() {
        // Outside the crate neither of these compiles:
        // let v = Verified { inner: 42 };
        // let v: Verified<i32> = 42.into();
        let _ = Verified::new_unchecked(42);
    }
}
