use std::fmt;

const REDACTED: &str = "[redacted]";

/// Opaque password or arbitration token.
///
/// The raw value can only be reached once, by consuming the handle in
/// [`Secret::expose_once`]. There is no `Display`, `Clone` or `Serialize`.
pub struct Secret {
    inner: String,
}

impl Secret {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { inner: raw.into() }
    }

    pub fn char_count(&self) -> usize {
        self.inner.chars().count()
    }

    pub fn expose_once<R>(self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.inner)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}
