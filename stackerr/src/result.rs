use crate::{AnnotatedError, Generator, Value};
use std::error::Error;

/// Extension trait for [`Result`] which annotates its error while it propagates.
///
/// The stack is recorded at the call site of the method, and errors which already are
/// [`AnnotatedError`]s keep their original stack.
pub trait ResultExt<T> {
    /// Turns the error into an [`AnnotatedError`].
    fn annotate(self) -> Result<T, AnnotatedError>;

    /// Turns the error into an [`AnnotatedError`] and attaches a field to it.
    fn annotate_field(
        self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<T, AnnotatedError>;

    /// Turns the error into an [`AnnotatedError`] through the given [`Generator`].
    fn annotate_with(self, generator: &Generator) -> Result<T, AnnotatedError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<Box<dyn Error + Send + Sync + 'static>>,
{
    #[inline(always)]
    fn annotate(self) -> Result<T, AnnotatedError> {
        self.map_err(AnnotatedError::wrap)
    }

    fn annotate_field(
        self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<T, AnnotatedError> {
        self.map_err(|e| AnnotatedError::wrap(e).with_field(key, value))
    }

    fn annotate_with(self, generator: &Generator) -> Result<T, AnnotatedError> {
        self.map_err(|e| generator.wrap(e))
    }
}
