use crate::fields::{self, Fields, IntoFields, Value};
use crate::stack::{Stack, DEFAULT_STACK_SKIP};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Underlying error for errors created from a plain message.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

/// An error annotated with the call stack it was created at, an optional name and a set of
/// key/value [`Fields`].
///
/// Values are immutable apart from [`with_name`](Self::with_name) and
/// [`set_name`](Self::set_name): every `with_field*` method returns a new error sharing the
/// underlying error and the stack of the original.
#[derive(Clone)]
pub struct AnnotatedError {
    source: Arc<dyn Error + Send + Sync + 'static>,
    stack: Stack,
    name: String,
    fields: Fields,
}

// ── Constructors ──────────────────────────────────────────────────

impl AnnotatedError {
    fn capture(source: Arc<dyn Error + Send + Sync + 'static>, skip: usize) -> Self {
        Self {
            source,
            stack: Stack::capture(skip),
            name: String::new(),
            fields: Fields::new(),
        }
    }

    /// Creates an error out of `message`, recording the stack of the caller.
    pub fn new(message: impl Into<String>) -> Self {
        Self::new_skipping(message, DEFAULT_STACK_SKIP)
    }

    /// Same as [`new`](Self::new), but additionally skips `skip` caller frames.
    pub fn new_skipping(message: impl Into<String>, skip: usize) -> Self {
        Self::capture(Arc::new(Message(message.into())), skip)
    }

    /// Creates an error with a formatted message, recording the stack of the caller.
    ///
    /// Usually called through [`errorf!`](crate::errorf).
    pub fn errorf(args: fmt::Arguments<'_>) -> Self {
        Self::errorf_skipping(args, DEFAULT_STACK_SKIP)
    }

    /// Same as [`errorf`](Self::errorf), but additionally skips `skip` caller frames.
    pub fn errorf_skipping(args: fmt::Arguments<'_>, skip: usize) -> Self {
        Self::new_skipping(fmt::format(args), skip)
    }

    /// Wraps `err`, recording the stack at the wrap site.
    ///
    /// If `err` already is an [`AnnotatedError`] it is returned as is, keeping its original
    /// stack, name and fields.
    pub fn wrap<E>(err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        Self::wrap_skipping(err, DEFAULT_STACK_SKIP)
    }

    /// Same as [`wrap`](Self::wrap), but additionally skips `skip` caller frames.
    pub fn wrap_skipping<E>(err: E, skip: usize) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        let err: Box<dyn Error + Send + Sync + 'static> = err.into();
        match err.downcast::<AnnotatedError>() {
            Ok(annotated) => *annotated,
            Err(err) => Self::capture(Arc::from(err), skip),
        }
    }
}

// ── Annotations ───────────────────────────────────────────────────

impl AnnotatedError {
    /// Returns a copy of this error with `fields` merged over its own.
    pub fn with_fields(&self, fields: impl IntoFields) -> Self {
        Self {
            source: Arc::clone(&self.source),
            stack: self.stack.clone(),
            name: self.name.clone(),
            fields: fields::merge(&self.fields, fields.into_fields()),
        }
    }

    /// Returns a copy of this error with the field `key` set to `value`.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let pair: (String, Value) = (key.into(), value.into());
        self.with_fields([pair])
    }

    /// Returns a copy of this error with `key` set to `value`, plus every pair in `extras`.
    ///
    /// `extras` alternates keys and values. Keys which are not strings are stringified and a
    /// trailing key without a value is set to `null`.
    ///
    /// ```
    /// use stackerr::{json, AnnotatedError, Value};
    ///
    /// let err = AnnotatedError::new("boom").with("a", 1, [json!("b")]);
    /// assert_eq!(err.field("a"), Some(&json!(1)));
    /// assert_eq!(err.field("b"), Some(&Value::Null));
    /// ```
    pub fn with<I>(&self, key: impl Into<String>, value: impl Into<Value>, extras: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.with_fields(fields::from_pairs(key.into(), value.into(), extras))
    }

    /// Sets the name of this error.
    ///
    /// Unlike the `with_field*` methods this updates the error in place and hands it back.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the name of this error in place.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }
}

// ── Accessors ─────────────────────────────────────────────────────

impl AnnotatedError {
    /// The name of this error, if one was set.
    pub fn name(&self) -> Option<&str> {
        (!self.name.is_empty()).then_some(self.name.as_str())
    }

    /// Message of the underlying error, without the name prefix.
    pub fn message(&self) -> String {
        self.source.to_string()
    }

    /// The attached fields.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// The value of a single field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The stack captured when this error was created.
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// The wrapped error.
    pub fn underlying(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.source
    }

    /// Whether the wrapped error is an `E`.
    pub fn is<E: Error + 'static>(&self) -> bool {
        self.source.is::<E>()
    }

    /// The wrapped error, if it is an `E`.
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }

    /// Renders this error in the given [`Mode`].
    pub fn render(&self, mode: Mode) -> Rendered<'_> {
        Rendered { error: self, mode }
    }
}

// ── Rendering ─────────────────────────────────────────────────────

/// How [`AnnotatedError::render`] formats an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `name: message`, same as `{}`.
    Plain,
    /// The plain message followed by the stack, same as `{:#}`.
    Verbose,
    /// The plain message as a quoted, escaped string.
    Quoted,
}

/// Display adapter returned by [`AnnotatedError::render`].
pub struct Rendered<'e> {
    error: &'e AnnotatedError,
    mode: Mode,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Mode::Plain => write!(f, "{}", self.error),
            Mode::Verbose => write!(f, "{:#}", self.error),
            Mode::Quoted => write!(f, "{:?}", self.error.to_string()),
        }
    }
}

impl fmt::Display for AnnotatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            write!(f, "{}: ", self.name)?;
        }
        write!(f, "{}", self.source)?;

        if f.alternate() {
            write!(f, "\n{}", self.stack)?;
        }

        Ok(())
    }
}

impl fmt::Debug for AnnotatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f
                .debug_struct("AnnotatedError")
                .field("name", &self.name)
                .field("source", &self.source)
                .field("fields", &self.fields)
                .field("stack", &self.stack.frames())
                .finish();
        }

        write!(f, "{self}")?;
        if !self.fields.is_empty() {
            f.write_str(" {")?;
            for (i, (key, value)) in self.fields.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            f.write_str("}")?;
        }

        write!(f, "\n{}", self.stack)
    }
}

// ── std::error::Error ─────────────────────────────────────────────

impl Error for AnnotatedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        // the wrapped error's message is already part of our own
        self.source.source()
    }
}

// ── Serialize ─────────────────────────────────────────────────────

impl Serialize for AnnotatedError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AnnotatedError", 4)?;
        match self.name() {
            Some(name) => state.serialize_field("name", name)?,
            None => state.skip_field("name")?,
        }
        state.serialize_field("message", &self.message())?;
        state.serialize_field("fields", &self.fields)?;
        state.serialize_field("stack", &self.stack)?;
        state.end()
    }
}

// ── Free constructors ─────────────────────────────────────────────

/// Creates an error out of `message`, recording the stack of the caller.
pub fn new(message: impl Into<String>) -> AnnotatedError {
    AnnotatedError::new(message)
}

/// Creates an error with a formatted message, recording the stack of the caller.
pub fn errorf(args: fmt::Arguments<'_>) -> AnnotatedError {
    AnnotatedError::errorf(args)
}

/// Wraps `err` into an [`AnnotatedError`], unless it already is one.
pub fn wrap<E>(err: E) -> AnnotatedError
where
    E: Into<Box<dyn Error + Send + Sync + 'static>>,
{
    AnnotatedError::wrap(err)
}
