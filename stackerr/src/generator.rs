use crate::error::AnnotatedError;
use crate::fields::{Fields, IntoFields, Value};
use std::error::Error;
use std::fmt;

/// Factory stamping a fixed name and a set of base fields onto the errors it creates.
///
/// Meant to be created once per subsystem so that all of its errors carry the same tags:
///
/// ```
/// use stackerr::Generator;
///
/// let mut db = Generator::new("db");
/// db.with_field("component", "sql");
///
/// let err = db.error("timeout");
/// assert_eq!(err.to_string(), "db: timeout");
/// assert_eq!(err.field("component").and_then(|v| v.as_str()), Some("sql"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Generator {
    name: String,
    fields: Fields,
}

impl Generator {
    /// Creates a generator with the given name and no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Fields::new(),
        }
    }

    /// Adds `key` to the base fields, replacing a previous value.
    pub fn with_field(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Adds `fields` to the base fields, replacing previous values.
    pub fn with_fields(&mut self, fields: impl IntoFields) -> &mut Self {
        self.fields.extend(fields.into_fields());
        self
    }

    /// The name stamped onto created errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current base fields.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Applies this generator's fields and name to `err`.
    pub fn stamp(&self, err: AnnotatedError) -> AnnotatedError {
        err.with_fields(self.fields.clone()).with_name(self.name.clone())
    }

    /// Creates a stamped error out of `message`.
    pub fn error(&self, message: impl Into<String>) -> AnnotatedError {
        self.stamp(AnnotatedError::new(message))
    }

    /// Creates a stamped error with a formatted message.
    pub fn errorf(&self, args: fmt::Arguments<'_>) -> AnnotatedError {
        self.stamp(AnnotatedError::errorf(args))
    }

    /// Wraps and stamps `err`.
    ///
    /// Errors which already are [`AnnotatedError`]s are returned untouched: their name and
    /// fields describe where they came from and are never overwritten.
    pub fn wrap<E>(&self, err: E) -> AnnotatedError
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        let err: Box<dyn Error + Send + Sync + 'static> = err.into();
        if err.is::<AnnotatedError>() {
            tracing::trace!(generator = %self.name, error = %err, "error already annotated, not stamping");
            return AnnotatedError::wrap(err);
        }

        self.stamp(AnnotatedError::wrap(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io;

    fn db() -> Generator {
        let mut generator = Generator::new("db");
        generator.with_field("component", "sql");
        generator
    }

    #[test]
    fn error_is_stamped() {
        let err = db().error("timeout");
        assert_eq!(err.name(), Some("db"));
        assert_eq!(err.message(), "timeout");
        assert_eq!(err.to_string(), "db: timeout");
        assert_eq!(err.field("component"), Some(&json!("sql")));
    }

    #[test]
    fn errorf_is_stamped() {
        let err = db().errorf(format_args!("timeout after {}ms", 250));
        assert_eq!(err.to_string(), "db: timeout after 250ms");
        assert_eq!(err.field("component"), Some(&json!("sql")));
    }

    #[test]
    fn fields_accumulate() {
        let mut generator = db();
        generator
            .with_fields([("component", "pg"), ("region", "eu")])
            .with_field("retries", 3);

        assert_eq!(
            generator.fields(),
            &[
                ("component", json!("pg")),
                ("region", json!("eu")),
                ("retries", json!(3)),
            ]
            .into_fields()
        );
    }

    #[test]
    fn later_fields_do_not_leak_into_earlier_errors() {
        let mut generator = db();
        let before = generator.error("a");
        generator.with_field("late", true);
        let after = generator.error("b");

        assert_eq!(before.field("late"), None);
        assert_eq!(after.field("late"), Some(&json!(true)));
    }

    #[test]
    fn wrap_stamps_foreign_errors() {
        let err = db().wrap(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert_eq!(err.to_string(), "db: slow");
        assert_eq!(err.field("component"), Some(&json!("sql")));
        assert!(err.is::<io::Error>());
    }

    #[test]
    fn wrap_keeps_annotated_errors_untouched() {
        let original = AnnotatedError::new("boom")
            .with_field("origin", "cache")
            .with_name("cache");
        let err = db().wrap(original.clone());

        assert_eq!(err.name(), Some("cache"));
        assert_eq!(err.fields(), original.fields());
        assert_eq!(err.field("component"), None);
        assert!(err.stack().same_capture(original.stack()));
    }
}
