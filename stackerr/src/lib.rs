#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]

mod error;
mod fields;
mod generator;
mod result;
mod stack;

pub use error::{errorf, new, wrap, AnnotatedError, Mode, Rendered};
pub use fields::{Fields, IntoFields, Value};
pub use generator::Generator;
pub use result::ResultExt;
pub use serde_json::json;
pub use stack::{stack, Frame, Stack, DEFAULT_STACK_SKIP, STACK_DEPTH};
pub use stackerr_derive::Fields;

/// Prelude. Reexports the error type, the generator and the traits.
pub mod prelude {
    pub use crate::{errorf, AnnotatedError, Generator, IntoFields, ResultExt};
}

/// Macro that creates an [`AnnotatedError`] with a formatted message, recording the stack of the
/// caller.
///
/// ```
/// let err = stackerr::errorf!("port {} is taken", 8080);
/// assert_eq!(err.to_string(), "port 8080 is taken");
/// ```
#[macro_export]
macro_rules! errorf {
    ($($arg:tt)+) => {
        $crate::AnnotatedError::errorf(::core::format_args!($($arg)+))
    };
}

/// Macro that evaluates an expression and returns an [`AnnotatedError`] with the formatted
/// message if it is not true.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            return ::core::result::Result::Err($crate::errorf!($($arg)+).into());
        }
    };
}
