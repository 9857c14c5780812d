use backtrace::Symbol;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Maximum number of frames a capture keeps.
pub const STACK_DEPTH: usize = 32;

/// Extra frames skipped by the plain constructors ([`new`](crate::new), [`wrap`](crate::wrap),
/// ...). Helper layers built on top of this crate pass their own depth to the `*_skipping`
/// constructors instead.
pub const DEFAULT_STACK_SKIP: usize = 0;

/// Path of the frames belonging to this crate.
const OWN_PATH: &str = "stackerr::";

/// Standard library paths that may sit between two frames of this crate (`Result::map_err` and
/// the like).
const BRIDGE_PATHS: &[&str] = &["core::", "alloc::", "std::"];

const UNKNOWN: &str = "<unknown>";

/// A single resolved call frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    function: String,
    file: String,
    line: u32,
}

impl Frame {
    fn from_symbol(symbol: &Symbol) -> Self {
        Self {
            function: symbol
                .name()
                .map(|name| format!("{name:#}"))
                .unwrap_or_else(|| UNKNOWN.to_owned()),
            file: symbol
                .filename()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| UNKNOWN.to_owned()),
            line: symbol.lineno().unwrap_or(0),
        }
    }

    fn unknown() -> Self {
        Self {
            function: UNKNOWN.to_owned(),
            file: UNKNOWN.to_owned(),
            line: 0,
        }
    }

    /// Demangled function path, without the symbol hash.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Source file, or `<unknown>` when debug info is missing.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Source line, or `0` when debug info is missing.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Whether this frame is a function of this crate, including trait impls such as
    /// `<Result<T, E> as stackerr::ResultExt<T>>::annotate`.
    fn is_own(&self) -> bool {
        self.function.trim_start_matches('<').starts_with(OWN_PATH)
            || self.function.contains(" as stackerr::")
    }

    fn is_bridge(&self) -> bool {
        self.function == UNKNOWN
            || BRIDGE_PATHS
                .iter()
                .any(|p| self.function.trim_start_matches('<').starts_with(p))
    }
}

/// Resolves the symbols of `frame`, innermost inlined function first.
fn resolve(frame: &backtrace::Frame) -> Vec<Frame> {
    let mut frames = Vec::new();
    backtrace::resolve_frame(frame, |symbol| frames.push(Frame::from_symbol(symbol)));
    if frames.is_empty() {
        frames.push(Frame::unknown());
    }

    frames
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\t{}:{}", self.function, self.file, self.line)
    }
}

/// An immutable call stack, innermost frame first.
///
/// Captured once and shared by every copy of the error that owns it, so cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Stack {
    frames: Arc<[Frame]>,
}

impl Stack {
    /// Captures the current call stack.
    ///
    /// The leading frames of the unwinder and of this crate are dropped, up to and including the
    /// outermost frame of this crate that precedes the caller. Then `skip` more frames are
    /// dropped, so the first frame is the caller's (or the caller's caller's, and so on).
    /// Symbols are resolved lazily: past the leading frames, only the kept ones are resolved.
    /// The result always holds at least one frame.
    #[inline(never)]
    pub fn capture(skip: usize) -> Self {
        let mut raw = Vec::new();
        backtrace::trace(|frame| {
            raw.push(frame.clone());
            true
        });

        let mut resolved = raw.iter().flat_map(resolve);

        // unwinder frames come first, then ours, possibly interleaved with std adapters
        let mut leading = Vec::new();
        let mut seen_own = false;
        let mut caller = None;
        for frame in resolved.by_ref() {
            if frame.is_own() {
                seen_own = true;
            } else if seen_own && !frame.is_bridge() {
                caller = Some(frame);
                break;
            }
            leading.push(frame);
        }

        let start = leading
            .iter()
            .rposition(Frame::is_own)
            .map_or(0, |last_own| last_own + 1);

        let mut frames: Vec<Frame> = leading
            .drain(start..)
            .chain(caller)
            .chain(resolved)
            .skip(skip)
            .take(STACK_DEPTH)
            .collect();

        if frames.is_empty() {
            tracing::debug!(skip, "no caller frame could be resolved");
            frames.push(Frame::unknown());
        }

        Self {
            frames: frames.into(),
        }
    }

    /// The captured frames, innermost first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Whether both stacks are the very same capture.
    pub fn same_capture(&self, other: &Stack) -> bool {
        Arc::ptr_eq(&self.frames, &other.frames)
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{frame}")?;
        }

        Ok(())
    }
}

/// Captures and returns the current call stack, skipping `skip` frames beyond the internal
/// ones. Not tied to any error, handy for ad hoc diagnostics.
#[inline(never)]
pub fn stack(skip: usize) -> Stack {
    Stack::capture(skip)
}
