use std::fmt;

macro_rules! err {
    ($kind:ident, $msg:literal) => {
        DexError::new(ErrorKind::$kind, $msg)
    };
    ($kind:ident, $fmtstr:literal, $($args:tt)*) => {
        DexError::new(ErrorKind::$kind, &format!($fmtstr, $($args)*))
    };
}

#[macro_export]
macro_rules! fail {
    ($kind:ident, $msg:literal) => {
        return Err(DexError::new(ErrorKind::$kind, $msg))
    };
    ($kind:ident, $fmtstr:literal, $($args:tt)*) => {
        return Err(DexError::new(ErrorKind::$kind, &format!($fmtstr, $($args)*)))
    };
}

/// Broad category of a fatal decoding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A read ran past the end of the buffer.
    OutOfBounds,
    /// A pool index was outside the declared pool.
    IndexOutOfRange,
    /// A descriptor, value tag or payload had an unexpected shape.
    Format,
    /// Reading the image from disk failed.
    Io,
}

impl fmt::Display for ErrorKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let s = match self
        {
            ErrorKind::OutOfBounds => "out of bounds",
            ErrorKind::IndexOutOfRange => "index out of range",
            ErrorKind::Format => "format error",
            ErrorKind::Io => "io error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexError
{
    kind: ErrorKind,
    msg: String,
    contexts: Vec<String>,
}

pub type Result<T> = std::result::Result<T, DexError>;

impl DexError
{
    pub(crate) fn new(kind: ErrorKind, msg: &str) -> Self
    {
        DexError {
            kind,
            msg: msg.to_string(),
            contexts: Vec::new(),
        }
    }

    pub(crate) fn with_context(base: DexError, context: String) -> Self
    {
        let mut contexts = base.contexts;
        contexts.push(context);
        DexError { kind: base.kind, msg: base.msg, contexts }
    }

    pub fn kind(&self) -> ErrorKind
    {
        self.kind
    }

    pub fn message(&self) -> &str
    {
        &self.msg
    }

    /// Contexts innermost first, e.g. the method before its declaring class.
    pub fn contexts(&self) -> &[String]
    {
        &self.contexts
    }
}

impl fmt::Display for DexError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}: {}", self.kind, self.msg)?;
        let mut connector = " for ";
        for context in &self.contexts
        {
            write!(f, "{}{}", connector, context)?;
            connector = " of ";
        }
        Ok(())
    }
}

impl std::error::Error for DexError {}

/// Adds a lazily formatted context to an error result.
pub(crate) trait Context<T>
{
    fn context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> Context<T> for Result<T>
{
    fn context<F: FnOnce() -> String>(self, f: F) -> Result<T>
    {
        self.map_err(|e| DexError::with_context(e, f()))
    }
}
