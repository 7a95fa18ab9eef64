use std::fmt::Display;

/// Error for crates without a taxonomy of their own (config loading).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{message}")]
    Message { message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// An error type buildable from a message. Required by [`impl_context!`].
pub trait FromMessage: Sized {
    fn from_message(message: String) -> Self;
}

/// `"<context>: <source>"`, the shape every context message takes.
pub fn prefixed(context: &str, source: impl Display) -> String {
    format!("{context}: {source}")
}

/// Define a `Context` trait in the calling module, adding `.context()` and
/// `.with_context()` to `Result` and `Option`.
///
/// The calling module must have `Error: FromMessage` and a `Result<T>` alias
/// in scope:
///
/// ```ignore
/// skillknife_common::impl_context!();
/// ```
#[macro_export]
macro_rules! impl_context {
    () => {
        pub trait Context<T> {
            fn context(self, context: impl Into<String>) -> Result<T>;

            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C;
        }

        impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                self.with_context(|| context)
            }

            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.map_err(|source| {
                    <Error as $crate::FromMessage>::from_message($crate::error::prefixed(
                        &f().into(),
                        source,
                    ))
                })
            }
        }

        impl<T> Context<T> for Option<T> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                self.with_context(|| context)
            }

            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.ok_or_else(|| <Error as $crate::FromMessage>::from_message(f().into()))
            }
        }
    };
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    mod local {
        pub use crate::error::{Error, Result};

        crate::impl_context!();
    }

    use local::Context;

    #[test]
    fn result_context_prefixes_source() {
        let failed: Result<(), &str> = Err("disk full");
        let err = failed.context("saving profile").unwrap_err();
        assert_eq!(err.to_string(), "saving profile: disk full");
    }

    #[test]
    fn option_context_uses_message_alone() {
        let err = None::<u8>
            .with_context(|| format!("no market named {}", "x"))
            .unwrap_err();
        assert_eq!(err.to_string(), "no market named x");
        assert_eq!(Some(3).context("unused").unwrap(), 3);
    }
}
