use skillknife_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The packaging tool exited unsuccessfully.
    #[error("{command} failed ({}): {stderr}", exit_label(.code))]
    Subprocess {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    /// The request cannot be carried out as given.
    #[error("{0}")]
    Validation(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error(transparent)]
    Market(#[from] skillknife_markets::Error),
    #[error(transparent)]
    Skills(#[from] skillknife_skills::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".into(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

skillknife_common::impl_context!();
