use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the idomizer compiler and runtime
#[derive(Error, Debug)]
pub enum Error {
    /// The markup tokenizer rejected the (shielded) template text.
    #[error("Tokenizer error: {0}")]
    Tokenize(String),

    /// A code span could not be parsed as a template expression.
    #[error("Expression error: {0}")]
    Expression(String),

    /// The template misuses a directive or the emitted instruction
    /// stream could not be linked into a render plan.
    #[error("Template error: {0}")]
    Template(String),

    /// A template expression failed to evaluate at render time.
    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

impl Error {
    pub fn tokenize(msg: impl Into<String>) -> Self {
        Self::Tokenize(msg.into())
    }

    pub fn expression(msg: impl Into<String>) -> Self {
        Self::Expression(msg.into())
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Self::Tokenize(err.to_string())
    }
}
