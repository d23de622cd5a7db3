use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum XPathError {
    #[error("XPath parse error in '{0}': {1}")]
    XPathParse(String, String),

    #[error("Function '{function}' error: {message}")]
    FunctionError { function: String, message: String },

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Variable '{0}' not found")]
    UnknownVariable(String),

    #[error("Namespace prefix '{0}' is not bound")]
    UnboundPrefix(String),
}
