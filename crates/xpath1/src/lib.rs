pub mod ast;
pub mod axes;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod functions;
pub mod namespace;
pub mod operators;
pub mod parser;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NameTest, NodeTest, Step};
pub use datasource::{DataSourceNode, NodeType, QName};
pub use engine::{EvaluationContext, XPathValue, evaluate};
pub use namespace::{NamespaceBindings, XML_NAMESPACE};

// Re-export test utilities for integration testing in downstream crates
pub use datasource::tests;
pub use error::XPathError;
pub use parser::parse_expression;
