use std::fmt::Display;
use std::time::Duration;

use thiserror::Error;

use crate::generator::nodes::NodeKind;

/// 外部网关（LLM / 搜索）调用错误
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway call timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// 输出无法按约定的schema解析
    #[error("output does not match the requested schema: {0}")]
    InvalidOutput(String),
}

/// 运行失败的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SchemaViolation,
    GatewayTimeout,
    GatewayTransportError,
    StepLimitExceeded,
    EmptyFinalReport,
    InvalidConfig,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            ErrorKind::SchemaViolation => "schema violation",
            ErrorKind::GatewayTimeout => "gateway timeout",
            ErrorKind::GatewayTransportError => "gateway transport error",
            ErrorKind::StepLimitExceeded => "step limit exceeded",
            ErrorKind::EmptyFinalReport => "empty final report",
            ErrorKind::InvalidConfig => "invalid configuration",
        };
        write!(f, "{}", str)
    }
}

impl ErrorKind {
    pub fn of_gateway(err: &GatewayError) -> Self {
        match err {
            GatewayError::Timeout(_) => ErrorKind::GatewayTimeout,
            GatewayError::Transport(_) | GatewayError::Status { .. } => {
                ErrorKind::GatewayTransportError
            }
            GatewayError::InvalidOutput(_) => ErrorKind::SchemaViolation,
        }
    }
}

/// 单个节点执行失败
#[derive(Debug, Error)]
#[error("node `{node}` failed with {kind}: {source}")]
pub struct NodeError {
    pub kind: ErrorKind,
    pub node: NodeKind,
    #[source]
    pub source: GatewayError,
}

impl NodeError {
    pub fn new(node: NodeKind, source: GatewayError) -> Self {
        Self {
            kind: ErrorKind::of_gateway(&source),
            node,
            source,
        }
    }
}

/// 研究运行失败，向调用方原样传播
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("step limit of {limit} node executions exceeded")]
    StepLimitExceeded { limit: usize },

    #[error("format node produced an empty report")]
    EmptyFinalReport,

    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),
}

impl ResearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResearchError::Node(err) => err.kind,
            ResearchError::StepLimitExceeded { .. } => ErrorKind::StepLimitExceeded,
            ResearchError::EmptyFinalReport => ErrorKind::EmptyFinalReport,
            ResearchError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }
}
