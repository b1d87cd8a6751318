use serde::{Serialize, Serializer};
use thiserror::Error;

/// 路由错误类型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Token not resolved: {0}")]
    Resolution(String),

    #[error("No route found: {0}")]
    NoRoute(String),

    #[error("Oracle failure: {0}")]
    Oracle(String),

    #[error("Failed to find routes: {}", .0.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(", "))]
    AggregateSplit(Vec<SplitFailure>),

    #[error("Calldata encoding failed: {0}")]
    Encoding(String),
}

impl RoutingError {
    /// 对外暴露的错误分类
    pub fn kind(&self) -> &'static str {
        match self {
            RoutingError::Validation(_) => "validation",
            RoutingError::Resolution(_) => "resolution",
            RoutingError::NoRoute(_) => "no_route",
            RoutingError::Oracle(_) => "oracle",
            RoutingError::AggregateSplit(_) => "aggregate_split",
            RoutingError::Encoding(_) => "encoding",
        }
    }

    /// 只有传输层错误值得重试
    pub fn is_transient(&self) -> bool {
        matches!(self, RoutingError::Oracle(_))
    }
}

/// 单个拆分项的失败原因
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitFailure {
    pub index: usize,
    pub token: String,
    pub percentage: f64,
    #[serde(serialize_with = "serialize_cause")]
    pub cause: RoutingError,
}

impl std::fmt::Display for SplitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "split #{} ({} {}%): {}",
            self.index, self.token, self.percentage, self.cause
        )
    }
}

fn serialize_cause<S: Serializer>(cause: &RoutingError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&cause.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_lists_every_failure() {
        let err = RoutingError::AggregateSplit(vec![
            SplitFailure {
                index: 1,
                token: "FOO".into(),
                percentage: 40.0,
                cause: RoutingError::Resolution("Output token FOO not found or not supported".into()),
            },
            SplitFailure {
                index: 2,
                token: "BAR".into(),
                percentage: 10.0,
                cause: RoutingError::NoRoute("WETH -> BAR".into()),
            },
        ]);

        let message = err.to_string();
        assert!(message.starts_with("Failed to find routes: "));
        assert!(message.contains("split #1 (FOO 40%)"));
        assert!(message.contains("split #2 (BAR 10%): No route found: WETH -> BAR"));
        assert_eq!(err.kind(), "aggregate_split");
        assert!(!err.is_transient());
        assert!(RoutingError::Oracle("timeout".into()).is_transient());
    }
}
