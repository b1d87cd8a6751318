use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ethers::types::Address;
use models::{RoutingError, SplitRequest};
use serde::{Deserialize, Serialize};
use strategies::{FindPathsRequest, SplitRouteRequest};
use tracing::{info, warn};

use crate::state::AppState;

/// 统一响应结构
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 错误分类，见 `RoutingError::kind`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }

    pub fn error(err: &RoutingError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            kind: Some(err.kind()),
        }
    }
}

/// 拆分路由请求参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRoutesParams {
    pub input_token: String,
    pub input_amount: String,
    pub splits: Vec<SplitRequest>,
    /// 不传则用配置的钱包地址
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub slippage_bps: Option<u32>,
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl SplitRoutesParams {
    fn into_request(self) -> Result<(Option<Address>, SplitRouteRequest), RoutingError> {
        let recipient = match self.recipient.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<Address>().map_err(|_| {
                RoutingError::Validation(format!("invalid recipient address: {}", raw))
            })?),
        };
        Ok((
            recipient,
            SplitRouteRequest {
                input_token: self.input_token,
                input_amount: self.input_amount,
                splits: self.splits,
                slippage_bps: self.slippage_bps,
                deadline_secs: self.deadline_secs,
            },
        ))
    }
}

/// `/api/routes` 的请求体，按 `action` 字段分发
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RouteAction {
    /// 拆分路由，任一腿失败则整体失败
    SplitRoutes(SplitRoutesParams),
    /// 拆分路由，返回成功的腿和失败列表
    SplitOutcome(SplitRoutesParams),
    FindPaths(FindPathsRequest),
}

impl RouteAction {
    fn name(&self) -> &'static str {
        match self {
            RouteAction::SplitRoutes(_) => "split_routes",
            RouteAction::SplitOutcome(_) => "split_outcome",
            RouteAction::FindPaths(_) => "find_paths",
        }
    }
}

/// 错误分类到 HTTP 状态码
pub fn status_for(err: &RoutingError) -> StatusCode {
    match err {
        RoutingError::Validation(_) => StatusCode::BAD_REQUEST,
        RoutingError::Resolution(_) | RoutingError::NoRoute(_) | RoutingError::AggregateSplit(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RoutingError::Oracle(_) => StatusCode::BAD_GATEWAY,
        RoutingError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(action: &str, result: Result<T, RoutingError>) -> Response {
    match result {
        Ok(data) => {
            info!(target: "api::handlers", "{} 成功", action);
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(e) => {
            warn!(target: "api::handlers", "{} 失败: {}", action, e);
            (status_for(&e), Json(ApiResponse::<()>::error(&e))).into_response()
        }
    }
}

/// 路由计算入口
pub async fn route_action(
    State(state): State<AppState>,
    payload: Result<Json<RouteAction>, JsonRejection>,
) -> Response {
    let Json(action) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            let err = RoutingError::Validation(rejection.body_text());
            warn!(target: "api::handlers", "请求体无法解析: {}", err);
            return (status_for(&err), Json(ApiResponse::<()>::error(&err))).into_response();
        }
    };

    let name = action.name();
    info!(target: "api::handlers", "收到请求: {}", name);
    match action {
        RouteAction::SplitRoutes(params) => {
            let result = match params.into_request() {
                Ok((recipient, request)) => state.session.split_routes(recipient, &request).await,
                Err(e) => Err(e),
            };
            respond(name, result)
        }
        RouteAction::SplitOutcome(params) => {
            let result = match params.into_request() {
                Ok((recipient, request)) => state.session.split_outcome(recipient, &request).await,
                Err(e) => Err(e),
            };
            respond(name, result)
        }
        RouteAction::FindPaths(request) => respond(name, state.session.find_paths(&request).await),
    }
}
