use std::sync::Arc;
use strategies::RouterSession;

/// API 应用状态
#[derive(Clone)]
pub struct AppState {
    /// 启动时构造的路由会话，所有请求共用
    pub session: Arc<RouterSession>,
}

impl AppState {
    pub fn new(session: Arc<RouterSession>) -> Self {
        Self { session }
    }
}
