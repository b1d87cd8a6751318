use std::fs;
use tracing_subscriber::filter::{EnvFilter, FilterFn, LevelFilter};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};
use tracing_appender::{non_blocking, rolling};

/// 路由相关的日志 target
const ROUTING_TARGETS: [&str; 3] = ["path_finder", "split_router", "retry"];

/// API 请求日志 target
const API_TARGET: &str = "api::handlers";

/// 日志管理器 - 基于target分类的日志系统
pub struct LoggerManager {
    _guards: Vec<non_blocking::WorkerGuard>,
}

impl LoggerManager {
    /// 初始化日志系统
    ///
    /// 日志分类：
    /// - 控制台: 由 `level` (RUST_LOG 语法) 控制
    /// - app.log: 通用应用日志
    /// - routing.log: 路径搜索 / 拆分路由 / 重试日志
    /// - api.log: API请求日志
    pub fn init(dir: &str, level: &str) -> Self {
        let mut guards = Vec::new();

        // 创建日志目录
        fs::create_dir_all(dir).ok();

        let timer = OffsetTime::new(
            time::UtcOffset::UTC,
            time::format_description::well_known::Rfc3339,
        );

        // 1. 控制台输出
        let console_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        let console_layer = fmt::layer()
            .compact()
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(console_filter);

        // 2. 通用应用日志 (app.log)
        let (app_writer, app_guard) = non_blocking(rolling::daily(dir, "app.log"));
        guards.push(app_guard);

        let app_layer = fmt::layer()
            .compact()
            .with_writer(app_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(LevelFilter::INFO)
            .with_filter(FilterFn::new(|metadata| {
                let target = metadata.target();
                !ROUTING_TARGETS.contains(&target) && target != API_TARGET
            }));

        // 3. 路由日志 (routing.log)，保留 DEBUG 以便回溯候选路径
        let (routing_writer, routing_guard) = non_blocking(rolling::daily(dir, "routing.log"));
        guards.push(routing_guard);

        let routing_layer = fmt::layer()
            .compact()
            .with_writer(routing_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(LevelFilter::DEBUG)
            .with_filter(FilterFn::new(|metadata| {
                ROUTING_TARGETS.contains(&metadata.target())
            }));

        // 4. API请求日志 (api.log)
        let (api_writer, api_guard) = non_blocking(rolling::daily(dir, "api.log"));
        guards.push(api_guard);

        let api_layer = fmt::layer()
            .compact()
            .with_writer(api_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer)
            .with_filter(FilterFn::new(|metadata| metadata.target() == API_TARGET));

        // 初始化tracing订阅器
        tracing_subscriber::registry()
            .with(console_layer)
            .with(app_layer)
            .with(routing_layer)
            .with(api_layer)
            .init();

        Self { _guards: guards }
    }
}
