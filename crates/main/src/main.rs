//! Uniswap V3 拆分路由服务
//!
//! 使用方法:
//!   # 启动 HTTP 服务 (默认)
//!   cargo run -p splitswap -- serve
//!
//!   # 计算一次拆分路由
//!   cargo run -p splitswap -- route --input ETH --amount 1.5 --split USDC:60 --split DAI:40
//!
//!   # 列出候选路径
//!   cargo run -p splitswap -- paths --input ETH --amount 1 --output USDC

mod bootstrap;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use config_crate::AppConfig;
use ethers::types::Address;
use models::SplitRequest;
use strategies::{FindPathsRequest, SplitRouteRequest};
use tracing::info;
use utils::LoggerManager;

use crate::bootstrap::{setup_panic_hook, Application};

#[derive(Parser)]
#[command(name = "splitswap")]
#[command(about = "Uniswap V3 拆分路由服务")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 启动 HTTP API 服务
    Serve,

    /// 计算拆分路由并输出 JSON
    Route {
        /// 输入 token symbol
        #[arg(short, long)]
        input: String,

        /// 输入数量 (十进制)
        #[arg(short, long)]
        amount: String,

        /// 拆分项 SYMBOL:PERCENT，可重复
        #[arg(short, long = "split", required = true)]
        splits: Vec<String>,

        /// 接收地址 (默认 WALLET_ADDRESS)
        #[arg(short, long)]
        recipient: Option<String>,

        #[arg(long)]
        slippage_bps: Option<u32>,

        #[arg(long)]
        deadline_secs: Option<u64>,

        /// 保留成功的腿，不因单个失败整体报错
        #[arg(long, conflicts_with = "submit")]
        partial: bool,

        /// 用 PRIVATE_KEY 签名并发送 multicall
        #[arg(long)]
        submit: bool,
    },

    /// 列出 input -> outputs 的候选路径
    Paths {
        #[arg(short, long)]
        input: String,

        #[arg(short, long)]
        amount: String,

        /// 输出 token symbol，可重复
        #[arg(short, long = "output", required = true)]
        outputs: Vec<String>,

        /// 覆盖配置的 base token，可重复
        #[arg(short, long = "base")]
        bases: Vec<String>,

        #[arg(short, long)]
        limit: Option<usize>,
    },
}

/// 解析 `USDC:60` 形式的拆分项
fn parse_split(raw: &str) -> Result<SplitRequest> {
    let (token, percentage) = raw
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("Invalid split {}, expected SYMBOL:PERCENT", raw))?;
    let token = token.trim();
    if token.is_empty() {
        return Err(anyhow!("Invalid split {}, missing token", raw));
    }
    let percentage: f64 = percentage
        .trim()
        .parse()
        .with_context(|| format!("Invalid split percentage in {}", raw))?;
    Ok(SplitRequest::new(token, percentage))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = AppConfig::load()?;

    // 初始化日志系统
    let _logger = LoggerManager::init(&config.log.dir, &config.log.level);

    // 设置 panic hook
    setup_panic_hook();

    info!("========================================");
    info!("  Uniswap V3 拆分路由服务启动");
    info!("========================================");

    let app = Application::start(config).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => app.run_server().await?,
        Commands::Route {
            input,
            amount,
            splits,
            recipient,
            slippage_bps,
            deadline_secs,
            partial,
            submit,
        } => {
            let recipient = recipient
                .map(|raw| raw.parse::<Address>().map_err(|e| anyhow!("Invalid recipient {}: {}", raw, e)))
                .transpose()?;
            let request = SplitRouteRequest {
                input_token: input,
                input_amount: amount,
                splits: splits.iter().map(|s| parse_split(s)).collect::<Result<_>>()?,
                slippage_bps,
                deadline_secs,
            };

            if partial {
                let outcome = app.session().split_outcome(recipient, &request).await?;
                print_json(&outcome)?;
            } else {
                let result = app.session().split_routes(recipient, &request).await?;
                print_json(&result)?;
                if submit {
                    let tx_hash = app.submit(&result).await?;
                    println!("{}", tx_hash);
                }
            }
        }
        Commands::Paths {
            input,
            amount,
            outputs,
            bases,
            limit,
        } => {
            let request = FindPathsRequest {
                input_token: input,
                input_amount: amount,
                output_tokens: outputs,
                base_tokens: if bases.is_empty() { None } else { Some(bases) },
                limit,
            };
            let paths = app.session().find_paths(&request).await?;
            print_json(&paths)?;
        }
    }

    info!("系统已停止");
    Ok(())
}
