use dex::QuoteOracle;
use ethers::types::U256;
use futures_util::future::join_all;
use models::{FeeTier, SwapPath, Token};
use std::sync::Arc;
use tracing::{debug, info};

/// 路径查找器
///
/// 在固定费率档位上枚举直连和经一个 base token 的两跳路径，按报价输出排序
pub struct PathFinder {
    oracle: Arc<dyn QuoteOracle>,
}

impl PathFinder {
    pub fn new(oracle: Arc<dyn QuoteOracle>) -> Self {
        Self { oracle }
    }

    /// 查找 input -> 每个 output 的全部可报价路径
    ///
    /// 返回值按 `SwapPath::rank_order` 排序，不做截断；空列表表示没有路由
    pub async fn find_best_paths(
        &self,
        amount: U256,
        input: &Token,
        base_tokens: &[Token],
        output_tokens: &[Token],
    ) -> Vec<SwapPath> {
        if amount.is_zero() {
            debug!(target: "path_finder", "输入数量为 0, 跳过搜索");
            return Vec::new();
        }

        let searches = output_tokens.iter().filter_map(|output| {
            if output.same_asset(input) {
                debug!(target: "path_finder", "输出与输入相同, 跳过 {}", output.symbol);
                None
            } else {
                Some(self.paths_to(amount, input, base_tokens, output))
            }
        });

        let mut paths: Vec<SwapPath> = join_all(searches).await.into_iter().flatten().collect();
        paths.sort_by(SwapPath::rank_order);

        info!(
            target: "path_finder",
            "{} -> {} 个目标: 找到 {} 条路径, 最优 {}",
            input.symbol,
            output_tokens.len(),
            paths.len(),
            paths.first().map(|p| p.to_string()).unwrap_or_else(|| "无".to_string())
        );

        paths
    }

    async fn paths_to(&self, amount: U256, input: &Token, base_tokens: &[Token], output: &Token) -> Vec<SwapPath> {
        let bases = base_tokens
            .iter()
            .filter(|base| !base.same_asset(input) && !base.same_asset(output));

        let (direct, two_hop) = tokio::join!(
            self.direct_paths(amount, input, output),
            join_all(bases.map(|base| self.two_hop_paths(amount, input, base, output)))
        );

        direct.into_iter().chain(two_hop.into_iter().flatten()).collect()
    }

    /// 同一对 token 在每个费率档位上的报价，顺序与 `FeeTier::ALL` 一致
    async fn quote_tiers(&self, token_in: &Token, token_out: &Token, amount: U256) -> Vec<(FeeTier, U256)> {
        join_all(FeeTier::ALL.iter().map(|&fee| async move {
            (fee, self.oracle.quote(token_in, token_out, fee, amount).await)
        }))
        .await
    }

    async fn direct_paths(&self, amount: U256, input: &Token, output: &Token) -> Vec<SwapPath> {
        self.quote_tiers(input, output, amount)
            .await
            .into_iter()
            .filter_map(|(fee, amount_out)| {
                if amount_out.is_zero() {
                    debug!(target: "path_finder", "丢弃 {} -> [{}] -> {}: 无流动性", input.symbol, fee.pips(), output.symbol);
                    return None;
                }
                let path = SwapPath::direct(input.clone(), output.clone(), fee, amount_out);
                debug!(target: "path_finder", "保留候选 {}", path);
                Some(path)
            })
            .collect()
    }

    async fn two_hop_paths(&self, amount: U256, input: &Token, base: &Token, output: &Token) -> Vec<SwapPath> {
        let first_hops: Vec<(FeeTier, U256)> = self
            .quote_tiers(input, base, amount)
            .await
            .into_iter()
            .filter(|(fee, mid)| {
                let keep = !mid.is_zero();
                if !keep {
                    debug!(target: "path_finder", "丢弃第一跳 {} -> [{}] -> {}", input.symbol, fee.pips(), base.symbol);
                }
                keep
            })
            .collect();

        let second_hops = join_all(first_hops.iter().map(|&(fee1, mid)| async move {
            (fee1, self.quote_tiers(base, output, mid).await)
        }))
        .await;

        let mut paths = Vec::new();
        for (fee1, quotes) in second_hops {
            for (fee2, amount_out) in quotes {
                if amount_out.is_zero() {
                    debug!(
                        target: "path_finder",
                        "丢弃 {} -> [{}] -> {} -> [{}] -> {}: 无流动性",
                        input.symbol, fee1.pips(), base.symbol, fee2.pips(), output.symbol
                    );
                    continue;
                }
                let path = SwapPath::through_base(
                    input.clone(),
                    base.clone(),
                    output.clone(),
                    fee1,
                    fee2,
                    amount_out,
                );
                debug!(target: "path_finder", "保留候选 {}", path);
                paths.push(path);
            }
        }
        paths
    }
}
