use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::amount::u256_dec;
use crate::{FeeTier, Token};

/// 报价得到的兑换路径
///
/// 有 base_token 时恰好两跳，否则一跳
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapPath {
    pub input_token: Token,
    pub output_token: Token,
    pub base_token: Option<Token>,
    pub fee1: FeeTier,
    pub fee2: Option<FeeTier>,
    /// 输出代币最小单位
    #[serde(with = "u256_dec")]
    pub output_amount: U256,
    /// 途经的代币地址
    pub path: Vec<Address>,
}

impl SwapPath {
    /// 单跳路径
    pub fn direct(input_token: Token, output_token: Token, fee: FeeTier, output_amount: U256) -> Self {
        let path = vec![input_token.address, output_token.address];
        Self {
            input_token,
            output_token,
            base_token: None,
            fee1: fee,
            fee2: None,
            output_amount,
            path,
        }
    }

    /// 经过中间代币的两跳路径
    pub fn through_base(
        input_token: Token,
        base_token: Token,
        output_token: Token,
        fee1: FeeTier,
        fee2: FeeTier,
        output_amount: U256,
    ) -> Self {
        let path = vec![input_token.address, base_token.address, output_token.address];
        Self {
            input_token,
            output_token,
            base_token: Some(base_token),
            fee1,
            fee2: Some(fee2),
            output_amount,
            path,
        }
    }

    pub fn hop_count(&self) -> usize {
        if self.base_token.is_some() {
            2
        } else {
            1
        }
    }

    /// 每一跳的费率，顺序与 path 一致
    pub fn fees(&self) -> Vec<FeeTier> {
        std::iter::once(self.fee1).chain(self.fee2).collect()
    }

    /// 累计费率 (pips)
    pub fn cumulative_fee_pips(&self) -> u32 {
        self.fees().iter().map(|f| f.pips()).sum()
    }

    /// 排序规则: 输出降序 -> 跳数少优先 -> 累计费率低优先
    pub fn rank_order(a: &SwapPath, b: &SwapPath) -> Ordering {
        b.output_amount
            .cmp(&a.output_amount)
            .then_with(|| a.hop_count().cmp(&b.hop_count()))
            .then_with(|| a.cumulative_fee_pips().cmp(&b.cumulative_fee_pips()))
    }
}

impl fmt::Display for SwapPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.base_token, self.fee2) {
            (Some(base), Some(fee2)) => write!(
                f,
                "{} -> [{}] -> {} -> [{}] -> {} = {}",
                self.input_token.symbol,
                self.fee1.pips(),
                base.symbol,
                fee2.pips(),
                self.output_token.symbol,
                self.output_amount
            ),
            _ => write!(
                f,
                "{} -> [{}] -> {} = {}",
                self.input_token.symbol,
                self.fee1.pips(),
                self.output_token.symbol,
                self.output_amount
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_tokens;

    fn token(address: Address, symbol: &str, decimals: u8) -> Token {
        Token::new(address, symbol.to_string(), symbol.to_string(), decimals, 8453)
    }

    #[test]
    fn test_path_shapes() {
        let weth = token(*base_tokens::WETH, "WETH", 18);
        let usdc = token(*base_tokens::USDC, "USDC", 6);
        let dai = token(*base_tokens::DAI, "DAI", 18);

        let direct = SwapPath::direct(weth.clone(), usdc.clone(), FeeTier::Low, U256::from(100));
        assert_eq!(direct.hop_count(), 1);
        assert_eq!(direct.path.len(), 2);
        assert_eq!(direct.to_string(), "WETH -> [500] -> USDC = 100");

        let two_hop = SwapPath::through_base(dai, weth, usdc, FeeTier::Medium, FeeTier::Low, U256::from(7));
        assert_eq!(two_hop.hop_count(), 2);
        assert_eq!(two_hop.fees(), vec![FeeTier::Medium, FeeTier::Low]);
        assert_eq!(two_hop.cumulative_fee_pips(), 3500);
        assert_eq!(two_hop.to_string(), "DAI -> [3000] -> WETH -> [500] -> USDC = 7");
    }

    #[test]
    fn test_rank_order_breaks_ties() {
        let weth = token(*base_tokens::WETH, "WETH", 18);
        let usdc = token(*base_tokens::USDC, "USDC", 6);
        let dai = token(*base_tokens::DAI, "DAI", 18);

        let high = SwapPath::direct(weth.clone(), usdc.clone(), FeeTier::High, U256::from(10));
        let low = SwapPath::direct(weth.clone(), usdc.clone(), FeeTier::Low, U256::from(10));
        let two_hop = SwapPath::through_base(weth.clone(), dai, usdc.clone(), FeeTier::Lowest, FeeTier::Lowest, U256::from(10));
        let best = SwapPath::direct(weth, usdc, FeeTier::High, U256::from(11));

        let mut paths = vec![two_hop.clone(), high.clone(), low.clone(), best.clone()];
        paths.sort_by(SwapPath::rank_order);
        assert_eq!(paths, vec![best, low, high, two_hop]);
    }

    #[test]
    fn test_serializes_amount_as_decimal() {
        let weth = token(*base_tokens::WETH, "WETH", 18);
        let usdc = token(*base_tokens::USDC, "USDC", 6);
        let path = SwapPath::direct(weth, usdc, FeeTier::Medium, U256::exp10(18));
        let value = serde_json::to_value(&path).unwrap();
        assert_eq!(value["outputAmount"], "1000000000000000000");
        assert_eq!(value["fee1"], 3000);
        assert!(value["baseToken"].is_null());
    }
}
