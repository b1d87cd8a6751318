use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Uniswap V3 池子费率档位
///
/// 链上以 1e6 为基数 (3000 = 0.3%)，档位集合由协议固定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum FeeTier {
    /// 0.01%
    Lowest,
    /// 0.05%
    Low,
    /// 0.3%
    Medium,
    /// 1%
    High,
}

impl FeeTier {
    pub const ALL: [FeeTier; 4] = [FeeTier::Lowest, FeeTier::Low, FeeTier::Medium, FeeTier::High];

    /// 链上 uint24 费率值
    pub fn pips(&self) -> u32 {
        match self {
            FeeTier::Lowest => 100,
            FeeTier::Low => 500,
            FeeTier::Medium => 3000,
            FeeTier::High => 10000,
        }
    }

    /// 基点 (1, 5, 30, 100)
    pub fn bps(&self) -> u32 {
        self.pips() / 100
    }

    pub fn from_pips(pips: u32) -> Option<Self> {
        match pips {
            100 => Some(FeeTier::Lowest),
            500 => Some(FeeTier::Low),
            3000 => Some(FeeTier::Medium),
            10000 => Some(FeeTier::High),
            _ => None,
        }
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.pips() as f64 / 10_000.0)
    }
}

impl From<FeeTier> for u32 {
    fn from(fee: FeeTier) -> Self {
        fee.pips()
    }
}

impl TryFrom<u32> for FeeTier {
    type Error = String;

    fn try_from(pips: u32) -> Result<Self, Self::Error> {
        FeeTier::from_pips(pips).ok_or_else(|| format!("unsupported fee tier: {}", pips))
    }
}

/// Quoter 合约版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoterVersion {
    /// quoteExactInputSingle(address,address,uint24,uint256,uint160)
    V1,
    /// quoteExactInputSingle((address,address,uint256,uint24,uint160))
    V2,
}

impl FromStr for QuoterVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v1" | "1" => Ok(QuoterVersion::V1),
            "v2" | "2" => Ok(QuoterVersion::V2),
            other => Err(format!("unknown quoter version: {}", other)),
        }
    }
}

/// Swap Router 合约版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouterVersion {
    /// SwapRouter: deadline 在参数结构体内, multicall(bytes[])
    V1,
    /// SwapRouter02: deadline 放在 multicall(uint256,bytes[])
    V2,
}

impl FromStr for RouterVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v1" | "1" => Ok(RouterVersion::V1),
            "v2" | "2" | "02" => Ok(RouterVersion::V2),
            other => Err(format!("unknown router version: {}", other)),
        }
    }
}
