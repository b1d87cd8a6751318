use ethers::types::U256;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{RoutingError, Token};

/// 百分比总和允许的误差
pub const PERCENTAGE_EPSILON: f64 = 0.01;

/// 百分比换算时保留的小数位
const PERCENTAGE_SCALE: u32 = 6;

/// 拆分请求项 (按 symbol)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRequest {
    pub token: String,
    pub percentage: f64,
}

impl SplitRequest {
    pub fn new(token: impl Into<String>, percentage: f64) -> Self {
        Self {
            token: token.into(),
            percentage,
        }
    }
}

/// 已解析输出代币的拆分项
#[derive(Debug, Clone, PartialEq)]
pub struct SplitEntry {
    pub token: Token,
    pub percentage: f64,
}

/// 校验拆分比例: 每项 (0, 100]，总和 100 ± 0.01
pub fn validate_percentages<I>(percentages: I) -> Result<(), RoutingError>
where
    I: IntoIterator<Item = f64>,
{
    let mut count = 0usize;
    let mut total = 0.0f64;

    for (index, percentage) in percentages.into_iter().enumerate() {
        if !percentage.is_finite() || percentage <= 0.0 || percentage > 100.0 {
            return Err(RoutingError::Validation(format!(
                "split #{} percentage must be in (0, 100], got {}",
                index, percentage
            )));
        }
        total += percentage;
        count += 1;
    }

    if count == 0 {
        return Err(RoutingError::Validation("at least one split is required".to_string()));
    }

    if (total - 100.0).abs() > PERCENTAGE_EPSILON {
        return Err(RoutingError::Validation(format!(
            "Total percentage must equal 100, got {}",
            total
        )));
    }

    Ok(())
}

/// 计算某一拆分项分到的输入金额
///
/// amount × percentage / 100，百分比先定点化到 1e-6，结果向下取整
pub fn portion_amount(total: U256, percentage: f64) -> Result<U256, RoutingError> {
    let invalid = || RoutingError::Validation(format!("invalid percentage: {}", percentage));

    let pct = Decimal::from_f64(percentage)
        .ok_or_else(invalid)?
        .round_dp(PERCENTAGE_SCALE);
    let scaled = (pct * Decimal::from(10u64.pow(PERCENTAGE_SCALE)))
        .trunc()
        .to_u128()
        .ok_or_else(invalid)?;

    let denominator = U256::from(100u64) * U256::exp10(PERCENTAGE_SCALE as usize);
    let numerator = total
        .checked_mul(U256::from(scaled))
        .ok_or_else(|| RoutingError::Validation(format!("amount {} is too large to split", total)))?;

    Ok(numerator / denominator)
}
