//! 金额换算
//!
//! 十进制字符串与最小单位整数之间的精确转换，全程不经过浮点数

use ethers::types::U256;

use crate::RoutingError;

/// 检查十进制金额字符串的格式 (不需要知道精度)
pub fn validate_decimal(amount: &str) -> Result<(), RoutingError> {
    split_decimal(amount).map(|_| ())
}

/// 金额是否为 0 (如 "0"、"0.000"、".0")，格式错误时报错
pub fn is_zero_decimal(amount: &str) -> Result<bool, RoutingError> {
    let (int_part, frac_part) = split_decimal(amount)?;
    Ok(int_part.bytes().chain(frac_part.bytes()).all(|b| b == b'0'))
}

fn split_decimal(amount: &str) -> Result<(&str, &str), RoutingError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(RoutingError::Validation("amount is empty".to_string()));
    }

    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (trimmed, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(RoutingError::Validation(format!("malformed amount: {}", amount)));
    }
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(int_part) || !digits_only(frac_part) {
        return Err(RoutingError::Validation(format!("malformed amount: {}", amount)));
    }

    Ok((int_part, frac_part))
}

/// 将十进制金额按 10^decimals 缩放成整数
///
/// 小数位数超过 decimals 时报错，不做截断
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, RoutingError> {
    let (int_part, frac_part) = split_decimal(amount)?;
    let decimals = decimals as usize;

    if frac_part.len() > decimals {
        return Err(RoutingError::Validation(format!(
            "amount {} has more than {} decimal places",
            amount.trim(),
            decimals
        )));
    }

    let mut digits = String::with_capacity(int_part.len() + decimals);
    digits.push_str(int_part);
    digits.push_str(frac_part);
    digits.extend(std::iter::repeat('0').take(decimals - frac_part.len()));

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }

    U256::from_dec_str(digits)
        .map_err(|_| RoutingError::Validation(format!("amount {} is out of range", amount.trim())))
}

/// 整数金额转十进制字符串，去掉末尾多余的 0
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');

    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

/// 保留 `significant` 位有效数字 (四舍五入)
pub fn to_significant(value: U256, decimals: u8, significant: usize) -> String {
    let significant = significant.max(1);
    let digits = value.to_string();
    if value.is_zero() || digits.len() <= significant {
        return format_units(value, decimals);
    }

    let dropped = digits.len() - significant;
    let scale = U256::exp10(dropped);
    let mut head = value / scale;
    let remainder = value % scale;
    if remainder * U256::from(2) >= scale {
        head += U256::one();
    }

    format_units(head * scale, decimals)
}

/// U256 以十进制字符串序列化
pub mod u256_dec {
    use ethers::types::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_dec_str(&s).map_err(de::Error::custom)
    }
}
