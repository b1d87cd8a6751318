//! SwapRouter 调用数据编码
//!
//! 只做精确输入: 单跳走 exactInputSingle，两跳走 exactInput + 打包路径

use ethers::abi::{encode, Token as AbiToken};
use ethers::types::{Address, Bytes, U256};
use ethers::utils::id;
use models::{RouterVersion, RoutingError, SwapPath};

/// SwapRouter (V1) 函数签名
mod v1_sig {
    pub const EXACT_INPUT_SINGLE: &str =
        "exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160))";
    pub const EXACT_INPUT: &str = "exactInput((bytes,address,uint256,uint256,uint256))";
    pub const MULTICALL: &str = "multicall(bytes[])";
}

/// SwapRouter02 函数签名 (deadline 移到 multicall 上)
mod v2_sig {
    pub const EXACT_INPUT_SINGLE: &str =
        "exactInputSingle((address,address,uint24,address,uint256,uint256,uint160))";
    pub const EXACT_INPUT: &str = "exactInput((bytes,address,uint256,uint256))";
    pub const MULTICALL: &str = "multicall(uint256,bytes[])";
}

/// 一次兑换调用的参数
#[derive(Debug, Clone)]
pub struct SwapCall<'a> {
    pub path: &'a SwapPath,
    pub recipient: Address,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    pub deadline: u64,
}

/// 打包路径: token(20) | fee(3) | token(20) [| fee(3) | token(20)]
pub fn encode_path(path: &SwapPath) -> Result<Vec<u8>, RoutingError> {
    let fees = path.fees();
    if path.path.len() != fees.len() + 1 {
        return Err(RoutingError::Encoding(format!(
            "path has {} tokens but {} fees",
            path.path.len(),
            fees.len()
        )));
    }

    let mut packed = Vec::with_capacity(20 + fees.len() * 23);
    packed.extend_from_slice(path.path[0].as_bytes());
    for (fee, token) in fees.iter().zip(path.path.iter().skip(1)) {
        packed.extend_from_slice(&fee.pips().to_be_bytes()[1..]);
        packed.extend_from_slice(token.as_bytes());
    }
    Ok(packed)
}

fn with_selector(signature: &str, args: &[AbiToken]) -> Bytes {
    let mut data = id(signature).to_vec();
    data.extend(encode(args));
    Bytes::from(data)
}

/// SwapRouter 编码器
#[derive(Debug, Clone, Copy)]
pub struct SwapRouterEncoder {
    version: RouterVersion,
}

impl SwapRouterEncoder {
    pub fn new(version: RouterVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> RouterVersion {
        self.version
    }

    /// 编码单条路径的兑换调用
    pub fn encode_swap(&self, call: &SwapCall<'_>) -> Result<Bytes, RoutingError> {
        if call.amount_in.is_zero() {
            return Err(RoutingError::Encoding("amount_in is zero".to_string()));
        }

        let path = call.path;
        let deadline = U256::from(call.deadline);

        match (path.hop_count(), self.version) {
            (1, RouterVersion::V1) => {
                let params = AbiToken::Tuple(vec![
                    AbiToken::Address(path.input_token.address),
                    AbiToken::Address(path.output_token.address),
                    AbiToken::Uint(U256::from(path.fee1.pips())),
                    AbiToken::Address(call.recipient),
                    AbiToken::Uint(deadline),
                    AbiToken::Uint(call.amount_in),
                    AbiToken::Uint(call.amount_out_minimum),
                    AbiToken::Uint(U256::zero()),
                ]);
                Ok(with_selector(v1_sig::EXACT_INPUT_SINGLE, &[params]))
            }
            (1, RouterVersion::V2) => {
                let params = AbiToken::Tuple(vec![
                    AbiToken::Address(path.input_token.address),
                    AbiToken::Address(path.output_token.address),
                    AbiToken::Uint(U256::from(path.fee1.pips())),
                    AbiToken::Address(call.recipient),
                    AbiToken::Uint(call.amount_in),
                    AbiToken::Uint(call.amount_out_minimum),
                    AbiToken::Uint(U256::zero()),
                ]);
                Ok(with_selector(v2_sig::EXACT_INPUT_SINGLE, &[params]))
            }
            (_, RouterVersion::V1) => {
                let params = AbiToken::Tuple(vec![
                    AbiToken::Bytes(encode_path(path)?),
                    AbiToken::Address(call.recipient),
                    AbiToken::Uint(deadline),
                    AbiToken::Uint(call.amount_in),
                    AbiToken::Uint(call.amount_out_minimum),
                ]);
                Ok(with_selector(v1_sig::EXACT_INPUT, &[params]))
            }
            (_, RouterVersion::V2) => {
                let params = AbiToken::Tuple(vec![
                    AbiToken::Bytes(encode_path(path)?),
                    AbiToken::Address(call.recipient),
                    AbiToken::Uint(call.amount_in),
                    AbiToken::Uint(call.amount_out_minimum),
                ]);
                Ok(with_selector(v2_sig::EXACT_INPUT, &[params]))
            }
        }
    }

    /// 把多笔兑换打包进一次 multicall
    pub fn encode_multicall(&self, calls: &[Bytes], deadline: u64) -> Result<Bytes, RoutingError> {
        if calls.is_empty() {
            return Err(RoutingError::Encoding("multicall without calls".to_string()));
        }

        let data = AbiToken::Array(calls.iter().map(|c| AbiToken::Bytes(c.to_vec())).collect());
        let encoded = match self.version {
            RouterVersion::V1 => with_selector(v1_sig::MULTICALL, &[data]),
            RouterVersion::V2 => with_selector(v2_sig::MULTICALL, &[AbiToken::Uint(U256::from(deadline)), data]),
        };
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::{decode, ParamType};
    use models::{base_tokens, FeeTier, Token};

    fn weth() -> Token {
        Token::new(*base_tokens::WETH, "WETH".into(), "Wrapped Ether".into(), 18, 8453)
    }

    fn usdc() -> Token {
        Token::new(*base_tokens::USDC, "USDC".into(), "USD Coin".into(), 6, 8453)
    }

    fn dai() -> Token {
        Token::new(*base_tokens::DAI, "DAI".into(), "Dai Stablecoin".into(), 18, 8453)
    }

    fn call(path: &SwapPath) -> SwapCall<'_> {
        SwapCall {
            path,
            recipient: Address::repeat_byte(0xaa),
            amount_in: U256::exp10(18),
            amount_out_minimum: U256::from(2_985_000_000u64),
            deadline: 1_700_000_000,
        }
    }

    #[test]
    fn test_known_selectors() {
        assert_eq!(hex::encode(&id(v1_sig::EXACT_INPUT_SINGLE)), "414bf389");
        assert_eq!(hex::encode(&id(v1_sig::EXACT_INPUT)), "c04b8d59");
        assert_eq!(hex::encode(&id(v1_sig::MULTICALL)), "ac9650d8");
        assert_eq!(hex::encode(&id(v2_sig::EXACT_INPUT_SINGLE)), "04e45aaf");
        assert_eq!(hex::encode(&id(v2_sig::EXACT_INPUT)), "b858183f");
        assert_eq!(hex::encode(&id(v2_sig::MULTICALL)), "5ae401dc");
    }

    #[test]
    fn test_encode_path_layout() {
        let path = SwapPath::through_base(
            usdc(),
            weth(),
            dai(),
            FeeTier::Low,
            FeeTier::Medium,
            U256::from(1u64),
        );
        let packed = encode_path(&path).unwrap();

        assert_eq!(packed.len(), 20 + 3 + 20 + 3 + 20);
        assert_eq!(&packed[..20], base_tokens::USDC.as_bytes());
        assert_eq!(&packed[20..23], &[0x00, 0x01, 0xf4]); // 500
        assert_eq!(&packed[23..43], base_tokens::WETH.as_bytes());
        assert_eq!(&packed[43..46], &[0x00, 0x0b, 0xb8]); // 3000
        assert_eq!(&packed[46..], base_tokens::DAI.as_bytes());
    }

    #[test]
    fn test_single_hop_uses_exact_input_single() {
        let path = SwapPath::direct(weth(), usdc(), FeeTier::Low, U256::from(3_000_000_000u64));

        let v2 = SwapRouterEncoder::new(RouterVersion::V2).encode_swap(&call(&path)).unwrap();
        assert_eq!(&v2[..4], &[0x04, 0xe4, 0x5a, 0xaf]);
        let fields = decode(
            &[
                ParamType::Address,
                ParamType::Address,
                ParamType::Uint(24),
                ParamType::Address,
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Uint(160),
            ],
            &v2[4..],
        )
        .unwrap();
        assert_eq!(fields[0], AbiToken::Address(*base_tokens::WETH));
        assert_eq!(fields[2], AbiToken::Uint(U256::from(500u64)));
        assert_eq!(fields[4], AbiToken::Uint(U256::exp10(18)));
        assert_eq!(fields[5], AbiToken::Uint(U256::from(2_985_000_000u64)));

        let v1 = SwapRouterEncoder::new(RouterVersion::V1).encode_swap(&call(&path)).unwrap();
        assert_eq!(&v1[..4], &[0x41, 0x4b, 0xf3, 0x89]);
        // 8 个静态字段
        assert_eq!(v1.len(), 4 + 8 * 32);
    }

    #[test]
    fn test_two_hop_uses_exact_input() {
        let path = SwapPath::through_base(
            usdc(),
            weth(),
            dai(),
            FeeTier::Low,
            FeeTier::Medium,
            U256::from(1u64),
        );
        let data = SwapRouterEncoder::new(RouterVersion::V2).encode_swap(&call(&path)).unwrap();
        assert_eq!(&data[..4], &[0xb8, 0x58, 0x18, 0x3f]);

        let decoded = decode(
            &[ParamType::Tuple(vec![
                ParamType::Bytes,
                ParamType::Address,
                ParamType::Uint(256),
                ParamType::Uint(256),
            ])],
            &data[4..],
        )
        .unwrap();
        let AbiToken::Tuple(fields) = &decoded[0] else {
            panic!("expected tuple");
        };
        assert_eq!(fields[0], AbiToken::Bytes(encode_path(&path).unwrap()));
        assert_eq!(fields[1], AbiToken::Address(Address::repeat_byte(0xaa)));
    }

    #[test]
    fn test_zero_amount_is_rejected() {
        let path = SwapPath::direct(weth(), usdc(), FeeTier::Low, U256::from(1u64));
        let mut swap = call(&path);
        swap.amount_in = U256::zero();
        let err = SwapRouterEncoder::new(RouterVersion::V2).encode_swap(&swap).unwrap_err();
        assert!(matches!(err, RoutingError::Encoding(_)));
    }

    #[test]
    fn test_multicall_wraps_calls() {
        let calls = vec![Bytes::from(vec![1u8, 2, 3]), Bytes::from(vec![4u8])];

        let v2 = SwapRouterEncoder::new(RouterVersion::V2)
            .encode_multicall(&calls, 1_700_000_000)
            .unwrap();
        assert_eq!(&v2[..4], &[0x5a, 0xe4, 0x01, 0xdc]);
        let decoded = decode(
            &[ParamType::Uint(256), ParamType::Array(Box::new(ParamType::Bytes))],
            &v2[4..],
        )
        .unwrap();
        assert_eq!(decoded[0], AbiToken::Uint(U256::from(1_700_000_000u64)));
        assert_eq!(
            decoded[1],
            AbiToken::Array(vec![AbiToken::Bytes(vec![1, 2, 3]), AbiToken::Bytes(vec![4])])
        );

        let v1 = SwapRouterEncoder::new(RouterVersion::V1).encode_multicall(&calls, 0).unwrap();
        assert_eq!(&v1[..4], &[0xac, 0x96, 0x50, 0xd8]);

        assert!(SwapRouterEncoder::new(RouterVersion::V1).encode_multicall(&[], 0).is_err());
    }
}
