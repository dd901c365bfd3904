use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};

use crate::abi::{ERC20, TokenFactory};

/// A state-changing token function with its exact argument shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCall {
    Transfer { to: Address, amount: U256 },
    Approve { spender: Address, amount: U256 },
    TransferFrom { from: Address, to: Address, amount: U256 },
    Mint { to: Address, amount: U256 },
    Burn { amount: U256 },
    Pause,
    Unpause,
    TransferOwnership { new_owner: Address },
}

impl TokenCall {
    /// Solidity function name, for logs.
    pub fn function_name(&self) -> &'static str {
        match self {
            TokenCall::Transfer { .. } => "transfer",
            TokenCall::Approve { .. } => "approve",
            TokenCall::TransferFrom { .. } => "transferFrom",
            TokenCall::Mint { .. } => "mint",
            TokenCall::Burn { .. } => "burn",
            TokenCall::Pause => "pause",
            TokenCall::Unpause => "unpause",
            TokenCall::TransferOwnership { .. } => "transferOwnership",
        }
    }

    /// ABI-encoded calldata.
    pub fn calldata(&self) -> Bytes {
        let encoded = match *self {
            TokenCall::Transfer { to, amount } => {
                ERC20::transferCall { to, value: amount }.abi_encode()
            }
            TokenCall::Approve { spender, amount } => {
                ERC20::approveCall { spender, value: amount }.abi_encode()
            }
            TokenCall::TransferFrom { from, to, amount } => ERC20::transferFromCall {
                from,
                to,
                value: amount,
            }
            .abi_encode(),
            TokenCall::Mint { to, amount } => ERC20::mintCall { to, value: amount }.abi_encode(),
            TokenCall::Burn { amount } => ERC20::burnCall { value: amount }.abi_encode(),
            TokenCall::Pause => ERC20::pauseCall {}.abi_encode(),
            TokenCall::Unpause => ERC20::unpauseCall {}.abi_encode(),
            TokenCall::TransferOwnership { new_owner } => {
                ERC20::transferOwnershipCall { newOwner: new_owner }.abi_encode()
            }
        };
        encoded.into()
    }
}

/// A state-changing factory function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryCall {
    CreateToken {
        name: String,
        symbol: String,
        initial_supply: U256,
    },
    RegisterToken {
        token: Address,
        name: String,
        symbol: String,
    },
}

impl FactoryCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            FactoryCall::CreateToken { .. } => "createToken",
            FactoryCall::RegisterToken { .. } => "registerToken",
        }
    }

    pub fn calldata(&self) -> Bytes {
        let encoded = match self {
            FactoryCall::CreateToken {
                name,
                symbol,
                initial_supply,
            } => TokenFactory::createTokenCall {
                name: name.clone(),
                symbol: symbol.clone(),
                initialSupply: *initial_supply,
            }
            .abi_encode(),
            FactoryCall::RegisterToken {
                token,
                name,
                symbol,
            } => TokenFactory::registerTokenCall {
                token: *token,
                name: name.clone(),
                symbol: symbol.clone(),
            }
            .abi_encode(),
        };
        encoded.into()
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, hex};
    use tokenkit_core::units::parse_amount;

    use super::*;

    const ALICE: Address = address!("00000000000000000000000000000000000a11ce");

    #[test]
    fn transfer_calldata_uses_erc20_selector() {
        let amount = parse_amount("5.5", 18).unwrap();
        assert_eq!(amount, U256::from(5_500_000_000_000_000_000u128));

        let data = TokenCall::Transfer { to: ALICE, amount }.calldata();
        assert_eq!(&data[..4], hex!("a9059cbb"));
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[4 + 12..4 + 32], ALICE.as_slice());
        assert_eq!(U256::from_be_slice(&data[36..68]), amount);
    }

    #[test]
    fn selectors_match_standard_signatures() {
        let cases = [
            (TokenCall::Approve { spender: ALICE, amount: U256::from(1u8) }, hex!("095ea7b3")),
            (
                TokenCall::TransferFrom { from: ALICE, to: ALICE, amount: U256::from(1u8) },
                hex!("23b872dd"),
            ),
            (TokenCall::Mint { to: ALICE, amount: U256::from(1u8) }, hex!("40c10f19")),
            (TokenCall::Burn { amount: U256::from(1u8) }, hex!("42966c68")),
            (TokenCall::Pause, hex!("8456cb59")),
            (TokenCall::Unpause, hex!("3f4ba83a")),
            (TokenCall::TransferOwnership { new_owner: ALICE }, hex!("f2fde38b")),
        ];
        for (call, selector) in cases {
            assert_eq!(&call.calldata()[..4], selector, "{}", call.function_name());
        }
    }

    #[test]
    fn no_argument_calls_are_selector_only() {
        assert_eq!(TokenCall::Pause.calldata().len(), 4);
        assert_eq!(TokenCall::Unpause.calldata().len(), 4);
    }

    #[test]
    fn factory_calldata_round_trips_arguments() {
        let call = FactoryCall::RegisterToken {
            token: ALICE,
            name: "Stylus Token".into(),
            symbol: "STY".into(),
        };
        let data = call.calldata();
        assert_eq!(&data[..4], TokenFactory::registerTokenCall::SELECTOR);

        let decoded = TokenFactory::registerTokenCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.token, ALICE);
        assert_eq!(decoded.name, "Stylus Token");
        assert_eq!(decoded.symbol, "STY");
    }
}
