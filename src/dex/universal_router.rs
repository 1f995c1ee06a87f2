use ethers::{
    abi::{self, Abi, Function, ParamType, Token},
    types::{Address, Bytes, U256},
};

use crate::{error::DecodeError, types::DecodedSwap};

// Universal Router command `V2_SWAP_EXACT_IN`.
pub const V2_SWAP_EXACT_IN: u8 = 0x08;

// Low bits of a command byte select the command type; the high bit is the
// allow-revert flag and bits 5-6 are reserved.
pub const COMMAND_TYPE_MASK: u8 = 0x3f;

// Recipient placeholder `Constants.ADDRESS_THIS`: the router keeps the output
// for a later command in the same call, so the swap is one step of a
// multi-command plan rather than a plain user swap.
pub const ROUTER_RECIPIENT_SENTINEL: u64 = 2;

// Word count of a `V2_SWAP_EXACT_IN` input whose path holds three tokens:
// five head words, the array length, then three addresses. Any other length
// is read as a two-hop path whose tokens are the final two words.
pub const PATHLESS_WORD_COUNT: usize = 9;

const WORD: usize = 32;

const ROUTER_ABI: &[&str] = &[
    "function execute(bytes commands, bytes[] inputs, uint256 deadline) payable",
    "function execute(bytes commands, bytes[] inputs) payable",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterCall {
    pub commands: Vec<u8>,
    pub inputs: Vec<Bytes>,
    pub deadline: Option<U256>,
}

impl RouterCall {
    pub fn v2_swap_position(&self) -> Option<usize> {
        self.commands
            .iter()
            .position(|command| command & COMMAND_TYPE_MASK == V2_SWAP_EXACT_IN)
    }

    pub fn v2_swap_input(&self) -> Option<&Bytes> {
        self.v2_swap_position()
            .and_then(|position| self.inputs.get(position))
    }
}

pub struct UniversalRouterDecoder {
    functions: Vec<Function>,
}

impl UniversalRouterDecoder {
    pub fn new() -> anyhow::Result<Self> {
        let abi: Abi = abi::parse_abi(ROUTER_ABI)?;
        let functions = abi.functions().cloned().collect();
        Ok(Self { functions })
    }

    pub fn decode_call(&self, calldata: &[u8]) -> Result<RouterCall, DecodeError> {
        if calldata.len() < 4 {
            return Err(DecodeError::MissingSelector);
        }
        let (selector, args) = calldata.split_at(4);

        let function = self
            .functions
            .iter()
            .find(|function| function.short_signature() == selector)
            .ok_or_else(|| DecodeError::UnknownSelector(hex::encode(selector)))?;

        let tokens = function
            .decode_input(args)
            .map_err(|e| DecodeError::Abi(e.to_string()))?;

        let mut tokens = tokens.into_iter();
        let commands = match tokens.next() {
            Some(Token::Bytes(commands)) => commands,
            other => return Err(DecodeError::Layout(format!("commands: {:?}", other))),
        };
        let inputs = match tokens.next() {
            Some(Token::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Token::Bytes(bytes) => Ok(Bytes::from(bytes)),
                    other => Err(DecodeError::Layout(format!("input: {:?}", other))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(DecodeError::Layout(format!("inputs: {:?}", other))),
        };
        let deadline = match tokens.next() {
            Some(Token::Uint(deadline)) => Some(deadline),
            None => None,
            Some(other) => return Err(DecodeError::Layout(format!("deadline: {:?}", other))),
        };

        Ok(RouterCall {
            commands,
            inputs,
            deadline,
        })
    }
}

pub fn decode_v2_swap_input(input: &[u8]) -> Result<DecodedSwap, DecodeError> {
    let tokens = abi::decode(
        &[
            ParamType::Address,
            ParamType::Uint(256),
            ParamType::Uint(256),
            ParamType::Bytes,
            ParamType::Bool,
        ],
        input,
    )
    .map_err(|e| DecodeError::Abi(e.to_string()))?;

    let (recipient, amount_in, min_amount_out) = match tokens.as_slice() {
        [Token::Address(recipient), Token::Uint(amount_in), Token::Uint(min_amount_out), Token::Bytes(_), Token::Bool(_)] => {
            (*recipient, *amount_in, *min_amount_out)
        }
        other => return Err(DecodeError::Layout(format!("swap tuple: {:?}", other))),
    };

    if input.len() % WORD != 0 {
        return Err(DecodeError::Misaligned(input.len()));
    }
    let words: Vec<&[u8]> = input.chunks_exact(WORD).collect();

    let (path, has_two_path) = if words.len() != PATHLESS_WORD_COUNT {
        let first = word_to_address(words[words.len() - 2]);
        let second = word_to_address(words[words.len() - 1]);
        (vec![first, second], true)
    } else {
        (Vec::new(), false)
    };

    Ok(DecodedSwap {
        recipient: U256::from_big_endian(recipient.as_bytes()),
        amount_in,
        min_amount_out,
        path,
        has_two_path,
    })
}

fn word_to_address(word: &[u8]) -> Address {
    Address::from_slice(&word[WORD - 20..])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn weth() -> Address {
        "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".parse().unwrap()
    }

    pub(crate) fn pepe() -> Address {
        "0x6982508145454Ce325dDbE47a25d4ec3d2311933".parse().unwrap()
    }

    pub(crate) fn encode_v2_swap(
        recipient: Address,
        amount_in: U256,
        min_amount_out: U256,
        path: &[Address],
    ) -> Vec<u8> {
        abi::encode(&[
            Token::Address(recipient),
            Token::Uint(amount_in),
            Token::Uint(min_amount_out),
            Token::Array(path.iter().map(|a| Token::Address(*a)).collect()),
            Token::Bool(true),
        ])
    }

    pub(crate) fn encode_execute(commands: &[u8], inputs: &[Vec<u8>], deadline: Option<U256>) -> Vec<u8> {
        let abi = abi::parse_abi(ROUTER_ABI).unwrap();
        let arity = if deadline.is_some() { 3 } else { 2 };
        let function = abi
            .functions()
            .find(|f| f.inputs.len() == arity)
            .unwrap();
        let mut tokens = vec![
            Token::Bytes(commands.to_vec()),
            Token::Array(inputs.iter().map(|i| Token::Bytes(i.clone())).collect()),
        ];
        if let Some(deadline) = deadline {
            tokens.push(Token::Uint(deadline));
        }
        function.encode_input(&tokens).unwrap()
    }

    #[test]
    fn test_decode_two_hop_swap() {
        let recipient = Address::from_low_u64_be(0xbeef);
        let input = encode_v2_swap(
            recipient,
            U256::exp10(18),
            U256::from(12345),
            &[weth(), pepe()],
        );
        assert_eq!(input.len() / 32, 8);

        let swap = decode_v2_swap_input(&input).unwrap();
        assert_eq!(swap.recipient, U256::from(0xbeef));
        assert_eq!(swap.amount_in, U256::exp10(18));
        assert_eq!(swap.min_amount_out, U256::from(12345));
        assert_eq!(swap.path, vec![weth(), pepe()]);
        assert!(swap.has_two_path);
    }

    #[test]
    fn test_nine_words_is_pathless() {
        let input = encode_v2_swap(
            Address::from_low_u64_be(1),
            U256::one(),
            U256::one(),
            &[weth(), Address::from_low_u64_be(7), pepe()],
        );
        assert_eq!(input.len() / 32, PATHLESS_WORD_COUNT);

        let swap = decode_v2_swap_input(&input).unwrap();
        assert!(!swap.has_two_path);
        assert!(swap.path.is_empty());
    }

    #[test]
    fn test_decode_is_deterministic() {
        let input = encode_v2_swap(
            Address::from_low_u64_be(9),
            U256::from(42),
            U256::from(41),
            &[weth(), pepe()],
        );
        assert_eq!(
            decode_v2_swap_input(&input).unwrap(),
            decode_v2_swap_input(&input).unwrap()
        );
    }

    #[test]
    fn test_router_sentinel_recipient_is_visible() {
        let input = encode_v2_swap(
            Address::from_low_u64_be(ROUTER_RECIPIENT_SENTINEL),
            U256::one(),
            U256::one(),
            &[weth(), pepe()],
        );
        let swap = decode_v2_swap_input(&input).unwrap();
        assert_eq!(swap.recipient, U256::from(ROUTER_RECIPIENT_SENTINEL));
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert!(decode_v2_swap_input(&[0u8; 40]).is_err());
        assert!(decode_v2_swap_input(&[]).is_err());
    }

    #[test]
    fn test_decode_execute_both_overloads() {
        let decoder = UniversalRouterDecoder::new().unwrap();
        let swap = encode_v2_swap(Address::from_low_u64_be(1), U256::one(), U256::one(), &[weth(), pepe()]);

        let with_deadline = encode_execute(&[0x0b, V2_SWAP_EXACT_IN], &[vec![0u8; 64], swap.clone()], Some(U256::from(99)));
        let call = decoder.decode_call(&with_deadline).unwrap();
        assert_eq!(call.deadline, Some(U256::from(99)));
        assert_eq!(call.v2_swap_position(), Some(1));
        assert_eq!(call.v2_swap_input().map(|b| b.to_vec()), Some(swap.clone()));

        let without_deadline = encode_execute(&[V2_SWAP_EXACT_IN], &[swap], None);
        let call = decoder.decode_call(&without_deadline).unwrap();
        assert_eq!(call.deadline, None);
        assert_eq!(call.v2_swap_position(), Some(0));
    }

    #[test]
    fn test_allow_revert_flag_is_masked() {
        let call = RouterCall {
            commands: vec![0x00, 0x80 | V2_SWAP_EXACT_IN],
            inputs: vec![Bytes::from(vec![1u8]), Bytes::from(vec![2u8])],
            deadline: None,
        };
        assert_eq!(call.v2_swap_position(), Some(1));
        assert_eq!(call.v2_swap_input(), Some(&Bytes::from(vec![2u8])));
    }

    #[test]
    fn test_unknown_selector() {
        let decoder = UniversalRouterDecoder::new().unwrap();
        assert!(matches!(
            decoder.decode_call(&[0xde, 0xad, 0xbe, 0xef, 0x00]),
            Err(DecodeError::UnknownSelector(_))
        ));
        assert!(matches!(
            decoder.decode_call(&[0x01]),
            Err(DecodeError::MissingSelector)
        ));
    }
}
