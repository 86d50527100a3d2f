//! Auth strategies and call dispatch.
//!
//! Every round action reaches the round contract through an auth strategy's
//! `authenticate` entrypoint, which checks who is acting and forwards the
//! wrapped calldata.

use super::StrategyRegistry;
use crate::codec::{selector_from_name, split_uint256, to_hex};
use crate::constants::entrypoints::AUTHENTICATE;
use crate::error::{Result, RoundError};
use crate::types::{Call, Calldata, Envelope, RoundMessage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Known auth strategy kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStrategy {
    /// The transaction sender is the actor
    Vanilla,
    /// The actor signed a typed message off-chain
    EthereumSig,
}

impl AuthStrategy {
    /// Strategy type name
    pub fn strategy_type(&self) -> &'static str {
        match self {
            AuthStrategy::Vanilla => "vanilla",
            AuthStrategy::EthereumSig => "ethereum_sig",
        }
    }

    /// Wrap `calldata` for `entrypoint` into a call on the auth strategy at
    /// `auth_address`.
    pub fn create_call<M: RoundMessage>(
        &self,
        auth_address: &str,
        envelope: &Envelope<M>,
        entrypoint: &str,
        calldata: Calldata,
    ) -> Result<Call> {
        let round = envelope.message().round();
        let mut wrapped = Vec::with_capacity(calldata.len() + 10);

        match (self, envelope) {
            (AuthStrategy::Vanilla, Envelope::Vanilla(_)) => {}
            (AuthStrategy::EthereumSig, Envelope::Signed(signed)) => {
                let (r_low, r_high) = split_uint256(signed.signature.r);
                let (s_low, s_high) = split_uint256(signed.signature.s);
                let (salt_low, salt_high) = split_uint256(signed.salt);
                wrapped.extend([
                    to_hex(r_low),
                    to_hex(r_high),
                    to_hex(s_low),
                    to_hex(s_high),
                    to_hex(signed.signature.v),
                    to_hex(salt_low),
                    to_hex(salt_high),
                ]);
            }
            (strategy, _) => {
                return Err(RoundError::EncodingInvariantViolation(format!(
                    "{} auth strategy cannot authenticate a {} envelope",
                    strategy.strategy_type(),
                    if envelope.signature().is_some() {
                        "signed"
                    } else {
                        "unsigned"
                    }
                )));
            }
        }

        wrapped.push(round.to_string());
        wrapped.push(to_hex(selector_from_name(entrypoint)));
        wrapped.push(to_hex(calldata.len()));
        wrapped.extend(calldata);

        Ok(Call {
            contract_address: auth_address.to_string(),
            entrypoint: AUTHENTICATE.to_string(),
            calldata: wrapped,
        })
    }
}

/// Route an action through the auth strategy named in its message.
pub fn dispatch<M: RoundMessage>(
    registry: &StrategyRegistry,
    envelope: &Envelope<M>,
    entrypoint: &str,
    calldata: Calldata,
) -> Result<Call> {
    let auth_address = envelope.message().auth_strategy();
    let strategy = registry.auth_strategy(auth_address)?;

    info!(
        "Dispatching {} through {} auth strategy {}",
        envelope.action(),
        strategy.strategy_type(),
        auth_address
    );

    let call = strategy.create_call(auth_address, envelope, entrypoint, calldata)?;
    debug!("Auth call calldata has {} words", call.calldata.len());
    Ok(call)
}
