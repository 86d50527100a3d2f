//! Round configuration validation.
//!
//! Runs before any encoding so that a round the contract would reject never
//! reaches the chain.

use crate::constants::{MAX_WINNER_COUNT, MIN_LEAD_TIME, MIN_PROPOSAL_DURATION, MIN_VOTE_DURATION};
use crate::error::ConfigurationError;
use crate::types::{Award, RoundConfig};
use alloy_primitives::U256;
use tracing::debug;

/// Validate a round configuration and its awards against the current time.
pub fn validate(config: &RoundConfig, awards: &[Award]) -> Result<(), ConfigurationError> {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    validate_at(config, awards, now)
}

/// Validate a round configuration and its awards as of `now` (unix seconds).
pub fn validate_at(
    config: &RoundConfig,
    awards: &[Award],
    now: u64,
) -> Result<(), ConfigurationError> {
    debug!(
        "Validating round config: {:?} with {} award(s) at {}",
        config,
        awards.len(),
        now
    );

    let start = config.proposal_period_start_timestamp;
    let lead_ok = start
        .checked_sub(MIN_LEAD_TIME)
        .is_some_and(|earliest| earliest >= now);
    if !lead_ok {
        return Err(ConfigurationError::TooSoon {
            start,
            now,
            min_lead_secs: MIN_LEAD_TIME,
        });
    }

    if config.proposal_period_duration < MIN_PROPOSAL_DURATION {
        return Err(ConfigurationError::ProposalPeriodTooShort(
            config.proposal_period_duration,
        ));
    }

    if config.vote_period_duration < MIN_VOTE_DURATION {
        return Err(ConfigurationError::VotePeriodTooShort(
            config.vote_period_duration,
        ));
    }

    let winners = config.winner_count;
    if awards.len() != 1 && awards.len() != usize::from(winners) {
        return Err(ConfigurationError::AwardCountMismatch {
            awards: awards.len(),
            winners,
        });
    }

    if let [award] = awards {
        if winners > 1 {
            if !award.asset_type.is_divisible() {
                return Err(ConfigurationError::CannotSplitUniqueAsset(winners));
            }
            if award.amount % U256::from(winners) != U256::ZERO {
                return Err(ConfigurationError::UnequalSplit {
                    amount: award.amount,
                    winners,
                });
            }
        }
    }

    if winners > MAX_WINNER_COUNT {
        return Err(ConfigurationError::WinnerCountTooHigh(winners));
    }

    Ok(())
}
