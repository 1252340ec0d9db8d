//! Payment voucher schedule and signing

use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use anyhow::{anyhow, Result};
use jax_deals::PaymentVoucher;

/// Most vouchers a single deal may be paid with
pub const MAX_VOUCHERS: u64 = 10_000;

/// One unsigned step of a payment schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoucherStep {
    pub amount: U256,
    pub valid_at: u64,
}

/// Amounts released over `duration` heights starting at `height`.
///
/// One step per `interval` heights, each for `value * elapsed / duration`.
/// When `duration` is not a multiple of `interval` a last step releases the
/// full value at `height + duration`. Schedules longer than [`MAX_VOUCHERS`]
/// steps are rejected.
pub fn voucher_schedule(
    height: u64,
    value: U256,
    duration: u64,
    interval: u64,
) -> Result<Vec<VoucherStep>> {
    if duration == 0 {
        return Err(anyhow!("cannot create payments for zero duration"));
    }
    if interval == 0 {
        return Err(anyhow!("payment interval must be positive"));
    }

    let count = duration / interval + u64::from(duration % interval != 0);
    if count > MAX_VOUCHERS {
        return Err(anyhow!(
            "duration {} at interval {} needs {} vouchers, at most {} allowed",
            duration,
            interval,
            count,
            MAX_VOUCHERS
        ));
    }

    let mut steps = Vec::with_capacity(count as usize);
    let mut elapsed = interval;
    while elapsed <= duration {
        let amount = value
            .checked_mul(U256::from(elapsed))
            .ok_or_else(|| anyhow!("voucher amount overflows for value {}", value))?
            / U256::from(duration);
        steps.push(VoucherStep {
            amount,
            valid_at: height.saturating_add(elapsed),
        });
        elapsed = match elapsed.checked_add(interval) {
            Some(next) => next,
            None => break,
        };
    }

    if duration % interval != 0 {
        steps.push(VoucherStep {
            amount: value,
            valid_at: height.saturating_add(duration),
        });
    }

    Ok(steps)
}

/// Digest a voucher signature commits to
pub fn voucher_digest(channel: U256, target: Address, amount: U256, valid_at: u64) -> B256 {
    let mut packed = Vec::with_capacity(32 + 20 + 32 + 8);
    packed.extend_from_slice(&channel.to_be_bytes::<32>());
    packed.extend_from_slice(target.as_slice());
    packed.extend_from_slice(&amount.to_be_bytes::<32>());
    packed.extend_from_slice(&valid_at.to_be_bytes());
    keccak256(packed)
}

/// Sign every step of `schedule` for `channel`
pub fn sign_vouchers(
    signer: &PrivateKeySigner,
    channel: U256,
    target: Address,
    schedule: &[VoucherStep],
) -> Result<Vec<PaymentVoucher>> {
    schedule
        .iter()
        .map(|step| {
            let digest = voucher_digest(channel, target, step.amount, step.valid_at);
            let signature = signer.sign_message_sync(digest.as_slice())?;
            Ok(PaymentVoucher {
                channel,
                payer: signer.address(),
                target,
                amount: step.amount,
                valid_at: step.valid_at,
                signature: signature.as_bytes().to_vec(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(schedule: &[VoucherStep]) -> Vec<(u64, u64)> {
        schedule
            .iter()
            .map(|s| (s.amount.to::<u64>(), s.valid_at))
            .collect()
    }

    #[test]
    fn short_deal_gets_a_single_voucher() {
        let schedule = voucher_schedule(42, U256::from(150), 3, 1000).unwrap();
        assert_eq!(steps(&schedule), vec![(150, 45)]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_voucher() {
        let schedule = voucher_schedule(0, U256::from(3000), 3000, 1000).unwrap();
        assert_eq!(
            steps(&schedule),
            vec![(1000, 1000), (2000, 2000), (3000, 3000)]
        );
    }

    #[test]
    fn remainder_is_released_at_the_end() {
        let schedule = voucher_schedule(10, U256::from(250), 2500, 1000).unwrap();
        assert_eq!(
            steps(&schedule),
            vec![(100, 1010), (200, 2010), (250, 2510)]
        );
    }

    #[test]
    fn amounts_never_decrease() {
        let schedule = voucher_schedule(7, U256::from(1_000_003), 9_999, 1000).unwrap();
        assert!(schedule.windows(2).all(|w| w[0].amount <= w[1].amount));
        assert!(schedule.windows(2).all(|w| w[0].valid_at < w[1].valid_at));
        assert_eq!(schedule.last().unwrap().amount, U256::from(1_000_003));
    }

    #[test]
    fn zero_duration_is_rejected() {
        assert!(voucher_schedule(0, U256::from(1), 0, 1000).is_err());
        assert!(voucher_schedule(0, U256::from(1), 10, 0).is_err());
    }

    #[test]
    fn oversized_schedule_is_rejected() {
        let err = voucher_schedule(0, U256::from(1), 10_000_000_000_000, 1000).unwrap_err();
        assert!(err.to_string().contains("at most"));

        let longest = voucher_schedule(0, U256::from(1), MAX_VOUCHERS * 1000, 1000).unwrap();
        assert_eq!(longest.len() as u64, MAX_VOUCHERS);
        assert!(voucher_schedule(0, U256::from(1), MAX_VOUCHERS * 1000 + 1, 1000).is_err());
    }

    #[test]
    fn overflowing_amount_is_rejected() {
        assert!(voucher_schedule(0, U256::MAX, 2, 1).is_err());

        let schedule = voucher_schedule(0, U256::MAX, 1, 1).unwrap();
        assert_eq!(schedule[0].amount, U256::MAX);
    }

    #[test]
    fn vouchers_are_signed_by_the_payer() {
        let signer = PrivateKeySigner::random();
        let target = Address::repeat_byte(0x0e);
        let schedule = voucher_schedule(0, U256::from(150), 3, 1000).unwrap();

        let vouchers = sign_vouchers(&signer, U256::from(9), target, &schedule).unwrap();
        assert_eq!(vouchers.len(), 1);
        let voucher = &vouchers[0];
        assert_eq!(voucher.payer, signer.address());
        assert_eq!(voucher.signature.len(), 65);

        let signature =
            alloy::primitives::PrimitiveSignature::try_from(voucher.signature.as_slice()).unwrap();
        let digest = voucher_digest(
            voucher.channel,
            voucher.target,
            voucher.amount,
            voucher.valid_at,
        );
        let recovered = signature
            .recover_address_from_msg(digest.as_slice())
            .unwrap();
        assert_eq!(recovered, signer.address());
    }
}
