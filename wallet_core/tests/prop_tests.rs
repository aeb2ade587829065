use proptest::prelude::*;

use splitline_crypto::Sha256SplitHasher;
use splitline_transactions::{split_outputs_hash, CoinData};
use splitline_types::{CoinId, Timestamp, TokenId};
use splitline_wallet_core::{validate_amounts, SplitPlanner};
use std::sync::Arc;

fn planner() -> SplitPlanner {
    SplitPlanner::new(Arc::new(Sha256SplitHasher))
}

proptest! {
    /// Only splits that exactly exhaust the balance with two positive parts pass.
    #[test]
    fn amounts_must_sum_to_balance(
        balance in 2u128..u128::MAX / 2,
        split in 0u128..u128::MAX / 2,
        change in 0u128..u128::MAX / 2,
    ) {
        let coin = CoinId::ZERO;
        let coins = CoinData::single(coin, balance);
        let valid = split > 0 && change > 0 && split + change == balance;
        prop_assert_eq!(validate_amounts(&coins, &coin, split, change).is_ok(), valid);
    }

    /// Any split of the balance into two positive parts is accepted and the
    /// outputs conserve every coin.
    #[test]
    fn outputs_conserve_balance(
        balance in 2u128..1_000_000_000_000,
        split_frac in 1u128..1_000,
        other in 1u128..1_000_000,
    ) {
        let coin = CoinId::ZERO;
        let other_coin = CoinId::new([3; 32]);
        let split = (balance * split_frac / 1_000).clamp(1, balance - 1);
        let change = balance - split;
        let mut coins = CoinData::single(coin, balance);
        coins.insert(other_coin, other);

        prop_assert!(validate_amounts(&coins, &coin, split, change).is_ok());
        let plan = planner().derive(TokenId::new([1; 32]), coin, split, change, "seed");
        let outputs = plan.outputs(&coins);
        prop_assert_eq!(
            outputs.recipient.amount_of(&coin) + outputs.change.amount_of(&coin),
            balance
        );
        prop_assert_eq!(outputs.change.amount_of(&other_coin), other);
        prop_assert_eq!(outputs.recipient.amount_of(&other_coin), 0);
    }

    /// Independent planners derive identical material from the same inputs.
    #[test]
    fn derivation_is_deterministic(
        id in any::<[u8; 32]>(),
        split in 1u128..u128::MAX / 2,
        change in 1u128..u128::MAX / 2,
        millis in any::<u64>(),
    ) {
        let token_id = TokenId::new(id);
        let seed = SplitPlanner::seed(&token_id, split, change, Timestamp::from_millis(millis));
        let sender = planner().derive(token_id, CoinId::ZERO, split, change, &seed);
        let recipient = planner().derive(token_id, CoinId::ZERO, split, change, &seed);
        prop_assert_eq!(&sender, &recipient);
        prop_assert_ne!(sender.recipient_token_id, sender.sender_token_id);
        prop_assert_ne!(sender.recipient_token_id, token_id);
    }

    /// Different timestamps give unrelated split identities.
    #[test]
    fn timestamp_changes_identities(millis in 0u64..u64::MAX - 1) {
        let token_id = TokenId::new([7; 32]);
        let a = SplitPlanner::seed(&token_id, 700, 300, Timestamp::from_millis(millis));
        let b = SplitPlanner::seed(&token_id, 700, 300, Timestamp::from_millis(millis + 1));
        let pa = planner().derive(token_id, CoinId::ZERO, 700, 300, &a);
        let pb = planner().derive(token_id, CoinId::ZERO, 700, 300, &b);
        prop_assert_ne!(pa.recipient_token_id, pb.recipient_token_id);
        prop_assert_ne!(pa.sender_salt, pb.sender_salt);
    }

    /// The outputs hash a burn commits to does not depend on output order.
    #[test]
    fn outputs_hash_is_order_independent(a in 1u128..1_000_000, b in 1u128..1_000_000) {
        let coin = CoinId::ZERO;
        let ca = CoinData::single(coin, a);
        let cb = CoinData::single(coin, b);
        let x = TokenId::new([1; 32]);
        let y = TokenId::new([2; 32]);
        prop_assert_eq!(
            split_outputs_hash(&[(x, &ca), (y, &cb)]),
            split_outputs_hash(&[(y, &cb), (x, &ca)])
        );
    }
}
