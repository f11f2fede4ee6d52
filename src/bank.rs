// Value-transfer primitive. just balance changes, no real token plumbing.
//
// transfer() is atomic: it either fully completes or fails with no effect,
// and a failure aborts the whole enclosing vault/order operation. mint and
// burn exist for the accounting-unit liability only; the vault is the sole
// caller of those.

use crate::types::{Amount, AssetId, Holder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BankError {
    #[error("insufficient balance of asset {asset:?}: requested {requested}, available {available}")]
    InsufficientBalance {
        asset: AssetId,
        requested: Amount,
        available: Amount,
    },

    #[error("transfer amount must not be negative")]
    NegativeAmount,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bank {
    balances: HashMap<(AssetId, Holder), Amount>,
}

impl Bank {
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }

    pub fn balance(&self, asset: AssetId, holder: Holder) -> Amount {
        self.balances
            .get(&(asset, holder))
            .copied()
            .unwrap_or(Amount::zero())
    }

    pub fn transfer(
        &mut self,
        asset: AssetId,
        from: Holder,
        to: Holder,
        amount: Amount,
    ) -> Result<(), BankError> {
        if amount.value() < rust_decimal::Decimal::ZERO {
            return Err(BankError::NegativeAmount);
        }
        if amount.is_zero() || from == to {
            return Ok(());
        }

        let available = self.balance(asset, from);
        if available < amount {
            return Err(BankError::InsufficientBalance {
                asset,
                requested: amount,
                available,
            });
        }

        self.balances.insert((asset, from), available.sub(amount));
        let to_balance = self.balance(asset, to);
        self.balances.insert((asset, to), to_balance.add(amount));
        Ok(())
    }

    // issuance of the accounting-unit liability; vault-only
    pub fn mint(&mut self, asset: AssetId, to: Holder, amount: Amount) {
        let balance = self.balance(asset, to);
        self.balances.insert((asset, to), balance.add(amount));
    }

    pub fn burn(&mut self, asset: AssetId, from: Holder, amount: Amount) -> Result<(), BankError> {
        let available = self.balance(asset, from);
        if available < amount {
            return Err(BankError::InsufficientBalance {
                asset,
                requested: amount,
                available,
            });
        }
        self.balances.insert((asset, from), available.sub(amount));
        Ok(())
    }

    pub fn total_supply(&self, asset: AssetId) -> Amount {
        self.balances
            .iter()
            .filter(|((a, _), _)| *a == asset)
            .fold(Amount::zero(), |acc, (_, amount)| acc.add(*amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountId;
    use rust_decimal_macros::dec;

    const ASSET: AssetId = AssetId(1);

    fn alice() -> Holder {
        Holder::User(AccountId(1))
    }

    #[test]
    fn transfer_moves_balance() {
        let mut bank = Bank::new();
        bank.mint(ASSET, alice(), Amount::new(dec!(100)));

        bank.transfer(ASSET, alice(), Holder::Vault, Amount::new(dec!(40)))
            .unwrap();

        assert_eq!(bank.balance(ASSET, alice()).value(), dec!(60));
        assert_eq!(bank.balance(ASSET, Holder::Vault).value(), dec!(40));
    }

    #[test]
    fn transfer_insufficient_fails_cleanly() {
        let mut bank = Bank::new();
        bank.mint(ASSET, alice(), Amount::new(dec!(10)));

        let result = bank.transfer(ASSET, alice(), Holder::Vault, Amount::new(dec!(11)));
        assert!(matches!(
            result,
            Err(BankError::InsufficientBalance { .. })
        ));
        // no partial effect
        assert_eq!(bank.balance(ASSET, alice()).value(), dec!(10));
        assert_eq!(bank.balance(ASSET, Holder::Vault).value(), dec!(0));
    }

    #[test]
    fn self_transfer_is_noop() {
        let mut bank = Bank::new();
        bank.mint(ASSET, alice(), Amount::new(dec!(5)));
        bank.transfer(ASSET, alice(), alice(), Amount::new(dec!(5)))
            .unwrap();
        assert_eq!(bank.balance(ASSET, alice()).value(), dec!(5));
    }

    #[test]
    fn burn_reduces_supply() {
        let mut bank = Bank::new();
        bank.mint(ASSET, alice(), Amount::new(dec!(100)));
        bank.burn(ASSET, alice(), Amount::new(dec!(30))).unwrap();
        assert_eq!(bank.total_supply(ASSET).value(), dec!(70));

        assert!(bank.burn(ASSET, alice(), Amount::new(dec!(71))).is_err());
    }
}
