//! Deterministic end-to-end scenarios.
//!
//! Each test drives the vault and order engine through a concrete sequence
//! and asserts exact fee, ledger and payout arithmetic.

use rust_decimal_macros::dec;
use vault_core::*;

const NATIVE: AssetId = AssetId(0);
const USDC: AssetId = AssetId(1);
const WBTC: AssetId = AssetId(2);
const UNIT: AssetId = AssetId(100);

const LP: AccountId = AccountId(1);
const TRADER: AccountId = AccountId(2);
const KEEPER: AccountId = AccountId(3);

fn asset_config(
    id: AssetId,
    symbol: &str,
    decimals: u32,
    weight: u64,
    is_stable: bool,
    is_shortable: bool,
) -> AssetConfig {
    AssetConfig {
        id,
        symbol: symbol.to_string(),
        decimals,
        weight,
        min_profit_bps: Bps::zero(),
        max_unit_amount: Usd::zero(),
        is_stable,
        is_shortable,
    }
}

fn setup() -> (Vault, Bank, OracleBook) {
    let mut vault = Vault::new(VaultParams::default(), UNIT);
    vault.set_time(Timestamp::from_secs(1_000_000));

    vault.register_asset(asset_config(NATIVE, "WETH", 18, 30, false, true));
    vault.register_asset(asset_config(USDC, "USDC", 6, 40, true, false));
    vault.register_asset(asset_config(WBTC, "WBTC", 8, 30, false, true));

    let mut oracle = OracleBook::new();
    oracle.set_spot(NATIVE, Price::new_unchecked(dec!(3000)));
    oracle.set_spot(USDC, Price::new_unchecked(dec!(1)));
    oracle.set_spot(WBTC, Price::new_unchecked(dec!(40000)));

    (vault, Bank::new(), oracle)
}

fn supply(
    vault: &mut Vault,
    bank: &mut Bank,
    oracle: &OracleBook,
    supplier: AccountId,
    asset: AssetId,
    amount: rust_decimal::Decimal,
) -> SupplyResult {
    bank.mint(asset, Holder::User(supplier), Amount::new(amount));
    bank.transfer(
        asset,
        Holder::User(supplier),
        Holder::Vault,
        Amount::new(amount),
    )
    .unwrap();
    vault
        .supply_liquidity(bank, oracle, asset, supplier)
        .unwrap()
}

fn send_collateral(bank: &mut Bank, from: AccountId, asset: AssetId, amount: rust_decimal::Decimal) {
    bank.mint(asset, Holder::User(from), Amount::new(amount));
    bank.transfer(asset, Holder::User(from), Holder::Vault, Amount::new(amount))
        .unwrap();
}

fn long_key(owner: AccountId) -> PositionKey {
    PositionKey {
        owner,
        collateral_asset: WBTC,
        index_asset: WBTC,
        side: Side::Long,
    }
}

// Scenario A: single-asset pool at $300, 100 units deposited with the
// 0.3% mint fee. exact basis-point arithmetic.
#[test]
fn scenario_a_supply_fee_arithmetic() {
    let mut vault = Vault::new(VaultParams::default(), UNIT);
    vault.set_time(Timestamp::from_secs(1_000_000));
    vault.register_asset(asset_config(AssetId(7), "X", 18, 100, false, true));

    let mut oracle = OracleBook::new();
    oracle.set_spot(AssetId(7), Price::new_unchecked(dec!(300)));
    let mut bank = Bank::new();

    let result = supply(&mut vault, &mut bank, &oracle, LP, AssetId(7), dec!(100));

    // 100 x 300 x 0.997 = 29,910
    assert_eq!(result.minted_usd.value(), dec!(29910));
    assert_eq!(result.fee_bps.value(), 30);
    assert_eq!(result.fee_amount.value(), dec!(0.3));

    let pool = vault.pool(AssetId(7)).unwrap();
    assert_eq!(pool.fee_reserves.value(), dec!(0.3));
    assert_eq!(pool.pool_amount.value(), dec!(99.7));
    assert_eq!(pool.unit_amount.value(), dec!(29910));
    assert_eq!(vault.unit_supply().value(), dec!(29910));
    assert_eq!(
        bank.balance(UNIT, Holder::User(LP)).value(),
        dec!(29910)
    );
    assert!(vault.pool_identity_holds(&bank, AssetId(7)));
}

// Scenario B: a 90,000 USD long must fail while collateral cannot cover
// the margin fee, then succeed with entry-price averaging and the full
// notional reserved.
#[test]
fn scenario_b_long_needs_margin_fee_coverage() {
    let (mut vault, mut bank, oracle) = setup();
    supply(&mut vault, &mut bank, &oracle, LP, WBTC, dec!(10));

    // 10 USD of collateral against a 90 USD margin fee
    send_collateral(&mut bank, TRADER, WBTC, dec!(0.00025));
    let err = vault
        .increase_position(
            &mut bank,
            &oracle,
            TRADER,
            WBTC,
            WBTC,
            Usd::new(dec!(90000)),
            Side::Long,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        VaultError::InsufficientCollateralForFees { .. }
    ));
    assert!(vault.position(&long_key(TRADER)).is_none());

    // top up to 0.25 WBTC total; the earlier transfer is still pending
    send_collateral(&mut bank, TRADER, WBTC, dec!(0.25));
    vault
        .increase_position(
            &mut bank,
            &oracle,
            TRADER,
            WBTC,
            WBTC,
            Usd::new(dec!(90000)),
            Side::Long,
        )
        .unwrap();

    let position = vault.position(&long_key(TRADER)).unwrap();
    assert_eq!(position.average_price.value(), dec!(40000));
    assert_eq!(position.size.value(), dec!(90000));
    // collateral = 0.25025 BTC x 40,000 - 90 fee
    assert_eq!(position.collateral.value(), dec!(10010) - dec!(90));

    // 90,000 / 40,000 = 2.25 WBTC reserved
    let pool = vault.pool(WBTC).unwrap();
    assert_eq!(pool.reserved_amount.value(), dec!(2.25));
    assert_eq!(position.reserve_amount.value(), dec!(2.25));
    assert!(vault.pool_identity_holds(&bank, WBTC));
}

// Scenario C: decreasing by more than the position's size fails and leaves
// the position untouched.
#[test]
fn scenario_c_oversized_decrease_rejected() {
    let (mut vault, mut bank, oracle) = setup();
    supply(&mut vault, &mut bank, &oracle, LP, WBTC, dec!(10));

    send_collateral(&mut bank, TRADER, WBTC, dec!(0.25));
    vault
        .increase_position(
            &mut bank,
            &oracle,
            TRADER,
            WBTC,
            WBTC,
            Usd::new(dec!(50000)),
            Side::Long,
        )
        .unwrap();

    let before = vault.position(&long_key(TRADER)).unwrap().clone();
    let err = vault
        .decrease_position(
            &mut bank,
            &oracle,
            TRADER,
            WBTC,
            WBTC,
            Usd::zero(),
            Usd::new(dec!(60000)),
            Side::Long,
            Holder::User(TRADER),
        )
        .unwrap_err();
    assert!(matches!(err, VaultError::SizeDeltaExceedsPosition { .. }));

    let after = vault.position(&long_key(TRADER)).unwrap();
    assert_eq!(after.size, before.size);
    assert_eq!(after.collateral, before.collateral);
    assert_eq!(after.reserve_amount, before.reserve_amount);
}

// Scenario D: a swap order with triggerAboveThreshold=false is gated by
// min_out alone, and a failed execution changes nothing.
#[test]
fn scenario_d_swap_order_min_out_gate() {
    let (mut vault, mut bank, mut oracle) = setup();
    let mut engine = OrderEngine::new(OrderParams::default(), NATIVE);
    supply(&mut vault, &mut bank, &oracle, LP, USDC, dec!(500_000));
    supply(&mut vault, &mut bank, &oracle, LP, WBTC, dec!(10));

    let fee = engine.params().min_execution_fee;
    bank.mint(USDC, Holder::User(TRADER), Amount::new(dec!(41_000)));
    bank.mint(NATIVE, Holder::User(TRADER), fee);

    // wants at least 1.02 WBTC for 41,000 USDC; needs BTC below ~40,077
    let index = engine
        .create_swap_order(
            &mut bank,
            TRADER,
            vec![USDC, WBTC],
            Amount::new(dec!(41_000)),
            Amount::new(dec!(1.02)),
            rust_decimal::Decimal::ZERO,
            false,
            fee,
            fee,
            vault.time(),
        )
        .unwrap();

    // at 40,500 the post-fee output lands near 1.007, short of min_out
    oracle.set_spot(WBTC, Price::new_unchecked(dec!(40_500)));
    let pool_before = vault.pool(WBTC).unwrap().clone();
    let err = engine
        .execute_swap_order(&mut vault, &mut bank, &oracle, TRADER, index, KEEPER)
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientAmountOut { .. }));

    // no state change on failure
    let pool_after = vault.pool(WBTC).unwrap();
    assert_eq!(pool_after.pool_amount, pool_before.pool_amount);
    assert_eq!(pool_after.fee_reserves, pool_before.fee_reserves);
    assert!(engine.swap_order(TRADER, index).is_some());
    assert_eq!(bank.balance(WBTC, Holder::User(TRADER)).value(), dec!(0));

    // price drops enough for min_out to clear
    oracle.set_spot(WBTC, Price::new_unchecked(dec!(39_000)));
    engine
        .execute_swap_order(&mut vault, &mut bank, &oracle, TRADER, index, KEEPER)
        .unwrap();

    assert!(engine.swap_order(TRADER, index).is_none());
    let received = bank.balance(WBTC, Holder::User(TRADER));
    assert!(received.value() >= dec!(1.02), "received {}", received);
    assert_eq!(bank.balance(NATIVE, Holder::User(KEEPER)), fee);
    assert!(vault.pool_identity_holds(&bank, WBTC));
    assert!(vault.pool_identity_holds(&bank, USDC));
}

// Trigger asymmetry: the same oracle book (min 39,500 / max 40,500) is read
// on opposite sides by increase and decrease orders.
#[test]
fn trigger_asymmetry_for_position_orders() {
    let (mut vault, mut bank, mut oracle) = setup();
    let mut engine = OrderEngine::new(OrderParams::default(), NATIVE);
    supply(&mut vault, &mut bank, &oracle, LP, WBTC, dec!(20));
    supply(&mut vault, &mut bank, &oracle, LP, USDC, dec!(500_000));

    let fee = engine.params().min_execution_fee;
    oracle.set_price(
        WBTC,
        Price::new_unchecked(dec!(39_500)),
        Price::new_unchecked(dec!(40_500)),
    );

    // long increase, trigger_above=true at 40,400: max price 40,500 crosses
    bank.mint(WBTC, Holder::User(TRADER), Amount::new(dec!(0.5)));
    bank.mint(NATIVE, Holder::User(TRADER), fee.add(fee));
    let long_entry = engine
        .create_increase_order(
            &mut bank,
            TRADER,
            WBTC,
            Amount::new(dec!(0.5)),
            WBTC,
            WBTC,
            Usd::new(dec!(40_000)),
            Side::Long,
            Price::new_unchecked(dec!(40_400)),
            true,
            fee,
            fee,
            vault.time(),
        )
        .unwrap();
    engine
        .execute_increase_order(&mut vault, &mut bank, &oracle, TRADER, long_entry, KEEPER)
        .unwrap();

    // long decrease, trigger_above=true at 40,400: gated by the MIN price
    // (39,500), so the very same book does not execute
    let close = engine
        .create_decrease_order(
            &mut bank,
            TRADER,
            WBTC,
            WBTC,
            Usd::zero(),
            Usd::new(dec!(40_000)),
            Side::Long,
            Price::new_unchecked(dec!(40_400)),
            true,
            fee,
            fee,
            vault.time(),
        )
        .unwrap();
    let err = engine
        .execute_decrease_order(&mut vault, &mut bank, &oracle, TRADER, close, KEEPER)
        .unwrap_err();
    assert_eq!(err, OrderError::InvalidPriceForExecution);

    // once the minimum itself crosses, the exit goes through
    oracle.set_price(
        WBTC,
        Price::new_unchecked(dec!(40_400)),
        Price::new_unchecked(dec!(41_000)),
    );
    engine
        .execute_decrease_order(&mut vault, &mut bank, &oracle, TRADER, close, KEEPER)
        .unwrap();
    assert!(vault.position(&long_key(TRADER)).is_none());
}

#[test]
fn short_increase_order_uses_min_price() {
    let (mut vault, mut bank, mut oracle) = setup();
    let mut engine = OrderEngine::new(OrderParams::default(), NATIVE);
    supply(&mut vault, &mut bank, &oracle, LP, USDC, dec!(500_000));

    let fee = engine.params().min_execution_fee;
    bank.mint(USDC, Holder::User(TRADER), Amount::new(dec!(10_000)));
    bank.mint(NATIVE, Holder::User(TRADER), fee);

    // short entry above 40,200, gated by the minimum price
    let index = engine
        .create_increase_order(
            &mut bank,
            TRADER,
            USDC,
            Amount::new(dec!(10_000)),
            USDC,
            WBTC,
            Usd::new(dec!(50_000)),
            Side::Short,
            Price::new_unchecked(dec!(40_200)),
            true,
            fee,
            fee,
            vault.time(),
        )
        .unwrap();

    // max crosses but min does not: not executable
    oracle.set_price(
        WBTC,
        Price::new_unchecked(dec!(40_100)),
        Price::new_unchecked(dec!(40_600)),
    );
    let err = engine
        .execute_increase_order(&mut vault, &mut bank, &oracle, TRADER, index, KEEPER)
        .unwrap_err();
    assert_eq!(err, OrderError::InvalidPriceForExecution);

    oracle.set_price(
        WBTC,
        Price::new_unchecked(dec!(40_200)),
        Price::new_unchecked(dec!(40_700)),
    );
    engine
        .execute_increase_order(&mut vault, &mut bank, &oracle, TRADER, index, KEEPER)
        .unwrap();

    let key = PositionKey {
        owner: TRADER,
        collateral_asset: USDC,
        index_asset: WBTC,
        side: Side::Short,
    };
    // short entry marks at the minimum price
    assert_eq!(
        vault.position(&key).unwrap().average_price.value(),
        dec!(40_200)
    );
    assert_eq!(
        vault.pool(WBTC).unwrap().global_short_size.value(),
        dec!(50_000)
    );
}

#[test]
fn cancellation_refunds_and_is_idempotent() {
    let (vault, mut bank, _oracle) = setup();
    let mut engine = OrderEngine::new(OrderParams::default(), NATIVE);

    let fee = engine.params().min_execution_fee;
    bank.mint(WBTC, Holder::User(TRADER), Amount::new(dec!(0.5)));
    bank.mint(NATIVE, Holder::User(TRADER), fee);

    let index = engine
        .create_increase_order(
            &mut bank,
            TRADER,
            WBTC,
            Amount::new(dec!(0.5)),
            WBTC,
            WBTC,
            Usd::new(dec!(10_000)),
            Side::Long,
            Price::new_unchecked(dec!(39_000)),
            false,
            fee,
            fee,
            vault.time(),
        )
        .unwrap();

    // escrow pulled
    assert_eq!(bank.balance(WBTC, Holder::User(TRADER)).value(), dec!(0));
    assert_eq!(bank.balance(WBTC, Holder::Orders).value(), dec!(0.5));

    engine
        .cancel_increase_order(&mut bank, TRADER, index, vault.time())
        .unwrap();
    assert_eq!(bank.balance(WBTC, Holder::User(TRADER)).value(), dec!(0.5));
    assert_eq!(bank.balance(NATIVE, Holder::User(TRADER)), fee);

    // cancelling a zeroed slot always fails and moves nothing
    let err = engine
        .cancel_increase_order(&mut bank, TRADER, index, vault.time())
        .unwrap_err();
    assert!(matches!(err, OrderError::NonExistentOrder { .. }));
    assert_eq!(bank.balance(WBTC, Holder::User(TRADER)).value(), dec!(0.5));
    assert_eq!(bank.balance(WBTC, Holder::Orders).value(), dec!(0));
}

#[test]
fn cancel_multiple_is_all_or_nothing() {
    let (vault, mut bank, _oracle) = setup();
    let mut engine = OrderEngine::new(OrderParams::default(), NATIVE);

    let fee = engine.params().min_execution_fee;
    bank.mint(WBTC, Holder::User(TRADER), Amount::new(dec!(1)));
    bank.mint(NATIVE, Holder::User(TRADER), fee.add(fee));

    let a = engine
        .create_increase_order(
            &mut bank,
            TRADER,
            WBTC,
            Amount::new(dec!(0.4)),
            WBTC,
            WBTC,
            Usd::new(dec!(10_000)),
            Side::Long,
            Price::new_unchecked(dec!(39_000)),
            false,
            fee,
            fee,
            vault.time(),
        )
        .unwrap();
    let b = engine
        .create_increase_order(
            &mut bank,
            TRADER,
            WBTC,
            Amount::new(dec!(0.6)),
            WBTC,
            WBTC,
            Usd::new(dec!(12_000)),
            Side::Long,
            Price::new_unchecked(dec!(38_000)),
            false,
            fee,
            fee,
            vault.time(),
        )
        .unwrap();

    // one bad decrease index poisons the whole batch
    let err = engine
        .cancel_multiple(&mut bank, TRADER, &[], &[a, b], &[9], vault.time())
        .unwrap_err();
    assert!(matches!(err, OrderError::NonExistentOrder { index: 9, .. }));
    assert!(engine.increase_order(TRADER, a).is_some());
    assert!(engine.increase_order(TRADER, b).is_some());
    assert_eq!(bank.balance(WBTC, Holder::User(TRADER)).value(), dec!(0));

    // empty subsets are tolerated
    engine
        .cancel_multiple(&mut bank, TRADER, &[], &[a, b], &[], vault.time())
        .unwrap();
    assert_eq!(bank.balance(WBTC, Holder::User(TRADER)).value(), dec!(1));
    assert_eq!(engine.pending_order_count(TRADER), 0);
}

#[test]
fn escrow_equation_errors_are_distinct() {
    let (vault, mut bank, _oracle) = setup();
    let mut engine = OrderEngine::new(OrderParams::default(), NATIVE);
    let fee = engine.params().min_execution_fee;
    let low = Amount::new(fee.value() / dec!(2));

    bank.mint(NATIVE, Holder::User(TRADER), Amount::new(dec!(100)));
    bank.mint(WBTC, Holder::User(TRADER), Amount::new(dec!(1)));

    // fee below the configured floor
    let err = engine
        .create_increase_order(
            &mut bank,
            TRADER,
            WBTC,
            Amount::new(dec!(0.5)),
            WBTC,
            WBTC,
            Usd::new(dec!(10_000)),
            Side::Long,
            Price::new_unchecked(dec!(39_000)),
            false,
            low,
            low,
            vault.time(),
        )
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientExecutionFee { .. }));

    // non-native escrow: sent value must equal the fee exactly
    let err = engine
        .create_increase_order(
            &mut bank,
            TRADER,
            WBTC,
            Amount::new(dec!(0.5)),
            WBTC,
            WBTC,
            Usd::new(dec!(10_000)),
            Side::Long,
            Price::new_unchecked(dec!(39_000)),
            false,
            fee,
            fee.add(fee),
            vault.time(),
        )
        .unwrap_err();
    assert!(matches!(err, OrderError::IncorrectExecutionFee { .. }));

    // native escrow: sent value must equal amount_in + fee
    let err = engine
        .create_increase_order(
            &mut bank,
            TRADER,
            NATIVE,
            Amount::new(dec!(1)),
            NATIVE,
            NATIVE,
            Usd::new(dec!(10_000)),
            Side::Long,
            Price::new_unchecked(dec!(2900)),
            false,
            fee,
            fee,
            vault.time(),
        )
        .unwrap_err();
    assert!(matches!(err, OrderError::IncorrectValueTransferred { .. }));
}

#[test]
fn funding_charges_accrue_into_decrease_fees() {
    let (mut vault, mut bank, oracle) = setup();
    supply(&mut vault, &mut bank, &oracle, LP, USDC, dec!(500_000));

    send_collateral(&mut bank, TRADER, USDC, dec!(10_000));
    vault
        .increase_position(
            &mut bank,
            &oracle,
            TRADER,
            USDC,
            WBTC,
            Usd::new(dec!(50_000)),
            Side::Short,
        )
        .unwrap();

    // 8 whole intervals at stable factor 0.0004, utilization 50,000/499,850
    vault.advance_time(8 * 3600);
    let result = vault
        .decrease_position(
            &mut bank,
            &oracle,
            TRADER,
            USDC,
            WBTC,
            Usd::zero(),
            Usd::new(dec!(50_000)),
            Side::Short,
            Holder::User(TRADER),
        )
        .unwrap();

    // fee exceeds the flat 50 USD margin fee because funding accrued
    let margin_only = dec!(50);
    assert!(result.fee.value() > margin_only, "fee was {}", result.fee);
    assert!(vault.pool_identity_holds(&bank, USDC));
}

#[test]
fn liquidation_three_state_classification() {
    let (mut vault, mut bank, mut oracle) = setup();
    vault.add_liquidator(KEEPER);
    supply(&mut vault, &mut bank, &oracle, LP, WBTC, dec!(10));

    send_collateral(&mut bank, TRADER, WBTC, dec!(0.1));
    vault
        .increase_position(
            &mut bank,
            &oracle,
            TRADER,
            WBTC,
            WBTC,
            Usd::new(dec!(80_000)),
            Side::Long,
        )
        .unwrap();

    let key = long_key(TRADER);

    // healthy at entry
    let (state, _) = vault.liquidation_state(&oracle, &key).unwrap();
    assert_eq!(state, LiquidationState::Healthy);
    let err = vault
        .liquidate_position(
            &mut bank,
            &oracle,
            KEEPER,
            TRADER,
            WBTC,
            WBTC,
            Side::Long,
            Holder::User(KEEPER),
        )
        .unwrap_err();
    assert_eq!(err, VaultError::PositionHealthy);

    // a deep move leaves losses above the collateral: insolvent
    oracle.set_spot(WBTC, Price::new_unchecked(dec!(38_000)));
    let (state, _) = vault.liquidation_state(&oracle, &key).unwrap();
    assert_eq!(state, LiquidationState::Insolvent);

    let result = vault
        .liquidate_position(
            &mut bank,
            &oracle,
            KEEPER,
            TRADER,
            WBTC,
            WBTC,
            Side::Long,
            Holder::User(KEEPER),
        )
        .unwrap();
    assert!(!result.deleveraged);
    assert!(result.fee_to_liquidator.value() > dec!(0));
    assert!(vault.position(&key).is_none());
    assert_eq!(vault.pool(WBTC).unwrap().reserved_amount.value(), dec!(0));
    assert!(vault.pool_identity_holds(&bank, WBTC));

    // keeper got paid
    assert_eq!(
        bank.balance(WBTC, Holder::User(KEEPER)),
        result.fee_to_liquidator
    );
}

#[test]
fn unauthorized_liquidator_rejected() {
    let (mut vault, mut bank, oracle) = setup();
    supply(&mut vault, &mut bank, &oracle, LP, WBTC, dec!(10));

    let err = vault
        .liquidate_position(
            &mut bank,
            &oracle,
            TRADER,
            TRADER,
            WBTC,
            WBTC,
            Side::Long,
            Holder::User(TRADER),
        )
        .unwrap_err();
    assert_eq!(err, VaultError::UnauthorizedLiquidator(TRADER));
}

#[test]
fn withdraw_liquidity_round_trip() {
    let (mut vault, mut bank, oracle) = setup();
    let result = supply(&mut vault, &mut bank, &oracle, LP, WBTC, dec!(10));

    // redeem half the units back into WBTC
    let half = Amount::new(result.minted_usd.value() / dec!(2));
    bank.transfer(UNIT, Holder::User(LP), Holder::Vault, half)
        .unwrap();
    let withdrawal = vault
        .withdraw_liquidity(&mut bank, &oracle, WBTC, LP)
        .unwrap();

    assert!(withdrawal.amount_out.value() > dec!(4.9));
    assert!(withdrawal.amount_out.value() < dec!(5));
    assert_eq!(
        bank.balance(WBTC, Holder::User(LP)),
        withdrawal.amount_out
    );
    assert!(vault.pool_identity_holds(&bank, WBTC));

    // burned units are gone from supply
    assert_eq!(
        vault.unit_supply().value(),
        result.minted_usd.value() - half.value()
    );
}

#[test]
fn aum_counts_stables_at_face_and_short_pnl() {
    let (mut vault, mut bank, mut oracle) = setup();
    supply(&mut vault, &mut bank, &oracle, LP, USDC, dec!(400_000));

    // 400,000 less the 0.3% mint fee
    assert_eq!(vault.aum(&oracle, false).unwrap().value(), dec!(398_800));

    send_collateral(&mut bank, TRADER, USDC, dec!(10_000));
    vault
        .increase_position(
            &mut bank,
            &oracle,
            TRADER,
            USDC,
            WBTC,
            Usd::new(dec!(50_000)),
            Side::Short,
        )
        .unwrap();

    // collateral entered the stable pool net of the 50 USD margin fee
    let pool_usdc = vault.pool(USDC).unwrap().pool_amount;
    assert_eq!(pool_usdc.value(), dec!(408_750));

    // shorts move into profit: their claim comes out of the valuation
    oracle.set_spot(WBTC, Price::new_unchecked(dec!(36_000)));
    // 50,000 x 4,000 / 40,000 = 5,000 of short profit
    assert_eq!(
        vault.aum(&oracle, false).unwrap().value(),
        dec!(408_750) - dec!(5_000)
    );
}

#[test]
fn update_order_overwrites_trigger_and_is_owner_only() {
    let (mut vault, mut bank, oracle) = setup();
    let mut engine = OrderEngine::new(OrderParams::default(), NATIVE);
    supply(&mut vault, &mut bank, &oracle, LP, WBTC, dec!(10));

    let fee = engine.params().min_execution_fee;
    bank.mint(WBTC, Holder::User(TRADER), Amount::new(dec!(0.25)));
    bank.mint(NATIVE, Holder::User(TRADER), fee);

    let index = engine
        .create_increase_order(
            &mut bank,
            TRADER,
            WBTC,
            Amount::new(dec!(0.25)),
            WBTC,
            WBTC,
            Usd::new(dec!(30_000)),
            Side::Long,
            Price::new_unchecked(dec!(39_000)),
            false,
            fee,
            fee,
            vault.time(),
        )
        .unwrap();

    // 40,000 is above the 39,000 trigger: not yet executable
    let err = engine
        .execute_increase_order(&mut vault, &mut bank, &oracle, TRADER, index, KEEPER)
        .unwrap_err();
    assert_eq!(err, OrderError::InvalidPriceForExecution);

    // only the owner's slots are addressable
    let err = engine
        .update_increase_order(
            KEEPER,
            index,
            Usd::new(dec!(30_000)),
            Price::new_unchecked(dec!(41_000)),
            false,
            vault.time(),
        )
        .unwrap_err();
    assert!(matches!(err, OrderError::NonExistentOrder { .. }));

    engine
        .update_increase_order(
            TRADER,
            index,
            Usd::new(dec!(25_000)),
            Price::new_unchecked(dec!(41_000)),
            false,
            vault.time(),
        )
        .unwrap();

    engine
        .execute_increase_order(&mut vault, &mut bank, &oracle, TRADER, index, KEEPER)
        .unwrap();
    let position = vault.position(&long_key(TRADER)).unwrap();
    assert_eq!(position.size.value(), dec!(25_000));
}

#[test]
fn withdraw_blocked_by_reserve_invariant() {
    let (mut vault, mut bank, oracle) = setup();
    let minted = supply(&mut vault, &mut bank, &oracle, LP, WBTC, dec!(10));

    // reserve most of the pool with a large long
    send_collateral(&mut bank, TRADER, WBTC, dec!(1));
    vault
        .increase_position(
            &mut bank,
            &oracle,
            TRADER,
            WBTC,
            WBTC,
            Usd::new(dec!(320_000)),
            Side::Long,
        )
        .unwrap();

    // redeeming everything would dip below the reserved amount
    bank.transfer(
        UNIT,
        Holder::User(LP),
        Holder::Vault,
        Amount::new(minted.minted_usd.value()),
    )
    .unwrap();
    let err = vault
        .withdraw_liquidity(&mut bank, &oracle, WBTC, LP)
        .unwrap_err();
    assert!(matches!(
        err,
        VaultError::ReserveExceedsPool { .. } | VaultError::PoolExhausted { .. }
    ));
}
