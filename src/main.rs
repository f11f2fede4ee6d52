//! Shared-Liquidity Vault Simulation.
//!
//! Demonstrates the full core lifecycle: pool bootstrap, swaps, leveraged
//! longs and shorts, funding accrual, liquidation, and conditional orders
//! executed by a third-party keeper.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use vault_core::*;

const NATIVE: AssetId = AssetId(0);
const USDC: AssetId = AssetId(1);
const WBTC: AssetId = AssetId(2);
const UNIT: AssetId = AssetId(100);

fn main() {
    println!("Shared-Liquidity Vault Core Simulation");
    println!("Multi-Asset Pool, Leveraged Positions, Conditional Orders\n");

    scenario_1_pool_bootstrap();
    scenario_2_swap();
    scenario_3_long_lifecycle();
    scenario_4_short_and_funding();
    scenario_5_liquidation();
    scenario_6_conditional_orders();

    println!("\nAll simulations completed successfully.");
}

fn setup() -> (Vault, Bank, OracleBook) {
    let mut vault = Vault::new(VaultParams::default(), UNIT);
    vault.set_time(Timestamp::from_secs(1_000_000));

    vault.register_asset(AssetConfig {
        id: NATIVE,
        symbol: "WETH".to_string(),
        decimals: 18,
        weight: 30,
        min_profit_bps: Bps::zero(),
        max_unit_amount: Usd::zero(),
        is_stable: false,
        is_shortable: true,
    });
    vault.register_asset(AssetConfig {
        id: USDC,
        symbol: "USDC".to_string(),
        decimals: 6,
        weight: 40,
        min_profit_bps: Bps::zero(),
        max_unit_amount: Usd::zero(),
        is_stable: true,
        is_shortable: false,
    });
    vault.register_asset(AssetConfig {
        id: WBTC,
        symbol: "WBTC".to_string(),
        decimals: 8,
        weight: 30,
        min_profit_bps: Bps::zero(),
        max_unit_amount: Usd::zero(),
        is_stable: false,
        is_shortable: true,
    });

    let mut oracle = OracleBook::new();
    oracle.set_spot(NATIVE, Price::new_unchecked(dec!(3000)));
    oracle.set_spot(USDC, Price::new_unchecked(dec!(1)));
    oracle.set_spot(WBTC, Price::new_unchecked(dec!(40000)));

    (vault, Bank::new(), oracle)
}

fn fund_and_supply(
    vault: &mut Vault,
    bank: &mut Bank,
    oracle: &OracleBook,
    supplier: AccountId,
    asset: AssetId,
    amount: Decimal,
) -> SupplyResult {
    bank.mint(asset, Holder::User(supplier), Amount::new(amount));
    bank.transfer(asset, Holder::User(supplier), Holder::Vault, Amount::new(amount))
        .unwrap();
    vault.supply_liquidity(bank, oracle, asset, supplier).unwrap()
}

/// Pool bootstrap: three assets supplied, accounting units minted.
fn scenario_1_pool_bootstrap() {
    println!("Scenario 1: Pool Bootstrap\n");

    let (mut vault, mut bank, oracle) = setup();
    let lp = AccountId(1);

    let result = fund_and_supply(&mut vault, &mut bank, &oracle, lp, USDC, dec!(400_000));
    println!("  Supplied 400,000 USDC, minted {} units ({} bps fee)", result.minted_usd, result.fee_bps.value());

    let result = fund_and_supply(&mut vault, &mut bank, &oracle, lp, WBTC, dec!(7.5));
    println!("  Supplied 7.5 WBTC, minted {} units ({} bps fee)", result.minted_usd, result.fee_bps.value());

    let result = fund_and_supply(&mut vault, &mut bank, &oracle, lp, NATIVE, dec!(100));
    println!("  Supplied 100 WETH, minted {} units ({} bps fee)", result.minted_usd, result.fee_bps.value());

    println!("  Unit supply: {}", vault.unit_supply());
    println!("  AUM (min prices): {}", vault.aum(&oracle, false).unwrap());
    println!("  LP unit balance: {}\n", bank.balance(UNIT, Holder::User(lp)));
}

/// Swapping against the pool with the dynamic fee curve.
fn scenario_2_swap() {
    println!("Scenario 2: Swap\n");

    let (mut vault, mut bank, oracle) = setup();
    let lp = AccountId(1);
    let trader = AccountId(2);

    fund_and_supply(&mut vault, &mut bank, &oracle, lp, USDC, dec!(400_000));
    fund_and_supply(&mut vault, &mut bank, &oracle, lp, WBTC, dec!(10));

    bank.mint(USDC, Holder::User(trader), Amount::new(dec!(40_000)));
    bank.transfer(USDC, Holder::User(trader), Holder::Vault, Amount::new(dec!(40_000)))
        .unwrap();
    let result = vault
        .swap(&mut bank, &oracle, USDC, WBTC, Holder::User(trader))
        .unwrap();

    println!("  Swapped 40,000 USDC -> {} WBTC ({} bps fee)", result.amount_out, result.fee_bps.value());
    println!("  WBTC fee reserves: {}", vault.pool(WBTC).unwrap().fee_reserves);
    println!("  Pool identity (WBTC): {}\n", vault.pool_identity_holds(&bank, WBTC));
}

/// A leveraged long from open to close through a price move.
fn scenario_3_long_lifecycle() {
    println!("Scenario 3: Long Lifecycle\n");

    let (mut vault, mut bank, mut oracle) = setup();
    let lp = AccountId(1);
    let trader = AccountId(2);

    fund_and_supply(&mut vault, &mut bank, &oracle, lp, WBTC, dec!(10));

    // 0.25 BTC collateral, 10x long
    bank.mint(WBTC, Holder::User(trader), Amount::new(dec!(0.25)));
    bank.transfer(WBTC, Holder::User(trader), Holder::Vault, Amount::new(dec!(0.25)))
        .unwrap();
    let result = vault
        .increase_position(&mut bank, &oracle, trader, WBTC, WBTC, Usd::new(dec!(100_000)), Side::Long)
        .unwrap();
    println!("  Opened 100,000 USD long @ {} (fee {})", result.price, result.fee);

    let key = PositionKey {
        owner: trader,
        collateral_asset: WBTC,
        index_asset: WBTC,
        side: Side::Long,
    };
    let position = vault.position(&key).unwrap();
    println!("  Position: size {}, collateral {}, leverage {:.1}x", position.size, position.collateral, position.leverage());

    oracle.set_spot(WBTC, Price::new_unchecked(dec!(44000)));
    vault.advance_time(7200);
    let delta = vault.position_delta(&oracle, &key).unwrap();
    println!("  Price to 44,000: unrealized {} (profit: {})", delta.usd, delta.has_profit);

    let result = vault
        .decrease_position(&mut bank, &oracle, trader, WBTC, WBTC, Usd::zero(), Usd::new(dec!(100_000)), Side::Long, Holder::User(trader))
        .unwrap();
    println!("  Closed: paid out {} WBTC, realized pnl {}", result.amount_out, result.realized_pnl);
    println!("  Pool identity (WBTC): {}\n", vault.pool_identity_holds(&bank, WBTC));
}

/// Shorts accrue funding against the stable pool over time.
fn scenario_4_short_and_funding() {
    println!("Scenario 4: Short + Funding\n");

    let (mut vault, mut bank, oracle) = setup();
    let lp = AccountId(1);
    let trader = AccountId(2);

    fund_and_supply(&mut vault, &mut bank, &oracle, lp, USDC, dec!(500_000));

    bank.mint(USDC, Holder::User(trader), Amount::new(dec!(10_000)));
    bank.transfer(USDC, Holder::User(trader), Holder::Vault, Amount::new(dec!(10_000)))
        .unwrap();
    vault
        .increase_position(&mut bank, &oracle, trader, USDC, WBTC, Usd::new(dec!(50_000)), Side::Short)
        .unwrap();

    let pool = vault.pool(USDC).unwrap();
    println!("  Opened 50,000 USD short on WBTC");
    println!("  USDC reserved: {}, utilization {:.4}", pool.reserved_amount, pool.utilization());
    println!("  Global short size: {}", vault.pool(WBTC).unwrap().global_short_size);

    vault.advance_time(8 * 3600);
    vault.update_cumulative_funding_rate(USDC);
    println!("  After 8h, cumulative funding rate: {}\n", vault.pool(USDC).unwrap().cumulative_funding_rate);
}

/// An under-collateralized long gets seized once losses breach the margin.
fn scenario_5_liquidation() {
    println!("Scenario 5: Liquidation\n");

    let (mut vault, mut bank, mut oracle) = setup();
    let lp = AccountId(1);
    let trader = AccountId(2);
    let keeper = AccountId(3);
    vault.add_liquidator(keeper);

    fund_and_supply(&mut vault, &mut bank, &oracle, lp, WBTC, dec!(10));

    bank.mint(WBTC, Holder::User(trader), Amount::new(dec!(0.1)));
    bank.transfer(WBTC, Holder::User(trader), Holder::Vault, Amount::new(dec!(0.1)))
        .unwrap();
    vault
        .increase_position(&mut bank, &oracle, trader, WBTC, WBTC, Usd::new(dec!(80_000)), Side::Long)
        .unwrap();
    println!("  Opened 80,000 USD long with 0.1 WBTC collateral (20x)");

    let key = PositionKey {
        owner: trader,
        collateral_asset: WBTC,
        index_asset: WBTC,
        side: Side::Long,
    };

    for price in [dec!(39000), dec!(38500), dec!(38000)] {
        oracle.set_spot(WBTC, Price::new_unchecked(price));
        let (state, _) = vault.liquidation_state(&oracle, &key).unwrap();
        println!("  Price {}: {:?}", price, state);
        if state != LiquidationState::Healthy {
            let result = vault
                .liquidate_position(&mut bank, &oracle, keeper, trader, WBTC, WBTC, Side::Long, Holder::User(keeper))
                .unwrap();
            println!("  Liquidated: size {}, keeper fee {} WBTC", result.size, result.fee_to_liquidator);
            break;
        }
    }
    println!("  Pool identity (WBTC): {}\n", vault.pool_identity_holds(&bank, WBTC));
}

/// Conditional orders: a keeper executes once the trigger validates.
fn scenario_6_conditional_orders() {
    println!("Scenario 6: Conditional Orders\n");

    let (mut vault, mut bank, mut oracle) = setup();
    let mut engine = OrderEngine::new(OrderParams::default(), NATIVE);
    let lp = AccountId(1);
    let trader = AccountId(2);
    let keeper = AccountId(3);

    fund_and_supply(&mut vault, &mut bank, &oracle, lp, WBTC, dec!(10));

    // escrow 0.1 WBTC plus the native execution fee
    let fee = engine.params().min_execution_fee;
    bank.mint(WBTC, Holder::User(trader), Amount::new(dec!(0.1)));
    bank.mint(NATIVE, Holder::User(trader), fee);

    let index = engine
        .create_increase_order(
            &mut bank,
            trader,
            WBTC,
            Amount::new(dec!(0.1)),
            WBTC,
            WBTC,
            Usd::new(dec!(20_000)),
            Side::Long,
            Price::new_unchecked(dec!(39_000)),
            false, // execute once the price falls to the trigger
            fee,
            fee,
            vault.time(),
        )
        .unwrap();
    println!("  Created increase order {} (trigger <= 39,000)", index);

    let premature = engine.execute_increase_order(&mut vault, &mut bank, &oracle, trader, index, keeper);
    println!("  Execution at 40,000: {:?}", premature.unwrap_err());

    oracle.set_spot(WBTC, Price::new_unchecked(dec!(38_900)));
    engine
        .execute_increase_order(&mut vault, &mut bank, &oracle, trader, index, keeper)
        .unwrap();
    println!("  Execution at 38,900: filled, keeper earned {} native", bank.balance(NATIVE, Holder::User(keeper)));

    let key = PositionKey {
        owner: trader,
        collateral_asset: WBTC,
        index_asset: WBTC,
        side: Side::Long,
    };
    let position = vault.position(&key).unwrap();
    println!("  Position opened by keeper: size {}, entry {}", position.size, position.average_price);
}
