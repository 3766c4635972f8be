//! Property tests for cart invariants.
//!
//! Random operation sequences run against a fake catalog whose stock levels
//! shift between steps and whose store occasionally refuses writes. After
//! every step the cart must hold unique lines, respect the stock it was
//! validated against, match the persisted blob, and be unchanged whenever
//! the operation did not commit.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use rocketshoes_cart::Outcome;
use rocketshoes_core::{Cart, ProductId};
use rocketshoes_integration_tests::{FakeCatalog, Fixture};

#[derive(Debug, Clone)]
enum Op {
    Add(i32),
    Remove(i32),
    Update(i32, i64),
    Restock(i32, u32),
    Outage(i32),
    StoreDown(bool),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1..5i32).prop_map(Op::Add),
        2 => (1..5i32).prop_map(Op::Remove),
        3 => ((1..5i32), (-2..9i64)).prop_map(|(id, amount)| Op::Update(id, amount)),
        2 => ((1..5i32), (0..6u32)).prop_map(|(id, amount)| Op::Restock(id, amount)),
        1 => (1..5i32).prop_map(Op::Outage),
        1 => any::<bool>().prop_map(Op::StoreDown),
    ]
}

fn assert_unique(cart: &Cart) -> Result<(), TestCaseError> {
    let mut ids: Vec<ProductId> = cart.items().iter().map(|item| item.product_id()).collect();
    ids.sort();
    ids.dedup();
    prop_assert_eq!(ids.len(), cart.len());
    Ok(())
}

async fn run_sequence(stock: Vec<u32>, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let levels: Vec<(i32, u32)> = (1..).zip(stock).collect();
    let fixture = Fixture::new(FakeCatalog::with_stock(&levels), &Cart::new()).await;

    for op in ops {
        let before = fixture.manager.cart();
        let outcome = match op {
            Op::Add(id) => Some((id, fixture.manager.add_product(ProductId::new(id)).await)),
            Op::Remove(id) => Some((id, fixture.manager.remove_product(ProductId::new(id)).await)),
            Op::Update(id, amount) => Some((
                id,
                fixture
                    .manager
                    .update_product_amount(ProductId::new(id), amount)
                    .await,
            )),
            Op::Restock(id, amount) => {
                fixture.catalog.set_stock(id, amount);
                None
            }
            Op::Outage(id) => {
                fixture.catalog.drop_stock(id);
                None
            }
            Op::StoreDown(down) => {
                fixture.store.fail_writes(down);
                None
            }
        };
        let after = fixture.manager.cart();

        // P1
        assert_unique(&after)?;

        let Some((id, outcome)) = outcome else {
            prop_assert_eq!(&after, &before);
            continue;
        };
        let id = ProductId::new(id);

        match outcome {
            Outcome::Committed => {
                // P4
                let persisted = fixture.persisted();
                prop_assert_eq!(persisted.as_ref(), Some(&after));

                // P2: the line just validated sits within the stock it saw
                if let Some(item) = after.get(id) {
                    let stock = fixture.catalog.stock_of(id);
                    if stock.is_some() {
                        prop_assert!(Some(item.amount.get()) <= stock);
                    }
                }
            }
            // P3, P5
            Outcome::Aborted(_) | Outcome::Ignored => prop_assert_eq!(&after, &before),
        }
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cart_invariants_hold(
        stock in proptest::collection::vec(0..6u32, 4),
        ops in proptest::collection::vec(op(), 1..40),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run_sequence(stock, ops))?;
    }

    #[test]
    fn prop_non_positive_update_never_changes_cart(
        amounts in proptest::collection::vec(i64::MIN..=0, 1..10),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let fixture = Fixture::new(FakeCatalog::with_stock(&[(1, 5)]), &Cart::new()).await;
            fixture.manager.add_product(ProductId::new(1)).await;
            let before = fixture.manager.cart();

            for amount in amounts {
                let outcome = fixture
                    .manager
                    .update_product_amount(ProductId::new(1), amount)
                    .await;
                prop_assert!(matches!(outcome, Outcome::Ignored));
            }

            prop_assert_eq!(fixture.manager.cart(), before);
            prop_assert!(fixture.notifier.notices().is_empty());
            Ok(())
        })?;
    }
}
