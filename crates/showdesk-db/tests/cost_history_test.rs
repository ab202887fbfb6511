//! Integration tests for reference costs and the cost history aggregates.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use showdesk_core::context::{Actor, TenantContext};
use showdesk_core::models::capability::Role;
use showdesk_core::models::city_cost::{CityCostFilter, CreateCityBaseCost};
use showdesk_core::models::show::{ClientType, CreateShow, NegotiationType, Show};
use showdesk_core::models::transaction::{NewTransaction, TransactionCategory, TransactionType};
use showdesk_core::repository::{
    CityCostRepository, DateWindow, HistoricalCostReader, LedgerRepository, Pagination,
    ShowRepository,
};
use showdesk_db::repository::{
    SurrealCityCostRepository, SurrealCostHistory, SurrealLedgerRepository,
    SurrealShowRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    showdesk_db::run_migrations(&db).await.unwrap();
    db
}

fn tenant_ctx() -> TenantContext {
    TenantContext::new(
        Uuid::new_v4(),
        Actor {
            user_id: Uuid::new_v4(),
            role: Role::Administrator,
        },
    )
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn window() -> DateWindow {
    DateWindow::trailing(date(2026, 6, 30), 365)
}

async fn signed_show(
    shows: &SurrealShowRepository<Db>,
    ctx: &TenantContext,
    city: &str,
    show_date: NaiveDate,
) -> Show {
    let show = shows
        .create(
            ctx,
            CreateShow {
                artist_id: Uuid::new_v4(),
                contractor_id: None,
                venue_id: None,
                client_type: ClientType::Private,
                negotiation_type: NegotiationType::FeePlusExpenses,
                show_date,
                city: city.into(),
                uf: "BA".into(),
                face_value: dec!(30000.00),
                real_cache: dec!(30000.00),
                production_kickback: Decimal::ZERO,
                tax_percentage: dec!(0.00),
                notes: None,
            },
        )
        .await
        .unwrap();
    let next = show
        .lifecycle
        .validate_contract(ctx.user_id(), Utc::now())
        .unwrap();
    shows
        .transition(ctx, show.id, show.version, next)
        .await
        .unwrap()
        .unwrap()
}

async fn spend(
    ledger: &SurrealLedgerRepository<Db>,
    ctx: &TenantContext,
    show_id: Uuid,
    category: TransactionCategory,
    realized: Decimal,
) {
    ledger
        .append(
            ctx,
            NewTransaction {
                show_id,
                transaction_type: TransactionType::LogisticsCost,
                category,
                description: None,
                budgeted_amount: realized,
                realized_amount: realized,
            },
        )
        .await
        .unwrap();
}

fn reference(city: &str, category: TransactionCategory, amount: Decimal, on: NaiveDate) -> CreateCityBaseCost {
    CreateCityBaseCost {
        city: city.into(),
        uf: "BA".into(),
        category,
        amount,
        reference_date: on,
    }
    .validated()
    .unwrap()
}

#[tokio::test]
async fn realized_average_uses_positive_entries_in_window() {
    let db = setup().await;
    let shows = SurrealShowRepository::new(db.clone());
    let ledger = SurrealLedgerRepository::new(db.clone());
    let history = SurrealCostHistory::new(db);
    let ctx = tenant_ctx();

    let recent = signed_show(&shows, &ctx, "Salvador", date(2026, 3, 10)).await;
    let older = signed_show(&shows, &ctx, "Salvador", date(2025, 9, 2)).await;
    let stale = signed_show(&shows, &ctx, "Salvador", date(2024, 1, 5)).await;

    spend(&ledger, &ctx, recent.id, TransactionCategory::Flight, dec!(1000.00)).await;
    spend(&ledger, &ctx, older.id, TransactionCategory::Flight, dec!(1500.00)).await;
    // Zero realized amounts are budgets that never happened.
    spend(&ledger, &ctx, older.id, TransactionCategory::Flight, dec!(0.00)).await;
    spend(&ledger, &ctx, stale.id, TransactionCategory::Flight, dec!(9000.00)).await;
    spend(&ledger, &ctx, recent.id, TransactionCategory::Hotel, dec!(400.00)).await;

    let flight = history
        .realized_average(&ctx, "salvador", "ba", TransactionCategory::Flight, window())
        .await
        .unwrap();
    assert_eq!(flight, Some(dec!(1250.00)));

    let hotel = history
        .realized_average(&ctx, "Salvador", "BA", TransactionCategory::Hotel, window())
        .await
        .unwrap();
    assert_eq!(hotel, Some(dec!(400.00)));

    let elsewhere = history
        .realized_average(&ctx, "Ilhéus", "BA", TransactionCategory::Flight, window())
        .await
        .unwrap();
    assert_eq!(elsewhere, None);

    let other_tenant = history
        .realized_average(&tenant_ctx(), "Salvador", "BA", TransactionCategory::Flight, window())
        .await
        .unwrap();
    assert_eq!(other_tenant, None);
}

#[tokio::test]
async fn reference_average_respects_window_and_category() {
    let db = setup().await;
    let costs = SurrealCityCostRepository::new(db.clone());
    let history = SurrealCostHistory::new(db);
    let ctx = tenant_ctx();

    for (category, amount, on) in [
        (TransactionCategory::Hotel, dec!(300.00), date(2026, 1, 15)),
        (TransactionCategory::Hotel, dec!(420.00), date(2025, 11, 1)),
        (TransactionCategory::Hotel, dec!(999.00), date(2024, 6, 1)),
        (TransactionCategory::Flight, dec!(1800.00), date(2026, 2, 1)),
    ] {
        costs
            .create(&ctx, reference("Salvador", category, amount, on))
            .await
            .unwrap();
    }

    let hotel = history
        .reference_average(&ctx, "SALVADOR", "BA", TransactionCategory::Hotel, window())
        .await
        .unwrap();
    assert_eq!(hotel, Some(dec!(360.00)));

    let catering = history
        .reference_average(&ctx, "Salvador", "BA", TransactionCategory::Catering, window())
        .await
        .unwrap();
    assert_eq!(catering, None);
}

#[tokio::test]
async fn reference_costs_list_filter_and_delete() {
    let db = setup().await;
    let costs = SurrealCityCostRepository::new(db);
    let ctx = tenant_ctx();

    let hotel = costs
        .create(
            &ctx,
            reference("Salvador", TransactionCategory::Hotel, dec!(310.00), date(2026, 1, 1)),
        )
        .await
        .unwrap();
    costs
        .create(
            &ctx,
            reference("Salvador", TransactionCategory::Flight, dec!(1400.00), date(2026, 1, 1)),
        )
        .await
        .unwrap();
    assert_eq!(hotel.uf, "BA");
    assert_eq!(hotel.reference_date, date(2026, 1, 1));

    let hotels = costs
        .list(
            &ctx,
            CityCostFilter {
                city: Some("Salvador".into()),
                uf: Some("ba".into()),
                category: Some(TransactionCategory::Hotel),
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(hotels.total, 1);
    assert_eq!(hotels.items[0].id, hotel.id);

    let foreign = costs
        .list(&tenant_ctx(), CityCostFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(foreign.total, 0);

    assert!(costs.delete(&tenant_ctx(), hotel.id).await.is_err());
    costs.delete(&ctx, hotel.id).await.unwrap();
    let remaining = costs
        .list(&ctx, CityCostFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(remaining.total, 1);
}
