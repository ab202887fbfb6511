//! Integration tests for the ledger, commission registry and settlement
//! snapshot using in-memory SurrealDB.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use showdesk_core::context::{Actor, TenantContext};
use showdesk_core::error::ShowdeskError;
use showdesk_core::models::capability::Role;
use showdesk_core::models::commission::{CommissionBasis, CreateCommission};
use showdesk_core::models::show::{ClientType, CreateShow, NegotiationType, Show, ShowStatus};
use showdesk_core::models::transaction::{
    Correction, NewTransaction, TransactionCategory, TransactionType,
};
use showdesk_core::repository::{
    CommissionRepository, LedgerRepository, SettlementReader, ShowRepository,
};
use showdesk_db::repository::{
    SurrealCommissionRepository, SurrealLedgerRepository, SurrealSettlementReader,
    SurrealShowRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    showdesk_db::run_migrations(&db).await.unwrap();
    db
}

struct Repos {
    shows: SurrealShowRepository<Db>,
    ledger: SurrealLedgerRepository<Db>,
    commissions: SurrealCommissionRepository<Db>,
    settlement: SurrealSettlementReader<Db>,
}

async fn repos() -> Repos {
    let db = setup().await;
    Repos {
        shows: SurrealShowRepository::new(db.clone()),
        ledger: SurrealLedgerRepository::new(db.clone()),
        commissions: SurrealCommissionRepository::new(db.clone()),
        settlement: SurrealSettlementReader::new(db),
    }
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

async fn new_show(repos: &Repos, ctx: &TenantContext) -> Show {
    repos
        .shows
        .create(
            ctx,
            CreateShow {
                artist_id: Uuid::new_v4(),
                contractor_id: None,
                venue_id: None,
                client_type: ClientType::Private,
                negotiation_type: NegotiationType::FeePlusAirfare,
                show_date: NaiveDate::from_ymd_opt(2026, 8, 14).unwrap(),
                city: "Fortaleza".into(),
                uf: "CE".into(),
                face_value: dec!(50000.00),
                real_cache: dec!(50000.00),
                production_kickback: Decimal::ZERO,
                tax_percentage: dec!(6.00),
                notes: None,
            },
        )
        .await
        .unwrap()
}

async fn advance(repos: &Repos, ctx: &TenantContext, show: Show, target: ShowStatus) -> Show {
    let next = if target == ShowStatus::Signed {
        show.lifecycle.validate_contract(ctx.user_id(), Utc::now())
    } else {
        show.lifecycle.advance(target)
    }
    .unwrap();
    repos
        .shows
        .transition(ctx, show.id, show.version, next)
        .await
        .unwrap()
        .unwrap()
}

async fn close_road(repos: &Repos, ctx: &TenantContext, show: Show) -> Show {
    let show = advance(repos, ctx, show, ShowStatus::Signed).await;
    let show = advance(repos, ctx, show, ShowStatus::PreProduction).await;
    let show = advance(repos, ctx, show, ShowStatus::OnTheRoad).await;
    let next = show.lifecycle.close_road(Utc::now()).unwrap();
    repos
        .shows
        .transition(ctx, show.id, show.version, next)
        .await
        .unwrap()
        .unwrap()
}

fn cost(show_id: Uuid, tx_type: TransactionType, realized: Decimal) -> NewTransaction {
    NewTransaction {
        show_id,
        transaction_type: tx_type,
        category: TransactionCategory::Flight,
        description: Some("GRU-FOR".into()),
        budgeted_amount: dec!(1000.00),
        realized_amount: realized,
    }
}

// -----------------------------------------------------------------------
// Ledger
// -----------------------------------------------------------------------

#[tokio::test]
async fn cost_entries_locked_until_contract_validated() {
    let repos = repos().await;
    let ctx = tenant_ctx();
    let show = new_show(&repos, &ctx).await;

    for tx_type in [
        TransactionType::ProductionCost,
        TransactionType::LogisticsCost,
        TransactionType::ExtraExpense,
    ] {
        let err = repos
            .ledger
            .append(&ctx, cost(show.id, tx_type, dec!(900.00)))
            .await
            .unwrap_err();
        assert!(matches!(err, ShowdeskError::ContractNotSigned), "{tx_type:?}");
    }

    let show = advance(&repos, &ctx, show, ShowStatus::ContractPending).await;
    let err = repos
        .ledger
        .append(&ctx, cost(show.id, TransactionType::LogisticsCost, dec!(900.00)))
        .await
        .unwrap_err();
    assert!(matches!(err, ShowdeskError::ContractNotSigned));
    assert_eq!(repos.ledger.count_by_show(&ctx, show.id).await.unwrap(), 0);

    let show = advance(&repos, &ctx, show, ShowStatus::Signed).await;
    let entry = repos
        .ledger
        .append(&ctx, cost(show.id, TransactionType::LogisticsCost, dec!(1100.00)))
        .await
        .unwrap();
    assert_eq!(entry.tenant_id, ctx.tenant_id());
    assert_eq!(entry.created_by, ctx.user_id());
    assert!(entry.budget_overflow());
}

#[tokio::test]
async fn non_cost_entries_allowed_before_contract() {
    let repos = repos().await;
    let ctx = tenant_ctx();
    let show = new_show(&repos, &ctx).await;

    let entry = repos
        .ledger
        .append(&ctx, cost(show.id, TransactionType::Revenue, dec!(50000.00)))
        .await
        .unwrap();
    assert_eq!(entry.transaction_type, TransactionType::Revenue);
}

#[tokio::test]
async fn append_to_foreign_show_is_not_found() {
    let repos = repos().await;
    let owner = tenant_ctx();
    let intruder = tenant_ctx();
    let show = new_show(&repos, &owner).await;
    let show = advance(&repos, &owner, show, ShowStatus::Signed).await;

    let err = repos
        .ledger
        .append(&intruder, cost(show.id, TransactionType::ProductionCost, dec!(1.00)))
        .await
        .unwrap_err();
    assert!(matches!(err, ShowdeskError::NotFound { .. }));

    let err = repos
        .commissions
        .append(
            &intruder,
            CreateCommission {
                show_id: show.id,
                beneficiary_name: "Intruder".into(),
                beneficiary_user_id: None,
                basis: CommissionBasis::Gross,
                percentage: dec!(50.00),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShowdeskError::NotFound { .. }));
}

#[tokio::test]
async fn list_keeps_insertion_order_and_isolation() {
    let repos = repos().await;
    let ctx = tenant_ctx();
    let show = new_show(&repos, &ctx).await;
    let show = advance(&repos, &ctx, show, ShowStatus::Signed).await;

    let mut ids = Vec::new();
    for amount in [dec!(100.00), dec!(200.00), dec!(300.00)] {
        let entry = repos
            .ledger
            .append(&ctx, cost(show.id, TransactionType::ProductionCost, amount))
            .await
            .unwrap();
        ids.push(entry.id);
    }

    let listed = repos.ledger.list_by_show(&ctx, show.id).await.unwrap();
    assert_eq!(listed.iter().map(|e| e.id).collect::<Vec<_>>(), ids);
    assert_eq!(repos.ledger.count_by_show(&ctx, show.id).await.unwrap(), 3);

    let other = tenant_ctx();
    assert!(repos.ledger.list_by_show(&other, show.id).await.unwrap().is_empty());
    assert!(matches!(
        repos.ledger.get(&other, ids[0]).await.unwrap_err(),
        ShowdeskError::NotFound { .. }
    ));
}

#[tokio::test]
async fn correction_replaces_realized_and_description() {
    let repos = repos().await;
    let ctx = tenant_ctx();
    let show = new_show(&repos, &ctx).await;
    let show = advance(&repos, &ctx, show, ShowStatus::Signed).await;
    let entry = repos
        .ledger
        .append(&ctx, cost(show.id, TransactionType::LogisticsCost, dec!(800.00)))
        .await
        .unwrap();

    let corrected = repos
        .ledger
        .correct(
            &ctx,
            entry.id,
            Correction {
                realized_amount: Some(dec!(950.50)),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(corrected.realized_amount, dec!(950.50));
    assert_eq!(corrected.description.as_deref(), Some("GRU-FOR"));
    assert_eq!(corrected.budgeted_amount, dec!(1000.00));

    let err = repos
        .ledger
        .correct(
            &tenant_ctx(),
            entry.id,
            Correction {
                realized_amount: Some(dec!(1.00)),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShowdeskError::NotFound { .. }));
    let unchanged = repos.ledger.get(&ctx, entry.id).await.unwrap();
    assert_eq!(unchanged.realized_amount, dec!(950.50));
}

#[tokio::test]
async fn delete_gated_by_road_close() {
    let repos = repos().await;
    let ctx = tenant_ctx();
    let show = new_show(&repos, &ctx).await;
    let show = advance(&repos, &ctx, show, ShowStatus::Signed).await;

    let first = repos
        .ledger
        .append(&ctx, cost(show.id, TransactionType::ProductionCost, dec!(10.00)))
        .await
        .unwrap();
    let second = repos
        .ledger
        .append(&ctx, cost(show.id, TransactionType::ProductionCost, dec!(20.00)))
        .await
        .unwrap();

    repos.ledger.delete(&ctx, first.id).await.unwrap();
    assert_eq!(repos.ledger.count_by_show(&ctx, show.id).await.unwrap(), 1);

    let err = repos.ledger.delete(&ctx, first.id).await.unwrap_err();
    assert!(matches!(err, ShowdeskError::NotFound { .. }));

    let show = repos.shows.get(&ctx, show.id).await.unwrap();
    let show = advance(&repos, &ctx, show, ShowStatus::PreProduction).await;
    let show = advance(&repos, &ctx, show, ShowStatus::OnTheRoad).await;
    let next = show.lifecycle.close_road(Utc::now()).unwrap();
    repos
        .shows
        .transition(&ctx, show.id, show.version, next)
        .await
        .unwrap()
        .unwrap();

    let err = repos.ledger.delete(&ctx, second.id).await.unwrap_err();
    assert!(matches!(err, ShowdeskError::InvalidState { .. }));
}

// -----------------------------------------------------------------------
// Commissions
// -----------------------------------------------------------------------

#[tokio::test]
async fn commissions_append_list_delete() {
    let repos = repos().await;
    let ctx = tenant_ctx();
    let show = new_show(&repos, &ctx).await;

    let booker = repos
        .commissions
        .append(
            &ctx,
            CreateCommission {
                show_id: show.id,
                beneficiary_name: "Booker".into(),
                beneficiary_user_id: Some(ctx.user_id()),
                basis: CommissionBasis::Gross,
                percentage: dec!(5.00),
            },
        )
        .await
        .unwrap();
    repos
        .commissions
        .append(
            &ctx,
            CreateCommission {
                show_id: show.id,
                beneficiary_name: "Partner".into(),
                beneficiary_user_id: None,
                basis: CommissionBasis::Net,
                percentage: dec!(15.00),
            },
        )
        .await
        .unwrap();

    let listed = repos.commissions.list_by_show(&ctx, show.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, booker.id);
    assert_eq!(listed[0].beneficiary_user_id, Some(ctx.user_id()));
    assert_eq!(listed[1].basis, CommissionBasis::Net);

    let err = repos
        .commissions
        .delete(&tenant_ctx(), booker.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ShowdeskError::NotFound { .. }));

    repos.commissions.delete(&ctx, booker.id).await.unwrap();
    assert_eq!(
        repos.commissions.list_by_show(&ctx, show.id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn commission_delete_rejected_after_road_close() {
    let repos = repos().await;
    let ctx = tenant_ctx();
    let show = new_show(&repos, &ctx).await;
    let commission = repos
        .commissions
        .append(
            &ctx,
            CreateCommission {
                show_id: show.id,
                beneficiary_name: "Office".into(),
                beneficiary_user_id: None,
                basis: CommissionBasis::Net,
                percentage: dec!(10.00),
            },
        )
        .await
        .unwrap();

    close_road(&repos, &ctx, show).await;

    let err = repos.commissions.delete(&ctx, commission.id).await.unwrap_err();
    assert!(matches!(err, ShowdeskError::InvalidState { .. }));
}

// -----------------------------------------------------------------------
// Settlement snapshot
// -----------------------------------------------------------------------

#[tokio::test]
async fn snapshot_reads_show_ledger_and_commissions() {
    let repos = repos().await;
    let ctx = tenant_ctx();
    let show = new_show(&repos, &ctx).await;
    let show = advance(&repos, &ctx, show, ShowStatus::Signed).await;

    repos
        .ledger
        .append(&ctx, cost(show.id, TransactionType::ProductionCost, dec!(700.00)))
        .await
        .unwrap();
    repos
        .commissions
        .append(
            &ctx,
            CreateCommission {
                show_id: show.id,
                beneficiary_name: "Booker".into(),
                beneficiary_user_id: None,
                basis: CommissionBasis::Gross,
                percentage: dec!(5.00),
            },
        )
        .await
        .unwrap();

    // Rows of another show must not leak into the snapshot.
    let other = new_show(&repos, &ctx).await;
    repos
        .ledger
        .append(&ctx, cost(other.id, TransactionType::Revenue, dec!(1.00)))
        .await
        .unwrap();

    let snapshot = repos.settlement.snapshot(&ctx, show.id).await.unwrap();
    assert_eq!(snapshot.show.id, show.id);
    assert_eq!(snapshot.show.status(), ShowStatus::Signed);
    assert_eq!(snapshot.transactions.len(), 1);
    assert_eq!(snapshot.commissions.len(), 1);

    let err = repos
        .settlement
        .snapshot(&tenant_ctx(), show.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ShowdeskError::NotFound { .. }));
}
