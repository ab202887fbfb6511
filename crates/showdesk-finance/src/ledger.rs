//! Ledger service: cost entry, corrections and budget views.

use rust_decimal::Decimal;
use showdesk_core::context::TenantContext;
use showdesk_core::error::ShowdeskResult;
use showdesk_core::models::capability::Capability;
use showdesk_core::models::transaction::{
    BudgetSummary, Correction, FinancialTransaction, NewTransaction, TransactionCategory,
    TransactionType,
};
use showdesk_core::repository::{LedgerRepository, ShowRepository};
use uuid::Uuid;

use crate::error::FinanceError;

/// An expense recorded on the road, outside the original budget.
#[derive(Debug, Clone)]
pub struct ExtraExpense {
    pub show_id: Uuid,
    pub category: TransactionCategory,
    pub description: Option<String>,
    pub amount: Decimal,
}

pub struct LedgerService<L: LedgerRepository, S: ShowRepository> {
    ledger: L,
    shows: S,
}

impl<L: LedgerRepository, S: ShowRepository> LedgerService<L, S> {
    pub fn new(ledger: L, shows: S) -> Self {
        Self { ledger, shows }
    }

    /// Record a production or logistics cost. Fails with
    /// `ContractNotSigned` while the show's contract phase is open.
    pub async fn append_cost(
        &self,
        ctx: &TenantContext,
        input: NewTransaction,
    ) -> ShowdeskResult<FinancialTransaction> {
        if !matches!(
            input.transaction_type,
            TransactionType::ProductionCost | TransactionType::LogisticsCost
        ) {
            return Err(FinanceError::NotACost(input.transaction_type.as_str()).into());
        }
        self.append(ctx, input).await
    }

    /// Record an on-the-road expense: budgeted zero, realized `amount`.
    pub async fn append_extra_expense(
        &self,
        ctx: &TenantContext,
        expense: ExtraExpense,
    ) -> ShowdeskResult<FinancialTransaction> {
        self.append(
            ctx,
            NewTransaction {
                show_id: expense.show_id,
                transaction_type: TransactionType::ExtraExpense,
                category: expense.category,
                description: expense.description,
                budgeted_amount: Decimal::ZERO,
                realized_amount: expense.amount,
            },
        )
        .await
    }

    /// Append any entry type. Cost types go through the contract gate,
    /// which the repository checks atomically with the insert.
    pub async fn append(
        &self,
        ctx: &TenantContext,
        input: NewTransaction,
    ) -> ShowdeskResult<FinancialTransaction> {
        let required = match input.transaction_type {
            TransactionType::ExtraExpense => Capability::AddExtraExpenses,
            _ => Capability::AddExpenses,
        };
        ctx.require(required)?;

        self.ledger.append(ctx, input.validated()?).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<FinancialTransaction> {
        ctx.require(Capability::ViewFinancials)?;
        self.ledger.get(ctx, id).await
    }

    /// Entries in insertion order. `NotFound` for a show outside the tenant.
    pub async fn list(
        &self,
        ctx: &TenantContext,
        show_id: Uuid,
    ) -> ShowdeskResult<Vec<FinancialTransaction>> {
        ctx.require(Capability::ViewFinancials)?;
        self.shows.get(ctx, show_id).await?;
        self.ledger.list_by_show(ctx, show_id).await
    }

    pub async fn count(&self, ctx: &TenantContext, show_id: Uuid) -> ShowdeskResult<u64> {
        ctx.require(Capability::ViewFinancials)?;
        self.shows.get(ctx, show_id).await?;
        self.ledger.count_by_show(ctx, show_id).await
    }

    pub async fn budget_summary(
        &self,
        ctx: &TenantContext,
        show_id: Uuid,
    ) -> ShowdeskResult<BudgetSummary> {
        let entries = self.list(ctx, show_id).await?;
        BudgetSummary::from_entries(show_id, &entries)
    }

    /// Replace the realized amount and/or description of an entry.
    pub async fn correct(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        correction: Correction,
    ) -> ShowdeskResult<FinancialTransaction> {
        ctx.require(Capability::AddExpenses)?;
        self.ledger.correct(ctx, id, correction.validated()?).await
    }

    pub async fn delete(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<()> {
        ctx.require(Capability::AddExpenses)?;
        self.ledger.delete(ctx, id).await
    }
}
