//! DRE (profit waterfall) engine.
//!
//! [`compute_dre`] is a pure function of a show, its ledger and its
//! commissions. Nothing is cached or persisted: callers recompute on every
//! read. Every intermediate value is rounded to two decimal places before
//! it feeds the next step, so the same inputs always produce the same
//! digits.

use rust_decimal::Decimal;
use serde::Serialize;
use showdesk_core::lifecycle::Consolidation;
use showdesk_core::models::commission::{Commission, CommissionBasis};
use showdesk_core::models::show::Show;
use showdesk_core::models::transaction::{FinancialTransaction, TransactionType};
use showdesk_core::money::{checked_total, percent_of, ratio_percent, round_money};
use uuid::Uuid;

use crate::error::FinanceError;

/// One commission's computed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommissionLine {
    pub commission_id: Uuid,
    pub beneficiary_name: String,
    pub beneficiary_user_id: Option<Uuid>,
    pub basis: CommissionBasis,
    pub percentage: Decimal,
    pub value: Decimal,
}

/// The full waterfall for one show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DreResult {
    pub show_id: Uuid,
    pub face_value: Decimal,
    pub gross_revenue: Decimal,
    pub tax_percentage: Decimal,
    pub tax: Decimal,
    /// Public-sector kickback passed through to the contractor.
    pub pass_through: Decimal,
    pub production_costs: Decimal,
    pub logistics_costs: Decimal,
    pub extra_expense_costs: Decimal,
    pub total_costs: Decimal,
    pub gross_commissions: Decimal,
    pub gross_commission_lines: Vec<CommissionLine>,
    pub net_profit: Decimal,
    pub net_commissions: Decimal,
    pub net_commission_lines: Vec<CommissionLine>,
    pub final_result: Decimal,
    pub margin_percent: Decimal,
    pub is_consolidated: bool,
    pub consolidation: Consolidation,
}

/// Run the waterfall.
///
/// Transactions and commissions belonging to other shows are ignored.
/// Fails with [`FinanceError::Overflow`] when an intermediate value leaves
/// the representable range, which validated inputs never reach.
pub fn compute_dre(
    show: &Show,
    transactions: &[FinancialTransaction],
    commissions: &[Commission],
) -> Result<DreResult, FinanceError> {
    let gross_revenue = round_money(show.real_cache);
    let tax = percent_of(gross_revenue, show.tax_percentage).ok_or(FinanceError::Overflow("tax"))?;
    let pass_through = round_money(show.production_kickback);

    let realized_of = |tx_type: TransactionType, label: &'static str| {
        checked_sum(
            transactions
                .iter()
                .filter(|tx| tx.show_id == show.id && tx.transaction_type == tx_type)
                .map(|tx| tx.realized_amount),
            label,
        )
    };
    let production_costs = realized_of(TransactionType::ProductionCost, "production costs")?;
    let logistics_costs = realized_of(TransactionType::LogisticsCost, "logistics costs")?;
    let extra_expense_costs = realized_of(TransactionType::ExtraExpense, "extra expenses")?;
    let total_costs = checked_sum(
        [production_costs, logistics_costs, extra_expense_costs],
        "total costs",
    )?;

    let own_commissions = commissions.iter().filter(|c| c.show_id == show.id);

    let gross_commission_lines = own_commissions
        .clone()
        .filter(|c| c.basis == CommissionBasis::Gross)
        .map(|c| {
            percent_of(gross_revenue, c.percentage)
                .map(|value| line(c, value))
                .ok_or(FinanceError::Overflow("gross commission"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let gross_commissions = checked_sum(
        gross_commission_lines.iter().map(|l| l.value),
        "gross commissions",
    )?;

    let net_profit = [tax, pass_through, total_costs, gross_commissions]
        .into_iter()
        .try_fold(gross_revenue, |acc, deduction| acc.checked_sub(deduction))
        .ok_or(FinanceError::Overflow("net profit"))?;

    // A loss never produces a negative payable.
    let net_commission_lines = own_commissions
        .filter(|c| c.basis == CommissionBasis::Net)
        .map(|c| {
            percent_of(net_profit, c.percentage)
                .map(|value| line(c, value.max(Decimal::ZERO)))
                .ok_or(FinanceError::Overflow("net commission"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let net_commissions = checked_sum(
        net_commission_lines.iter().map(|l| l.value),
        "net commissions",
    )?;

    let final_result = net_profit
        .checked_sub(net_commissions)
        .ok_or(FinanceError::Overflow("final result"))?;
    let margin_percent = ratio_percent(final_result, gross_revenue)
        .ok_or(FinanceError::Overflow("margin"))?;

    Ok(DreResult {
        show_id: show.id,
        face_value: round_money(show.face_value),
        gross_revenue,
        tax_percentage: round_money(show.tax_percentage),
        tax,
        pass_through,
        production_costs,
        logistics_costs,
        extra_expense_costs,
        total_costs,
        gross_commissions,
        gross_commission_lines,
        net_profit: round_money(net_profit),
        net_commissions,
        net_commission_lines,
        final_result: round_money(final_result),
        margin_percent,
        is_consolidated: show.lifecycle.is_consolidated(),
        consolidation: show.lifecycle.consolidation(),
    })
}

fn line(commission: &Commission, value: Decimal) -> CommissionLine {
    CommissionLine {
        commission_id: commission.id,
        beneficiary_name: commission.beneficiary_name.clone(),
        beneficiary_user_id: commission.beneficiary_user_id,
        basis: commission.basis,
        percentage: commission.percentage,
        value: round_money(value),
    }
}

fn checked_sum(
    values: impl IntoIterator<Item = Decimal>,
    label: &'static str,
) -> Result<Decimal, FinanceError> {
    checked_total(values).ok_or(FinanceError::Overflow(label))
}
