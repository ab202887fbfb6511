//! Financial ledger entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ShowdeskError, ShowdeskResult};
use crate::money::{checked_total, validate_amount};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Revenue,
    ProductionCost,
    LogisticsCost,
    Tax,
    Commission,
    Kickback,
    /// Expense incurred on the road, recorded by the crew.
    ExtraExpense,
}

impl TransactionType {
    pub const ALL: [TransactionType; 7] = [
        Self::Revenue,
        Self::ProductionCost,
        Self::LogisticsCost,
        Self::Tax,
        Self::Commission,
        Self::Kickback,
        Self::ExtraExpense,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "Revenue",
            Self::ProductionCost => "ProductionCost",
            Self::LogisticsCost => "LogisticsCost",
            Self::Tax => "Tax",
            Self::Commission => "Commission",
            Self::Kickback => "Kickback",
            Self::ExtraExpense => "ExtraExpense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Cost types are subject to the contract gate and feed the DRE cost
    /// subtotals.
    pub fn is_cost(&self) -> bool {
        matches!(
            self,
            Self::ProductionCost | Self::LogisticsCost | Self::ExtraExpense
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionCategory {
    CrewPayment,
    Backline,
    SoundLight,
    Stage,
    Flight,
    Bus,
    Hotel,
    VanTransfer,
    Meals,
    /// Invoice tax.
    TaxNf,
    Intermediary,
    Other,
}

impl TransactionCategory {
    pub const ALL: [TransactionCategory; 12] = [
        Self::CrewPayment,
        Self::Backline,
        Self::SoundLight,
        Self::Stage,
        Self::Flight,
        Self::Bus,
        Self::Hotel,
        Self::VanTransfer,
        Self::Meals,
        Self::TaxNf,
        Self::Intermediary,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrewPayment => "CrewPayment",
            Self::Backline => "Backline",
            Self::SoundLight => "SoundLight",
            Self::Stage => "Stage",
            Self::Flight => "Flight",
            Self::Bus => "Bus",
            Self::Hotel => "Hotel",
            Self::VanTransfer => "VanTransfer",
            Self::Meals => "Meals",
            Self::TaxNf => "TaxNf",
            Self::Intermediary => "Intermediary",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialTransaction {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub show_id: Uuid,
    pub transaction_type: TransactionType,
    pub category: TransactionCategory,
    pub description: Option<String>,
    pub budgeted_amount: Decimal,
    pub realized_amount: Decimal,
    /// Who recorded the entry.
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FinancialTransaction {
    /// Realized spend exceeded a non-zero budget. Derived, never stored.
    pub fn budget_overflow(&self) -> bool {
        self.budgeted_amount > Decimal::ZERO && self.realized_amount > self.budgeted_amount
    }
}

/// Fields required to append a ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub show_id: Uuid,
    pub transaction_type: TransactionType,
    pub category: TransactionCategory,
    pub description: Option<String>,
    pub budgeted_amount: Decimal,
    pub realized_amount: Decimal,
}

impl NewTransaction {
    pub fn validated(mut self) -> ShowdeskResult<Self> {
        self.budgeted_amount = validate_amount("budgeted_amount", self.budgeted_amount)?;
        self.realized_amount = validate_amount("realized_amount", self.realized_amount)?;
        self.description = normalize_description(self.description);
        Ok(self)
    }
}

/// A correction of an existing entry: the only mutation the ledger allows.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Correction {
    pub realized_amount: Option<Decimal>,
    pub description: Option<String>,
}

impl Correction {
    pub fn validated(mut self) -> ShowdeskResult<Self> {
        if self.realized_amount.is_none() && self.description.is_none() {
            return Err(ShowdeskError::validation("correction changes nothing"));
        }
        if let Some(amount) = self.realized_amount {
            self.realized_amount = Some(validate_amount("realized_amount", amount)?);
        }
        Ok(self)
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Budgeted against realized totals for one transaction type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeTotals {
    pub transaction_type: TransactionType,
    pub budgeted: Decimal,
    pub realized: Decimal,
    pub entries: u64,
}

/// Budget view of a show's ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub show_id: Uuid,
    /// One line per transaction type present, in [`TransactionType::ALL`] order.
    pub by_type: Vec<TypeTotals>,
    pub total_budgeted: Decimal,
    pub total_realized: Decimal,
    pub overflowing: Vec<FinancialTransaction>,
}

impl BudgetSummary {
    pub fn from_entries(show_id: Uuid, entries: &[FinancialTransaction]) -> ShowdeskResult<Self> {
        let overflow = || ShowdeskError::Internal(format!("budget totals overflow for show {show_id}"));

        let mut by_type = Vec::new();
        for tx_type in TransactionType::ALL {
            let matching: Vec<&FinancialTransaction> = entries
                .iter()
                .filter(|e| e.transaction_type == tx_type)
                .collect();
            if matching.is_empty() {
                continue;
            }
            by_type.push(TypeTotals {
                transaction_type: tx_type,
                budgeted: checked_total(matching.iter().map(|e| e.budgeted_amount))
                    .ok_or_else(overflow)?,
                realized: checked_total(matching.iter().map(|e| e.realized_amount))
                    .ok_or_else(overflow)?,
                entries: matching.len() as u64,
            });
        }

        Ok(Self {
            show_id,
            total_budgeted: checked_total(by_type.iter().map(|t| t.budgeted))
                .ok_or_else(overflow)?,
            total_realized: checked_total(by_type.iter().map(|t| t.realized))
                .ok_or_else(overflow)?,
            by_type,
            overflowing: entries
                .iter()
                .filter(|e| e.budget_overflow())
                .cloned()
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(tx_type: TransactionType, budgeted: Decimal, realized: Decimal) -> FinancialTransaction {
        FinancialTransaction {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            show_id: Uuid::nil(),
            transaction_type: tx_type,
            category: TransactionCategory::Other,
            description: None,
            budgeted_amount: budgeted,
            realized_amount: realized,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn cost_types() {
        let costs: Vec<_> = TransactionType::ALL
            .into_iter()
            .filter(TransactionType::is_cost)
            .collect();
        assert_eq!(
            costs,
            vec![
                TransactionType::ProductionCost,
                TransactionType::LogisticsCost,
                TransactionType::ExtraExpense
            ]
        );
    }

    #[test]
    fn overflow_needs_positive_budget() {
        let t = TransactionType::LogisticsCost;
        assert!(entry(t, dec!(100.00), dec!(100.01)).budget_overflow());
        assert!(!entry(t, dec!(100.00), dec!(100.00)).budget_overflow());
        assert!(!entry(t, Decimal::ZERO, dec!(500.00)).budget_overflow());
    }

    #[test]
    fn enum_names_round_trip() {
        for c in TransactionCategory::ALL {
            assert_eq!(TransactionCategory::parse(c.as_str()), Some(c));
        }
        assert_eq!(TransactionType::parse("Bogus"), None);
    }

    #[test]
    fn new_transaction_rejects_negative() {
        let input = NewTransaction {
            show_id: Uuid::new_v4(),
            transaction_type: TransactionType::ProductionCost,
            category: TransactionCategory::Stage,
            description: Some("  ".into()),
            budgeted_amount: dec!(10),
            realized_amount: dec!(-1),
        };
        assert!(input.clone().validated().is_err());

        let ok = NewTransaction {
            realized_amount: dec!(12.5),
            ..input
        }
        .validated()
        .unwrap();
        assert_eq!(ok.description, None);
        assert_eq!(ok.realized_amount.to_string(), "12.50");
    }

    #[test]
    fn empty_correction_rejected() {
        assert!(Correction::default().validated().is_err());
    }

    #[test]
    fn budget_summary_groups_by_type() {
        let entries = vec![
            entry(TransactionType::ProductionCost, dec!(1000.00), dec!(1200.00)),
            entry(TransactionType::ProductionCost, dec!(500.00), dec!(400.00)),
            entry(TransactionType::ExtraExpense, Decimal::ZERO, dec!(80.00)),
        ];
        let summary = BudgetSummary::from_entries(Uuid::nil(), &entries).unwrap();
        assert_eq!(summary.by_type.len(), 2);
        assert_eq!(summary.by_type[0].transaction_type, TransactionType::ProductionCost);
        assert_eq!(summary.by_type[0].realized, dec!(1600.00));
        assert_eq!(summary.by_type[0].entries, 2);
        assert_eq!(summary.total_budgeted, dec!(1500.00));
        assert_eq!(summary.total_realized, dec!(1680.00));
        assert_eq!(summary.overflowing.len(), 1);
    }

    #[test]
    fn budget_summary_reports_unrepresentable_totals() {
        let entries = vec![
            entry(TransactionType::LogisticsCost, Decimal::ZERO, Decimal::MAX),
            entry(TransactionType::LogisticsCost, Decimal::ZERO, dec!(1.00)),
        ];
        let err = BudgetSummary::from_entries(Uuid::nil(), &entries).unwrap_err();
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
