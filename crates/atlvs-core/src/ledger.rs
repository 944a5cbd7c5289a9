//! # Ledger Module
//!
//! Builds the ledger lines posted alongside acquisitions, period runs,
//! disposals and revenue recognitions. Nothing here touches storage; the
//! record store persists these values in the same transaction as the
//! business record they describe.
//!
//! ## Lines Posted
//! ```text
//! acquisition        asset        debit  cost
//! period run         expense      debit  total depreciation (one summary line)
//! disposal           contra_asset debit  accumulated depreciation   (if > 0)
//!                    asset        debit  proceeds                   (if > 0)
//!                    asset        credit cost
//!                    revenue      credit gain    / expense debit loss (if != 0)
//! recognition        revenue      debit  amount
//! ```

use chrono::{DateTime, Utc};

use crate::depreciation::PeriodDepreciationPlan;
use crate::money::Money;
use crate::types::{AccountType, FixedAsset, ReferenceType};

/// A ledger line that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub entry_date: DateTime<Utc>,
    pub description: String,
    pub debit: Money,
    pub credit: Money,
    pub account_type: AccountType,
    pub reference_type: ReferenceType,
    pub reference_id: Option<String>,
}

impl NewLedgerEntry {
    fn debit(
        entry_date: DateTime<Utc>,
        description: String,
        amount: Money,
        account_type: AccountType,
        reference_type: ReferenceType,
        reference_id: Option<String>,
    ) -> Self {
        NewLedgerEntry {
            entry_date,
            description,
            debit: amount,
            credit: Money::zero(),
            account_type,
            reference_type,
            reference_id,
        }
    }

    fn credit(
        entry_date: DateTime<Utc>,
        description: String,
        amount: Money,
        account_type: AccountType,
        reference_type: ReferenceType,
        reference_id: Option<String>,
    ) -> Self {
        NewLedgerEntry {
            entry_date,
            description,
            debit: Money::zero(),
            credit: amount,
            account_type,
            reference_type,
            reference_id,
        }
    }
}

/// Asset debit for the acquisition cost.
pub fn acquisition_entry(asset: &FixedAsset) -> NewLedgerEntry {
    NewLedgerEntry::debit(
        asset.acquisition_date,
        format!("Asset acquisition: {}", asset.name),
        asset.acquisition_cost,
        AccountType::Asset,
        ReferenceType::FixedAsset,
        Some(asset.id.clone()),
    )
}

/// One expense line for the whole run, dated at the period end.
///
/// `None` when the run charges nothing.
pub fn period_depreciation_entry(plan: &PeriodDepreciationPlan) -> Option<NewLedgerEntry> {
    if !plan.total_depreciation.is_positive() {
        return None;
    }
    Some(NewLedgerEntry::debit(
        crate::dates::start_of_day(plan.period_end),
        format!("Depreciation expense for period {}", plan.period),
        plan.total_depreciation,
        AccountType::Expense,
        ReferenceType::Depreciation,
        None,
    ))
}

/// Lines removing a disposed asset from the books.
pub fn disposal_entries(
    asset: &FixedAsset,
    disposal_id: &str,
    disposal_date: DateTime<Utc>,
    accumulated: Money,
    proceeds: Money,
    gain_loss: Money,
) -> Vec<NewLedgerEntry> {
    let reference = || Some(disposal_id.to_string());
    let mut lines = Vec::with_capacity(4);

    if accumulated.is_positive() {
        lines.push(NewLedgerEntry::debit(
            disposal_date,
            format!("Accumulated depreciation reversal: {}", asset.name),
            accumulated,
            AccountType::ContraAsset,
            ReferenceType::Disposal,
            reference(),
        ));
    }

    if proceeds.is_positive() {
        lines.push(NewLedgerEntry::debit(
            disposal_date,
            format!("Disposal proceeds: {}", asset.name),
            proceeds,
            AccountType::Asset,
            ReferenceType::Disposal,
            reference(),
        ));
    }

    lines.push(NewLedgerEntry::credit(
        disposal_date,
        format!("Asset disposal: {}", asset.name),
        asset.acquisition_cost,
        AccountType::Asset,
        ReferenceType::Disposal,
        reference(),
    ));

    if gain_loss.is_positive() {
        lines.push(NewLedgerEntry::credit(
            disposal_date,
            format!("Gain on disposal: {}", asset.name),
            gain_loss,
            AccountType::Revenue,
            ReferenceType::Disposal,
            reference(),
        ));
    } else if gain_loss.is_negative() {
        lines.push(NewLedgerEntry::debit(
            disposal_date,
            format!("Loss on disposal: {}", asset.name),
            gain_loss.abs(),
            AccountType::Expense,
            ReferenceType::Disposal,
            reference(),
        ));
    }

    lines
}

/// Revenue line for a recognition event.
pub fn recognition_entry(
    recognition_id: &str,
    amount: Money,
    recognition_date: DateTime<Utc>,
    notes: Option<&str>,
) -> NewLedgerEntry {
    let description = match notes {
        Some(notes) if !notes.trim().is_empty() => format!("Revenue recognition: {}", notes),
        _ => "Revenue recognition".to_string(),
    };
    NewLedgerEntry::debit(
        recognition_date,
        description,
        amount,
        AccountType::Revenue,
        ReferenceType::RevenueRecognition,
        Some(recognition_id.to_string()),
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
