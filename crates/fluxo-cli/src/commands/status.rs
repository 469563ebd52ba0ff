//! Init and status command implementations

use std::path::Path;

use anyhow::Result;

use super::open_db;

pub fn cmd_init(db_path: &Path) -> Result<()> {
    open_db(db_path)?;
    println!("✅ Database initialized at {}", db_path.display());
    Ok(())
}

pub fn cmd_status(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    let summary = db.dashboard_summary()?;

    println!("📊 Fluxo status");
    println!("   Database: {}", db_path.display());
    println!("   Transactions: {}", summary.total_transactions);
    println!("   Income total: R$ {:.2}", summary.income_total);
    println!("   Expense total: R$ {:.2}", summary.expense_total);
    println!("   Balance: R$ {:.2}", summary.balance);

    if !summary.expenses_by_category.is_empty() {
        println!("   Expenses by category:");
        for entry in &summary.expenses_by_category {
            println!(
                "     {:<14} R$ {:>10.2} ({} transactions)",
                entry.category.as_str(),
                entry.total,
                entry.transaction_count
            );
        }
    }

    Ok(())
}
