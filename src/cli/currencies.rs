use anyhow::Result;
use comfy_table::Cell;

use super::ui;
use crate::core::{CurrencyTable, RateProvider};

/// Fetch and print the currency table the proxy offers.
pub async fn run(provider: &dyn RateProvider) -> Result<()> {
    let pb = ui::new_spinner("Fetching currencies...");
    let currencies = provider.currencies().await;
    pb.finish_and_clear();
    let currencies = currencies?;

    println!("{}", display_as_table(&currencies));
    println!("\n{} currencies available", currencies.len());
    Ok(())
}

fn display_as_table(currencies: &CurrencyTable) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Code"), ui::header_cell("Currency")]);

    let mut entries: Vec<_> = currencies.iter().collect();
    entries.sort();
    for (code, label) in entries {
        table.add_row(vec![Cell::new(code), Cell::new(label)]);
    }

    table.to_string()
}
