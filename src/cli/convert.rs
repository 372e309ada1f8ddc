use anyhow::Result;

use super::ui;
use crate::core::{ConversionQuote, RateProvider};

/// Run a single conversion through the proxy and print the quote.
pub async fn run(provider: &dyn RateProvider, from: &str, to: &str, amount: f64) -> Result<()> {
    let from = from.to_uppercase();
    let to = to.to_uppercase();

    let pb = ui::new_spinner(&format!("Converting {amount} {from} to {to}..."));
    let quote = provider.convert(&from, &to, amount).await;
    pb.finish_and_clear();
    let quote = quote?;

    println!("{}", display_quote(&from, &to, amount, &quote));
    Ok(())
}

fn display_quote(from: &str, to: &str, amount: f64, quote: &ConversionQuote) -> String {
    format!(
        "{amount} {from} = {} {to}\n{}",
        ui::style_text(&format!("{:.2}", quote.amount), ui::StyleType::Value),
        ui::style_text(
            &format!("1 {from} = {:.4} {to}", quote.rate),
            ui::StyleType::Subtle
        ),
    )
}
