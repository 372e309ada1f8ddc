use anyhow::Result;
use console::{Key, Term};
use tokio::sync::mpsc;

use super::ui;
use crate::core::RateProvider;
use crate::core::form::{ConversionForm, FormEvent, FormState};

/// Run the interactive converter: edits debounce into proxy requests and
/// the quote updates in place as you type.
pub async fn run(provider: &dyn RateProvider, mut form: ConversionForm) -> Result<()> {
    let term = Term::stdout();
    let (tx, mut rx) = mpsc::channel(32);

    let reader = term.clone();
    tokio::task::spawn_blocking(move || {
        loop {
            let event = match reader.read_key() {
                Ok(Key::Char('q')) | Ok(Key::Escape) => FormEvent::Quit,
                Ok(Key::Char(c)) => FormEvent::Input(c),
                Ok(Key::Backspace) => FormEvent::Backspace,
                Ok(Key::ArrowUp) => FormEvent::PrevFrom,
                Ok(Key::ArrowDown) => FormEvent::NextFrom,
                Ok(Key::ArrowLeft) => FormEvent::PrevTo,
                Ok(Key::ArrowRight) => FormEvent::NextTo,
                Ok(_) => continue,
                // Without a terminal there is nothing to read interactively.
                Err(_) => FormEvent::Quit,
            };
            let quit = event == FormEvent::Quit;
            if tx.blocking_send(event).is_err() || quit {
                break;
            }
        }
    });

    let _ = term.hide_cursor();
    form.run(provider, &mut rx, |form| {
        let _ = term.clear_screen();
        let _ = term.write_str(&render(form));
    })
    .await;
    let _ = term.clear_screen();
    let _ = term.show_cursor();
    Ok(())
}

fn render(form: &ConversionForm) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        ui::style_text("Currency Exchanger", ui::StyleType::Title)
    ));

    let amount = if form.amount().is_empty() {
        ui::style_text("Enter amount", ui::StyleType::Subtle)
    } else {
        form.amount().to_string()
    };
    out.push_str(&format!("{}{amount}\n", field_label("Amount")));
    out.push_str(&format!(
        "{}{}{}\n",
        field_label("From"),
        form.from(),
        currency_label(form, form.from())
    ));
    out.push_str(&format!(
        "{}{}{}\n\n",
        field_label("To"),
        form.to(),
        currency_label(form, form.to())
    ));

    match form.state() {
        FormState::Idle => {}
        FormState::Loading => {
            out.push_str(&format!(
                "  {}\n",
                ui::style_text("Converting...", ui::StyleType::Subtle)
            ));
        }
        FormState::Error(message) => {
            out.push_str(&format!(
                "  {}\n",
                ui::style_text(message, ui::StyleType::Error)
            ));
        }
        FormState::Result(quote) => {
            out.push_str(&format!(
                "  {} {}\n",
                ui::style_text(&format!("{:.2}", quote.amount), ui::StyleType::Value),
                form.to()
            ));
        }
    }

    out.push_str(&format!(
        "\n{}\n",
        ui::style_text(
            "  Type to edit the amount | Up/Down source | Left/Right target | q quits",
            ui::StyleType::Subtle
        )
    ));
    out
}

fn field_label(label: &str) -> String {
    format!("  {}", ui::style_text(&format!("{label:<8}"), ui::StyleType::Label))
}

fn currency_label(form: &ConversionForm, code: &str) -> String {
    match form.currencies().get(code) {
        Some(label) => format!("  {}", ui::style_text(label, ui::StyleType::Subtle)),
        None => String::new(),
    }
}
