//! The conversion form: amount and currency inputs plus the state the UI
//! renders for them.
//!
//! Edits do not fire a request directly. Each one restarts a debounce
//! window, and only when the window elapses is a request issued for
//! whatever the inputs say at that moment. Every edit also advances a
//! sequence number, and a response is dropped unless its number still
//! matches, so the result on screen always belongs to the current inputs.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use futures::future::OptionFuture;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, sleep};
use tracing::{debug, warn};

use crate::core::config::DEFAULT_SOURCE;
use crate::core::currency::{ConversionQuote, CurrencyTable, RateProvider};

/// The amount box never needs more room than this.
const MAX_AMOUNT_LEN: usize = 16;

type RequestFuture<'a> =
    Pin<Box<dyn Future<Output = (u64, Result<ConversionQuote>)> + Send + 'a>>;

/// What the form is showing for the current inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    /// Nothing to show, typically because the amount box is empty.
    Idle,
    /// A request for the current inputs is in flight.
    Loading,
    /// The last request failed; the message is surfaced to the user.
    Error(String),
    /// The quote for the current inputs.
    Result(ConversionQuote),
}

/// An input event fed into [`ConversionForm::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormEvent {
    Input(char),
    Backspace,
    PrevFrom,
    NextFrom,
    PrevTo,
    NextTo,
    Quit,
}

/// A conversion due to be requested, tagged with the sequence number that
/// was current when the debounce resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub seq: u64,
    pub from: String,
    pub to: String,
    pub amount: f64,
}

/// The form model. All mutation goes through the event methods so the
/// sequence number stays in step with the inputs.
#[derive(Debug)]
pub struct ConversionForm {
    amount: String,
    from: String,
    to: String,
    currencies: CurrencyTable,
    state: FormState,
    debounce: Duration,
    seq: u64,
}

impl ConversionForm {
    pub fn new(from: &str, to: &str, debounce: Duration) -> Self {
        Self {
            amount: "1".to_string(),
            from: from.to_uppercase(),
            to: to.to_uppercase(),
            currencies: CurrencyTable::new(),
            state: FormState::Idle,
            debounce,
            seq: 0,
        }
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn currencies(&self) -> &CurrencyTable {
        &self.currencies
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Install the currency table fetched from the proxy. A source currency
    /// the table does not offer falls back to [`DEFAULT_SOURCE`]. Returns
    /// whether the source changed.
    pub fn load_currencies(&mut self, table: CurrencyTable) -> bool {
        self.currencies = table;
        if self.currencies.contains_key(&self.from) {
            return false;
        }
        debug!(from = %self.from, "Source currency not offered, resetting");
        self.set_from(DEFAULT_SOURCE)
    }

    /// Append one character to the amount box. Only digits and a single
    /// decimal point are accepted; a leading point becomes `0.`.
    pub fn input_char(&mut self, c: char) -> bool {
        if self.amount.len() >= MAX_AMOUNT_LEN {
            return false;
        }
        match c {
            '0'..='9' => self.amount.push(c),
            '.' if !self.amount.contains('.') => {
                if self.amount.is_empty() {
                    self.amount.push('0');
                }
                self.amount.push('.');
            }
            _ => return false,
        }
        self.touch();
        true
    }

    /// Delete the last character of the amount box.
    pub fn backspace(&mut self) -> bool {
        if self.amount.pop().is_none() {
            return false;
        }
        self.touch();
        true
    }

    pub fn set_from(&mut self, code: &str) -> bool {
        let code = code.to_uppercase();
        if code == self.from {
            return false;
        }
        self.from = code;
        self.touch();
        true
    }

    pub fn set_to(&mut self, code: &str) -> bool {
        let code = code.to_uppercase();
        if code == self.to {
            return false;
        }
        self.to = code;
        self.touch();
        true
    }

    /// Step the source currency through the sorted table.
    pub fn cycle_from(&mut self, forward: bool) -> bool {
        match next_code(&self.currencies, &self.from, forward) {
            Some(code) => self.set_from(&code),
            None => false,
        }
    }

    /// Step the target currency through the sorted table.
    pub fn cycle_to(&mut self, forward: bool) -> bool {
        match next_code(&self.currencies, &self.to, forward) {
            Some(code) => self.set_to(&code),
            None => false,
        }
    }

    /// Resolve an elapsed debounce window: either the request matching the
    /// current inputs, or `None` when there is nothing to convert and the
    /// form drops to idle.
    pub fn begin_request(&mut self) -> Option<PendingRequest> {
        if self.amount.is_empty() {
            self.state = FormState::Idle;
            return None;
        }
        let amount: f64 = match self.amount.parse() {
            Ok(v) => v,
            Err(_) => {
                // A buffer that does not parse never fires a request.
                self.state = FormState::Idle;
                return None;
            }
        };
        self.state = FormState::Loading;
        Some(PendingRequest {
            seq: self.seq,
            from: self.from.clone(),
            to: self.to.clone(),
            amount,
        })
    }

    /// Fold a finished request back into the form. A response whose
    /// sequence number no longer matches the inputs is dropped.
    pub fn apply(&mut self, seq: u64, outcome: Result<ConversionQuote>) {
        if seq != self.seq {
            debug!(seq, latest = self.seq, "Dropping stale conversion response");
            return;
        }
        self.state = match outcome {
            Ok(quote) => FormState::Result(quote),
            Err(e) => FormState::Error(e.to_string()),
        };
    }

    // Any edit invalidates whatever request is still in flight.
    fn touch(&mut self) {
        self.seq += 1;
    }

    fn handle(&mut self, event: FormEvent) -> bool {
        match event {
            FormEvent::Input(c) => self.input_char(c),
            FormEvent::Backspace => self.backspace(),
            FormEvent::PrevFrom => self.cycle_from(false),
            FormEvent::NextFrom => self.cycle_from(true),
            FormEvent::PrevTo => self.cycle_to(false),
            FormEvent::NextTo => self.cycle_to(true),
            FormEvent::Quit => false,
        }
    }

    /// Drive the form against `provider` until the event stream quits.
    ///
    /// The currency table is loaded once up front; a failure there is
    /// logged and the selectors simply stay empty. `on_change` runs after
    /// every state change and is where the caller repaints.
    pub async fn run(
        &mut self,
        provider: &dyn RateProvider,
        events: &mut mpsc::Receiver<FormEvent>,
        mut on_change: impl FnMut(&ConversionForm),
    ) {
        on_change(self);
        match provider.currencies().await {
            Ok(table) => {
                self.load_currencies(table);
                on_change(self);
            }
            Err(e) => warn!("Currency list unavailable: {e:#}"),
        }

        let debounce = sleep(self.debounce);
        tokio::pin!(debounce);
        let mut debounce_armed = true;
        let mut in_flight: Option<RequestFuture<'_>> = None;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    None | Some(FormEvent::Quit) => break,
                    Some(event) => {
                        if self.handle(event) {
                            debounce.as_mut().reset(Instant::now() + self.debounce);
                            debounce_armed = true;
                            on_change(self);
                        }
                    }
                },
                () = &mut debounce, if debounce_armed => {
                    debounce_armed = false;
                    in_flight = self.begin_request().map(|req| -> RequestFuture<'_> {
                        Box::pin(async move {
                            (req.seq, provider.convert(&req.from, &req.to, req.amount).await)
                        })
                    });
                    on_change(self);
                },
                Some((seq, outcome)) = OptionFuture::from(in_flight.as_mut()) => {
                    in_flight = None;
                    self.apply(seq, outcome);
                    on_change(self);
                },
            }
        }
    }
}

/// Step to the neighbouring code in the sorted currency list, wrapping at
/// the ends. A code the table does not know starts from the beginning.
fn next_code(table: &CurrencyTable, current: &str, forward: bool) -> Option<String> {
    if table.is_empty() {
        return None;
    }
    let mut codes: Vec<&String> = table.keys().collect();
    codes.sort();
    let index = match (codes.iter().position(|c| *c == current), forward) {
        (Some(i), true) => (i + 1) % codes.len(),
        (Some(i), false) => (i + codes.len() - 1) % codes.len(),
        (None, _) => 0,
    };
    Some(codes[index].clone())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use super::*;

    /// A provider with a fixed rate, an optional response delay and a call
    /// log, so tests can pin down exactly which requests were sent.
    struct ScriptedRates {
        rate: f64,
        delay: Duration,
        table: CurrencyTable,
        convert_error: Option<String>,
        currencies_error: bool,
        calls: Mutex<Vec<(String, String, f64)>>,
    }

    impl ScriptedRates {
        fn new() -> Self {
            let mut table = CurrencyTable::new();
            table.insert("USD".to_string(), "United States Dollar".to_string());
            table.insert("EUR".to_string(), "Euro".to_string());
            table.insert("GBP".to_string(), "British Pound".to_string());
            Self {
                rate: 2.0,
                delay: Duration::ZERO,
                table,
                convert_error: None,
                currencies_error: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn with_convert_error(mut self, message: &str) -> Self {
            self.convert_error = Some(message.to_string());
            self
        }

        fn with_table(mut self, codes: &[&str]) -> Self {
            self.table = codes
                .iter()
                .map(|c| (c.to_string(), format!("{c} label")))
                .collect();
            self
        }

        fn calls(&self) -> Vec<(String, String, f64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RateProvider for ScriptedRates {
        async fn currencies(&self) -> Result<CurrencyTable> {
            if self.currencies_error {
                return Err(anyhow!("HTTP error: 500 Internal Server Error from rate proxy"));
            }
            Ok(self.table.clone())
        }

        async fn convert(&self, from: &str, to: &str, amount: f64) -> Result<ConversionQuote> {
            self.calls
                .lock()
                .unwrap()
                .push((from.to_string(), to.to_string(), amount));
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            if let Some(message) = &self.convert_error {
                return Err(anyhow!("{message}"));
            }
            Ok(ConversionQuote {
                amount: amount * self.rate,
                rate: self.rate,
            })
        }
    }

    fn form() -> ConversionForm {
        ConversionForm::new("USD", "EUR", Duration::from_millis(500))
    }

    #[test]
    fn test_input_char_accepts_digits_and_one_point() {
        let mut form = form();
        assert!(form.input_char('2'));
        assert!(form.input_char('.'));
        assert!(form.input_char('5'));
        assert_eq!(form.amount(), "12.5");
        assert!(!form.input_char('.'));
        assert!(!form.input_char('x'));
        assert_eq!(form.amount(), "12.5");
    }

    #[test]
    fn test_input_char_leading_point_becomes_zero_point() {
        let mut form = form();
        form.backspace();
        assert!(form.input_char('.'));
        assert_eq!(form.amount(), "0.");
        assert!(form.input_char('5'));
        assert_eq!(form.amount(), "0.5");
    }

    #[test]
    fn test_input_char_caps_length() {
        let mut form = form();
        for _ in 0..30 {
            form.input_char('9');
        }
        assert_eq!(form.amount().len(), MAX_AMOUNT_LEN);
    }

    #[test]
    fn test_backspace_on_empty_is_a_no_op() {
        let mut form = form();
        assert!(form.backspace());
        assert_eq!(form.amount(), "");
        assert!(!form.backspace());
    }

    #[test]
    fn test_begin_request_with_empty_amount_goes_idle() {
        let mut form = form();
        form.backspace();
        assert!(form.begin_request().is_none());
        assert_eq!(*form.state(), FormState::Idle);
    }

    #[test]
    fn test_begin_request_issues_current_inputs() {
        let mut form = form();
        form.input_char('0');
        let request = form.begin_request().unwrap();
        assert_eq!(request.from, "USD");
        assert_eq!(request.to, "EUR");
        assert_eq!(request.amount, 10.0);
        assert_eq!(*form.state(), FormState::Loading);
    }

    #[test]
    fn test_apply_drops_stale_sequence() {
        let mut form = form();
        let request = form.begin_request().unwrap();
        form.input_char('7');
        form.apply(
            request.seq,
            Ok(ConversionQuote {
                amount: 2.0,
                rate: 2.0,
            }),
        );
        assert_eq!(*form.state(), FormState::Loading);
    }

    #[test]
    fn test_apply_ignores_older_response_after_newer_result() {
        let mut form = form();
        let older = form.begin_request().unwrap();
        form.input_char('2');
        let newer = form.begin_request().unwrap();
        form.apply(
            newer.seq,
            Ok(ConversionQuote {
                amount: 24.0,
                rate: 2.0,
            }),
        );
        // The slower request finishes second; its quote no longer applies.
        form.apply(
            older.seq,
            Ok(ConversionQuote {
                amount: 2.0,
                rate: 2.0,
            }),
        );
        assert_eq!(
            *form.state(),
            FormState::Result(ConversionQuote {
                amount: 24.0,
                rate: 2.0,
            })
        );
    }

    #[test]
    fn test_apply_surfaces_error_message() {
        let mut form = form();
        let request = form.begin_request().unwrap();
        form.apply(request.seq, Err(anyhow!("Conversion failed")));
        assert_eq!(
            *form.state(),
            FormState::Error("Conversion failed".to_string())
        );
    }

    #[test]
    fn test_load_currencies_resets_unknown_source() {
        let mut form = ConversionForm::new("AUD", "EUR", Duration::from_millis(500));
        let table: CurrencyTable = [("EUR", "Euro"), ("GBP", "British Pound")]
            .iter()
            .map(|(c, l)| (c.to_string(), l.to_string()))
            .collect();
        assert!(form.load_currencies(table));
        assert_eq!(form.from(), "USD");
    }

    #[test]
    fn test_load_currencies_keeps_known_source() {
        let mut form = form();
        let table: CurrencyTable = [("USD", "United States Dollar")]
            .iter()
            .map(|(c, l)| (c.to_string(), l.to_string()))
            .collect();
        assert!(!form.load_currencies(table));
        assert_eq!(form.from(), "USD");
    }

    #[test]
    fn test_cycle_from_steps_sorted_codes() {
        let mut form = form();
        form.load_currencies(
            [("EUR", ""), ("GBP", ""), ("USD", "")]
                .iter()
                .map(|(c, l)| (c.to_string(), l.to_string()))
                .collect(),
        );
        assert!(form.cycle_from(true));
        assert_eq!(form.from(), "EUR");
        assert!(form.cycle_from(false));
        assert_eq!(form.from(), "USD");
        assert!(form.cycle_from(false));
        assert_eq!(form.from(), "GBP");
    }

    #[test]
    fn test_cycle_with_empty_table_is_a_no_op() {
        let mut form = form();
        assert!(!form.cycle_from(true));
        assert!(!form.cycle_to(true));
        assert_eq!(form.from(), "USD");
        assert_eq!(form.to(), "EUR");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_debounces_edits_into_one_request() {
        let provider = ScriptedRates::new();
        let mut form = form();
        let (tx, mut rx) = mpsc::channel(16);

        let driver = async {
            tx.send(FormEvent::Input('0')).await.unwrap();
            sleep(Duration::from_millis(100)).await;
            tx.send(FormEvent::Input('0')).await.unwrap();
            sleep(Duration::from_millis(100)).await;
            tx.send(FormEvent::Input('0')).await.unwrap();
            sleep(Duration::from_millis(2000)).await;
            tx.send(FormEvent::Quit).await.unwrap();
        };
        tokio::join!(form.run(&provider, &mut rx, |_| {}), driver);

        assert_eq!(
            provider.calls(),
            vec![("USD".to_string(), "EUR".to_string(), 1000.0)]
        );
        assert_eq!(
            *form.state(),
            FormState::Result(ConversionQuote {
                amount: 2000.0,
                rate: 2.0,
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_drops_response_for_outdated_inputs() {
        let provider = ScriptedRates::new().with_delay(Duration::from_millis(200));
        let mut form = form();
        let (tx, mut rx) = mpsc::channel(16);
        let mut states = Vec::new();

        let driver = async {
            // Edit while the first request is still in flight.
            sleep(Duration::from_millis(600)).await;
            tx.send(FormEvent::Input('2')).await.unwrap();
            sleep(Duration::from_millis(2000)).await;
            tx.send(FormEvent::Quit).await.unwrap();
        };
        tokio::join!(
            form.run(&provider, &mut rx, |f| states.push(f.state().clone())),
            driver
        );

        assert_eq!(
            provider.calls(),
            vec![
                ("USD".to_string(), "EUR".to_string(), 1.0),
                ("USD".to_string(), "EUR".to_string(), 12.0),
            ]
        );
        // The response for amount 1 must never have been shown.
        assert!(!states.contains(&FormState::Result(ConversionQuote {
            amount: 2.0,
            rate: 2.0,
        })));
        assert_eq!(
            *form.state(),
            FormState::Result(ConversionQuote {
                amount: 24.0,
                rate: 2.0,
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_clears_result_when_amount_emptied() {
        let provider = ScriptedRates::new();
        let mut form = form();
        let (tx, mut rx) = mpsc::channel(16);

        let driver = async {
            sleep(Duration::from_millis(1000)).await;
            tx.send(FormEvent::Backspace).await.unwrap();
            sleep(Duration::from_millis(1000)).await;
            tx.send(FormEvent::Quit).await.unwrap();
        };
        tokio::join!(form.run(&provider, &mut rx, |_| {}), driver);

        assert_eq!(provider.calls().len(), 1);
        assert_eq!(*form.state(), FormState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_surfaces_proxy_error() {
        let provider = ScriptedRates::new().with_convert_error("Conversion failed");
        let mut form = form();
        let (tx, mut rx) = mpsc::channel(16);

        let driver = async {
            sleep(Duration::from_millis(1000)).await;
            tx.send(FormEvent::Quit).await.unwrap();
        };
        tokio::join!(form.run(&provider, &mut rx, |_| {}), driver);

        assert_eq!(
            *form.state(),
            FormState::Error("Conversion failed".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_still_converts_when_currency_list_fails() {
        let provider = ScriptedRates {
            currencies_error: true,
            ..ScriptedRates::new()
        };
        let mut form = form();
        let (tx, mut rx) = mpsc::channel(16);

        let driver = async {
            sleep(Duration::from_millis(1000)).await;
            tx.send(FormEvent::Quit).await.unwrap();
        };
        tokio::join!(form.run(&provider, &mut rx, |_| {}), driver);

        assert!(form.currencies().is_empty());
        assert_eq!(
            *form.state(),
            FormState::Result(ConversionQuote {
                amount: 2.0,
                rate: 2.0,
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_resets_source_not_in_table() {
        let provider = ScriptedRates::new().with_table(&["EUR", "GBP"]);
        let mut form = ConversionForm::new("AUD", "EUR", Duration::from_millis(500));
        let (tx, mut rx) = mpsc::channel(16);

        let driver = async {
            sleep(Duration::from_millis(1000)).await;
            tx.send(FormEvent::Quit).await.unwrap();
        };
        tokio::join!(form.run(&provider, &mut rx, |_| {}), driver);

        assert_eq!(form.from(), "USD");
        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "USD");
    }
}
