use super::ui;
use crate::core::{CurrencyCode, CurrencyRateProvider, FetchError};
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;

/// Looks up every supported currency concurrently, in [`CurrencyCode::ALL`] order.
pub async fn fetch_all_rates(
    provider: &dyn CurrencyRateProvider,
) -> Result<Vec<(CurrencyCode, Result<f64, FetchError>)>> {
    let pb = ui::new_progress_bar(CurrencyCode::ALL.len() as u64)?;
    pb.set_message("Fetching rates");

    let lookups = CurrencyCode::ALL.into_iter().map(|code| {
        let pb = pb.clone();
        async move {
            let result = provider.get_rate(code).await;
            pb.inc(1);
            (code, result)
        }
    });
    let results = join_all(lookups).await;

    pb.finish_and_clear();
    Ok(results)
}

pub fn display_rates_table(
    rates: &[(CurrencyCode, Result<f64, FetchError>)],
    symbol: &str,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate ({symbol})")),
    ]);

    for (code, result) in rates {
        let rate = match result {
            Ok(rate) => ui::rate_cell(*rate),
            Err(e) => ui::error_cell(&format!("{} error: {}", e.stage, e.message)),
        };
        table.add_row(vec![Cell::new(code.as_str()), rate]);
    }

    let mut output = format!(
        "{}\n\n{}",
        ui::style_text("Ruble exchange rates", ui::StyleType::Title),
        table
    );

    let failed = rates.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(
                &format!("{failed} of {} rates unavailable", rates.len()),
                ui::StyleType::Error
            )
        ));
    }
    output
}
