//! `docforge-replay`: rebuild an invoice from a JSON array of actions.
//!
//! Usage: `docforge-replay [FILE]` (reads stdin when no file is given).
//! The first action must be `CREATE_INVOICE`.

use std::io::Read;

use anyhow::{Context, anyhow, bail};
use serde_json::json;

use docforge_core::Document;
use docforge_documents::{INVOICE_DOCUMENT_TYPE, Invoice, InvoiceAction, LineItemDocument};
use docforge_editor::{Dispatch, EditorConfig, Notice, Reactor};
use docforge_events::InMemoryEventBus;

fn main() -> anyhow::Result<()> {
    docforge_observability::init();

    let input = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    let actions: Vec<InvoiceAction> =
        serde_json::from_str(&input).context("parsing invoice actions")?;
    let invoice_id = match actions.first() {
        Some(InvoiceAction::CreateInvoice(create)) => create.invoice_id,
        Some(other) => bail!("first action must be CREATE_INVOICE, got {other:?}"),
        None => bail!("no actions to replay"),
    };

    let config = EditorConfig::from_env();
    let mut reactor = Reactor::configured(
        Invoice::empty(invoice_id),
        INVOICE_DOCUMENT_TYPE,
        InMemoryEventBus::new(),
        &config,
    );

    for (position, action) in actions.into_iter().enumerate() {
        reactor
            .dispatch(action)
            .map_err(|err| anyhow!("{}", Notice::from(&err)))
            .with_context(|| format!("action {position}"))?;
    }

    let invoice = reactor.state();
    let summary = json!({
        "invoiceId": invoice_id,
        "currency": invoice.currency(),
        "revision": invoice.revision(),
        "lineItems": invoice.line_items(),
        "totalPriceTaxExcl": invoice.total_excl(),
        "totalPriceTaxIncl": invoice.total_incl(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
