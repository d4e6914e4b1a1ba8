use chrono::Utc;
use proptest::prelude::*;

use docforge_core::{Document, DocumentId};
use docforge_documents::{
    AddWallet, CreateExpenseReport, CreateInvoice, EXPENSE_REPORT_DOCUMENT_TYPE, ExpenseReport,
    ExpenseReportAction, ExpenseReportOperation, INVOICE_DOCUMENT_TYPE, Invoice, InvoiceAction,
    InvoiceOperation, WalletAddress,
};
use docforge_editor::{
    CommitOutcome, Dispatch, EditorConfig, LineItemDraft, Notice, Reactor, SessionError,
};
use docforge_events::{InMemoryEventBus, Operation, OperationEnvelope};
use docforge_reconcile::{LineItemField, Rule};

type InvoiceReactor = Reactor<Invoice, InMemoryEventBus<OperationEnvelope<InvoiceOperation>>>;
type ReportReactor =
    Reactor<ExpenseReport, InMemoryEventBus<OperationEnvelope<ExpenseReportOperation>>>;

fn invoice_reactor() -> InvoiceReactor {
    let id = DocumentId::new();
    let mut reactor = Reactor::configured(
        Invoice::empty(id),
        INVOICE_DOCUMENT_TYPE,
        InMemoryEventBus::new(),
        &EditorConfig::default(),
    );
    reactor
        .dispatch(InvoiceAction::CreateInvoice(CreateInvoice {
            invoice_id: id,
            currency: "EUR".parse().unwrap(),
            occurred_at: Utc::now(),
        }))
        .unwrap();
    reactor
}

fn report_reactor(wallet: &WalletAddress) -> ReportReactor {
    let id = DocumentId::new();
    let mut reactor = Reactor::configured(
        ExpenseReport::empty(id),
        EXPENSE_REPORT_DOCUMENT_TYPE,
        InMemoryEventBus::new(),
        &EditorConfig::default(),
    );
    reactor
        .dispatch(ExpenseReportAction::CreateExpenseReport(CreateExpenseReport {
            report_id: id,
            currency: "USDS".parse().unwrap(),
            occurred_at: Utc::now(),
        }))
        .unwrap();
    reactor
        .dispatch(ExpenseReportAction::AddWallet(AddWallet {
            address: wallet.clone(),
            name: Some("Core Unit".to_string()),
            occurred_at: Utc::now(),
        }))
        .unwrap();
    reactor
}

#[test]
fn invoice_draft_flows_through_reactor_to_subscribers() {
    let mut reactor = invoice_reactor();
    let sub = reactor.subscribe();
    let config = EditorConfig::default();

    let mut draft = LineItemDraft::create(reactor.state(), (), &config).unwrap();
    draft.set_description("Audit");
    draft.input(LineItemField::Quantity, "4").unwrap();
    draft.input(LineItemField::TaxPercent, "19").unwrap();
    draft.input(LineItemField::UnitPriceTaxExcl, "25").unwrap();
    draft.commit(&mut reactor).unwrap();

    // The user negotiates a lump sum including tax.
    draft.input(LineItemField::TotalPriceTaxIncl, "238").unwrap();
    let preview = draft.preview().unwrap();
    assert_eq!(preview.rule, Rule::TotalTaxIncl);
    assert!((preview.values.unit_price_tax_excl - 50.0).abs() < 1e-9);

    let outcome = draft.commit(&mut reactor).unwrap();
    assert!(matches!(outcome, CommitOutcome::Committed { rule: Rule::TotalTaxIncl, .. }));

    let received = sub.drain();
    let types: Vec<_> = received
        .iter()
        .map(|e| e.payload().operation_type())
        .collect();
    assert_eq!(types, ["invoice.line_item.added", "invoice.line_item.edited"]);
    assert_eq!(received.last().unwrap().index(), 3);

    let invoice = reactor.state();
    assert!((invoice.total_excl() - 200.0).abs() < 1e-9);
    assert!((invoice.total_incl() - 238.0).abs() < 1e-9);
}

#[test]
fn second_draft_sees_committed_state_after_rebase() {
    let mut reactor = invoice_reactor();
    let config = EditorConfig::default();

    let mut first = LineItemDraft::create(reactor.state(), (), &config).unwrap();
    first.input(LineItemField::UnitPriceTaxExcl, "10").unwrap();
    first.commit(&mut reactor).unwrap();

    let mut second = LineItemDraft::open(reactor.state(), (), first.id(), &config).unwrap();
    first.input(LineItemField::Quantity, "3").unwrap();
    first.commit(&mut reactor).unwrap();

    second.rebase(reactor.state()).unwrap();
    assert_eq!(second.values().quantity, 3.0);
    assert!((second.values().total_price_tax_excl - 30.0).abs() < 1e-9);
}

#[test]
fn expense_report_edits_are_scoped_to_wallet() {
    let wallet: WalletAddress = "0x9e1585d9ca64243ce43d42f7dd7333190f66ca09".parse().unwrap();
    let mut reactor = report_reactor(&wallet);
    let config = EditorConfig::default();

    let mut draft = LineItemDraft::create(reactor.state(), wallet.clone(), &config).unwrap();
    draft.set_description("Conference tickets");
    draft.input(LineItemField::Quantity, "2").unwrap();
    // Expense reports are entered gross, with token precision.
    draft.input(LineItemField::UnitPriceTaxIncl, "120.123456").unwrap();
    draft.commit(&mut reactor).unwrap();

    let report = reactor.state();
    let wallet_state = report.wallet(&wallet).unwrap();
    assert_eq!(wallet_state.line_items().len(), 1);
    assert!((report.total_incl() - 240.246912).abs() < 1e-9);

    let err = draft
        .input(LineItemField::UnitPriceTaxExcl, "1")
        .unwrap_err();
    let notice = Notice::from(&err);
    assert_eq!(notice.field_path.as_deref(), Some("input.unitPriceTaxExcl"));
}

#[test]
fn unknown_wallet_surfaces_a_not_found_notice() {
    let wallet: WalletAddress = "0xabc".parse().unwrap();
    let mut reactor = report_reactor(&wallet);
    let other: WalletAddress = "0xdef".parse().unwrap();

    let mut draft =
        LineItemDraft::create(reactor.state(), other, &EditorConfig::default()).unwrap();
    draft.input(LineItemField::UnitPriceTaxIncl, "5").unwrap();
    let err = draft.commit(&mut reactor).unwrap_err();

    assert!(matches!(err, SessionError::Dispatch(_)));
    assert_eq!(Notice::from(&err).title, "Not found");
    assert!(draft.is_dirty());
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    #[test]
    fn replaying_the_log_reproduces_state(
        edits in prop::collection::vec((0usize..3, 1u32..10_000), 1..12)
    ) {
        let mut reactor = invoice_reactor();
        let config = EditorConfig::default();
        let mut draft = LineItemDraft::create(reactor.state(), (), &config).unwrap();
        draft.input(LineItemField::UnitPriceTaxExcl, "1").unwrap();
        draft.commit(&mut reactor).unwrap();

        let fields = [
            LineItemField::Quantity,
            LineItemField::UnitPriceTaxExcl,
            LineItemField::TotalPriceTaxExcl,
        ];
        for (field, cents) in edits {
            let raw = format!("{}.{:02}", cents / 100, cents % 100);
            draft.input(fields[field], &raw).unwrap();
            draft.commit(&mut reactor).unwrap();
        }

        let rebuilt = Reactor::replay_configured(
            Invoice::empty(*reactor.state().id()),
            INVOICE_DOCUMENT_TYPE,
            InMemoryEventBus::new(),
            reactor.log().to_vec(),
            &config,
        )
        .unwrap();
        prop_assert_eq!(rebuilt.state(), reactor.state());
        prop_assert_eq!(rebuilt.state().revision(), reactor.log().len() as u64);
    }

    #[test]
    fn entered_figure_is_stored_verbatim(
        quantity in 1u32..20,
        tax_percent in 0u32..=30,
        base_cents in 1u64..10_000_000_000,
        entered_cents in 1u64..10_000_000_000,
        field in 0usize..4,
    ) {
        let mut reactor = invoice_reactor();
        let config = EditorConfig::default();
        let mut draft = LineItemDraft::create(reactor.state(), (), &config).unwrap();
        draft.input(LineItemField::Quantity, &quantity.to_string()).unwrap();
        draft.input(LineItemField::TaxPercent, &tax_percent.to_string()).unwrap();
        let base = format!("{}.{:02}", base_cents / 100, base_cents % 100);
        draft.input(LineItemField::UnitPriceTaxExcl, &base).unwrap();
        draft.commit(&mut reactor).unwrap();

        let field = [
            LineItemField::UnitPriceTaxExcl,
            LineItemField::UnitPriceTaxIncl,
            LineItemField::TotalPriceTaxExcl,
            LineItemField::TotalPriceTaxIncl,
        ][field];
        let raw = format!("{}.{:02}", entered_cents / 100, entered_cents % 100);
        draft.input(field, &raw).unwrap();
        draft.commit(&mut reactor).unwrap();

        let stored = reactor.state().line_items()[0].values;
        prop_assert_eq!(stored.get(field), raw.parse::<f64>().unwrap());
        prop_assert_eq!(&stored, draft.values());
    }
}
