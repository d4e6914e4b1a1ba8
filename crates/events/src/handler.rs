/// Execute an action against a document in place (no log, no bus).
///
/// Decide with `handle`, then evolve with `apply` for every returned
/// operation. The document's revision advances once per operation. For the
/// full pipeline with an operation log and subscriptions, go through the
/// editor's `Reactor`.
pub fn execute<D>(document: &mut D, action: &D::Action) -> Result<Vec<D::Operation>, D::Error>
where
    D: docforge_core::DocumentModel,
{
    let operations = D::handle(document, action)?;
    for op in &operations {
        D::apply(document, op);
    }
    Ok(operations)
}
