use std::sync::Arc;

use editdesk::{
    AutoConfirm, Collaborators, DocumentSession, Layout, MemoryStore, ModalBroker, ModalOutcome,
    SessionOptions, TabRegistry, fields,
};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let tabs = Arc::new(TabRegistry::new());
    let (broker, mut host) = ModalBroker::channel();

    // Stands in for the UI: answers every field dialog with a new text field.
    let host_task = tokio::spawn(async move {
        let mut answered = 0;
        while let Some(pending) = host.next().await {
            answered += 1;
            println!(
                "dialog {:?} opened (accepts {:?})",
                pending.kind, pending.request.accept
            );
            pending.resolve(ModalOutcome::add(json!({
                "fldName": format!("field{answered}"),
                "fldType": "text"
            })));
        }
    });

    let options = SessionOptions::default();
    let tab = options.layout.tab_for("NEW");
    tabs.open(tab.clone(), "Loading")?;
    let collaborators = Collaborators::new(
        tabs.clone(),
        Arc::new(broker),
        Arc::new(AutoConfirm(true)),
    );
    let mut session =
        DocumentSession::<Layout>::new("NEW", tab, store.clone(), collaborators, options)?;
    session.initialize().await?;

    {
        let mutator = fields::layout_fields();
        let mut ctx = session.edit().expect("new layout is bound");
        mutator.add(&mut ctx).await;
        mutator.add(&mut ctx).await;
        mutator.reorder(&mut ctx, 1, 0);
    }
    session.modify(|layout| {
        layout.okey = Some("article".into());
        layout.title = "Article".into();
    })?;
    println!("dirty before save: {}", session.is_dirty());

    let outcome = session.save().await?;
    println!(
        "saved as {} (identity changed: {}), tab is now {}",
        session.document_id(),
        outcome.identity_changed,
        session.tab_id()
    );
    println!("stored: {}", serde_json::to_string_pretty(&store.document("1"))?);
    for notice in tabs.drain_notifications() {
        println!("notice: {notice}");
    }

    drop(session);
    host_task.await?;
    Ok(())
}
