use serde_json::Value;

use crate::{
    domain::{CollectionEntry, EntryKey, EntryKind, EntryList},
    modal::{DialogKind, ModalAction, ModalOutcome, ModalRequest},
    options::DirtyPolicy,
    tabs::TabId,
};

use super::{
    Collaborators,
    dirty::{DirtyTracker, RestartFlag},
};

/// Result of one collection operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryChange {
    Added(EntryKey),
    Updated(Vec<EntryKey>),
    Removed(EntryKey),
    Moved { from: usize, to: usize },
    /// Cancelled dialog, ignored action, unknown key or a no-op move.
    Unchanged,
    /// The confirmation prompt was declined.
    Declined,
}

impl EntryChange {
    pub fn is_change(&self) -> bool {
        !matches!(self, EntryChange::Unchanged | EntryChange::Declined)
    }
}

/// How an `update` outcome finds the entry it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMatch {
    /// The entry the dialog was opened for.
    Key,
    /// Every entry whose content field equals the payload's, e.g. image profiles by `id`.
    Field(&'static str),
}

/// Mutable view of a session handed to [`CollectionMutator`] operations.
pub struct EditContext<'a, D> {
    pub(crate) document: &'a mut D,
    pub(crate) dirty: &'a mut DirtyTracker,
    pub(crate) restart: Option<&'a mut RestartFlag>,
    pub(crate) tab: &'a TabId,
    pub(crate) collaborators: &'a Collaborators,
    pub(crate) policy: DirtyPolicy,
    pub(crate) remove_prompt: &'a str,
}

impl<D> EditContext<'_, D> {
    pub fn document(&self) -> &D {
        &*self.document
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    fn mark_dirty(&mut self) {
        self.dirty
            .set(true, self.collaborators.tabs.as_ref(), self.tab);
    }

    fn raise_restart(&mut self) {
        if let Some(flag) = &mut self.restart {
            flag.raise();
        }
    }
}

/// Add/edit/remove/reorder for one list-valued field of `D`, driven through a dialog.
pub struct CollectionMutator<D> {
    name: &'static str,
    dialog: DialogKind,
    list: fn(&D) -> &EntryList,
    list_mut: fn(&mut D) -> &mut EntryList,
    accept: &'static [EntryKind],
    context: Option<fn(&D) -> Value>,
    update_match: UpdateMatch,
    restart_on_open: bool,
    restart_on_remove: bool,
    remove_prompt: Option<fn(&CollectionEntry) -> String>,
}

impl<D> CollectionMutator<D> {
    pub fn new(
        name: &'static str,
        dialog: DialogKind,
        list: fn(&D) -> &EntryList,
        list_mut: fn(&mut D) -> &mut EntryList,
    ) -> Self {
        Self {
            name,
            dialog,
            list,
            list_mut,
            accept: &[],
            context: None,
            update_match: UpdateMatch::Key,
            restart_on_open: false,
            restart_on_remove: false,
            remove_prompt: None,
        }
    }

    pub fn accepting(mut self, kinds: &'static [EntryKind]) -> Self {
        self.accept = kinds;
        self
    }

    pub fn with_context(mut self, context: fn(&D) -> Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn update_by_field(mut self, field: &'static str) -> Self {
        self.update_match = UpdateMatch::Field(field);
        self
    }

    pub fn restart_on_open(mut self) -> Self {
        self.restart_on_open = true;
        self
    }

    pub fn restart_on_remove(mut self) -> Self {
        self.restart_on_remove = true;
        self
    }

    pub fn with_remove_prompt(mut self, prompt: fn(&CollectionEntry) -> String) -> Self {
        self.remove_prompt = Some(prompt);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn dialog(&self) -> DialogKind {
        self.dialog
    }

    pub fn entries<'d>(&self, document: &'d D) -> &'d EntryList {
        (self.list)(document)
    }

    /// Open the dialog for a new entry. `add` appends the payload, creating the list when
    /// it is absent.
    pub async fn add(&self, ctx: &mut EditContext<'_, D>) -> EntryChange {
        let request = ModalRequest {
            is_new: true,
            entry: None,
            accept: self.accept.to_vec(),
            context: self.context.map(|build| build(&*ctx.document)),
        };
        self.opening(ctx);
        let outcome = ctx.collaborators.modal.open(self.dialog, request).await;
        self.apply(ctx, None, outcome)
    }

    /// Open the dialog for an existing entry. An unknown key opens nothing.
    pub async fn edit(&self, ctx: &mut EditContext<'_, D>, key: EntryKey) -> EntryChange {
        let Some(current) = (self.list)(&*ctx.document).get(key) else {
            tracing::debug!(field = self.name, %key, "edit of unknown entry ignored");
            return EntryChange::Unchanged;
        };
        let request = ModalRequest {
            is_new: false,
            entry: Some(current.content().clone()),
            accept: self.accept.to_vec(),
            context: self.context.map(|build| build(&*ctx.document)),
        };
        self.opening(ctx);
        let outcome = ctx.collaborators.modal.open(self.dialog, request).await;
        self.apply(ctx, Some(key), outcome)
    }

    /// Remove one entry after confirmation. An unknown key is not an error.
    pub fn remove(&self, ctx: &mut EditContext<'_, D>, key: EntryKey) -> EntryChange {
        let Some(entry) = (self.list)(&*ctx.document).get(key) else {
            return EntryChange::Unchanged;
        };
        let prompt = match self.remove_prompt {
            Some(build) => build(entry),
            None => ctx.remove_prompt.to_string(),
        };
        if !ctx.collaborators.confirm.confirm(&prompt) {
            return EntryChange::Declined;
        }
        (self.list_mut)(&mut *ctx.document).remove(key);
        if self.restart_on_remove {
            ctx.raise_restart();
        }
        ctx.mark_dirty();
        tracing::debug!(field = self.name, %key, "entry removed");
        EntryChange::Removed(key)
    }

    /// Move the entry at `from` to `to`; every other entry keeps its relative order.
    pub fn reorder(&self, ctx: &mut EditContext<'_, D>, from: usize, to: usize) -> EntryChange {
        if !(self.list_mut)(&mut *ctx.document).relocate(from, to) {
            return EntryChange::Unchanged;
        }
        ctx.mark_dirty();
        EntryChange::Moved { from, to }
    }

    /// Append a plain value without a dialog. Blank values are skipped, but under
    /// [`DirtyPolicy::OnOpen`] the attempt still marks the document dirty.
    pub fn push_value(&self, ctx: &mut EditContext<'_, D>, value: Value) -> EntryChange {
        if ctx.policy == DirtyPolicy::OnOpen {
            ctx.mark_dirty();
        }
        if is_blank(&value) {
            return EntryChange::Unchanged;
        }
        let key = (self.list_mut)(&mut *ctx.document).push(value);
        ctx.mark_dirty();
        EntryChange::Added(key)
    }

    fn opening(&self, ctx: &mut EditContext<'_, D>) {
        if self.restart_on_open {
            ctx.raise_restart();
        }
        if ctx.policy == DirtyPolicy::OnOpen {
            ctx.mark_dirty();
        }
    }

    fn apply(
        &self,
        ctx: &mut EditContext<'_, D>,
        target: Option<EntryKey>,
        outcome: ModalOutcome,
    ) -> EntryChange {
        let ModalOutcome::Resolved { action, payload } = outcome else {
            tracing::debug!(field = self.name, "dialog cancelled");
            return EntryChange::Unchanged;
        };
        let list = (self.list_mut)(&mut *ctx.document);
        let change = match action {
            ModalAction::Add => EntryChange::Added(list.push(payload)),
            ModalAction::Update => {
                let replaced = match (self.update_match, target) {
                    (UpdateMatch::Field(field), _) => list.replace_matching(field, &payload),
                    (UpdateMatch::Key, Some(key)) => {
                        if list.replace(key, payload) {
                            vec![key]
                        } else {
                            Vec::new()
                        }
                    }
                    (UpdateMatch::Key, None) => Vec::new(),
                };
                if replaced.is_empty() {
                    EntryChange::Unchanged
                } else {
                    EntryChange::Updated(replaced)
                }
            }
            ModalAction::Other(raw) => {
                tracing::debug!(field = self.name, action = %raw, "dialog action ignored");
                EntryChange::Unchanged
            }
        };
        if change.is_change() {
            ctx.mark_dirty();
        }
        change
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}
