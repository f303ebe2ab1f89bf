use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;

use super::{DialogKind, ModalOutcome, ModalRequest, ModalResultChannel};

/// Answers dialogs from a prepared queue and records what was asked. An exhausted queue
/// answers [`ModalOutcome::Cancelled`].
#[derive(Debug, Default)]
pub struct ScriptedModal {
    answers: Mutex<VecDeque<ModalOutcome>>,
    requests: Mutex<Vec<(DialogKind, ModalRequest)>>,
}

impl ScriptedModal {
    pub fn new(answers: impl IntoIterator<Item = ModalOutcome>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, outcome: ModalOutcome) {
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }

    pub fn requests(&self) -> Vec<(DialogKind, ModalRequest)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl ModalResultChannel for ScriptedModal {
    async fn open(&self, kind: DialogKind, request: ModalRequest) -> ModalOutcome {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, request));
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(ModalOutcome::Cancelled)
    }
}
