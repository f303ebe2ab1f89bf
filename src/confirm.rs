/// Interactive yes/no gate in front of destructive operations. A declined prompt aborts
/// the operation with no side effects.
pub trait ConfirmGate: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> ConfirmGate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Answers every prompt the same way, for scripted and non-interactive runs.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl ConfirmGate for AutoConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!(answer = self.0, "auto-answered prompt: {prompt}");
        self.0
    }
}
