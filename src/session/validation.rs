use jsonschema::{Validator, validator_for};
use serde_json::Value;

use crate::error::SessionError;

/// Schema check run on the serialized document before it is handed to the store.
pub(crate) struct SaveGate {
    validator: Validator,
}

impl SaveGate {
    pub(crate) fn compile(schema: &Value) -> Result<Self, SessionError> {
        let validator =
            validator_for(schema).map_err(|err| SessionError::Schema(err.to_string()))?;
        Ok(Self { validator })
    }

    /// On violation the caller sees `message`; the individual schema errors ride along as
    /// issues, each prefixed with the offending pointer.
    pub(crate) fn check(&self, document: &Value, message: &str) -> Result<(), SessionError> {
        if self.validator.is_valid(document) {
            return Ok(());
        }
        let issues = self
            .validator
            .iter_errors(document)
            .map(|error| {
                let pointer = error.instance_path.to_string();
                let prefix = if pointer.is_empty() {
                    "<root>".to_string()
                } else {
                    pointer
                };
                format!("{prefix}: {error}")
            })
            .collect();
        Err(SessionError::Validation {
            message: message.to_string(),
            issues,
        })
    }
}
