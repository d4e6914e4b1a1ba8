use serde::{Deserialize, Serialize};
use uuid::Uuid;

use docforge_core::DocumentId;

/// Envelope for an operation, carrying the document log metadata.
///
/// This is the unit appended to a document's operation log and published to
/// subscribers. `index` starts at 1 and increases by one per operation within
/// a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationEnvelope<O> {
    operation_id: Uuid,
    document_id: DocumentId,
    document_type: String,
    index: u64,
    payload: O,
}

impl<O> OperationEnvelope<O> {
    pub fn new(
        operation_id: Uuid,
        document_id: DocumentId,
        document_type: impl Into<String>,
        index: u64,
        payload: O,
    ) -> Self {
        Self {
            operation_id,
            document_id,
            document_type: document_type.into(),
            index,
            payload,
        }
    }

    pub fn operation_id(&self) -> Uuid {
        self.operation_id
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn payload(&self) -> &O {
        &self.payload
    }

    pub fn into_payload(self) -> O {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_metadata_in_camel_case() {
        let env = OperationEnvelope::new(
            Uuid::now_v7(),
            DocumentId::new(),
            "docforge/invoice",
            7,
            "payload".to_string(),
        );
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["documentType"], "docforge/invoice");
        assert_eq!(json["index"], 7);
        assert_eq!(json["payload"], "payload");
    }
}
