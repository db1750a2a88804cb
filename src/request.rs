//! Outbound request construction.
//!
//! `build` is a pure function of the batch: one `num_files` count field plus
//! exactly one file field per document, keyed by document name. Key
//! collisions cannot happen because the collector refuses duplicate names.

use crate::batch::Document;
use reqwest::multipart::{Form, Part};

/// Field carrying the document count, as a decimal string.
pub const NUM_FILES_FIELD: &str = "num_files";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    File {
        bytes: Vec<u8>,
        content_type: String,
        file_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: FieldValue,
}

/// The multipart payload for one analysis submission, held in a
/// transport-agnostic form until the client turns it into a wire body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPayload {
    fields: Vec<FormField>,
}

impl RequestPayload {
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn document_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| matches!(f.value, FieldValue::File { .. }))
            .count()
    }

    /// Render as a reqwest multipart form. Fails only if a declared content
    /// type is not a parseable MIME string, which the acceptance policy
    /// rules out for accepted documents.
    pub fn into_form(self) -> Result<Form, reqwest::Error> {
        let mut form = Form::new();
        for field in self.fields {
            form = match field.value {
                FieldValue::Text(text) => form.text(field.name, text),
                FieldValue::File {
                    bytes,
                    content_type,
                    file_name,
                } => {
                    let part = Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&content_type)?;
                    form.part(field.name, part)
                }
            };
        }
        Ok(form)
    }
}

/// Build the payload for a batch of documents. Does not mutate the batch.
pub fn build(batch: &[Document]) -> RequestPayload {
    let mut fields = Vec::with_capacity(batch.len() + 1);
    fields.push(FormField {
        name: NUM_FILES_FIELD.to_string(),
        value: FieldValue::Text(batch.len().to_string()),
    });
    for doc in batch {
        fields.push(FormField {
            name: doc.name().to_string(),
            value: FieldValue::File {
                bytes: doc.bytes().to_vec(),
                content_type: doc.declared_type().to_string(),
                file_name: doc.name().to_string(),
            },
        });
    }
    RequestPayload { fields }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchCollector, Candidate, SUPPORTED_DOCUMENT_TYPE};
    use pretty_assertions::assert_eq;

    fn batch_of(names: &[&str]) -> Vec<Document> {
        let mut collector = BatchCollector::new();
        for name in names {
            collector
                .add(Candidate {
                    name: name.to_string(),
                    bytes: vec![1, 2, 3],
                    declared_type: SUPPORTED_DOCUMENT_TYPE.to_string(),
                })
                .unwrap();
        }
        collector.take_batch()
    }

    #[test]
    fn payload_has_count_field_plus_one_per_document() {
        let batch = batch_of(&["a.pdf", "b.pdf", "c.pdf"]);
        let payload = build(&batch);

        assert_eq!(payload.field_count(), 4);
        assert_eq!(payload.document_count(), 3);
        assert_eq!(payload.fields()[0].name, NUM_FILES_FIELD);
        assert_eq!(
            payload.fields()[0].value,
            FieldValue::Text("3".to_string())
        );
    }

    #[test]
    fn document_fields_are_keyed_by_name_in_batch_order() {
        let batch = batch_of(&["first.pdf", "second.pdf"]);
        let payload = build(&batch);

        let names: Vec<&str> = payload.fields()[1..]
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, ["first.pdf", "second.pdf"]);

        match &payload.fields()[1].value {
            FieldValue::File {
                bytes,
                content_type,
                file_name,
            } => {
                assert_eq!(bytes, &vec![1, 2, 3]);
                assert_eq!(content_type, SUPPORTED_DOCUMENT_TYPE);
                assert_eq!(file_name, "first.pdf");
            }
            other => panic!("expected a file field, got {other:?}"),
        }
    }

    #[test]
    fn empty_batch_still_carries_the_count_field() {
        let payload = build(&[]);
        assert_eq!(payload.field_count(), 1);
        assert_eq!(
            payload.fields()[0].value,
            FieldValue::Text("0".to_string())
        );
    }

    #[test]
    fn build_does_not_consume_the_batch() {
        let batch = batch_of(&["a.pdf"]);
        let before = batch.clone();
        let _ = build(&batch);
        assert_eq!(batch, before);
    }
}
