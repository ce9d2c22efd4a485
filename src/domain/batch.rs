//! Carrier batch rules for one upload session.
//!
//! The batch always holds at least one entry. Validation happens in
//! `prepare()` before any network call.

use crate::domain::{
    AttachedDocument, CarrierSummary, DocumentSlot, FileTag, IntakeError, PreparedSubmission,
    QcSubmission, TaggedFile,
};

/// One carrier row: a name and up to one document per slot.
#[derive(Debug, Clone, Default)]
pub struct CarrierEntry {
    pub id: u32,
    pub name: String,
    pub property: Option<AttachedDocument>,
    pub liability: Option<AttachedDocument>,
}

impl CarrierEntry {
    fn file_count(&self) -> usize {
        self.property.is_some() as usize + self.liability.is_some() as usize
    }
}

/// Ordered carrier entries for one upload session. Owns the fresh-id counter.
#[derive(Debug, Clone)]
pub struct CarrierBatch {
    entries: Vec<CarrierEntry>,
    next_id: u32,
}

impl CarrierBatch {
    /// A new batch starts with a single empty entry (the list is never empty).
    pub fn new() -> Self {
        let mut batch = Self {
            entries: Vec::new(),
            next_id: 0,
        };
        batch.add_carrier();
        batch
    }

    pub fn entries(&self) -> &[CarrierEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an empty entry with a fresh unique id. No upper bound.
    pub fn add_carrier(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(CarrierEntry {
            id,
            ..CarrierEntry::default()
        });
        id
    }

    /// Remove an entry. No-op returning `false` when it is the last remaining
    /// entry (at least one must always exist) or when the id is unknown.
    pub fn remove_carrier(&mut self, id: u32) -> bool {
        if self.entries.len() <= 1 {
            return false;
        }
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() < before
    }

    pub fn set_name(&mut self, id: u32, name: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Attach a document to a slot, replacing any previous file there.
    /// Only PDF documents are accepted; no size limit is enforced.
    pub fn attach(
        &mut self,
        id: u32,
        slot: DocumentSlot,
        document: AttachedDocument,
    ) -> Result<(), IntakeError> {
        if !is_pdf_filename(&document.filename) {
            return Err(IntakeError::Validation(format!(
                "'{}' is not a PDF document",
                document.filename
            )));
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| IntakeError::Validation(format!("no carrier entry with id {}", id)))?;
        match slot {
            DocumentSlot::Property => entry.property = Some(document),
            DocumentSlot::Liability => entry.liability = Some(document),
        }
        Ok(())
    }

    /// Total files attached across all entries.
    pub fn total_files(&self) -> usize {
        self.entries.iter().map(CarrierEntry::file_count).sum()
    }

    /// Validate and flatten: every name non-empty, at least one file overall.
    /// Produces the ordered descriptor plus the tagged flat file list.
    pub fn prepare(&self) -> Result<PreparedSubmission, IntakeError> {
        for entry in &self.entries {
            if entry.name.trim().is_empty() {
                return Err(IntakeError::Validation(
                    "every carrier needs a name".to_string(),
                ));
            }
        }
        if self.total_files() == 0 {
            return Err(IntakeError::Validation(
                "attach at least one quote PDF before submitting".to_string(),
            ));
        }

        let carriers: Vec<CarrierSummary> = self
            .entries
            .iter()
            .map(|e| CarrierSummary {
                name: e.name.trim().to_string(),
                has_property: e.property.is_some(),
                has_liability: e.liability.is_some(),
            })
            .collect();

        let mut files = Vec::with_capacity(self.total_files());
        for (carrier_index, entry) in self.entries.iter().enumerate() {
            if let Some(doc) = &entry.property {
                files.push(TaggedFile {
                    tag: FileTag {
                        carrier_index,
                        slot: DocumentSlot::Property,
                    },
                    document: doc.clone(),
                });
            }
            if let Some(doc) = &entry.liability {
                files.push(TaggedFile {
                    tag: FileTag {
                        carrier_index,
                        slot: DocumentSlot::Liability,
                    },
                    document: doc.clone(),
                });
            }
        }

        Ok(PreparedSubmission { carriers, files })
    }
}

impl Default for CarrierBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl QcSubmission {
    /// Strict policy: carrier name non-empty and all three PDFs present.
    /// (The documents are required at construction; this validates names
    /// and file types.)
    pub fn validate(&self) -> Result<(), IntakeError> {
        if self.carrier_name.trim().is_empty() {
            return Err(IntakeError::Validation(
                "QC submission needs a carrier name".to_string(),
            ));
        }
        for (label, doc) in [
            ("quote", &self.quote),
            ("policy", &self.policy),
            ("certificate", &self.certificate),
        ] {
            if doc.bytes.is_empty() {
                return Err(IntakeError::Validation(format!(
                    "QC {} document is empty",
                    label
                )));
            }
            if !is_pdf_filename(&doc.filename) {
                return Err(IntakeError::Validation(format!(
                    "QC {} document '{}' is not a PDF",
                    label, doc.filename
                )));
            }
        }
        Ok(())
    }
}

fn is_pdf_filename(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}
