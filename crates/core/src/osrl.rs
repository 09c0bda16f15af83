// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! OSrL result-document parsing.
//!
//! A solver run leaves behind one OSrL XML document. The parts the harness
//! cares about are the repeated `time` elements (a `type` attribute and a
//! numeric text value), and the singular `status`/`substatus` elements whose
//! `type` attribute carries the category. Documents are usually namespaced
//! under `os.optimizationservices.org`, so elements are matched by local
//! name and parse the same with or without a namespace.
//!
//! Parsing is pure: the runner reads the file and hands the string in.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use thiserror::Error;

/// The time type carrying the total wall time of a run.
pub const TOTAL_TIME_KIND: &str = "Total";

/// Errors raised while extracting run metrics from a result document.
///
/// None of these abort a batch: the runner records the error for the
/// affected run and continues, leaving an explicit hole in the numeric data.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The XML itself is malformed.
    #[error("malformed result document at position {position}: {message}")]
    Xml {
        /// Byte offset reported by the reader.
        position: usize,
        /// Underlying reader error.
        message: String,
    },

    /// The document contains no elements at all.
    #[error("result document is empty")]
    EmptyDocument,

    /// No `time` element with the requested type was present.
    #[error("result document has no \"{kind}\" time entry")]
    MissingTime {
        /// The requested time type.
        kind: String,
    },

    /// The time text did not parse as a number.
    #[error("time entry \"{kind}\" is not numeric: {value:?}")]
    InvalidTime {
        /// The requested time type.
        kind: String,
        /// The raw text that failed to parse.
        value: String,
    },
}

/// Result alias for parser operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// The extracted fields of one OSrL result document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultDocument {
    times: BTreeMap<String, String>,
    status: String,
    substatus: String,
}

impl ResultDocument {
    /// Parse an OSrL document from its XML text.
    ///
    /// Elements are matched by local name, so namespaced and plain documents
    /// both work. A missing `status` or `substatus` element leaves the
    /// corresponding field empty rather than failing.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Xml`] for malformed XML and
    /// [`ParseError::EmptyDocument`] when the document has no elements.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut doc = ResultDocument::default();
        let mut pending_time: Option<String> = None;
        let mut saw_element = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    saw_element = true;
                    doc.record_element(&e, &mut pending_time, false);
                }
                Ok(Event::Empty(e)) => {
                    saw_element = true;
                    doc.record_element(&e, &mut pending_time, true);
                }
                Ok(Event::Text(t)) => {
                    if let Some(kind) = pending_time.take() {
                        let value = t
                            .unescape()
                            .map(|text| text.into_owned())
                            .unwrap_or_default();
                        doc.times.insert(kind, value);
                    }
                }
                Ok(Event::End(_)) => {
                    pending_time = None;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ParseError::Xml {
                        position: reader.buffer_position(),
                        message: e.to_string(),
                    })
                }
                Ok(_) => {}
            }
        }

        if !saw_element {
            return Err(ParseError::EmptyDocument);
        }
        Ok(doc)
    }

    fn record_element(
        &mut self,
        element: &BytesStart<'_>,
        pending_time: &mut Option<String>,
        empty: bool,
    ) {
        match element.local_name().as_ref() {
            b"time" => {
                if let Some(kind) = type_attribute(element) {
                    if empty {
                        self.times.insert(kind, String::new());
                    } else {
                        *pending_time = Some(kind);
                    }
                }
            }
            b"status" => {
                self.status = type_attribute(element).unwrap_or_default();
            }
            b"substatus" => {
                self.substatus = type_attribute(element).unwrap_or_default();
            }
            _ => {}
        }
    }

    /// All time entries, keyed by their `type` attribute, raw text values.
    pub fn times(&self) -> &BTreeMap<String, String> {
        &self.times
    }

    /// Raw text of one time entry.
    pub fn time(&self, kind: &str) -> Option<&str> {
        self.times.get(kind).map(String::as_str)
    }

    /// Solver status category; empty when the document carried none.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Solver substatus category; empty when the document carried none.
    pub fn substatus(&self) -> &str {
        &self.substatus
    }

    /// Total wall time of the run, in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingTime`] when the document has no
    /// `"Total"` entry and [`ParseError::InvalidTime`] when its text is not
    /// numeric (a crashed solver typically leaves a placeholder there).
    pub fn total_time(&self) -> Result<f64> {
        let raw = self.time(TOTAL_TIME_KIND).ok_or_else(|| ParseError::MissingTime {
            kind: TOTAL_TIME_KIND.to_string(),
        })?;
        raw.trim().parse().map_err(|_| ParseError::InvalidTime {
            kind: TOTAL_TIME_KIND.to_string(),
            value: raw.to_string(),
        })
    }
}

fn type_attribute(element: &BytesStart<'_>) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"type")
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}
