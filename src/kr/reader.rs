//! Streaming reader for nested-section corpus files
//!
//! Corpus files are line oriented. Meta lines start with `%%#` and open
//! `PAGE` / `Field` sections or announce `Templates` / `Redirect`; payloads
//! are tab separated. A blank line ends the current sentence, and any other
//! line inside a field is one word with tab-separated attributes.
//!
//! Section nesting is strictly ordered (none < page < field < sentence).
//! Whenever a state closes, callbacks fire innermost first: sentence end,
//! then field end, then document end, before the next state opens.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use super::attributes::decode;

/// Listener interface for corpus lifecycle events.
///
/// Every method defaults to a no-op so implementors only pick the events
/// they care about. A reader notifies its callbacks in registration order,
/// once per event.
pub trait CorpusCallback {
    /// Called when a new file is opened by the reader.
    fn file_start(&mut self, _file_name: &str) {}
    /// Called when a `PAGE` header is met.
    fn document_start(&mut self, _title: &str) {}
    /// Announces the templates defined in the document.
    fn templates(&mut self, _templates: &[String]) {}
    /// Announces that this page is a redirect.
    fn redirect(&mut self) {}
    /// Signals the start of a field.
    fn field_start(&mut self, _field: &str) {}
    /// Signals the start of a new sentence.
    fn sentence_start(&mut self) {}
    /// Called for each word with its tab-separated attributes.
    fn word(&mut self, _attributes: &[String]) {}
    /// Signals the end of the current sentence.
    fn sentence_end(&mut self) {}
    /// Signals the end of the current field.
    fn field_end(&mut self) {}
    /// Signals that the current document has been fully read.
    fn document_end(&mut self) {}
    /// Called when the current file has been completely read.
    fn file_end(&mut self) {}
}

const META_HEAD: &str = "%%#";
const PAGE_LABEL: &str = "PAGE";
const FIELD_LABEL: &str = "Field";
const TEMPLATE_LABEL: &str = "Templates";
const REDIRECT_LABEL: &str = "Redirect";

/// Ordered nesting states; closing a state also closes everything above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
enum ReaderState {
    #[default]
    None,
    Page,
    Field,
    Sentence,
}

impl ReaderState {
    fn pop(self) -> ReaderState {
        match self {
            ReaderState::Sentence => ReaderState::Field,
            ReaderState::Field => ReaderState::Page,
            ReaderState::Page => ReaderState::None,
            ReaderState::None => ReaderState::None,
        }
    }
}

/// Tab-separated payload of a meta line; empty when the line has none.
fn payload(line: &str) -> &str {
    line.splitn(2, '\t').nth(1).unwrap_or("")
}

/// Walks a corpus file and dispatches lifecycle notifications to the
/// registered callbacks.
#[derive(Default)]
pub struct CorpusReader<'a> {
    callbacks: Vec<&'a mut dyn CorpusCallback>,
    state: ReaderState,
}

impl<'a> CorpusReader<'a> {
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
            state: ReaderState::None,
        }
    }

    /// Registers a callback. Callbacks are notified in registration order.
    pub fn add_callback(&mut self, callback: &'a mut dyn CorpusCallback) {
        self.callbacks.push(callback);
    }

    /// Opens and reads the file at `path`, notifying all callbacks.
    pub fn read_file(&mut self, path: &Path) -> io::Result<()> {
        let file = File::open(path)?;
        let name = path.display().to_string();
        self.read_from(BufReader::new(file), &name)
    }

    /// Reads a corpus from any buffered source. `name` is only used for the
    /// `file_start` notification.
    pub fn read_from<R: BufRead>(&mut self, reader: R, name: &str) -> io::Result<()> {
        self.each(|cb| cb.file_start(name));
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if let Some(meta) = line.strip_prefix(META_HEAD) {
                if meta.starts_with(PAGE_LABEL) {
                    self.end_state(ReaderState::Page);
                    let title = payload(line).to_string();
                    self.each(|cb| cb.document_start(&title));
                    self.state = ReaderState::Page;
                } else if meta.starts_with(FIELD_LABEL) {
                    self.end_state(ReaderState::Field);
                    let field = payload(line).to_string();
                    self.each(|cb| cb.field_start(&field));
                    self.state = ReaderState::Field;
                } else if meta.starts_with(TEMPLATE_LABEL) {
                    let templates: Vec<String> =
                        payload(line).split(',').map(str::to_string).collect();
                    self.each(|cb| cb.templates(&templates));
                } else if meta.starts_with(REDIRECT_LABEL) {
                    self.each(|cb| cb.redirect());
                }
            } else if line.is_empty() {
                self.end_state(ReaderState::Sentence);
            } else {
                if self.state == ReaderState::Field {
                    self.each(|cb| cb.sentence_start());
                    self.state = ReaderState::Sentence;
                }
                if self.state == ReaderState::Sentence {
                    let attributes: Vec<String> = line.split('\t').map(str::to_string).collect();
                    self.each(|cb| cb.word(&attributes));
                }
            }
        }
        self.end_state(ReaderState::Page);
        self.each(|cb| cb.file_end());
        Ok(())
    }

    fn each<F: FnMut(&mut dyn CorpusCallback)>(&mut self, mut f: F) {
        for callback in self.callbacks.iter_mut() {
            f(&mut **callback);
        }
    }

    /// Closes `what` together with every state nested inside it, firing the
    /// closing callbacks innermost first.
    fn end_state(&mut self, what: ReaderState) {
        while self.state >= what {
            match self.state {
                ReaderState::Sentence => self.each(|cb| cb.sentence_end()),
                ReaderState::Field => self.each(|cb| cb.field_end()),
                ReaderState::Page => self.each(|cb| cb.document_end()),
                ReaderState::None => return,
            }
            self.state = self.state.pop();
        }
    }
}

/// Decodes one tab-column of every word through the KR decoder: the
/// combined-pipeline hookup where the corpus drives the decoder.
///
/// Failures are logged to stderr and reading continues; totals are kept for
/// a summary.
pub struct KrFieldCallback {
    column: usize,
    pub decoded: usize,
    pub failed: usize,
}

impl KrFieldCallback {
    pub fn new(column: usize) -> Self {
        Self {
            column,
            decoded: 0,
            failed: 0,
        }
    }
}

impl CorpusCallback for KrFieldCallback {
    fn word(&mut self, attributes: &[String]) {
        let Some(code) = attributes.get(self.column) else {
            return;
        };
        match decode(code) {
            Ok(_) => self.decoded += 1,
            Err(e) => {
                self.failed += 1;
                eprintln!("BAD KR CODE '{}': {}", code, e);
            }
        }
    }
}
