//! Forward-only reader over the gzip-compressed DBLP dump.
//!
//! Only two element kinds produce events: every `author` (at its closing tag)
//! and every `www` record (at its closing tag, after the events of its own
//! authors). Nothing of a closed element is kept once its event is handed out:
//! the read buffer is cleared after every XML event and the only accumulated
//! state is the currently open `www` record, so memory follows the depth and
//! width of the open subtree instead of the size of the document.

use crate::config::{AUTHOR_TAG, HOMEPAGE_TAG, READ_BUFFER_SIZE};
use crate::dtd::Dtd;
use crate::models::{AuthorElement, HomepageElement, RawElement};
use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Fatal problems with the input document. Any of these invalidates the run.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML at byte {position}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
    #[error("element <{name}> at byte {position} is not declared in the DTD")]
    UndeclaredElement { name: String, position: u64 },
    #[error("invalid DOCTYPE internal subset at byte {position}: {message}")]
    Doctype { position: u64, message: String },
    #[error("document ended with <{open}> still open")]
    UnexpectedEof { open: String },
}

pub type GzXmlParser = StreamParser<BufReader<MultiGzDecoder<File>>>;

struct OpenAuthor {
    depth: usize,
    text: String,
    orcid: Option<String>,
}

enum ChildKind {
    Url,
    Note(Option<String>),
}

/// A direct `url` or `note` child of the open `www` record.
struct OpenChild {
    depth: usize,
    kind: ChildKind,
    text: String,
}

struct OpenHomepage {
    depth: usize,
    element: HomepageElement,
    child: Option<OpenChild>,
}

impl OpenHomepage {
    fn retained_bytes(&self) -> usize {
        let element = &self.element;
        element.key.as_ref().map_or(0, String::capacity)
            + element.authors.iter().map(String::capacity).sum::<usize>()
            + element.urls.iter().map(String::capacity).sum::<usize>()
            + element
                .notes
                .iter()
                .map(|(kind, text)| kind.as_ref().map_or(0, String::capacity) + text.capacity())
                .sum::<usize>()
            + self.child.as_ref().map_or(0, |c| c.text.capacity())
    }
}

pub struct StreamParser<R: BufRead> {
    reader: Reader<R>,
    dtd: Dtd,
    buf: Vec<u8>,
    open: Vec<Vec<u8>>,
    author: Option<OpenAuthor>,
    homepage: Option<OpenHomepage>,
    peak_retained: usize,
    finished: bool,
}

impl GzXmlParser {
    pub fn open(path: &Path, dtd: Dtd) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open dump: {:?}", path))?;
        let decoder = MultiGzDecoder::new(file);
        Ok(Self::from_reader(
            BufReader::with_capacity(READ_BUFFER_SIZE, decoder),
            dtd,
        ))
    }
}

impl<R: BufRead> StreamParser<R> {
    pub fn from_reader(input: R, dtd: Dtd) -> Self {
        let mut reader = Reader::from_reader(input);
        // alias text must survive byte for byte, surrounding whitespace included
        reader.trim_text(false);
        reader.expand_empty_elements(true);
        reader.check_end_names(true);

        Self {
            reader,
            dtd,
            buf: Vec::new(),
            open: Vec::new(),
            author: None,
            homepage: None,
            peak_retained: 0,
            finished: false,
        }
    }

    /// Bytes currently held for parsing state: read buffer, open element
    /// names, the open author and the open `www` record.
    pub fn retained_bytes(&self) -> usize {
        self.buf.capacity()
            + self.open.iter().map(Vec::capacity).sum::<usize>()
            + self.author.as_ref().map_or(0, |a| {
                a.text.capacity() + a.orcid.as_ref().map_or(0, String::capacity)
            })
            + self.homepage.as_ref().map_or(0, OpenHomepage::retained_bytes)
    }

    /// Highest value `retained_bytes` reached so far.
    pub fn peak_retained_bytes(&self) -> usize {
        self.peak_retained
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn byte_position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    fn xml_error(&self, source: quick_xml::Error) -> ParseError {
        ParseError::Xml {
            position: self.byte_position(),
            source,
        }
    }

    fn unescape_text(&self, text: &BytesText) -> Result<String, ParseError> {
        let dtd = &self.dtd;
        text.unescape_with(|entity| dtd.resolve_entity(entity))
            .map(|t| t.into_owned())
            .map_err(|e| self.xml_error(e))
    }

    fn attribute(&self, start: &BytesStart, name: &[u8]) -> Result<Option<String>, ParseError> {
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.xml_error(e.into()))?;
            if attr.key.as_ref() == name {
                let dtd = &self.dtd;
                let value = attr
                    .unescape_value_with(|entity| dtd.resolve_entity(entity))
                    .map_err(|e| self.xml_error(e))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    fn on_start(&mut self, start: &BytesStart) -> Result<(), ParseError> {
        let name = start.name().as_ref().to_vec();
        if !self.dtd.declares_element(&name) {
            return Err(ParseError::UndeclaredElement {
                name: String::from_utf8_lossy(&name).into_owned(),
                position: self.byte_position(),
            });
        }

        let depth = self.open.len() + 1;

        if name == HOMEPAGE_TAG && self.homepage.is_none() {
            let key = self.attribute(start, b"key")?;
            self.homepage = Some(OpenHomepage {
                depth,
                element: HomepageElement {
                    key,
                    ..Default::default()
                },
                child: None,
            });
        } else if name == AUTHOR_TAG && self.author.is_none() {
            let orcid = self.attribute(start, b"orcid")?;
            self.author = Some(OpenAuthor {
                depth,
                text: String::new(),
                orcid,
            });
        } else if name == b"url" || name == b"note" {
            let note_type = if name == b"note" {
                self.attribute(start, b"type")?
            } else {
                None
            };
            if let Some(homepage) = self.homepage.as_mut() {
                if homepage.child.is_none() && depth == homepage.depth + 1 {
                    let kind = if name == b"url" {
                        ChildKind::Url
                    } else {
                        ChildKind::Note(note_type)
                    };
                    homepage.child = Some(OpenChild {
                        depth,
                        kind,
                        text: String::new(),
                    });
                }
            }
        }

        self.open.push(name);
        Ok(())
    }

    /// Only direct text nodes count; text inside markup nested in an
    /// `author`, `url` or `note` is dropped.
    fn on_text(&mut self, text: &str) {
        let depth = self.depth();
        if let Some(author) = self.author.as_mut().filter(|a| a.depth == depth) {
            author.text.push_str(text);
        }
        if let Some(child) = self
            .homepage
            .as_mut()
            .and_then(|h| h.child.as_mut())
            .filter(|c| c.depth == depth)
        {
            child.text.push_str(text);
        }
    }

    fn on_end(&mut self) -> Option<RawElement> {
        let depth = self.open.len();
        self.open.pop();

        if let Some(homepage) = self.homepage.as_mut() {
            if homepage.child.as_ref().is_some_and(|c| c.depth == depth) {
                if let Some(child) = homepage.child.take() {
                    match child.kind {
                        ChildKind::Url => homepage.element.urls.push(child.text),
                        ChildKind::Note(kind) => homepage.element.notes.push((kind, child.text)),
                    }
                }
                return None;
            }
        }

        if self.author.as_ref().is_some_and(|a| a.depth == depth) {
            let author = self.author.take()?;
            if let Some(homepage) = self.homepage.as_mut() {
                if depth == homepage.depth + 1 {
                    homepage.element.authors.push(author.text.clone());
                }
            }
            return Some(RawElement::Author(AuthorElement {
                text: author.text,
                orcid: author.orcid,
            }));
        }

        if self.homepage.as_ref().is_some_and(|h| h.depth == depth) {
            let homepage = self.homepage.take()?;
            return Some(RawElement::Homepage(homepage.element));
        }

        None
    }

    fn next_element(&mut self) -> Result<Option<RawElement>, ParseError> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_event_into(&mut self.buf)
                .map(Event::into_owned);
            let event = match read {
                Ok(event) => event,
                Err(e) => return Err(self.xml_error(e)),
            };

            let produced = match event {
                Event::Start(start) => {
                    self.on_start(&start)?;
                    None
                }
                Event::End(_) => self.on_end(),
                Event::Text(text) => {
                    let unescaped = self.unescape_text(&text)?;
                    self.on_text(&unescaped);
                    None
                }
                Event::CData(data) => {
                    let raw = data.into_inner();
                    let text = String::from_utf8_lossy(&raw).into_owned();
                    self.on_text(&text);
                    None
                }
                Event::DocType(doctype) => {
                    let doctype = String::from_utf8_lossy(&doctype).into_owned();
                    self.read_internal_subset(&doctype)?;
                    None
                }
                Event::Eof => {
                    if let Some(open) = self.open.last() {
                        debug!(depth = self.depth(), "Dump ended inside an open element");
                        return Err(ParseError::UnexpectedEof {
                            open: String::from_utf8_lossy(open).into_owned(),
                        });
                    }
                    return Ok(None);
                }
                _ => None,
            };

            self.peak_retained = self.peak_retained.max(self.retained_bytes());

            if produced.is_some() {
                return Ok(produced);
            }
        }
    }

    /// Entities declared inline in `<!DOCTYPE dblp [ ... ]>` count like DTD ones.
    fn read_internal_subset(&mut self, doctype: &str) -> Result<(), ParseError> {
        let (Some(open), Some(close)) = (doctype.find('['), doctype.rfind(']')) else {
            return Ok(());
        };
        if close <= open {
            return Ok(());
        }
        let subset = Dtd::parse(&doctype[open + 1..close]).map_err(|e| ParseError::Doctype {
            position: self.byte_position(),
            message: format!("{:#}", e),
        })?;
        self.dtd.extend(subset);
        Ok(())
    }
}

impl<R: BufRead> Iterator for StreamParser<R> {
    type Item = Result<RawElement, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
