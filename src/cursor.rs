//! A single EBML element, and forward-only iteration over siblings within a
//! window.

use std::rc::Rc;

use crate::error::Result;
use crate::io::{ByteSource, SharedSource, WindowedSource};
use crate::vint::{read_vint, read_vint_known};

/// One EBML element: its id, declared size, and a window over its payload.
#[derive(Clone)]
pub struct EbmlElement {
    /// The element's id, with its vint length marker already stripped.
    pub id: u64,
    /// The element's declared payload size, in bytes.
    pub size: u64,
    /// A window bounding reads to this element's payload.
    pub payload: WindowedSource,
}

impl EbmlElement {
    /// Read one `(id, size)` pair from `source` at its current position, and
    /// construct a payload window immediately following it.
    ///
    /// Rejects an element whose size used the EBML "unknown size" reserved
    /// pattern: a window needs a concrete length.
    fn read_from(source: SharedSource) -> Result<Self> {
        let id = {
            let mut guard = source.borrow_mut();
            read_vint(&mut *guard)?.0
        };
        let size = {
            let mut guard = source.borrow_mut();
            read_vint_known(&mut *guard)?
        };
        let payload = WindowedSource::at_current(source, size)?;
        Ok(Self { id, size, payload })
    }

    /// View this element's payload window as a [`SharedSource`], so a cursor
    /// can iterate its children.
    pub fn children(&self) -> SharedSource {
        Rc::new(std::cell::RefCell::new(self.payload.clone()))
    }
}

/// Forward-only, non-restartable iteration over sibling EBML elements inside
/// a window.
///
/// Opening a cursor over an element's payload does not perturb the position
/// its parent cursor's sibling iteration relies on: every `advance` saves the
/// source's cursor, probes the next element, and restores it, so nested
/// cursors over the same `SharedSource` do not interfere with each other.
pub struct ElementCursor {
    source: SharedSource,
    next_pos: u64,
    current: Option<EbmlElement>,
    started: bool,
}

impl ElementCursor {
    /// Start a cursor over the children of `source`, positioned at the first
    /// element.
    pub fn new(source: SharedSource) -> Result<Self> {
        let mut cursor = Self {
            source,
            next_pos: 0,
            current: None,
            started: false,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    /// The element currently under the cursor, or `None` if iteration has
    /// reached the end of the window.
    pub fn current(&self) -> Option<&EbmlElement> {
        self.current.as_ref()
    }

    /// Whether the cursor has reached the end of the window (the sentinel
    /// "both invalid" equality point).
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Advance to the next sibling element. Once the end of the window is
    /// reached, further calls are no-ops.
    ///
    /// Reaching the end is only signalled by `next_pos` landing at or past
    /// the window's length — mirroring the original's window-seek guard.
    /// Any failure while actually reading an id/size pair inside the window
    /// (a truncated or corrupt file) propagates as a genuine error instead
    /// of being mistaken for a clean end of iteration.
    pub fn advance(&mut self) -> Result<()> {
        if self.started && self.current.is_none() {
            return Ok(());
        }
        self.started = true;

        let saved = self.source.borrow_mut().tell()?;
        let length = self.source.borrow_mut().length()?;

        if self.next_pos >= length {
            self.current = None;
            return Ok(());
        }

        self.source.borrow_mut().seek(self.next_pos)?;
        let element = EbmlElement::read_from(self.source.clone())?;
        self.next_pos = {
            let mut guard = self.source.borrow_mut();
            guard.tell()? + element.size
        };
        self.current = Some(element);

        self.source.borrow_mut().seek(saved)?;
        Ok(())
    }

    /// Advance until the current element's id matches one of `ids`, or the
    /// cursor reaches the end.
    pub fn until(&mut self, ids: &[u64]) -> Result<()> {
        while let Some(element) = self.current() {
            if ids.contains(&element.id) {
                return Ok(());
            }
            self.advance()?;
        }
        Ok(())
    }
}
