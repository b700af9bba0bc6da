//! Scripted in-memory [`RenderSession`] for unit tests.
//!
//! Models just enough of a slide deck to exercise the heuristics: selector
//! counts, computed sizes, meta tags, text, global functions and a "current
//! slide" cursor that function calls, dot clicks and key presses move.
//! `print_page` returns a real single-page PDF labelled with the slide that
//! was visible, so assembly order can be checked end to end.

use super::{CaptureOptions, ElementSize, RenderSession};
use crate::error::SessionError;
use crate::pipeline::format::PageDimensions;
use crate::pipeline::navigate::INDICATOR_SELECTOR;
use lopdf::{dictionary, Document, Object, Stream};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Something the session was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    Viewport(u32, u32),
    Call(String, usize),
    Click(String, usize),
    Key(String),
    Print(usize),
}

pub(crate) struct FakeSession {
    pub meta: HashMap<String, String>,
    pub sizes: HashMap<String, ElementSize>,
    pub counts: HashMap<String, usize>,
    pub texts: HashMap<String, String>,
    pub functions: Vec<String>,
    /// Slides the cursor can move across with keys.
    pub total: usize,
    /// Whether the page reacts to arrow keys.
    pub keys_move: bool,
    /// Every probe fails with a script error.
    pub broken_scripts: bool,
    /// Function calls throw.
    pub throwing_functions: bool,
    /// `print_page` fails on the n-th call (0-based).
    pub fail_print_at: Option<usize>,
    pub current: usize,
    pub actions: Vec<Action>,
    prints: usize,
    closed: Arc<AtomicBool>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            meta: HashMap::new(),
            sizes: HashMap::new(),
            counts: HashMap::new(),
            texts: HashMap::new(),
            functions: Vec::new(),
            total: 1,
            keys_move: true,
            broken_scripts: false,
            throwing_functions: false,
            fail_print_at: None,
            current: 0,
            actions: Vec::new(),
            prints: 0,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A deck with `n` elements matching `selector`.
    pub fn with_slides(selector: &str, n: usize) -> Self {
        let mut s = Self::new();
        s.counts.insert(selector.to_string(), n);
        s.total = n.max(1);
        s
    }

    pub fn with_dots(mut self, n: usize) -> Self {
        self.counts.insert(INDICATOR_SELECTOR.to_string(), n);
        self.total = self.total.max(n);
        self
    }

    pub fn with_function(mut self, name: &str) -> Self {
        self.functions.push(name.to_string());
        self
    }

    pub fn with_size(mut self, selector: &str, width: f64, height: f64) -> Self {
        self.sizes
            .insert(selector.to_string(), ElementSize { width, height });
        self
    }

    pub fn with_meta(mut self, name: &str, content: &str) -> Self {
        self.meta.insert(name.to_string(), content.to_string());
        self
    }

    pub fn with_text(mut self, selector: &str, text: &str) -> Self {
        self.texts.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    pub fn printed_slides(&self) -> Vec<usize> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Print(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Key(k) => Some(k.clone()),
                _ => None,
            })
            .collect()
    }

    fn probe(&self) -> Result<(), SessionError> {
        if self.broken_scripts {
            Err(SessionError::Script("ReferenceError: document is not defined".into()))
        } else {
            Ok(())
        }
    }
}

impl RenderSession for FakeSession {
    fn set_viewport(&mut self, dims: PageDimensions) -> Result<(), SessionError> {
        self.actions.push(Action::Viewport(dims.width, dims.height));
        Ok(())
    }

    fn meta_content(&self, name: &str) -> Result<Option<String>, SessionError> {
        self.probe()?;
        Ok(self.meta.get(name).cloned())
    }

    fn element_size(&self, selector: &str) -> Result<Option<ElementSize>, SessionError> {
        self.probe()?;
        Ok(self.sizes.get(selector).copied())
    }

    fn count_elements(&self, selector: &str) -> Result<usize, SessionError> {
        self.probe()?;
        Ok(self.counts.get(selector).copied().unwrap_or(0))
    }

    fn text_content(&self, selector: &str) -> Result<Option<String>, SessionError> {
        self.probe()?;
        Ok(self.texts.get(selector).cloned())
    }

    fn has_function(&self, name: &str) -> Result<bool, SessionError> {
        self.probe()?;
        Ok(self.functions.iter().any(|f| f == name))
    }

    fn call_function(&mut self, name: &str, index: usize) -> Result<(), SessionError> {
        self.actions.push(Action::Call(name.to_string(), index));
        if self.throwing_functions {
            return Err(SessionError::Script(format!("TypeError in {name}")));
        }
        if self.functions.iter().any(|f| f == name) {
            self.current = index;
        }
        Ok(())
    }

    fn click_element(&mut self, selector: &str, index: usize) -> Result<bool, SessionError> {
        self.probe()?;
        let available = self.counts.get(selector).copied().unwrap_or(0);
        if index < available {
            self.actions.push(Action::Click(selector.to_string(), index));
            self.current = index;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn press_key(&mut self, key: &str) -> Result<(), SessionError> {
        self.actions.push(Action::Key(key.to_string()));
        if self.keys_move {
            match key {
                "Home" => self.current = 0,
                "ArrowRight" => self.current = (self.current + 1).min(self.total - 1),
                _ => {}
            }
        }
        Ok(())
    }

    fn print_page(&mut self, options: &CaptureOptions) -> Result<Vec<u8>, SessionError> {
        let call = self.prints;
        self.prints += 1;
        if self.fail_print_at == Some(call) {
            return Err(SessionError::Print("Printing failed".into()));
        }
        self.actions.push(Action::Print(self.current));
        Ok(single_page_pdf(
            f64::from(options.width_px) * 0.75,
            f64::from(options.height_px) * 0.75,
            &format!("slide {}", self.current),
        ))
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// A minimal valid one-page PDF whose content stream shows `label`.
pub(crate) fn single_page_pdf(width_pt: f64, height_pt: f64, label: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = format!("BT /F1 18 Tf 72 72 Td ({label}) Tj ET").into_bytes();
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), Object::Real(width_pt as f32), Object::Real(height_pt as f32)],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("in-memory PDF save");
    buf
}
