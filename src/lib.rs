//! # itsy
//!
//! A tiny, chainable DOM selection and manipulation library over an
//! in-memory HTML document.
//!
//! ## Features
//!
//! - Parse documents and fragments with a real HTML parser (html5ever)
//! - CSS selector matching backed by Servo's selector engine
//! - Chainable mutation of classes, content, and inline style
//! - Synthetic events with capture and bubble phases
//!
//! ## Quick Start
//!
//! ```
//! use itsy::Document;
//!
//! let doc = Document::parse(r#"<ul id="menu"><li>Home</li><li>Docs</li></ul>"#);
//!
//! doc.select("#menu li")
//!     .unwrap()
//!     .add_class("nav-item")
//!     .style(&[("color", "#333")]);
//!
//! assert_eq!(doc.select(".nav-item").unwrap().len(), 2);
//! ```
//!
//! ## Events
//!
//! Handlers attach to selections and fire when an event is dispatched at a
//! node, with the usual capture and bubble routing:
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use itsy::{Document, Event};
//!
//! let doc = Document::parse("<button>Go</button>");
//! let button = doc.select("button").unwrap();
//!
//! let clicks = Rc::new(Cell::new(0));
//! let seen = clicks.clone();
//! button.on("click", move |_event: &Event| seen.set(seen.get() + 1));
//!
//! doc.dispatch(button.first().unwrap(), "click");
//! assert_eq!(clicks.get(), 1);
//! ```

pub mod dom;
pub mod error;
pub mod select;

pub use dom::{Document, Event, EventHandler, EventPhase, NodeId};
pub use error::{Error, Result};
pub use select::{Child, Classes, Method, Op, Replacement, Selection, Slot};
