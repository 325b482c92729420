//! # Events Module
//!
//! Event-driven progress reporting for indexing passes.
//!
//! ## Design
//! The coordinator and the folder watcher emit events through channels,
//! so any UI (desktop shell, tray icon, web) can subscribe and show an
//! "indexing" indicator.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Indexing(IndexingEvent::PhaseChanged { phase, .. }) = event {
//!             println!("{}", phase);
//!         }
//!     }
//! });
//!
//! let coordinator = IndexingCoordinator::builder().events(sender) /* ... */ .build()?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
