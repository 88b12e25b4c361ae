//! # Event Bus Module
//!
//! Publish/subscribe channel connecting the annotation session to whatever
//! hosts it (status bar, sidebar tree, toast notifications).
//!
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter by category and receive events synchronously, or
//!   poll a broadcast receiver from an async task
//!
//! ## Usage
//!
//! ```rust
//! use planmark_core::event_bus::{
//!     AppEvent, EventBus, EventCategory, EventFilter, StatusEvent, StatusLevel,
//! };
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Status]),
//!     |event| {
//!         if let AppEvent::Status(status) = event {
//!             println!("{}", status.description());
//!         }
//!     },
//! );
//!
//! bus.publish(AppEvent::Status(StatusEvent::Message {
//!     level: StatusLevel::Info,
//!     text: "Saved 3 annotations".to_string(),
//! }))
//! .ok();
//!
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
