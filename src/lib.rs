//! # rxwindow: dynamic windowing for push-based streams
//!
//! A small, single-threaded reactive core built around one operator,
//! [`window_toggle`](observable::ObservableExt::window_toggle): every value of
//! an openings stream starts a window, a notifier derived from that value ends
//! it, and the source's values are forwarded to every window open at the time.
//!
//! ```rust
//! use std::convert::Infallible;
//!
//! use rxwindow::prelude::*;
//!
//! let clock = FakeClock::default();
//! let mut source = Subject::<i32, Infallible>::new();
//! let mut openings = Subject::<u64, Infallible>::new();
//!
//! let windows = MutRc::own(vec![]);
//! let c_windows = windows.clone();
//! let c_clock = clock.clone();
//! let _subscription = source
//!   .clone()
//!   .window_toggle(openings.clone(), move |ms| c_clock.delay(Duration::from_millis(ms)))
//!   .subscribe(move |window: WindowObservable<i32, Infallible>| {
//!     let values = MutRc::own(vec![]);
//!     c_windows.rc_deref_mut().push(values.clone());
//!     window.subscribe(move |v| values.rc_deref_mut().push(v));
//!   });
//!
//! openings.next(20);
//! source.next(1);
//! clock.advance(Duration::from_millis(20));
//! source.next(2);
//!
//! assert_eq!(*windows.rc_deref()[0].rc_deref(), vec![1]);
//! ```
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Connects an observer to a source |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Subject`] | Multicast sink, also the backing store of every window |
//!
//! ## Feature Flags
//!
//! - **`stream`** (default): `into_stream`, bridging observables to
//!   `futures::Stream`.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Subject`]: subject::Subject

#[cfg(test)]
#[macro_use]
extern crate bencher;

pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod subject;
pub mod subscription;
pub mod type_hint;

pub use std::time::{Duration, Instant};
