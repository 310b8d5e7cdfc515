//! Re-exports of everything needed to build and subscribe a pipeline.

#[cfg(feature = "stream")]
pub use crate::ops::into_stream::{IntoStream, IntoStreamObserver};
pub use crate::{
  observable::{self, FakeClock, Observable, ObservableExt},
  observer::*,
  ops::window_toggle::{
    ClosingSelector, FromClosingNotifier, FromOpenings, WindowObservable, WindowToggleOp,
    WindowToggleSubscription,
  },
  rc::{CellRc, MutRc, RcDeref, RcDerefMut},
  subject::*,
  subscription::*,
  type_hint::TypeHint,
  Duration, Instant,
};
