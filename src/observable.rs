//! The producing side of a stream.
//!
//! [`Observable`] is implemented once per observer type a source accepts,
//! which keeps every pipeline statically dispatched. [`ObservableExt`] hosts
//! the user facing methods.

mod fake_timer;
mod from_iter;
mod trivial;

pub use fake_timer::*;
pub use from_iter::*;
pub use trivial::*;

#[cfg(feature = "stream")]
use crate::ops::into_stream::{IntoStream, IntoStreamObserver};
use crate::{
  observer::{FnMutObserver, ObserverAll},
  ops::window_toggle::{SelectWithErr, SelectWithoutErr, WindowToggleOp},
  subscription::Subscription,
};

pub trait Observable<Item, Err, O> {
  type Unsub: Subscription;

  /// Connects `observer` to the source and starts the emission.
  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

/// Operators and subscribe helpers shared by every observable.
///
/// Every operator with a fallible user callback comes in two versions: the
/// plain one takes a callback that cannot fail, the `try_` one takes a
/// callback returning `Result<_, Err>` whose error terminates the stream.
pub trait ObservableExt<Item, Err>: Sized {
  /// Subscribes with a closure that only receives values. Only available for
  /// streams that cannot fail.
  fn subscribe<N>(self, next: N) -> <Self as Observable<Item, Err, FnMutObserver<N>>>::Unsub
  where
    N: FnMut(Item),
    Self: Observable<Item, Err, FnMutObserver<N>>,
  {
    self.actual_subscribe(FnMutObserver(next))
  }

  /// Subscribes with one closure per kind of notification.
  fn subscribe_all<N, E, C>(
    self, next: N, error: E, complete: C,
  ) -> <Self as Observable<Item, Err, ObserverAll<N, E, C>>>::Unsub
  where
    N: FnMut(Item),
    E: FnOnce(Err),
    C: FnOnce(),
    Self: Observable<Item, Err, ObserverAll<N, E, C>>,
  {
    self.actual_subscribe(ObserverAll::new(next, error, complete))
  }

  /// Splits this stream into windows.
  ///
  /// Every value of `openings` starts a window; `closing_selector` maps that
  /// value to a notifier whose first value or completion ends the window.
  /// Windows may overlap, each one receives the source values emitted while it
  /// is open. An error from any participating stream errors every open window
  /// and the window stream.
  ///
  /// ```
  /// use std::convert::Infallible;
  ///
  /// use rxwindow::prelude::*;
  ///
  /// let mut source = Subject::<i32, Infallible>::new();
  /// let mut openings = Subject::<(), Infallible>::new();
  /// let mut closings = Subject::<(), Infallible>::new();
  ///
  /// let sums = MutRc::own(vec![]);
  /// let c_closings = closings.clone();
  /// let c_sums = sums.clone();
  /// source
  ///   .clone()
  ///   .window_toggle(openings.clone(), move |_| c_closings.clone())
  ///   .subscribe(move |window| {
  ///     let sums = c_sums.clone();
  ///     let idx = sums.rc_deref().len();
  ///     sums.rc_deref_mut().push(0);
  ///     window.subscribe(move |v| sums.rc_deref_mut()[idx] += v);
  ///   });
  ///
  /// source.next(1);
  /// openings.next(());
  /// source.next(2);
  /// source.next(3);
  /// closings.next(());
  /// source.next(4);
  /// assert_eq!(*sums.rc_deref(), vec![5]);
  /// ```
  fn window_toggle<Open, Openings, F, Notifier, NotifyItem>(
    self, openings: Openings, closing_selector: F,
  ) -> WindowToggleOp<Self, Openings, SelectWithoutErr<F, Open, NotifyItem>>
  where
    Openings: ObservableExt<Open, Err>,
    F: Fn(Open) -> Notifier,
    Notifier: ObservableExt<NotifyItem, Err>,
  {
    WindowToggleOp::new(self, openings, SelectWithoutErr::new(closing_selector))
  }

  /// [`window_toggle`](ObservableExt::window_toggle) with a closing selector
  /// that may fail. An `Err` from the selector opens no window and errors
  /// the whole stream.
  fn try_window_toggle<Open, Openings, F, Notifier, NotifyItem>(
    self, openings: Openings, closing_selector: F,
  ) -> WindowToggleOp<Self, Openings, SelectWithErr<F, Open, NotifyItem>>
  where
    Openings: ObservableExt<Open, Err>,
    F: Fn(Open) -> Result<Notifier, Err>,
    Notifier: ObservableExt<NotifyItem, Err>,
  {
    WindowToggleOp::new(self, openings, SelectWithErr::new(closing_selector))
  }

  /// Turns the observable into a [`futures::Stream`] of `Result<Item, Err>`.
  /// Dropping the stream unsubscribes.
  #[cfg(feature = "stream")]
  fn into_stream(
    self,
  ) -> IntoStream<Item, Err, <Self as Observable<Item, Err, IntoStreamObserver<Item, Err>>>::Unsub>
  where
    Self: Observable<Item, Err, IntoStreamObserver<Item, Err>>,
  {
    IntoStream::new(self)
  }
}
