//! Bridge from push to pull: consume an observable, such as a window, as a
//! [`futures::Stream`].
//!
//! ```rust
//! use std::convert::Infallible;
//!
//! use futures::StreamExt;
//! use rxwindow::prelude::*;
//!
//! # async fn example() {
//! let mut stream = observable::of::<_, Infallible>(1).into_stream();
//! if let Some(Ok(value)) = stream.next().await {
//!   println!("Received: {value}");
//! }
//! # }
//! ```

use std::{
  collections::VecDeque,
  pin::Pin,
  task::{Context, Poll, Waker},
};

use futures::Stream;

use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutRc, RcDeref, RcDerefMut},
  subscription::{Subscription, SubscriptionGuard},
};

/// Notifications waiting to be polled.
#[doc(hidden)]
pub struct IntoStreamState<Item, Err> {
  queue: VecDeque<Result<Item, Err>>,
  waker: Option<Waker>,
  is_closed: bool,
}

impl<Item, Err> Default for IntoStreamState<Item, Err> {
  fn default() -> Self { Self { queue: VecDeque::new(), waker: None, is_closed: false } }
}

impl<Item, Err> IntoStreamState<Item, Err> {
  fn push(&mut self, value: Option<Result<Item, Err>>) {
    match value {
      Some(value) => self.queue.push_back(value),
      None => self.is_closed = true,
    }
    if let Some(waker) = self.waker.take() {
      waker.wake();
    }
  }
}

/// Yields `Ok` per value and one `Err` for an error, then ends. Completion
/// ends the stream once the buffered values are drained.
pub struct IntoStream<Item, Err, U: Subscription> {
  state: MutRc<IntoStreamState<Item, Err>>,
  _unsub: SubscriptionGuard<U>,
}

impl<Item, Err, U: Subscription> IntoStream<Item, Err, U> {
  pub fn new<S>(observable: S) -> Self
  where
    S: Observable<Item, Err, IntoStreamObserver<Item, Err>, Unsub = U>,
  {
    let state = MutRc::own(IntoStreamState::default());
    let unsub = observable.actual_subscribe(IntoStreamObserver { state: state.clone() });
    IntoStream { state, _unsub: unsub.unsubscribe_when_dropped() }
  }

  /// Number of notifications received but not polled yet.
  pub fn buffered(&self) -> usize { self.state.rc_deref().queue.len() }
}

impl<Item, Err, U: Subscription> Stream for IntoStream<Item, Err, U> {
  type Item = Result<Item, Err>;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let mut state = self.state.rc_deref_mut();
    if let Some(item) = state.queue.pop_front() {
      return Poll::Ready(Some(item));
    }
    if state.is_closed {
      return Poll::Ready(None);
    }
    state.waker = Some(cx.waker().clone());
    Poll::Pending
  }
}

#[doc(hidden)]
pub struct IntoStreamObserver<Item, Err> {
  state: MutRc<IntoStreamState<Item, Err>>,
}

impl<Item, Err> Observer<Item, Err> for IntoStreamObserver<Item, Err> {
  fn next(&mut self, value: Item) { self.state.rc_deref_mut().push(Some(Ok(value))); }

  fn error(self, err: Err) {
    let mut state = self.state.rc_deref_mut();
    state.push(Some(Err(err)));
    state.push(None);
  }

  fn complete(self) { self.state.rc_deref_mut().push(None); }

  fn is_finished(&self) -> bool {
    self
      .state
      .try_rc_deref()
      .map_or(false, |state| state.is_closed)
  }
}

/// An observer dropped without a terminal, as by an abandoned window, ends
/// the stream.
impl<Item, Err> Drop for IntoStreamObserver<Item, Err> {
  fn drop(&mut self) {
    if let Some(mut state) = self.state.try_rc_deref_mut() {
      if !state.is_closed {
        state.push(None);
      }
    }
  }
}
