//! The consuming side of a stream.
//!
//! An [`Observer`] receives any number of `next` calls followed by at most one
//! terminal call. Terminal methods take `self` by value, so an observer that
//! has seen `error` or `complete` no longer exists to receive anything else.

use std::convert::Infallible;

pub trait Observer<Item, Err> {
  fn next(&mut self, value: Item);

  /// Consumes the observer, no more values can be delivered after an error.
  fn error(self, err: Err);

  /// Consumes the observer, no more values can be delivered after completion.
  fn complete(self);

  /// Returns `true` once the observer will ignore any further value.
  ///
  /// Synchronous sources check this to stop emitting early.
  fn is_finished(&self) -> bool;
}

/// A single notification as a value.
///
/// Observers that forward notifications from several upstreams into one
/// place convert each call into a `Notification` and let the receiver match
/// on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

impl<Item, Err> Notification<Item, Err> {
  /// Replays this notification into `observer`.
  pub fn deliver<O: Observer<Item, Err>>(self, mut observer: O) -> Option<O> {
    match self {
      Notification::Next(v) => {
        observer.next(v);
        Some(observer)
      }
      Notification::Error(err) => {
        observer.error(err);
        None
      }
      Notification::Complete => {
        observer.complete();
        None
      }
    }
  }
}

/// Object safe mirror of [`Observer`], so observers can live in a `Box`.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_finished(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_error(self: Box<Self>, err: Err) { self.error(err); }
  fn box_complete(self: Box<Self>) { self.complete(); }
  fn box_is_finished(&self) -> bool { self.is_finished() }
}

pub type BoxedObserver<'a, Item, Err> = Box<dyn DynObserver<Item, Err> + 'a>;

impl<'a, Item, Err> Observer<Item, Err> for Box<dyn DynObserver<Item, Err> + 'a> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_finished(&self) -> bool { (**self).box_is_finished() }
}

/// Closure observer that only cares about values.
///
/// Only usable with streams that cannot fail, so an error can never be
/// silently dropped.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item> Observer<Item, Infallible> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, v: Item) { (self.0)(v); }

  #[inline]
  fn error(self, err: Infallible) { match err {} }

  #[inline]
  fn complete(self) {}

  #[inline]
  fn is_finished(&self) -> bool { false }
}

/// Closure observer with a handler for every notification.
#[derive(Clone)]
pub struct ObserverAll<N, E, C> {
  next: N,
  error: E,
  complete: C,
}

impl<N, E, C> ObserverAll<N, E, C> {
  #[inline]
  pub fn new(next: N, error: E, complete: C) -> Self { ObserverAll { next, error, complete } }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for ObserverAll<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value); }

  #[inline]
  fn error(self, err: Err) { (self.error)(err); }

  #[inline]
  fn complete(self) { (self.complete)(); }

  #[inline]
  fn is_finished(&self) -> bool { false }
}
