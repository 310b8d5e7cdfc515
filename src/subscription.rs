//! Cancellation handles.
//!
//! Subscribing to an observable returns a [`Subscription`]. Unsubscribing
//! stops the registration it stands for; composite handles such as
//! [`MultiSubscription`] tear down every child they collected.

mod dynamic;
mod multi;

pub use dynamic::*;
pub use multi::*;

use crate::rc::{MutRc, RcDeref, RcDerefMut};

pub trait Subscription {
  /// Stops the registration. Consumes the handle; shared handles make later
  /// calls on their clones no-ops.
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;

  /// Ties the registration to a scope: the returned guard unsubscribes when
  /// it is dropped.
  ///
  /// **Attention:** if the guard is not bound to a variable it is dropped,
  /// and the subscription cancelled, right away.
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard(Some(self))
  }
}

/// Returned by sources that finish during `subscribe`.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<U: Subscription> Subscription for Option<U> {
  #[inline]
  fn unsubscribe(self) {
    if let Some(inner) = self {
      inner.unsubscribe()
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.as_ref().map_or(true, U::is_closed) }
}

/// A slot for a subscription that is stored before it exists.
impl<U: Subscription> Subscription for MutRc<Option<U>> {
  fn unsubscribe(self) {
    let inner = self.rc_deref_mut().take();
    inner.unsubscribe();
  }

  fn is_closed(&self) -> bool {
    self
      .try_rc_deref()
      .map_or(false, |inner| inner.is_closed())
  }
}

/// An RAII guard, the subscription is cancelled when the guard goes out of
/// scope.
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Gives the subscription back without cancelling it.
  pub fn into_inner(mut self) -> Option<T> { self.0.take() }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.unsubscribe()
    }
  }
}
