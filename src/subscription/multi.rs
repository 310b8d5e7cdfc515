use smallvec::SmallVec;

use super::Subscription;
use crate::rc::{MutRc, RcDeref, RcDerefMut};

/// A composite handle that owns the teardown of its children.
///
/// Clones share one state. Unsubscribing any clone closes all of them and
/// unsubscribes every child once. A child added to an already closed handle is
/// unsubscribed on the spot, which covers registrations that only come back
/// after their scope ended.
#[derive(Clone, Default)]
pub struct MultiSubscription(MutRc<Teardown>);

#[derive(Default)]
struct Teardown {
  closed: bool,
  children: SmallVec<[Box<dyn Child>; 1]>,
}

/// Object safe view of a child; `Subscription::unsubscribe` takes `self`.
trait Child {
  fn unsubscribe_boxed(self: Box<Self>);
  fn is_child_closed(&self) -> bool;
}

impl<T: Subscription> Child for T {
  fn unsubscribe_boxed(self: Box<Self>) { (*self).unsubscribe() }

  fn is_child_closed(&self) -> bool { self.is_closed() }
}

impl MultiSubscription {
  pub fn add(&self, subscription: impl Subscription + 'static) {
    if subscription.is_closed() {
      return;
    }
    let rejected = {
      let mut inner = self.0.rc_deref_mut();
      if inner.closed {
        Some(subscription)
      } else {
        inner.children.retain(|child| !child.is_child_closed());
        inner.children.push(Box::new(subscription));
        None
      }
    };
    if let Some(subscription) = rejected {
      subscription.unsubscribe();
    }
  }

  /// Number of children still tracked.
  pub fn teardown_size(&self) -> usize { self.0.rc_deref().children.len() }
}

impl Subscription for MultiSubscription {
  fn unsubscribe(self) {
    let children = {
      let mut inner = self.0.rc_deref_mut();
      if inner.closed {
        return;
      }
      inner.closed = true;
      std::mem::take(&mut inner.children)
    };
    for child in children {
      child.unsubscribe_boxed();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}
