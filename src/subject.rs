//! A multicast sink: an observer that is also an observable.
//!
//! Values pushed into a [`Subject`] reach whoever is subscribed at that
//! moment; nothing is replayed to later subscribers except the terminal
//! notification.
//!
//! ## Re-entrancy
//!
//! - `next` is not re-entrant. Pushing a value into a subject from inside one
//!   of its own observers **panics**.
//! - `error`/`complete`/`unsubscribe` and `subscribe` are allowed inside
//!   callbacks. While a broadcast is running they are queued and applied, in
//!   order, right after it ends. A subscriber added that way misses the
//!   in-progress emission; an observer unsubscribed that way may still
//!   receive it.
//!
//! ```rust,no_run
//! use std::convert::Infallible;
//!
//! use rxwindow::prelude::*;
//!
//! let subject = Subject::<i32, Infallible>::default();
//! let mut s_clone = subject.clone();
//! subject.clone().subscribe(move |v| {
//!   // panics: re-entrant emission
//!   s_clone.next(v + 1);
//! });
//! ```

mod subscribers;

use std::collections::VecDeque;

pub use subscribers::Subscribers;

use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxedObserver, Observer},
  rc::{MutRc, RcDeref, RcDerefMut},
  subscription::Subscription,
};

const REENTRANT_EMISSION: &str = "Subject emission is not re-entrant: `next` was called from \
                                  inside one of this subject's own observers";

pub struct Subject<Item, Err> {
  core: MutRc<SubjectCore<Item, Err>>,
  deferred: MutRc<Deferred<Item, Err>>,
}

struct SubjectCore<Item, Err> {
  observers: Subscribers<BoxedObserver<'static, Item, Err>>,
  status: SubjectStatus<Err>,
}

#[derive(Clone)]
enum SubjectStatus<Err> {
  Active,
  Completed,
  Errored(Err),
  Unsubscribed,
}

/// Changes requested while a broadcast holds the observers.
struct Deferred<Item, Err> {
  next_id: usize,
  ops: VecDeque<DeferredOp<Item, Err>>,
}

enum DeferredOp<Item, Err> {
  Add(usize, BoxedObserver<'static, Item, Err>),
  Remove(usize),
  Unsubscribe,
  Complete,
  Error(Err),
}

impl<Err> SubjectStatus<Err> {
  #[inline]
  fn is_active(&self) -> bool { matches!(self, SubjectStatus::Active) }

  /// Hands a late subscriber the terminal notification it missed.
  fn replay<Item, O: Observer<Item, Err>>(self, observer: O) {
    match self {
      SubjectStatus::Completed => observer.complete(),
      SubjectStatus::Errored(err) => observer.error(err),
      SubjectStatus::Active | SubjectStatus::Unsubscribed => {}
    }
  }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Subject {
      core: MutRc::own(SubjectCore {
        observers: Subscribers::default(),
        status: SubjectStatus::Active,
      }),
      deferred: MutRc::own(Deferred { next_id: 0, ops: VecDeque::new() }),
    }
  }
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject { core: self.core.clone(), deferred: self.deferred.clone() } }
}

impl<Item, Err> Subject<Item, Err> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Number of observers currently receiving values.
  pub fn observer_count(&self) -> usize {
    self
      .core
      .try_rc_deref()
      .map_or(0, |core| core.observers.len())
  }

  /// Abandons the subject: observers are dropped without any notification
  /// and later values are ignored. Later subscribers receive nothing.
  pub fn unsubscribe(self) {
    let dropped = match self.core.try_rc_deref_mut() {
      Some(mut core) => {
        if core.status.is_active() {
          core.status = SubjectStatus::Unsubscribed;
        }
        Some(std::mem::take(&mut core.observers))
      }
      None => {
        self
          .deferred
          .rc_deref_mut()
          .ops
          .push_back(DeferredOp::Unsubscribe);
        None
      }
    };
    drop(dropped);
  }

  /// True once the subject completed, failed or was unsubscribed.
  pub fn is_stopped(&self) -> bool {
    self
      .core
      .try_rc_deref()
      .map_or(false, |core| !core.status.is_active())
  }

  /// True once the subject was unsubscribed.
  pub fn is_unsubscribed(&self) -> bool {
    self
      .core
      .try_rc_deref()
      .map_or(false, |core| matches!(core.status, SubjectStatus::Unsubscribed))
  }

  /// Applies the subscription changes queued during a broadcast.
  fn flush_deferred(&self)
  where
    Err: Clone,
  {
    loop {
      let op = self.deferred.rc_deref_mut().ops.pop_front();
      match op {
        None => break,
        Some(DeferredOp::Add(id, observer)) => {
          let missed = {
            let mut core = self.core.rc_deref_mut();
            if core.status.is_active() {
              core.observers.insert(id, observer);
              None
            } else {
              Some((core.status.clone(), observer))
            }
          };
          if let Some((status, observer)) = missed {
            status.replay::<Item, _>(observer);
          }
        }
        Some(DeferredOp::Remove(id)) => {
          let removed = self.core.rc_deref_mut().observers.remove(id);
          drop(removed);
        }
        Some(DeferredOp::Unsubscribe) => self.clone().unsubscribe(),
        Some(DeferredOp::Complete) => self.stop(None),
        Some(DeferredOp::Error(err)) => self.stop(Some(err)),
      }
    }
  }

  /// Completes (`None`) or fails the subject. While a broadcast is running
  /// the transition is queued behind it.
  fn stop(&self, err: Option<Err>)
  where
    Err: Clone,
  {
    {
      let Some(mut core) = self.core.try_rc_deref_mut() else {
        let op = match err {
          Some(err) => DeferredOp::Error(err),
          None => DeferredOp::Complete,
        };
        self.deferred.rc_deref_mut().ops.push_back(op);
        return;
      };
      if !core.status.is_active() {
        return;
      }
      match err {
        Some(err) => {
          core.status = SubjectStatus::Errored(err.clone());
          core.observers.broadcast_error::<Item, Err>(err);
        }
        None => {
          core.status = SubjectStatus::Completed;
          core.observers.broadcast_complete::<Item, Err>();
        }
      }
    }
    self.flush_deferred();
  }
}

impl<Item, Err> Observer<Item, Err> for Subject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    {
      let Some(mut core) = self.core.try_rc_deref_mut() else {
        panic!("{}", REENTRANT_EMISSION)
      };
      if !core.status.is_active() {
        return;
      }
      core.observers.broadcast_value::<Item, Err>(value);
    }
    self.flush_deferred();
  }

  fn error(self, err: Err) { self.stop(Some(err)) }

  fn complete(self) { self.stop(None) }

  fn is_finished(&self) -> bool { self.is_stopped() }
}

impl<Item, Err, O> Observable<Item, Err, O> for Subject<Item, Err>
where
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  Err: Clone + 'static,
{
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let id = {
      let mut deferred = self.deferred.rc_deref_mut();
      let id = deferred.next_id;
      deferred.next_id += 1;
      id
    };
    let observer: BoxedObserver<'static, Item, Err> = Box::new(observer);
    let missed = match self.core.try_rc_deref_mut() {
      Some(mut core) => {
        if core.status.is_active() {
          core.observers.insert(id, observer);
          None
        } else {
          Some((core.status.clone(), observer))
        }
      }
      None => {
        self
          .deferred
          .rc_deref_mut()
          .ops
          .push_back(DeferredOp::Add(id, observer));
        None
      }
    };
    if let Some((status, observer)) = missed {
      status.replay::<Item, _>(observer);
    }

    SubjectSubscription { core: self.core, deferred: self.deferred, id }
  }
}

impl<Item, Err> ObservableExt<Item, Err> for Subject<Item, Err> {}

/// The registration of one observer on a [`Subject`].
pub struct SubjectSubscription<Item, Err> {
  core: MutRc<SubjectCore<Item, Err>>,
  deferred: MutRc<Deferred<Item, Err>>,
  id: usize,
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(self) {
    let removed = match self.core.try_rc_deref_mut() {
      Some(mut core) => core.observers.remove(self.id),
      None => {
        self
          .deferred
          .rc_deref_mut()
          .ops
          .push_back(DeferredOp::Remove(self.id));
        None
      }
    };
    drop(removed);
  }

  fn is_closed(&self) -> bool {
    self
      .core
      .try_rc_deref()
      .map_or(false, |core| !core.status.is_active())
  }
}
