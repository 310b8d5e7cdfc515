use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  subscription::Subscription,
  type_hint::TypeHint,
};

/// Completes as soon as it is subscribed, without emitting.
pub fn empty<Item, Err>() -> Empty<Item, Err> { Empty(TypeHint::new()) }

/// Neither emits, nor completes, nor errors.
pub fn never<Item, Err>() -> Never<Item, Err> { Never(TypeHint::new()) }

/// Errors with `err` as soon as it is subscribed.
pub fn throw_err<Item, Err>(err: Err) -> ThrowErr<Item, Err> { ThrowErr(err, TypeHint::new()) }

pub struct Empty<Item, Err>(TypeHint<(Item, Err)>);

pub struct Never<Item, Err>(TypeHint<(Item, Err)>);

pub struct ThrowErr<Item, Err>(Err, TypeHint<Item>);

impl<Item, Err> Clone for Empty<Item, Err> {
  fn clone(&self) -> Self { Empty(TypeHint::new()) }
}

impl<Item, Err> Clone for Never<Item, Err> {
  fn clone(&self) -> Self { Never(TypeHint::new()) }
}

impl<Item, Err: Clone> Clone for ThrowErr<Item, Err> {
  fn clone(&self) -> Self { ThrowErr(self.0.clone(), TypeHint::new()) }
}

impl<Item, Err, O> Observable<Item, Err, O> for Empty<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub { observer.complete() }
}

/// Holds on to the observer so its drop is tied to the subscription.
pub struct NeverSubscription<O>(Option<O>);

impl<O> Subscription for NeverSubscription<O> {
  fn unsubscribe(self) {}

  fn is_closed(&self) -> bool { self.0.is_none() }
}

impl<Item, Err, O> Observable<Item, Err, O> for Never<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = NeverSubscription<O>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { NeverSubscription(Some(observer)) }
}

impl<Item, Err, O> Observable<Item, Err, O> for ThrowErr<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub { observer.error(self.0) }
}

impl<Item, Err> ObservableExt<Item, Err> for Empty<Item, Err> {}

impl<Item, Err> ObservableExt<Item, Err> for Never<Item, Err> {}

impl<Item, Err> ObservableExt<Item, Err> for ThrowErr<Item, Err> {}
