use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

/// Emits every value of `iter`, then completes. Never errors; `Err` is picked
/// by the pipeline it joins.
///
/// ```
/// use std::convert::Infallible;
///
/// use rxwindow::prelude::*;
///
/// observable::from_iter::<_, Infallible>(0..10).subscribe(|v| println!("{v}"));
/// ```
pub fn from_iter<Iter, Err>(iter: Iter) -> ObservableIter<Iter, Err>
where
  Iter: IntoIterator,
{
  ObservableIter(iter, TypeHint::new())
}

/// Emits `v` once, then completes.
pub fn of<Item, Err>(v: Item) -> ObservableIter<std::iter::Once<Item>, Err> {
  from_iter(std::iter::once(v))
}

pub struct ObservableIter<Iter, Err>(Iter, TypeHint<Err>);

impl<Iter: Clone, Err> Clone for ObservableIter<Iter, Err> {
  fn clone(&self) -> Self { ObservableIter(self.0.clone(), TypeHint::new()) }
}

impl<O, Iter, Err> Observable<Iter::Item, Err, O> for ObservableIter<Iter, Err>
where
  Iter: IntoIterator,
  O: Observer<Iter::Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    for v in self.0 {
      if observer.is_finished() {
        return;
      }
      observer.next(v);
    }
    observer.complete();
  }
}

impl<Iter, Err> ObservableExt<Iter::Item, Err> for ObservableIter<Iter, Err> where Iter: IntoIterator {}
