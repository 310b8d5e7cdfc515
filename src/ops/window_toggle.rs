//! `window_toggle`: windows opened by one stream and closed by notifiers
//! derived from the opening values.
//!
//! A coordinator sits between the source and the downstream observer. It
//! owns an arena of open windows; each entry pairs the window's [`Subject`]
//! with a [`MultiSubscription`] holding the subscription to its closing
//! notifier. The openings stream and every closing notifier report to the
//! coordinator through one [`Multiplexed`] observer, tagged with
//! [`FromOpenings`] or [`FromClosingNotifier`].
//!
//! Termination:
//!
//! - source completes: every window completes, then downstream completes.
//! - any participating stream or the closing selector fails: every window
//!   errors with the cause, then downstream errors.
//! - the subscription is unsubscribed: every window is abandoned with
//!   [`Subject::unsubscribe`], downstream hears nothing.
//!
//! Upstream subscriptions are cancelled before downstream is notified.
//! Completion of the openings stream only means no new window will open.
//!
//! The coordinator never holds its own state borrowed while calling out, so
//! the selector, the notifiers and window subscribers may synchronously feed
//! the pipeline. Downstream notifications raised while downstream is still
//! inside `next` are queued and delivered, in order, once it returns.

use std::{collections::VecDeque, rc::Rc};

use log::{debug, trace};
use smallvec::SmallVec;

use crate::{
  observable::{Observable, ObservableExt},
  observer::{Notification, Observer},
  rc::{CellRc, MutRc, RcDeref, RcDerefMut},
  subject::{Subject, SubjectSubscription},
  subscription::{DynamicSubscriptions, MultiSubscription, Subscription},
  type_hint::TypeHint,
};

/// Maps an opening value to the notifier that closes its window.
pub trait ClosingSelector<Err> {
  type Open;
  type NotifyItem;
  type Notifier;

  fn select(&self, open: Self::Open) -> Result<Self::Notifier, Err>;
}

pub struct SelectWithoutErr<F, Open, NotifyItem> {
  f: F,
  _hint: TypeHint<(Open, NotifyItem)>,
}

impl<F, Open, NotifyItem> SelectWithoutErr<F, Open, NotifyItem> {
  pub fn new(f: F) -> Self { SelectWithoutErr { f, _hint: TypeHint::new() } }
}

impl<F, Open, Notifier, NotifyItem, Err> ClosingSelector<Err> for SelectWithoutErr<F, Open, NotifyItem>
where
  F: Fn(Open) -> Notifier,
{
  type Open = Open;
  type NotifyItem = NotifyItem;
  type Notifier = Notifier;

  #[inline]
  fn select(&self, open: Open) -> Result<Notifier, Err> { Ok((self.f)(open)) }
}

pub struct SelectWithErr<F, Open, NotifyItem> {
  f: F,
  _hint: TypeHint<(Open, NotifyItem)>,
}

impl<F, Open, NotifyItem> SelectWithErr<F, Open, NotifyItem> {
  pub fn new(f: F) -> Self { SelectWithErr { f, _hint: TypeHint::new() } }
}

impl<F, Open, Notifier, NotifyItem, Err> ClosingSelector<Err> for SelectWithErr<F, Open, NotifyItem>
where
  F: Fn(Open) -> Result<Notifier, Err>,
{
  type Open = Open;
  type NotifyItem = NotifyItem;
  type Notifier = Notifier;

  #[inline]
  fn select(&self, open: Open) -> Result<Notifier, Err> { (self.f)(open) }
}

#[derive(Clone)]
pub struct WindowToggleOp<S, Openings, Sel> {
  source: S,
  openings: Openings,
  selector: Sel,
}

impl<S, Openings, Sel> WindowToggleOp<S, Openings, Sel> {
  pub(crate) fn new(source: S, openings: Openings, selector: Sel) -> Self {
    WindowToggleOp { source, openings, selector }
  }
}

/// The read-only view of a window handed downstream.
///
/// Subscribing to a window that already closed completes immediately; to a
/// window that failed, errors immediately; to an abandoned one, does nothing.
pub struct WindowObservable<Item, Err>(Subject<Item, Err>);

impl<Item, Err> Clone for WindowObservable<Item, Err> {
  fn clone(&self) -> Self { WindowObservable(self.0.clone()) }
}

impl<Item, Err> WindowObservable<Item, Err> {
  /// True once the window completed, failed or was abandoned.
  pub fn is_closed(&self) -> bool { self.0.is_stopped() }

  /// True when the window was abandoned instead of completed.
  pub fn is_abandoned(&self) -> bool { self.0.is_unsubscribed() }
}

impl<Item, Err, O> Observable<Item, Err, O> for WindowObservable<Item, Err>
where
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  Err: Clone + 'static,
{
  type Unsub = SubjectSubscription<Item, Err>;

  #[inline]
  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.0.actual_subscribe(observer) }
}

impl<Item, Err> ObservableExt<Item, Err> for WindowObservable<Item, Err> {}

struct WindowContext<Item, Err> {
  sink: Subject<Item, Err>,
  handle: MultiSubscription,
}

/// Routes notifications of an auxiliary stream to the coordinator, marked
/// with where they came from.
pub struct Multiplexed<C, Tag> {
  coordinator: C,
  tag: Tag,
}

/// Tag of the openings stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FromOpenings;

/// Tag of the closing notifier of the window with this id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FromClosingNotifier(pub usize);

pub struct SourceObserver<C>(C);

pub struct Coordinator<O, Item, Err, Sel> {
  /// `None` once a terminal transition ran.
  windows: MutRc<Option<DynamicSubscriptions<WindowContext<Item, Err>>>>,
  downstream: MutRc<Option<O>>,
  /// Downstream notifications waiting for the one in flight to return.
  backlog: MutRc<VecDeque<Notification<WindowObservable<Item, Err>, Err>>>,
  delivering: CellRc<bool>,
  selector: Rc<Sel>,
  /// The source and the openings handle.
  upstream: MultiSubscription,
  openings: MultiSubscription,
}

impl<O, Item, Err, Sel> Clone for Coordinator<O, Item, Err, Sel> {
  fn clone(&self) -> Self {
    Coordinator {
      windows: self.windows.clone(),
      downstream: self.downstream.clone(),
      backlog: self.backlog.clone(),
      delivering: self.delivering.clone(),
      selector: self.selector.clone(),
      upstream: self.upstream.clone(),
      openings: self.openings.clone(),
    }
  }
}

impl<O, Item, Err, Sel> Coordinator<O, Item, Err, Sel> {
  fn new(observer: O, selector: Sel) -> Self {
    Coordinator {
      windows: MutRc::own(Some(DynamicSubscriptions::default())),
      downstream: MutRc::own(Some(observer)),
      backlog: MutRc::own(VecDeque::new()),
      delivering: CellRc::own(false),
      selector: Rc::new(selector),
      upstream: MultiSubscription::default(),
      openings: MultiSubscription::default(),
    }
  }

  fn is_terminated(&self) -> bool { self.windows.rc_deref().is_none() }

  fn is_window_open(&self, id: usize) -> bool {
    self
      .windows
      .rc_deref()
      .as_ref()
      .map_or(false, |windows| windows.contains(id))
  }

  fn active_windows(&self) -> usize {
    self
      .windows
      .rc_deref()
      .as_ref()
      .map_or(0, |windows| windows.len())
  }

  fn subscribe_tagged<Src, T, Tag>(&self, source: Src, tag: Tag) -> Src::Unsub
  where
    Src: Observable<T, Err, Multiplexed<Self, Tag>>,
  {
    source.actual_subscribe(Multiplexed { coordinator: self.clone(), tag })
  }

  fn cancel(&self) {
    let windows = self.windows.rc_deref_mut().take();
    if let Some(mut windows) = windows {
      debug!("window_toggle cancelled, abandoning {} window(s)", windows.len());
      for WindowContext { sink, handle } in windows.drain() {
        sink.unsubscribe();
        handle.unsubscribe();
      }
    }
    self.upstream.clone().unsubscribe();
    let backlog = std::mem::take(&mut *self.backlog.rc_deref_mut());
    let downstream = self.downstream.rc_deref_mut().take();
    drop(backlog);
    drop(downstream);
  }
}

impl<O, Item, Err, Sel> Coordinator<O, Item, Err, Sel>
where
  O: Observer<WindowObservable<Item, Err>, Err>,
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  fn on_source(&self, notification: Notification<Item, Err>) {
    match notification {
      Notification::Next(value) => self.fan_out(value),
      Notification::Error(err) => self.error_all(err),
      Notification::Complete => self.complete_all(),
    }
  }

  fn on_closing_notifier(&self, id: usize, notification: Notification<(), Err>) {
    match notification {
      Notification::Next(()) | Notification::Complete => self.close_window(id),
      Notification::Error(err) => self.error_all(err),
    }
  }

  /// Delivers `value` to the windows open right now, in opening order.
  fn fan_out(&self, value: Item) {
    let sinks: SmallVec<[Subject<Item, Err>; 2]> = match self.windows.rc_deref().as_ref() {
      Some(windows) => windows.iter().map(|ctx| ctx.sink.clone()).collect(),
      None => return,
    };
    let mut iter = sinks.into_iter().peekable();
    while let Some(mut sink) = iter.next() {
      if iter.peek().is_some() {
        sink.next(value.clone());
      } else {
        sink.next(value);
        break;
      }
    }
  }

  fn emit_window(&self, window: WindowObservable<Item, Err>) {
    self.to_downstream(Notification::Next(window));
  }

  /// Delivers downstream notifications one at a time. A notification raised
  /// while downstream is busy waits in the backlog.
  fn to_downstream(&self, notification: Notification<WindowObservable<Item, Err>, Err>) {
    self.backlog.rc_deref_mut().push_back(notification);
    if self.delivering.get() {
      return;
    }
    self.delivering.set(true);
    loop {
      let notification = self.backlog.rc_deref_mut().pop_front();
      let Some(notification) = notification else { break };
      let observer = self.downstream.rc_deref_mut().take();
      let Some(observer) = observer else { continue };
      let observer = notification.deliver(observer);
      // Cancelled from inside `next`.
      let abandoned = self.is_terminated() && self.backlog.rc_deref().is_empty();
      if !abandoned {
        *self.downstream.rc_deref_mut() = observer;
      }
    }
    self.delivering.set(false);
  }

  fn close_window(&self, id: usize) {
    let context = self
      .windows
      .rc_deref_mut()
      .as_mut()
      .and_then(|windows| windows.remove(id));
    if let Some(WindowContext { sink, handle }) = context {
      trace!("window_toggle closed window {id}");
      sink.complete();
      handle.unsubscribe();
    }
  }

  fn complete_all(&self) {
    let windows = self.windows.rc_deref_mut().take();
    let Some(mut windows) = windows else { return };
    debug!("window_toggle completed, closing {} window(s)", windows.len());
    for WindowContext { sink, handle } in windows.drain() {
      sink.complete();
      handle.unsubscribe();
    }
    self.upstream.clone().unsubscribe();
    self.to_downstream(Notification::Complete);
  }

  fn error_all(&self, err: Err) {
    let windows = self.windows.rc_deref_mut().take();
    let Some(mut windows) = windows else { return };
    debug!("window_toggle failed, erroring {} window(s)", windows.len());
    for WindowContext { sink, handle } in windows.drain() {
      sink.error(err.clone());
      handle.unsubscribe();
    }
    self.upstream.clone().unsubscribe();
    self.to_downstream(Notification::Error(err));
  }
}

impl<O, Item, Err, Sel> Coordinator<O, Item, Err, Sel>
where
  O: Observer<WindowObservable<Item, Err>, Err>,
  Item: Clone + 'static,
  Err: Clone + 'static,
  Sel: ClosingSelector<Err>,
  Sel::Notifier: Observable<Sel::NotifyItem, Err, Multiplexed<Self, FromClosingNotifier>>,
  <Sel::Notifier as Observable<Sel::NotifyItem, Err, Multiplexed<Self, FromClosingNotifier>>>::Unsub:
    'static,
{
  fn on_openings(&self, notification: Notification<Sel::Open, Err>) {
    match notification {
      Notification::Next(open) => self.open_window(open),
      Notification::Error(err) => self.error_all(err),
      Notification::Complete => {
        trace!("window_toggle openings completed");
        self.openings.clone().unsubscribe();
      }
    }
  }

  /// Registers the window, subscribes its closing notifier, then reconciles
  /// with a notifier that already finished during the subscribe call.
  fn open_window(&self, open: Sel::Open) {
    if self.is_terminated() {
      return;
    }
    let notifier = match self.selector.select(open) {
      Ok(notifier) => notifier,
      Err(err) => {
        debug!("window_toggle closing selector failed");
        self.error_all(err);
        return;
      }
    };

    let sink = Subject::default();
    let handle = MultiSubscription::default();
    let id = {
      let mut windows = self.windows.rc_deref_mut();
      let Some(windows) = windows.as_mut() else { return };
      windows.add(WindowContext { sink: sink.clone(), handle: handle.clone() })
    };
    trace!("window_toggle opened window {id}");

    let unsub = self.subscribe_tagged::<_, Sel::NotifyItem, _>(notifier, FromClosingNotifier(id));
    let exhausted = unsub.is_closed();
    handle.add(unsub);
    if exhausted || handle.is_closed() {
      self.close_window(id);
    }

    self.emit_window(WindowObservable(sink));
  }
}

impl<O, Item, Err, Sel> Observer<Item, Err> for SourceObserver<Coordinator<O, Item, Err, Sel>>
where
  O: Observer<WindowObservable<Item, Err>, Err>,
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  fn next(&mut self, value: Item) { self.0.on_source(Notification::Next(value)) }

  fn error(self, err: Err) { self.0.on_source(Notification::Error(err)) }

  fn complete(self) { self.0.on_source(Notification::Complete) }

  fn is_finished(&self) -> bool { self.0.is_terminated() }
}

impl<O, Item, Err, Sel, Open> Observer<Open, Err>
  for Multiplexed<Coordinator<O, Item, Err, Sel>, FromOpenings>
where
  O: Observer<WindowObservable<Item, Err>, Err>,
  Item: Clone + 'static,
  Err: Clone + 'static,
  Sel: ClosingSelector<Err, Open = Open>,
  Sel::Notifier: Observable<
    Sel::NotifyItem,
    Err,
    Multiplexed<Coordinator<O, Item, Err, Sel>, FromClosingNotifier>,
  >,
  <Sel::Notifier as Observable<
    Sel::NotifyItem,
    Err,
    Multiplexed<Coordinator<O, Item, Err, Sel>, FromClosingNotifier>,
  >>::Unsub: 'static,
{
  fn next(&mut self, value: Open) { self.coordinator.on_openings(Notification::Next(value)) }

  fn error(self, err: Err) { self.coordinator.on_openings(Notification::Error(err)) }

  fn complete(self) { self.coordinator.on_openings(Notification::Complete) }

  fn is_finished(&self) -> bool { self.coordinator.is_terminated() }
}

impl<O, Item, Err, Sel, NotifyItem> Observer<NotifyItem, Err>
  for Multiplexed<Coordinator<O, Item, Err, Sel>, FromClosingNotifier>
where
  O: Observer<WindowObservable<Item, Err>, Err>,
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  fn next(&mut self, _: NotifyItem) {
    self
      .coordinator
      .on_closing_notifier(self.tag.0, Notification::Next(()))
  }

  fn error(self, err: Err) {
    self
      .coordinator
      .on_closing_notifier(self.tag.0, Notification::Error(err))
  }

  fn complete(self) {
    self
      .coordinator
      .on_closing_notifier(self.tag.0, Notification::Complete)
  }

  fn is_finished(&self) -> bool { !self.coordinator.is_window_open(self.tag.0) }
}

/// Unsubscribing abandons every open window and cancels all upstream
/// subscriptions without notifying downstream.
pub struct WindowToggleSubscription<O, Item, Err, Sel>(Coordinator<O, Item, Err, Sel>);

impl<O, Item, Err, Sel> WindowToggleSubscription<O, Item, Err, Sel> {
  /// Number of windows currently open.
  pub fn active_windows(&self) -> usize { self.0.active_windows() }

  /// True while the source or the openings stream is still subscribed.
  pub fn is_upstream_active(&self) -> bool { !self.0.upstream.is_closed() }
}

impl<O, Item, Err, Sel> Subscription for WindowToggleSubscription<O, Item, Err, Sel> {
  fn unsubscribe(self) { self.0.cancel() }

  fn is_closed(&self) -> bool { self.0.is_terminated() }
}

impl<Item, Err, O, S, Openings, Sel> Observable<WindowObservable<Item, Err>, Err, O>
  for WindowToggleOp<S, Openings, Sel>
where
  O: Observer<WindowObservable<Item, Err>, Err>,
  Item: Clone + 'static,
  Err: Clone + 'static,
  Sel: ClosingSelector<Err>,
  S: Observable<Item, Err, SourceObserver<Coordinator<O, Item, Err, Sel>>>,
  S::Unsub: 'static,
  Openings: Observable<Sel::Open, Err, Multiplexed<Coordinator<O, Item, Err, Sel>, FromOpenings>>,
  Openings::Unsub: 'static,
{
  type Unsub = WindowToggleSubscription<O, Item, Err, Sel>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let WindowToggleOp { source, openings, selector } = self;
    let coordinator = Coordinator::new(observer, selector);

    coordinator.upstream.add(coordinator.openings.clone());
    let openings_unsub = coordinator.subscribe_tagged::<_, Sel::Open, _>(openings, FromOpenings);
    coordinator.openings.add(openings_unsub);

    let source_unsub = source.actual_subscribe(SourceObserver(coordinator.clone()));
    coordinator.upstream.add(source_unsub);

    WindowToggleSubscription(coordinator)
  }
}

impl<Item, Err, S, Openings, Sel> ObservableExt<WindowObservable<Item, Err>, Err>
  for WindowToggleOp<S, Openings, Sel>
where
  S: ObservableExt<Item, Err>,
{
}
