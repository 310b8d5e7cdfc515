//! Virtual time for deterministic timeline tests.
//!
//! Timers created by a [`FakeClock`] only fire when the clock is advanced,
//! in due order, each one seeing the virtual instant it was due at.

use std::collections::VecDeque;

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{CellRc, MutRc, RcDeref, RcDerefMut},
  subscription::Subscription,
  type_hint::TypeHint,
  Duration, Instant,
};

#[derive(Clone)]
pub struct FakeClock(MutRc<ClockState>);

struct ClockState {
  now: Instant,
  next_id: usize,
  timers: VecDeque<Timer>,
}

struct Timer {
  id: usize,
  at: Instant,
  task: Box<dyn TimerTask>,
}

trait TimerTask {
  /// Runs the task due at `at`, returning the task again if it wants to run
  /// once more, together with its next due instant.
  fn fire(self: Box<Self>, at: Instant) -> Option<(Instant, Box<dyn TimerTask>)>;
}

impl Default for FakeClock {
  fn default() -> Self {
    let state = ClockState { now: Instant::now(), next_id: 0, timers: VecDeque::new() };
    FakeClock(MutRc::own(state))
  }
}

impl FakeClock {
  pub fn now(&self) -> Instant { self.0.rc_deref().now }

  /// Time elapsed since `origin`, handy for asserting timelines.
  pub fn since(&self, origin: Instant) -> Duration { self.now().saturating_duration_since(origin) }

  /// Emits `0, 1, 2, ...` every `period`, never completes.
  pub fn interval<Err>(&self, period: Duration) -> IntervalObservable<Err> {
    IntervalObservable { period, clock: self.clone(), _hint: TypeHint::new() }
  }

  /// Emits the instant it fired at after `delay`, then completes.
  pub fn delay<Err>(&self, delay: Duration) -> DelayObservable<Err> {
    DelayObservable { delay, clock: self.clone(), _hint: TypeHint::new() }
  }

  /// Number of timers still waiting to fire.
  pub fn pending_timers(&self) -> usize { self.0.rc_deref().timers.len() }

  /// Moves virtual time forward by `duration`, firing every timer due at or
  /// before the new instant.
  pub fn advance(&self, duration: Duration) {
    let to = self.now() + duration;
    while let Some(Timer { id, at, task }) = self.pop_due(to) {
      if let Some((at, task)) = task.fire(at) {
        self.schedule(Timer { id, at, task });
      }
    }
    self.0.rc_deref_mut().now = to;
  }

  fn pop_due(&self, to: Instant) -> Option<Timer> {
    let mut state = self.0.rc_deref_mut();
    if state.timers.front()?.at > to {
      return None;
    }
    let timer = state.timers.pop_front()?;
    state.now = timer.at;
    Some(timer)
  }

  /// Timers due at the same instant fire in the order they were scheduled.
  fn schedule(&self, timer: Timer) {
    let mut state = self.0.rc_deref_mut();
    let position = state.timers.partition_point(|t| t.at <= timer.at);
    state.timers.insert(position, timer);
  }

  fn start(
    &self, after: Duration, task: Box<dyn TimerTask>, cancelled: CellRc<bool>,
  ) -> TimerSubscription {
    let id = {
      let mut state = self.0.rc_deref_mut();
      state.next_id += 1;
      state.next_id
    };
    let at = self.now() + after;
    self.schedule(Timer { id, at, task });
    TimerSubscription { clock: self.clone(), id, cancelled }
  }

  /// Takes a pending timer out of the queue. A timer that is firing right
  /// now is not queued and stops on its own.
  fn cancel(&self, id: usize) {
    let removed = {
      let mut state = self.0.rc_deref_mut();
      let position = state.timers.iter().position(|t| t.id == id);
      position.and_then(|position| state.timers.remove(position))
    };
    drop(removed);
  }
}

/// Cancels a timer created by a [`FakeClock`]. The timer and the observer it
/// holds are released immediately.
#[derive(Clone)]
pub struct TimerSubscription {
  clock: FakeClock,
  id: usize,
  cancelled: CellRc<bool>,
}

impl Subscription for TimerSubscription {
  fn unsubscribe(self) {
    if self.cancelled.get() {
      return;
    }
    self.cancelled.set(true);
    self.clock.cancel(self.id);
  }

  fn is_closed(&self) -> bool { self.cancelled.get() }
}

struct IntervalTask<O, Err> {
  observer: O,
  period: Duration,
  seq: usize,
  cancelled: CellRc<bool>,
  _hint: TypeHint<Err>,
}

impl<O, Err> TimerTask for IntervalTask<O, Err>
where
  O: Observer<usize, Err> + 'static,
  Err: 'static,
{
  fn fire(mut self: Box<Self>, at: Instant) -> Option<(Instant, Box<dyn TimerTask>)> {
    if self.cancelled.get() || self.observer.is_finished() {
      return None;
    }
    let seq = self.seq;
    self.seq += 1;
    self.observer.next(seq);
    if self.cancelled.get() {
      return None;
    }
    Some((at + self.period, self))
  }
}

struct DelayTask<O, Err> {
  observer: O,
  cancelled: CellRc<bool>,
  _hint: TypeHint<Err>,
}

impl<O, Err> TimerTask for DelayTask<O, Err>
where
  O: Observer<Instant, Err> + 'static,
  Err: 'static,
{
  fn fire(self: Box<Self>, at: Instant) -> Option<(Instant, Box<dyn TimerTask>)> {
    let DelayTask { mut observer, cancelled, .. } = *self;
    if cancelled.get() {
      return None;
    }
    cancelled.set(true);
    observer.next(at);
    observer.complete();
    None
  }
}

pub struct IntervalObservable<Err> {
  period: Duration,
  clock: FakeClock,
  _hint: TypeHint<Err>,
}

pub struct DelayObservable<Err> {
  delay: Duration,
  clock: FakeClock,
  _hint: TypeHint<Err>,
}

impl<Err> Clone for IntervalObservable<Err> {
  fn clone(&self) -> Self {
    IntervalObservable { period: self.period, clock: self.clock.clone(), _hint: TypeHint::new() }
  }
}

impl<Err> Clone for DelayObservable<Err> {
  fn clone(&self) -> Self {
    DelayObservable { delay: self.delay, clock: self.clock.clone(), _hint: TypeHint::new() }
  }
}

impl<Err, O> Observable<usize, Err, O> for IntervalObservable<Err>
where
  O: Observer<usize, Err> + 'static,
  Err: 'static,
{
  type Unsub = TimerSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let cancelled = CellRc::own(false);
    let task = IntervalTask {
      observer,
      period: self.period,
      seq: 0,
      cancelled: cancelled.clone(),
      _hint: TypeHint::<Err>::new(),
    };
    self.clock.start(self.period, Box::new(task), cancelled)
  }
}

impl<Err, O> Observable<Instant, Err, O> for DelayObservable<Err>
where
  O: Observer<Instant, Err> + 'static,
  Err: 'static,
{
  type Unsub = TimerSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let cancelled = CellRc::own(false);
    let task = DelayTask { observer, cancelled: cancelled.clone(), _hint: TypeHint::<Err>::new() };
    self.clock.start(self.delay, Box::new(task), cancelled)
  }
}

impl<Err> ObservableExt<usize, Err> for IntervalObservable<Err> {}

impl<Err> ObservableExt<Instant, Err> for DelayObservable<Err> {}
