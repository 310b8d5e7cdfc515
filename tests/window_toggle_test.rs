use std::convert::Infallible;

use futures::{FutureExt, StreamExt};
use rxwindow::prelude::*;

type E = &'static str;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Origin {
  Downstream,
  Window(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
  Window(usize),
  Next(i32),
  Error(E),
  Complete,
}

/// Records, in one timeline, what downstream and every window it received
/// observe.
#[derive(Default, Clone)]
struct Recorder {
  timeline: MutRc<Vec<(Origin, Event)>>,
  windows: MutRc<Vec<WindowObservable<i32, E>>>,
}

impl Recorder {
  fn observer(&self) -> impl Observer<WindowObservable<i32, E>, E> + 'static {
    let (timeline, windows) = (self.timeline.clone(), self.windows.clone());
    let (on_error, on_complete) = (self.timeline.clone(), self.timeline.clone());
    ObserverAll::new(
      move |window: WindowObservable<i32, E>| {
        let idx = windows.rc_deref().len();
        windows.rc_deref_mut().push(window.clone());
        timeline
          .rc_deref_mut()
          .push((Origin::Downstream, Event::Window(idx)));

        let origin = Origin::Window(idx);
        let (n, e, c) = (timeline.clone(), timeline.clone(), timeline.clone());
        window.subscribe_all(
          move |v| n.rc_deref_mut().push((origin, Event::Next(v))),
          move |err| e.rc_deref_mut().push((origin, Event::Error(err))),
          move || c.rc_deref_mut().push((origin, Event::Complete)),
        );
      },
      move |err| on_error.rc_deref_mut().push((Origin::Downstream, Event::Error(err))),
      move || on_complete.rc_deref_mut().push((Origin::Downstream, Event::Complete)),
    )
  }

  fn events_of(&self, origin: Origin) -> Vec<Event> {
    self
      .timeline
      .rc_deref()
      .iter()
      .filter(|(o, _)| *o == origin)
      .map(|(_, e)| e.clone())
      .collect()
  }

  fn window(&self, idx: usize) -> Vec<Event> { self.events_of(Origin::Window(idx)) }

  fn downstream(&self) -> Vec<Event> { self.events_of(Origin::Downstream) }

  fn handle(&self, idx: usize) -> WindowObservable<i32, E> { self.windows.rc_deref()[idx].clone() }

  fn len(&self) -> usize { self.timeline.rc_deref().len() }
}

fn subject_closers(n: usize) -> Vec<Subject<(), E>> { (0..n).map(|_| Subject::new()).collect() }

#[rxwindow_macro::test]
fn windows_follow_their_own_notifiers() {
  let clock = FakeClock::default();
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let rec = Recorder::default();

  let c_clock = clock.clone();
  let sub = source
    .clone()
    .window_toggle(openings.clone(), move |open: char| {
      let life = if open == 'A' { 15 } else { 1_000_000 };
      c_clock.delay::<E>(Duration::from_millis(life))
    })
    .actual_subscribe(rec.observer());

  let step = Duration::from_millis(5);
  clock.advance(step);
  source.next(1);
  clock.advance(step);
  openings.next('A');
  clock.advance(step);
  source.next(2);
  clock.advance(step);
  source.next(3);
  clock.advance(step);
  assert_eq!(rec.window(0), vec![Event::Next(2), Event::Next(3), Event::Complete]);

  clock.advance(step);
  openings.next('B');
  clock.advance(step);
  source.next(4);

  assert_eq!(rec.window(0), vec![Event::Next(2), Event::Next(3), Event::Complete]);
  assert_eq!(rec.window(1), vec![Event::Next(4)]);
  assert_eq!(rec.downstream(), vec![Event::Window(0), Event::Window(1)]);
  assert_eq!(sub.active_windows(), 1);
  assert!(!sub.is_closed());
}

#[rxwindow_macro::test]
fn selector_failure_errors_without_emitting_a_window() {
  let source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let rec = Recorder::default();

  let sub = source
    .clone()
    .try_window_toggle(openings.clone(), |_: char| -> Result<observable::Never<(), E>, E> {
      Err("selector")
    })
    .actual_subscribe(rec.observer());

  openings.next('A');
  assert_eq!(rec.downstream(), vec![Event::Error("selector")]);
  assert!(sub.is_closed());
  assert_eq!(source.observer_count(), 0);
  assert_eq!(openings.observer_count(), 0);

  openings.next('B');
  assert_eq!(rec.len(), 1);
}

#[rxwindow_macro::test]
fn exhausted_notifier_yields_an_empty_completed_window() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let rec = Recorder::default();

  let sub = source
    .clone()
    .window_toggle(openings.clone(), |_: char| observable::empty::<(), E>())
    .actual_subscribe(rec.observer());

  openings.next('A');
  source.next(1);
  assert_eq!(rec.downstream(), vec![Event::Window(0)]);
  assert_eq!(rec.window(0), vec![Event::Complete]);
  assert_eq!(sub.active_windows(), 0);

  let late = MutRc::own(vec![]);
  let (n, c) = (late.clone(), late.clone());
  rec
    .handle(0)
    .subscribe_all(move |v| n.rc_deref_mut().push(Some(v)), |_| {}, move || c.rc_deref_mut().push(None));
  assert_eq!(*late.rc_deref(), vec![None]);
}

#[rxwindow_macro::test]
fn notifier_emitting_during_subscribe_closes_the_window() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let rec = Recorder::default();

  let sub = source
    .clone()
    .window_toggle(openings.clone(), |_: char| observable::of::<(), E>(()))
    .actual_subscribe(rec.observer());

  openings.next('A');
  source.next(1);
  assert_eq!(rec.window(0), vec![Event::Complete]);
  assert_eq!(sub.active_windows(), 0);
}

#[rxwindow_macro::test]
fn already_completed_subject_closes_the_window() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let done = Subject::<(), E>::new();
  done.clone().complete();
  let rec = Recorder::default();

  let c_done = done.clone();
  let _sub = source
    .clone()
    .window_toggle(openings.clone(), move |_: char| c_done.clone())
    .actual_subscribe(rec.observer());

  openings.next('A');
  source.next(1);
  assert_eq!(rec.window(0), vec![Event::Complete]);
  assert_eq!(done.observer_count(), 0);
}

#[rxwindow_macro::test]
fn source_completion_completes_windows_before_downstream() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let rec = Recorder::default();

  let sub = source
    .clone()
    .window_toggle(openings.clone(), |_: char| observable::never::<(), E>())
    .actual_subscribe(rec.observer());

  openings.next('A');
  openings.next('B');
  source.next(1);
  source.clone().complete();

  let tail: Vec<_> = rec.timeline.rc_deref()[4..].to_vec();
  assert_eq!(
    tail,
    vec![
      (Origin::Window(0), Event::Complete),
      (Origin::Window(1), Event::Complete),
      (Origin::Downstream, Event::Complete),
    ]
  );
  assert!(sub.is_closed());
  assert_eq!(sub.active_windows(), 0);
  assert_eq!(openings.observer_count(), 0);

  source.next(2);
  openings.next('C');
  assert_eq!(rec.len(), 7);
}

#[rxwindow_macro::test]
fn unsubscribe_abandons_windows_silently() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let closers = subject_closers(2);
  let rec = Recorder::default();

  let c_closers = closers.clone();
  let sub = source
    .clone()
    .window_toggle(openings.clone(), move |open: char| c_closers[(open as u8 - b'A') as usize].clone())
    .actual_subscribe(rec.observer());

  openings.next('A');
  openings.next('B');
  source.next(1);
  let before = rec.len();

  sub.unsubscribe();
  assert_eq!(rec.len(), before);
  assert!(rec.handle(0).is_abandoned());
  assert!(rec.handle(1).is_abandoned());
  assert_eq!(source.observer_count(), 0);
  assert_eq!(openings.observer_count(), 0);
  assert!(closers.iter().all(|c| c.observer_count() == 0));

  source.next(2);
  openings.next('C');
  closers[0].clone().complete();
  assert_eq!(rec.len(), before);

  let late = CellRc::own(0);
  let (n, c) = (late.clone(), late.clone());
  rec.handle(0).subscribe_all(
    move |_| n.set(n.get() + 1),
    |_| {},
    move || c.set(c.get() + 1),
  );
  assert_eq!(late.get(), 0);
}

#[rxwindow_macro::test]
fn every_window_sees_exactly_one_terminal() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let closers = subject_closers(2);
  let rec = Recorder::default();

  let c_closers = closers.clone();
  let _sub = source
    .clone()
    .window_toggle(openings.clone(), move |open: char| c_closers[(open as u8 - b'A') as usize].clone())
    .actual_subscribe(rec.observer());

  openings.next('A');
  openings.next('B');
  let mut first = closers[0].clone();
  first.next(());
  first.next(());
  source.next(1);
  closers[0].clone().complete();
  source.clone().complete();
  closers[1].clone().next(());

  assert_eq!(rec.window(0), vec![Event::Complete]);
  assert_eq!(rec.window(1), vec![Event::Next(1), Event::Complete]);
  assert_eq!(rec.downstream().last(), Some(&Event::Complete));
}

#[rxwindow_macro::test]
fn values_reach_every_open_window_in_opening_order() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let rec = Recorder::default();

  let _sub = source
    .clone()
    .window_toggle(openings.clone(), |_: char| observable::never::<(), E>())
    .actual_subscribe(rec.observer());

  openings.next('A');
  source.next(1);
  openings.next('B');
  openings.next('C');
  let start = rec.len();
  source.next(2);

  let fanned: Vec<_> = rec.timeline.rc_deref()[start..].to_vec();
  assert_eq!(
    fanned,
    vec![
      (Origin::Window(0), Event::Next(2)),
      (Origin::Window(1), Event::Next(2)),
      (Origin::Window(2), Event::Next(2)),
    ]
  );
  assert_eq!(rec.window(0), vec![Event::Next(1), Event::Next(2)]);
}

#[rxwindow_macro::test]
fn closing_notifier_failure_errors_every_window() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let closers = subject_closers(3);
  let rec = Recorder::default();

  let c_closers = closers.clone();
  let sub = source
    .clone()
    .window_toggle(openings.clone(), move |open: char| c_closers[(open as u8 - b'A') as usize].clone())
    .actual_subscribe(rec.observer());

  openings.next('A');
  openings.next('B');
  openings.next('C');
  closers[2].clone().next(());
  source.next(1);
  closers[1].clone().error("boom");

  assert_eq!(rec.window(0), vec![Event::Next(1), Event::Error("boom")]);
  assert_eq!(rec.window(1), vec![Event::Next(1), Event::Error("boom")]);
  assert_eq!(rec.window(2), vec![Event::Complete]);
  assert_eq!(rec.downstream().last(), Some(&Event::Error("boom")));
  assert!(sub.is_closed());
  assert_eq!(source.observer_count(), 0);
  assert_eq!(openings.observer_count(), 0);
  assert!(closers.iter().all(|c| c.observer_count() == 0));
}

#[rxwindow_macro::test]
fn source_and_openings_failures_are_terminal() {
  for failing_openings in [false, true] {
    let source = Subject::<i32, E>::new();
    let openings = Subject::<char, E>::new();
    let rec = Recorder::default();

    let _sub = source
      .clone()
      .window_toggle(openings.clone(), |_: char| observable::never::<(), E>())
      .actual_subscribe(rec.observer());

    openings.clone().next('A');
    if failing_openings {
      openings.clone().error("openings");
      assert_eq!(rec.window(0), vec![Event::Error("openings")]);
      assert_eq!(rec.downstream().last(), Some(&Event::Error("openings")));
    } else {
      source.clone().error("source");
      assert_eq!(rec.window(0), vec![Event::Error("source")]);
      assert_eq!(rec.downstream().last(), Some(&Event::Error("source")));
    }
    assert_eq!(source.observer_count(), 0);
    assert_eq!(openings.observer_count(), 0);
  }
}

#[rxwindow_macro::test]
fn openings_completion_only_stops_new_windows() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let rec = Recorder::default();

  let sub = source
    .clone()
    .window_toggle(openings.clone(), |_: char| observable::never::<(), E>())
    .actual_subscribe(rec.observer());

  openings.next('A');
  openings.clone().complete();
  source.next(5);
  assert_eq!(rec.window(0), vec![Event::Next(5)]);
  assert!(!sub.is_closed());
  assert_eq!(openings.observer_count(), 0);

  source.clone().complete();
  assert_eq!(rec.window(0), vec![Event::Next(5), Event::Complete]);
  assert_eq!(rec.downstream(), vec![Event::Window(0), Event::Complete]);
}

#[rxwindow_macro::test]
fn late_window_subscriber_only_sees_later_values() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let rec = Recorder::default();

  let _sub = source
    .clone()
    .window_toggle(openings.clone(), |_: char| observable::never::<(), E>())
    .actual_subscribe(rec.observer());

  openings.next('A');
  source.next(1);
  let late = MutRc::own(vec![]);
  let c_late = late.clone();
  rec
    .handle(0)
    .subscribe_all(move |v| c_late.rc_deref_mut().push(v), |_| {}, || {});
  source.next(2);
  assert_eq!(*late.rc_deref(), vec![2]);
}

#[rxwindow_macro::test]
fn timer_driven_overlapping_windows() {
  let clock = FakeClock::default();
  let values = MutRc::own(Vec::<MutRc<Vec<usize>>>::new());

  let (c_clock, c_values) = (clock.clone(), values.clone());
  let _sub = clock
    .interval::<Infallible>(Duration::from_millis(3))
    .window_toggle(clock.interval(Duration::from_millis(10)), move |_: usize| {
      c_clock.delay::<Infallible>(Duration::from_millis(15))
    })
    .subscribe(move |window: WindowObservable<usize, Infallible>| {
      let collected = MutRc::own(vec![]);
      c_values.rc_deref_mut().push(collected.clone());
      window.subscribe(move |v| collected.rc_deref_mut().push(v));
    });

  clock.advance(Duration::from_millis(36));
  let values = values.rc_deref();
  assert_eq!(*values[0].rc_deref(), vec![3, 4, 5, 6, 7]);
  assert_eq!(*values[1].rc_deref(), vec![6, 7, 8, 9, 10]);
}

#[rxwindow_macro::test(local)]
async fn windows_as_streams() {
  let streams = MutRc::own(vec![]);
  let c_streams = streams.clone();

  observable::from_iter::<_, Infallible>(1..=3)
    .window_toggle(observable::of::<(), Infallible>(()), |_: ()| {
      observable::never::<(), Infallible>()
    })
    .subscribe(move |window: WindowObservable<i32, Infallible>| {
      c_streams.rc_deref_mut().push(window.into_stream())
    });

  let streams = std::mem::take(&mut *streams.rc_deref_mut());
  assert_eq!(streams.len(), 1);
  for stream in streams {
    let values: Vec<_> = stream.collect().await;
    assert_eq!(values, vec![Ok(1), Ok(2), Ok(3)]);
  }
}

#[rxwindow_macro::test]
fn window_subscriber_closes_its_own_window() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let closer = Subject::<(), E>::new();
  let seen = MutRc::own(vec![]);

  let (c_closer, c_seen) = (closer.clone(), seen.clone());
  let selected = closer.clone();
  let sub = source
    .clone()
    .window_toggle(openings.clone(), move |_: char| selected.clone())
    .subscribe_all(
      move |window: WindowObservable<i32, E>| {
        let (n, c, closer) = (c_seen.clone(), c_seen.clone(), c_closer.clone());
        window.subscribe_all(
          move |v| {
            n.rc_deref_mut().push(Event::Next(v));
            if v == 2 {
              closer.clone().next(());
            }
          },
          |_| {},
          move || c.rc_deref_mut().push(Event::Complete),
        );
      },
      |_| {},
      || {},
    );

  openings.next('A');
  source.next(1);
  source.next(2);
  source.next(3);
  assert_eq!(*seen.rc_deref(), vec![Event::Next(1), Event::Next(2), Event::Complete]);
  assert_eq!(sub.active_windows(), 0);
  assert_eq!(closer.observer_count(), 0);
}

#[rxwindow_macro::test]
fn downstream_completing_the_source_from_next() {
  let source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let events = MutRc::own(vec![]);

  let (c_source, n, c) = (source.clone(), events.clone(), events.clone());
  let sub = source
    .clone()
    .window_toggle(openings.clone(), |_: char| observable::never::<(), E>())
    .subscribe_all(
      move |window: WindowObservable<i32, E>| {
        n.rc_deref_mut().push("window");
        let w = n.clone();
        window.subscribe_all(|_| {}, |_| {}, move || w.rc_deref_mut().push("window complete"));
        c_source.clone().complete();
      },
      |_| {},
      move || c.rc_deref_mut().push("complete"),
    );

  openings.next('A');
  assert_eq!(*events.rc_deref(), vec!["window", "window complete", "complete"]);
  assert!(sub.is_closed());
  assert!(!sub.is_upstream_active());
  assert_eq!(openings.observer_count(), 0);
}

#[rxwindow_macro::test]
fn abandoned_window_stream_ends() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let rec = Recorder::default();

  let sub = source
    .clone()
    .window_toggle(openings.clone(), |_: char| observable::never::<(), E>())
    .actual_subscribe(rec.observer());

  openings.next('A');
  let mut stream = rec.handle(0).into_stream();
  source.next(1);
  sub.unsubscribe();

  assert_eq!(stream.next().now_or_never(), Some(Some(Ok(1))));
  assert_eq!(stream.next().now_or_never(), Some(None));
}

#[rxwindow_macro::test]
fn closing_notifier_failing_during_subscribe() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let rec = Recorder::default();

  let sub = source
    .clone()
    .window_toggle(openings.clone(), |_: char| observable::throw_err::<(), E>("closing"))
    .actual_subscribe(rec.observer());

  openings.next('A');
  assert_eq!(rec.downstream(), vec![Event::Error("closing")]);
  assert!(sub.is_closed());
  assert_eq!(source.observer_count(), 0);
  assert_eq!(openings.observer_count(), 0);

  openings.next('B');
  source.next(1);
  assert_eq!(rec.len(), 1);
}

#[rxwindow_macro::test]
fn selector_feeding_the_source() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let rec = Recorder::default();

  let c_source = source.clone();
  let _sub = source
    .clone()
    .window_toggle(openings.clone(), move |open: char| {
      if open == 'B' {
        c_source.clone().next(9);
      }
      observable::never::<(), E>()
    })
    .actual_subscribe(rec.observer());

  openings.next('A');
  openings.next('B');
  source.next(10);
  assert_eq!(rec.window(0), vec![Event::Next(9), Event::Next(10)]);
  assert_eq!(rec.window(1), vec![Event::Next(10)]);
}

#[rxwindow_macro::test]
fn synchronous_openings_open_before_the_source() {
  let mut source = Subject::<i32, E>::new();
  let rec = Recorder::default();

  let sub = source
    .clone()
    .window_toggle(observable::of::<char, E>('A'), |_: char| observable::never::<(), E>())
    .actual_subscribe(rec.observer());

  assert_eq!(rec.downstream(), vec![Event::Window(0)]);
  assert_eq!(sub.active_windows(), 1);
  assert!(sub.is_upstream_active());

  source.next(1);
  assert_eq!(rec.window(0), vec![Event::Next(1)]);
  assert!(!sub.is_closed());
}

#[rxwindow_macro::test]
fn notifier_derived_from_the_source() {
  let mut source = Subject::<i32, E>::new();
  let mut openings = Subject::<char, E>::new();
  let rec = Recorder::default();

  let c_source = source.clone();
  let sub = source
    .clone()
    .window_toggle(openings.clone(), move |_: char| c_source.clone())
    .actual_subscribe(rec.observer());

  openings.next('A');
  assert_eq!(source.observer_count(), 2);
  source.next(1);
  assert_eq!(rec.window(0), vec![Event::Next(1), Event::Complete]);
  assert_eq!(sub.active_windows(), 0);
  assert_eq!(source.observer_count(), 1);

  source.next(2);
  assert_eq!(rec.window(0).len(), 2);
}
