use std::{
  cell::{Cell, Ref, RefCell, RefMut},
  ops::{Deref, DerefMut},
  rc::Rc,
};

/// Shared read access to a value behind a reference-counted cell.
pub trait RcDeref {
  type Target;
  type Guard<'a>: Deref<Target = Self::Target>
  where
    Self: 'a;

  fn rc_deref(&self) -> Self::Guard<'_>;

  /// Returns `None` while the value is mutably borrowed further up the stack.
  fn try_rc_deref(&self) -> Option<Self::Guard<'_>>;
}

/// Shared write access to a value behind a reference-counted cell.
pub trait RcDerefMut: RcDeref {
  type GuardMut<'a>: DerefMut<Target = Self::Target>
  where
    Self: 'a;

  fn rc_deref_mut(&self) -> Self::GuardMut<'_>;

  /// Returns `None` while the value is borrowed further up the stack.
  fn try_rc_deref_mut(&self) -> Option<Self::GuardMut<'_>>;
}

#[derive(Default)]
pub struct MutRc<T>(Rc<RefCell<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }
}

impl<T> RcDeref for MutRc<T> {
  type Target = T;
  type Guard<'a>
    = Ref<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref(&self) -> Ref<'_, T> { self.0.borrow() }

  #[inline]
  fn try_rc_deref(&self) -> Option<Ref<'_, T>> { self.0.try_borrow().ok() }
}

impl<T> RcDerefMut for MutRc<T> {
  type GuardMut<'a>
    = RefMut<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref_mut(&self) -> RefMut<'_, T> { self.0.borrow_mut() }

  #[inline]
  fn try_rc_deref_mut(&self) -> Option<RefMut<'_, T>> { self.0.try_borrow_mut().ok() }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> From<T> for MutRc<T> {
  #[inline]
  fn from(t: T) -> Self { Self::own(t) }
}

/// A shared `Copy` flag or counter.
#[derive(Default)]
pub struct CellRc<T>(Rc<Cell<T>>);

impl<T: Copy> CellRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(Cell::new(t))) }

  #[inline]
  pub fn get(&self) -> T { self.0.get() }

  #[inline]
  pub fn set(&self, t: T) { self.0.set(t) }
}

impl<T> Clone for CellRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}
