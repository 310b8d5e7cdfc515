use smallvec::SmallVec;

/// An insertion ordered arena whose entries keep a stable id for their whole
/// life.
///
/// Ids are never reused, so an id that outlived its entry simply finds
/// nothing. `reserve_id` + `insert` hands out the id before the entry exists,
/// for entries whose construction needs their own id.
///
/// ```rust
/// use rxwindow::subscription::DynamicSubscriptions;
///
/// let mut subs: DynamicSubscriptions<()> = DynamicSubscriptions::default();
/// let first = subs.add(());
///
/// let second = subs.reserve_id();
/// subs.insert(second, ());
/// assert_eq!(subs.len(), 2);
///
/// assert!(subs.remove(first).is_some());
/// assert!(subs.remove(first).is_none());
/// assert!(subs.contains(second));
/// assert_eq!(subs.len(), 1);
/// ```
pub struct DynamicSubscriptions<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicSubscriptions<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> DynamicSubscriptions<U> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Appends `item` and returns its id.
  #[inline]
  pub fn add(&mut self, item: U) -> usize {
    let id = self.reserve_id();
    self.items.push((id, item));
    id
  }

  #[inline]
  pub fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  /// Appends `item` under an id obtained from `reserve_id`, or from an
  /// allocator the owner keeps itself.
  #[inline]
  pub fn insert(&mut self, id: usize, item: U) {
    debug_assert!(!self.contains(id));
    self.items.push((id, item));
  }

  /// Removes the entry with `id`, keeping the order of the rest.
  pub fn remove(&mut self, id: usize) -> Option<U> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.items.iter().any(|(i, _)| *i == id) }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Removes every entry, in insertion order.
  #[inline]
  pub fn drain(&mut self) -> impl Iterator<Item = U> + '_ {
    self.items.drain(..).map(|(_, item)| item)
  }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = &U> { self.items.iter().map(|(_, item)| item) }

  #[inline]
  pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut U> {
    self.items.iter_mut().map(|(_, item)| item)
  }
}
