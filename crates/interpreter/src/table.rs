use rustc_hash::FxHashMap;
use shade_builtins::{ClosureFn, NativeFn, Scalar};
use smartstring::alias::String as SmartString;

/// A host pointer recorded in the address table at compile time.
///
/// Images never hold pointers themselves; every variable read, call, and
/// closure context goes through an index into a table of these.
#[derive(Clone, Copy, Debug)]
pub enum Address {
  /// A scalar owned by the host
  Variable(*mut Scalar),
  /// A host function
  Function(NativeFn),
  /// A host closure's function
  Closure(ClosureFn),
  /// A host closure's context pointer
  Context(*mut ()),
}
impl Address {
  /// Identity for interning: pointer value within each class of address
  fn key(self) -> (u8, usize) {
    match self {
      Self::Variable(pointer) => (0, pointer as usize),
      Self::Function(function) => (1, function.address()),
      Self::Closure(function) => (2, function.address()),
      Self::Context(pointer) => (3, pointer as usize),
    }
  }
}

/// The two parallel tables a compiled image refers into: host addresses for
/// evaluation, and the names they were bound under for introspection.
///
/// An index is assigned the first time an address is encountered during
/// lowering, so a variable shared by several statements occupies one slot.
#[derive(Clone, Debug, Default)]
pub struct AddressTable {
  addresses: Vec<Address>,
  names: Vec<SmartString>,
}
impl AddressTable {
  #[must_use]
  pub fn address(&self, index: usize) -> Option<Address> {
    self.addresses.get(index).copied()
  }

  /// The name the address at an index was bound under
  #[must_use]
  pub fn name(&self, index: usize) -> Option<&str> {
    self.names.get(index).map(SmartString::as_str)
  }

  /// All the names, in index order
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.names.iter().map(SmartString::as_str)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.addresses.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.addresses.is_empty()
  }
}

/// Assigns address table indices during lowering, first encounter first.
///
/// A program shares one interner across all of its embedded expressions, so
/// every statement referring to a host binding agrees on its index.
#[derive(Default)]
pub(crate) struct AddressInterner {
  indices: FxHashMap<(u8, usize), u32>,
  table: AddressTable,
}
impl AddressInterner {
  /// The table index for an address, interning it under `name` if new
  pub fn intern(&mut self, address: Address, name: &str) -> u32 {
    if let Some(&index) = self.indices.get(&address.key()) {
      return index;
    }

    self.insert(address, name.into())
  }

  /// The table index for a closure's context pointer.
  ///
  /// Contexts are named after their closure with a `_closure` suffix; when
  /// two distinct contexts would collide, a counter keeps the names unique.
  pub fn intern_context(&mut self, context: *mut (), function_name: &str) -> u32 {
    let address = Address::Context(context);
    if let Some(&index) = self.indices.get(&address.key()) {
      return index;
    }

    let mut name = SmartString::from(function_name);
    name.push_str("_closure");
    let mut counter = 1;
    while self.table.names.contains(&name) {
      counter += 1;
      name = SmartString::from(function_name);
      name.push_str("_closure");
      name.push_str(&counter.to_string());
    }

    self.insert(address, name)
  }

  fn insert(&mut self, address: Address, name: SmartString) -> u32 {
    let index = u32::try_from(self.table.addresses.len()).expect("tables stay small");
    self.indices.insert(address.key(), index);
    self.table.addresses.push(address);
    self.table.names.push(name);
    index
  }

  pub fn finish(self) -> AddressTable {
    self.table
  }
}
