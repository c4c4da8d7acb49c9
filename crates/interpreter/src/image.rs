use shade_builtins::{Kind, Scalar, NAN};
use std::mem::size_of;

/// The fixed part of every node: a `u32` kind tag and an 8 byte payload
pub(crate) const NODE_HEADER_SIZE: usize = 12;
/// Each parameter slot is a `u32`: an in-image byte offset, or for the
/// trailing slot of a closure, an address table index
pub(crate) const PARAMETER_SIZE: usize = 4;

/// A compiled expression tree as one contiguous, position-independent buffer.
///
/// The root node sits at offset 0 and children always follow their parent, so
/// the bytes can be copied anywhere and still evaluate. Nodes are laid out as
/// a little-endian header (kind tag, then a payload holding either an inline
/// scalar or an address table index) followed by one `u32` offset per
/// argument. Nothing in the buffer is a pointer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Image {
  bytes: Vec<u8>,
}
impl Image {
  pub(crate) fn with_capacity(capacity: usize) -> Self {
    Self {
      bytes: Vec::with_capacity(capacity),
    }
  }

  /// Append a node header plus zeroed parameter slots, returning its offset
  pub(crate) fn push_node(&mut self, kind: Kind, parameter_slots: usize) -> usize {
    let offset = self.bytes.len();
    self.bytes.extend_from_slice(&kind.bits().to_le_bytes());
    self.bytes.extend_from_slice(&[0; 8]);
    self
      .bytes
      .resize(self.bytes.len() + parameter_slots * PARAMETER_SIZE, 0);
    offset
  }

  /// Store an inline scalar in a node's payload
  pub(crate) fn set_scalar(&mut self, node: usize, value: Scalar) {
    let bytes = value.to_le_bytes();
    self.bytes[node + 4..node + 4 + bytes.len()].copy_from_slice(&bytes);
  }

  /// Store an address table index in a node's payload
  pub(crate) fn set_index(&mut self, node: usize, index: u32) {
    self.bytes[node + 4..node + 8].copy_from_slice(&index.to_le_bytes());
  }

  /// Fill one of a node's parameter slots
  pub(crate) fn set_parameter(&mut self, node: usize, parameter: usize, value: u32) {
    let at = node + NODE_HEADER_SIZE + parameter * PARAMETER_SIZE;
    self.bytes[at..at + PARAMETER_SIZE].copy_from_slice(&value.to_le_bytes());
  }

  /// Append another image, returning the offset its root landed at
  pub(crate) fn append(&mut self, other: &Image) -> usize {
    let offset = self.bytes.len();
    self.bytes.extend_from_slice(&other.bytes);
    offset
  }

  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }
}

/// A read-only view of one node within an image buffer.
///
/// Works on any byte slice, so evaluation does not care whether the bytes
/// still live in the [`Image`] which produced them. Reads past the end of the
/// buffer yield values which evaluate to NaN rather than panicking.
#[derive(Clone, Copy)]
pub(crate) struct Node<'image> {
  image: &'image [u8],
  offset: usize,
}
impl<'image> Node<'image> {
  pub fn root(image: &'image [u8]) -> Self {
    Self { image, offset: 0 }
  }

  pub fn offset(self) -> usize {
    self.offset
  }

  fn read_u32(self, at: usize) -> Option<u32> {
    let bytes = self.image.get(at..at + 4)?;
    Some(u32::from_le_bytes(bytes.try_into().unwrap()))
  }

  /// The node's kind tag; an unknown tag if the buffer is too short
  pub fn kind(self) -> Kind {
    Kind::from_bits(self.read_u32(self.offset).unwrap_or(u32::MAX))
  }

  /// The payload as an inline scalar
  pub fn scalar(self) -> Scalar {
    match self.image.get(self.offset + 4..self.offset + 4 + size_of::<Scalar>()) {
      Some(bytes) => Scalar::from_le_bytes(bytes.try_into().unwrap()),
      None => NAN,
    }
  }

  /// The payload as an address table index
  pub fn index(self) -> usize {
    self.read_u32(self.offset + 4).unwrap_or(u32::MAX) as usize
  }

  /// The value of a parameter slot
  pub fn parameter(self, parameter: usize) -> usize {
    let at = self.offset + NODE_HEADER_SIZE + parameter * PARAMETER_SIZE;
    self.read_u32(at).unwrap_or(u32::MAX) as usize
  }

  /// The child node a parameter slot points at
  pub fn child(self, parameter: usize) -> Node<'image> {
    Node {
      image: self.image,
      offset: self.parameter(parameter),
    }
  }
}
