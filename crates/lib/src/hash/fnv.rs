//! 32-bit FNV-1 running checksum.
//!
//! Content hashes are accumulated by writing text and file bytes into a single
//! [`Fnv32`] state. The state is order-sensitive: the same bytes written in a
//! different order give a different sum.

use std::io;

const OFFSET_BASIS: u32 = 0x811c_9dc5;
const PRIME: u32 = 0x0100_0193;

/// FNV-1 (multiply, then xor) over 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fnv32(u32);

impl Fnv32 {
  pub fn new() -> Self {
    Self(OFFSET_BASIS)
  }

  pub fn update(&mut self, bytes: &[u8]) {
    for &byte in bytes {
      self.0 = self.0.wrapping_mul(PRIME);
      self.0 ^= u32::from(byte);
    }
  }

  pub fn sum32(&self) -> u32 {
    self.0
  }
}

impl Default for Fnv32 {
  fn default() -> Self {
    Self::new()
  }
}

impl io::Write for Fnv32 {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.update(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn empty_input_is_offset_basis() {
    assert_eq!(Fnv32::new().sum32(), 0x811c9dc5);
  }

  #[test]
  fn known_vectors() {
    let mut h = Fnv32::new();
    h.update(b"a");
    assert_eq!(h.sum32(), 0x050c5d7e);

    let mut h = Fnv32::new();
    h.update(b"foobar");
    assert_eq!(h.sum32(), 0x31f0b262);
  }

  #[test]
  fn incremental_matches_one_shot() {
    let mut whole = Fnv32::new();
    whole.update(b"name=value");

    let mut parts = Fnv32::new();
    write!(parts, "{}={}", "name", "value").unwrap();

    assert_eq!(whole.sum32(), parts.sum32());
  }

  #[test]
  fn order_sensitive() {
    let mut ab = Fnv32::new();
    ab.update(b"12");
    ab.update(b"34");

    let mut ba = Fnv32::new();
    ba.update(b"34");
    ba.update(b"12");

    assert_ne!(ab.sum32(), ba.sum32());
  }
}
