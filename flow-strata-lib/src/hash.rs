//! Flow key digest
//!
//! Bob Jenkins' lookup3 `mix`/`final` rounds over the twelve 32-bit words of a
//! [`FlowKey`]. The digest is unseeded and deterministic within one process and
//! one byte order: the words are the key bytes read natively, so big- and
//! little-endian hosts produce different values for the same key.
//!
//! No initial value is folded in, so the all-zero key hashes to zero.

use std::hash::{BuildHasher, Hasher};

use crate::key::{FlowKey, FLOW_KEY_WORDS};

#[inline(always)]
fn mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(4);
    *c = c.wrapping_add(*b);

    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(6);
    *a = a.wrapping_add(*c);

    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(8);
    *b = b.wrapping_add(*a);

    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(16);
    *c = c.wrapping_add(*b);

    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(19);
    *a = a.wrapping_add(*c);

    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(4);
    *b = b.wrapping_add(*a);
}

#[inline(always)]
fn finalize(a: &mut u32, b: &mut u32, c: &mut u32) {
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(14));
    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(11));
    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(25));
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(16));
    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(4));
    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(14));
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(24));
}

/// Digest of twelve words: three `mix` rounds, then `final` after the last
/// group.
#[inline]
pub fn hash_words(words: &[u32; FLOW_KEY_WORDS]) -> u32 {
    let (mut a, mut b, mut c) = (words[0], words[1], words[2]);
    mix(&mut a, &mut b, &mut c);

    a = a.wrapping_add(words[3]);
    b = b.wrapping_add(words[4]);
    c = c.wrapping_add(words[5]);
    mix(&mut a, &mut b, &mut c);

    a = a.wrapping_add(words[6]);
    b = b.wrapping_add(words[7]);
    c = c.wrapping_add(words[8]);
    mix(&mut a, &mut b, &mut c);

    a = a.wrapping_add(words[9]);
    b = b.wrapping_add(words[10]);
    c = c.wrapping_add(words[11]);
    finalize(&mut a, &mut b, &mut c);

    c
}

/// 32-bit digest of a flow key. Keys that compare equal hash equal.
#[inline]
pub fn hash(key: &FlowKey) -> u32 {
    hash_words(&key.words())
}

/// `BuildHasher` that hands the flow key digest straight to the map
///
/// `FlowKey`'s `Hash` impl writes exactly one `u32` (its digest), which this
/// hasher returns unchanged. Other types still hash, through a simple
/// multiplicative fold, but lose the guarantees of the key digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyHashBuilder;

impl BuildHasher for KeyHashBuilder {
    type Hasher = KeyHasher;

    #[inline]
    fn build_hasher(&self) -> KeyHasher {
        KeyHasher::default()
    }
}

/// 2^64 divided by the golden ratio, odd
const SPREAD: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyHasher {
    state: u64,
}

impl Hasher for KeyHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }

    /// Spreads the digest over all 64 bits; hashbrown tags slots with the
    /// top 7.
    #[inline]
    fn write_u32(&mut self, value: u32) {
        self.state = (self.state.rotate_left(32) ^ value as u64).wrapping_mul(SPREAD);
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self.state.wrapping_mul(0x100_0000_01b3) ^ byte as u64;
        }
    }
}
