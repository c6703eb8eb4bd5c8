use cookie_factory::combinator::slice;
use cookie_factory::SerializeFn;
use rusticata_macros::align_n2;
use std::io::Write;

/// Every record payload is aligned to this boundary
pub const RECORD_ALIGNMENT: usize = 8;

/// Total trace file size is aligned to this boundary (DMA transfer size)
pub const TRACE_ALIGNMENT: usize = 64;

static ZEROS: [u8; TRACE_ALIGNMENT] = [0; TRACE_ALIGNMENT];
static ONES: [u8; TRACE_ALIGNMENT] = [0xff; TRACE_ALIGNMENT];

/// Number of bytes to append to `len` to reach the next multiple of `n`
///
/// `n` must be a power of 2, no larger than [`TRACE_ALIGNMENT`].
#[inline]
pub fn padding_len(len: usize, n: usize) -> usize {
    align_n2!(len, n) - len
}

#[inline]
pub fn is_aligned(len: u64, n: u64) -> bool {
    len % n == 0
}

/// Padding after a record payload (zero bytes)
pub(crate) fn record_padding<'a, W: Write + 'a>(
    unaligned_length: usize,
) -> impl SerializeFn<W> + 'a {
    let length = padding_len(unaligned_length, RECORD_ALIGNMENT);
    slice(&ZEROS[..length])
}

/// Padding at the end of a replay trace (all bits set)
pub(crate) fn trace_padding<'a, W: Write + 'a>(
    unaligned_length: usize,
) -> impl SerializeFn<W> + 'a {
    let length = padding_len(unaligned_length, TRACE_ALIGNMENT);
    slice(&ONES[..length])
}
