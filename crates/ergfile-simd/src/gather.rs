//! Strided column gather kernels.
//!
//! A gather pulls one fixed-width field out of every packed row:
//! `dst[i * elem .. i * elem + elem] == src[i * stride .. i * stride + elem]`
//! for `0 <= i < count`. Kernels exist per element size (1, 2, 4, 8 bytes)
//! at 128-, 256- and 512-bit widths; every other combination, and every
//! vector tail, runs through the scalar loop. All kernels produce
//! byte-identical output.

use crate::SimdLevel;

/// Strides above this could overflow the 32-bit lane offsets the gather
/// instructions take; such columns run scalar.
#[cfg(target_arch = "x86_64")]
const MAX_GATHER_STRIDE: usize = i32::MAX as usize / 16;

/// Copy `count` elements of `elem` bytes spaced `stride` apart from `src`
/// into the packed `dst`, using the widest kernel `level` allows.
///
/// # Panics
/// Panics when `dst` is shorter than `count * elem` or `src` does not
/// cover the last element.
pub fn gather(
    level: SimdLevel,
    src: &[u8],
    stride: usize,
    elem: usize,
    count: usize,
    dst: &mut [u8],
) {
    assert!(elem > 0, "gather needs a non-zero element size");
    assert!(stride >= elem, "stride {stride} below element size {elem}");
    if count == 0 {
        return;
    }
    assert!(
        dst.len() >= count * elem,
        "output of {} bytes cannot hold {count} x {elem}",
        dst.len()
    );
    assert!(
        src.len() >= (count - 1) * stride + elem,
        "source of {} bytes does not cover {count} rows of stride {stride}",
        src.len()
    );

    #[cfg(not(target_arch = "x86_64"))]
    let _ = level;

    #[cfg(target_arch = "x86_64")]
    if matches!(elem, 1 | 2 | 4 | 8) && stride <= MAX_GATHER_STRIDE {
        match level {
            // SAFETY: each level is only reported by detection when the
            // host (and OS) support the feature set.
            SimdLevel::Avx512 => return unsafe { gather_avx512(src, stride, elem, count, dst) },
            SimdLevel::Avx2 => return unsafe { gather_avx2(src, stride, elem, count, dst) },
            SimdLevel::Sse2 => return unsafe { gather_sse2(src, stride, elem, count, dst) },
            SimdLevel::None => {}
        }
    }

    gather_scalar(src, stride, elem, count, dst);
}

/// Reference kernel; also serves every vector tail.
fn gather_scalar(src: &[u8], stride: usize, elem: usize, count: usize, dst: &mut [u8]) {
    for i in 0..count {
        let s = i * stride;
        let d = i * elem;
        dst[d..d + elem].copy_from_slice(&src[s..s + elem]);
    }
}

/// Scalar tail after a vector loop stopped at element `done`.
fn scalar_tail(src: &[u8], stride: usize, elem: usize, count: usize, dst: &mut [u8], done: usize) {
    if done < count {
        gather_scalar(
            &src[done * stride..],
            stride,
            elem,
            count - done,
            &mut dst[done * elem..],
        );
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn gather_sse2(src: &[u8], stride: usize, elem: usize, count: usize, dst: &mut [u8]) {
    match elem {
        1 => gather1_sse2(src, stride, count, dst),
        2 => gather2_sse2(src, stride, count, dst),
        4 => gather4_sse2(src, stride, count, dst),
        8 => gather8_sse2(src, stride, count, dst),
        _ => gather_scalar(src, stride, elem, count, dst),
    }
}

/// 16 one-byte elements per iteration, composed as two 64-bit words.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn gather1_sse2(src: &[u8], stride: usize, count: usize, dst: &mut [u8]) {
    use std::arch::x86_64::*;

    let base = src.as_ptr();
    let out = dst.as_mut_ptr();
    let mut i = 0;
    while i + 16 <= count {
        let mut lo = 0u64;
        let mut hi = 0u64;
        for lane in 0..8 {
            lo |= u64::from(*base.add((i + lane) * stride)) << (8 * lane);
            hi |= u64::from(*base.add((i + 8 + lane) * stride)) << (8 * lane);
        }
        _mm_storeu_si128(
            out.add(i).cast(),
            _mm_set_epi64x(hi as i64, lo as i64),
        );
        i += 16;
    }
    scalar_tail(src, stride, 1, count, dst, i);
}

/// 8 two-byte elements per iteration, composed as two 64-bit words.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn gather2_sse2(src: &[u8], stride: usize, count: usize, dst: &mut [u8]) {
    use std::arch::x86_64::*;

    let base = src.as_ptr();
    let out = dst.as_mut_ptr();
    let mut i = 0;
    while i + 8 <= count {
        let mut lo = 0u64;
        let mut hi = 0u64;
        for lane in 0..4 {
            let a = base.add((i + lane) * stride).cast::<u16>().read_unaligned();
            let b = base
                .add((i + 4 + lane) * stride)
                .cast::<u16>()
                .read_unaligned();
            lo |= u64::from(a) << (16 * lane);
            hi |= u64::from(b) << (16 * lane);
        }
        _mm_storeu_si128(
            out.add(i * 2).cast(),
            _mm_set_epi64x(hi as i64, lo as i64),
        );
        i += 8;
    }
    scalar_tail(src, stride, 2, count, dst, i);
}

/// 4 four-byte elements per iteration via movd loads and an unpack tree.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn gather4_sse2(src: &[u8], stride: usize, count: usize, dst: &mut [u8]) {
    use std::arch::x86_64::*;

    let base = src.as_ptr();
    let out = dst.as_mut_ptr();
    let mut i = 0;
    while i + 4 <= count {
        let a = _mm_cvtsi32_si128(base.add(i * stride).cast::<i32>().read_unaligned());
        let b = _mm_cvtsi32_si128(base.add((i + 1) * stride).cast::<i32>().read_unaligned());
        let c = _mm_cvtsi32_si128(base.add((i + 2) * stride).cast::<i32>().read_unaligned());
        let d = _mm_cvtsi32_si128(base.add((i + 3) * stride).cast::<i32>().read_unaligned());
        let ab = _mm_unpacklo_epi32(a, b);
        let cd = _mm_unpacklo_epi32(c, d);
        _mm_storeu_si128(out.add(i * 4).cast(), _mm_unpacklo_epi64(ab, cd));
        i += 4;
    }
    scalar_tail(src, stride, 4, count, dst, i);
}

/// 2 eight-byte elements per iteration via movq pair.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn gather8_sse2(src: &[u8], stride: usize, count: usize, dst: &mut [u8]) {
    use std::arch::x86_64::*;

    let base = src.as_ptr();
    let out = dst.as_mut_ptr();
    let mut i = 0;
    while i + 2 <= count {
        let a = _mm_loadl_epi64(base.add(i * stride).cast());
        let b = _mm_loadl_epi64(base.add((i + 1) * stride).cast());
        _mm_storeu_si128(out.add(i * 8).cast(), _mm_unpacklo_epi64(a, b));
        i += 2;
    }
    scalar_tail(src, stride, 8, count, dst, i);
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn gather_avx2(src: &[u8], stride: usize, elem: usize, count: usize, dst: &mut [u8]) {
    match elem {
        1 => gather1_avx2(src, stride, count, dst),
        2 => gather2_avx2(src, stride, count, dst),
        4 => gather4_avx2(src, stride, count, dst),
        8 => gather8_avx2(src, stride, count, dst),
        _ => gather_scalar(src, stride, elem, count, dst),
    }
}

/// 8 four-byte elements per iteration via native strided gather.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn gather4_avx2(src: &[u8], stride: usize, count: usize, dst: &mut [u8]) {
    use std::arch::x86_64::*;

    let s = stride as i32;
    let offsets = _mm256_setr_epi32(0, s, 2 * s, 3 * s, 4 * s, 5 * s, 6 * s, 7 * s);
    let base = src.as_ptr();
    let out = dst.as_mut_ptr();
    let mut i = 0;
    while i + 8 <= count {
        let v = _mm256_i32gather_epi32::<1>(base.add(i * stride).cast(), offsets);
        _mm256_storeu_si256(out.add(i * 4).cast(), v);
        i += 8;
    }
    scalar_tail(src, stride, 4, count, dst, i);
}

/// 4 eight-byte elements per iteration via native strided gather.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn gather8_avx2(src: &[u8], stride: usize, count: usize, dst: &mut [u8]) {
    use std::arch::x86_64::*;

    let s = stride as i64;
    let offsets = _mm256_setr_epi64x(0, s, 2 * s, 3 * s);
    let base = src.as_ptr();
    let out = dst.as_mut_ptr();
    let mut i = 0;
    while i + 4 <= count {
        let v = _mm256_i64gather_epi64::<1>(base.add(i * stride).cast(), offsets);
        _mm256_storeu_si256(out.add(i * 8).cast(), v);
        i += 4;
    }
    scalar_tail(src, stride, 8, count, dst, i);
}

/// 8 two-byte elements per iteration: gather 4-byte lanes, mask, pack.
///
/// Each lane load covers 4 source bytes, so the vector loop additionally
/// stops early enough that no lane reads past `src`; the rest is scalar.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn gather2_avx2(src: &[u8], stride: usize, count: usize, dst: &mut [u8]) {
    use std::arch::x86_64::*;

    let s = stride as i32;
    let offsets = _mm256_setr_epi32(0, s, 2 * s, 3 * s, 4 * s, 5 * s, 6 * s, 7 * s);
    let mask = _mm256_set1_epi32(0xFFFF);
    let base = src.as_ptr();
    let out = dst.as_mut_ptr();
    let mut i = 0;
    while i + 8 <= count && (i + 7) * stride + 4 <= src.len() {
        let v = _mm256_i32gather_epi32::<1>(base.add(i * stride).cast(), offsets);
        let narrow = _mm256_and_si256(v, mask);
        let packed = _mm256_packus_epi32(narrow, narrow);
        let compact = _mm256_permute4x64_epi64::<0b0000_1000>(packed);
        _mm_storeu_si128(out.add(i * 2).cast(), _mm256_castsi256_si128(compact));
        i += 8;
    }
    scalar_tail(src, stride, 2, count, dst, i);
}

/// 8 one-byte elements per iteration: gather 4-byte lanes, mask, pack twice.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn gather1_avx2(src: &[u8], stride: usize, count: usize, dst: &mut [u8]) {
    use std::arch::x86_64::*;

    let s = stride as i32;
    let offsets = _mm256_setr_epi32(0, s, 2 * s, 3 * s, 4 * s, 5 * s, 6 * s, 7 * s);
    let mask = _mm256_set1_epi32(0xFF);
    let gather_order = _mm256_setr_epi32(0, 4, 0, 0, 0, 0, 0, 0);
    let base = src.as_ptr();
    let out = dst.as_mut_ptr();
    let mut i = 0;
    while i + 8 <= count && (i + 7) * stride + 4 <= src.len() {
        let v = _mm256_i32gather_epi32::<1>(base.add(i * stride).cast(), offsets);
        let narrow = _mm256_and_si256(v, mask);
        let p16 = _mm256_packus_epi32(narrow, narrow);
        let p8 = _mm256_packus_epi16(p16, p16);
        let compact = _mm256_permutevar8x32_epi32(p8, gather_order);
        _mm_storel_epi64(out.add(i).cast(), _mm256_castsi256_si128(compact));
        i += 8;
    }
    scalar_tail(src, stride, 1, count, dst, i);
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx512f")]
unsafe fn gather_avx512(src: &[u8], stride: usize, elem: usize, count: usize, dst: &mut [u8]) {
    match elem {
        1 => gather1_avx512(src, stride, count, dst),
        2 => gather2_avx512(src, stride, count, dst),
        4 => gather4_avx512(src, stride, count, dst),
        8 => gather8_avx512(src, stride, count, dst),
        _ => gather_scalar(src, stride, elem, count, dst),
    }
}

#[cfg(target_arch = "x86_64")]
fn offsets_16(stride: usize) -> std::arch::x86_64::__m512i {
    use std::arch::x86_64::*;

    let s = stride as i32;
    // SAFETY: plain register construction, no memory access.
    unsafe {
        _mm512_setr_epi32(
            0,
            s,
            2 * s,
            3 * s,
            4 * s,
            5 * s,
            6 * s,
            7 * s,
            8 * s,
            9 * s,
            10 * s,
            11 * s,
            12 * s,
            13 * s,
            14 * s,
            15 * s,
        )
    }
}

/// 16 four-byte elements per iteration via native strided gather.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx512f")]
unsafe fn gather4_avx512(src: &[u8], stride: usize, count: usize, dst: &mut [u8]) {
    use std::arch::x86_64::*;

    let offsets = offsets_16(stride);
    let base = src.as_ptr();
    let out = dst.as_mut_ptr();
    let mut i = 0;
    while i + 16 <= count {
        let v = _mm512_i32gather_epi32::<1>(offsets, base.add(i * stride).cast());
        _mm512_storeu_si512(out.add(i * 4).cast(), v);
        i += 16;
    }
    scalar_tail(src, stride, 4, count, dst, i);
}

/// 8 eight-byte elements per iteration via native strided gather.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx512f")]
unsafe fn gather8_avx512(src: &[u8], stride: usize, count: usize, dst: &mut [u8]) {
    use std::arch::x86_64::*;

    let s = stride as i64;
    let offsets = _mm512_setr_epi64(0, s, 2 * s, 3 * s, 4 * s, 5 * s, 6 * s, 7 * s);
    let base = src.as_ptr();
    let out = dst.as_mut_ptr();
    let mut i = 0;
    while i + 8 <= count {
        let v = _mm512_i64gather_epi64::<1>(offsets, base.add(i * stride).cast());
        _mm512_storeu_si512(out.add(i * 8).cast(), v);
        i += 8;
    }
    scalar_tail(src, stride, 8, count, dst, i);
}

/// 16 two-byte elements per iteration: gather 4-byte lanes, truncate down.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx512f")]
unsafe fn gather2_avx512(src: &[u8], stride: usize, count: usize, dst: &mut [u8]) {
    use std::arch::x86_64::*;

    let offsets = offsets_16(stride);
    let base = src.as_ptr();
    let out = dst.as_mut_ptr();
    let mut i = 0;
    while i + 16 <= count && (i + 15) * stride + 4 <= src.len() {
        let v = _mm512_i32gather_epi32::<1>(offsets, base.add(i * stride).cast());
        _mm256_storeu_si256(out.add(i * 2).cast(), _mm512_cvtepi32_epi16(v));
        i += 16;
    }
    scalar_tail(src, stride, 2, count, dst, i);
}

/// 16 one-byte elements per iteration: gather 4-byte lanes, truncate down.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx512f")]
unsafe fn gather1_avx512(src: &[u8], stride: usize, count: usize, dst: &mut [u8]) {
    use std::arch::x86_64::*;

    let offsets = offsets_16(stride);
    let base = src.as_ptr();
    let out = dst.as_mut_ptr();
    let mut i = 0;
    while i + 16 <= count && (i + 15) * stride + 4 <= src.len() {
        let v = _mm512_i32gather_epi32::<1>(offsets, base.add(i * stride).cast());
        _mm_storeu_si128(out.add(i).cast(), _mm512_cvtepi32_epi8(v));
        i += 16;
    }
    scalar_tail(src, stride, 1, count, dst, i);
}
