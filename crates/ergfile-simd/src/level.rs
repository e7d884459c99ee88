//! Runtime CPU capability probing.

use std::fmt;
use std::sync::OnceLock;

static DETECTED: OnceLock<SimdLevel> = OnceLock::new();

/// Instruction-set tier the dispatchers select kernels from.
///
/// The tier is an ordinary value threaded through calls rather than a
/// global, so tests can force any tier at or below the host's; running a
/// wide kernel on hardware without the feature is undefined, which is why
/// production callers go through [`SimdLevel::detect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SimdLevel {
    /// Scalar loops only.
    None,
    /// 128-bit kernels (x86_64 baseline).
    Sse2,
    /// 256-bit kernels with native strided gathers.
    Avx2,
    /// 512-bit kernels.
    Avx512,
}

impl SimdLevel {
    /// Probe the host once and cache the answer.
    ///
    /// `is_x86_feature_detected!` performs the cpuid query and the OS
    /// XSAVE/XRSTOR validation required before AVX state can be trusted.
    #[must_use]
    pub fn detect() -> SimdLevel {
        *DETECTED.get_or_init(Self::probe)
    }

    #[cfg(target_arch = "x86_64")]
    fn probe() -> SimdLevel {
        if is_x86_feature_detected!("avx512f") {
            SimdLevel::Avx512
        } else if is_x86_feature_detected!("avx2") {
            SimdLevel::Avx2
        } else if is_x86_feature_detected!("sse2") {
            SimdLevel::Sse2
        } else {
            SimdLevel::None
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn probe() -> SimdLevel {
        SimdLevel::None
    }

    /// Every tier from `None` up to and including `self`.
    #[must_use]
    pub fn supported_levels(self) -> &'static [SimdLevel] {
        const ALL: [SimdLevel; 4] = [
            SimdLevel::None,
            SimdLevel::Sse2,
            SimdLevel::Avx2,
            SimdLevel::Avx512,
        ];
        match self {
            SimdLevel::None => &ALL[..1],
            SimdLevel::Sse2 => &ALL[..2],
            SimdLevel::Avx2 => &ALL[..3],
            SimdLevel::Avx512 => &ALL[..4],
        }
    }
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimdLevel::None => "scalar",
            SimdLevel::Sse2 => "SSE2",
            SimdLevel::Avx2 => "AVX2",
            SimdLevel::Avx512 => "AVX-512",
        };
        f.write_str(name)
    }
}
