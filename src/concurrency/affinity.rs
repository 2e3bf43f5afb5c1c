//! Pinning worker threads to CPUs.
//!
//! Pinned workers cannot migrate between cores mid-run, so the same bodies keep
//! racing on the same pair of caches every round.

use std::io;

/// Pins the calling thread to `cpu`.
///
/// Fails if `cpu` is outside the process's allowed set, or with
/// [`io::ErrorKind::Unsupported`] on platforms without per-thread affinity.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(cpu: usize) -> io::Result<()> {
    let capacity = std::mem::size_of::<libc::cpu_set_t>() * 8;
    if cpu >= capacity {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cpu index {cpu} exceeds the cpu set capacity ({capacity})"),
        ));
    }
    // SAFETY: a zeroed `cpu_set_t` is a valid empty set, `cpu` is in bounds, and
    // `pthread_setaffinity_np` reports errors through its return value.
    let rc = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(cpu, &mut set);
        libc::pthread_setaffinity_np(
            libc::pthread_self(),
            std::mem::size_of::<libc::cpu_set_t>(),
            &set,
        )
    };
    if rc != 0 {
        return Err(io::Error::from_raw_os_error(rc));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(_cpu: usize) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "thread affinity is only supported on Linux"))
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_cpu_is_rejected() {
        let err = pin_current_thread(usize::MAX).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
