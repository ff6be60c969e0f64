use std::ffi::c_void;
use std::iter;

use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, BOOL, ERROR_ALREADY_EXISTS, HANDLE};

const MUTEX_NAME: &str = "Local\\HealthReminder.desktop_reminder";

/// Holds the named mutex for the lifetime of the process.
pub struct InstanceGuard(HANDLE);

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.0);
        }
    }
}

pub fn acquire() -> anyhow::Result<InstanceGuard> {
    // Bound directly so we don't depend on which windows-sys feature re-exports it.
    #[link(name = "kernel32")]
    extern "system" {
        fn CreateMutexW(
            lp_mutex_attributes: *const c_void,
            b_initial_owner: BOOL,
            lp_name: *const u16,
        ) -> HANDLE;
    }

    let name: Vec<u16> = MUTEX_NAME.encode_utf16().chain(iter::once(0)).collect();

    unsafe {
        let h = CreateMutexW(std::ptr::null(), 0, name.as_ptr());
        if h.is_null() {
            anyhow::bail!("CreateMutexW_failed");
        }
        if GetLastError() == ERROR_ALREADY_EXISTS {
            CloseHandle(h);
            anyhow::bail!("already_exists");
        }
        Ok(InstanceGuard(h))
    }
}
