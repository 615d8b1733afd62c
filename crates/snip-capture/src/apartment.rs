use anyhow::Result;
use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::System::Com::{COINIT_MULTITHREADED, CoInitializeEx, CoUninitialize};

/// Membership of the current thread in a COM apartment.
///
/// WinRT calls need the thread to be in some apartment. Joining succeeds when
/// the thread already belongs to a single-threaded one; only a join that
/// actually incremented the COM reference count is undone on drop.
#[derive(Debug)]
pub struct Apartment {
    owned: bool,
}

impl Apartment {
    /// Join the multithreaded apartment, or reuse the one already entered
    pub fn join() -> Result<Self> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            tracing::trace!("thread already in a single-threaded apartment");
            return Ok(Self { owned: false });
        }
        hr.ok()
            .map_err(|e| anyhow::anyhow!("Failed to join COM apartment: {e}"))?;
        Ok(Self { owned: true })
    }

    /// Whether dropping this value leaves the apartment
    #[cfg(test)]
    pub fn owned(&self) -> bool {
        self.owned
    }
}

impl Drop for Apartment {
    fn drop(&mut self) {
        if self.owned {
            unsafe { CoUninitialize() };
        }
    }
}

/// Run `f` with the current thread inside a COM apartment
pub fn with_apartment<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    let _apartment = Apartment::join()?;
    f()
}
