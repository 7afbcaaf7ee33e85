//! Process wide initialization
//!
//! [`init`] is called once before the first connection is created and [`deinit`] once after
//! the last one is dropped. Both are idempotent. With the `rustls` feature, `init` installs
//! the `ring` crypto provider as the process default, and TLS transports refuse to open
//! until it has run.

use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug)]
struct Platform {
    initialized: bool,
}

static PLATFORM: Mutex<Platform> = parking_lot::const_mutex(Platform { initialized: false });

/// Brings up the process wide state
pub fn init() {
    let mut platform = PLATFORM.lock();
    if platform.initialized {
        return;
    }

    #[cfg(feature = "rustls")]
    {
        use librustls::crypto::{ring, CryptoProvider};

        // Another library may have installed a provider already, which is just as good
        if CryptoProvider::install_default(ring::default_provider()).is_err() {
            debug!("a default crypto provider is already installed");
        }
    }

    platform.initialized = true;
    debug!("platform initialized");
}

/// Tears down the process wide state
pub fn deinit() {
    let mut platform = PLATFORM.lock();
    if platform.initialized {
        platform.initialized = false;
        debug!("platform deinitialized");
    }
}

/// Whether [`init`] has run without a later [`deinit`]
pub fn is_initialized() -> bool {
    PLATFORM.lock().initialized
}
