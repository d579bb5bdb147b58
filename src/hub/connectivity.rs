use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Network reachability as seen at the moment of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

impl Connectivity {
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl From<bool> for Connectivity {
    fn from(online: bool) -> Self {
        if online {
            Self::Online
        } else {
            Self::Offline
        }
    }
}

/// Shared, externally updated online/offline flag.
///
/// The hub only reads it; whoever watches the network flips it.
#[derive(Debug, Clone)]
pub struct ConnectivitySignal {
    online: Arc<AtomicBool>,
}

impl Default for ConnectivitySignal {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivitySignal {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }

    pub fn get(&self) -> Connectivity {
        self.online.load(Ordering::Acquire).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_updates() {
        let signal = ConnectivitySignal::default();
        let observer = signal.clone();
        assert_eq!(observer.get(), Connectivity::Online);
        signal.set_online(false);
        assert_eq!(observer.get(), Connectivity::Offline);
    }
}
