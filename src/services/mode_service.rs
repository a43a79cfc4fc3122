/// Decides between live generation and offline selection. Deliberately thin:
/// the route handler is the only consumer.
#[cfg_attr(test, mockall::automock)]
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

pub struct ProviderProbe {
    provider_count: usize,
    force_offline: bool,
}

impl ProviderProbe {
    pub fn new(provider_count: usize, force_offline: bool) -> Self {
        Self {
            provider_count,
            force_offline,
        }
    }
}

impl ConnectivityProbe for ProviderProbe {
    fn is_online(&self) -> bool {
        !self.force_offline && self.provider_count > 0
    }
}
