use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::models::RawNotification;

pub type SmsCallback = Arc<dyn Fn(RawNotification) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

/// Host capability that delivers incoming SMS to subscribers.
///
/// After `unsubscribe` returns the callback must not be invoked again.
pub trait SmsSource: Send + Sync + 'static {
    fn subscribe(&self, callback: SmsCallback) -> SubscriptionHandle;
    fn unsubscribe(&self, handle: SubscriptionHandle);
}

/// Host capability guarding access to the SMS inbox.
#[async_trait]
pub trait PermissionGate: Send + Sync + 'static {
    /// Whether permission is already granted, without prompting.
    async fn check(&self) -> bool;
    /// Prompts for permission and resolves once the platform answers.
    async fn request(&self) -> bool;
}

/// Permission gate for hosts where SMS access needs no prompt.
pub struct GrantedPermission;

#[async_trait]
impl PermissionGate for GrantedPermission {
    async fn check(&self) -> bool {
        true
    }

    async fn request(&self) -> bool {
        true
    }
}

/// In-process SMS source. Whoever owns it pushes notifications with [`LocalSource::deliver`].
#[derive(Default)]
pub struct LocalSource {
    next_handle: AtomicU64,
    subscribers: DashMap<SubscriptionHandle, SmsCallback>
}

impl LocalSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands `notification` to every current subscriber and returns how many received it.
    pub fn deliver(&self, notification: RawNotification) -> usize {
        //NOTE: Callbacks are cloned out first so a callback may unsubscribe without deadlocking the map.
        let callbacks: Vec<SmsCallback> = self.subscribers.iter().map(|entry| entry.value().clone()).collect();

        for callback in &callbacks {
            callback(notification.clone());
        }

        callbacks.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl SmsSource for LocalSource {
    fn subscribe(&self, callback: SmsCallback) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.subscribers.insert(handle, callback);
        handle
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.subscribers.remove(&handle);
    }
}
