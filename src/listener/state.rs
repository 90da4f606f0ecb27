#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Not subscribed to the platform.
    Idle,
    /// Permission was requested and the platform has not answered yet.
    AwaitingPermission,
    /// Subscribed and processing notifications.
    Listening
}
