//! Sealed marker for [`Transport`](super::Transport) implementations.

pub(crate) mod private {
    /// Only transports defined in this crate may carry signed gateway traffic.
    pub trait Sealed {}
}
