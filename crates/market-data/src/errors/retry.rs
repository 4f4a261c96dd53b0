/// What the upstream client does after a failed call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Give up: the provider will answer the same way again.
    Never,

    /// One more attempt after the client's backoff delay.
    WithBackoff,
}
