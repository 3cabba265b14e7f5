/// The default cancellation classification passed to
/// [Retrofit::cancel](crate::Retrofit::cancel).
///
/// Any `Clone` error type can be used instead by naming it as the
/// second type parameter of [Retrofit](crate::Retrofit).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, thiserror::Error)]
#[error("operation was cancelled")]
pub struct Cancelled;
