/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Danger,
    Warning,
}

/// Navigation and notice sink owned by the embedding application. The
/// session layer reports where the user should go next and what they
/// should be told; rendering is not its concern.
pub trait Navigator: Send + Sync {
    fn redirect_to(&self, path: &str);
    fn flash(&self, level: FlashLevel, message: &str);
}
