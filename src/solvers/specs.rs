use crate::setaf::Argument;
use crate::utils::InterruptedError;

/// The type of callback functions called each time a model is found.
///
/// Such callback functions take as input the 1-based number of the model and the accepted
/// arguments, in id order.
pub type ModelHandler<'a> = Box<dyn FnMut(u64, &[&Argument]) + 'a>;

/// A trait implemented by objects able to enumerate the extensions of a SETAF instance.
pub trait ExtensionEnumerator {
    /// Enumerates the extensions of the underlying instance.
    ///
    /// Each extension is delivered through the registered model handler.
    /// An error is returned when the search is interrupted by a signal; exhausting the
    /// search space, with or without models, is a success.
    fn enumerate_extensions(&mut self) -> Result<(), InterruptedError>;
}
