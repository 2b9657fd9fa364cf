//! Supporting tools: the subsumption trie and the process-wide signal status.

mod id_trie;
pub use id_trie::IdTrie;

mod signals;
pub use signals::check_signal;
pub use signals::received_signal;
pub use signals::register_signal_handlers;
pub use signals::schedule_alarm;
pub use signals::InterruptedError;
pub use signals::SignalKind;
