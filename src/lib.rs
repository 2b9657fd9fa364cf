//! Rustaf is a stable-extension enumerator for SETAFs (set-based argumentation frameworks).
//!
//! A SETAF is a directed hypergraph whose vertices are arguments and whose hyperedges are
//! collective attacks: each attack targets a single argument and carries a non-empty set of
//! attacking arguments.
//! Rustaf enumerates the stable extensions of such a framework with a CDCL-style search
//! engine specialised for the stable semantics.

#![warn(missing_docs)]

mod setaf;
pub use setaf::Argument;
pub use setaf::ArgumentId;
pub use setaf::Clause;
pub use setaf::ClauseId;
pub use setaf::ClauseType;
pub use setaf::DecisionLevel;
pub use setaf::Heuristics;
pub use setaf::Semantics;
pub use setaf::SetafInstance;
pub use setaf::Sign;
pub use setaf::UNASSIGNED_DL;

mod io;
pub use io::ArgumentNameIndex;
pub use io::ProofWriter;
pub use io::SimpleFormatReader;

mod solvers;
pub use solvers::ExtensionEnumerator;
pub use solvers::ModelHandler;
pub use solvers::StableEnumerationSolver;

mod utils;
pub use utils::check_signal;
pub use utils::received_signal;
pub use utils::register_signal_handlers;
pub use utils::schedule_alarm;
pub use utils::IdTrie;
pub use utils::InterruptedError;
pub use utils::SignalKind;
