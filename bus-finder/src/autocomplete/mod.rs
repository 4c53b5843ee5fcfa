//! Address autocomplete: debounced lookups plus a keyboard-driven
//! suggestion list.

mod search;
mod suggestions;

pub use search::{AddressAutocomplete, AutocompleteView, validate_query};
pub use suggestions::{Key, KeyOutcome, SuggestionList};
