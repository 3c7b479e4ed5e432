//! Wizard Pages - One widget per wizard step
//!
//! Pages render state handed to them and report user input as signals;
//! the wizard stack turns those signals into step-machine actions.

mod choose_type;
mod provide_source;
mod preview;

pub use choose_type::ChooseTypePage;
pub use provide_source::ProvideSourcePage;
pub use preview::PreviewPage;
