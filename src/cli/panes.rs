//! Layout commands: select, split, unsplit, maximize, focus, delete.

use std::error::Error;

use crate::cli::chat_list::describe_layout;
use crate::core::session::{SessionAction, SessionStore};

/// Apply one layout action and print the resulting layout. Rejected actions
/// leave the session untouched and exit non-zero.
pub fn apply_action(store: &mut SessionStore, action: SessionAction) -> Result<(), Box<dyn Error>> {
    if let Err(err) = store.dispatch(action) {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
    println!("{}", describe_layout(store.state()));
    Ok(())
}
