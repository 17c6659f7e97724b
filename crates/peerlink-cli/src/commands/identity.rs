//! Show or set the persisted display name.

use anyhow::Result;

use peerlink_core::identity::IdentityManager;

use super::{IdentityAction, IdentityArgs};

/// Run the identity command.
pub fn run(args: &IdentityArgs) -> Result<()> {
    let store = super::open_store(super::IDENTITY_STORE)?;
    let mut manager = IdentityManager::new(store);

    match &args.action {
        None | Some(IdentityAction::Show) => match manager.stored() {
            Some(name) => println!("{name}"),
            None => println!(
                "No display name set; one will be generated (for example: {}).",
                manager.get_or_create()
            ),
        },
        Some(IdentityAction::Set { name }) => {
            let effective = manager.set(name);
            println!("Display name set to {effective}.");
        }
    }
    Ok(())
}
