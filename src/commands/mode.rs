use crate::core::{Console, Store};
use crate::error::Result;
use crate::models::Mode;

/// `/mode` shows the current mode, `/mode <name>` switches it
pub fn handle_mode(store: &mut Store, arg: Option<&str>, console: &mut dyn Console) -> Result<()> {
    match arg.map(str::trim).filter(|a| !a.is_empty()) {
        None => {
            console.say(&format!("Current mode: {}", store.mode()));
            let modes = [Mode::Candidate, Mode::Hunter];
            let items: Vec<String> = modes.iter().map(|m| m.display_name().to_string()).collect();
            // Anything but a valid pick keeps the current mode
            if let Some(index) = console.select("Switch to", &items) {
                store.set_mode(modes[index])?;
                console.say(&format!("Mode set to {}", modes[index]));
            }
        }
        Some(name) => {
            let mode: Mode = name.parse()?;
            store.set_mode(mode)?;
            console.say(&format!("Mode set to {}", mode));
        }
    }
    Ok(())
}
