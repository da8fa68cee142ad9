use crate::core::{Console, Store};
use crate::error::Result;

pub fn list_models(store: &Store, console: &mut dyn Console) {
    let current = store.model();
    console.say("Supported models:");
    for model in store.supported_models() {
        let marker = if Some(model.as_str()) == current { " (current)" } else { "" };
        console.say(&format!("- {}{}", model, marker));
    }
}

pub fn show_model(store: &Store, console: &mut dyn Console) {
    match store.model() {
        Some(model) => console.say(&format!("Current model: {}", model)),
        None => console.say("No model selected"),
    }
    console.say("Usage: /model <ls|name>");
}

/// Validate and persist the model; an unsupported name leaves the store untouched
pub fn set_model(store: &mut Store, name: &str, console: &mut dyn Console) -> Result<()> {
    store.set_model(name.trim())?;
    console.say(&format!("Model set to {}", name.trim()));
    Ok(())
}
