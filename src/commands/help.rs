use crate::core::{Capability, Console};

/// Command overview printed by `/help`
pub fn help_text() -> String {
    let mut lines = vec![
        "Commands:".to_string(),
        "  /file                      Manage workspace files (add, list, remove, classify)".to_string(),
        "  /model ls                  List supported models".to_string(),
        "  /model <name>              Switch model".to_string(),
        "  /mode [candidate|hunter]   Show or switch the operating mode".to_string(),
        "  /smtp                      Configure outgoing email".to_string(),
        "  /work                      Enter work mode (chat with the assistant)".to_string(),
        "  /menu                      List local actions".to_string(),
    ];
    for capability in Capability::all() {
        lines.push(format!("  /{:<25} {}", capability.name(), capability.description()));
    }
    lines.push("  /exit                      Quit".to_string());
    lines.join("\n")
}

pub fn show_help(console: &mut dyn Console) {
    console.say(&help_text());
}
