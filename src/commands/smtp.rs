use crate::core::{Console, Store};
use crate::error::Result;
use crate::models::{SmtpSettings, SMTP_PORTS};

fn ask(console: &mut dyn Console, label: &str, current: Option<&str>) -> Option<Option<String>> {
    let prompt = match current {
        Some(value) if !value.is_empty() => format!("{} [{}]", label, value),
        _ => label.to_string(),
    };
    let answer = console.read_line(&prompt)?;
    let answer = answer.trim();
    Some(if answer.is_empty() {
        current.map(str::to_string)
    } else {
        Some(answer.to_string())
    })
}

/// Interactive SMTP setup; blank answers keep the stored value
pub fn configure_smtp(store: &mut Store, console: &mut dyn Console) -> Result<()> {
    let current = store.smtp().clone();
    console.say("Configure outgoing email (leave blank to keep the current value)");

    let Some(sender_email) = ask(console, "Sender email", current.sender_email.as_deref()) else {
        return Ok(());
    };
    let Some(password) = console.read_secret("Password or app token") else {
        return Ok(());
    };
    let sender_password = if password.trim().is_empty() {
        current.sender_password.clone()
    } else {
        Some(password.trim().to_string())
    };
    let Some(smtp_server) = ask(console, "SMTP server", current.smtp_server.as_deref()) else {
        return Ok(());
    };

    let ports = SMTP_PORTS.map(|p| p.to_string()).join("/");
    let port_label = format!("SMTP port ({})", ports);
    let current_port = current.smtp_port.to_string();
    let Some(port) = ask(console, &port_label, Some(&current_port)) else {
        return Ok(());
    };
    let smtp_port = match port.as_deref().map(|p| p.parse::<u16>()) {
        Some(Ok(p)) => p,
        _ => {
            console.say(&format!("Invalid port, expected one of {}", ports));
            return Ok(());
        }
    };

    store.set_smtp(SmtpSettings {
        sender_email,
        sender_password,
        smtp_server,
        smtp_port,
    })?;

    let missing = store.smtp().missing_fields();
    if missing.is_empty() {
        console.say("SMTP settings saved");
    } else {
        console.say(&format!("SMTP settings saved, still missing: {}", missing.join(", ")));
    }
    Ok(())
}
