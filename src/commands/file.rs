use std::path::PathBuf;

use crate::core::{import_file, scan_workdir, Console, Store};
use crate::error::Result;
use crate::models::{FileKind, Settings};

/// Parse "1 3,4" into 1-based indices, each within `1..=max`
pub fn parse_indices(input: &str, max: usize) -> std::result::Result<Vec<usize>, String> {
    let mut indices = Vec::new();
    for token in input.split(|c: char| c.is_whitespace() || c == ',').filter(|t| !t.is_empty()) {
        let n: usize = token
            .parse()
            .map_err(|_| format!("'{}' is not a number", token))?;
        if n == 0 || n > max {
            return Err(format!("{} is out of range (1-{})", n, max));
        }
        if !indices.contains(&n) {
            indices.push(n);
        }
    }
    Ok(indices)
}

fn ask_kind(console: &mut dyn Console, name: &str) -> Option<FileKind> {
    let answer = console.read_line(&format!(
        "Type of {}: 1. resume  2. job description  (blank = unclassified)",
        name
    ))?;
    Some(match answer.trim() {
        "1" => FileKind::Resume,
        "2" => FileKind::Jd,
        other => other.parse().unwrap_or(FileKind::Auto),
    })
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Scan the work directory and import the files the user picks
pub fn add_from_workdir(store: &mut Store, settings: &Settings, console: &mut dyn Console) -> Result<()> {
    let workdir = &settings.workspace.workdir;
    let candidates = scan_workdir(workdir)?;
    if candidates.is_empty() {
        console.say(&format!(
            "No usable files in {} (pdf, docx, md or txt)",
            workdir.display()
        ));
        return Ok(());
    }

    console.say(&format!("Files in {}:", workdir.display()));
    for (i, path) in candidates.iter().enumerate() {
        console.say(&format!("{}. {}", i + 1, file_name(path)));
    }

    let Some(answer) = console.read_line("Files to add (numbers separated by spaces)") else {
        return Ok(());
    };
    if answer.trim().is_empty() {
        console.say("Cancelled");
        return Ok(());
    }
    let indices = match parse_indices(&answer, candidates.len()) {
        Ok(indices) => indices,
        Err(e) => {
            console.say(&format!("Error: {}", e));
            return Ok(());
        }
    };

    let mut added = Vec::new();
    for index in indices {
        let path = &candidates[index - 1];
        let name = file_name(path);
        let is_text = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);

        let kind = if is_text {
            match ask_kind(console, &name) {
                Some(kind) => Some(kind),
                None => return Ok(()),
            }
        } else {
            None
        };

        match import_file(store, path, kind) {
            Ok(outcome) if outcome.converted => {
                console.say(&format!(
                    "Converted {} to {} (unclassified, use 'Classify' to set its type)",
                    name,
                    file_name(&outcome.path)
                ));
                added.push(file_name(&outcome.path));
            }
            Ok(outcome) => added.push(format!("{} [{}]", name, outcome.kind.tag())),
            Err(e) => console.say(&format!("Could not add {}: {}", name, e)),
        }
    }

    if !added.is_empty() {
        console.say(&format!("Added: {}", added.join(", ")));
    }
    Ok(())
}

pub fn list_files(store: &Store, console: &mut dyn Console) {
    let listing = store.data().workspace_files.listing();
    if listing.is_empty() {
        console.say("The workspace is empty");
        return;
    }
    for (i, line) in listing.iter().enumerate() {
        console.say(&format!("{}. {}", i + 1, line));
    }
}

/// Remove entries chosen by 1-based index
pub fn remove_by_index(store: &mut Store, console: &mut dyn Console) -> Result<()> {
    if store.data().workspace_files.is_empty() {
        console.say("No files to remove");
        return Ok(());
    }
    list_files(store, console);

    let Some(answer) = console.read_line("Files to remove (numbers separated by spaces)") else {
        return Ok(());
    };
    if answer.trim().is_empty() {
        console.say("Cancelled");
        return Ok(());
    }

    let manifest = &store.data().workspace_files;
    let paths: Vec<PathBuf> = match parse_indices(&answer, manifest.len()) {
        Ok(indices) => match manifest.paths_at(&indices) {
            Ok(paths) => paths,
            Err(bad) => {
                console.say(&format!("Error: no file numbered {}", bad));
                return Ok(());
            }
        },
        Err(e) => {
            console.say(&format!("Error: {}", e));
            return Ok(());
        }
    };

    let names: Vec<String> = paths.iter().map(|p| file_name(p)).collect();
    store.remove_files(&paths)?;
    console.say(&format!("Removed: {}", names.join(", ")));
    Ok(())
}

/// Change the type of one entry
pub fn classify_interactive(store: &mut Store, console: &mut dyn Console) -> Result<()> {
    if store.data().workspace_files.is_empty() {
        console.say("No files to classify");
        return Ok(());
    }
    list_files(store, console);

    let Some(answer) = console.read_line("File to classify (number)") else {
        return Ok(());
    };
    let manifest = &store.data().workspace_files;
    let path = match parse_indices(&answer, manifest.len()) {
        Ok(indices) if indices.len() == 1 => match manifest.paths_at(&indices) {
            Ok(mut paths) => paths.remove(0),
            Err(bad) => {
                console.say(&format!("Error: no file numbered {}", bad));
                return Ok(());
            }
        },
        Ok(_) => {
            console.say("Enter exactly one number");
            return Ok(());
        }
        Err(e) => {
            console.say(&format!("Error: {}", e));
            return Ok(());
        }
    };

    let name = file_name(&path);
    let Some(kind) = ask_kind(console, &name) else {
        return Ok(());
    };
    store.classify_file(&path, kind)?;
    console.say(&format!("{} is now [{}]", name, kind.tag()));
    Ok(())
}

/// The `/file` sub-menu. Returns a slash command typed inside it, for the REPL
pub fn file_menu(store: &mut Store, settings: &Settings, console: &mut dyn Console) -> Result<Option<String>> {
    loop {
        let manifest = &store.data().workspace_files;
        console.say(&format!(
            "\nFile management ({} files: {})",
            manifest.len(),
            manifest.counts()
        ));
        console.say("1. Scan the work directory and add files");
        console.say("2. List workspace files");
        console.say("3. Remove workspace files");
        console.say("4. Classify a file");
        console.say("0. Back");

        let Some(choice) = console.read_line("file>") else {
            return Ok(None);
        };
        let choice = choice.trim();

        let result = match choice {
            "" => continue,
            "0" => return Ok(None),
            c if c.starts_with('/') => return Ok(Some(c.to_string())),
            "1" => add_from_workdir(store, settings, console),
            "2" => {
                list_files(store, console);
                Ok(())
            }
            "3" => remove_by_index(store, console),
            "4" => classify_interactive(store, console),
            _ => {
                console.say("Invalid option, enter a number from 0 to 4");
                Ok(())
            }
        };

        if let Err(e) = result {
            console.say(&format!("Error: {}", e));
        }
    }
}
