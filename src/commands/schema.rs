use anyhow::Result;
use colored::Colorize;

use crate::registry::{self, ACTIONS, Entry, FILTERS};
use crate::ui;

pub fn run(name: Option<&str>) -> Result<()> {
    match name {
        Some(name) => {
            let entry = registry::find(name).ok_or_else(|| {
                anyhow::anyhow!("Unknown filter or action '{name}'. Run 'stackward schema' to list them.")
            })?;
            print_entry(entry);
        }
        None => {
            ui::header("Filters");
            FILTERS.iter().for_each(print_summary);
            ui::header("Actions");
            ACTIONS.iter().for_each(print_summary);
        }
    }
    Ok(())
}

fn print_summary(entry: &Entry) {
    println!("  {:<16} {}", entry.name.bold(), entry.description);
}

fn print_entry(entry: &Entry) {
    ui::header(entry.name);
    println!("{}", entry.description);

    ui::section("Options");
    for (option, description) in entry.options {
        ui::kv(option, description);
    }

    ui::section("Permissions");
    if entry.permissions.is_empty() {
        ui::dim("none");
    }
    for permission in entry.permissions {
        println!("  {permission}");
    }
}
